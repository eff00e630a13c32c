// ==========================================
// 物流派车系统 - 导入层
// ==========================================
// 职责: 批量模式的外部输入（订单 CSV、结转 JSON）
// 红线: 只做读取与字段映射，不做分配
// ==========================================

pub mod carry_over_loader;
pub mod error;
pub mod order_file_parser;

// 重导出核心类型
pub use carry_over_loader::{load_carry_over_file, parse_carry_over_json};
pub use error::{ImportError, ImportResult};
pub use order_file_parser::OrderFileParser;
