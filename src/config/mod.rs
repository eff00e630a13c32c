// ==========================================
// 物流派车系统 - 配置层
// ==========================================
// 职责: 分配参数的读取与覆写
// 存储: config_kv 表
// ==========================================

pub mod allocation_config_trait;
pub mod config_manager;
pub mod settings;

// 重导出核心配置管理器
pub use allocation_config_trait::{AllocationConfigReader, ConfigResult};
pub use config_manager::{config_keys, ConfigManager};
pub use settings::AllocationSettings;
