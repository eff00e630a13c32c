// ==========================================
// 物流派车系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、载重约束接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod capacity;
pub mod carry_over;
pub mod order;
pub mod trip;
pub mod types;

// 重导出核心类型
pub use capacity::{CapacityConstraint, TripCapacity, SUM_RELATIVE_TOLERANCE};
pub use carry_over::{CarryOverEntry, CarryOverIndex};
pub use order::{OrderLine, ParsedItem};
pub use trip::{DispatchSlot, Trip, TripAmount, WaitingItem};
pub use types::{ApprovalPolicy, CarryOverOrigin};
