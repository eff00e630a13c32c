// ==========================================
// 物流派车系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 车次分配引擎（调度员最终确认结转合并）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 分配规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ApprovalPolicy, CarryOverOrigin};

// 领域实体
pub use domain::{
    CarryOverEntry, CarryOverIndex, DispatchSlot, OrderLine, ParsedItem, Trip, TripAmount,
    TripCapacity, WaitingItem,
};

// 引擎
pub use engine::{
    allocate_order_line, AllocationError, AllocationResult, AllocationSummary, ApprovalDecision,
    AsyncApprovalDecision, LineOutcome, SequentialTripIdSupplier, TripAllocationEngine,
    TripIdSupplier,
};

// 配置
pub use config::{AllocationSettings, ConfigManager};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "物流派车系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
