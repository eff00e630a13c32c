// ==========================================
// 物流派车系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 校验失败整行中止，不输出部分车次
// ==========================================

use thiserror::Error;

/// 车次分配错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    // ===== 输入校验错误 =====
    #[error("客户与数量个数不一致: customers={customers}, quantities={quantities}")]
    CountMismatch { customers: usize, quantities: usize },

    #[error("数量无效 (位置 {position}, 值 {token:?}): {reason}")]
    InvalidQuantity {
        position: usize,
        token: String,
        reason: String,
    },

    #[error("车次载重上限无效: {0}（必须为有限正数）")]
    InvalidCapacity(f64),

    // ===== 搜索规模保护 =====
    #[error("待配载项过多: {count} 项超过上限 {limit}")]
    WaitingListTooLarge { count: usize, limit: usize },

    #[error("车次数过多: 预计 {estimated} 车次超过上限 {limit}")]
    TooManyTrips { estimated: u64, limit: usize },
}

/// Result 类型别名
pub type AllocationResult<T> = Result<T, AllocationError>;
