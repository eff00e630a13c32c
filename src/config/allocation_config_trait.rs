// ==========================================
// 物流派车系统 - 分配配置读取 Trait
// ==========================================
// 职责: 定义车次分配所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::ApprovalPolicy;
use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// AllocationConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait AllocationConfigReader: Send + Sync {
    // ===== 订单解析 =====

    /// 获取复合项分隔符
    ///
    /// # 默认值
    /// - ","
    async fn get_item_separator(&self) -> ConfigResult<String>;

    /// 获取整车标记后缀列表（大小写不敏感）
    ///
    /// # 默认值
    /// - ["L"]
    async fn get_load_marker_suffixes(&self) -> ConfigResult<Vec<String>>;

    // ===== 车次分配 =====

    /// 获取待配载项上限（子集枚举规模保护）
    ///
    /// # 默认值
    /// - 16
    async fn get_max_waiting_items(&self) -> ConfigResult<usize>;

    /// 获取单行车次数上限（数量相对载重上限过大时拒绝）
    ///
    /// # 默认值
    /// - 500
    async fn get_max_trips_per_line(&self) -> ConfigResult<usize>;

    /// 获取默认单车次载重上限（订单文件未给出时使用）
    ///
    /// # 返回
    /// - None: 未配置，订单必须自带载重上限
    async fn get_default_capacity(&self) -> ConfigResult<Option<f64>>;

    // ===== 批量模式 =====

    /// 获取批量模式下的结转确认策略
    ///
    /// # 默认值
    /// - DECLINE_ALL（无决策即拒绝）
    async fn get_batch_approval_policy(&self) -> ConfigResult<ApprovalPolicy>;
}
