use crate::config::allocation_config_trait::{AllocationConfigReader, ConfigResult};
use crate::domain::types::ApprovalPolicy;
use crate::engine::order_parser::{DEFAULT_ITEM_SEPARATOR, DEFAULT_LOAD_MARKER};
use crate::engine::trip_allocator::{DEFAULT_MAX_TRIPS_PER_LINE, DEFAULT_MAX_WAITING_ITEMS};
use serde::{Deserialize, Serialize};

/// 车次分配配置快照（一次运行内不变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSettings {
    /// 复合项分隔符
    pub item_separator: String,

    /// 整车标记后缀
    pub load_marker_suffixes: Vec<String>,

    /// 待配载项上限
    pub max_waiting_items: usize,

    /// 单行车次数上限
    #[serde(default = "default_max_trips_per_line")]
    pub max_trips_per_line: usize,

    /// 默认单车次载重上限
    #[serde(default)]
    pub default_capacity: Option<f64>,

    /// 批量模式结转确认策略
    #[serde(default)]
    pub batch_approval_policy: ApprovalPolicy,
}

fn default_max_trips_per_line() -> usize {
    DEFAULT_MAX_TRIPS_PER_LINE
}

impl Default for AllocationSettings {
    fn default() -> Self {
        Self {
            item_separator: DEFAULT_ITEM_SEPARATOR.to_string(),
            load_marker_suffixes: vec![DEFAULT_LOAD_MARKER.to_string()],
            max_waiting_items: DEFAULT_MAX_WAITING_ITEMS,
            max_trips_per_line: DEFAULT_MAX_TRIPS_PER_LINE,
            default_capacity: None,
            batch_approval_policy: ApprovalPolicy::default(),
        }
    }
}

impl AllocationSettings {
    /// 从配置读取器加载全部配置项
    pub async fn load<C>(reader: &C) -> ConfigResult<Self>
    where
        C: AllocationConfigReader + ?Sized,
    {
        let (
            item_separator,
            load_marker_suffixes,
            max_waiting_items,
            max_trips_per_line,
            default_capacity,
            batch_approval_policy,
        ) = futures::try_join!(
            reader.get_item_separator(),
            reader.get_load_marker_suffixes(),
            reader.get_max_waiting_items(),
            reader.get_max_trips_per_line(),
            reader.get_default_capacity(),
            reader.get_batch_approval_policy(),
        )?;

        let settings = Self {
            item_separator,
            load_marker_suffixes,
            max_waiting_items,
            max_trips_per_line,
            default_capacity,
            batch_approval_policy,
        };
        tracing::debug!(?settings, "分配配置已加载");
        Ok(settings)
    }
}
