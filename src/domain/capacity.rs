// ==========================================
// 物流派车系统 - 车次载重领域模型
// ==========================================
// 红线: 非整车车次载重不得超过上限
// ==========================================

use serde::{Deserialize, Serialize};

/// 多项合计的相对容差（仅吸收浮点累加误差）
pub const SUM_RELATIVE_TOLERANCE: f64 = 1e-12;

// ==========================================
// TripCapacity - 单车次载重上限
// ==========================================
// 构造即校验: 只能持有有限正数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripCapacity {
    limit: f64,
}

impl TripCapacity {
    /// 创建载重上限，非有限值或非正数返回 None
    pub fn new(limit: f64) -> Option<Self> {
        if limit.is_finite() && limit > 0.0 {
            Some(Self { limit })
        } else {
            None
        }
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }
}

// ==========================================
// Trait: CapacityConstraint
// ==========================================
// 用途: Trip Allocator / 汇总统计的载重检查接口
pub trait CapacityConstraint {
    /// 检查单项数量是否在上限内（严格比较）
    fn fits(&self, load: f64) -> bool;

    /// 检查多项合计是否在上限内（允许累加误差）
    fn fits_total(&self, total: f64) -> bool;

    /// 计算剩余载重
    fn remaining(&self, load: f64) -> f64;

    /// 计算装载率
    fn fill_ratio(&self, load: f64) -> f64;
}

impl CapacityConstraint for TripCapacity {
    /// # 返回
    /// - `true`: load <= limit
    fn fits(&self, load: f64) -> bool {
        load <= self.limit
    }

    /// 单项已满足 fits 的前提下，合计仅放宽 limit * SUM_RELATIVE_TOLERANCE
    fn fits_total(&self, total: f64) -> bool {
        total <= self.limit + self.limit * SUM_RELATIVE_TOLERANCE
    }

    fn remaining(&self, load: f64) -> f64 {
        (self.limit - load).max(0.0)
    }

    /// # 返回
    /// 装载率，整车车次可能大于 1.0
    fn fill_ratio(&self, load: f64) -> f64 {
        load / self.limit
    }
}
