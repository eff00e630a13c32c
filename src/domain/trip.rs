// ==========================================
// 物流派车系统 - 车次领域模型
// ==========================================
// 红线: 非整车车次 amount <= capacity；整车车次按录入量原样保留
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// DispatchSlot - 车次落位（日期 + 班次）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DispatchSlot {
    pub date: NaiveDate,
    pub shift: String,
}

// ==========================================
// WaitingItem - 待配载项（分配过程中的工作状态）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitingItem {
    pub customer: String,
    pub amount: f64,
}

impl WaitingItem {
    pub fn new(customer: impl Into<String>, amount: f64) -> Self {
        Self {
            customer: customer.into(),
            amount,
        }
    }
}

// ==========================================
// TripAmount - 车次装载量
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripAmount {
    Flexible(f64),  // 拼车/拆车后的装载量
    FixedLoad(f64), // 整车（不受载重上限约束）
}

impl TripAmount {
    pub fn value(&self) -> f64 {
        match self {
            TripAmount::Flexible(v) | TripAmount::FixedLoad(v) => *v,
        }
    }

    pub fn is_fixed_load(&self) -> bool {
        matches!(self, TripAmount::FixedLoad(_))
    }
}

// ==========================================
// Trip - 车次记录（输出）
// ==========================================
// 一个车次可包含多条记录，共享同一 trip_id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub trip_id: String,
    pub date: NaiveDate,
    pub shift: String,
    pub customer: String,
    pub amount: TripAmount,
}

impl Trip {
    pub fn flexible(trip_id: &str, slot: &DispatchSlot, customer: impl Into<String>, amount: f64) -> Self {
        Self {
            trip_id: trip_id.to_string(),
            date: slot.date,
            shift: slot.shift.clone(),
            customer: customer.into(),
            amount: TripAmount::Flexible(amount),
        }
    }

    pub fn fixed_load(trip_id: &str, slot: &DispatchSlot, customer: impl Into<String>, amount: f64) -> Self {
        Self {
            trip_id: trip_id.to_string(),
            date: slot.date,
            shift: slot.shift.clone(),
            customer: customer.into(),
            amount: TripAmount::FixedLoad(amount),
        }
    }

    pub fn load(&self) -> f64 {
        self.amount.value()
    }

    pub fn is_fixed_load(&self) -> bool {
        self.amount.is_fixed_load()
    }
}
