// ==========================================
// 物流派车系统 - 订单行领域模型
// ==========================================
// 用途: 调度员录入的一行复合订单（多客户/多数量）
// ==========================================

use crate::domain::trip::DispatchSlot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// OrderLine - 订单行（输入）
// ==========================================
// customers / quantities 为原始复合字符串，按位置一一对应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub customers: String,  // 客户（复合）
    pub quantities: String, // 数量（复合）
    pub date: NaiveDate,    // 日期
    pub shift: String,      // 班次
    pub capacity: f64,      // 单车次载重上限
}

impl OrderLine {
    pub fn new(
        customers: impl Into<String>,
        quantities: impl Into<String>,
        date: NaiveDate,
        shift: impl Into<String>,
        capacity: f64,
    ) -> Self {
        Self {
            customers: customers.into(),
            quantities: quantities.into(),
            date,
            shift: shift.into(),
            capacity,
        }
    }

    /// 车次落位（日期 + 班次）
    pub fn slot(&self) -> DispatchSlot {
        DispatchSlot {
            date: self.date,
            shift: self.shift.clone(),
        }
    }
}

// ==========================================
// ParsedItem - 解析后的单个客户数量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedItem {
    pub customer: String,
    pub amount: f64,
    pub fixed: bool, // 整车标记：独占一车，不拼不拆
}

impl ParsedItem {
    pub fn flexible(customer: impl Into<String>, amount: f64) -> Self {
        Self {
            customer: customer.into(),
            amount,
            fixed: false,
        }
    }

    pub fn fixed_load(customer: impl Into<String>, amount: f64) -> Self {
        Self {
            customer: customer.into(),
            amount,
            fixed: true,
        }
    }
}
