// ==========================================
// 物流派车系统 - 结转余量领域模型
// ==========================================
// 归属: approved/exhausted 在单次分配中由 Carry-Over Resolver 独占修改
//       条目生命周期由调用方管理，引擎不落库
// ==========================================

use crate::domain::types::CarryOverOrigin;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// CarryOverEntry - 结转条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarryOverEntry {
    pub customer: String,
    pub date: NaiveDate,
    pub shift: String,
    pub amount: f64,
    pub origin: CarryOverOrigin,

    /// 已确认合并（同一提交内后续引用不再询问）
    #[serde(default)]
    pub approved: bool,

    /// 余量已并入某个订单项，不再参与合并
    #[serde(default)]
    pub exhausted: bool,
}

impl CarryOverEntry {
    pub fn new(
        customer: impl Into<String>,
        date: NaiveDate,
        shift: impl Into<String>,
        amount: f64,
        origin: CarryOverOrigin,
    ) -> Self {
        Self {
            customer: customer.into().trim().to_string(),
            date,
            shift: shift.into(),
            amount,
            origin,
            approved: false,
            exhausted: false,
        }
    }

    /// 预先确认的条目（调用方已取得用户同意）
    pub fn pre_approved(mut self) -> Self {
        self.approved = true;
        self
    }

    /// 是否可用于指定日期的合并
    pub fn is_available_for(&self, date: NaiveDate) -> bool {
        self.date == date && self.amount.is_finite() && self.amount > 0.0 && !self.exhausted
    }
}

// ==========================================
// CarryOverIndex - 结转索引（客户 + 日期）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CarryOverIndex {
    entries: HashMap<(String, NaiveDate), CarryOverEntry>,
}

impl CarryOverIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从条目列表构建索引
    ///
    /// 同一客户同一日期出现多条时，后者覆盖前者
    pub fn from_entries(entries: impl IntoIterator<Item = CarryOverEntry>) -> Self {
        let mut index = Self::new();
        for entry in entries {
            if let Some(previous) = index.insert(entry) {
                tracing::warn!(
                    customer = %previous.customer,
                    date = %previous.date,
                    replaced_amount = previous.amount,
                    "结转条目重复，已覆盖"
                );
            }
        }
        index
    }

    /// 插入条目，返回被覆盖的旧条目
    pub fn insert(&mut self, entry: CarryOverEntry) -> Option<CarryOverEntry> {
        let key = (entry.customer.trim().to_string(), entry.date);
        self.entries.insert(key, entry)
    }

    pub fn get(&self, customer: &str, date: NaiveDate) -> Option<&CarryOverEntry> {
        self.entries.get(&(customer.trim().to_string(), date))
    }

    pub fn get_mut(&mut self, customer: &str, date: NaiveDate) -> Option<&mut CarryOverEntry> {
        self.entries.get_mut(&(customer.trim().to_string(), date))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CarryOverEntry> {
        self.entries.values()
    }

    /// 取回全部条目（供调用方持久化）
    pub fn into_entries(self) -> Vec<CarryOverEntry> {
        self.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_availability_requires_same_date_and_positive_amount() {
        let entry = CarryOverEntry::new("X", day(1), "AM", 4.0, CarryOverOrigin::PriorAllocation);
        assert!(entry.is_available_for(day(1)));
        assert!(!entry.is_available_for(day(2)));

        let empty = CarryOverEntry::new("X", day(1), "AM", 0.0, CarryOverOrigin::PriorAllocation);
        assert!(!empty.is_available_for(day(1)));

        let mut used = entry.clone();
        used.exhausted = true;
        assert!(!used.is_available_for(day(1)));
    }

    #[test]
    fn test_index_keyed_by_trimmed_customer_and_date() {
        let mut index = CarryOverIndex::new();
        index.insert(CarryOverEntry::new(" X ", day(1), "AM", 4.0, CarryOverOrigin::PriorAllocation));
        index.insert(CarryOverEntry::new("X", day(2), "AM", 6.0, CarryOverOrigin::SameSubmission));

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("X", day(1)).unwrap().amount, 4.0);
        assert_eq!(index.get("X ", day(2)).unwrap().amount, 6.0);
        assert!(index.get("Y", day(1)).is_none());
    }

    #[test]
    fn test_from_entries_latest_wins() {
        let index = CarryOverIndex::from_entries(vec![
            CarryOverEntry::new("X", day(1), "AM", 4.0, CarryOverOrigin::PriorAllocation),
            CarryOverEntry::new("X", day(1), "PM", 5.0, CarryOverOrigin::PriorAllocation),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("X", day(1)).unwrap().amount, 5.0);
    }

    #[test]
    fn test_entry_deserializes_without_flags() {
        let raw = r#"{"customer":"X","date":"2026-03-01","shift":"AM","amount":4.0,"origin":"PRIOR_ALLOCATION"}"#;
        let entry: CarryOverEntry = serde_json::from_str(raw).unwrap();
        assert!(!entry.approved);
        assert!(!entry.exhausted);
        assert_eq!(entry.origin, CarryOverOrigin::PriorAllocation);
    }
}
