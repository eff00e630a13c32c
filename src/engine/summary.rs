// ==========================================
// 物流派车系统 - 分配结果汇总
// ==========================================
// 职责: 统计车次数、单车载重、装载率、客户合计
// 用途: 日志输出与批量运行结果展示
// ==========================================

use crate::domain::capacity::{CapacityConstraint, TripCapacity};
use crate::domain::trip::Trip;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单车次汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripLoad {
    pub trip_id: String,
    pub customers: Vec<String>,
    pub load: f64,
    pub fill_ratio: f64,
    pub fixed_load: bool,
}

/// 订单行分配汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub trip_count: usize,
    pub record_count: usize,
    pub fixed_trip_count: usize,
    pub trips: Vec<TripLoad>,
    pub customer_totals: BTreeMap<String, f64>,
    /// 非整车车次平均装载率
    pub average_fill_ratio: f64,
}

impl AllocationSummary {
    /// 从车次记录生成汇总（车次按首次出现顺序）
    pub fn from_trips(trips: &[Trip], capacity: TripCapacity) -> Self {
        let mut loads: Vec<TripLoad> = Vec::new();
        let mut customer_totals: BTreeMap<String, f64> = BTreeMap::new();

        for trip in trips {
            *customer_totals.entry(trip.customer.clone()).or_insert(0.0) += trip.load();

            match loads.iter_mut().find(|l| l.trip_id == trip.trip_id) {
                Some(existing) => {
                    existing.load += trip.load();
                    if !existing.customers.contains(&trip.customer) {
                        existing.customers.push(trip.customer.clone());
                    }
                }
                None => loads.push(TripLoad {
                    trip_id: trip.trip_id.clone(),
                    customers: vec![trip.customer.clone()],
                    load: trip.load(),
                    fill_ratio: 0.0,
                    fixed_load: trip.is_fixed_load(),
                }),
            }
        }

        for load in loads.iter_mut() {
            load.fill_ratio = capacity.fill_ratio(load.load);
        }

        let flexible: Vec<f64> = loads
            .iter()
            .filter(|l| !l.fixed_load)
            .map(|l| l.fill_ratio)
            .collect();
        let average_fill_ratio = if flexible.is_empty() {
            0.0
        } else {
            flexible.iter().sum::<f64>() / flexible.len() as f64
        };

        Self {
            trip_count: loads.len(),
            record_count: trips.len(),
            fixed_trip_count: loads.iter().filter(|l| l.fixed_load).count(),
            trips: loads,
            customer_totals,
            average_fill_ratio,
        }
    }
}
