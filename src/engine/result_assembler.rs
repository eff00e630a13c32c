// ==========================================
// 物流派车系统 - 结果组装器
// ==========================================
// 职责: 整车车次在前（按录入顺序），分配结果在后（按生成顺序）
// 红线: 不做任何再加工，不独立校验
// ==========================================

use crate::domain::order::ParsedItem;
use crate::domain::trip::{DispatchSlot, Trip};
use crate::engine::trip_id::TripIdSupplier;

#[derive(Debug, Clone, Default)]
pub struct ResultAssembler {
    // 无状态
}

impl ResultAssembler {
    pub fn new() -> Self {
        Self {}
    }

    /// 为整车项生成车次（每项一车，数量原样保留）
    pub fn fixed_trips<S>(
        &self,
        fixed_items: &[ParsedItem],
        slot: &DispatchSlot,
        next_trip_id: &mut S,
    ) -> Vec<Trip>
    where
        S: TripIdSupplier + ?Sized,
    {
        fixed_items
            .iter()
            .map(|item| {
                let trip_id = next_trip_id.next_trip_id();
                Trip::fixed_load(&trip_id, slot, item.customer.clone(), item.amount)
            })
            .collect()
    }

    /// 组装最终车次列表
    pub fn assemble(&self, fixed_trips: Vec<Trip>, allocated_trips: Vec<Trip>) -> Vec<Trip> {
        let mut trips = fixed_trips;
        trips.extend(allocated_trips);
        trips
    }
}
