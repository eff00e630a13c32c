// ==========================================
// 物流派车系统 - 车次分配引擎
// ==========================================
// 职责: 把可拼车订单项划分为最少、满载率最高的车次
// 输入: 待配载项 + 载重上限 + 车次号供给
// 输出: 车次记录（同一车次的记录共享 trip_id）
// 红线: 非整车车次载重不得超过上限；数量守恒
// ==========================================
// 搜索规模: 子集枚举为指数复杂度，待配载项数量受单行录入的
// 客户数约束（人工录入，通常个位数）。超过 max_waiting_items
// 直接拒绝，不做截断。
// 车次规模: 数量相对载重上限过大时切分车次数不受控，
// 预计车次数超过 max_trips 直接拒绝。
// ==========================================

use crate::domain::capacity::{CapacityConstraint, TripCapacity};
use crate::domain::trip::{DispatchSlot, Trip, WaitingItem};
use crate::engine::error::{AllocationError, AllocationResult};
use crate::engine::trip_id::TripIdSupplier;
use std::cmp::Ordering;
use tracing::{debug, instrument};

/// 默认待配载项上限
pub const DEFAULT_MAX_WAITING_ITEMS: usize = 16;

/// 待配载项上限的硬上限（2^24 个子集）
pub const HARD_MAX_WAITING_ITEMS: usize = 24;

/// 默认单行车次数上限
pub const DEFAULT_MAX_TRIPS_PER_LINE: usize = 500;

/// 单行车次数上限的硬上限
pub const HARD_MAX_TRIPS_PER_LINE: usize = 10_000;

// ==========================================
// TripAllocator - 车次分配引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct TripAllocator {
    max_waiting_items: usize,
    max_trips: usize,
}

impl TripAllocator {
    /// 构造函数
    ///
    /// # 参数
    /// - `max_waiting_items`: 待配载项上限，限制在 [1, HARD_MAX_WAITING_ITEMS]
    pub fn new(max_waiting_items: usize) -> Self {
        Self {
            max_waiting_items: max_waiting_items.clamp(1, HARD_MAX_WAITING_ITEMS),
            max_trips: DEFAULT_MAX_TRIPS_PER_LINE,
        }
    }

    /// 设置单行车次数上限，限制在 [1, HARD_MAX_TRIPS_PER_LINE]
    pub fn with_max_trips(mut self, max_trips: usize) -> Self {
        self.max_trips = max_trips.clamp(1, HARD_MAX_TRIPS_PER_LINE);
        self
    }

    pub fn max_waiting_items(&self) -> usize {
        self.max_waiting_items
    }

    pub fn max_trips(&self) -> usize {
        self.max_trips
    }

    /// 检查待配载项数量是否在搜索上限内
    pub fn check_waiting_bound(&self, count: usize) -> AllocationResult<()> {
        if count > self.max_waiting_items {
            return Err(AllocationError::WaitingListTooLarge {
                count,
                limit: self.max_waiting_items,
            });
        }
        Ok(())
    }

    /// 预计车次数上界: Σ ceil(amount / capacity)
    ///
    /// 每项切出的整车数不超过 ceil - 1，拼车车次不超过项数，
    /// 故实际车次数不超过该值
    pub fn estimate_trip_count<I>(amounts: I, capacity: TripCapacity) -> u64
    where
        I: IntoIterator<Item = f64>,
    {
        let total: f64 = amounts
            .into_iter()
            .map(|amount| (amount / capacity.limit()).ceil())
            .sum();
        // 浮点转整数饱和，超大值落在 u64::MAX
        total as u64
    }

    /// 检查预计车次数是否在上限内
    pub fn check_trip_bound(&self, estimated: u64) -> AllocationResult<()> {
        if estimated > self.max_trips as u64 {
            return Err(AllocationError::TooManyTrips {
                estimated,
                limit: self.max_trips,
            });
        }
        Ok(())
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 分配车次
    ///
    /// 规则:
    /// 1) 无待配载项: 无车次
    /// 2) 单项: 不超载则一车；超载则按上限逐车切分（上限, 上限, …, 余量）
    /// 3) 多项合计不超载: 全部拼成一车
    /// 4) 否则循环: 按数量降序取最大项；超载则切出整车并把余量放回；
    ///    未超载则枚举剩余项全部子集，取合计严格更大且不超载的首个组合拼车
    ///
    /// 单项数量与上限严格比较；仅多项合计允许浮点累加误差
    ///
    /// # 返回
    /// 车次记录，顺序即生成顺序
    #[instrument(skip(self, items, slot, next_trip_id), fields(
        items_count = items.len(),
        capacity = capacity.limit(),
        date = %slot.date,
        shift = %slot.shift
    ))]
    pub fn allocate<S>(
        &self,
        items: Vec<WaitingItem>,
        capacity: TripCapacity,
        slot: &DispatchSlot,
        next_trip_id: &mut S,
    ) -> AllocationResult<Vec<Trip>>
    where
        S: TripIdSupplier + ?Sized,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        self.check_waiting_bound(items.len())?;

        for item in &items {
            assert!(
                item.amount.is_finite() && item.amount > 0.0,
                "待配载项数量必须为有限正数: customer={}, amount={}",
                item.customer,
                item.amount
            );
        }
        self.check_trip_bound(Self::estimate_trip_count(
            items.iter().map(|i| i.amount),
            capacity,
        ))?;

        let mut trips = Vec::new();

        // 1. 单项: 直接装车或按上限切分
        if items.len() == 1 {
            let mut items = items;
            if let Some(item) = items.pop() {
                self.chunk_single(item, capacity, slot, next_trip_id, &mut trips);
            }
            return Ok(trips);
        }

        // 2. 多项合计不超载: 整体拼车
        let total: f64 = items.iter().map(|i| i.amount).sum();
        if items.iter().all(|i| capacity.fits(i.amount)) && capacity.fits_total(total) {
            let trip_id = next_trip_id.next_trip_id();
            debug!(trip_id = %trip_id, total, "合计未超载，整体拼车");
            trips.extend(
                items
                    .into_iter()
                    .map(|i| Trip::flexible(&trip_id, slot, i.customer, i.amount)),
            );
            return Ok(trips);
        }

        // 3. 最大项优先 + 子集最优拼车
        let mut waiting = items;
        while !waiting.is_empty() {
            // sort_by 为稳定排序，同量保持原相对顺序
            waiting.sort_by(|a, b| b.amount.partial_cmp(&a.amount).unwrap_or(Ordering::Equal));
            let head = waiting.remove(0);

            if !capacity.fits(head.amount) {
                let remainder = head.amount - capacity.limit();
                assert!(
                    remainder > 0.0 && remainder < head.amount,
                    "切分余量必须为正且严格减少: amount={}, remainder={}",
                    head.amount,
                    remainder
                );

                let trip_id = next_trip_id.next_trip_id();
                debug!(
                    trip_id = %trip_id,
                    customer = %head.customer,
                    remainder,
                    "超载项切出整车"
                );
                trips.push(Trip::flexible(&trip_id, slot, head.customer.clone(), capacity.limit()));
                waiting.push(WaitingItem::new(head.customer, remainder));
                continue;
            }

            let combination = best_combination(head.amount, &waiting, capacity);
            let trip_id = next_trip_id.next_trip_id();
            debug!(
                trip_id = %trip_id,
                customer = %head.customer,
                partners = combination.len(),
                "拼车组合已确定"
            );

            // 按降序下标移除，保持剩余项相对顺序
            let mut partners = Vec::with_capacity(combination.len());
            for &idx in combination.iter().rev() {
                partners.push(waiting.remove(idx));
            }
            partners.reverse();

            trips.push(Trip::flexible(&trip_id, slot, head.customer, head.amount));
            trips.extend(
                partners
                    .into_iter()
                    .map(|p| Trip::flexible(&trip_id, slot, p.customer, p.amount)),
            );
        }

        Ok(trips)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 单项按上限逐车切分
    fn chunk_single<S>(
        &self,
        item: WaitingItem,
        capacity: TripCapacity,
        slot: &DispatchSlot,
        next_trip_id: &mut S,
        trips: &mut Vec<Trip>,
    ) where
        S: TripIdSupplier + ?Sized,
    {
        let mut remaining = item.amount;
        while remaining > 0.0 {
            let chunk = if capacity.fits(remaining) {
                remaining
            } else {
                capacity.limit()
            };
            let next = remaining - chunk;
            assert!(
                next >= 0.0 && next < remaining,
                "切分余量必须严格减少: remaining={}, capacity={}",
                remaining,
                capacity.limit()
            );

            let trip_id = next_trip_id.next_trip_id();
            trips.push(Trip::flexible(&trip_id, slot, item.customer.clone(), chunk));
            remaining = next;
        }
    }
}

impl Default for TripAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WAITING_ITEMS)
    }
}

/// 在剩余项中查找与 base 拼车的最优组合
///
/// 初始最优为 base 单独成车；按二进制计数顺序枚举子集，
/// 仅当合计严格大于当前最优且不超载时替换，同分取先出现者。
/// 剩余项均不大于 base，base 已满足单项上限
///
/// # 返回
/// 组合成员在 `rest` 中的升序下标
fn best_combination(base: f64, rest: &[WaitingItem], capacity: TripCapacity) -> Vec<usize> {
    let mut best_total = base;
    let mut best: Vec<usize> = Vec::new();
    let mut selector = vec![false; rest.len()];

    while advance_selector(&mut selector) {
        let total = base
            + selector
                .iter()
                .zip(rest)
                .filter(|(selected, _)| **selected)
                .map(|(_, item)| item.amount)
                .sum::<f64>();

        if total > best_total && capacity.fits_total(total) {
            best_total = total;
            best = selector
                .iter()
                .enumerate()
                .filter(|(_, selected)| **selected)
                .map(|(idx, _)| idx)
                .collect();
        }
    }

    best
}

/// 选择向量按二进制加一（下标 0 为最低位）
///
/// # 返回
/// - `true`: 得到下一个非空子集
/// - `false`: 已回到全空，枚举结束
fn advance_selector(selector: &mut [bool]) -> bool {
    for bit in selector.iter_mut() {
        if *bit {
            *bit = false;
        } else {
            *bit = true;
            return true;
        }
    }
    false
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trip::TripAmount;
    use chrono::NaiveDate;

    fn slot() -> DispatchSlot {
        DispatchSlot {
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            shift: "AM".to_string(),
        }
    }

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("T{}", n)
        }
    }

    fn cap(limit: f64) -> TripCapacity {
        TripCapacity::new(limit).unwrap()
    }

    fn summary(trips: &[Trip]) -> Vec<(String, String, f64)> {
        trips
            .iter()
            .map(|t| (t.trip_id.clone(), t.customer.clone(), t.load()))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let allocator = TripAllocator::default();
        let trips = allocator.allocate(vec![], cap(10.0), &slot(), &mut counter()).unwrap();
        assert!(trips.is_empty());
    }

    #[test]
    fn test_single_item_fits() {
        let allocator = TripAllocator::default();
        let trips = allocator
            .allocate(vec![WaitingItem::new("A", 8.0)], cap(10.0), &slot(), &mut counter())
            .unwrap();
        assert_eq!(summary(&trips), vec![("T1".to_string(), "A".to_string(), 8.0)]);
    }

    #[test]
    fn test_single_item_chunking() {
        let allocator = TripAllocator::default();
        let trips = allocator
            .allocate(vec![WaitingItem::new("A", 25.0)], cap(10.0), &slot(), &mut counter())
            .unwrap();

        assert_eq!(
            summary(&trips),
            vec![
                ("T1".to_string(), "A".to_string(), 10.0),
                ("T2".to_string(), "A".to_string(), 10.0),
                ("T3".to_string(), "A".to_string(), 5.0),
            ]
        );
    }

    #[test]
    fn test_single_item_exact_multiple() {
        let allocator = TripAllocator::default();
        let trips = allocator
            .allocate(vec![WaitingItem::new("A", 20.0)], cap(10.0), &slot(), &mut counter())
            .unwrap();
        assert_eq!(trips.len(), 2);
        assert!(trips.iter().all(|t| t.load() == 10.0));
    }

    #[test]
    fn test_full_merge() {
        let allocator = TripAllocator::default();
        let trips = allocator
            .allocate(
                vec![
                    WaitingItem::new("A", 4.0),
                    WaitingItem::new("B", 3.0),
                    WaitingItem::new("C", 2.0),
                ],
                cap(10.0),
                &slot(),
                &mut counter(),
            )
            .unwrap();

        assert_eq!(trips.len(), 3);
        assert!(trips.iter().all(|t| t.trip_id == "T1"));
        assert_eq!(trips.iter().map(|t| t.load()).sum::<f64>(), 9.0);
    }

    #[test]
    fn test_best_fit_combination() {
        let allocator = TripAllocator::default();
        let trips = allocator
            .allocate(
                vec![
                    WaitingItem::new("A", 7.0),
                    WaitingItem::new("B", 6.0),
                    WaitingItem::new("C", 2.0),
                ],
                cap(10.0),
                &slot(),
                &mut counter(),
            )
            .unwrap();

        assert_eq!(
            summary(&trips),
            vec![
                ("T1".to_string(), "A".to_string(), 7.0),
                ("T1".to_string(), "C".to_string(), 2.0),
                ("T2".to_string(), "B".to_string(), 6.0),
            ]
        );
    }

    #[test]
    fn test_tie_break_first_in_enumeration_order() {
        // base=5，B(3) 与 C(3) 同分，取先枚举到的 B
        let allocator = TripAllocator::default();
        let trips = allocator
            .allocate(
                vec![
                    WaitingItem::new("A", 5.0),
                    WaitingItem::new("B", 3.0),
                    WaitingItem::new("C", 3.0),
                ],
                cap(8.0),
                &slot(),
                &mut counter(),
            )
            .unwrap();

        assert_eq!(trips[0].customer, "A");
        assert_eq!(trips[1].customer, "B");
        assert_eq!(trips[1].trip_id, "T1");
        assert_eq!(trips[2].customer, "C");
        assert_eq!(trips[2].trip_id, "T2");
    }

    #[test]
    fn test_oversized_item_among_many() {
        let allocator = TripAllocator::default();
        let trips = allocator
            .allocate(
                vec![WaitingItem::new("A", 13.0), WaitingItem::new("B", 4.0)],
                cap(10.0),
                &slot(),
                &mut counter(),
            )
            .unwrap();

        // A 切出 10，余量 3 与 B(4) 拼车
        assert_eq!(
            summary(&trips),
            vec![
                ("T1".to_string(), "A".to_string(), 10.0),
                ("T2".to_string(), "B".to_string(), 4.0),
                ("T2".to_string(), "A".to_string(), 3.0),
            ]
        );
    }

    #[test]
    fn test_capacity_and_conservation_hold() {
        let allocator = TripAllocator::default();
        let input = vec![
            WaitingItem::new("A", 9.5),
            WaitingItem::new("B", 14.0),
            WaitingItem::new("C", 3.25),
            WaitingItem::new("D", 6.0),
            WaitingItem::new("E", 1.75),
        ];
        let trips = allocator
            .allocate(input.clone(), cap(10.0), &slot(), &mut counter())
            .unwrap();

        let mut per_trip = std::collections::HashMap::new();
        for trip in &trips {
            assert!(matches!(trip.amount, TripAmount::Flexible(_)));
            *per_trip.entry(trip.trip_id.clone()).or_insert(0.0) += trip.load();
        }
        assert!(per_trip.values().all(|load| *load <= 10.0));

        for item in &input {
            let delivered: f64 = trips
                .iter()
                .filter(|t| t.customer == item.customer)
                .map(|t| t.load())
                .sum();
            assert!((delivered - item.amount).abs() < 1e-9);
        }
    }

    #[test]
    fn test_one_id_per_trip() {
        let allocator = TripAllocator::default();
        let mut calls = 0;
        let mut ids = || {
            calls += 1;
            format!("T{}", calls)
        };
        let trips = allocator
            .allocate(
                vec![
                    WaitingItem::new("A", 7.0),
                    WaitingItem::new("B", 6.0),
                    WaitingItem::new("C", 2.0),
                ],
                cap(10.0),
                &slot(),
                &mut ids,
            )
            .unwrap();
        drop(ids);

        let distinct: std::collections::HashSet<_> = trips.iter().map(|t| t.trip_id.clone()).collect();
        assert_eq!(calls, distinct.len());
    }

    #[test]
    fn test_waiting_list_bound() {
        let allocator = TripAllocator::new(3);
        let items = (0..4).map(|i| WaitingItem::new(format!("C{}", i), 1.0)).collect();
        let err = allocator.allocate(items, cap(10.0), &slot(), &mut counter()).unwrap_err();
        assert_eq!(err, AllocationError::WaitingListTooLarge { count: 4, limit: 3 });
    }

    #[test]
    fn test_amount_exactly_at_capacity() {
        let allocator = TripAllocator::default();
        let trips = allocator
            .allocate(vec![WaitingItem::new("A", 10.0)], cap(10.0), &slot(), &mut counter())
            .unwrap();
        assert_eq!(summary(&trips), vec![("T1".to_string(), "A".to_string(), 10.0)]);

        let trips = allocator
            .allocate(
                vec![WaitingItem::new("A", 6.0), WaitingItem::new("B", 4.0)],
                cap(10.0),
                &slot(),
                &mut counter(),
            )
            .unwrap();
        assert!(trips.iter().all(|t| t.trip_id == "T1"));
    }

    #[test]
    fn test_single_item_just_above_capacity_is_split() {
        let allocator = TripAllocator::default();
        let amount = 10.0 + 5e-10;
        let trips = allocator
            .allocate(vec![WaitingItem::new("A", amount)], cap(10.0), &slot(), &mut counter())
            .unwrap();

        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].load(), 10.0);
        assert!(trips[1].load() > 0.0 && trips[1].load() < 1e-9);
        assert!(trips.iter().all(|t| t.load() <= 10.0));
        assert_ne!(trips[0].trip_id, trips[1].trip_id);
    }

    #[test]
    fn test_head_just_above_capacity_is_split() {
        let allocator = TripAllocator::default();
        let trips = allocator
            .allocate(
                vec![WaitingItem::new("A", 10.0 + 5e-10), WaitingItem::new("B", 3.0)],
                cap(10.0),
                &slot(),
                &mut counter(),
            )
            .unwrap();

        let mut per_trip = std::collections::BTreeMap::new();
        for trip in &trips {
            *per_trip.entry(trip.trip_id.clone()).or_insert(0.0) += trip.load();
        }
        assert_eq!(per_trip.len(), 2);
        assert_eq!(per_trip["T1"], 10.0);
        assert!(per_trip.values().all(|load| *load <= 10.0));
    }

    #[test]
    fn test_huge_amount_rejected_before_any_trip() {
        let allocator = TripAllocator::default();
        for items in [
            vec![WaitingItem::new("A", 1e20)],
            vec![WaitingItem::new("A", 1e20), WaitingItem::new("B", 1.0)],
            vec![WaitingItem::new("A", 1e12)],
        ] {
            let mut calls = 0;
            let mut ids = || {
                calls += 1;
                format!("T{}", calls)
            };
            let err = allocator.allocate(items, cap(1.0), &slot(), &mut ids).unwrap_err();
            drop(ids);

            assert!(matches!(
                err,
                AllocationError::TooManyTrips {
                    limit: DEFAULT_MAX_TRIPS_PER_LINE,
                    ..
                }
            ));
            assert_eq!(calls, 0);
        }
    }

    #[test]
    fn test_trip_bound_is_configurable() {
        let items = || vec![WaitingItem::new("A", 25.0)];

        let tight = TripAllocator::default().with_max_trips(2);
        let err = tight.allocate(items(), cap(10.0), &slot(), &mut counter()).unwrap_err();
        assert_eq!(err, AllocationError::TooManyTrips { estimated: 3, limit: 2 });

        let exact = TripAllocator::default().with_max_trips(3);
        assert_eq!(exact.allocate(items(), cap(10.0), &slot(), &mut counter()).unwrap().len(), 3);
    }

    #[test]
    fn test_estimate_trip_count() {
        assert_eq!(TripAllocator::estimate_trip_count([25.0, 10.0, 0.5], cap(10.0)), 5);
        assert_eq!(TripAllocator::estimate_trip_count([1e20], cap(1.0)), u64::MAX);
        assert_eq!(TripAllocator::estimate_trip_count(Vec::<f64>::new(), cap(1.0)), 0);
    }

    #[test]
    fn test_advance_selector_order() {
        let mut selector = vec![false; 2];
        let mut seen = Vec::new();
        while advance_selector(&mut selector) {
            seen.push(selector.clone());
        }
        assert_eq!(
            seen,
            vec![vec![true, false], vec![false, true], vec![true, true]]
        );
    }
}
