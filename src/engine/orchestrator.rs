// ==========================================
// 物流派车系统 - 引擎编排器
// ==========================================
// 用途: 协调 解析 → 结转合并 → 车次分配 → 结果组装
// 说明: 同步与可挂起两种入口；算法本身无 I/O
// 红线: 任一校验失败整行中止，不输出部分车次
// ==========================================

use crate::config::AllocationSettings;
use crate::domain::capacity::TripCapacity;
use crate::domain::carry_over::CarryOverIndex;
use crate::domain::order::{OrderLine, ParsedItem};
use crate::domain::trip::{Trip, WaitingItem};
use crate::engine::approval::{ApprovalDecision, AsyncApprovalDecision};
use crate::engine::carry_over_resolver::CarryOverResolver;
use crate::engine::error::{AllocationError, AllocationResult};
use crate::engine::order_parser::OrderParser;
use crate::engine::result_assembler::ResultAssembler;
use crate::engine::summary::AllocationSummary;
use crate::engine::trip_allocator::TripAllocator;
use crate::engine::trip_id::TripIdSupplier;
use tracing::{info, instrument, warn};

// ==========================================
// LineOutcome - 提交内单行结果
// ==========================================
#[derive(Debug, Clone)]
pub struct LineOutcome {
    pub line_no: usize, // 从 1 开始
    pub result: AllocationResult<Vec<Trip>>,
}

// ==========================================
// TripAllocationEngine - 车次分配引擎入口
// ==========================================
#[derive(Debug, Clone)]
pub struct TripAllocationEngine {
    parser: OrderParser,
    resolver: CarryOverResolver,
    allocator: TripAllocator,
    assembler: ResultAssembler,
}

impl TripAllocationEngine {
    /// 按配置创建引擎实例
    pub fn new(settings: &AllocationSettings) -> Self {
        Self {
            parser: OrderParser::from_settings(settings),
            resolver: CarryOverResolver::new(),
            allocator: TripAllocator::new(settings.max_waiting_items)
                .with_max_trips(settings.max_trips_per_line),
            assembler: ResultAssembler::new(),
        }
    }

    // ==========================================
    // 单行分配
    // ==========================================

    /// 分配一行订单（同步确认）
    ///
    /// # 参数
    /// - `line`: 订单行
    /// - `index`: 结转索引（approved/exhausted 会被更新）
    /// - `approval`: 结转合并确认；无决策时传入 `DeclineAll`
    /// - `next_trip_id`: 车次号供给，每车次调用一次
    ///
    /// # 返回
    /// 整车车次在前、分配车次在后的车次记录
    #[instrument(skip(self, line, index, approval, next_trip_id), fields(
        date = %line.date,
        shift = %line.shift,
        capacity = line.capacity
    ))]
    pub fn allocate_order_line<D, S>(
        &self,
        line: &OrderLine,
        index: &mut CarryOverIndex,
        approval: &mut D,
        next_trip_id: &mut S,
    ) -> AllocationResult<Vec<Trip>>
    where
        D: ApprovalDecision + ?Sized,
        S: TripIdSupplier + ?Sized,
    {
        let (capacity, items) = self.prepare(line, index)?;
        let resolved = self.resolver.resolve(items, line.date, index, approval);
        self.finish(line, capacity, resolved, next_trip_id)
    }

    /// 分配一行订单（可挂起确认）
    #[instrument(skip(self, line, index, approval, next_trip_id), fields(
        date = %line.date,
        shift = %line.shift,
        capacity = line.capacity
    ))]
    pub async fn allocate_order_line_async<D, S>(
        &self,
        line: &OrderLine,
        index: &mut CarryOverIndex,
        approval: &mut D,
        next_trip_id: &mut S,
    ) -> AllocationResult<Vec<Trip>>
    where
        D: AsyncApprovalDecision + ?Sized,
        S: TripIdSupplier + ?Sized,
    {
        let (capacity, items) = self.prepare(line, index)?;
        let resolved = self
            .resolver
            .resolve_async(items, line.date, index, approval)
            .await;
        self.finish(line, capacity, resolved, next_trip_id)
    }

    // ==========================================
    // 整次提交
    // ==========================================

    /// 按顺序分配一次提交中的多行订单
    ///
    /// 所有行共享同一结转索引，一次确认对后续引用生效；
    /// 单行失败不影响其他行
    pub fn allocate_submission<D, S>(
        &self,
        lines: &[OrderLine],
        index: &mut CarryOverIndex,
        approval: &mut D,
        next_trip_id: &mut S,
    ) -> Vec<LineOutcome>
    where
        D: ApprovalDecision + ?Sized,
        S: TripIdSupplier + ?Sized,
    {
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let result = self.allocate_order_line(line, index, approval, next_trip_id);
                Self::log_outcome(i + 1, &result);
                LineOutcome {
                    line_no: i + 1,
                    result,
                }
            })
            .collect()
    }

    /// 按顺序分配一次提交中的多行订单（可挂起确认）
    pub async fn allocate_submission_async<D, S>(
        &self,
        lines: &[OrderLine],
        index: &mut CarryOverIndex,
        approval: &mut D,
        next_trip_id: &mut S,
    ) -> Vec<LineOutcome>
    where
        D: AsyncApprovalDecision + ?Sized,
        S: TripIdSupplier + ?Sized,
    {
        let mut outcomes = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            let result = self
                .allocate_order_line_async(line, index, approval, next_trip_id)
                .await;
            Self::log_outcome(i + 1, &result);
            outcomes.push(LineOutcome {
                line_no: i + 1,
                result,
            });
        }
        outcomes
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 校验载重上限 → 解析 → 检查搜索规模 → 检查车次规模
    /// （均在任何确认与取号之前）
    ///
    /// 车次规模按可能并入的结转余量从宽估计，确认后不会再超限
    fn prepare(
        &self,
        line: &OrderLine,
        index: &CarryOverIndex,
    ) -> AllocationResult<(TripCapacity, Vec<ParsedItem>)> {
        let capacity = TripCapacity::new(line.capacity)
            .ok_or(AllocationError::InvalidCapacity(line.capacity))?;

        let items = self.parser.parse(&line.customers, &line.quantities)?;

        let flexible_count = items.iter().filter(|i| !i.fixed).count();
        self.allocator.check_waiting_bound(flexible_count)?;

        let fixed_count = (items.len() - flexible_count) as u64;
        let flexible_estimate = TripAllocator::estimate_trip_count(
            items.iter().filter(|i| !i.fixed).map(|i| {
                let carry_over = index
                    .get(&i.customer, line.date)
                    .filter(|entry| entry.is_available_for(line.date))
                    .map_or(0.0, |entry| entry.amount);
                i.amount + carry_over
            }),
            capacity,
        );
        self.allocator
            .check_trip_bound(flexible_estimate.saturating_add(fixed_count))?;

        Ok((capacity, items))
    }

    fn finish<S>(
        &self,
        line: &OrderLine,
        capacity: TripCapacity,
        resolved: Vec<ParsedItem>,
        next_trip_id: &mut S,
    ) -> AllocationResult<Vec<Trip>>
    where
        S: TripIdSupplier + ?Sized,
    {
        let slot = line.slot();
        let (fixed, flexible): (Vec<ParsedItem>, Vec<ParsedItem>) =
            resolved.into_iter().partition(|item| item.fixed);

        let waiting: Vec<WaitingItem> = flexible
            .into_iter()
            .map(|item| WaitingItem::new(item.customer, item.amount))
            .collect();

        let fixed_trips = self.assembler.fixed_trips(&fixed, &slot, next_trip_id);
        let allocated = self
            .allocator
            .allocate(waiting, capacity, &slot, next_trip_id)?;
        let trips = self.assembler.assemble(fixed_trips, allocated);

        let summary = AllocationSummary::from_trips(&trips, capacity);
        info!(
            trip_count = summary.trip_count,
            fixed_trip_count = summary.fixed_trip_count,
            record_count = summary.record_count,
            average_fill_ratio = summary.average_fill_ratio,
            "订单行分配完成"
        );

        Ok(trips)
    }

    fn log_outcome(line_no: usize, result: &AllocationResult<Vec<Trip>>) {
        if let Err(e) = result {
            warn!(line_no, error = %e, "订单行分配失败，已跳过");
        }
    }
}

impl Default for TripAllocationEngine {
    fn default() -> Self {
        Self::new(&AllocationSettings::default())
    }
}

/// 按默认配置分配一行订单
pub fn allocate_order_line<D, S>(
    line: &OrderLine,
    index: &mut CarryOverIndex,
    approval: &mut D,
    next_trip_id: &mut S,
) -> AllocationResult<Vec<Trip>>
where
    D: ApprovalDecision + ?Sized,
    S: TripIdSupplier + ?Sized,
{
    TripAllocationEngine::default().allocate_order_line(line, index, approval, next_trip_id)
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::carry_over::CarryOverEntry;
    use crate::domain::types::CarryOverOrigin;
    use crate::engine::approval::{ApproveAll, DeclineAll};
    use crate::engine::trip_id::SequentialTripIdSupplier;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn test_invalid_capacity_checked_before_parsing() {
        let engine = TripAllocationEngine::default();
        let line = OrderLine::new("A,B", "1", day(), "AM", 0.0);
        let err = engine
            .allocate_order_line(
                &line,
                &mut CarryOverIndex::new(),
                &mut DeclineAll,
                &mut SequentialTripIdSupplier::new(day()),
            )
            .unwrap_err();
        assert_eq!(err, AllocationError::InvalidCapacity(0.0));
    }

    #[test]
    fn test_rejected_line_does_not_prompt_or_take_ids() {
        let engine = TripAllocationEngine::default();
        let mut index = CarryOverIndex::new();
        index.insert(CarryOverEntry::new("A", day(), "AM", 2.0, CarryOverOrigin::PriorAllocation));
        let mut prompts = 0;
        let mut approval = |_: &str, _: f64, _: CarryOverOrigin| {
            prompts += 1;
            true
        };
        let mut ids = SequentialTripIdSupplier::new(day());

        let line = OrderLine::new("A,B", "1,bad", day(), "AM", 10.0);
        let result = engine.allocate_order_line(&line, &mut index, &mut approval, &mut ids);

        assert!(matches!(result, Err(AllocationError::InvalidQuantity { .. })));
        assert_eq!(prompts, 0);
        assert_eq!(ids.next_seq(), 1);
        assert!(!index.get("A", day()).unwrap().approved);
    }

    #[test]
    fn test_huge_quantity_rejected_before_prompt_and_ids() {
        let engine = TripAllocationEngine::default();
        let mut index = CarryOverIndex::new();
        index.insert(CarryOverEntry::new("B", day(), "AM", 2.0, CarryOverOrigin::PriorAllocation));
        let mut prompts = 0;
        let mut approval = |_: &str, _: f64, _: CarryOverOrigin| {
            prompts += 1;
            true
        };
        let mut ids = SequentialTripIdSupplier::new(day());

        for (customers, quantities) in [("A", "1e20"), ("A,B", "1e20,1")] {
            let line = OrderLine::new(customers, quantities, day(), "AM", 1.0);
            let result = engine.allocate_order_line(&line, &mut index, &mut approval, &mut ids);
            assert!(matches!(result, Err(AllocationError::TooManyTrips { .. })));
        }

        assert_eq!(prompts, 0);
        assert_eq!(ids.next_seq(), 1);
        assert!(!index.get("B", day()).unwrap().exhausted);
    }

    #[test]
    fn test_trip_bound_counts_carry_over_and_fixed_items() {
        let settings = AllocationSettings {
            max_trips_per_line: 3,
            ..AllocationSettings::default()
        };
        let engine = TripAllocationEngine::new(&settings);
        let mut index = CarryOverIndex::new();
        index.insert(CarryOverEntry::new("A", day(), "AM", 15.0, CarryOverOrigin::PriorAllocation));

        // 5 + 15 结转 → 2 车次，加整车 B 1 车次，再加 C 1 车次 = 4
        let line = OrderLine::new("A,B,C", "5,30L,1", day(), "AM", 10.0);
        let err = engine
            .allocate_order_line(
                &line,
                &mut index,
                &mut ApproveAll,
                &mut SequentialTripIdSupplier::new(day()),
            )
            .unwrap_err();
        assert_eq!(err, AllocationError::TooManyTrips { estimated: 4, limit: 3 });
        assert!(!index.get("A", day()).unwrap().approved);

        // 无结转时 1 + 1 + 1 = 3，可分配
        let trips = engine
            .allocate_order_line(
                &line,
                &mut CarryOverIndex::new(),
                &mut DeclineAll,
                &mut SequentialTripIdSupplier::new(day()),
            )
            .unwrap();
        assert_eq!(trips.len(), 3);
    }

    #[test]
    fn test_fixed_load_isolated() {
        let engine = TripAllocationEngine::default();
        let mut index = CarryOverIndex::new();
        index.insert(
            CarryOverEntry::new("A", day(), "AM", 2.0, CarryOverOrigin::PriorAllocation)
                .pre_approved(),
        );
        let line = OrderLine::new("A,B", "3L,4", day(), "AM", 10.0);

        let trips = engine
            .allocate_order_line(
                &line,
                &mut index,
                &mut ApproveAll,
                &mut SequentialTripIdSupplier::new(day()),
            )
            .unwrap();

        assert_eq!(trips.len(), 2);
        assert!(trips[0].is_fixed_load());
        assert_eq!(trips[0].load(), 3.0);
        assert_eq!(trips[1].customer, "B");
        assert_ne!(trips[0].trip_id, trips[1].trip_id);
    }

    #[test]
    fn test_free_function_uses_defaults() {
        let line = OrderLine::new("A", "25", day(), "AM", 10.0);
        let trips = allocate_order_line(
            &line,
            &mut CarryOverIndex::new(),
            &mut DeclineAll,
            &mut SequentialTripIdSupplier::new(day()),
        )
        .unwrap();
        let loads: Vec<f64> = trips.iter().map(|t| t.load()).collect();
        assert_eq!(loads, vec![10.0, 10.0, 5.0]);
    }
}
