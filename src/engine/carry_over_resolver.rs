// ==========================================
// 物流派车系统 - 结转余量解析器
// ==========================================
// 职责: 为非整车订单项查找同日结转余量，经确认后并入数量
// 输入: ParsedItem 列表 + 结转索引 + 确认决策
// 输出: 合并后的 ParsedItem 列表（更新条目 approved/exhausted）
// 红线: 整车项不参与合并；拒绝不是错误
// ==========================================

use crate::domain::carry_over::{CarryOverEntry, CarryOverIndex};
use crate::domain::order::ParsedItem;
use crate::engine::approval::{ApprovalDecision, AsyncApprovalDecision};
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

// ==========================================
// CarryOverResolver - 结转余量解析器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CarryOverResolver {
    // 无状态引擎，条目状态由调用方持有
}

impl CarryOverResolver {
    pub fn new() -> Self {
        Self {}
    }

    /// 解析结转合并（同步确认）
    ///
    /// 规则:
    /// 1) 条目已确认: 直接合并，不再询问
    /// 2) 条目未确认: 询问 approval，同意则合并并置 approved
    /// 3) 拒绝: 订单项与条目均保持原样，条目留给后续决策点
    ///
    /// # 参数
    /// - `items`: 解析后的订单项
    /// - `date`: 订单行日期（仅匹配同日条目）
    /// - `index`: 结转索引（会被修改）
    /// - `approval`: 确认决策；无决策时传入 `DeclineAll`
    #[instrument(skip(self, items, index, approval), fields(
        date = %date,
        items_count = items.len(),
        carry_over_count = index.len()
    ))]
    pub fn resolve<D>(
        &self,
        items: Vec<ParsedItem>,
        date: NaiveDate,
        index: &mut CarryOverIndex,
        approval: &mut D,
    ) -> Vec<ParsedItem>
    where
        D: ApprovalDecision + ?Sized,
    {
        let mut resolved = Vec::with_capacity(items.len());
        for mut item in items {
            if let Some(entry) = Self::pending_entry(&item, date, index) {
                let accepted = entry.approved
                    || ApprovalDecision::approve(
                        &mut *approval,
                        &entry.customer,
                        entry.amount,
                        entry.origin,
                    );
                Self::apply(&mut item, entry, accepted);
            }
            resolved.push(item);
        }
        resolved
    }

    /// 解析结转合并（可挂起确认）
    ///
    /// 语义与 [`CarryOverResolver::resolve`] 一致，确认过程可 await
    #[instrument(skip(self, items, index, approval), fields(
        date = %date,
        items_count = items.len(),
        carry_over_count = index.len()
    ))]
    pub async fn resolve_async<D>(
        &self,
        items: Vec<ParsedItem>,
        date: NaiveDate,
        index: &mut CarryOverIndex,
        approval: &mut D,
    ) -> Vec<ParsedItem>
    where
        D: AsyncApprovalDecision + ?Sized,
    {
        let mut resolved = Vec::with_capacity(items.len());
        for mut item in items {
            if let Some(entry) = Self::pending_entry(&item, date, index) {
                let accepted = if entry.approved {
                    true
                } else {
                    let customer = entry.customer.clone();
                    approval.approve(&customer, entry.amount, entry.origin).await
                };
                Self::apply(&mut item, entry, accepted);
            }
            resolved.push(item);
        }
        resolved
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 查找可合并条目（非整车、同日、正余量、未耗尽）
    fn pending_entry<'a>(
        item: &ParsedItem,
        date: NaiveDate,
        index: &'a mut CarryOverIndex,
    ) -> Option<&'a mut CarryOverEntry> {
        if item.fixed {
            return None;
        }
        index
            .get_mut(&item.customer, date)
            .filter(|entry| entry.is_available_for(date))
    }

    fn apply(item: &mut ParsedItem, entry: &mut CarryOverEntry, accepted: bool) {
        if !accepted {
            debug!(
                customer = %item.customer,
                carry_over_t = entry.amount,
                origin = %entry.origin,
                "结转合并被拒绝，保留条目"
            );
            return;
        }

        let before = item.amount;
        item.amount += entry.amount;
        entry.approved = true;
        entry.exhausted = true;

        info!(
            customer = %item.customer,
            origin = %entry.origin,
            before,
            carry_over_t = entry.amount,
            after = item.amount,
            "结转余量已合并"
        );
    }
}
