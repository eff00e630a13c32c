// ==========================================
// 物流派车系统 - 结转合并确认
// ==========================================
// 职责: 定义结转合并的确认接口（替代交互式确认对话框）
// 说明: 引擎只依赖 trait，UI 弹窗/命令行/批量规则由宿主实现
// 红线: 无决策等同于拒绝，引擎内不内置任何 UI
// ==========================================

use crate::domain::types::{ApprovalPolicy, CarryOverOrigin};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

// ==========================================
// 同步确认 Trait
// ==========================================

/// 结转合并确认（同步）
///
/// # 返回
/// - `true`: 同意把结转余量并入当前数量
/// - `false`: 拒绝，条目保留给后续决策点
pub trait ApprovalDecision {
    fn approve(&mut self, customer: &str, amount: f64, origin: CarryOverOrigin) -> bool;
}

impl<F> ApprovalDecision for F
where
    F: FnMut(&str, f64, CarryOverOrigin) -> bool,
{
    fn approve(&mut self, customer: &str, amount: f64, origin: CarryOverOrigin) -> bool {
        self(customer, amount, origin)
    }
}

// ==========================================
// 异步确认 Trait
// ==========================================

/// 结转合并确认（可挂起）
///
/// 用于事件驱动宿主：等待用户应答期间不阻塞其他任务
#[async_trait]
pub trait AsyncApprovalDecision: Send {
    async fn approve(&mut self, customer: &str, amount: f64, origin: CarryOverOrigin) -> bool;
}

// ==========================================
// 内置策略
// ==========================================

/// 全部拒绝（未提供决策时使用）
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineAll;

/// 全部同意
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproveAll;

impl ApprovalDecision for DeclineAll {
    fn approve(&mut self, customer: &str, amount: f64, origin: CarryOverOrigin) -> bool {
        tracing::debug!(customer, amount, %origin, "DeclineAll: 拒绝结转合并");
        false
    }
}

impl ApprovalDecision for ApproveAll {
    fn approve(&mut self, _customer: &str, _amount: f64, _origin: CarryOverOrigin) -> bool {
        true
    }
}

impl ApprovalDecision for ApprovalPolicy {
    fn approve(&mut self, customer: &str, amount: f64, origin: CarryOverOrigin) -> bool {
        match self {
            ApprovalPolicy::ApproveAll => {
                ApprovalDecision::approve(&mut ApproveAll, customer, amount, origin)
            }
            ApprovalPolicy::DeclineAll => {
                ApprovalDecision::approve(&mut DeclineAll, customer, amount, origin)
            }
        }
    }
}

#[async_trait]
impl AsyncApprovalDecision for DeclineAll {
    async fn approve(&mut self, customer: &str, amount: f64, origin: CarryOverOrigin) -> bool {
        ApprovalDecision::approve(self, customer, amount, origin)
    }
}

#[async_trait]
impl AsyncApprovalDecision for ApproveAll {
    async fn approve(&mut self, customer: &str, amount: f64, origin: CarryOverOrigin) -> bool {
        ApprovalDecision::approve(self, customer, amount, origin)
    }
}

#[async_trait]
impl AsyncApprovalDecision for ApprovalPolicy {
    async fn approve(&mut self, customer: &str, amount: f64, origin: CarryOverOrigin) -> bool {
        ApprovalDecision::approve(self, customer, amount, origin)
    }
}

/// 同步决策适配为异步决策
pub struct BlockingApproval<D>(pub D);

#[async_trait]
impl<D> AsyncApprovalDecision for BlockingApproval<D>
where
    D: ApprovalDecision + Send,
{
    async fn approve(&mut self, customer: &str, amount: f64, origin: CarryOverOrigin) -> bool {
        ApprovalDecision::approve(&mut self.0, customer, amount, origin)
    }
}

// ==========================================
// 通道确认（事件驱动宿主）
// ==========================================

/// 待确认请求，由宿主 UI 消费并应答
#[derive(Debug)]
pub struct ApprovalRequest {
    pub customer: String,
    pub amount: f64,
    pub origin: CarryOverOrigin,
    responder: oneshot::Sender<bool>,
}

impl ApprovalRequest {
    /// 应答请求；引擎已放弃等待时静默忽略
    pub fn respond(self, approved: bool) {
        let _ = self.responder.send(approved);
    }
}

/// 通过 mpsc 通道把确认请求转交宿主，并等待 oneshot 应答
///
/// 通道关闭或应答方丢弃请求均视为拒绝
#[derive(Debug, Clone)]
pub struct ChannelApproval {
    sender: mpsc::Sender<ApprovalRequest>,
}

impl ChannelApproval {
    /// 创建通道确认
    ///
    /// # 返回
    /// (确认器, 宿主侧请求接收端)
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ApprovalRequest>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl AsyncApprovalDecision for ChannelApproval {
    async fn approve(&mut self, customer: &str, amount: f64, origin: CarryOverOrigin) -> bool {
        let (responder, response) = oneshot::channel();
        let request = ApprovalRequest {
            customer: customer.to_string(),
            amount,
            origin,
            responder,
        };

        if self.sender.send(request).await.is_err() {
            tracing::warn!(customer, amount, "确认通道已关闭，按拒绝处理");
            return false;
        }

        match response.await {
            Ok(approved) => approved,
            Err(_) => {
                tracing::warn!(customer, amount, "确认请求未获应答，按拒绝处理");
                false
            }
        }
    }
}
