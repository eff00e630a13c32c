// ==========================================
// 物流派车系统 - 引擎层
// ==========================================
// 职责: 订单解析、结转合并、车次分配、结果组装
// 红线: 引擎不做持久化，不内置任何 UI 确认
// ==========================================

pub mod approval;
pub mod carry_over_resolver;
pub mod error;
pub mod orchestrator;
pub mod order_parser;
pub mod result_assembler;
pub mod summary;
pub mod trip_allocator;
pub mod trip_id;

// 重导出核心引擎
pub use approval::{
    ApprovalDecision, ApprovalRequest, ApproveAll, AsyncApprovalDecision, BlockingApproval,
    ChannelApproval, DeclineAll,
};
pub use carry_over_resolver::CarryOverResolver;
pub use error::{AllocationError, AllocationResult};
pub use orchestrator::{allocate_order_line, LineOutcome, TripAllocationEngine};
pub use order_parser::OrderParser;
pub use result_assembler::ResultAssembler;
pub use summary::{AllocationSummary, TripLoad};
pub use trip_allocator::TripAllocator;
pub use trip_id::{SequentialTripIdSupplier, TripIdSupplier, UuidTripIdSupplier};
