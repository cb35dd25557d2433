// ==========================================
// 车队批量导入系统 - 引擎层
// ==========================================
// 职责: 行处理的业务规则(规范化/解析/对账/组装/提交/编排)
// 红线: 规范化-解析-对账-组装为纯计算;提交是唯一并发组件
// ==========================================

pub mod error;
pub mod mappers;
pub mod normalizer;
pub mod orchestrator;
pub mod reconciler;
pub mod resolver;
pub mod submitter;

// 重导出核心引擎
pub use error::{RowError, RowResult};
pub use mappers::{
    FuelCardMapper, InsuranceMapper, ReminderMapper, RowMapper, ScheduledExpenseMapper,
};
pub use orchestrator::{LoadOrchestrator, PipelineError};
pub use reconciler::{
    reconcile_gross, reconcile_net, GrossReconciliation, ReconciledAmounts, RECONCILE_EPSILON,
};
pub use resolver::EntityResolver;
pub use submitter::{
    BatchSubmitter, HttpSubmitter, Submitter, DEFAULT_CONCURRENCY, DEFAULT_PACING,
};
