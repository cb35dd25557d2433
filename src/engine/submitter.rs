// ==========================================
// 车队批量导入系统 - 批量提交引擎
// ==========================================
// 职责: 载荷按固定批并发提交,批间定速休眠
// 模型: 批是屏障不是流水线 -- 整批等待完成后才进入休眠与下一批
// 红线: 单行失败不阻断同批其余行;不做自动重试
//       (重试 = 对错误产物文件的显式重跑)
// ==========================================

use crate::client::{ApiError, FleetApiClient, SubmitResponse};
use crate::domain::{Payload, RawRow, RowOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// 默认并发批大小
pub const DEFAULT_CONCURRENCY: usize = 5;
/// 默认批间休眠
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

// ==========================================
// Submitter - 提交能力
// ==========================================
// 策略接口: 每个目标端点一种具体实现,测试用内存mock
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn send(&self, payload: &Payload) -> Result<SubmitResponse, ApiError>;
}

// ==========================================
// HttpSubmitter - 远端API提交
// ==========================================
// 按载荷变体路由端点;里程写入失败不阻断记账(omitOdometerIfFails)
pub struct HttpSubmitter {
    client: Arc<FleetApiClient>,
}

impl HttpSubmitter {
    pub fn new(client: Arc<FleetApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    async fn send(&self, payload: &Payload) -> Result<SubmitResponse, ApiError> {
        match payload {
            Payload::Fuel(fuel) => {
                self.client
                    .post("/fuels", &[("omitOdometerIfFails", "true")], fuel)
                    .await
            }
            Payload::Expense(expense) => {
                self.client
                    .post("/expenses", &[("omitOdometerIfFails", "true")], expense)
                    .await
            }
            Payload::ScheduledExpense(scheduled) => {
                self.client.post("/scheduled-expenses", &[], scheduled).await
            }
            Payload::Reminder(reminder) => self.client.post("/reminders", &[], reminder).await,
            Payload::VehicleProperties(properties) => {
                let path = format!("/vehicles/{}/properties", properties.vehicle_id);
                self.client.put(&path, properties).await
            }
        }
    }
}

// ==========================================
// BatchSubmitter - 定速批量分发
// ==========================================
pub struct BatchSubmitter {
    concurrency: usize,
    pacing: Duration,
}

impl BatchSubmitter {
    pub fn new(concurrency: usize, pacing: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            pacing,
        }
    }

    /// 全量提交,返回逐行终态(顺序与入参一致)
    ///
    /// # 流程
    /// 1. 按 concurrency 切批
    /// 2. 整批并发发出并等待全部完成(屏障)
    /// 3. 还有后续批时休眠 pacing
    pub async fn submit_all(
        &self,
        submitter: &dyn Submitter,
        pending: Vec<(Payload, RawRow)>,
    ) -> Vec<RowOutcome> {
        let total = pending.len();
        if total == 0 {
            return Vec::new();
        }

        let batch_count = total.div_ceil(self.concurrency);
        info!(total, batches = batch_count, concurrency = self.concurrency, "开始批量提交");

        let mut outcomes = Vec::with_capacity(total);
        let mut batches = pending.into_iter().peekable();
        let mut batch_idx = 0usize;

        while batches.peek().is_some() {
            batch_idx += 1;
            let batch: Vec<(Payload, RawRow)> = batches.by_ref().take(self.concurrency).collect();

            let futures = batch.into_iter().map(|(payload, row)| async move {
                match submitter.send(&payload).await {
                    Ok(response) => {
                        info!(
                            row = row.row_number,
                            kind = payload.kind_name(),
                            api_id = ?response.id,
                            "提交成功"
                        );
                        RowOutcome::Processed {
                            row,
                            payload,
                            api_id: response.id,
                        }
                    }
                    Err(err) => {
                        error!(
                            row = row.row_number,
                            kind = payload.kind_name(),
                            error = %err,
                            "提交失败,记入提交错误桶"
                        );
                        RowOutcome::SubmissionError {
                            row,
                            payload,
                            reason: err.to_string(),
                        }
                    }
                }
            });

            // 屏障: 整批完成后才继续
            outcomes.extend(futures::future::join_all(futures).await);

            if batches.peek().is_some() {
                info!(
                    batch = batch_idx,
                    of = batch_count,
                    pacing_ms = self.pacing.as_millis() as u64,
                    "批完成,休眠后继续"
                );
                tokio::time::sleep(self.pacing).await;
            }
        }

        outcomes
    }
}

impl Default for BatchSubmitter {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY, DEFAULT_PACING)
    }
}
