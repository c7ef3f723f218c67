// ==========================================
// 客户批量导入 - 作业运行器
// ==========================================
// 职责: 按文件顺序逐条投递合法记录, 支持暂停/继续/取消与退避重试
// 不变式:
// - 每条记录最多 max_attempts 次投递, 只产生一条结果
// - 每条结果写入后立即发布进度 (processed 单调不减)
// - 取消后不再开始新的记录
// ==========================================

use crate::delivery::client::{DeliveryClient, DeliveryError, DeliveryReceipt};
use crate::domain::job::{ImportStats, RecordResult};
use crate::domain::record::ImportRecord;
use crate::domain::types::JobState;
use crate::engine::job_controller::JobController;
use crate::engine::retry::RetryPolicy;
use crate::importer::error::ImportResult;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_INTER_RECORD_DELAY_MS: u64 = 500;
pub const DEFAULT_PAUSE_POLL_INTERVAL_MS: u64 = 500;

/// 运行参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerSettings {
    pub retry: RetryPolicy,
    pub inter_record_delay: Duration, // 相邻两条记录之间的间隔
    pub pause_poll_interval: Duration, // 暂停时的轮询间隔
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            inter_record_delay: Duration::from_millis(DEFAULT_INTER_RECORD_DELAY_MS),
            pause_poll_interval: Duration::from_millis(DEFAULT_PAUSE_POLL_INTERVAL_MS),
        }
    }
}

pub struct ImportJobRunner<D> {
    client: D,
    settings: RunnerSettings,
}

impl<D: DeliveryClient> ImportJobRunner<D> {
    pub fn new(client: D, settings: RunnerSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// 执行导入作业
    ///
    /// # 参数
    /// - records: 合法记录（文件顺序）
    /// - controller: 作业控制器, 必须处于 Idle
    ///
    /// # 返回
    /// 结束时的进度统计; 作业状态为 Completed 或 Cancelled
    #[instrument(skip_all, fields(job_id = %controller.job_id(), total = records.len()))]
    pub async fn run(
        &self,
        records: Vec<ImportRecord>,
        controller: &JobController,
    ) -> ImportResult<ImportStats> {
        let started = Instant::now();
        controller.start(records.len())?;

        let mut stats = ImportStats::new(records.len());
        controller.publish(&stats);
        info!("导入作业开始");

        let last_index = records.len().saturating_sub(1);
        for (i, record) in records.into_iter().enumerate() {
            if !self.wait_while_paused(controller).await {
                info!(processed = stats.processed, "作业已取消，停止处理剩余记录");
                break;
            }

            let result = match self.deliver_with_retry(&record, controller).await {
                Ok(receipt) => RecordResult::succeeded(record, receipt.credentials),
                Err(e) => RecordResult::failed(record, e.to_string()),
            };
            stats.record(result);
            controller.publish(&stats);
            debug!(
                processed = stats.processed,
                success = stats.success,
                failed = stats.failed,
                "进度已更新"
            );

            if i < last_index {
                self.sleep_unless_cancelled(self.settings.inter_record_delay, controller)
                    .await;
            }
        }

        controller.complete();
        info!(
            state = %controller.state(),
            processed = stats.processed,
            success = stats.success,
            failed = stats.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "导入作业结束"
        );
        Ok(stats)
    }

    /// 暂停时轮询等待; 返回 false 表示已取消
    async fn wait_while_paused(&self, controller: &JobController) -> bool {
        while controller.is_paused() {
            tokio::time::sleep(self.settings.pause_poll_interval).await;
        }
        !controller.is_cancel_requested()
    }

    /// 投递一条记录, 失败按退避策略重试
    async fn deliver_with_retry(
        &self,
        record: &ImportRecord,
        controller: &JobController,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let policy = self.settings.retry;
        let mut errors = Vec::new();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.client.deliver(record).await {
                Ok(receipt) => {
                    if attempt > 1 {
                        info!(row = record.row_index, attempt, "重试后开通成功");
                    }
                    return Ok(receipt);
                }
                Err(e) => {
                    warn!(row = record.row_index, attempt, error = %e, "开通失败");
                    errors.push(e.to_string());

                    if !policy.should_retry(attempt) {
                        break;
                    }
                    let delay = policy.delay_after(attempt);
                    if !self.sleep_unless_cancelled(delay, controller).await {
                        break;
                    }
                }
            }
        }

        Err(DeliveryError::Exhausted {
            attempts: attempt,
            errors,
        })
    }

    /// 等待指定时长, 期间取消则立即返回 false
    async fn sleep_unless_cancelled(&self, duration: Duration, controller: &JobController) -> bool {
        let mut state_rx = controller.subscribe_state();
        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);

        loop {
            if *state_rx.borrow_and_update() == JobState::Cancelled {
                return false;
            }
            tokio::select! {
                _ = &mut sleep => return !controller.is_cancel_requested(),
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        (&mut sleep).await;
                        return !controller.is_cancel_requested();
                    }
                }
            }
        }
    }
}
