// ==========================================
// 客户批量导入 - 作业控制器
// ==========================================
// 职责: 持有作业状态与进度计数, 供运行器与 UI/CLI 并发读写
// 实现: tokio::sync::watch, 订阅方总能读到最新值; 逐条结果只由运行器持有
// 状态机见 domain::types::JobState
// ==========================================

use crate::domain::job::{ImportProgress, ImportStats};
use crate::domain::types::JobState;
use crate::importer::error::{ImportError, ImportResult};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

pub struct JobController {
    job_id: String,
    state_tx: watch::Sender<JobState>,
    progress_tx: watch::Sender<ImportProgress>,
}

impl Default for JobController {
    fn default() -> Self {
        Self::new()
    }
}

impl JobController {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(JobState::Idle);
        let (progress_tx, _) = watch::channel(ImportProgress::default());
        Self {
            job_id: Uuid::new_v4().to_string(),
            state_tx,
            progress_tx,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn state(&self) -> JobState {
        *self.state_tx.borrow()
    }

    /// 状态转换: 仅当当前状态在 from 中时切换到 to
    fn transition(&self, from: &[JobState], to: JobState) -> bool {
        let changed = self.state_tx.send_if_modified(|state| {
            if from.contains(state) {
                *state = to;
                true
            } else {
                false
            }
        });
        if changed {
            info!(job_id = %self.job_id, state = %to, "作业状态变更");
        }
        changed
    }

    /// Idle → Running, 并以 total 重置进度
    pub fn start(&self, total: usize) -> ImportResult<()> {
        if !self.transition(&[JobState::Idle], JobState::Running) {
            return Err(ImportError::JobAlreadyStarted(self.state().to_string()));
        }
        self.progress_tx.send_replace(ImportProgress::new(total));
        Ok(())
    }

    /// Running → Paused; 其他状态下无效果
    pub fn pause(&self) -> bool {
        self.transition(&[JobState::Running], JobState::Paused)
    }

    /// Paused → Running; 其他状态下无效果
    pub fn resume(&self) -> bool {
        self.transition(&[JobState::Paused], JobState::Running)
    }

    /// Running | Paused → Cancelled; 其他状态下无效果
    pub fn cancel(&self) -> bool {
        self.transition(&[JobState::Running, JobState::Paused], JobState::Cancelled)
    }

    /// Running | Paused → Completed; 已取消则保持取消
    pub fn complete(&self) -> bool {
        self.transition(&[JobState::Running, JobState::Paused], JobState::Completed)
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.state() == JobState::Cancelled
    }

    pub fn is_paused(&self) -> bool {
        self.state() == JobState::Paused
    }

    /// 发布最新进度计数
    pub fn publish(&self, stats: &ImportStats) {
        self.progress_tx.send_replace(stats.progress());
    }

    /// 当前进度快照
    pub fn snapshot(&self) -> ImportProgress {
        *self.progress_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<JobState> {
        self.state_tx.subscribe()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<ImportProgress> {
        self.progress_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_only_from_idle() {
        let controller = JobController::new();
        controller.start(2).unwrap();
        assert_eq!(controller.state(), JobState::Running);
        assert_eq!(controller.snapshot().total, 2);

        let err = controller.start(2).unwrap_err();
        assert!(matches!(err, ImportError::JobAlreadyStarted(_)));
    }

    #[test]
    fn test_pause_resume_are_idempotent() {
        let controller = JobController::new();
        assert!(!controller.pause());

        controller.start(1).unwrap();
        assert!(controller.pause());
        assert!(!controller.pause());
        assert!(controller.is_paused());

        assert!(controller.resume());
        assert!(!controller.resume());
        assert_eq!(controller.state(), JobState::Running);
    }

    #[test]
    fn test_cancel_is_terminal() {
        let controller = JobController::new();
        assert!(!controller.cancel());

        controller.start(1).unwrap();
        controller.pause();
        assert!(controller.cancel());
        assert!(controller.is_cancel_requested());

        assert!(!controller.resume());
        assert!(!controller.complete());
        assert_eq!(controller.state(), JobState::Cancelled);
    }

    #[test]
    fn test_subscribers_see_latest_state() {
        let controller = JobController::new();
        let rx = controller.subscribe_state();
        controller.start(0).unwrap();
        controller.complete();
        assert_eq!(*rx.borrow(), JobState::Completed);
    }

    #[test]
    fn test_publish_carries_counters_only() {
        use crate::domain::job::RecordResult;
        use crate::domain::record::ImportRecord;

        let controller = JobController::new();
        controller.start(3).unwrap();
        let rx = controller.subscribe_progress();

        let mut stats = ImportStats::new(3);
        stats.record(RecordResult::succeeded(ImportRecord::default(), None));
        stats.record(RecordResult::failed(ImportRecord::default(), "x".into()));
        controller.publish(&stats);

        let expected = ImportProgress {
            total: 3,
            processed: 2,
            success: 1,
            failed: 1,
        };
        assert_eq!(*rx.borrow(), expected);
        assert_eq!(controller.snapshot(), expected);
        assert_eq!(controller.snapshot().remaining(), 1);
    }
}
