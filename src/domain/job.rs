// ==========================================
// 客户批量导入 - 作业领域模型
// ==========================================
// 职责: 校验结果 / 单条开通结果 / 进度计数与统计 / 运行汇总
// ==========================================

use crate::domain::record::ImportRecord;
use crate::domain::types::JobState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ValidationOutcome - 校验结果
// ==========================================
// 记录序号 → 错误列表; 序号不存在即为合法记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    errors: BTreeMap<usize, Vec<String>>,
}

impl ValidationOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一条记录的错误（空列表不登记）
    pub fn insert(&mut self, index: usize, errors: Vec<String>) {
        if !errors.is_empty() {
            self.errors.insert(index, errors);
        }
    }

    pub fn is_valid(&self, index: usize) -> bool {
        !self.errors.contains_key(&index)
    }

    pub fn errors_for(&self, index: usize) -> Option<&[String]> {
        self.errors.get(&index).map(|v| v.as_slice())
    }

    /// 不合法记录数
    pub fn invalid_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&usize, &Vec<String>)> {
        self.errors.iter()
    }
}

// ==========================================
// RecordResult - 单条记录的开通结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    pub record: ImportRecord,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>, // 临时凭证
}

impl RecordResult {
    pub fn succeeded(record: ImportRecord, credentials: Option<String>) -> Self {
        Self {
            record,
            success: true,
            error: None,
            credentials,
        }
    }

    pub fn failed(record: ImportRecord, error: String) -> Self {
        Self {
            record,
            success: false,
            error: Some(error),
            credentials: None,
        }
    }
}

// ==========================================
// ImportStats - 作业进度统计
// ==========================================
// 不变式:
// - processed == success + failed
// - processed 单调不减, results 只追加
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportStats {
    pub total: usize,
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
    pub results: Vec<RecordResult>,
}

impl ImportStats {
    /// 以合法记录数初始化
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// 追加一条结果并同步更新计数
    pub fn record(&mut self, result: RecordResult) {
        if result.success {
            self.success += 1;
        } else {
            self.failed += 1;
        }
        self.processed += 1;
        self.results.push(result);
    }

    pub fn is_consistent(&self) -> bool {
        self.progress().is_consistent() && self.processed == self.results.len()
    }

    /// 只含计数的进度快照
    pub fn progress(&self) -> ImportProgress {
        ImportProgress {
            total: self.total,
            processed: self.processed,
            success: self.success,
            failed: self.failed,
        }
    }

    pub fn remaining(&self) -> usize {
        self.progress().remaining()
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress().progress_percent()
    }
}

// ==========================================
// ImportProgress - 进度计数（作业控制器对外发布）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub total: usize,
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
}

impl ImportProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.processed == self.success + self.failed
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed)
    }

    /// 进度百分比（0-100）
    pub fn progress_percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed * 100) / self.total).min(100) as u8
    }
}

// ==========================================
// RunSummary - 运行汇总（供 UI / CLI 展示）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub job_id: String,
    pub state: JobState,
    pub total: usize,
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn from_stats(job_id: String, state: JobState, stats: &ImportStats, elapsed_ms: u64) -> Self {
        Self {
            job_id,
            state,
            total: stats.total,
            processed: stats.processed,
            success: stats.success,
            failed: stats.failed,
            elapsed_ms,
        }
    }

    /// 运行结束且同时存在成功与失败
    pub fn is_partial_failure(&self) -> bool {
        self.success > 0 && self.failed > 0
    }
}
