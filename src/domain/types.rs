// ==========================================
// 客户批量导入 - 领域类型定义
// ==========================================
// 职责: 人员类型 / 作业状态等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 人员类型 (Person Type)
// ==========================================
// 表格中允许的写法（大小写不敏感）: 两个长写法 + 两个缩写
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonType {
    Individual, // 自然人 (CPF)
    Company,    // 法人 (CNPJ)
}

impl PersonType {
    /// 允许的取值（已转小写）
    pub const ACCEPTED_TOKENS: [&'static str; 4] =
        ["pessoa física", "pessoa jurídica", "pf", "pj"];

    /// 解析表格中的人员类型（TRIM + 小写后匹配）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pessoa física" | "pf" => Some(PersonType::Individual),
            "pessoa jurídica" | "pj" => Some(PersonType::Company),
            _ => None,
        }
    }

    pub fn short_code(&self) -> &'static str {
        match self {
            PersonType::Individual => "PF",
            PersonType::Company => "PJ",
        }
    }
}

impl fmt::Display for PersonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonType::Individual => write!(f, "Pessoa Física"),
            PersonType::Company => write!(f, "Pessoa Jurídica"),
        }
    }
}

// ==========================================
// 作业状态 (Job State)
// ==========================================
// 状态机:
//   Idle → Running (start)
//   Running ↔ Paused (pause / resume)
//   Running | Paused → Cancelled (终态)
//   Running | Paused → Completed (记录全部处理完毕, 终态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Idle,      // 未开始
    Running,   // 执行中
    Paused,    // 已暂停
    Cancelled, // 已取消
    Completed, // 已完成
}

impl JobState {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Cancelled | JobState::Completed)
    }

    /// 作业是否已启动且尚未结束
    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Running | JobState::Paused)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Idle => write!(f, "IDLE"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Paused => write!(f, "PAUSED"),
            JobState::Cancelled => write!(f, "CANCELLED"),
            JobState::Completed => write!(f, "COMPLETED"),
        }
    }
}
