//! 评测记录（EvaluationRecord）
//!
//! 一位评测员在一次会话里对一个条目的判断，写入后不可修改

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::item::{CandidateItem, ItemKey};
use crate::models::judgment::Judgment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// 所属会话
    pub session_id: Uuid,
    /// 题号（从 1 开始）
    pub position: usize,
    /// 被评判条目的副本
    pub item: CandidateItem,
    pub judgment: Judgment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub session_start: DateTime<Utc>,
    pub submission_time: DateTime<Utc>,
}

impl EvaluationRecord {
    /// 对应源条目的自然键
    pub fn item_key(&self) -> ItemKey {
        self.item.key()
    }
}
