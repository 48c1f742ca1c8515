//! 评测会话
//!
//! 一位评测员完成一批题目的全过程。批次在会话创建时抽取一次，
//! 之后的每次渲染都返回同一批次

use chrono::{DateTime, Utc};
use std::fmt::Display;
use uuid::Uuid;

use crate::error::SubmissionError;
use crate::models::{CandidateItem, Judgment, SurveyKind};

/// 单题作答
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub judgment: Judgment,
    pub comment: Option<String>,
}

/// 评测会话
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    survey_kind: SurveyKind,
    start_time: DateTime<Utc>,
    batch: Vec<CandidateItem>,
    responses: Vec<Response>,
    /// 请求的题目数（批次可能更短）
    requested: usize,
    /// 抽样时是否已预占（status 已递增）
    reserved: bool,
    submitted_at: Option<DateTime<Utc>>,
}

impl Session {
    /// 创建新的会话，开始时间为当前时间
    pub fn new(survey_kind: SurveyKind, batch: Vec<CandidateItem>, requested: usize, reserved: bool) -> Self {
        let responses = vec![Response::default(); batch.len()];
        Self {
            id: Uuid::new_v4(),
            survey_kind,
            start_time: Utc::now(),
            batch,
            responses,
            requested,
            reserved,
            submitted_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn survey_kind(&self) -> SurveyKind {
        self.survey_kind
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// 本会话的批次（固定不变）
    pub fn batch(&self) -> &[CandidateItem] {
        &self.batch
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// 按题号（从 1 开始）获取作答
    pub fn response(&self, position: usize) -> Option<&Response> {
        position.checked_sub(1).and_then(|i| self.responses.get(i))
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    /// 候选不足，批次比请求的短
    pub fn is_short(&self) -> bool {
        self.batch.len() < self.requested
    }

    pub fn is_reserved(&self) -> bool {
        self.reserved
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// 设置某题的判断
    pub fn set_judgment(&mut self, position: usize, judgment: Judgment) -> Result<(), SubmissionError> {
        self.response_mut(position)?.judgment = judgment;
        Ok(())
    }

    /// 设置某题的评论，空白视为无评论
    pub fn set_comment(&mut self, position: usize, comment: impl Into<String>) -> Result<(), SubmissionError> {
        let comment = comment.into();
        let trimmed = comment.trim();
        self.response_mut(position)?.comment = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        Ok(())
    }

    /// 未作答的题号（从 1 开始）
    pub fn missing_positions(&self) -> Vec<usize> {
        self.responses
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.judgment.is_set())
            .map(|(i, _)| i + 1)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.responses.iter().all(|r| r.judgment.is_set())
    }

    pub(crate) fn mark_submitted(&mut self, at: DateTime<Utc>) {
        self.submitted_at = Some(at);
    }

    fn response_mut(&mut self, position: usize) -> Result<&mut Response, SubmissionError> {
        if self.submitted_at.is_some() {
            return Err(SubmissionError::AlreadySubmitted { session_id: self.id });
        }
        let batch_len = self.batch.len();
        position
            .checked_sub(1)
            .and_then(|i| self.responses.get_mut(i))
            .ok_or(SubmissionError::UnknownPosition { position, batch_len })
    }
}

impl Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[会话 {} | {} | {}/{} 题]",
            &self.id.to_string()[..8],
            self.survey_kind,
            self.batch.len(),
            self.requested
        )
    }
}
