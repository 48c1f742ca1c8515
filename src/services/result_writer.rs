//! 结果写入服务 - 业务能力层
//!
//! 把一次会话的全部作答整理成评测记录，一次性写入结果表。
//! "提交时递增"策略下，status 递增与记录写入在同一事务内完成

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppResult, SubmissionError};
use crate::infrastructure::{ClaimTarget, ResultWrite, SurveyStore, TableLayout};
use crate::models::{ClaimPolicy, EvaluationRecord};
use crate::workflow::session::Session;

/// 结果写入服务
#[derive(Debug, Clone)]
pub struct ResultWriter {
    layout: TableLayout,
    /// 仅在"提交时递增"策略下设置
    claim: Option<ClaimTarget>,
    verbose: bool,
}

impl ResultWriter {
    pub fn new(layout: TableLayout, claim: Option<ClaimTarget>) -> Self {
        Self {
            layout,
            claim,
            verbose: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let claim = match config.claim_policy {
            ClaimPolicy::AtSubmission => Some(ClaimTarget {
                item_table: config.item_table.clone(),
                natural_key: config.natural_key,
            }),
            ClaimPolicy::AtSampling => None,
        };
        Self {
            layout: config.table_layout(),
            claim,
            verbose: config.verbose_logging,
        }
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// 是否在提交时递增 status
    pub fn claims_on_submit(&self) -> bool {
        self.claim.is_some()
    }

    /// 把会话作答整理成评测记录
    ///
    /// 检查顺序：已提交 → 空批次 → 未作答完
    pub fn build_records(
        &self,
        session: &Session,
        submission_time: DateTime<Utc>,
    ) -> Result<Vec<EvaluationRecord>, SubmissionError> {
        if session.is_submitted() {
            return Err(SubmissionError::AlreadySubmitted {
                session_id: session.id(),
            });
        }
        if session.batch().is_empty() {
            return Err(SubmissionError::EmptyBatch);
        }
        let missing = session.missing_positions();
        if !missing.is_empty() {
            return Err(SubmissionError::Incomplete { missing });
        }

        // 提交时间不早于会话开始时间
        let submission_time = submission_time.max(session.start_time());

        let records = session
            .batch()
            .iter()
            .zip(session.responses())
            .enumerate()
            .map(|(i, (item, response))| EvaluationRecord {
                session_id: session.id(),
                position: i + 1,
                item: item.clone(),
                judgment: response.judgment,
                comment: response.comment.clone(),
                session_start: session.start_time(),
                submission_time,
            })
            .collect();

        Ok(records)
    }

    /// 提交会话：整理记录并在单个事务中写入
    ///
    /// 写入失败时不会留下部分记录，会话保持未提交状态
    pub async fn submit(&self, store: &dyn SurveyStore, session: &mut Session) -> AppResult<usize> {
        let submission_time = Utc::now();
        let records = self.build_records(session, submission_time)?;
        let submitted_at = records
            .first()
            .map(|r| r.submission_time)
            .unwrap_or(submission_time);

        if self.verbose {
            for record in &records {
                match serde_json::to_string(record) {
                    Ok(json) => debug!("📝 待写入记录: {}", json),
                    Err(e) => debug!("记录序列化失败: {}", e),
                }
            }
        }

        let write = ResultWrite {
            result_table: self.layout.result_table.clone(),
            judgment_column: self.layout.judgment_column.clone(),
            records,
            claim: self.claim.clone(),
        };

        let written = store.append_results(&write).await?;
        session.mark_submitted(submitted_at);

        info!(
            "✅ {} 已提交: 写入 {} 条记录到 {}{}",
            session,
            written,
            self.layout.result_table,
            if self.claims_on_submit() {
                "（已同步递增 status）"
            } else {
                ""
            }
        );

        Ok(written)
    }
}
