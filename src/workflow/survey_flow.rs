//! 评测流程 - 流程层
//!
//! 核心职责：定义"一位评测员"的完整流程
//!
//! 流程顺序：
//! 1. 读取候选表 → 抽样 →（抽样时递增）→ 创建会话
//! 2. 评测员作答（由展示端驱动）
//! 3. 提交：写入结果 →（提交时递增）→ 返回回执

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppResult, SamplingError};
use crate::infrastructure::{ClaimTarget, SurveyStore};
use crate::models::{ClaimPolicy, SurveyKind};
use crate::services::{PoolLoader, ResultWriter, Sampler};
use crate::workflow::session::Session;

/// 提交回执
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub session_id: Uuid,
    pub records_written: usize,
    pub submission_time: DateTime<Utc>,
    /// 展示给评测员的完成码（部分问卷没有）
    pub completion_code: Option<String>,
}

/// 评测流程
///
/// - 决定何时抽样、何时递增、何时写入
/// - 持有存储句柄，但不认识表结构细节
/// - 可被多个会话并发共享
pub struct SurveyFlow {
    store: Arc<dyn SurveyStore>,
    pool_loader: PoolLoader,
    sampler: Sampler,
    result_writer: ResultWriter,
    survey_kind: SurveyKind,
    item_table: String,
    claim_policy: ClaimPolicy,
    claim_target: ClaimTarget,
    completion_code: Option<String>,
    rng: Mutex<StdRng>,
}

impl SurveyFlow {
    /// 创建新的评测流程
    ///
    /// 配置了 `rng_seed` 时抽样可复现，否则使用系统熵
    pub fn new(config: &Config, store: Arc<dyn SurveyStore>) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, store, rng)
    }

    /// 使用固定种子创建
    pub fn with_seed(config: &Config, store: Arc<dyn SurveyStore>, seed: u64) -> Self {
        Self::with_rng(config, store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &Config, store: Arc<dyn SurveyStore>, rng: StdRng) -> Self {
        Self {
            pool_loader: PoolLoader::new(Arc::clone(&store)),
            store,
            sampler: Sampler::from_config(config),
            result_writer: ResultWriter::from_config(config),
            survey_kind: config.survey_kind,
            item_table: config.item_table.clone(),
            claim_policy: config.claim_policy,
            claim_target: ClaimTarget {
                item_table: config.item_table.clone(),
                natural_key: config.natural_key,
            },
            completion_code: config.completion_code.clone(),
            rng: Mutex::new(rng),
        }
    }

    pub fn survey_kind(&self) -> SurveyKind {
        self.survey_kind
    }

    pub fn claim_policy(&self) -> ClaimPolicy {
        self.claim_policy
    }

    /// 开始一个新会话：读取候选池并抽取批次
    ///
    /// "抽样时递增"策略下，批次交给评测员之前 status 已经递增。
    /// 没有任何可抽样条目时返回 `SamplingError::PoolExhausted`
    pub async fn open_session(&self) -> AppResult<Session> {
        let pool = self.pool_loader.load(&self.item_table).await?;

        let draw = {
            let mut rng = match self.rng.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            self.sampler.draw_with_rng(&pool, &mut *rng)
        };

        if draw.is_empty() {
            warn!("⚠️ 没有可用的条目 (所有条目 status >= {})", self.sampler.ceiling());
            return Err(SamplingError::PoolExhausted {
                ceiling: self.sampler.ceiling(),
            }
            .into());
        }

        let reserved = match self.claim_policy {
            ClaimPolicy::AtSampling => {
                self.sampler
                    .claim(self.store.as_ref(), &self.claim_target, &draw.items)
                    .await?;
                true
            }
            ClaimPolicy::AtSubmission => false,
        };

        let session = Session::new(self.survey_kind, draw.items, draw.requested, reserved);
        info!("🆕 {} 已创建 (计数策略: {})", session, self.claim_policy);
        Ok(session)
    }

    /// 提交会话
    ///
    /// 全部作答完成才会写入；写入失败时结果表无任何新增记录
    pub async fn submit(&self, session: &mut Session) -> AppResult<SubmissionReceipt> {
        let records_written = self
            .result_writer
            .submit(self.store.as_ref(), session)
            .await?;

        let submission_time = session.submitted_at().unwrap_or_else(Utc::now);

        Ok(SubmissionReceipt {
            session_id: session.id(),
            records_written,
            submission_time,
            completion_code: self.completion_code.clone(),
        })
    }

    /// 评测员中途离开
    ///
    /// 预占的 status 不会回滚，只记录日志
    pub fn abandon(&self, session: &Session) {
        if session.is_submitted() {
            return;
        }
        if session.is_reserved() {
            warn!(
                "⚠️ {} 未提交即离开，已预占的 {} 个条目 status 不回滚",
                session,
                session.batch().len()
            );
        } else {
            info!("{} 未提交即离开，未写入任何数据", session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::infrastructure::SqliteStore;
    use crate::models::{CandidateItem, Judgment, SamplingPolicy};

    async fn setup(config: &Config, items: Vec<CandidateItem>) -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema(&config.table_layout()).await.unwrap();
        store.seed_items(&config.item_table, items).await.unwrap();
        store
    }

    fn clickbait_config(batch_size: usize) -> Config {
        let mut config = Config::preset(SurveyKind::Clickbait);
        config.batch_size = batch_size;
        config
    }

    fn answer_all(session: &mut Session, judgment: Judgment) {
        for position in 1..=session.batch().len() {
            session.set_judgment(position, judgment).unwrap();
        }
    }

    #[tokio::test]
    async fn test_open_session_claims_at_sampling() {
        let config = clickbait_config(2);
        let store = setup(
            &config,
            vec![CandidateItem::new("c1", "h1", 0), CandidateItem::new("c2", "h2", 4)],
        )
        .await;
        let store = Arc::new(store);
        let flow = SurveyFlow::with_seed(&config, store.clone(), 1);

        let session = flow.open_session().await.unwrap();
        assert!(session.is_reserved());
        assert_eq!(session.batch().len(), 2);

        let statuses: Vec<i64> = store
            .fetch_items(&config.item_table)
            .await
            .unwrap()
            .iter()
            .map(|i| i.status)
            .collect();
        assert_eq!(statuses, vec![1, 5]);
    }

    #[tokio::test]
    async fn test_exhausted_pool_is_an_error() {
        let config = clickbait_config(2);
        let store = Arc::new(setup(&config, vec![CandidateItem::new("c1", "h1", 5)]).await);
        let flow = SurveyFlow::with_seed(&config, store, 1);

        let err = flow.open_session().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Sampling(SamplingError::PoolExhausted { ceiling: 5 })
        ));
    }

    #[tokio::test]
    async fn test_submission_claim_leaves_status_until_submit() {
        let mut config = Config::preset(SurveyKind::Relevance);
        config.batch_size = 2;
        config.sampling_policy = SamplingPolicy::UniformPerContent;
        let store = Arc::new(
            setup(
                &config,
                vec![CandidateItem::new("a", "a1", 0), CandidateItem::new("b", "b1", 0)],
            )
            .await,
        );
        let flow = SurveyFlow::with_seed(&config, store.clone(), 9);

        let mut session = flow.open_session().await.unwrap();
        assert!(!session.is_reserved());
        let before: Vec<i64> = store
            .fetch_items(&config.item_table)
            .await
            .unwrap()
            .iter()
            .map(|i| i.status)
            .collect();
        assert_eq!(before, vec![0, 0]);

        answer_all(&mut session, Judgment::Affirmative);
        let receipt = flow.submit(&mut session).await.unwrap();
        assert_eq!(receipt.records_written, 2);
        assert_eq!(receipt.completion_code.as_deref(), Some("headline2024"));

        let after: Vec<i64> = store
            .fetch_items(&config.item_table)
            .await
            .unwrap()
            .iter()
            .map(|i| i.status)
            .collect();
        assert_eq!(after, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_same_seed_same_batch() {
        let config = clickbait_config(3);
        let items: Vec<CandidateItem> = (0..10)
            .map(|i| CandidateItem::new(format!("c{}", i), format!("h{}", i), 0))
            .collect();

        let mut config_no_claim = config.clone();
        config_no_claim.claim_policy = ClaimPolicy::AtSubmission;

        let a = SurveyFlow::with_seed(&config_no_claim, Arc::new(setup(&config, items.clone()).await), 42)
            .open_session()
            .await
            .unwrap();
        let b = SurveyFlow::with_seed(&config_no_claim, Arc::new(setup(&config, items).await), 42)
            .open_session()
            .await
            .unwrap();
        assert_eq!(a.batch(), b.batch());
    }
}
