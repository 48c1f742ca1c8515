//! 应用生命周期 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：打开数据库、建表、（可选）导入种子数据
//! 2. **资源所有者**：唯一持有存储句柄的模块
//! 3. **向下委托**：委托 session_runner 运行单次会话

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::host::{ConsoleHost, PresentationHost};
use crate::infrastructure::SqliteStore;
use crate::models::load_all_seed_files;
use crate::orchestrator::session_runner::{run_session, SessionOutcome};
use crate::utils::logger::log_startup;
use crate::workflow::SurveyFlow;

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<SqliteStore>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let store = SqliteStore::open(&config.database_path)
            .with_context(|| format!("无法打开数据库: {}", config.database_path))?;
        store
            .ensure_schema(&config.table_layout())
            .await
            .context("建表失败")?;

        let app = Self {
            config,
            store: Arc::new(store),
        };
        app.seed_if_empty().await?;

        Ok(app)
    }

    /// 基于已有的存储句柄创建（不建表、不导入）
    pub fn with_store(config: Config, store: Arc<SqliteStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 创建共享的评测流程
    pub fn flow(&self) -> SurveyFlow {
        SurveyFlow::new(&self.config, self.store.clone())
    }

    /// 在终端上运行一次会话
    pub async fn run(&self) -> Result<()> {
        let mut host = ConsoleHost::stdio(self.config.collect_comments);
        let outcome = self.run_with_host(&mut host).await?;
        log_outcome(&outcome);
        Ok(())
    }

    /// 使用指定展示端运行一次会话
    pub async fn run_with_host(&self, host: &mut dyn PresentationHost) -> Result<SessionOutcome> {
        let flow = self.flow();
        let outcome = run_session(&flow, host).await.context("会话执行失败")?;
        Ok(outcome)
    }

    /// 候选表为空且配置了种子目录时导入种子数据
    async fn seed_if_empty(&self) -> Result<()> {
        let Some(folder) = self.config.seed_folder.as_deref() else {
            return Ok(());
        };

        let existing = self.store.count_items(&self.config.item_table).await?;
        if existing > 0 {
            info!("候选表 {} 已有 {} 个条目，跳过导入", self.config.item_table, existing);
            return Ok(());
        }

        info!("\n📁 正在从 {} 导入种子数据...", folder);
        let items = load_all_seed_files(folder).await?;
        if items.is_empty() {
            warn!("⚠️ 种子目录中没有任何条目");
            return Ok(());
        }

        let inserted = self
            .store
            .seed_items(&self.config.item_table, items)
            .await
            .context("导入种子数据失败")?;
        info!("✓ 已导入 {} 个候选条目", inserted);
        Ok(())
    }
}

// ========== 日志辅助函数 ==========

fn log_outcome(outcome: &SessionOutcome) {
    info!("\n{}", "=".repeat(60));
    match outcome {
        SessionOutcome::Submitted(receipt) => {
            info!("✅ 会话 {} 已提交", receipt.session_id);
            info!("📝 写入记录: {}", receipt.records_written);
            info!(
                "提交时间: {}",
                receipt
                    .submission_time
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
            );
        }
        SessionOutcome::Abandoned { session_id } => {
            warn!("⚠️ 会话 {} 未提交", session_id);
        }
        SessionOutcome::NoItems => {
            warn!("⚠️ 没有可用的条目，程序结束");
        }
    }
    info!("{}", "=".repeat(60));
}
