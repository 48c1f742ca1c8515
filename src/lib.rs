//! # Headline Survey
//!
//! 一个用于新闻标题人工评测（标题党 / 相关性）的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（数据库连接），只暴露能力
//! - `SurveyStore` - 读取候选表、递增 status、追加结果
//! - `SqliteStore` - 基于 rusqlite 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `PoolLoader` - 整表读取候选池
//! - `Sampler` - 加权补数 / 按正文均匀抽样，以及抽样时预占
//! - `ResultWriter` - 整批写入评测结果
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一位评测员"的完整流程
//! - `Session` - 会话（固定批次 + 作答）
//! - `SurveyFlow` - 流程编排（抽样 → 作答 → 提交）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 应用生命周期，持有存储
//! - `orchestrator/session_runner` - 展示 → 收集 → 提交 循环
//!
//! 展示端（`host/`）与流程层解耦，只读会话、返回作答
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod host;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use host::{ConsoleHost, PresentationHost};
pub use infrastructure::{SqliteStore, SurveyStore};
pub use models::{CandidateItem, EvaluationRecord, Judgment, SurveyKind};
pub use orchestrator::{run_session, App, SessionOutcome};
pub use workflow::{Session, SubmissionReceipt, SurveyFlow};
