//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责应用生命周期和会话调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用
//! - 管理应用生命周期（初始化、运行）
//! - 持有存储句柄
//! - 首次启动时导入种子数据
//!
//! ### `session_runner` - 单次会话执行器
//! - 展示 → 收集 → 提交 循环
//! - 未答完时提示并重新展示
//! - 处理评测员中途离开
//!
//! ## 层次关系
//!
//! ```text
//! app (持有 SqliteStore)
//!     ↓
//! session_runner (驱动 PresentationHost)
//!     ↓
//! workflow::SurveyFlow (一位评测员的流程)
//!     ↓
//! services (能力层：pool_loader / sampler / result_writer)
//!     ↓
//! infrastructure (基础设施：SurveyStore)
//! ```

pub mod app;
pub mod session_runner;

// 重新导出主要类型
pub use app::App;
pub use session_runner::{run_session, SessionOutcome};
