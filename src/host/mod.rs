//! 展示端（Presentation Host）
//!
//! 负责把会话批次展示给评测员并收集作答。展示端只读会话，
//! 从不抽样、不写库

pub mod console;

pub use console::ConsoleHost;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::workflow::{Response, Session};

/// 展示端接口
#[async_trait]
pub trait PresentationHost: Send {
    /// 展示整批题目，返回与批次等长的作答
    ///
    /// 评测员离开时返回 `HostError::InputClosed`
    async fn present(&mut self, session: &Session) -> AppResult<Vec<Response>>;

    /// 向评测员显示一条消息
    async fn notify(&mut self, message: &str) -> AppResult<()>;
}
