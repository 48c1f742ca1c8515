//! 单次会话执行器 - 编排层
//!
//! 驱动一位评测员的 展示 → 收集 → 提交 循环：
//! 1. 打开会话（抽样），无可用条目时提示并结束
//! 2. 展示批次，收集作答
//! 3. 未答完则提示并重新展示同一批次
//! 4. 提交成功后显示感谢语和完成码

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult, HostError, SamplingError};
use crate::host::PresentationHost;
use crate::workflow::{Session, SubmissionReceipt, SurveyFlow};

/// 会话结局
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// 已提交
    Submitted(SubmissionReceipt),
    /// 评测员中途离开
    Abandoned { session_id: Uuid },
    /// 没有可用的条目
    NoItems,
}

/// 运行一次完整会话
pub async fn run_session(flow: &SurveyFlow, host: &mut dyn PresentationHost) -> AppResult<SessionOutcome> {
    let mut session = match flow.open_session().await {
        Ok(session) => session,
        Err(AppError::Sampling(SamplingError::PoolExhausted { ceiling })) => {
            host.notify(&format!("No rows available (all have status >= {}).", ceiling))
                .await?;
            return Ok(SessionOutcome::NoItems);
        }
        Err(e) => return Err(e),
    };

    if session.is_short() {
        info!(
            "{} 批次不足: 仅 {} 题 (请求 {} 题)",
            session,
            session.batch().len(),
            session.requested()
        );
    }

    loop {
        let responses = match host.present(&session).await {
            Ok(responses) => responses,
            Err(AppError::Host(HostError::InputClosed)) => {
                flow.abandon(&session);
                return Ok(SessionOutcome::Abandoned {
                    session_id: session.id(),
                });
            }
            Err(e) => {
                flow.abandon(&session);
                return Err(e);
            }
        };

        if let Err(e) = apply_responses(&mut session, responses) {
            flow.abandon(&session);
            return Err(e);
        }

        match flow.submit(&mut session).await {
            Ok(receipt) => {
                host.notify("Thank you!").await?;
                if let Some(code) = &receipt.completion_code {
                    host.notify(&format!("The completion code is {}", code)).await?;
                }
                host.notify("Responses have been recorded! Thank you!").await?;
                return Ok(SessionOutcome::Submitted(receipt));
            }
            Err(e) if e.is_incomplete_submission() => {
                warn!("⚠️ {} 提交被拒绝: {}", session, e);
                host.notify("Please answer all questions before submitting.")
                    .await?;
            }
            Err(e) => {
                error!("❌ {} 写入失败: {}", session, e);
                return Err(e);
            }
        }
    }
}

/// 把展示端返回的作答写回会话
fn apply_responses(session: &mut Session, responses: Vec<crate::workflow::Response>) -> AppResult<()> {
    for (index, response) in responses.into_iter().enumerate() {
        let position = index + 1;
        session.set_judgment(position, response.judgment)?;
        session.set_comment(position, response.comment.unwrap_or_default())?;
    }
    Ok(())
}
