//! 终端展示端
//!
//! 逐题显示标题和正文，读取 `Yes` / `No`；空行保留当前选择，
//! 无法识别的输入会重新询问。评论行输入 `-` 清空评论

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

use crate::error::{AppResult, HostError};
use crate::host::PresentationHost;
use crate::models::Judgment;
use crate::workflow::{Response, Session};

const SEPARATOR: &str = "---";
/// 输入该值清空已有评论
const CLEAR_COMMENT: &str = "-";

pub struct ConsoleHost<R, W> {
    reader: R,
    writer: W,
    collect_comments: bool,
    intro_shown: bool,
}

impl ConsoleHost<BufReader<Stdin>, Stdout> {
    /// 基于标准输入输出创建
    pub fn stdio(collect_comments: bool) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), collect_comments)
    }
}

impl<R, W> ConsoleHost<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W, collect_comments: bool) -> Self {
        Self {
            reader,
            writer,
            collect_comments,
            intro_shown: false,
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    async fn write_line(&mut self, line: &str) -> Result<(), HostError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }

    async fn prompt(&mut self, text: &str) -> Result<String, HostError> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            return Err(HostError::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    /// 读取一题的判断，空行保留 `current`
    async fn ask_judgment(&mut self, position: usize, question: &str, current: Judgment) -> Result<Judgment, HostError> {
        let shown = if current.is_set() { current.as_str() } else { "-" };
        loop {
            let answer = self
                .prompt(&format!("{} (Question {}) [Yes/No, current: {}]: ", question, position, shown))
                .await?;
            if answer.is_empty() {
                return Ok(current);
            }
            match Judgment::parse(&answer) {
                Some(judgment) => return Ok(judgment),
                None => self.write_line("Please answer Yes or No.").await?,
            }
        }
    }

    async fn ask_comment(&mut self, current: Option<&str>) -> Result<Option<String>, HostError> {
        let answer = self.prompt("Comment (optional, '-' to clear): ").await?;
        match answer.as_str() {
            "" => Ok(current.map(str::to_string)),
            CLEAR_COMMENT => Ok(None),
            _ => Ok(Some(answer)),
        }
    }
}

#[async_trait]
impl<R, W> PresentationHost for ConsoleHost<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn present(&mut self, session: &Session) -> AppResult<Vec<Response>> {
        let kind = session.survey_kind();

        if !self.intro_shown {
            self.write_line(kind.title()).await?;
            self.write_line("").await?;
            self.write_line(&kind.intro(session.batch().len())).await?;
            self.write_line(SEPARATOR).await?;
            self.intro_shown = true;
        }

        let mut responses = Vec::with_capacity(session.batch().len());
        for (index, item) in session.batch().iter().enumerate() {
            let position = index + 1;
            let current = session.response(position).cloned().unwrap_or_default();

            self.write_line(&format!("Question {}", position)).await?;
            self.write_line(&format!("Headline: {}", item.headline)).await?;
            self.write_line(&format!("Content: {}", item.content)).await?;

            let judgment = self.ask_judgment(position, kind.prompt(), current.judgment).await?;
            let comment = if self.collect_comments {
                self.ask_comment(current.comment.as_deref()).await?
            } else {
                current.comment
            };
            self.write_line(SEPARATOR).await?;

            responses.push(Response { judgment, comment });
        }

        Ok(responses)
    }

    async fn notify(&mut self, message: &str) -> AppResult<()> {
        self.write_line(message).await?;
        self.writer.flush().await.map_err(HostError::from)?;
        Ok(())
    }
}
