use thiserror::Error;
use uuid::Uuid;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 存储相关错误（连接、查询失败，不重试）
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 抽样错误
    #[error("抽样错误: {0}")]
    Sampling(#[from] SamplingError),
    /// 提交错误
    #[error("提交错误: {0}")]
    Submission(#[from] SubmissionError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 展示端错误
    #[error("展示端错误: {0}")]
    Host(#[from] HostError),
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQL 执行失败
    #[error("SQL 执行失败: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// 非法的表名 / 列名
    #[error("非法的 SQL 标识符: {name}")]
    InvalidIdentifier { name: String },
    /// 后台阻塞任务失败
    #[error("后台任务失败: {0}")]
    Join(String),
    /// 时间戳解析失败
    #[error("时间戳解析失败: {0}")]
    Timestamp(#[from] chrono::ParseError),
    /// 结果表中出现无法识别的判断值
    #[error("无法识别的判断值: {value:?}")]
    UnknownJudgment { value: String },
    /// 结果表中的会话 ID 不是合法 UUID
    #[error("非法的会话 ID: {value}")]
    InvalidSessionId { value: String },
}

/// 抽样错误
#[derive(Debug, Error)]
pub enum SamplingError {
    /// 没有可抽样的条目
    #[error("没有可用的条目 (所有条目 status >= {ceiling})")]
    PoolExhausted { ceiling: i64 },
}

/// 提交错误
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// 有题目未作答
    #[error("请先回答所有题目，未作答的题号: {missing:?}")]
    Incomplete { missing: Vec<usize> },
    /// 会话已提交
    #[error("会话 {session_id} 已提交，拒绝重复提交")]
    AlreadySubmitted { session_id: Uuid },
    /// 题号超出范围
    #[error("题号 {position} 超出范围 [1, {batch_len}]")]
    UnknownPosition { position: usize, batch_len: usize },
    /// 批次为空
    #[error("批次为空，无可提交的内容")]
    EmptyBatch,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 非法的表名
    #[error("配置项 {field} 不是合法的 SQL 标识符: {value}")]
    InvalidIdentifier { field: String, value: String },
    /// 取值不合法
    #[error("配置项 {field} 取值不合法: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 展示端错误
#[derive(Debug, Error)]
pub enum HostError {
    /// 输入已关闭（评测员离开）
    #[error("输入已关闭")]
    InputClosed,
    /// 读写终端失败
    #[error("终端读写失败: {0}")]
    Io(#[from] std::io::Error),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建 TOML 解析错误
    pub fn toml_parse_failed(path: impl Into<String>, source: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为"未作答完"这类可由评测员修正的错误
    pub fn is_incomplete_submission(&self) -> bool {
        matches!(
            self,
            AppError::Submission(SubmissionError::Incomplete { .. })
        )
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Store(StoreError::Sqlite(err))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 存储层结果类型
pub type StoreResult<T> = Result<T, StoreError>;
