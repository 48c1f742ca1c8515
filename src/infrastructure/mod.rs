//! 基础设施层
//!
//! 持有稀缺资源（数据库连接），只暴露三种能力：
//! 读取候选表、递增 status、追加评测结果

pub mod sqlite_store;

pub use sqlite_store::SqliteStore;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{CandidateItem, EvaluationRecord, ItemKey, NaturalKey};

/// 关系型存储接口
///
/// - 不认识会话 / 抽样策略
/// - 每次递增都是单条 `status = status + 1` 语句
#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// 读取整张候选表
    async fn fetch_items(&self, table: &str) -> StoreResult<Vec<CandidateItem>>;

    /// 在同一事务中为每个自然键执行一次 `status = status + 1`
    ///
    /// 返回实际更新的行数
    async fn claim_items(&self, table: &str, key: NaturalKey, keys: &[ItemKey]) -> StoreResult<usize>;

    /// 在同一事务中写入一批评测记录（以及可选的延迟递增）
    ///
    /// 返回写入的记录数
    async fn append_results(&self, write: &ResultWrite) -> StoreResult<usize>;
}

/// 表布局
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub item_table: String,
    pub result_table: String,
    /// 结果表中的判断列名
    pub judgment_column: String,
}

/// 提交时需要递增的候选表
#[derive(Debug, Clone)]
pub struct ClaimTarget {
    pub item_table: String,
    pub natural_key: NaturalKey,
}

/// 一次结果写入
#[derive(Debug, Clone)]
pub struct ResultWrite {
    pub result_table: String,
    pub judgment_column: String,
    pub records: Vec<EvaluationRecord>,
    /// 仅在"提交时递增"策略下设置
    pub claim: Option<ClaimTarget>,
}

/// 是否为合法的 SQL 标识符（`[A-Za-z_][A-Za-z0-9_]*`）
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("theoryguided_clickbait_survey_200"));
        assert!(is_valid_identifier("_t1"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1table"));
        assert!(!is_valid_identifier("t; DROP TABLE t"));
        assert!(!is_valid_identifier("t\"x"));
    }
}
