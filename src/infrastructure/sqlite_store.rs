//! SQLite 存储 - 基础设施层
//!
//! 唯一持有数据库连接的模块。所有调用都在 `spawn_blocking` 中执行，
//! 递增语句只使用 `status = status + 1`，不在应用层读后写

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::infrastructure::{is_valid_identifier, ResultWrite, SurveyStore, TableLayout};
use crate::models::{CandidateItem, EvaluationRecord, ItemKey, Judgment, NaturalKey, Provenance};

/// SQLite 存储
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// 打开（或创建）数据库文件
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(Duration::from_secs(5))?;
        debug!("已打开数据库: {}", path.as_ref().display());
        Ok(Self::from_connection(conn))
    }

    /// 内存数据库（测试用）
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// 锁定连接；锁中毒时连接本身仍可用
    fn with_conn<F, R>(&self, f: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Connection) -> StoreResult<R>,
    {
        let mut guard = self
            .conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut *guard)
    }

    /// 在阻塞线程池中执行
    async fn run_blocking<F, R>(&self, f: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Connection) -> StoreResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.with_conn(f))
            .await
            .map_err(|e| StoreError::Join(e.to_string()))?
    }

    /// 建表（已存在则跳过）
    pub async fn ensure_schema(&self, layout: &TableLayout) -> StoreResult<()> {
        let item_table = checked_ident(&layout.item_table)?.to_string();
        let result_table = checked_ident(&layout.result_table)?.to_string();
        let judgment_column = checked_ident(&layout.judgment_column)?.to_string();

        self.run_blocking(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {t} (\
                   content TEXT NOT NULL,\
                   headline TEXT NOT NULL,\
                   original TEXT,\
                   probability REAL,\
                   reward REAL,\
                   beta REAL,\
                   model TEXT,\
                   cos_similarity REAL,\
                   status INTEGER NOT NULL DEFAULT 0 CHECK (status >= 0)\
                 );\
                 CREATE INDEX IF NOT EXISTS idx_{t}_key ON {t}(content, headline);\
                 CREATE TABLE IF NOT EXISTS {r} (\
                   id INTEGER PRIMARY KEY AUTOINCREMENT,\
                   session_id TEXT NOT NULL,\
                   position INTEGER NOT NULL,\
                   content TEXT NOT NULL,\
                   headline TEXT NOT NULL,\
                   original TEXT,\
                   probability REAL,\
                   reward REAL,\
                   beta REAL,\
                   model TEXT,\
                   cos_similarity REAL,\
                   {j} TEXT NOT NULL CHECK ({j} IN ('Yes', 'No')),\
                   comment TEXT,\
                   start_time TEXT NOT NULL,\
                   submission_time TEXT NOT NULL,\
                   UNIQUE (session_id, position)\
                 );",
                t = item_table,
                r = result_table,
                j = judgment_column,
            ))?;
            Ok(())
        })
        .await
    }

    /// 批量导入候选条目（带外初始化，不属于问卷流程）
    pub async fn seed_items(&self, table: &str, items: Vec<CandidateItem>) -> StoreResult<usize> {
        let table = checked_ident(table)?.to_string();

        self.run_blocking(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT INTO {} (content, headline, original, probability, reward, beta, model, cos_similarity, status) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    table
                ))?;
                for item in &items {
                    stmt.execute(params![
                        item.content,
                        item.headline,
                        item.provenance.original,
                        item.provenance.probability,
                        item.provenance.reward,
                        item.provenance.beta,
                        item.provenance.model,
                        item.similarity,
                        item.status,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(items.len())
        })
        .await
    }

    /// 候选表行数
    pub async fn count_items(&self, table: &str) -> StoreResult<usize> {
        let table = checked_ident(table)?.to_string();

        self.run_blocking(move |conn| {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(count.max(0) as usize)
        })
        .await
    }

    /// 读取结果表（按写入顺序）
    ///
    /// 结果表不保存 status，读回的条目 status 为 0
    pub async fn fetch_results(&self, layout: &TableLayout) -> StoreResult<Vec<EvaluationRecord>> {
        let result_table = checked_ident(&layout.result_table)?.to_string();
        let judgment_column = checked_ident(&layout.judgment_column)?.to_string();

        let raw_rows = self
            .run_blocking(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT session_id, position, content, headline, original, probability, reward, beta, model, \
                     cos_similarity, {}, comment, start_time, submission_time FROM {} ORDER BY id",
                    judgment_column, result_table
                ))?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(RawResultRow {
                            session_id: row.get(0)?,
                            position: row.get(1)?,
                            item: CandidateItem {
                                content: row.get(2)?,
                                headline: row.get(3)?,
                                provenance: Provenance {
                                    original: row.get(4)?,
                                    probability: row.get(5)?,
                                    reward: row.get(6)?,
                                    beta: row.get(7)?,
                                    model: row.get(8)?,
                                },
                                similarity: row.get(9)?,
                                status: 0,
                            },
                            judgment: row.get(10)?,
                            comment: row.get(11)?,
                            start_time: row.get(12)?,
                            submission_time: row.get(13)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        raw_rows.into_iter().map(RawResultRow::into_record).collect()
    }
}

#[async_trait]
impl SurveyStore for SqliteStore {
    async fn fetch_items(&self, table: &str) -> StoreResult<Vec<CandidateItem>> {
        let table = checked_ident(table)?.to_string();

        self.run_blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT content, headline, original, probability, reward, beta, model, cos_similarity, status \
                 FROM {} ORDER BY rowid",
                table
            ))?;
            let items = stmt
                .query_map([], |row| {
                    Ok(CandidateItem {
                        content: row.get(0)?,
                        headline: row.get(1)?,
                        provenance: Provenance {
                            original: row.get(2)?,
                            probability: row.get(3)?,
                            reward: row.get(4)?,
                            beta: row.get(5)?,
                            model: row.get(6)?,
                        },
                        similarity: row.get(7)?,
                        status: row.get(8)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(items)
        })
        .await
    }

    async fn claim_items(&self, table: &str, key: NaturalKey, keys: &[ItemKey]) -> StoreResult<usize> {
        let table = checked_ident(table)?.to_string();
        let keys = keys.to_vec();

        self.run_blocking(move |conn| {
            let tx = conn.transaction()?;
            let updated = claim_in_tx(&tx, &table, key, &keys)?;
            tx.commit()?;
            Ok(updated)
        })
        .await
    }

    async fn append_results(&self, write: &ResultWrite) -> StoreResult<usize> {
        checked_ident(&write.result_table)?;
        checked_ident(&write.judgment_column)?;
        if let Some(claim) = &write.claim {
            checked_ident(&claim.item_table)?;
        }
        let write = write.clone();

        self.run_blocking(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT INTO {} (session_id, position, content, headline, original, probability, reward, beta, \
                     model, cos_similarity, {}, comment, start_time, submission_time) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                    write.result_table, write.judgment_column
                ))?;
                for record in &write.records {
                    stmt.execute(params![
                        record.session_id.to_string(),
                        record.position as i64,
                        record.item.content,
                        record.item.headline,
                        record.item.provenance.original,
                        record.item.provenance.probability,
                        record.item.provenance.reward,
                        record.item.provenance.beta,
                        record.item.provenance.model,
                        record.item.similarity,
                        record.judgment.as_str(),
                        record.comment,
                        record.session_start.to_rfc3339(),
                        record.submission_time.to_rfc3339(),
                    ])?;
                }
            }

            if let Some(claim) = &write.claim {
                let keys: Vec<ItemKey> = write.records.iter().map(EvaluationRecord::item_key).collect();
                claim_in_tx(&tx, &claim.item_table, claim.natural_key, &keys)?;
            }

            tx.commit()?;
            Ok(write.records.len())
        })
        .await
    }
}

/// 逐个自然键递增 status（调用方负责提交事务）
fn claim_in_tx(tx: &Transaction<'_>, table: &str, key: NaturalKey, keys: &[ItemKey]) -> StoreResult<usize> {
    let sql = claim_sql(table, key);
    let mut stmt = tx.prepare(&sql)?;
    let mut total = 0usize;

    for item_key in keys {
        let updated = match key {
            NaturalKey::ContentHeadline => stmt.execute(params![item_key.content, item_key.headline])?,
            NaturalKey::ContentHeadlineBetaModel => stmt.execute(params![
                item_key.content,
                item_key.headline,
                item_key.beta,
                item_key.model
            ])?,
        };

        match updated {
            0 => warn!("⚠️ 自然键未匹配到任何行: {}", item_key),
            1 => debug!("status + 1: {}", item_key),
            n => warn!("⚠️ 自然键匹配到 {} 行，全部递增: {}", n, item_key),
        }
        total += updated;
    }

    Ok(total)
}

/// `UPDATE <t> SET status = status + 1 WHERE <自然键>`
///
/// beta / model 可能为 NULL，用 `IS` 比较
fn claim_sql(table: &str, key: NaturalKey) -> String {
    let predicate = key
        .columns()
        .iter()
        .enumerate()
        .map(|(i, column)| match *column {
            "beta" | "model" => format!("{} IS ?{}", column, i + 1),
            _ => format!("{} = ?{}", column, i + 1),
        })
        .collect::<Vec<_>>()
        .join(" AND ");
    format!("UPDATE {} SET status = status + 1 WHERE {}", table, predicate)
}

fn checked_ident(name: &str) -> StoreResult<&str> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// 结果表原始行
struct RawResultRow {
    session_id: String,
    position: i64,
    item: CandidateItem,
    judgment: String,
    comment: Option<String>,
    start_time: String,
    submission_time: String,
}

impl RawResultRow {
    fn into_record(self) -> StoreResult<EvaluationRecord> {
        let session_id = Uuid::parse_str(&self.session_id).map_err(|_| StoreError::InvalidSessionId {
            value: self.session_id.clone(),
        })?;
        let judgment = match Judgment::parse(&self.judgment) {
            Some(j) if j.is_set() => j,
            _ => {
                return Err(StoreError::UnknownJudgment {
                    value: self.judgment,
                })
            }
        };

        Ok(EvaluationRecord {
            session_id,
            position: self.position.max(0) as usize,
            item: self.item,
            judgment,
            comment: self.comment,
            session_start: parse_timestamp(&self.start_time)?,
            submission_time: parse_timestamp(&self.submission_time)?,
        })
    }
}

fn parse_timestamp(value: &str) -> StoreResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}
