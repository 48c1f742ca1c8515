//! 候选池加载服务 - 业务能力层
//!
//! 只负责"整表读入内存"，不过滤、不分页、不重试

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::AppResult;
use crate::infrastructure::SurveyStore;
use crate::models::CandidateItem;

/// 候选池加载服务
pub struct PoolLoader {
    store: Arc<dyn SurveyStore>,
}

impl PoolLoader {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self { store }
    }

    /// 读取整张候选表
    ///
    /// 连接或查询失败直接返回给调用方
    pub async fn load(&self, table: &str) -> AppResult<Vec<CandidateItem>> {
        debug!("📥 正在读取候选表 {}...", table);
        let items = self.store.fetch_items(table).await?;
        info!("✓ 候选表 {} 共 {} 个条目", table, items.len());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{SqliteStore, TableLayout};

    #[tokio::test]
    async fn test_load_returns_every_row_unfiltered() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .ensure_schema(&TableLayout {
                item_table: "items".to_string(),
                result_table: "results".to_string(),
                judgment_column: "clickbait_judgment".to_string(),
            })
            .await
            .unwrap();
        store
            .seed_items(
                "items",
                vec![
                    CandidateItem::new("c1", "h1", 0),
                    CandidateItem::new("c2", "h2", 99),
                ],
            )
            .await
            .unwrap();

        let loader = PoolLoader::new(Arc::new(store));
        let items = loader.load("items").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].status, 99);
    }

    #[tokio::test]
    async fn test_load_surfaces_query_failure() {
        let loader = PoolLoader::new(Arc::new(SqliteStore::open_in_memory().unwrap()));
        assert!(loader.load("missing_table").await.is_err());
    }
}
