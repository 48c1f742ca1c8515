use headline_survey::config::Config;
use headline_survey::error::{AppError, SamplingError, SubmissionError};
use headline_survey::infrastructure::{SqliteStore, SurveyStore};
use headline_survey::models::{CandidateItem, ClaimPolicy, Judgment, Provenance, SamplingPolicy, SurveyKind};
use headline_survey::workflow::SurveyFlow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

async fn store_for(config: &Config, items: Vec<CandidateItem>) -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().expect("打开内存数据库失败");
    store
        .ensure_schema(&config.table_layout())
        .await
        .expect("建表失败");
    store
        .seed_items(&config.item_table, items)
        .await
        .expect("导入失败");
    Arc::new(store)
}

async fn statuses(store: &SqliteStore, table: &str) -> HashMap<String, i64> {
    store
        .fetch_items(table)
        .await
        .expect("读取候选表失败")
        .into_iter()
        .map(|item| (item.headline, item.status))
        .collect()
}

fn clickbait(batch_size: usize) -> Config {
    let mut config = Config::preset(SurveyKind::Clickbait);
    config.batch_size = batch_size;
    config
}

#[tokio::test]
async fn test_weighted_claim_touches_exactly_the_drawn_rows() {
    let config = clickbait(2);
    let store = store_for(
        &config,
        vec![
            CandidateItem::new("c1", "h1", 0),
            CandidateItem::new("c2", "h2", 0),
            CandidateItem::new("c3", "h3", 4),
        ],
    )
    .await;

    for seed in 0..20 {
        let before = statuses(&store, &config.item_table).await;
        let flow = SurveyFlow::with_seed(&config, store.clone(), seed);
        let session = match flow.open_session().await {
            Ok(session) => session,
            Err(AppError::Sampling(SamplingError::PoolExhausted { .. })) => break,
            Err(e) => panic!("unexpected error: {}", e),
        };
        let after = statuses(&store, &config.item_table).await;

        let drawn: HashSet<&str> = session.batch().iter().map(|i| i.headline.as_str()).collect();
        for (headline, status) in &after {
            let expected = before[headline] + i64::from(drawn.contains(headline.as_str()));
            assert_eq!(*status, expected, "row {} after seed {}", headline, seed);
        }
    }
}

#[tokio::test]
async fn test_status_never_exceeds_ceiling_across_sequential_sessions() {
    let mut config = clickbait(1);
    config.status_ceiling = 2;
    let store = store_for(
        &config,
        vec![
            CandidateItem::new("c1", "h1", 0),
            CandidateItem::new("c2", "h2", 1),
            CandidateItem::new("c3", "h3", 0),
        ],
    )
    .await;
    let flow = SurveyFlow::with_seed(&config, store.clone(), 17);

    let mut opened = 0;
    loop {
        match flow.open_session().await {
            Ok(_) => opened += 1,
            Err(AppError::Sampling(SamplingError::PoolExhausted { ceiling: 2 })) => break,
            Err(e) => panic!("unexpected error: {}", e),
        }
        assert!(opened <= 5);
    }

    assert_eq!(opened, 5);
    let after = statuses(&store, &config.item_table).await;
    assert!(after.values().all(|&s| s == 2));
}

#[tokio::test]
async fn test_concurrent_claims_lose_no_increment() {
    let mut config = clickbait(2);
    config.status_ceiling = 1_000;
    let items: Vec<CandidateItem> = (0..20)
        .map(|i| CandidateItem::new(format!("c{}", i), format!("h{}", i), 0))
        .collect();
    let store = store_for(&config, items).await;
    let flow = Arc::new(SurveyFlow::with_seed(&config, store.clone(), 5));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let flow = Arc::clone(&flow);
        handles.push(tokio::spawn(async move { flow.open_session().await }));
    }
    for handle in handles {
        handle.await.expect("任务失败").expect("开会话失败");
    }

    let total: i64 = statuses(&store, &config.item_table).await.values().sum();
    assert_eq!(total, 32);
}

#[tokio::test]
async fn test_incomplete_submission_writes_nothing() {
    let config = clickbait(3);
    let store = store_for(
        &config,
        vec![
            CandidateItem::new("A", "ha", 0),
            CandidateItem::new("B", "hb", 0),
            CandidateItem::new("C", "hc", 0),
        ],
    )
    .await;
    let flow = SurveyFlow::with_seed(&config, store.clone(), 1);

    let mut session = flow.open_session().await.expect("开会话失败");
    session.set_judgment(1, Judgment::Affirmative).expect("作答失败");
    session.set_judgment(2, Judgment::Negative).expect("作答失败");

    let err = flow.submit(&mut session).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Submission(SubmissionError::Incomplete { ref missing }) if missing == &vec![3]
    ));
    assert!(store
        .fetch_results(&config.table_layout())
        .await
        .expect("读取结果失败")
        .is_empty());
}

#[tokio::test]
async fn test_resubmission_rejected_and_records_unique() {
    let config = clickbait(2);
    let store = store_for(
        &config,
        vec![CandidateItem::new("c1", "h1", 0), CandidateItem::new("c2", "h2", 0)],
    )
    .await;
    let flow = SurveyFlow::with_seed(&config, store.clone(), 2);

    let mut session = flow.open_session().await.expect("开会话失败");
    session.set_judgment(1, Judgment::Affirmative).expect("作答失败");
    session.set_judgment(2, Judgment::Affirmative).expect("作答失败");

    let receipt = flow.submit(&mut session).await.expect("提交失败");
    assert_eq!(receipt.records_written, 2);
    assert_eq!(receipt.completion_code, None);

    let err = flow.submit(&mut session).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Submission(SubmissionError::AlreadySubmitted { .. })
    ));

    let records = store
        .fetch_results(&config.table_layout())
        .await
        .expect("读取结果失败");
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.session_id == receipt.session_id));
    assert!(records.iter().all(|r| r.session_start <= r.submission_time));
}

#[tokio::test]
async fn test_claim_policies_increment_exactly_once() {
    for policy in [ClaimPolicy::AtSampling, ClaimPolicy::AtSubmission] {
        let mut config = clickbait(2);
        config.claim_policy = policy;
        let store = store_for(
            &config,
            vec![CandidateItem::new("c1", "h1", 0), CandidateItem::new("c2", "h2", 0)],
        )
        .await;
        let flow = SurveyFlow::with_seed(&config, store.clone(), 4);

        let mut session = flow.open_session().await.expect("开会话失败");
        session.set_judgment(1, Judgment::Negative).expect("作答失败");
        session.set_judgment(2, Judgment::Negative).expect("作答失败");
        flow.submit(&mut session).await.expect("提交失败");

        let after = statuses(&store, &config.item_table).await;
        assert!(after.values().all(|&s| s == 1), "policy {:?}: {:?}", policy, after);
    }
}

#[tokio::test]
async fn test_relevance_round_trip_with_provenance() {
    let config = Config::preset(SurveyKind::Relevance);
    let provenance = |beta: f64| Provenance {
        original: Some("Original headline".to_string()),
        probability: Some(0.7),
        reward: Some(1.5),
        beta: Some(beta),
        model: Some("ppo".to_string()),
    };
    let items: Vec<CandidateItem> = (0..10)
        .flat_map(|article| {
            [0.1, 0.5].into_iter().map(move |beta| {
                CandidateItem::new(format!("article {}", article), format!("headline {} / {}", article, beta), 0)
                    .with_provenance(provenance(beta))
            })
        })
        .collect();
    let store = store_for(&config, items).await;
    let flow = SurveyFlow::with_seed(&config, store.clone(), 8);

    let mut session = flow.open_session().await.expect("开会话失败");
    assert_eq!(session.batch().len(), 8);
    let contents: HashSet<&str> = session.batch().iter().map(|i| i.content.as_str()).collect();
    assert_eq!(contents.len(), 8);

    // 重复渲染得到同一批次
    let first: Vec<CandidateItem> = session.batch().to_vec();
    assert_eq!(session.batch(), first.as_slice());

    for position in 1..=8 {
        session.set_judgment(position, Judgment::Affirmative).expect("作答失败");
    }
    session.set_comment(3, "reads like an ad").expect("评论失败");
    let receipt = flow.submit(&mut session).await.expect("提交失败");
    assert_eq!(receipt.completion_code.as_deref(), Some("headline2024"));

    let records = store
        .fetch_results(&config.table_layout())
        .await
        .expect("读取结果失败");
    assert_eq!(records.len(), 8);
    assert_eq!(records[2].comment.as_deref(), Some("reads like an ad"));
    assert!(records.iter().all(|r| r.item.provenance.model.as_deref() == Some("ppo")));

    let claimed: i64 = statuses(&store, &config.item_table).await.values().sum();
    assert_eq!(claimed, 8);
}

#[tokio::test]
async fn test_uniform_policy_short_batch_when_groups_run_out() {
    let mut config = Config::preset(SurveyKind::Relevance);
    config.batch_size = 3;
    config.sampling_policy = SamplingPolicy::UniformPerContent;
    let store = store_for(
        &config,
        vec![
            CandidateItem::new("a", "a1", 0),
            CandidateItem::new("a", "a2", 0),
            CandidateItem::new("b", "b1", 0),
        ],
    )
    .await;
    let flow = SurveyFlow::with_seed(&config, store, 6);

    let session = flow.open_session().await.expect("开会话失败");
    assert!(session.is_short());
    assert_eq!(session.batch().len(), 2);
    assert_ne!(session.batch()[0].content, session.batch()[1].content);
}
