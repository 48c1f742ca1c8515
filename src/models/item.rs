//! 候选条目（CandidateItem）
//!
//! 一条正文 / 标题配对，等待评测员判断

use serde::{Deserialize, Serialize};

/// 来源字段（不同问卷变体携带的字段不同）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// 候选条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub content: String,
    pub headline: String,

    #[serde(flatten)]
    pub provenance: Provenance,

    /// 正文与标题向量的余弦相似度
    #[serde(default, alias = "cos_similarity", skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,

    /// 已展示 / 已评判次数
    #[serde(default)]
    pub status: i64,
}

impl CandidateItem {
    pub fn new(content: impl Into<String>, headline: impl Into<String>, status: i64) -> Self {
        Self {
            content: content.into(),
            headline: headline.into(),
            provenance: Provenance::default(),
            similarity: None,
            status,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = Some(similarity);
        self
    }

    /// 是否仍可被抽样（status < 上限）
    pub fn is_eligible(&self, ceiling: i64) -> bool {
        self.status < ceiling
    }

    /// 提取自然键
    pub fn key(&self) -> ItemKey {
        ItemKey {
            content: self.content.clone(),
            headline: self.headline.clone(),
            beta: self.provenance.beta,
            model: self.provenance.model.clone(),
        }
    }
}

/// 条目的自然键（没有代理主键）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemKey {
    pub content: String,
    pub headline: String,
    pub beta: Option<f64>,
    pub model: Option<String>,
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headline_preview = crate::utils::logger::truncate_text(&self.headline, 40);
        match (&self.beta, &self.model) {
            (None, None) => write!(f, "[{}]", headline_preview),
            _ => write!(
                f,
                "[{} | beta={:?} | model={:?}]",
                headline_preview, self.beta, self.model
            ),
        }
    }
}

/// 自然键由哪些列组成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NaturalKey {
    /// (content, headline)
    ContentHeadline,
    /// (content, headline, beta, model)
    ContentHeadlineBetaModel,
}

impl NaturalKey {
    /// 自然键包含的列名
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            NaturalKey::ContentHeadline => &["content", "headline"],
            NaturalKey::ContentHeadlineBetaModel => &["content", "headline", "beta", "model"],
        }
    }

    /// 解析配置中的名称
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "content_headline" => Some(NaturalKey::ContentHeadline),
            "content_headline_beta_model" => Some(NaturalKey::ContentHeadlineBetaModel),
            _ => None,
        }
    }
}
