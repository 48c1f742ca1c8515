use crate::models::item::NaturalKey;
use crate::models::policy::{ClaimPolicy, SamplingPolicy};

/// 问卷类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyKind {
    /// 标题党判断
    Clickbait,
    /// 标题相关性判断
    Relevance,
}

impl SurveyKind {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            SurveyKind::Clickbait => "标题党问卷",
            SurveyKind::Relevance => "相关性问卷",
        }
    }

    /// 结果表中的判断列名
    pub fn judgment_column(self) -> &'static str {
        match self {
            SurveyKind::Clickbait => "clickbait_judgment",
            SurveyKind::Relevance => "relevance_judgement",
        }
    }

    /// 默认候选表
    pub fn default_item_table(self) -> &'static str {
        match self {
            SurveyKind::Clickbait => "theoryguided_clickbait_survey_200",
            SurveyKind::Relevance => "headline_relevance_survey_50_article_all_beta",
        }
    }

    /// 默认结果表
    pub fn default_result_table(self) -> &'static str {
        match self {
            SurveyKind::Clickbait => "theoryguided_headline_evaluation",
            SurveyKind::Relevance => "headline_relevance_evaluation_50_article_all_beta",
        }
    }

    /// 默认每批题目数
    pub fn default_batch_size(self) -> usize {
        match self {
            SurveyKind::Clickbait => 10,
            SurveyKind::Relevance => 8,
        }
    }

    /// 默认 status 上限
    pub fn default_status_ceiling(self) -> i64 {
        match self {
            SurveyKind::Clickbait => 5,
            SurveyKind::Relevance => 8,
        }
    }

    pub fn default_sampling_policy(self) -> SamplingPolicy {
        match self {
            SurveyKind::Clickbait => SamplingPolicy::WeightedComplement,
            SurveyKind::Relevance => SamplingPolicy::UniformPerContent,
        }
    }

    pub fn default_claim_policy(self) -> ClaimPolicy {
        match self {
            SurveyKind::Clickbait => ClaimPolicy::AtSampling,
            SurveyKind::Relevance => ClaimPolicy::AtSubmission,
        }
    }

    pub fn default_natural_key(self) -> NaturalKey {
        match self {
            SurveyKind::Clickbait => NaturalKey::ContentHeadline,
            SurveyKind::Relevance => NaturalKey::ContentHeadlineBetaModel,
        }
    }

    /// 提交成功后展示给评测员的完成码
    pub fn default_completion_code(self) -> Option<&'static str> {
        match self {
            SurveyKind::Clickbait => None,
            SurveyKind::Relevance => Some("headline2024"),
        }
    }

    /// 页面标题
    pub fn title(self) -> &'static str {
        "Evaluating the Headlines"
    }

    /// 问卷说明（面向评测员）
    pub fn intro(self, batch_size: usize) -> String {
        match self {
            SurveyKind::Clickbait => format!(
                "We are studying the effectiveness of headlines for news articles.\n\n\
                 You will be presented with {} questions. For each question, you will see content \
                 from a news article along with its headline. Some of the content may be a summary \
                 of a video. After reviewing the content and headline, please answer whether you \
                 think the headline is clickbait or not, as if you were a user browsing online news.",
                batch_size
            ),
            SurveyKind::Relevance => format!(
                "We are studying the relevance of headlines for news articles.\n\n\
                 You will be presented with {} questions. For each question, you will see content \
                 from a news article along with its headline. Some of the content may be a summary \
                 of a video or feel like part of a longer article.\n\n\
                 Please evaluate whether the headline is relevant to the content or not based solely \
                 on the content provided. Do not assume that additional context or content exists \
                 beyond what is shown.",
                batch_size
            ),
        }
    }

    /// 每道题的提问
    pub fn prompt(self) -> &'static str {
        match self {
            SurveyKind::Clickbait => "Do you feel the headline is clickbait?",
            SurveyKind::Relevance => "Do you think the headline is relevant to the content?",
        }
    }

    /// 尝试从字符串解析问卷类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clickbait" | "标题党" => Some(SurveyKind::Clickbait),
            "relevance" | "相关性" => Some(SurveyKind::Relevance),
            _ => None,
        }
    }
}

impl std::fmt::Display for SurveyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
