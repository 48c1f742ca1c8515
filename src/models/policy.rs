//! 抽样策略与计数器更新策略

use serde::{Deserialize, Serialize};

/// 抽样策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPolicy {
    /// 权重 = C - status，不放回加权抽样
    WeightedComplement,
    /// 每个 content 随机取一个标题，再均匀不放回抽样
    UniformPerContent,
}

impl SamplingPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weighted_complement" | "weighted" => Some(SamplingPolicy::WeightedComplement),
            "uniform_per_content" | "uniform" => Some(SamplingPolicy::UniformPerContent),
            _ => None,
        }
    }
}

impl std::fmt::Display for SamplingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplingPolicy::WeightedComplement => write!(f, "加权补数"),
            SamplingPolicy::UniformPerContent => write!(f, "按正文均匀"),
        }
    }
}

/// status 计数器由谁负责递增
///
/// 每种部署只有一个负责方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimPolicy {
    /// 抽样后立即递增（预占，放弃的会话会留下已递增的计数）
    AtSampling,
    /// 提交结果时递增
    AtSubmission,
}

impl ClaimPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "at_sampling" | "sampling" => Some(ClaimPolicy::AtSampling),
            "at_submission" | "submission" => Some(ClaimPolicy::AtSubmission),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClaimPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimPolicy::AtSampling => write!(f, "抽样时递增"),
            ClaimPolicy::AtSubmission => write!(f, "提交时递增"),
        }
    }
}
