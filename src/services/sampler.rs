//! 抽样 / 分配服务 - 业务能力层
//!
//! 从候选池中为一位评测员抽取一批题目：
//! - 只考虑 `status < C` 的条目
//! - 批次内不放回
//! - 加权补数策略：权重 `C - status`，每抽一个就从池中移除并重新归一化
//! - 按正文均匀策略：每个 content 随机保留一个标题，再均匀抽取
//!
//! `*_with_rng` 入口接受外部随机数生成器，便于测试复现

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{ClaimTarget, SurveyStore};
use crate::models::{CandidateItem, ItemKey, SamplingPolicy};

/// 一次抽样的结果
#[derive(Debug, Clone)]
pub struct Draw {
    /// 抽中的条目（按抽取顺序）
    pub items: Vec<CandidateItem>,
    /// 请求的数量 n
    pub requested: usize,
    /// 满足 status < C 的条目数
    pub eligible: usize,
}

impl Draw {
    /// 候选不足，返回的批次比请求的短
    pub fn is_short(&self) -> bool {
        self.items.len() < self.requested
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 抽样服务
#[derive(Debug, Clone)]
pub struct Sampler {
    policy: SamplingPolicy,
    ceiling: i64,
    batch_size: usize,
}

impl Sampler {
    pub fn new(policy: SamplingPolicy, ceiling: i64, batch_size: usize) -> Self {
        Self {
            policy,
            ceiling,
            batch_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sampling_policy, config.status_ceiling, config.batch_size)
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    pub fn ceiling(&self) -> i64 {
        self.ceiling
    }

    /// 可抽样的条目（status < C），保持原顺序
    pub fn eligible<'a>(&self, pool: &'a [CandidateItem]) -> Vec<&'a CandidateItem> {
        pool.iter().filter(|item| item.is_eligible(self.ceiling)).collect()
    }

    /// 抽样权重 `C - status`（可抽样条目恒为正）
    pub fn weight(&self, item: &CandidateItem) -> f64 {
        (self.ceiling - item.status) as f64
    }

    /// 使用线程随机数抽样
    pub fn draw(&self, pool: &[CandidateItem]) -> Draw {
        let mut rng = rand::thread_rng();
        self.draw_with_rng(pool, &mut rng)
    }

    /// 使用调用方提供的随机数生成器抽样
    ///
    /// 不修改 `pool`；候选不足时返回短批次
    pub fn draw_with_rng<R: Rng + ?Sized>(&self, pool: &[CandidateItem], rng: &mut R) -> Draw {
        let eligible = self.eligible(pool);
        let eligible_count = eligible.len();

        let items = match self.policy {
            SamplingPolicy::WeightedComplement => self.draw_weighted(eligible, rng),
            SamplingPolicy::UniformPerContent => self.draw_uniform_per_content(eligible, rng),
        };

        let draw = Draw {
            items,
            requested: self.batch_size,
            eligible: eligible_count,
        };

        info!(
            "🎲 {}抽样: 候选 {} 个, 可抽 {} 个, 抽中 {}/{}",
            self.policy,
            pool.len(),
            draw.eligible,
            draw.items.len(),
            draw.requested
        );
        if draw.is_short() {
            warn!(
                "⚠️ 候选不足，返回短批次: {}/{} (status 上限 {})",
                draw.items.len(),
                draw.requested,
                self.ceiling
            );
        }

        draw
    }

    /// 加权不放回抽样：每次按剩余权重抽一个并移除
    fn draw_weighted<R: Rng + ?Sized>(&self, eligible: Vec<&CandidateItem>, rng: &mut R) -> Vec<CandidateItem> {
        let mut remaining = eligible;
        let amount = self.batch_size.min(remaining.len());
        let mut picked = Vec::with_capacity(amount);

        while picked.len() < amount {
            let weights: Vec<f64> = remaining.iter().map(|item| self.weight(item)).collect();
            let dist = match WeightedIndex::new(&weights) {
                Ok(dist) => dist,
                Err(e) => {
                    // 可抽样条目权重恒为正，走到这里说明输入异常
                    warn!("⚠️ 权重无效，提前结束抽样: {}", e);
                    break;
                }
            };
            let index = dist.sample(rng);
            let item = remaining.remove(index);
            debug!(
                "抽中 (权重 {}): {}",
                self.weight(item),
                crate::utils::logger::truncate_text(&item.headline, 40)
            );
            picked.push(item.clone());
        }

        picked
    }

    /// 每个 content 随机保留一个标题，再均匀不放回抽取
    fn draw_uniform_per_content<R: Rng + ?Sized>(
        &self,
        eligible: Vec<&CandidateItem>,
        rng: &mut R,
    ) -> Vec<CandidateItem> {
        let mut groups: Vec<Vec<&CandidateItem>> = Vec::new();
        let mut group_of: HashMap<&str, usize> = HashMap::new();

        for item in eligible {
            match group_of.get(item.content.as_str()) {
                Some(&g) => groups[g].push(item),
                None => {
                    group_of.insert(item.content.as_str(), groups.len());
                    groups.push(vec![item]);
                }
            }
        }

        let mut representatives: Vec<&CandidateItem> = Vec::with_capacity(groups.len());
        for group in &groups {
            if let Some(item) = group.choose(rng) {
                representatives.push(*item);
            }
        }

        let amount = self.batch_size.min(representatives.len());
        let (picked, _) = representatives.partial_shuffle(rng, amount);
        picked.iter().map(|item| (*item).clone()).collect()
    }

    /// 抽样时预占：为每个抽中的条目执行一次 `status = status + 1`
    ///
    /// 必须在批次交给评测员之前完成
    pub async fn claim(
        &self,
        store: &dyn SurveyStore,
        target: &ClaimTarget,
        items: &[CandidateItem],
    ) -> AppResult<usize> {
        let keys: Vec<ItemKey> = items.iter().map(CandidateItem::key).collect();
        let updated = store
            .claim_items(&target.item_table, target.natural_key, &keys)
            .await?;

        if updated != keys.len() {
            warn!(
                "⚠️ 预占更新行数 {} 与抽中条目数 {} 不一致",
                updated,
                keys.len()
            );
        } else {
            debug!("✓ 已预占 {} 个条目", updated);
        }

        Ok(updated)
    }
}
