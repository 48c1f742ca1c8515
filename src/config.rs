use serde::Deserialize;
use std::path::Path;

use crate::error::{AppError, AppResult, ConfigError};
use crate::infrastructure::{is_valid_identifier, TableLayout};
use crate::models::{ClaimPolicy, NaturalKey, SamplingPolicy, SurveyKind};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 问卷类型
    pub survey_kind: SurveyKind,
    /// SQLite 数据库文件路径
    pub database_path: String,
    /// 候选条目表
    pub item_table: String,
    /// 评测结果表
    pub result_table: String,
    /// 每批题目数 n
    pub batch_size: usize,
    /// status 上限 C
    pub status_ceiling: i64,
    pub sampling_policy: SamplingPolicy,
    pub claim_policy: ClaimPolicy,
    pub natural_key: NaturalKey,
    /// 启动时导入的种子文件夹（仅当候选表为空）
    pub seed_folder: Option<String>,
    /// 是否收集评论
    pub collect_comments: bool,
    /// 提交成功后展示的完成码
    pub completion_code: Option<String>,
    /// 固定随机种子（复现抽样）
    pub rng_seed: Option<u64>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::preset(SurveyKind::Clickbait)
    }
}

/// 可覆盖的配置项（TOML 文件 / 环境变量）
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub survey_kind: Option<SurveyKind>,
    pub database_path: Option<String>,
    pub item_table: Option<String>,
    pub result_table: Option<String>,
    pub batch_size: Option<usize>,
    pub status_ceiling: Option<i64>,
    pub sampling_policy: Option<SamplingPolicy>,
    pub claim_policy: Option<ClaimPolicy>,
    pub natural_key: Option<NaturalKey>,
    pub seed_folder: Option<String>,
    pub collect_comments: Option<bool>,
    pub completion_code: Option<String>,
    pub rng_seed: Option<u64>,
    pub verbose_logging: Option<bool>,
}

impl Config {
    /// 按问卷类型生成默认配置
    pub fn preset(kind: SurveyKind) -> Self {
        Self {
            survey_kind: kind,
            database_path: "survey.sqlite".to_string(),
            item_table: kind.default_item_table().to_string(),
            result_table: kind.default_result_table().to_string(),
            batch_size: kind.default_batch_size(),
            status_ceiling: kind.default_status_ceiling(),
            sampling_policy: kind.default_sampling_policy(),
            claim_policy: kind.default_claim_policy(),
            natural_key: kind.default_natural_key(),
            seed_folder: None,
            collect_comments: true,
            completion_code: kind.default_completion_code().map(str::to_string),
            rng_seed: None,
            verbose_logging: false,
        }
    }

    /// 加载配置：预设 → TOML 文件（`SURVEY_CONFIG`）→ 环境变量
    pub fn from_env() -> AppResult<Self> {
        let file = match std::env::var("SURVEY_CONFIG") {
            Ok(path) => Some(ConfigOverrides::from_toml_file(Path::new(&path))?),
            Err(_) => None,
        };
        let env = ConfigOverrides::from_lookup(|name| std::env::var(name).ok())?;
        Self::layered(file, env)
    }

    /// 组合各层覆盖项并校验
    pub fn layered(file: Option<ConfigOverrides>, env: ConfigOverrides) -> AppResult<Self> {
        let kind = env
            .survey_kind
            .or_else(|| file.as_ref().and_then(|f| f.survey_kind))
            .unwrap_or(SurveyKind::Clickbait);

        let mut config = Self::preset(kind);
        if let Some(file) = file {
            config.apply(file);
        }
        config.apply(env);
        config.validate()?;
        Ok(config)
    }

    /// 应用覆盖项（survey_kind 只影响预设选择）
    pub fn apply(&mut self, o: ConfigOverrides) {
        if let Some(v) = o.database_path {
            self.database_path = v;
        }
        if let Some(v) = o.item_table {
            self.item_table = v;
        }
        if let Some(v) = o.result_table {
            self.result_table = v;
        }
        if let Some(v) = o.batch_size {
            self.batch_size = v;
        }
        if let Some(v) = o.status_ceiling {
            self.status_ceiling = v;
        }
        if let Some(v) = o.sampling_policy {
            self.sampling_policy = v;
        }
        if let Some(v) = o.claim_policy {
            self.claim_policy = v;
        }
        if let Some(v) = o.natural_key {
            self.natural_key = v;
        }
        if o.seed_folder.is_some() {
            self.seed_folder = o.seed_folder;
        }
        if let Some(v) = o.collect_comments {
            self.collect_comments = v;
        }
        if o.completion_code.is_some() {
            self.completion_code = o.completion_code;
        }
        if o.rng_seed.is_some() {
            self.rng_seed = o.rng_seed;
        }
        if let Some(v) = o.verbose_logging {
            self.verbose_logging = v;
        }
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("item_table", &self.item_table),
            ("result_table", &self.result_table),
        ] {
            if !is_valid_identifier(value) {
                return Err(ConfigError::InvalidIdentifier {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }
        if self.item_table == self.result_table {
            return Err(ConfigError::InvalidValue {
                field: "result_table".to_string(),
                reason: "不能与 item_table 相同".to_string(),
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_size".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        if self.status_ceiling <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "status_ceiling".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 表布局
    pub fn table_layout(&self) -> TableLayout {
        TableLayout {
            item_table: self.item_table.clone(),
            result_table: self.result_table.clone(),
            judgment_column: self.survey_kind.judgment_column().to_string(),
        }
    }
}

impl ConfigOverrides {
    /// 从 TOML 文件读取
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        toml::from_str(&content)
            .map_err(|e| AppError::toml_parse_failed(path.display().to_string(), e))
    }

    /// 从环境变量读取（`lookup` 便于测试替换）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            survey_kind: parse_var(&lookup, "SURVEY_KIND", "clickbait | relevance", SurveyKind::from_str)?,
            database_path: lookup("SURVEY_DATABASE"),
            item_table: lookup("SURVEY_ITEM_TABLE"),
            result_table: lookup("SURVEY_RESULT_TABLE"),
            batch_size: parse_var(&lookup, "SURVEY_BATCH_SIZE", "usize", |v| v.parse().ok())?,
            status_ceiling: parse_var(&lookup, "SURVEY_STATUS_CEILING", "i64", |v| v.parse().ok())?,
            sampling_policy: parse_var(
                &lookup,
                "SURVEY_SAMPLING_POLICY",
                "weighted_complement | uniform_per_content",
                SamplingPolicy::parse,
            )?,
            claim_policy: parse_var(
                &lookup,
                "SURVEY_CLAIM_POLICY",
                "at_sampling | at_submission",
                ClaimPolicy::parse,
            )?,
            natural_key: parse_var(
                &lookup,
                "SURVEY_NATURAL_KEY",
                "content_headline | content_headline_beta_model",
                NaturalKey::parse,
            )?,
            seed_folder: lookup("SURVEY_SEED_FOLDER"),
            collect_comments: parse_var(&lookup, "SURVEY_COLLECT_COMMENTS", "bool", |v| v.parse().ok())?,
            completion_code: lookup("SURVEY_COMPLETION_CODE"),
            rng_seed: parse_var(&lookup, "SURVEY_RNG_SEED", "u64", |v| v.parse().ok())?,
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", "bool", |v| v.parse().ok())?,
        })
    }
}

fn parse_var<F, T, P>(lookup: &F, var_name: &str, expected_type: &str, parse: P) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => match parse(&value) {
            Some(parsed) => Ok(Some(parsed)),
            None => Err(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> ConfigOverrides {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigOverrides::from_lookup(|name| map.get(name).cloned()).unwrap()
    }

    #[test]
    fn test_survey_kind_selects_preset() {
        let config = Config::layered(None, env_of(&[("SURVEY_KIND", "relevance")])).unwrap();
        assert_eq!(config.status_ceiling, 8);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.sampling_policy, SamplingPolicy::UniformPerContent);
        assert_eq!(config.claim_policy, ClaimPolicy::AtSubmission);
        assert_eq!(config.completion_code.as_deref(), Some("headline2024"));
    }

    #[test]
    fn test_env_overrides_file() {
        let file: ConfigOverrides = toml::from_str(
            r#"
survey_kind = "clickbait"
batch_size = 4
claim_policy = "at_submission"
"#,
        )
        .unwrap();
        let config = Config::layered(Some(file), env_of(&[("SURVEY_BATCH_SIZE", "6")])).unwrap();
        assert_eq!(config.batch_size, 6);
        assert_eq!(config.claim_policy, ClaimPolicy::AtSubmission);
        assert_eq!(config.status_ceiling, 5);
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let err = ConfigOverrides::from_lookup(|name| {
            (name == "SURVEY_STATUS_CEILING").then(|| "five".to_string())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVarParseFailed { ref var_name, .. } if var_name == "SURVEY_STATUS_CEILING"
        ));
    }

    #[test]
    fn test_validate_rejects_injection_in_table_name() {
        let mut config = Config::default();
        config.item_table = "items; DROP TABLE x".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = Config::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_file_key_rejected() {
        let parsed: Result<ConfigOverrides, _> = toml::from_str("batch = 3");
        assert!(parsed.is_err());
    }
}
