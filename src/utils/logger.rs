/// 日志工具模块
///
/// 提供 tracing 初始化和日志格式化的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。重复调用无副作用
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", config.survey_kind);
    info!("🗄️ 数据库: {}", config.database_path);
    info!("📋 候选表: {} | 结果表: {}", config.item_table, config.result_table);
    info!(
        "📊 每批 {} 题 | status 上限 {} | 抽样策略: {} | 计数策略: {}",
        config.batch_size, config.status_ceiling, config.sampling_policy, config.claim_policy
    );
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("标题党测试", 3), "标题党...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }
}
