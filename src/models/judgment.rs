/// 评测员的三态判断
///
/// 界面上的选项为 `""`、`"Yes"`、`"No"`，这里用枚举代替字符串比较
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Judgment {
    /// 尚未选择
    #[default]
    Unset,
    /// 是（标题党 / 相关）
    Affirmative,
    /// 否
    Negative,
}

impl Judgment {
    /// 界面上展示的全部选项（按顺序）
    pub const OPTIONS: [Judgment; 3] = [Judgment::Unset, Judgment::Affirmative, Judgment::Negative];

    /// 是否已作答
    pub fn is_set(self) -> bool {
        !matches!(self, Judgment::Unset)
    }

    /// 写入结果表的取值
    pub fn as_str(self) -> &'static str {
        match self {
            Judgment::Unset => "",
            Judgment::Affirmative => "Yes",
            Judgment::Negative => "No",
        }
    }

    /// 从界面输入解析（忽略大小写）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Some(Judgment::Unset),
            "yes" | "y" => Some(Judgment::Affirmative),
            "no" | "n" => Some(Judgment::Negative),
            _ => None,
        }
    }
}

impl std::fmt::Display for Judgment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Judgment::Unset => write!(f, "(未作答)"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}
