//! 构建结果分类
//!
//! CI 原始结果 (`Outcome`) 与通知分类 (`Category`) 分开建模：
//! `Category::Fixed` 只由 `classify` 合成，CI 本身不会报告它。

use serde::{Deserialize, Serialize};

/// CI 报告的原始构建结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success,
    Failure,
    Unstable,
    Aborted,
    NotBuilt,
    /// 没有上一次构建
    None,
}

impl Outcome {
    pub const ALL: [Outcome; 6] = [
        Outcome::Success,
        Outcome::Failure,
        Outcome::Unstable,
        Outcome::Aborted,
        Outcome::NotBuilt,
        Outcome::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Failure => "FAILURE",
            Outcome::Unstable => "UNSTABLE",
            Outcome::Aborted => "ABORTED",
            Outcome::NotBuilt => "NOT_BUILT",
            Outcome::None => "NONE",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    /// 大小写不敏感，`-` 与 `_` 等价
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        Outcome::ALL
            .into_iter()
            .find(|o| o.as_str() == normalized)
            .ok_or_else(|| format!("unknown build outcome: {}", s))
    }
}

/// 通知分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Success,
    Failure,
    Fixed,
    Unstable,
    Aborted,
    NotBuilt,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Success,
        Category::Failure,
        Category::Fixed,
        Category::Unstable,
        Category::Aborted,
        Category::NotBuilt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Success => "SUCCESS",
            Category::Failure => "FAILURE",
            Category::Fixed => "FIXED",
            Category::Unstable => "UNSTABLE",
            Category::Aborted => "ABORTED",
            Category::NotBuilt => "NOT_BUILT",
        }
    }

    /// 主题和聊天消息里使用的动词短语
    pub fn verb(&self) -> &'static str {
        match self {
            Category::Success => "was successful",
            Category::Failure => "failed",
            Category::Fixed => "was fixed",
            Category::Unstable => "was unstable",
            Category::Aborted => "was aborted",
            Category::NotBuilt => "was not built",
        }
    }

    /// 聊天消息前缀 emoji
    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Success | Category::Fixed => ":white_check_mark:",
            Category::Failure => ":x:",
            Category::Unstable => ":heavy_exclamation_mark:",
            Category::Aborted => ":no_entry_sign:",
            Category::NotBuilt => ":o:",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 根据本次和上一次构建结果计算通知分类
///
/// 成功构建且上一次为 FAILURE/UNSTABLE 时为 `Fixed`，否则按同名映射。
/// `current` 为 `None` 不应出现，按未构建处理。
pub fn classify(current: Outcome, previous: Outcome) -> Category {
    match (current, previous) {
        (Outcome::Success, Outcome::Failure | Outcome::Unstable) => Category::Fixed,
        (Outcome::Success, _) => Category::Success,
        (Outcome::Failure, _) => Category::Failure,
        (Outcome::Unstable, _) => Category::Unstable,
        (Outcome::Aborted, _) => Category::Aborted,
        (Outcome::NotBuilt, _) | (Outcome::None, _) => Category::NotBuilt,
    }
}
