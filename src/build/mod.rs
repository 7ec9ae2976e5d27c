//! 构建元数据
//!
//! `BuildInfo` 是宿主 CI 提供给通知器的只读视图。
//! `BuildRecord` 是它的可序列化实现，CLI 从 JSON 文件加载。

pub mod env;

pub use env::EnvVars;

use crate::error::{FlowdockError, Result};
use crate::notification::category::Outcome;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 变更集中的一次提交
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    pub message: String,
    #[serde(default)]
    pub author_display: Option<String>,
    #[serde(default)]
    pub commit_id: Option<String>,
}

impl ChangeEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            author_display: None,
            commit_id: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author_display = Some(author.into());
        self
    }

    pub fn with_commit_id(mut self, commit_id: impl Into<String>) -> Self {
        self.commit_id = Some(commit_id.into());
        self
    }
}

/// 宿主 CI 提供的构建信息
pub trait BuildInfo {
    fn current_outcome(&self) -> Outcome;

    /// 紧邻的上一次构建结果，没有则为 `Outcome::None`
    fn previous_outcome(&self) -> Outcome;

    fn project_display_name(&self) -> &str;

    fn build_display_name(&self) -> &str;

    /// 相对 CI 根地址的构建路径
    fn build_url(&self) -> &str;

    fn ci_root_url(&self) -> &str;

    fn change_set(&self) -> &[ChangeEntry];

    /// 构建环境，宿主可能在此处失败
    fn environment(&self) -> Result<EnvVars>;

    /// 项目名加构建名，用作链接文字
    fn full_display_name(&self) -> String {
        format!("{} {}", self.project_display_name(), self.build_display_name())
    }

    fn absolute_url(&self) -> String {
        format!("{}{}", self.ci_root_url(), self.build_url())
    }

    /// 用构建环境展开模板
    fn expand(&self, template: &str) -> Result<String> {
        Ok(self.environment()?.expand(template))
    }
}

/// 可序列化的构建快照
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    pub current_outcome: Outcome,
    #[serde(default = "no_previous")]
    pub previous_outcome: Outcome,
    pub project_display_name: String,
    pub build_display_name: String,
    #[serde(default)]
    pub full_display_name: Option<String>,
    pub build_url: String,
    pub ci_root_url: String,
    #[serde(default)]
    pub environment: EnvVars,
    #[serde(default)]
    pub change_set: Vec<ChangeEntry>,
}

fn no_previous() -> Outcome {
    Outcome::None
}

impl BuildRecord {
    pub fn new(
        current_outcome: Outcome,
        project_display_name: impl Into<String>,
        build_display_name: impl Into<String>,
    ) -> Self {
        Self {
            current_outcome,
            previous_outcome: Outcome::None,
            project_display_name: project_display_name.into(),
            build_display_name: build_display_name.into(),
            full_display_name: None,
            build_url: String::new(),
            ci_root_url: String::new(),
            environment: EnvVars::new(),
            change_set: Vec::new(),
        }
    }

    pub fn with_previous(mut self, previous: Outcome) -> Self {
        self.previous_outcome = previous;
        self
    }

    pub fn with_urls(mut self, ci_root_url: impl Into<String>, build_url: impl Into<String>) -> Self {
        self.ci_root_url = ci_root_url.into();
        self.build_url = build_url.into();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key, value);
        self
    }

    pub fn with_change(mut self, entry: ChangeEntry) -> Self {
        self.change_set.push(entry);
        self
    }

    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlowdockError::EnvironmentUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            FlowdockError::EnvironmentUnavailable(format!("invalid build record {}: {}", path.display(), e))
        })
    }
}

impl BuildInfo for BuildRecord {
    fn current_outcome(&self) -> Outcome {
        self.current_outcome
    }

    fn previous_outcome(&self) -> Outcome {
        self.previous_outcome
    }

    fn project_display_name(&self) -> &str {
        &self.project_display_name
    }

    fn build_display_name(&self) -> &str {
        &self.build_display_name
    }

    fn build_url(&self) -> &str {
        &self.build_url
    }

    fn ci_root_url(&self) -> &str {
        &self.ci_root_url
    }

    fn change_set(&self) -> &[ChangeEntry] {
        &self.change_set
    }

    fn environment(&self) -> Result<EnvVars> {
        Ok(self.environment.clone())
    }

    fn full_display_name(&self) -> String {
        self.full_display_name
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.project_display_name, self.build_display_name))
    }
}
