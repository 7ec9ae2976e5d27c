//! Flowdock Team Inbox 消息
//!
//! HTML 片段必须与 Flowdock 端已有的渲染逐字节一致，
//! 因此用小函数拼接字符串，而不是模板引擎。

use super::category::{Category, Outcome};
use super::form::FormEncoder;
use super::message::{compact_tags, Endpoint, FlowdockMessage};
use crate::build::{BuildInfo, ChangeEntry, EnvVars};

pub const DEFAULT_FROM_NAME: &str = "CI";
pub const DEFAULT_SOURCE: &str = "Jenkins";
pub const FROM_ADDRESS_OK: &str = "build+ok@flowdock.com";
pub const FROM_ADDRESS_FAIL: &str = "build+fail@flowdock.com";

/// 缺少作者或提交号时的占位文字
const UNKNOWN: &str = "unknown";

/// Team Inbox 消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamInboxMessage {
    pub subject: String,
    /// HTML 内容
    pub content: String,
    pub from_address: String,
    pub from_name: String,
    pub source: String,
    pub project: String,
    pub link: String,
    pub tags: String,
}

impl Default for TeamInboxMessage {
    fn default() -> Self {
        Self {
            subject: String::new(),
            content: String::new(),
            from_address: String::new(),
            from_name: DEFAULT_FROM_NAME.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            project: String::new(),
            link: String::new(),
            tags: String::new(),
        }
    }
}

impl TeamInboxMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 根据构建生成消息，标签留空
    ///
    /// `from_address` 取决于 CI 原始结果而不是合成的分类，
    /// 所以 FIXED 构建使用 `build+ok`。
    pub fn from_build(build: &dyn BuildInfo, category: Category, env: &EnvVars) -> Self {
        let project = build.project_display_name().to_string();
        let url = build.absolute_url();

        let mut content = summary_html(build, &url);
        content.push_str(&version_control_html(env));
        content.push_str(&change_set_html(build.change_set()));

        Self {
            subject: format!(
                "{} build {} {}",
                project,
                build.build_display_name(),
                category.verb()
            ),
            content,
            from_address: from_address(build.current_outcome()).to_string(),
            project,
            link: url,
            ..Self::default()
        }
    }
}

impl FlowdockMessage for TeamInboxMessage {
    fn endpoint(&self) -> Endpoint {
        Endpoint::TeamInbox
    }

    fn as_post_data(&self) -> String {
        FormEncoder::encode(&[
            ("subject", self.subject.as_str()),
            ("content", self.content.as_str()),
            ("from_address", self.from_address.as_str()),
            ("from_name", self.from_name.as_str()),
            ("source", self.source.as_str()),
            ("project", self.project.as_str()),
            ("link", self.link.as_str()),
            ("tags", compact_tags(&self.tags).as_str()),
        ])
    }
}

pub fn from_address(outcome: Outcome) -> &'static str {
    if outcome == Outcome::Failure {
        FROM_ADDRESS_FAIL
    } else {
        FROM_ADDRESS_OK
    }
}

fn summary_html(build: &dyn BuildInfo, url: &str) -> String {
    format!(
        "<h3>{}</h3>Build: {}<br />Result: <strong>{}</strong><br />URL: <a href=\"{}\">{}</a><br />",
        build.project_display_name(),
        build.build_display_name(),
        build.current_outcome().as_str(),
        url,
        build.full_display_name()
    )
}

/// 环境里有 `GIT_BRANCH` 或 `GIT_URL` 时输出版本控制信息
fn version_control_html(env: &EnvVars) -> String {
    if !env.contains_key("GIT_BRANCH") && !env.contains_key("GIT_URL") {
        return String::new();
    }
    format!(
        "<br /><strong>Version control:</strong><br />Git branch: {}<br/>Git URL: {}<br/><br/>",
        env.get("GIT_BRANCH").unwrap_or_default(),
        env.get("GIT_URL").unwrap_or_default()
    )
}

fn change_set_html(changes: &[ChangeEntry]) -> String {
    if changes.is_empty() {
        return String::new();
    }
    let mut html = String::from("<h3>Changes</h3><div class=\"commits\"><ul class=\"commit-list clean\">");
    for entry in changes {
        html.push_str(&commit_html(entry));
    }
    html.push_str("</ul></div>");
    html
}

fn commit_html(entry: &ChangeEntry) -> String {
    let author = entry.author_display.as_deref().unwrap_or(UNKNOWN);
    let sha = entry.commit_id.as_deref().unwrap_or(UNKNOWN);
    format!(
        "<li class=\"commit\"><span class=\"commit-details\"><span class=\"author-info\"><span>{}</span></span> &nbsp;<span title=\"{}\" class=\"commit-sha\">{}</span> &nbsp;<span class=\"commit-message\">{}</span></span></li>",
        author, sha, sha, entry.message
    )
}
