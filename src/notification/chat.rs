//! Flowdock 聊天消息

use super::category::Category;
use super::form::FormEncoder;
use super::message::{trimmed_tags, Endpoint, FlowdockMessage};
use crate::build::BuildInfo;

/// 默认外部用户名
pub const DEFAULT_EXTERNAL_USER_NAME: &str = "Jenkins";

/// 聊天消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub content: String,
    pub tags: String,
    pub external_user_name: String,
}

impl Default for ChatMessage {
    fn default() -> Self {
        Self {
            content: String::new(),
            tags: String::new(),
            external_user_name: DEFAULT_EXTERNAL_USER_NAME.to_string(),
        }
    }
}

impl ChatMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn with_external_user_name(mut self, name: impl Into<String>) -> Self {
        self.external_user_name = name.into();
        self
    }

    /// 根据构建生成一行摘要，标签留空
    ///
    /// 例如 `:x:[api build #42 **failed**](http://ci/job/api/42/)`
    pub fn from_build(build: &dyn BuildInfo, category: Category) -> Self {
        let content = format!(
            "{}[{} build {} **{}**]({})",
            category.emoji(),
            build.project_display_name(),
            build.build_display_name(),
            category.verb(),
            build.absolute_url()
        );
        Self::new().with_content(content)
    }
}

impl FlowdockMessage for ChatMessage {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Chat
    }

    fn as_post_data(&self) -> String {
        FormEncoder::encode(&[
            ("content", self.content.as_str()),
            ("external_user_name", self.external_user_name.as_str()),
            ("tags", trimmed_tags(&self.tags)),
        ])
    }
}
