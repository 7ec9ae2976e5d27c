//! Flowdock 消息 trait 定义

/// 消息投递的 API 端点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    TeamInbox,
    Chat,
}

impl Endpoint {
    /// `/messages/` 之后的路径段
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::TeamInbox => "team_inbox",
            Endpoint::Chat => "chat",
        }
    }

    /// 日志中使用的名称
    pub fn label(&self) -> &'static str {
        match self {
            Endpoint::TeamInbox => "Team Inbox",
            Endpoint::Chat => "Chat",
        }
    }

    /// `{base_url}/messages/{path}/{flow_token}`
    pub fn url(&self, base_url: &str, flow_token: &str) -> String {
        format!("{}/messages/{}/{}", base_url, self.path(), flow_token)
    }
}

/// 可推送到 Flowdock 的消息
pub trait FlowdockMessage {
    fn endpoint(&self) -> Endpoint;

    /// 表单编码后的请求体
    fn as_post_data(&self) -> String;
}

/// 聊天标签：去掉首尾空白
pub(crate) fn trimmed_tags(tags: &str) -> &str {
    tags.trim()
}

/// Team Inbox 标签：去掉所有空白，`"a, b"` 变为 `"a,b"`
///
/// 与 Flowdock 插件 TeamInbox 消息测试中的格式一致；聊天标签只去首尾空白。
pub(crate) fn compact_tags(tags: &str) -> String {
    tags.chars().filter(|c| !c.is_whitespace()).collect()
}
