//! Flowdock Notifier - 将 CI 构建结果推送到 Flowdock Team Inbox 和聊天

pub mod build;
pub mod config;
pub mod error;
pub mod listener;
pub mod notification;

pub use build::{BuildInfo, BuildRecord, ChangeEntry, EnvVars};
pub use config::{GlobalSettings, NotifierConfig, NotifyMap};
pub use error::FlowdockError;
pub use listener::{BuildListener, LogBuffer};
pub use notification::{
    classify, Category, ChatMessage, Endpoint, FlowdockApi, FlowdockClient, FlowdockMessage,
    FlowdockNotifier, FormEncoder, HttpResponse, HttpTransport, Outcome, ReqwestTransport,
    TeamInboxMessage, DEFAULT_API_URL,
};
