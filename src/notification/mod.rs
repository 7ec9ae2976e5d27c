//! Flowdock 通知 - 分类、消息渲染和推送
//!
//! # 流程
//! 1. `classify`: 本次与上一次构建结果 -> `Category`
//! 2. `TeamInboxMessage` / `ChatMessage`: 根据构建渲染消息
//! 3. `FormEncoder`: 编码为 `application/x-www-form-urlencoded`
//! 4. `FlowdockClient`: POST 到 `/messages/{team_inbox,chat}/{flow_token}`
//!
//! # 使用示例
//! ```ignore
//! use flowdock_notifier::{BuildListener, BuildRecord, FlowdockNotifier, NotifierConfig, Outcome};
//!
//! let config = NotifierConfig::new("flow-token")?.with_tags("ci");
//! let build = BuildRecord::new(Outcome::Failure, "api", "#42")
//!     .with_urls("https://ci.example.com/", "job/api/42/");
//! let mut listener = BuildListener::stdout();
//! FlowdockNotifier::new(config).perform_with_api_url("https://api.flowdock.com", &build, &mut listener);
//! ```

pub mod category;
pub mod form;
pub mod message;
pub mod chat;
pub mod team_inbox;
pub mod client;
pub mod notifier;

pub use category::{classify, Category, Outcome};
pub use form::FormEncoder;
pub use message::{Endpoint, FlowdockMessage};
pub use chat::ChatMessage;
pub use team_inbox::TeamInboxMessage;
pub use client::{FlowdockApi, FlowdockClient, HttpResponse, HttpTransport, ReqwestTransport, DEFAULT_API_URL};
pub use notifier::FlowdockNotifier;
