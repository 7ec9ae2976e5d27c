//! Flowdock HTTP 客户端
//!
//! 每次推送是一次同步 POST，不重试、不排队。
//! 传输层抽象为 `HttpTransport`，测试时可以替换。

use super::chat::ChatMessage;
use super::message::{Endpoint, FlowdockMessage};
use super::team_inbox::TeamInboxMessage;
use crate::error::{FlowdockError, Result};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Url;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// 默认 API 地址
pub const DEFAULT_API_URL: &str = "https://api.flowdock.com";

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// "test connection" 发送的内容
pub const TEST_MESSAGE_CONTENT: &str = "Your plugin is ready!";

/// 默认超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP 响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 表单 POST 传输层
pub trait HttpTransport: Send + Sync {
    /// POST 表单数据，收到任何 HTTP 响应都返回 `Ok`
    fn post_form(&self, url: &str, body: &str) -> Result<HttpResponse>;
}

/// 基于 reqwest blocking client 的传输层
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(timeout, true)
    }

    /// 不经过系统代理（本机地址使用）
    pub fn direct() -> Result<Self> {
        Self::build(Duration::from_secs(DEFAULT_TIMEOUT_SECS), false)
    }

    fn build(timeout: Duration, use_proxy: bool) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0);
        if !use_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| FlowdockError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

/// 是否指向本机
fn is_loopback(base_url: &str) -> bool {
    let Ok(url) = Url::parse(base_url) else {
        return false;
    };
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_form(&self, url: &str, body: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(CONTENT_LENGTH, body.len().to_string())
            .body(body.to_string())
            .send()
            .map_err(FlowdockError::transport)?;

        let status = response.status().as_u16();
        let body = response.text().map_err(FlowdockError::transport)?;
        Ok(HttpResponse { status, body })
    }
}

/// Flowdock 推送接口
pub trait FlowdockApi {
    fn push_team_inbox_message(&self, message: &TeamInboxMessage) -> Result<()>;

    fn push_chat_message(&self, message: &ChatMessage) -> Result<()>;
}

/// Flowdock API 客户端
pub struct FlowdockClient<T: HttpTransport = ReqwestTransport> {
    base_url: String,
    flow_token: String,
    transport: T,
}

impl FlowdockClient<ReqwestTransport> {
    /// 使用默认 HTTP 传输层创建客户端
    pub fn new(base_url: &str, flow_token: &str) -> Result<Self> {
        let transport = if is_loopback(base_url) {
            ReqwestTransport::direct()?
        } else {
            ReqwestTransport::new()?
        };
        Ok(Self::with_transport(base_url, flow_token, transport))
    }
}

impl<T: HttpTransport> FlowdockClient<T> {
    pub fn with_transport(base_url: &str, flow_token: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            flow_token: flow_token.to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 目标端点的完整 URL
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        // token 中的空白会破坏 URL 路径
        let token: String = self.flow_token.split_whitespace().collect();
        endpoint.url(&self.base_url, &token)
    }

    /// 推送任意消息，2xx 以外的状态码视为失败
    pub fn push(&self, message: &dyn FlowdockMessage) -> Result<()> {
        let endpoint = message.endpoint();
        let url = self.endpoint_url(endpoint);
        let body = message.as_post_data();

        debug!(endpoint = endpoint.label(), body_len = body.len(), "Posting Flowdock message");

        let response = self.transport.post_form(&url, &body)?;
        if response.is_success() {
            debug!(endpoint = endpoint.label(), status = response.status, "Flowdock accepted message");
            Ok(())
        } else {
            warn!(endpoint = endpoint.label(), status = response.status, "Flowdock rejected message");
            Err(FlowdockError::NotificationFailure {
                status: Some(response.status),
                body: response.body,
            })
        }
    }

    /// 发送测试聊天消息，校验 token 和 API 地址
    pub fn test_connection(&self, tags: &str) -> Result<()> {
        let message = ChatMessage::new()
            .with_content(TEST_MESSAGE_CONTENT)
            .with_tags(tags);
        self.push_chat_message(&message)
    }
}

impl<T: HttpTransport> FlowdockApi for FlowdockClient<T> {
    fn push_team_inbox_message(&self, message: &TeamInboxMessage) -> Result<()> {
        self.push(message)
    }

    fn push_chat_message(&self, message: &ChatMessage) -> Result<()> {
        self.push(message)
    }
}
