//! 通知器配置
//!
//! - `NotifierConfig`: 单个任务的通知配置，构造后只读
//! - `NotifyMap`: 每个分类是否通知，按类型保证覆盖全部六个分类
//! - `GlobalSettings`: 全局 API 地址，配置界面可以替换
//!
//! 全局配置读取优先级：
//! 1. 环境变量 `FLOWDOCK_API_URL`
//! 2. 配置文件 `~/.config/flowdock-notifier/config.json` 的 `apiUrl`
//! 3. 默认值 `https://api.flowdock.com`

use crate::error::{FlowdockError, Result};
use crate::notification::category::Category;
use crate::notification::client::{FlowdockClient, DEFAULT_API_URL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// "test connection" 成功时返回给配置界面的文字
pub const TEST_CONNECTION_OK: &str = "Success! Flowdock plugin can send notifications to your flow.";

fn default_true() -> bool {
    true
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !is_blank(s))
}

/// 每个分类是否发送通知
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyMap {
    #[serde(default = "default_true")]
    pub notify_success: bool,
    #[serde(default = "default_true")]
    pub notify_failure: bool,
    #[serde(default = "default_true")]
    pub notify_fixed: bool,
    #[serde(default = "default_true")]
    pub notify_unstable: bool,
    #[serde(default = "default_true")]
    pub notify_aborted: bool,
    #[serde(default = "default_true")]
    pub notify_not_built: bool,
}

impl Default for NotifyMap {
    fn default() -> Self {
        Self::all(true)
    }
}

impl NotifyMap {
    pub fn all(enabled: bool) -> Self {
        Self {
            notify_success: enabled,
            notify_failure: enabled,
            notify_fixed: enabled,
            notify_unstable: enabled,
            notify_aborted: enabled,
            notify_not_built: enabled,
        }
    }

    pub fn get(&self, category: Category) -> bool {
        match category {
            Category::Success => self.notify_success,
            Category::Failure => self.notify_failure,
            Category::Fixed => self.notify_fixed,
            Category::Unstable => self.notify_unstable,
            Category::Aborted => self.notify_aborted,
            Category::NotBuilt => self.notify_not_built,
        }
    }

    pub fn set(&mut self, category: Category, enabled: bool) {
        let slot = match category {
            Category::Success => &mut self.notify_success,
            Category::Failure => &mut self.notify_failure,
            Category::Fixed => &mut self.notify_fixed,
            Category::Unstable => &mut self.notify_unstable,
            Category::Aborted => &mut self.notify_aborted,
            Category::NotBuilt => &mut self.notify_not_built,
        };
        *slot = enabled;
    }
}

/// 单个任务的通知配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifierConfig {
    flow_token: String,
    #[serde(default)]
    notification_tags: String,
    #[serde(default = "default_true")]
    chat_notification: bool,
    #[serde(flatten)]
    notify_map: NotifyMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl NotifierConfig {
    /// 创建默认配置：聊天通知开启，所有分类都通知
    pub fn new(flow_token: impl Into<String>) -> Result<Self> {
        let flow_token = flow_token.into();
        if is_blank(&flow_token) {
            return Err(FlowdockError::Configuration("flow token is required".to_string()));
        }
        Ok(Self {
            flow_token,
            notification_tags: String::new(),
            chat_notification: true,
            notify_map: NotifyMap::default(),
            subject: None,
            content: None,
        })
    }

    /// 兼容旧版字符串参数：通知开关仅在值为 `"true"` 时开启
    ///
    /// 旧版参数不包含聊天开关，聊天通知保持开启。
    #[allow(clippy::too_many_arguments)]
    pub fn from_legacy_flags(
        flow_token: &str,
        notification_tags: Option<&str>,
        notify_success: Option<&str>,
        notify_failure: Option<&str>,
        notify_fixed: Option<&str>,
        notify_unstable: Option<&str>,
        notify_aborted: Option<&str>,
        notify_not_built: Option<&str>,
    ) -> Result<Self> {
        let flag = |value: Option<&str>| value == Some("true");
        let notify_map = NotifyMap {
            notify_success: flag(notify_success),
            notify_failure: flag(notify_failure),
            notify_fixed: flag(notify_fixed),
            notify_unstable: flag(notify_unstable),
            notify_aborted: flag(notify_aborted),
            notify_not_built: flag(notify_not_built),
        };
        Ok(Self::new(flow_token)?
            .with_tags(notification_tags.unwrap_or_default())
            .with_notify_map(notify_map))
    }

    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FlowdockError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| FlowdockError::Configuration(format!("invalid notifier config: {}", e)))?;
        if is_blank(&config.flow_token) {
            return Err(FlowdockError::Configuration("flow token is required".to_string()));
        }
        Ok(Self {
            subject: non_blank(config.subject),
            content: non_blank(config.content),
            ..config
        })
    }

    /// 替换 flow token，拒绝空白值
    pub fn with_flow_token(mut self, flow_token: impl Into<String>) -> Result<Self> {
        let flow_token = flow_token.into();
        if is_blank(&flow_token) {
            return Err(FlowdockError::Configuration("flow token is required".to_string()));
        }
        self.flow_token = flow_token;
        Ok(self)
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.notification_tags = tags.into();
        self
    }

    pub fn with_chat_notification(mut self, enabled: bool) -> Self {
        self.chat_notification = enabled;
        self
    }

    pub fn with_notify(mut self, category: Category, enabled: bool) -> Self {
        self.notify_map.set(category, enabled);
        self
    }

    pub fn with_notify_map(mut self, notify_map: NotifyMap) -> Self {
        self.notify_map = notify_map;
        self
    }

    /// 空白模板视为不覆盖
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = non_blank(Some(subject.into()));
        self
    }

    /// 空白模板视为不覆盖
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = non_blank(Some(content.into()));
        self
    }

    pub fn flow_token(&self) -> &str {
        &self.flow_token
    }

    pub fn notification_tags(&self) -> &str {
        &self.notification_tags
    }

    pub fn chat_notification(&self) -> bool {
        self.chat_notification
    }

    pub fn notify_map(&self) -> &NotifyMap {
        &self.notify_map
    }

    pub fn should_notify(&self, category: Category) -> bool {
        self.notify_map.get(category)
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// 全局配置文件内容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GlobalFile {
    #[serde(default)]
    api_url: Option<String>,
}

/// 全局配置：Flowdock API 地址
///
/// 配置界面写入、通知器读取；写入整体替换不可变字符串。
#[derive(Debug)]
pub struct GlobalSettings {
    api_url: RwLock<Arc<str>>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self::with_api_url(DEFAULT_API_URL)
    }
}

impl GlobalSettings {
    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            api_url: RwLock::new(Arc::from(api_url)),
        }
    }

    /// 默认配置文件路径
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/flowdock-notifier/config.json"))
    }

    /// 按优先级加载
    pub fn load() -> Self {
        let settings = match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable Flowdock config");
                Self::default()
            }),
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var("FLOWDOCK_API_URL") {
            if !is_blank(&url) {
                debug!("Using FLOWDOCK_API_URL from environment");
                settings.configure(&url);
            }
        }
        settings
    }

    /// 从指定文件加载，缺少 `apiUrl` 时使用默认地址
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FlowdockError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let file: GlobalFile = serde_json::from_str(&content)
            .map_err(|e| FlowdockError::Configuration(format!("invalid config {}: {}", path.display(), e)))?;
        let api_url = non_blank(file.api_url).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        debug!(api_url = %api_url, "Loaded Flowdock config from {}", path.display());
        Ok(Self::with_api_url(&api_url))
    }

    /// 写回配置文件
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let file = GlobalFile {
            api_url: Some(self.api_url().to_string()),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| FlowdockError::Configuration(format!("cannot create {}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| FlowdockError::Configuration(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| FlowdockError::Configuration(format!("cannot write {}: {}", path.display(), e)))
    }

    pub fn api_url(&self) -> Arc<str> {
        match self.api_url.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// 替换 API 地址
    pub fn configure(&self, api_url: &str) {
        let value: Arc<str> = Arc::from(api_url.trim());
        match self.api_url.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }

    /// 向 flow 发送测试消息，返回给配置界面的提示文字
    pub fn test_connection(&self, flow_token: &str, tags: &str) -> Result<String> {
        let client = FlowdockClient::new(&self.api_url(), flow_token)?;
        client
            .test_connection(tags)
            .map(|_| TEST_CONNECTION_OK.to_string())
            .map_err(|e| FlowdockError::Configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_behaviors() {
        let config = NotifierConfig::new("the-token").unwrap();
        assert_eq!(config.flow_token(), "the-token");
        assert_eq!(config.notification_tags(), "");
        assert!(config.subject().is_none());
        assert!(config.content().is_none());
        assert!(config.chat_notification());
        for category in Category::ALL {
            assert!(config.should_notify(category), "{} should default to true", category);
        }
    }

    #[test]
    fn test_blank_token_rejected() {
        assert!(matches!(
            NotifierConfig::new("  "),
            Err(FlowdockError::Configuration(_))
        ));
    }

    #[test]
    fn test_legacy_flags() {
        let config = NotifierConfig::from_legacy_flags(
            "the-token",
            Some("tags"),
            Some("false"),
            Some("false"),
            Some(""),
            None,
            Some("not-a-value"),
            Some("true"),
        )
        .unwrap();

        assert!(config.chat_notification());
        assert!(!config.should_notify(Category::Success));
        assert!(!config.should_notify(Category::Failure));
        assert!(!config.should_notify(Category::Fixed));
        assert!(!config.should_notify(Category::Unstable));
        assert!(!config.should_notify(Category::Aborted));
        assert!(config.should_notify(Category::NotBuilt));
        assert_eq!(config.notification_tags(), "tags");
        assert_eq!(config.flow_token(), "the-token");
    }

    #[test]
    fn test_legacy_flags_always_enable_chat() {
        let config =
            NotifierConfig::from_legacy_flags("t", None, None, None, None, None, None, None).unwrap();
        assert!(config.chat_notification());
        assert_eq!(config.notify_map(), &NotifyMap::all(false));
    }

    #[test]
    fn test_subject_and_content() {
        let config = NotifierConfig::new("t")
            .unwrap()
            .with_subject("the-subject")
            .with_content("the-content");
        assert_eq!(config.subject(), Some("the-subject"));
        assert_eq!(config.content(), Some("the-content"));
    }

    #[test]
    fn test_with_flow_token_keeps_other_settings() {
        let config = NotifierConfig::new("old")
            .unwrap()
            .with_tags("ci")
            .with_flow_token("new")
            .unwrap();
        assert_eq!(config.flow_token(), "new");
        assert_eq!(config.notification_tags(), "ci");
        assert!(NotifierConfig::new("old").unwrap().with_flow_token("").is_err());
    }

    #[test]
    fn test_blank_templates_do_not_override() {
        let config = NotifierConfig::new("t").unwrap().with_subject("   ").with_content("");
        assert!(config.subject().is_none());
        assert!(config.content().is_none());
    }

    #[test]
    fn test_notify_map_set_and_get_is_total() {
        let mut map = NotifyMap::default();
        map.set(Category::Fixed, false);
        for category in Category::ALL {
            assert_eq!(map.get(category), category != Category::Fixed);
        }
    }

    #[test]
    fn test_config_json_defaults() {
        let config = NotifierConfig::from_json(r#"{"flowToken": "abc", "notifySuccess": false, "subject": " "}"#).unwrap();
        assert_eq!(config.flow_token(), "abc");
        assert!(config.chat_notification());
        assert!(!config.should_notify(Category::Success));
        assert!(config.should_notify(Category::Failure));
        assert!(config.should_notify(Category::NotBuilt));
        assert!(config.subject().is_none());
    }

    #[test]
    fn test_config_json_round_trip_field_names() {
        let config = NotifierConfig::new("abc")
            .unwrap()
            .with_notify(Category::Aborted, false)
            .with_tags("ci,deploy");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["flowToken"], "abc");
        assert_eq!(json["notificationTags"], "ci,deploy");
        assert_eq!(json["notifyAborted"], false);
        assert_eq!(json["notifyNotBuilt"], true);
        assert!(json.get("subject").is_none());
    }

    #[test]
    fn test_config_json_requires_token() {
        assert!(NotifierConfig::from_json(r#"{"flowToken": ""}"#).is_err());
        assert!(NotifierConfig::from_json(r#"{"chatNotification": false}"#).is_err());
    }

    #[test]
    fn test_global_settings_default_and_configure() {
        let settings = GlobalSettings::default();
        assert_eq!(&*settings.api_url(), "https://api.flowdock.com");
        settings.configure("http://localhost:9999");
        assert_eq!(&*settings.api_url(), "http://localhost:9999");
    }

    #[test]
    fn test_global_settings_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        GlobalSettings::with_api_url("http://flowdock.local").save_to(&path).unwrap();

        let loaded = GlobalSettings::load_from(&path).unwrap();
        assert_eq!(&*loaded.api_url(), "http://flowdock.local");
    }

    #[test]
    fn test_global_settings_file_without_api_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{}").unwrap();
        let loaded = GlobalSettings::load_from(&path).unwrap();
        assert_eq!(&*loaded.api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_connection_failure_is_configuration_error() {
        // 端口 9 (discard) 上通常没有 HTTP 服务
        let settings = GlobalSettings::with_api_url("http://127.0.0.1:9");
        let err = settings.test_connection("abc", "").unwrap_err();
        assert!(matches!(err, FlowdockError::Configuration(_)));
    }
}
