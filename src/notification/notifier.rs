//! 构建完成通知流程
//!
//! 1. 计算分类，未开启则记录日志后返回
//! 2. 生成 Team Inbox 消息，应用主题/内容模板和标签后推送
//! 3. 构建未成功或刚修复时，再推送聊天消息
//!
//! 任何错误只写入构建日志，不会让构建失败。

use super::category::{classify, Category, Outcome};
use super::chat::ChatMessage;
use super::client::{FlowdockApi, FlowdockClient};
use super::team_inbox::TeamInboxMessage;
use crate::build::{BuildInfo, EnvVars};
use crate::config::NotifierConfig;
use crate::error::FlowdockError;
use crate::listener::BuildListener;
use tracing::{debug, info};

/// 构建通知器
pub struct FlowdockNotifier {
    config: NotifierConfig,
}

impl FlowdockNotifier {
    pub fn new(config: NotifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// 使用 `api_url` 上的 Flowdock 发送通知，始终返回 `true`
    pub fn perform_with_api_url(&self, api_url: &str, build: &dyn BuildInfo, listener: &mut BuildListener) -> bool {
        match FlowdockClient::new(api_url, self.config.flow_token()) {
            Ok(client) => self.perform(build, &client, listener),
            Err(e) => {
                listener.error("failed to send notification", &e);
                true
            }
        }
    }

    /// 发送通知，始终返回 `true`
    pub fn perform(&self, build: &dyn BuildInfo, api: &dyn FlowdockApi, listener: &mut BuildListener) -> bool {
        let category = classify(build.current_outcome(), build.previous_outcome());
        debug!(
            project = build.project_display_name(),
            build = build.build_display_name(),
            category = %category,
            "Classified build"
        );

        if self.config.should_notify(category) {
            self.notify_flowdock(build, category, api, listener);
        } else {
            info!(category = %category, "Notification disabled for category");
            listener.println(&format!(
                "No Flowdock notification configured for build status: {}",
                category
            ));
        }
        true
    }

    /// 是否在 Team Inbox 之后发送聊天消息
    pub fn should_send_chat(&self, outcome: Outcome, category: Category) -> bool {
        self.config.chat_notification() && (outcome != Outcome::Success || category == Category::Fixed)
    }

    fn notify_flowdock(
        &self,
        build: &dyn BuildInfo,
        category: Category,
        api: &dyn FlowdockApi,
        listener: &mut BuildListener,
    ) {
        match self.send(build, category, api, listener) {
            Ok(()) => {}
            Err(e @ FlowdockError::EnvironmentUnavailable(_)) => {
                listener.error("failed to get variables from build", &e);
            }
            Err(e) => {
                listener.error("failed to send notification", &e);
            }
        }
    }

    fn send(
        &self,
        build: &dyn BuildInfo,
        category: Category,
        api: &dyn FlowdockApi,
        listener: &mut BuildListener,
    ) -> Result<(), FlowdockError> {
        let env = build.environment()?;

        let message = self.team_inbox_message(build, category, &env);
        api.push_team_inbox_message(&message)?;
        listener.log("Team Inbox notification sent successfully");

        if self.should_send_chat(build.current_outcome(), category) {
            let chat = self.chat_message(build, category, &env);
            api.push_chat_message(&chat)?;
            listener.log("Chat notification sent successfully");
        }
        Ok(())
    }

    /// 生成 Team Inbox 消息并应用模板和标签
    pub fn team_inbox_message(&self, build: &dyn BuildInfo, category: Category, env: &EnvVars) -> TeamInboxMessage {
        let mut message = TeamInboxMessage::from_build(build, category, env);
        if let Some(content) = self.config.content() {
            message.content = env.expand(content);
        }
        if let Some(subject) = self.config.subject() {
            message.subject = env.expand(subject);
        }
        message.tags = env.expand(self.config.notification_tags());
        message
    }

    /// 生成聊天消息并应用内容模板和标签
    pub fn chat_message(&self, build: &dyn BuildInfo, category: Category, env: &EnvVars) -> ChatMessage {
        let mut message = ChatMessage::from_build(build, category);
        if let Some(content) = self.config.content() {
            message.content = env.expand(content);
        }
        message.tags = env.expand(self.config.notification_tags());
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildRecord, ChangeEntry};
    use crate::error::Result;
    use std::sync::Mutex;

    /// 记录推送的 mock API
    #[derive(Default)]
    struct RecordingApi {
        fail_team_inbox: bool,
        fail_chat: bool,
        pushes: Mutex<Vec<String>>,
        team_inbox: Mutex<Vec<TeamInboxMessage>>,
        chat: Mutex<Vec<ChatMessage>>,
    }

    impl RecordingApi {
        fn failing() -> Self {
            Self {
                fail_team_inbox: true,
                ..Self::default()
            }
        }

        fn failing_chat() -> Self {
            Self {
                fail_chat: true,
                ..Self::default()
            }
        }

        fn pushes(&self) -> Vec<String> {
            self.pushes.lock().unwrap().clone()
        }
    }

    impl FlowdockApi for RecordingApi {
        fn push_team_inbox_message(&self, message: &TeamInboxMessage) -> Result<()> {
            self.pushes.lock().unwrap().push("team_inbox".to_string());
            if self.fail_team_inbox {
                return Err(FlowdockError::NotificationFailure {
                    status: Some(500),
                    body: "server error".to_string(),
                });
            }
            self.team_inbox.lock().unwrap().push(message.clone());
            Ok(())
        }

        fn push_chat_message(&self, message: &ChatMessage) -> Result<()> {
            self.pushes.lock().unwrap().push("chat".to_string());
            if self.fail_chat {
                return Err(FlowdockError::NotificationFailure {
                    status: Some(503),
                    body: "chat unavailable".to_string(),
                });
            }
            self.chat.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    /// 环境读取失败的构建
    struct BrokenEnvBuild(BuildRecord);

    impl BuildInfo for BrokenEnvBuild {
        fn current_outcome(&self) -> Outcome {
            self.0.current_outcome()
        }
        fn previous_outcome(&self) -> Outcome {
            self.0.previous_outcome()
        }
        fn project_display_name(&self) -> &str {
            self.0.project_display_name()
        }
        fn build_display_name(&self) -> &str {
            self.0.build_display_name()
        }
        fn build_url(&self) -> &str {
            self.0.build_url()
        }
        fn ci_root_url(&self) -> &str {
            self.0.ci_root_url()
        }
        fn change_set(&self) -> &[ChangeEntry] {
            self.0.change_set()
        }
        fn environment(&self) -> Result<EnvVars> {
            Err(FlowdockError::EnvironmentUnavailable("interrupted".to_string()))
        }
    }

    fn build(outcome: Outcome) -> BuildRecord {
        BuildRecord::new(outcome, "Project Name", "Build Name")
            .with_urls("http://localhost:8080", "/the-build-url")
            .with_env("BUILD_NUMBER", "42")
            .with_env("TAGS", "expanded-tags")
    }

    fn notifier() -> FlowdockNotifier {
        FlowdockNotifier::new(NotifierConfig::new("the-token").unwrap())
    }

    #[test]
    fn test_perform_success_traditional_behavior() {
        let notifier = FlowdockNotifier::new(NotifierConfig::new("the-token").unwrap().with_tags("$TAGS"));
        let api = RecordingApi::default();
        let (mut listener, log) = BuildListener::buffered();

        assert!(notifier.perform(&build(Outcome::Success), &api, &mut listener));

        assert_eq!(api.pushes(), vec!["team_inbox"]);
        let sent = api.team_inbox.lock().unwrap();
        assert_eq!(sent[0].tags, "expanded-tags");
        assert_eq!(sent[0].subject, "Project Name build Build Name was successful");
        assert_eq!(log.lines(), vec!["Flowdock: Team Inbox notification sent successfully"]);
    }

    #[test]
    fn test_perform_success_with_content_and_subject() {
        let config = NotifierConfig::new("the-token")
            .unwrap()
            .with_content("content #${BUILD_NUMBER}")
            .with_subject("subject #$BUILD_NUMBER");
        let notifier = FlowdockNotifier::new(config);
        let api = RecordingApi::default();
        let (mut listener, _log) = BuildListener::buffered();

        assert!(notifier.perform(&build(Outcome::Success), &api, &mut listener));

        let sent = api.team_inbox.lock().unwrap();
        assert_eq!(sent[0].content, "content #42");
        assert_eq!(sent[0].subject, "subject #42");
    }

    #[test]
    fn test_perform_failure_sends_both_in_order() {
        let api = RecordingApi::default();
        let (mut listener, log) = BuildListener::buffered();

        assert!(notifier().perform(&build(Outcome::Failure), &api, &mut listener));

        assert_eq!(api.pushes(), vec!["team_inbox", "chat"]);
        assert_eq!(
            log.lines(),
            vec![
                "Flowdock: Team Inbox notification sent successfully",
                "Flowdock: Chat notification sent successfully"
            ]
        );
    }

    #[test]
    fn test_perform_failure_with_content_overrides_chat() {
        let config = NotifierConfig::new("the-token").unwrap().with_content("build $BUILD_NUMBER broke");
        let api = RecordingApi::default();
        let (mut listener, _log) = BuildListener::buffered();

        FlowdockNotifier::new(config).perform(&build(Outcome::Failure), &api, &mut listener);

        assert_eq!(api.chat.lock().unwrap()[0].content, "build 42 broke");
    }

    #[test]
    fn test_fixed_build_sends_chat() {
        let api = RecordingApi::default();
        let (mut listener, _log) = BuildListener::buffered();

        notifier().perform(&build(Outcome::Success).with_previous(Outcome::Failure), &api, &mut listener);

        assert_eq!(api.pushes(), vec!["team_inbox", "chat"]);
        assert!(api.chat.lock().unwrap()[0].content.contains("**was fixed**"));
    }

    #[test]
    fn test_chat_disabled() {
        let config = NotifierConfig::new("the-token").unwrap().with_chat_notification(false);
        let api = RecordingApi::default();
        let (mut listener, _log) = BuildListener::buffered();

        FlowdockNotifier::new(config).perform(&build(Outcome::Failure), &api, &mut listener);

        assert_eq!(api.pushes(), vec!["team_inbox"]);
    }

    #[test]
    fn test_disabled_category_skips_everything() {
        let config = NotifierConfig::new("the-token").unwrap().with_notify(Category::Unstable, false);
        let api = RecordingApi::default();
        let (mut listener, log) = BuildListener::buffered();

        assert!(FlowdockNotifier::new(config).perform(&build(Outcome::Unstable), &api, &mut listener));

        assert!(api.pushes().is_empty());
        assert_eq!(
            log.lines(),
            vec!["No Flowdock notification configured for build status: UNSTABLE"]
        );
    }

    #[test]
    fn test_team_inbox_failure_skips_chat_and_logs() {
        let api = RecordingApi::failing();
        let (mut listener, log) = BuildListener::buffered();

        assert!(notifier().perform(&build(Outcome::Failure), &api, &mut listener));

        assert_eq!(api.pushes(), vec!["team_inbox"]);
        let lines = log.lines();
        assert_eq!(lines[0], "Flowdock: failed to send notification");
        assert!(lines[1].starts_with("Flowdock: "));
        assert!(lines[1].contains("500"));
    }

    #[test]
    fn test_chat_failure_after_team_inbox_logged() {
        let api = RecordingApi::failing_chat();
        let (mut listener, log) = BuildListener::buffered();

        assert!(notifier().perform(&build(Outcome::Failure), &api, &mut listener));

        assert_eq!(api.pushes(), vec!["team_inbox", "chat"]);
        let lines = log.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Flowdock: Team Inbox notification sent successfully");
        assert_eq!(lines[1], "Flowdock: failed to send notification");
        assert!(lines[2].contains("503"));
    }

    #[test]
    fn test_environment_failure_logged() {
        let api = RecordingApi::default();
        let (mut listener, log) = BuildListener::buffered();

        assert!(notifier().perform(&BrokenEnvBuild(build(Outcome::Failure)), &api, &mut listener));

        assert!(api.pushes().is_empty());
        assert_eq!(
            log.lines(),
            vec!["Flowdock: failed to get variables from build", "Flowdock: interrupted"]
        );
    }

    #[test]
    fn test_should_send_chat_rules() {
        let n = notifier();
        assert!(!n.should_send_chat(Outcome::Success, Category::Success));
        assert!(n.should_send_chat(Outcome::Success, Category::Fixed));
        assert!(n.should_send_chat(Outcome::Unstable, Category::Unstable));
        assert!(n.should_send_chat(Outcome::Aborted, Category::Aborted));
        assert!(n.should_send_chat(Outcome::NotBuilt, Category::NotBuilt));
    }
}
