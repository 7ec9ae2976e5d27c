//! Flowdock Notifier CLI
//!
//! 在 CI 构建结束后把结果推送到 Flowdock

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use flowdock_notifier::{
    classify, BuildListener, BuildRecord, EnvVars, FlowdockNotifier, GlobalSettings, NotifierConfig, Outcome,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "flowdock-notify")]
#[command(about = "Flowdock Notifier - 推送 CI 构建结果到 Flowdock")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 根据构建记录发送通知
    Notify {
        /// 构建记录 JSON 文件
        #[arg(long)]
        build: PathBuf,
        /// 通知器配置 JSON 文件
        #[arg(long)]
        config: Option<PathBuf>,
        /// Flow token（覆盖配置文件）
        #[arg(long)]
        token: Option<String>,
        /// 通知标签，支持 $VAR 展开（覆盖配置文件）
        #[arg(long)]
        tags: Option<String>,
        /// 不发送聊天消息
        #[arg(long)]
        no_chat: bool,
        /// Flowdock API 地址（覆盖全局配置）
        #[arg(long)]
        api_url: Option<String>,
        /// 合并当前进程的环境变量（构建记录中的同名变量优先）
        #[arg(long)]
        inherit_env: bool,
    },
    /// 发送测试消息，检查 token 是否可用
    TestConnection {
        /// Flow token
        #[arg(long)]
        token: String,
        /// 通知标签
        #[arg(long, default_value = "")]
        tags: String,
        /// Flowdock API 地址（覆盖全局配置）
        #[arg(long)]
        api_url: Option<String>,
    },
    /// 输出构建结果对应的通知分类
    Classify {
        /// 本次构建结果
        current: Outcome,
        /// 上一次构建结果
        previous: Option<Outcome>,
    },
}

fn load_notifier_config(
    config: Option<PathBuf>,
    token: Option<String>,
    tags: Option<String>,
    no_chat: bool,
) -> Result<NotifierConfig> {
    let mut notifier_config = match (config, token.as_deref()) {
        (Some(path), _) => NotifierConfig::load(&path)?,
        (None, Some(token)) => NotifierConfig::new(token)?,
        (None, None) => return Err(anyhow!("either --config or --token is required")),
    };

    if let Some(token) = token {
        notifier_config = notifier_config.with_flow_token(token)?;
    }
    if let Some(tags) = tags {
        notifier_config = notifier_config.with_tags(tags);
    }
    if no_chat {
        notifier_config = notifier_config.with_chat_notification(false);
    }
    Ok(notifier_config)
}

fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("flowdock_notifier=info,flowdock_notify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Notify {
            build,
            config,
            token,
            tags,
            no_chat,
            api_url,
            inherit_env,
        } => {
            let notifier_config = load_notifier_config(config, token, tags, no_chat)?;

            let mut record = BuildRecord::load(&build)?;
            if inherit_env {
                let mut env = EnvVars::from_process();
                env.merge(&record.environment);
                record.environment = env;
            }

            let settings = GlobalSettings::load();
            if let Some(url) = api_url {
                settings.configure(&url);
            }

            let mut listener = BuildListener::stdout();
            FlowdockNotifier::new(notifier_config).perform_with_api_url(&settings.api_url(), &record, &mut listener);
        }
        Commands::TestConnection { token, tags, api_url } => {
            let settings = GlobalSettings::load();
            if let Some(url) = api_url {
                settings.configure(&url);
            }
            match settings.test_connection(&token, &tags) {
                Ok(message) => println!("{}", message),
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Classify { current, previous } => {
            println!("{}", classify(current, previous.unwrap_or(Outcome::None)));
        }
    }

    Ok(())
}
