use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use portal_core::config::{AppConfig, Credentials};
use portal_core::init_logging;
use tracing::{error, info, warn};

use llm_portal::app::Application;
use llm_portal::shutdown::ShutdownManager;

/// 等待Worker停止之外，再给HTTP服务留出的收尾时间
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("llm-portal")
        .version(env!("CARGO_PKG_VERSION"))
        .about("LLM查询门户与Telegram聊天中继")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径，未指定时依次查找 config/portal.toml 与 portal.toml"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式，覆盖配置文件")
                .value_parser(["json", "pretty"]),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("ADDR")
                .help("HTTP监听地址，覆盖配置文件"),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(String::as_str);

    // .env 中的变量不覆盖已存在的环境变量
    let dotenv = dotenvy::dotenv();

    let mut config = AppConfig::load(config_path).context("加载配置失败")?;
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.observability.log_level = level.clone();
    }
    if let Some(format) = matches.get_one::<String>("log-format") {
        config.observability.log_format = format.clone();
    }
    if let Some(bind) = matches.get_one::<String>("bind") {
        config.server.bind_address = bind.clone();
    }

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    )?;

    info!("启动LLM门户");
    match dotenv {
        Ok(path) => info!("已加载环境文件: {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("加载 .env 失败: {}", e),
    }
    if let Some(path) = config_path {
        info!("配置文件: {path}");
    }

    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    if !credentials.has_completion_key() {
        warn!("未设置补全服务API密钥，LLM页面与聊天中继将不可用");
    }

    let stop_timeout = config.polling.stop_timeout();
    let app = Arc::new(Application::new(config, credentials)?);

    let shutdown_manager = ShutdownManager::new();
    let mut app_handle = {
        let app = Arc::clone(&app);
        let shutdown_rx = shutdown_manager.subscribe().await;
        tokio::spawn(async move { app.run(shutdown_rx).await })
    };

    tokio::select! {
        _ = shutdown_manager.listen_for_os_signals() => {
            info!("收到关闭信号，开始优雅关闭...");
        }
        finished = &mut app_handle => {
            return match finished {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    error!("应用运行失败: {e:#}");
                    Err(e)
                }
                Err(e) => Err(e).context("应用任务异常退出"),
            };
        }
    }

    match tokio::time::timeout(stop_timeout + SHUTDOWN_GRACE, app_handle).await {
        Ok(Ok(Ok(()))) => info!("应用已优雅关闭"),
        Ok(Ok(Err(e))) => error!("应用关闭时发生错误: {e:#}"),
        Ok(Err(e)) => error!("应用任务异常退出: {e}"),
        Err(_) => warn!("应用关闭超时，强制退出"),
    }

    info!("LLM门户已退出");
    Ok(())
}
