use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 預設過濾條件。優先順序：RUST_LOG、`--verbose`、設定檔的 log_level
fn cli_directives(verbose: bool, log_level: Option<&str>) -> String {
    match (verbose, log_level) {
        (true, _) => "protection_bridge=debug,audit=info,info".to_string(),
        (false, Some(level)) => format!("protection_bridge={},audit=warn", level),
        (false, None) => "protection_bridge=info,audit=warn".to_string(),
    }
}

pub fn init_cli_logger(verbose: bool, log_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli_directives(verbose, log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// 部署在服務中時使用 JSON 格式，方便集中收集稽核事件
pub fn init_service_logger() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("protection_bridge=info,audit=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}
