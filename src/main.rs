use anyhow::Context;
use clap::Parser;
use protection_bridge::core::Record;
use protection_bridge::utils::error::{BridgeError, ErrorCategory};
use protection_bridge::utils::{logger, validation::Validate};
use protection_bridge::{
    BridgeConfig, CliConfig, Command, HttpRegistrationConnector, ProtectionBridge, ProtectionService,
};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match &cli.config {
        Some(path) => BridgeConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => BridgeConfig::default(),
    };

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, config.log_level());
    tracing::debug!("CLI config: {:?}", cli);

    // 驗證配置
    if let Err(e) = config.validate() {
        fail(&e);
    }

    let input = read_input(cli.command.input()).context("failed to read input JSON")?;

    match run(&cli.command, &config, &input).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&serde_json::Value::Object(output))?);
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

async fn run(command: &Command, config: &BridgeConfig, input: &Record) -> protection_bridge::Result<Record> {
    let bridge = ProtectionBridge::new(Arc::new(config.vocabularies()?));

    match command {
        Command::Outbound { nino, .. } => bridge
            .transform_outbound_request(nino, input)
            .map_err(BridgeError::BadRequest),
        Command::Inbound { suffix, .. } => bridge
            .transform_inbound_response(*suffix, input)
            .map_err(BridgeError::MalformedResponse),
        Command::Submit {
            nino,
            protection_id,
            ..
        } => {
            let connector = HttpRegistrationConnector::from_config(config.registration()?);
            let service = ProtectionService::new(bridge, connector);
            match protection_id {
                Some(id) => service.amend(nino, *id, input).await,
                None => service.create(nino, input).await,
            }
        }
    }
}

fn read_input(path: Option<&PathBuf>) -> anyhow::Result<Record> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot open {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let value: serde_json::Value = serde_json::from_str(&content)?;
    match value {
        serde_json::Value::Object(record) => Ok(record),
        _ => anyhow::bail!("input must be a JSON object"),
    }
}

fn fail(e: &BridgeError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    if let Some(errors) = e.transform_errors() {
        for error in errors.iter() {
            eprintln!("   • {}", error);
        }
    }
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.category() {
        ErrorCategory::BadRequest => 2,
        ErrorCategory::Downstream => 3,
        ErrorCategory::Configuration => 4,
        ErrorCategory::System => 1,
    };
    std::process::exit(exit_code);
}
