use anyhow::Result;
use console::style;
use tokio::sync::broadcast;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use super::ServeArgs;
use crate::core::config::AppConfig;
use crate::core::terminal::{self, GuideSection};
use crate::interfaces::web::ApiServer;
use crate::logging::{BroadcastMakeWriter, LOG_CHANNEL_CAPACITY};

fn init_logging(verbose: bool) -> broadcast::Sender<String> {
    let (log_tx, _) = broadcast::channel::<String>(LOG_CHANNEL_CAPACITY);
    let make_writer = BroadcastMakeWriter {
        sender: log_tx.clone(),
        echo_stdout: true,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_ansi(false)
        .with_writer(make_writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
    log_tx
}

pub async fn run_server(config: &AppConfig, args: ServeArgs) -> Result<()> {
    let log_tx = init_logging(args.verbose);

    terminal::print_banner();
    let url = format!("http://{}:{}", args.api_host, args.api_port);
    GuideSection::new("Server")
        .status("Web page", &format!("{}", style(&url).underlined().cyan()))
        .status("Generate", &format!("POST {}/api/generate", url))
        .status("Model", &config.ai_model)
        .blank()
        .text(&format!(
            "Press {} to stop the server.",
            style("Ctrl+C").bold().yellow()
        ))
        .print();
    println!();

    info!(
        model = %config.ai_model,
        ai_configured = config.ai_api_key.is_some(),
        data_dir = %config.data_dir.display(),
        "Starting cardsmith server"
    );

    ApiServer::new(config, log_tx, args.api_host, args.api_port)
        .run()
        .await?;
    terminal::print_goodbye();
    Ok(())
}
