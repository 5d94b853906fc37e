use anyhow::{Context, Result, anyhow};
use console::style;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use super::GenerateArgs;
use crate::core::config::AppConfig;
use crate::core::error::PipelineError;
use crate::core::history::HistoryStore;
use crate::core::pipeline::{GenerationRequest, GenerationResult, Pipeline};
use crate::core::terminal::{SUCCESS_ICON, WARN_ICON};

/// Logs go to stderr so stdout carries only the JSON payload.
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

async fn article_text(args: &GenerateArgs) -> Result<String> {
    match (&args.text, &args.file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        (None, None) => Err(anyhow!("Provide the article with --text <text> or --file <path>.")),
    }
}

pub async fn run_generate(config: &AppConfig, args: GenerateArgs) -> Result<()> {
    init_logging();
    let request = GenerationRequest {
        template_id: args.template.clone(),
        ..GenerationRequest::new(article_text(&args).await?)
    };

    let pipeline = Pipeline::from_config(config);
    let result = match pipeline.run(&request).await {
        Ok(result) => {
            let store = HistoryStore::new(&config.data_dir);
            match store.record(result.clone()).await {
                Ok(entry) => eprintln!(
                    "{} {}",
                    SUCCESS_ICON,
                    style(format!("Saved to history as {}", entry.id)).green()
                ),
                Err(e) => eprintln!(
                    "{} {}",
                    WARN_ICON,
                    style(format!("Could not save history: {:#}", e)).yellow()
                ),
            }
            result
        }
        Err(PipelineError::Validation(message)) => return Err(anyhow!(message)),
        Err(e) => {
            eprintln!(
                "{} {}",
                WARN_ICON,
                style(format!("{} ({})", e, e.error_code())).yellow()
            );
            GenerationResult::fallback(&e)
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
