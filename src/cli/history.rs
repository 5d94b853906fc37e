use anyhow::Result;
use console::style;

use crate::core::config::AppConfig;
use crate::core::history::HistoryStore;
use crate::core::terminal::{GuideSection, print_info};

pub async fn print_history(config: &AppConfig) -> Result<()> {
    let store = HistoryStore::new(&config.data_dir);
    let history = store.load().await;
    if history.is_empty() {
        print_info("No designs yet. Run 'cardsmith generate' or use the web page.");
        return Ok(());
    }

    for entry in history.entries() {
        let design = &entry.design;
        GuideSection::new(&design.title)
            .status("When", &entry.timestamp)
            .status("Quote", &design.quote)
            .status("Hashtags", &design.hashtags)
            .status(
                "Design",
                &format!(
                    "{}",
                    style(design.canva_url.as_deref().unwrap_or("-")).underlined().cyan()
                ),
            )
            .print();
    }
    println!(
        "\n {} {}\n",
        style(history.len()).bold(),
        style(format!("stored in {}", store.path().display())).dim()
    );
    Ok(())
}
