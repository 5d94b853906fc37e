use anyhow::Result;

use crate::core::autofill::AutofillGateway;
use crate::core::config::AppConfig;
use crate::core::history::HistoryStore;
use crate::core::image::{BackgroundResolver, Strategy};
use crate::core::terminal::{print_info, print_step, print_success, print_warn};

/// Reports which integrations will run for real and which are simulated.
pub async fn run_doctor(config: &AppConfig) -> Result<()> {
    print_step("Checking cardsmith configuration...");
    println!();

    match config.ai_api_key {
        Some(_) => print_success(&format!(
            "Google AI key is set (model: {}).",
            config.ai_model
        )),
        None => print_warn(
            "GOOGLE_AI_API_KEY is missing. Every generation will return the fallback design.",
        ),
    }

    match BackgroundResolver::from_config(config).strategy() {
        Strategy::Generated => print_success("Backgrounds: generated (OPENAI_API_KEY is set)."),
        Strategy::Placeholder => print_info("Backgrounds: keyword placeholder images."),
        Strategy::StockInline => print_info("Backgrounds: stock photos inlined as data URIs."),
    }

    match AutofillGateway::from_config(config).check_preconditions(None) {
        Ok(template_id) => print_success(&format!(
            "Canva autofill is live (brand template {}).",
            template_id
        )),
        Err(reason) => {
            print_warn(&format!("Canva autofill is simulated: {}", reason));
            print_info("Run 'cardsmith oauth' to obtain an access token.");
        }
    }

    let store = HistoryStore::new(&config.data_dir);
    let history = store.load().await;
    print_info(&format!(
        "History: {} design(s) in {}",
        history.len(),
        store.path().display()
    ));
    println!();
    Ok(())
}
