use anyhow::{Result, anyhow};
use console::style;

use super::{DEFAULT_API_HOST, DEFAULT_API_PORT, OAuthArgs};
use crate::core::autofill::oauth;
use crate::core::config::AppConfig;
use crate::core::terminal::{GuideSection, print_link, print_success, print_warn};
use crate::interfaces::web::handlers::oauth::CALLBACK_PATH;

fn default_redirect_uri() -> String {
    format!(
        "http://{}:{}{}",
        DEFAULT_API_HOST, DEFAULT_API_PORT, CALLBACK_PATH
    )
}

pub async fn run_oauth_command(config: &AppConfig, args: OAuthArgs) -> Result<()> {
    let client_id = config.autofill.client_id.trim();
    if client_id.is_empty() {
        return Err(anyhow!(
            "CANVA_CLIENT_ID is not set. Create an integration in the Canva developer portal first."
        ));
    }
    let redirect_uri = args.redirect_uri.unwrap_or_else(default_redirect_uri);

    match args.code {
        Some(code) => exchange(config, &code, &redirect_uri).await,
        None => {
            let state = oauth::generate_state();
            let url = oauth::build_auth_url(client_id, &redirect_uri, &state);

            GuideSection::new("Canva authorization")
                .text("Open the link below and approve access. With `cardsmith serve`")
                .text("running, the redirect page shows the code to paste back here.")
                .blank()
                .status("Redirect URI", &redirect_uri)
                .status("State", &state)
                .print();
            println!();
            print_link("Authorize", &url);
            println!();

            if args.open_browser && open::that(&url).is_err() {
                print_warn("Could not open a browser. Copy the link above instead.");
            }

            GuideSection::new("Next")
                .hint(&format!(
                    "cardsmith oauth --code <code> --redirect-uri {}",
                    redirect_uri
                ))
                .print();
            println!();
            Ok(())
        }
    }
}

async fn exchange(config: &AppConfig, code: &str, redirect_uri: &str) -> Result<()> {
    let client_secret = config.autofill.client_secret.trim();
    if client_secret.is_empty() {
        return Err(anyhow!("CANVA_CLIENT_SECRET is required to exchange a code."));
    }

    let token = oauth::exchange_code(
        &config.endpoints.autofill_base,
        &config.autofill.client_id,
        client_secret,
        code,
        redirect_uri,
    )
    .await?;

    print_success("Token exchange succeeded.");
    let mut section = GuideSection::new("Tokens").status(
        "CANVA_ACCESS_TOKEN",
        &format!("{}", style(token.access_token.as_deref().unwrap_or_default()).green()),
    );
    if let Some(refresh) = token.refresh_token.as_deref() {
        section = section.status("Refresh token", refresh);
    }
    if let Some(expires_in) = token.expires_in {
        section = section.status("Expires in", &format!("{}s", expires_in));
    }
    section
        .blank()
        .text("Export CANVA_ACCESS_TOKEN before starting the server to enable real autofill.")
        .print();
    println!();
    Ok(())
}
