mod doctor;
mod generate;
mod history;
mod oauth;
mod serve;

use std::path::PathBuf;

use anyhow::Result;
use console::style;

use crate::core::config::AppConfig;
use crate::core::terminal::{self, GuideSection, print_error};

pub(crate) const DEFAULT_API_HOST: &str = "127.0.0.1";
pub(crate) const DEFAULT_API_PORT: u16 = 17900;

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Core")
        .command("serve", "Start the HTTP API and bundled web page (default)")
        .command("generate", "Turn one article into a design and print it as JSON")
        .command("history", "Show the most recent designs")
        .print();

    GuideSection::new("Setup")
        .command("oauth", "Get a Canva access token for real autofill")
        .command("doctor", "Show which integrations are live or simulated")
        .print();

    GuideSection::new("Examples")
        .hint("cardsmith serve --api-port 8080")
        .hint("cardsmith generate --file article.txt --template BT-123")
        .hint("cardsmith oauth --open-browser")
        .print();

    println!(
        "\n {} {} <command> [flags]\n",
        style("Usage:").bold(),
        style("cardsmith").green()
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServeArgs {
    pub api_host: String,
    pub api_port: u16,
    pub verbose: bool,
}

pub(crate) fn parse_serve_flags(args: &[String], start: usize) -> ServeArgs {
    let mut parsed = ServeArgs {
        api_host: DEFAULT_API_HOST.to_string(),
        api_port: DEFAULT_API_PORT,
        verbose: false,
    };
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--api-port" => {
                if i + 1 < args.len() {
                    parsed.api_port = args[i + 1].parse().unwrap_or(DEFAULT_API_PORT);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--api-host" => {
                if i + 1 < args.len() {
                    parsed.api_host = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                parsed.verbose = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    parsed
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct GenerateArgs {
    pub text: Option<String>,
    pub file: Option<PathBuf>,
    pub template: Option<String>,
}

pub(crate) fn parse_generate_args(args: &[String], start: usize) -> GenerateArgs {
    let mut parsed = GenerateArgs::default();
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--text" | "-t" => {
                if i + 1 < args.len() {
                    parsed.text = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--file" | "-f" => {
                if i + 1 < args.len() {
                    parsed.file = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--template" => {
                if i + 1 < args.len() {
                    parsed.template = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    parsed
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct OAuthArgs {
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub open_browser: bool,
}

pub(crate) fn parse_oauth_args(args: &[String], start: usize) -> OAuthArgs {
    let mut parsed = OAuthArgs::default();
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--code" => {
                if i + 1 < args.len() {
                    parsed.code = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--redirect-uri" => {
                if i + 1 < args.len() {
                    parsed.redirect_uri = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--open-browser" => {
                parsed.open_browser = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    parsed
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = AppConfig::from_env();

    let cmd = args.get(1).map(String::as_str).unwrap_or("serve");
    match cmd {
        "serve" => serve::run_server(&config, parse_serve_flags(&args, 2)).await,
        // `cardsmith --api-port 8080` serves too.
        flag if flag.starts_with("--") && flag != "--help" => {
            serve::run_server(&config, parse_serve_flags(&args, 1)).await
        }
        "generate" => generate::run_generate(&config, parse_generate_args(&args, 2)).await,
        "history" => history::print_history(&config).await,
        "oauth" => oauth::run_oauth_command(&config, parse_oauth_args(&args, 2)).await,
        "doctor" => doctor::run_doctor(&config).await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            print_error(&format!("Unknown command: {}", cmd));
            print_help();
            Ok(())
        }
    }
}
