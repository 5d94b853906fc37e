//! Runs the `cardsmith` binary's one-shot commands with a temporary data
//! directory and local mock upstreams.


use axum::{Form, Json, Router, routing::post};
use e2e_harness::{
    AI_RISING_JSON, GeminiReply, MockGeminiServer, TestResult, cardsmith_command, is_bind_denied,
};
use std::collections::HashMap;
use tokio::sync::oneshot;

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn help_lists_commands() -> TestResult<()> {
    let tmp = tempfile::tempdir()?;
    let output = cardsmith_command(tmp.path(), &[])?.arg("help").output()?;
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    for command in ["serve", "generate", "history", "oauth", "doctor"] {
        assert!(stdout.contains(command), "help is missing {}", command);
    }
    Ok(())
}

#[test]
fn generate_without_input_fails() -> TestResult<()> {
    let tmp = tempfile::tempdir()?;
    let output = cardsmith_command(tmp.path(), &[])?.arg("generate").output()?;
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("--text"));
    Ok(())
}

#[test]
fn generate_rejects_short_article() -> TestResult<()> {
    let tmp = tempfile::tempdir()?;
    let output = cardsmith_command(tmp.path(), &[])?
        .args(["generate", "--text", "short"])
        .output()?;
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("at least 20 characters"));
    Ok(())
}

#[test]
fn generate_without_ai_key_prints_fallback_design() -> TestResult<()> {
    let tmp = tempfile::tempdir()?;
    let output = cardsmith_command(tmp.path(), &[])?
        .args([
            "generate",
            "--text",
            "Artificial intelligence is reshaping the design industry.",
        ])
        .output()?;
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let design: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;
    assert_eq!(design["success"], false);
    assert_eq!(design["errorCode"], "AI_ERROR");
    assert_eq!(design["title"], "The Future of AI Design");
    assert!(!tmp.path().join("design-history.json").exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn generate_from_file_records_history() -> TestResult<()> {
    let gemini = match MockGeminiServer::start(GeminiReply::Text(AI_RISING_JSON.to_string())).await
    {
        Ok(server) => server,
        Err(err) if is_bind_denied(err.as_ref()) => {
            eprintln!("Skipping CLI test: socket bind not permitted");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let tmp = tempfile::tempdir()?;
    let article = tmp.path().join("article.txt");
    std::fs::write(
        &article,
        "Artificial intelligence is transforming how teams write and design.",
    )?;
    let env = [
        ("GOOGLE_AI_API_KEY", "test-key".to_string()),
        ("CARDSMITH_AI_BASE_URL", gemini.base_url()),
    ];

    let output = cardsmith_command(tmp.path(), &env)?
        .arg("generate")
        .arg("--file")
        .arg(&article)
        .output()?;
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let design: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;
    assert_eq!(design["title"], "AI Rising");

    let history = cardsmith_command(tmp.path(), &env)?.arg("history").output()?;
    assert!(history.status.success());
    assert!(stdout_of(&history).contains("AI Rising"));

    gemini.shutdown().await;
    Ok(())
}

#[test]
fn history_is_empty_on_fresh_data_dir() -> TestResult<()> {
    let tmp = tempfile::tempdir()?;
    let output = cardsmith_command(tmp.path(), &[])?.arg("history").output()?;
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("No designs yet"));
    Ok(())
}

#[test]
fn doctor_reports_simulated_autofill() -> TestResult<()> {
    let tmp = tempfile::tempdir()?;
    let output = cardsmith_command(tmp.path(), &[])?.arg("doctor").output()?;
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("GOOGLE_AI_API_KEY is missing"));
    assert!(stdout.contains("autofill is simulated"));
    Ok(())
}

#[test]
fn oauth_prints_authorization_url() -> TestResult<()> {
    let tmp = tempfile::tempdir()?;
    let output = cardsmith_command(tmp.path(), &[("CANVA_CLIENT_ID", "client-xyz".to_string())])?
        .arg("oauth")
        .output()?;
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("https://www.canva.com/api/oauth/authorize"));
    assert!(stdout.contains("client_id=client-xyz"));
    Ok(())
}

#[test]
fn oauth_requires_client_id() -> TestResult<()> {
    let tmp = tempfile::tempdir()?;
    let output = cardsmith_command(tmp.path(), &[])?.arg("oauth").output()?;
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("CANVA_CLIENT_ID"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn oauth_exchanges_code_for_tokens() -> TestResult<()> {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) if err.to_string().contains("Operation not permitted") => {
            eprintln!("Skipping CLI test: socket bind not permitted");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    let port = listener.local_addr()?.port();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let app = Router::new().route(
            "/rest/v1/oauth/token",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                if form.get("code").map(String::as_str) == Some("mock-auth-code") {
                    Json(serde_json::json!({
                        "access_token": "e2e-mock-access-token",
                        "refresh_token": "e2e-mock-refresh-token",
                        "expires_in": 14400,
                        "token_type": "Bearer"
                    }))
                } else {
                    Json(serde_json::json!({ "error": "invalid_grant" }))
                }
            }),
        );
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    let tmp = tempfile::tempdir()?;
    let output = cardsmith_command(
        tmp.path(),
        &[
            ("CANVA_CLIENT_ID", "client-xyz".to_string()),
            ("CANVA_CLIENT_SECRET", "secret-xyz".to_string()),
            (
                "CARDSMITH_AUTOFILL_BASE_URL",
                format!("http://127.0.0.1:{}/rest/v1", port),
            ),
        ],
    )?
    .args(["oauth", "--code", "mock-auth-code"])
    .output()?;

    let _ = shutdown_tx.send(());
    let _ = server.await;

    assert!(
        output.status.success(),
        "oauth exchange failed. stdout: {} stderr: {}",
        stdout_of(&output),
        stderr_of(&output)
    );
    let stdout = stdout_of(&output);
    assert!(stdout.contains("e2e-mock-access-token"));
    assert!(stdout.contains("CANVA_ACCESS_TOKEN"));
    Ok(())
}
