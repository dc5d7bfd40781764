//! Integration tests for lyyti-cli.
//!
//! These run commands against a temporary SQLite store and a mock Lyyti API
//! to verify:
//! - Plugin lifecycle through the CLI
//! - Settings editing and display
//! - Shortcode rendering with counts cached across host restarts

use anyhow::Result;
use clap::Parser;
use lyyti_cli::build_app;
use lyyti_cli::cli::{App, Cli};
use lyyti_cli::config::Config;
use lyyti_cli::store::SqliteStore;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_at(db: &Path, base_url: &str) -> Result<App> {
    let mut config = Config::default();
    config.lyyti.api_base_url = base_url.to_string();
    config.host.store_path = Some(db.to_path_buf());

    let store = Arc::new(SqliteStore::open_at(&config.store_path()?)?);
    build_app(&config, store)
}

async fn run(app: &App, args: &[&str]) -> Result<String> {
    let cli = Cli::try_parse_from(std::iter::once("lyyti-cli").chain(args.iter().copied()))?;
    let mut out = Vec::new();
    app.run(cli.command, &mut out).await?;
    Ok(String::from_utf8(out)?)
}

#[tokio::test]
async fn test_activate_set_show_deactivate() -> Result<()> {
    let dir = TempDir::new()?;
    let app = app_at(&dir.path().join("store.db"), "http://127.0.0.1:1/v2/")?;

    run(&app, &["activate"]).await?;
    let shown = run(&app, &["settings", "show"]).await?;
    assert!(shown.contains("default_status_filter = \"reactedyes,show\""));
    assert!(shown.contains("cache_lifetime_seconds = \"600\""));
    assert!(shown.contains("api_private_key = \"\""));

    let saved = run(
        &app,
        &["settings", "set", "api_private_key=secret", "default_event_id=123"],
    )
    .await?;
    assert_eq!(saved, "Saved 2 setting(s)\n");

    let shown = run(&app, &["settings", "show"]).await?;
    assert!(shown.contains("api_private_key = \"********\""));
    assert!(shown.contains("default_event_id = \"123\""));
    assert!(!shown.contains("secret"));

    // Re-activating keeps edited values.
    run(&app, &["activate"]).await?;
    assert!(run(&app, &["settings", "show"]).await?.contains("default_event_id = \"123\""));

    run(&app, &["deactivate"]).await?;
    let shown = run(&app, &["settings", "show"]).await?;
    assert!(shown.contains("default_status_filter = \"\""));
    Ok(())
}

#[tokio::test]
async fn test_settings_page_output() -> Result<()> {
    let dir = TempDir::new()?;
    let app = app_at(&dir.path().join("store.db"), "http://127.0.0.1:1/v2/")?;

    run(&app, &["activate"]).await?;
    let html = run(&app, &["settings", "page"]).await?;
    assert!(html.contains("<h1>Lyyti Participant Counts Options</h1>"));
    assert!(html.contains("name=\"lyyti_cache_lifetime\" value=\"600\""));
    Ok(())
}

#[tokio::test]
async fn test_count_without_configuration() -> Result<()> {
    let dir = TempDir::new()?;
    let app = app_at(&dir.path().join("store.db"), "http://127.0.0.1:1/v2/")?;

    run(&app, &["activate"]).await?;
    assert_eq!(run(&app, &["count"]).await?, "ERROR_LYYTI_EID_UNDEFINED\n");
    assert_eq!(
        run(&app, &["count", "--eid", "1"]).await?,
        "ERROR_LYYTI_API_CREDENTIALS_MISSING\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_count_is_cached_across_restarts() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/events/123/participants"))
        .and(query_param("status", "show"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results_count": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let db = dir.path().join("store.db");
    let base_url = format!("{}/v2/", server.uri());

    {
        let app = app_at(&db, &base_url)?;
        run(&app, &["activate"]).await?;
        run(
            &app,
            &["settings", "set", "api_public_key=pub", "api_private_key=priv"],
        )
        .await?;
        let out = run(&app, &["count", "--eid", "123", "--status", "show"]).await?;
        assert_eq!(out, "42\n");
    }

    let app = app_at(&db, &base_url)?;
    let out = run(&app, &["count", "--eid", "123", "--status", "show"]).await?;
    assert_eq!(out, "42\n");
    Ok(())
}

#[tokio::test]
async fn test_render_file() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/events/7/participants"))
        .and(query_param("status", "reactedyes,show"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results_count": "15"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let app = app_at(&dir.path().join("store.db"), &format!("{}/v2/", server.uri()))?;
    run(&app, &["activate"]).await?;
    run(
        &app,
        &[
            "settings",
            "set",
            "api_public_key=pub",
            "api_private_key=priv",
            "default_event_id=7",
        ],
    )
    .await?;

    let page = dir.path().join("page.html");
    std::fs::write(
        &page,
        "<p>[lyyti-participant-count] going, [[lyyti-participant-count]] is the tag.</p>\n",
    )?;

    let out = run(&app, &["render", page.to_str().unwrap_or_default()]).await?;
    assert_eq!(out, "<p>15 going, [lyyti-participant-count] is the tag.</p>\n");
    Ok(())
}
