//! Provider inspection commands: current model, model list, reachability
//! and credential validation.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use aladin_core::secret::SecretStoreDyn;
use aladin_types::secret::Redacted;

use crate::state::AppState;

/// Print the model the configured provider resolves to.
pub async fn current_model(state: &AppState, json: bool) -> Result<()> {
    let config = state.orchestrator.config();
    let model = state.orchestrator.current_model().await;

    if json {
        let out = serde_json::json!({
            "provider": config.family.id(),
            "model": model,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{} {}",
            style(config.family.display_name()).bold(),
            style(model).cyan()
        );
    }
    Ok(())
}

/// List the models the configured provider offers.
pub async fn list_models(state: &AppState, json: bool) -> Result<()> {
    let current = state.orchestrator.current_model().await;
    let models = state.orchestrator.available_models().await;

    if json {
        let out = serde_json::json!({
            "current": current,
            "models": models,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["", "MODEL"]);

    for model in &models {
        let marker = if *model == current {
            Cell::new("*").fg(Color::Green)
        } else {
            Cell::new("")
        };
        table.add_row(vec![marker, Cell::new(model)]);
    }

    println!("{table}");
    Ok(())
}

/// Check reachability of the configured provider.
///
/// Returns whether the provider answered.
pub async fn ping(state: &AppState, json: bool) -> Result<bool> {
    let config = state.orchestrator.config();
    let reachable = state.orchestrator.validate_connection().await;

    if json {
        let out = serde_json::json!({
            "provider": config.family.id(),
            "base_url": config.effective_base_url(),
            "reachable": reachable,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if reachable {
        println!(
            "{} {} is reachable at {}",
            style("✓").green().bold(),
            config.family.display_name(),
            style(config.effective_base_url()).cyan()
        );
    } else {
        eprintln!(
            "{} {} is not reachable at {}",
            style("✗").red().bold(),
            config.family.display_name(),
            style(config.effective_base_url()).cyan()
        );
        eprintln!("  {}", style(config.family.remediation_hint()).dim());
    }

    Ok(reachable)
}

/// Validate a credential against the configured provider.
///
/// Uses `key` when given, otherwise the stored credential.
pub async fn validate(state: &AppState, key: Option<&str>, json: bool) -> Result<bool> {
    let config = state.orchestrator.config();

    let secret = match key {
        Some(k) => Some(Redacted::new(k)),
        None => state
            .context
            .secrets()
            .get_boxed(&config.credential_ref)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to read credential: {e}");
                None
            }),
    };

    let result = state.validator.validate(&config, secret.as_ref()).await;

    if json {
        let out = serde_json::json!({
            "provider": config.family.id(),
            "valid": result.ok,
            "message": result.message,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if result.ok {
        println!("{} {}", style("✓").green().bold(), result.message);
    } else {
        eprintln!("{} {}", style("✗").red().bold(), result.message);
    }

    Ok(result.ok)
}
