//! Credential management CLI commands: set, show.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Password;

use aladin_core::secret::{SecretStore, SecretStoreDyn};
use aladin_infra::secret::{EnvSecretStore, KeychainSecretStore};
use aladin_types::secret::Redacted;

use crate::state::AppState;

fn provider_id(state: &AppState, provider: Option<&str>) -> String {
    provider
        .map(str::to_string)
        .unwrap_or_else(|| state.orchestrator.config().credential_ref)
}

/// Store a credential with hidden input prompt.
///
/// # Examples
///
/// ```bash
/// # Secure prompt (recommended)
/// aladin secret set --provider openai
///
/// # Script/automation mode
/// aladin secret set --provider openai --value sk-...
/// ```
pub async fn set_secret(
    state: &AppState,
    provider: Option<&str>,
    value: Option<&str>,
    json: bool,
) -> Result<()> {
    let id = provider_id(state, provider);
    let secret = match value {
        Some(v) => Redacted::new(v),
        None => Redacted::new(
            Password::new()
                .with_prompt(format!("Enter API key for {}", style(&id).bold()))
                .interact()?,
        ),
    };

    if secret.is_blank() {
        anyhow::bail!("refusing to store an empty credential");
    }

    state.context.secrets().set_boxed(&id, &secret).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"set": true, "provider": id, "masked": secret.masked()})
        );
    } else {
        println!(
            "  {} Credential for '{}' stored ({})",
            style("✓").green().bold(),
            style(&id).bold(),
            secret.masked()
        );
    }

    Ok(())
}

/// Show where a credential resolves from, masked.
pub async fn show_secret(state: &AppState, provider: Option<&str>, json: bool) -> Result<()> {
    let id = provider_id(state, provider);

    let env = EnvSecretStore::new().get(&id).await.ok().flatten();
    let keychain = KeychainSecretStore::new().get(&id).await;
    let resolved = state.context.secrets().get_boxed(&id).await?;

    if json {
        let out = serde_json::json!({
            "provider": id,
            "env": env.as_ref().map(Redacted::masked),
            "keychain": keychain.as_ref().ok().and_then(|s| s.as_ref().map(Redacted::masked)),
            "resolved": resolved.as_ref().map(Redacted::masked),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["SOURCE", "VALUE"]);

    let vars = EnvSecretStore::candidate_vars(&id).join(", ");
    table.add_row(vec![
        Cell::new(format!("env ({vars})")),
        masked_cell(env.as_ref()),
    ]);
    match &keychain {
        Ok(secret) => table.add_row(vec![Cell::new("keychain"), masked_cell(secret.as_ref())]),
        Err(e) => table.add_row(vec![
            Cell::new("keychain"),
            Cell::new(e.to_string()).fg(Color::Red),
        ]),
    };

    println!("{table}");

    if resolved.is_none() {
        println!(
            "  {} No credential for '{}'. Add one with: {}",
            style("i").blue().bold(),
            id,
            style(format!("aladin secret set --provider {id}")).yellow()
        );
    }

    Ok(())
}

fn masked_cell(secret: Option<&Redacted>) -> Cell {
    match secret {
        Some(s) => Cell::new(s.masked()).fg(Color::Green),
        None => Cell::new("-").fg(Color::DarkGrey),
    }
}
