//! Configuration inspection command.

use anyhow::Result;
use console::style;

use aladin_infra::config::CONFIG_FILE;
use aladin_types::llm::ProviderFamily;

use crate::state::AppState;

/// Print the effective configuration.
pub async fn show_config(state: &AppState, json: bool) -> Result<()> {
    let config = &state.config;
    let provider = state.orchestrator.config();

    if json {
        let out = serde_json::json!({
            "data_dir": state.data_dir.display().to_string(),
            "config": config,
            "provider": {
                "family": provider.family.id(),
                "model": provider.model_name,
                "base_url": provider.effective_base_url(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style("Config:").dim(),
        state.data_dir.join(CONFIG_FILE).display()
    );
    println!();
    println!(
        "  Provider:    {}",
        style(provider.family.display_name()).bold()
    );
    if let Some(note) = unknown_family_note(&config.provider_family) {
        println!("               {}", style(note).yellow());
    }
    println!(
        "  Model:       {}",
        if provider.model_name.is_empty() {
            style("(provider default)".to_string()).dim()
        } else {
            style(provider.model_name.clone()).cyan()
        }
    );
    println!("  Endpoint:    {}", provider.effective_base_url());
    println!("  Daily limit: {} tokens", config.daily_token_limit);
    println!("  Concurrency: {}", config.max_concurrent_requests);
    println!();

    Ok(())
}

/// Warning shown when the configured family id does not parse.
fn unknown_family_note(provider_family: &str) -> Option<String> {
    if provider_family.parse::<ProviderFamily>().is_ok() {
        return None;
    }
    let known: Vec<&str> = ProviderFamily::ALL.iter().map(ProviderFamily::id).collect();
    Some(format!(
        "(unknown family '{provider_family}', expected one of: {})",
        known.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_family_has_no_note() {
        assert!(unknown_family_note("ollama").is_none());
    }

    #[test]
    fn test_unknown_family_lists_every_known_id() {
        let note = unknown_family_note("gemini").unwrap();
        assert!(note.contains("'gemini'"));
        for family in ProviderFamily::ALL {
            assert!(note.contains(family.id()));
        }
    }
}
