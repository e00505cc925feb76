//! Daily usage commands.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::state::AppState;

/// Display today's token usage.
pub async fn show_usage(state: &AppState, json: bool) -> Result<()> {
    let stats = state.orchestrator.usage_statistics();
    let approaching = state.orchestrator.is_approaching_limit();
    let remaining = state.context.governor().snapshot().remaining();

    if json {
        let mut out = serde_json::to_value(&stats)?;
        out["approaching_limit"] = serde_json::Value::Bool(approaching);
        out["remaining"] = serde_json::Value::from(remaining);
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let used_color = if stats.tokens_used_today >= stats.daily_limit {
        Color::Red
    } else if approaching {
        Color::Yellow
    } else {
        Color::Green
    };

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Tokens used"),
        Cell::new(stats.tokens_used_today).fg(used_color),
    ]);
    table.add_row(vec![Cell::new("Daily limit"), Cell::new(stats.daily_limit)]);
    table.add_row(vec![Cell::new("Remaining"), Cell::new(remaining)]);
    table.add_row(vec![
        Cell::new("Used"),
        Cell::new(format!("{:.1}%", stats.percent_used)).fg(used_color),
    ]);
    table.add_row(vec![
        Cell::new("Requests"),
        Cell::new(stats.total_requests),
    ]);
    table.add_row(vec![
        Cell::new("Failed"),
        Cell::new(stats.failed_requests).fg(if stats.failed_requests > 0 {
            Color::Red
        } else {
            Color::Reset
        }),
    ]);
    table.add_row(vec![
        Cell::new("Day"),
        Cell::new(stats.last_reset_date),
    ]);

    println!("{table}");
    Ok(())
}

/// Zero today's token count and persist it.
pub async fn reset_usage(state: &AppState, json: bool) -> Result<()> {
    state.context.governor().reset();
    state.save_usage().await?;

    if json {
        println!("{}", serde_json::json!({ "reset": true }));
    } else {
        println!("{} Usage reset", style("✓").green().bold());
    }
    Ok(())
}
