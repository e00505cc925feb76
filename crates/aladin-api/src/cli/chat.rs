//! Single-shot chat command.

use std::future::Future;

use anyhow::Result;
use console::style;
use tokio_util::sync::CancellationToken;

use aladin_types::llm::ChatResult;

use crate::state::AppState;

/// Send `message` and print the reply. Ctrl-C cancels the request; a
/// Ctrl-C while usage is being saved aborts the command.
///
/// Returns `true` when the send succeeded, so the caller can pick an exit
/// code.
pub async fn chat(state: &AppState, message: &str, json: bool) -> Result<bool> {
    let cancel = CancellationToken::new();
    let result = until_interrupted(
        state.orchestrator.send_cancellable(message, &cancel),
        &cancel,
        ctrl_c(),
    )
    .await;

    save_unless_interrupted(state.save_usage(), ctrl_c()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(result.is_success());
    }

    match &result {
        ChatResult::Success {
            text,
            actual_tokens,
            over_budget,
        } => {
            println!("{text}");
            eprintln!();
            eprintln!("{}", style(format!("{actual_tokens} tokens")).dim());
            if *over_budget {
                eprintln!(
                    "{} Daily token limit reached. Further messages will be refused until midnight.",
                    style("!").yellow().bold()
                );
            } else if state.orchestrator.is_approaching_limit() {
                let stats = state.orchestrator.usage_statistics();
                eprintln!(
                    "{} {:.0}% of today's {} tokens used.",
                    style("!").yellow().bold(),
                    stats.percent_used,
                    stats.daily_limit
                );
            }
        }
        ChatResult::Failure { kind, detail } => {
            eprintln!("{} {detail}", style("✗").red().bold());
            tracing::debug!(%kind, "chat failed");
        }
    }

    Ok(result.is_success())
}

/// Resolves on Ctrl-C. Never resolves if the signal cannot be watched.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::debug!("cannot watch for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Drive `send` to completion. If `interrupt` fires first, trip `cancel`
/// and let `send` finish with its cancelled result.
async fn until_interrupted<T>(
    send: impl Future<Output = T>,
    cancel: &CancellationToken,
    interrupt: impl Future<Output = ()>,
) -> T {
    tokio::pin!(send);
    tokio::select! {
        biased;
        output = &mut send => output,
        () = interrupt => {
            tracing::info!("interrupt received, cancelling request");
            cancel.cancel();
            send.await
        }
    }
}

/// Save usage unless `interrupt` fires first. A failed save is only logged.
async fn save_unless_interrupted(
    save: impl Future<Output = Result<()>>,
    interrupt: impl Future<Output = ()>,
) -> Result<()> {
    tokio::select! {
        biased;
        saved = save => {
            if let Err(e) = saved {
                tracing::warn!("Failed to save usage: {e}");
            }
            Ok(())
        }
        () = interrupt => anyhow::bail!("interrupted while saving usage"),
    }
}
