//! System status dashboard command.

use anyhow::Result;
use console::style;

use parley_types::config::DelayRange;

use crate::state::AppState;

fn format_delay(range: &DelayRange) -> String {
    let (min, max) = range.normalized();
    if min == max {
        format!("{min}ms")
    } else {
        format!("{min}-{max}ms")
    }
}

/// Display user count, reply tuning, and cache settings.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let users = state.user_service.list_users().await?;
    let orchestration = &state.config.orchestration;
    let cache = state.cache.stats();

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "users": users.len(),
            "orchestration": orchestration,
            "cache": cache,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Parley v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Users ──").dim());
    println!("  Registered: {}", style(users.len()).bold());
    println!();

    println!("  {}", style("── Replies ──").dim());
    println!("  Strategy:     {}", style(orchestration.strategy).cyan());
    println!("  Bot delay:    {}", format_delay(&orchestration.bot_delay_ms));
    println!("  Filler delay: {}", format_delay(&orchestration.filler_delay_ms));
    println!("  Direct delay: {}", format_delay(&orchestration.direct_delay_ms));
    println!("  Loop window:  {}", orchestration.loop_window);
    println!();

    println!("  {}", style("── Cache ──").dim());
    if cache.enabled {
        println!("  Capacity: {}", cache.max_size);
        println!("  TTL:      {} min", cache.ttl_minutes);
    } else {
        println!("  {}", style("disabled").yellow());
    }
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Database: {}", style("SQLite (WAL mode)").dim());
    println!();

    Ok(())
}
