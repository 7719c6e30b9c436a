//! User management commands: create, issue keys, list.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::state::AppState;

/// Create a user and print the initial API key (shown only once).
pub async fn create_user(state: &AppState, username: &str, json: bool) -> Result<()> {
    let (user, api_key) = state.user_service.create_user(username).await?;

    if json {
        let out = serde_json::json!({
            "id": user.id,
            "username": user.username,
            "api_key": api_key,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Created user {}",
        style("✓").green().bold(),
        style(&user.username).cyan()
    );
    print_key(&api_key);
    Ok(())
}

/// Issue another API key for an existing user.
pub async fn issue_key(state: &AppState, username: &str, name: &str, json: bool) -> Result<()> {
    let user = state.user_service.find_by_username(username).await?;
    let api_key = state.user_service.issue_key(&user, name).await?;

    if json {
        let out = serde_json::json!({
            "username": user.username,
            "name": name,
            "api_key": api_key,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_key(&api_key);
    Ok(())
}

fn print_key(api_key: &str) {
    println!();
    println!(
        "  {} API key (save this -- it won't be shown again):",
        style("🔑").bold()
    );
    println!();
    println!("  {}", style(api_key).yellow().bold());
    println!();
}

/// List all users.
pub async fn list_users(state: &AppState, json: bool) -> Result<()> {
    let users = state.user_service.list_users().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!();
        println!(
            "  {} No users yet. Create one with: {}",
            style("i").blue().bold(),
            style("parley user create <name>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Username").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for user in &users {
        table.add_row(vec![
            Cell::new(&user.username).fg(Color::Cyan),
            Cell::new(user.id).fg(Color::DarkGrey),
            Cell::new(user.created_at.format("%Y-%m-%d %H:%M")),
        ]);
    }

    println!("{table}");
    Ok(())
}
