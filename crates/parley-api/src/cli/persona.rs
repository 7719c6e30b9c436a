//! Persona catalogue command.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};

use parley_types::persona::Persona;

/// Print the preset bot roles that can be added to a group.
pub fn list_personas(json: bool) -> Result<()> {
    let catalogue = Persona::catalogue();

    if json {
        println!("{}", serde_json::to_string_pretty(&catalogue)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Persona").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Personality").fg(Color::White),
        Cell::new("Tends to").fg(Color::White),
    ]);

    for profile in &catalogue {
        table.add_row(vec![
            Cell::new(profile.persona.as_str()).fg(Color::Cyan),
            Cell::new(&profile.name),
            Cell::new(&profile.personality),
            Cell::new(&profile.response_tendency).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    Ok(())
}
