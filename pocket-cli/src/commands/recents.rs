//! Recents command - recently used transfer recipients

use anyhow::Result;

use pocket_core::PocketContext;

use crate::output::{create_table, info, success};

pub fn run(ctx: &PocketContext, clear: bool, json: bool) -> Result<()> {
    if clear {
        ctx.favorites.clear_recents();
        if json {
            println!("{}", serde_json::json!({"cleared": true}));
        } else {
            success("Recent recipients cleared");
        }
        return Ok(());
    }

    let recents = ctx.favorites.recents();
    if json {
        println!("{}", serde_json::to_string_pretty(&recents)?);
        return Ok(());
    }
    if recents.is_empty() {
        info("No recent recipients.");
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["Name", "Phone", "Last used"]);
    for contact in &recents {
        table.add_row(vec![
            contact.name.clone(),
            contact.phone.clone().unwrap_or_default(),
            contact.last_used_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}
