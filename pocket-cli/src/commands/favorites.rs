//! Favorites command - manage favorite contacts

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use pocket_core::services::MAX_FAVORITES;
use pocket_core::{ContactInput, PocketContext};

use super::user_error;
use crate::output::{create_table, info, success, warning};

#[derive(Subcommand)]
pub enum FavoritesCommands {
    /// Add a favorite contact
    Add {
        /// Display name
        name: String,
        /// Phone number
        #[arg(long)]
        phone: Option<String>,
        /// IBAN
        #[arg(long)]
        iban: Option<String>,
    },
    /// Remove a favorite by id
    Remove {
        id: String,
    },
    /// List favorite contacts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(ctx: &PocketContext, command: FavoritesCommands) -> Result<()> {
    match command {
        FavoritesCommands::Add { name, phone, iban } => {
            let added = ctx
                .favorites
                .add_favorite(ContactInput { name, phone, iban })
                .map_err(user_error)?;
            if added {
                success("Favorite added");
            } else if ctx.favorites.favorites().len() >= MAX_FAVORITES {
                warning(&format!("Favorites are full ({} contacts)", MAX_FAVORITES));
            } else {
                info("Already in favorites");
            }
        }
        FavoritesCommands::Remove { id } => {
            if ctx.favorites.remove_favorite(&id) {
                success("Favorite removed");
            } else {
                anyhow::bail!("No favorite with id {}", id);
            }
        }
        FavoritesCommands::List { json } => {
            let favorites = ctx.favorites.favorites();
            if json {
                println!("{}", serde_json::to_string_pretty(&favorites)?);
                return Ok(());
            }
            if favorites.is_empty() {
                info("No favorites yet.");
                return Ok(());
            }

            let mut table = create_table();
            table.set_header(vec!["Name", "Phone", "IBAN", "ID"]);
            for favorite in &favorites {
                table.add_row(vec![
                    favorite.name.clone(),
                    favorite.phone.clone().unwrap_or_default(),
                    favorite.iban.clone().unwrap_or_default(),
                    favorite.id.dimmed().to_string(),
                ]);
            }
            println!("{}", table);
        }
    }
    Ok(())
}
