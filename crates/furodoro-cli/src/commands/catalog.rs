use clap::Subcommand;
use furodoro_core::integrations::category_error_placeholder;
use furodoro_core::{LifeUpClient, SelectorState};

use super::load_settings;

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List task categories as JSON
    Categories,
    /// List the tasks of one category as JSON
    Tasks {
        /// Numeric category id
        category_id: String,
    },
}

pub fn run(action: CatalogAction) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings(None)?;
    let client = LifeUpClient::new(&settings);
    let rt = tokio::runtime::Runtime::new()?;

    match action {
        CatalogAction::Categories => {
            let categories = rt.block_on(client.fetch_categories()).map_err(|e| {
                eprintln!("{}", category_error_placeholder(&e));
                e
            })?;
            println!("{}", serde_json::to_string_pretty(&categories)?);
        }
        CatalogAction::Tasks { category_id } => {
            let result = rt.block_on(client.fetch_tasks(&category_id));
            let state = SelectorState::for_tasks(&result);
            let listing = result.map_err(|e| {
                eprintln!("{}", state.placeholder());
                e
            })?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }
    Ok(())
}
