//! TravelMapp CLI - log the places you have been from the terminal

mod auth;
mod cli;
mod commands;
mod error;


use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_edit, PlaceEdits};
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::from_default_env();
    let filter = match "travelmapp=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List { json }) => run_list(json).await?,
        Some(Commands::Show { id, json }) => run_show(&id, json).await?,
        Some(Commands::Add {
            name,
            description,
            rating,
            image,
        }) => run_add(&name, &description, rating, image.as_deref()).await?,
        Some(Commands::Edit {
            id,
            name,
            description,
            rating,
            image,
            remove_image,
        }) => {
            let edits = PlaceEdits {
                name,
                description,
                rating,
                remove_image,
            };
            run_edit(&id, edits, image.as_deref()).await?;
        }
        Some(Commands::Delete { id }) => run_delete(&id).await?,
        Some(Commands::Auth { command }) => run_auth(command).await?,
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
