use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "travelmapp")]
#[command(about = "Keep a log of the places you have been")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every place, newest first
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single place
    Show {
        /// Place ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a new place
    #[command(alias = "new")]
    Add {
        /// Place name
        #[arg(long)]
        name: String,
        /// Free text description
        #[arg(long, default_value = "")]
        description: String,
        /// Rating from 0 to 5
        #[arg(long, default_value_t = 0.0)]
        rating: f64,
        /// Photo to attach
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
    },
    /// Edit one of your places
    Edit {
        /// Place ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New rating from 0 to 5
        #[arg(long)]
        rating: Option<f64>,
        /// Replace the photo
        #[arg(long, value_name = "PATH", conflicts_with = "remove_image")]
        image: Option<PathBuf>,
        /// Detach the current photo
        #[arg(long)]
        remove_image: bool,
    },
    /// Delete one of your places and its photo
    #[command(alias = "rm")]
    Delete {
        /// Place ID
        id: String,
    },
    /// Manage the Supabase session stored in the OS keychain
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account with email/password
    Signup {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Login with email/password and store the session in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show who is signed in
    Status,
    /// Logout and clear the stored session
    Logout,
}
