//! CLI module - Command-line interface for Foodgram
//!
//! `serve` runs the HTTP API; the remaining commands manage reference data
//! that the API only exposes read-only.

mod commands;

use clap::{Parser, Subcommand};

/// Foodgram - recipe sharing backend
#[derive(Parser)]
#[command(name = "foodgram")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Manage recipe tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },

    /// Manage ingredients
    Ingredient {
        #[command(subcommand)]
        command: IngredientCommands,
    },
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// Add a tag
    Add {
        /// Display name
        name: String,
        /// Hex color, e.g. #E26C2D
        color: String,
        /// URL slug
        slug: String,
    },
    /// List all tags
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum IngredientCommands {
    /// Add an ingredient
    Add {
        /// Ingredient name
        name: String,
        /// Measurement unit, e.g. g or ml
        unit: String,
    },
}

pub use commands::*;
