use clap::{Args, Parser, Subcommand, ValueEnum};
use satchel_core::library::SearchCategory;
use std::path::PathBuf;

/// Satchel: organize, search, and revisit your study materials locally.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding the library database.
    #[arg(long, env = "SATCHEL_LIBRARY", default_value = ".satchel", global = true)]
    pub library: PathBuf,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a directory of documents into the library.
    Import(ImportArgs),
    /// List folders and notes.
    List(ListArgs),
    /// Search notes and folders.
    Search(SearchArgs),
    /// Show a note's details and mark it as recently viewed.
    Show(ShowArgs),
    /// Toggle a note's favorite status.
    Favorite(FavoriteArgs),
    /// List recently added or viewed notes.
    Recent(RecentArgs),
    /// Replace a note's tags.
    Tag(TagArgs),
    /// Delete a note or a folder.
    Rm(RmArgs),
    /// Show or change settings.
    Config(ConfigArgs),
}

// --- Argument structs for each subcommand ---

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Path to the directory to import.
    #[arg(required = true)]
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Folder path to list; the library root if omitted.
    pub folder: Option<String>,

    /// List only favorite notes.
    #[arg(long, short)]
    pub favorites: bool,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// The search query.
    #[arg(required = true)]
    pub query: String,

    /// Restrict results to one entity kind.
    #[arg(long, short, value_enum, default_value_t = CategoryArg::All)]
    pub category: CategoryArg,

    /// Cap the number of results shown.
    #[arg(long, short)]
    pub limit: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CategoryArg {
    All,
    Notes,
    Folders,
}

impl From<CategoryArg> for SearchCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::All => SearchCategory::All,
            CategoryArg::Notes => SearchCategory::Notes,
            CategoryArg::Folders => SearchCategory::Folders,
        }
    }
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Id or path of the note to show.
    #[arg(required = true)]
    pub note: String,
}

#[derive(Args, Debug)]
pub struct FavoriteArgs {
    /// Id or path of the note.
    #[arg(required = true)]
    pub note: String,
}

#[derive(Args, Debug)]
pub struct RecentArgs {}

#[derive(Args, Debug)]
pub struct TagArgs {
    /// Id or path of the note.
    #[arg(required = true)]
    pub note: String,

    /// The new tag list (replaces existing tags).
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Id or path of the note or folder to delete.
    #[arg(required = true)]
    pub target: String,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the current settings.
    Show,
    /// Change one setting, e.g. `config set theme dark`.
    Set {
        /// Setting name (theme, sort-by, sort-direction, view-mode,
        /// show-hidden-files, show-extensions, preview-quality,
        /// cache-size, enable-indexing, auto-save-interval, debug-mode).
        key: String,
        value: String,
    },
}
