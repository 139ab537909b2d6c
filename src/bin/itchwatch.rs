//! itchwatch CLI: offline management of a tracked game library.
//!
//! Usage:
//!   itchwatch list [--sort name|time|starred|updated ...] [--keyword K] [--db path]
//!   itchwatch star|unstar|mark|remove <id> [--db path]
//!   itchwatch note <id> <text> [--db path]
//!   itchwatch export [--db path]
//!   itchwatch extract <file>

use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use itchwatch::library::backup;
use itchwatch::{
    clean_identifier, extract_identifiers, AnnotationPatch, FetchError, Fetcher, Library,
    LibraryFilter, OpenStore, Preferences, Record, SortKey, SortKeys, SqliteStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "itchwatch", version, about = "Track itch.io game pages for new builds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List tracked games
    List {
        /// Sort keys, applied starred > updated > time > name
        #[arg(long, value_enum, num_args = 1..)]
        sort: Vec<SortArg>,
        /// Only games whose name contains this text
        #[arg(long)]
        keyword: Option<String>,
    },
    /// Star a game
    Star { id: String },
    /// Remove the star from a game
    Unstar { id: String },
    /// Mark the current version as played
    Mark { id: String },
    /// Attach a note to a game
    Note { id: String, text: String },
    /// Remove a game from the library
    Remove { id: String },
    /// Print all annotations as a JSON backup
    Export,
    /// Print the game page links found in a text file
    Extract { file: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Time,
    Starred,
    Updated,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortKey::Name,
            SortArg::Time => SortKey::TimeReverse,
            SortArg::Starred => SortKey::Starred,
            SortArg::Updated => SortKey::Updated,
        }
    }
}

/// Stands in for the page fetcher; none of the CLI commands fetch.
struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch_record(&self, identifier: &str) -> Result<Record, FetchError> {
        Err(FetchError::Network(format!("offline, cannot fetch {identifier}")))
    }
}

/// Get the default database path (~/.local/share/itchwatch/library.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let app_dir = data_dir.join("itchwatch");
    std::fs::create_dir_all(&app_dir).ok();
    app_dir.join("library.db")
}

fn open_library(db: Option<PathBuf>) -> Result<Library, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store = SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    let preferences = Arc::new(Preferences::new());
    Library::open(Arc::new(store), Arc::new(OfflineFetcher), preferences)
        .map_err(|e| format!("Failed to load library: {}", e))
}

fn cmd_list(library: &Library, sort: Vec<SortArg>, keyword: Option<String>) -> i32 {
    let keys = if sort.is_empty() {
        library.preferences().sort_keys()
    } else {
        sort.into_iter().map(SortKey::from).collect::<SortKeys>()
    };
    let filter = LibraryFilter {
        keyword,
        ..LibraryFilter::default()
    };

    let items = library.view(&filter, &keys);
    if items.is_empty() {
        println!("No games tracked.");
        return 0;
    }
    println!("{:<1} {:<1} {:<32}  {:<12}  {}", "*", "!", "NAME", "VERSION", "PAGE");
    println!("{}", "-".repeat(90));
    for item in items {
        println!(
            "{:<1} {:<1} {:<32}  {:<12}  {}",
            if item.starred() { "*" } else { "" },
            if item.has_update() { "!" } else { "" },
            item.display_name(),
            item.current_version_label().unwrap_or("-"),
            item.identifier()
        );
    }
    0
}

fn cmd_update(library: &mut Library, id: &str, patch: AnnotationPatch, done: &str) -> i32 {
    let id = clean_identifier(id);
    match library.update_annotation(&id, &patch) {
        Ok(_) => {
            println!("{} {}", done, id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_mark(library: &mut Library, id: &str) -> i32 {
    let id = clean_identifier(id);
    match library.mark_played(&id) {
        Ok(annotation) => {
            let version = annotation.last_played_version.as_deref().unwrap_or("-");
            println!("Marked {} as played ({})", id, version);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_remove(library: &mut Library, id: &str) -> i32 {
    let id = clean_identifier(id);
    match library.delete(&id) {
        Ok(()) => {
            println!("Removed {}", id);
            0
        }
        Err(e) if e.is_inconsistency() => {
            eprintln!("Warning: {}", e);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_export(library: &Library) -> i32 {
    let json = library
        .export_all()
        .map_err(|e| e.to_string())
        .and_then(|annotations| backup::to_json(&annotations).map_err(|e| e.to_string()));
    match json {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_extract(file: &Path) -> i32 {
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", file.display(), e);
            return 1;
        }
    };
    let identifiers = extract_identifiers(&text);
    if identifiers.is_empty() {
        eprintln!("No game page links found.");
        return 1;
    }
    for identifier in identifiers {
        println!("{}", identifier);
    }
    0
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Extract { file } => cmd_extract(&file),
        command => run_library_command(command, cli.db),
    };
    std::process::exit(code);
}

fn run_library_command(command: Commands, db: Option<PathBuf>) -> i32 {
    let mut library = match open_library(db) {
        Ok(library) => library,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match command {
        Commands::List { sort, keyword } => cmd_list(&library, sort, keyword),
        Commands::Star { id } => cmd_update(&mut library, &id, AnnotationPatch::new().starred(true), "Starred"),
        Commands::Unstar { id } => cmd_update(&mut library, &id, AnnotationPatch::new().starred(false), "Unstarred"),
        Commands::Mark { id } => cmd_mark(&mut library, &id),
        Commands::Note { id, text } => cmd_update(&mut library, &id, AnnotationPatch::new().note(text), "Noted"),
        Commands::Remove { id } => cmd_remove(&mut library, &id),
        Commands::Export => cmd_export(&library),
        Commands::Extract { file } => cmd_extract(&file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn offline_commands_take_no_concurrency() {
        assert!(Cli::try_parse_from(["itchwatch", "--concurrency", "3", "list"]).is_err());

        let cli = Cli::try_parse_from(["itchwatch", "list", "--db", "lib.db", "--sort", "starred", "name"])
            .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("lib.db")));
        match cli.command {
            Commands::List { sort, keyword } => {
                assert_eq!(sort.len(), 2);
                assert!(keyword.is_none());
            }
            _ => panic!("wrong subcommand"),
        }
    }
}
