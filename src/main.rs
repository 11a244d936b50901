//! # ADM
//!
//! A small personal productivity tool: a to-do list with due-date reminders,
//! a journal, and a headline reader.
//!
//! ## Usage
//!
//! Run without arguments to open the interactive list:
//!
//! ```bash
//! adm
//! ```
//!
//! **Tasks**
//! ```bash
//! adm add "Call the bank" --date 2025-12-01 --time "09:00 AM"
//! adm list
//! adm star 1
//! adm check 1          # moves it to the history
//! adm list --history
//! adm watch            # keep running and fire reminders
//! ```
//!
//! **Journal**
//! ```bash
//! adm journal add "Monday" "Shipped the thing" --quote "Small steps"
//! adm journal search monday
//! ```
//!
//! **News**
//! ```bash
//! NEWS_API_KEY=... adm news business
//! ```
//!
//! ## Data Storage
//!
//! Files live in `~/.local/share/adm/` (or the platform equivalent); set
//! `ADM_DATA_DIR` to use another directory. Logging goes to stderr and is
//! controlled with `RUST_LOG`; in the interactive UI it goes to `adm.log`.

use std::fs::OpenOptions;
use std::io;

use adm::commands::*;
use adm::config::Config;
use adm::tui::run_tui;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

#[derive(Parser)]
#[command(name = "adm")]
#[command(about = "To-do list with reminders, journal and headlines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task name (quoted if it has spaces)
        name: String,
        /// Due date in YYYY-MM-DD
        #[arg(short, long)]
        date: Option<String>,
        /// Due time, e.g. "09:00 AM"
        #[arg(short, long)]
        time: Option<String>,
        /// Star the task
        #[arg(short, long)]
        important: bool,
    },
    /// List tasks in display order
    List {
        /// Show the history instead
        #[arg(long)]
        history: bool,
    },
    /// Tick a task's checkbox (moves it to or from the history)
    Check {
        /// Position in the list or id prefix
        task: String,
        /// Pick the task from the history
        #[arg(long)]
        history: bool,
    },
    /// Star a task
    Star {
        task: String,
        /// Remove the star instead
        #[arg(short, long)]
        off: bool,
    },
    /// Rename a task
    Rename {
        task: String,
        name: String,
    },
    /// Change a task's due date and time
    Due {
        task: String,
        /// Due date in YYYY-MM-DD (empty to clear)
        date: String,
        /// Due time, e.g. "09:00 AM"
        time: Option<String>,
    },
    /// Delete a task
    Remove {
        task: String,
        #[arg(long)]
        history: bool,
    },
    /// Move a task to another position
    Move {
        from: usize,
        to: usize,
    },
    /// Sort starred tasks first, then by creation time
    Sort {
        /// Newest first
        #[arg(short, long)]
        reverse: bool,
    },
    /// Save or restore a binary snapshot of the list
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },
    /// Stay in the foreground and fire reminders
    Watch,
    /// Manage journal entries
    Journal {
        #[command(subcommand)]
        command: JournalCommands,
    },
    /// Show top headlines
    News {
        /// Category (business, technology, sports, ...)
        #[arg(default_value = "business")]
        category: String,
        /// Download article images into the cache
        #[arg(long)]
        images: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum SnapshotCommands {
    Save,
    Restore,
}

#[derive(Subcommand)]
enum JournalCommands {
    /// Write a new entry
    Add {
        title: String,
        content: String,
        /// What I learned today
        #[arg(short, long)]
        quote: Option<String>,
    },
    /// List entries, newest first
    List {
        #[arg(long)]
        oldest_first: bool,
    },
    /// Find entries by date, title or content
    Search {
        query: String,
    },
    /// Remove an entry by title
    Remove {
        title: String,
    },
}

/// Logs to stderr, or to `adm.log` while the TUI owns the terminal.
fn init_logging(to_file: bool) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log::LevelFilter::Info)
        .parse_default_env();
    if to_file {
        let file = Config::load().ok().and_then(|c| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(c.log_path())
                .ok()
        });
        match file {
            Some(f) => {
                builder.target(env_logger::Target::Pipe(Box::new(f)));
            }
            None => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }
    builder.init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(matches!(cli.command, Some(Commands::Ui) | None));

    match cli.command {
        Some(Commands::Add { name, date, time, important }) => cmd_add(name, date, time, important, false),
        Some(Commands::List { history }) => cmd_list(history),
        Some(Commands::Check { task, history }) => cmd_check(task, history, false),
        Some(Commands::Star { task, off }) => cmd_star(task, off, false),
        Some(Commands::Rename { task, name }) => cmd_rename(task, name, false),
        Some(Commands::Due { task, date, time }) => cmd_due(task, date, time, false),
        Some(Commands::Remove { task, history }) => cmd_remove(task, history, false),
        Some(Commands::Move { from, to }) => cmd_move(from, to, false),
        Some(Commands::Sort { reverse }) => cmd_sort(reverse, false),
        Some(Commands::Snapshot { command }) => match command {
            SnapshotCommands::Save => cmd_snapshot_save(false),
            SnapshotCommands::Restore => cmd_snapshot_restore(false),
        },
        Some(Commands::Watch) => cmd_watch(),
        Some(Commands::Journal { command }) => match command {
            JournalCommands::Add { title, content, quote } => cmd_journal_add(title, content, quote, false),
            JournalCommands::List { oldest_first } => cmd_journal_list(oldest_first),
            JournalCommands::Search { query } => cmd_journal_search(query),
            JournalCommands::Remove { title } => cmd_journal_remove(title, false),
        },
        Some(Commands::News { category, images }) => cmd_news(category, images),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "adm", &mut io::stdout());
        }
        Some(Commands::Ui) | None => {
            if let Err(e) = run_tui() {
                eprintln!("Error running TUI: {}", e);
            }
        }
    }
}
