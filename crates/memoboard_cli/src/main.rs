//! Command-line front end for the memo board.
//!
//! # Responsibility
//! - Map subcommands onto core store, board and profile operations.
//! - Keep persistence and ordering rules inside `memoboard_core`.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use memoboard_core::{
    default_log_level, init_logging, open_db, resolve_display_name, AppConfig, BoardView,
    ChangeFeed, Memo, MemoBoard, MemoColor, MemoId, MemoPatch, OwnerId, Preferences,
    ProfilePatch, ProfileService, SortKey, SqliteMemoRepository, SqliteProfileRepository,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const SHORT_ID_LEN: usize = 8;

#[derive(Parser)]
#[command(name = "memoboard")]
#[command(version)]
#[command(about = "Personal memo board: colored cards with trash and manual ordering", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "MEMOBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level override (trace|debug|info|warn|error)
    #[arg(long, env = "MEMOBOARD_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the data directory, database and local user
    Init,
    /// Show memos as the board displays them
    List {
        /// created_at|color|position
        #[arg(long)]
        sort: Option<SortKey>,
        /// Palette name or #RRGGBB
        #[arg(long)]
        color: Option<MemoColor>,
        /// Case-insensitive text filter
        #[arg(long)]
        search: Option<String>,
        /// Show the trash instead of the board
        #[arg(long)]
        trash: bool,
    },
    /// Add a memo at the end of the board
    Add {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        color: Option<MemoColor>,
    },
    /// Edit fields of a memo
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        color: Option<MemoColor>,
    },
    /// Move a memo to the trash
    Trash { id: String },
    /// Take a memo out of the trash
    Restore { id: String },
    /// Permanently delete a trashed memo
    Purge { id: String },
    /// Permanently delete every trashed memo
    EmptyTrash {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Place a memo directly before another one in manual order
    Move {
        id: String,
        #[arg(long)]
        before: String,
    },
    /// Show or edit the profile
    Profile {
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        username: Option<String>,
    },
    /// Show or set the color theme
    Theme {
        #[arg(long, conflicts_with = "light")]
        dark: bool,
        #[arg(long)]
        light: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = load_config(&config_path)?;

    let level = cli
        .log_level
        .clone()
        .or_else(|| config.log.level.clone())
        .unwrap_or_else(|| default_log_level().to_string());
    if let Err(err) = init_logging(&level, &config.log_dir()) {
        eprintln!("warning: file logging disabled: {err}");
    }

    match cli.command {
        Command::Init => run_init(&mut config, &config_path),
        Command::Theme { dark, light } => run_theme(&config, dark, light),
        Command::Profile {
            display_name,
            username,
        } => {
            let (owner, conn) = open_owner_db(&config)?;
            run_profile(&conn, owner, display_name, username)
        }
        command => {
            let (owner, conn) = open_owner_db(&config)?;
            run_board_command(&config, &conn, owner, command)
        }
    }
}

/// Loads the config file; only a missing file falls back to defaults.
fn load_config(path: &Path) -> Result<AppConfig> {
    AppConfig::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn open_owner_db(config: &AppConfig) -> Result<(OwnerId, Connection)> {
    let owner = config
        .owner
        .ok_or_else(|| anyhow!("no local user yet; run `memoboard init` first"))?;
    let path = config.database_path();
    let conn = open_db(&path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok((owner, conn))
}

fn run_init(config: &mut AppConfig, config_path: &Path) -> Result<()> {
    std::fs::create_dir_all(config.data_dir())
        .with_context(|| format!("failed to create {}", config.data_dir().display()))?;
    let owner = *config.owner.get_or_insert_with(Uuid::new_v4);
    config
        .save(config_path)
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    let conn = open_db(config.database_path())?;
    let profiles = ProfileService::new(SqliteProfileRepository::try_new(&conn)?);
    profiles.ensure_profile(owner)?;

    log::info!("event=cli_init module=cli status=ok owner={owner}");
    println!("user     {owner}");
    println!("config   {}", config_path.display());
    println!("database {}", config.database_path().display());
    Ok(())
}

fn run_theme(config: &AppConfig, dark: bool, light: bool) -> Result<()> {
    let path = config.preferences_path();
    let mut preferences = Preferences::load(&path)?;
    if dark || light {
        preferences.dark_mode = dark;
        preferences.save(&path)?;
    }
    println!("{}", if preferences.dark_mode { "dark" } else { "light" });
    Ok(())
}

fn run_profile(
    conn: &Connection,
    owner: OwnerId,
    display_name: Option<String>,
    username: Option<String>,
) -> Result<()> {
    let profiles = ProfileService::new(SqliteProfileRepository::try_new(conn)?);
    let patch = ProfilePatch {
        display_name,
        username,
        avatar_url: None,
    };
    let profile = profiles.update_profile(owner, patch)?;
    println!("name     {}", resolve_display_name("", Some(&profile)));
    println!("username {}", profile.username.as_deref().unwrap_or("-"));
    Ok(())
}

fn run_board_command(
    config: &AppConfig,
    conn: &Connection,
    owner: OwnerId,
    command: Command,
) -> Result<()> {
    let repo = SqliteMemoRepository::with_feed(
        conn,
        ChangeFeed::new(config.realtime.channel_capacity),
    )?;
    let preferences = Preferences::load(config.preferences_path())?;
    let view = BoardView::with_preferences(config.board.default_sort, preferences);
    let mut board = MemoBoard::open(repo, owner, view)?;

    match command {
        Command::List {
            sort,
            color,
            search,
            trash,
        } => {
            if let Some(sort) = sort {
                board.set_sort(sort);
            }
            board.set_color_filter(color);
            board.set_query(search.unwrap_or_default());
            board.set_show_trash(trash);
            let memos = board.displayed();
            if memos.is_empty() {
                println!("(no memos)");
            }
            for memo in &memos {
                print_memo(memo);
            }
        }
        Command::Add {
            title,
            content,
            color,
        } => {
            let color = match color {
                Some(color) => color,
                None => config.board.color()?,
            };
            let memo = board.store_mut().create(title, content, color)?;
            print_memo(&memo);
        }
        Command::Edit {
            id,
            title,
            content,
            color,
        } => {
            let id = resolve_id(&board, &id)?;
            let patch = MemoPatch {
                title,
                content,
                color,
                ..MemoPatch::default()
            };
            if patch.is_empty() {
                bail!("nothing to change; pass --title, --content or --color");
            }
            let memo = board.store_mut().update(id, patch)?;
            print_memo(&memo);
        }
        Command::Trash { id } => {
            let id = resolve_id(&board, &id)?;
            board.store_mut().soft_delete(id)?;
            println!("trashed {}", short_id(id));
        }
        Command::Restore { id } => {
            let id = resolve_id(&board, &id)?;
            board.store_mut().restore(id)?;
            println!("restored {}", short_id(id));
        }
        Command::Purge { id } => {
            let id = resolve_id(&board, &id)?;
            board.store_mut().purge(id)?;
            println!("purged {}", short_id(id));
        }
        Command::EmptyTrash { yes } => {
            if !yes {
                bail!("refusing to delete the trash permanently without --yes");
            }
            let report = board.store_mut().empty_trash();
            println!("purged {}", report.purged.len());
            if let Some(first) = report.failures.into_iter().next() {
                return Err(first.into());
            }
        }
        Command::Move { id, before } => {
            let id = resolve_id(&board, &id)?;
            let before = resolve_id(&board, &before)?;
            let order = order_before(board.store().list(), id, before)?;
            let changed = board.store_mut().reorder(&order)?;
            println!("moved {} ({changed} positions changed)", short_id(id));
        }
        Command::Init | Command::Theme { .. } | Command::Profile { .. } => {}
    }
    Ok(())
}

/// Manual order with `id` placed directly before `before`.
///
/// Both memos must be on the board; moving a memo before itself keeps the order.
fn order_before(active: &[Memo], id: MemoId, before: MemoId) -> Result<Vec<MemoId>> {
    let mut sorted = active.to_vec();
    sorted.sort_by_key(|memo| memo.position);
    let current = sorted.iter().map(|memo| memo.id).collect::<Vec<_>>();
    for required in [id, before] {
        if !current.contains(&required) {
            bail!("memo {} is not on the board", short_id(required));
        }
    }
    if id == before {
        return Ok(current);
    }
    let mut ids = current
        .into_iter()
        .filter(|memo_id| *memo_id != id)
        .collect::<Vec<_>>();
    let index = ids
        .iter()
        .position(|memo_id| *memo_id == before)
        .unwrap_or(ids.len());
    ids.insert(index, id);
    Ok(ids)
}

/// Resolves a full id or a unique id prefix against active and trashed memos.
fn resolve_id(board: &MemoBoard<SqliteMemoRepository<'_>>, raw: &str) -> Result<MemoId> {
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(id);
    }
    let prefix = raw.trim().to_ascii_lowercase();
    if prefix.is_empty() {
        bail!("memo id cannot be empty");
    }
    let store = board.store();
    let matches = store
        .list()
        .iter()
        .chain(store.trashed().iter())
        .filter(|memo| memo.id.to_string().starts_with(&prefix))
        .map(|memo| memo.id)
        .collect::<Vec<_>>();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("no memo matches `{raw}`"),
        _ => bail!("`{raw}` matches {} memos; use a longer prefix", matches.len()),
    }
}

fn short_id(id: MemoId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

fn print_memo(memo: &Memo) {
    println!(
        "{}  {:<7}  #{:<3} {}",
        short_id(memo.id),
        memo.color.to_string(),
        memo.position,
        memo.display_title()
    );
    if let Some(first_line) = memo.content.lines().find(|line| !line.trim().is_empty()) {
        println!("          {first_line}");
    }
}
