//! RAX file store - Entry Point
//!
//! Command-line front end: authenticates the caller, then forwards one
//! operation to the storage engine on their behalf.

use clap::{Parser, Subcommand};
use log::info;
use std::io::Read;
use std::process::ExitCode;

use rax_file_store::admin;
use rax_file_store::auth::{CredentialStore, login};
use rax_file_store::config::StoreConfig;
use rax_file_store::error::handlers::{error_to_exit_code, handle_error};
use rax_file_store::error::{AppError, StorageError};
use rax_file_store::storage::FileStore;
use rax_file_store::utils::logging::setup_logging;

#[derive(Parser)]
#[command(name = "rax-fs")]
#[command(about = "Per-user file store with a JSON metadata sidecar", long_about = None)]
#[command(version)]
struct Cli {
    /// Account to act as
    #[arg(long, short = 'u')]
    user: String,

    /// Password for the account; the guest account needs none
    #[arg(long, short = 'p', default_value = "")]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or overwrite a file
    Create {
        /// Relative path, may contain subdirectories
        path: String,
        /// File content; read from stdin when omitted
        #[arg(long)]
        content: Option<String>,
        /// Block later updates and deletes
        #[arg(long)]
        read_only: bool,
    },
    /// Print a file
    Read { path: String },
    /// Replace the content of an existing file
    Update {
        path: String,
        /// New content; read from stdin when omitted
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a file
    Delete { path: String },
    /// List a directory
    Browse {
        #[arg(default_value = ".")]
        path: String,
    },
    /// Check whether a file exists
    Exists { path: String },
    /// Show the metadata record of a file
    Stat { path: String },
    /// Administrative operations
    Admin {
        #[command(subcommand)]
        action: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// List users with file counts and sizes
    Users,
    /// List another user's files
    Files { owner: String },
    /// Print another user's file
    Cat { owner: String, path: String },
    /// Register a user
    AddUser { username: String, password: String },
    /// Remove a user and all of their files
    RemoveUser { username: String },
}

fn main() -> ExitCode {
    setup_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            handle_error(&e);
            ExitCode::from(error_to_exit_code(&e))
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = StoreConfig::load()?;

    let mut credentials = CredentialStore::load(&config.users_path())?;
    let mut store = FileStore::open(&config)?;
    if !config.users_path().exists() {
        credentials.save()?;
    }

    let session = login(&credentials, &cli.user, &cli.password, &config)?;
    info!("Session opened for {}", session.username());
    let user = session.username();

    match cli.command {
        Commands::Create {
            path,
            content,
            read_only,
        } => {
            let content = content_or_stdin(content)?;
            store.create(&path, &content, user, read_only)?;
            println!("created {path}");
        }
        Commands::Read { path } => print!("{}", store.read(&path, user)?),
        Commands::Update { path, content } => {
            let content = content_or_stdin(content)?;
            store.update(&path, &content, user)?;
            println!("updated {path}");
        }
        Commands::Delete { path } => {
            store.delete(&path, user)?;
            println!("deleted {path}");
        }
        Commands::Browse { path } => {
            for entry in store.browse(user, &path)? {
                let kind = if entry.is_dir { "dir" } else { "file" };
                println!(
                    "{:<4} {:>10} {:>14.0} {}",
                    kind, entry.size, entry.modified, entry.name
                );
            }
        }
        Commands::Exists { path } => println!("{}", store.exists(&path, user)),
        Commands::Stat { path } => {
            let record = store.stat(&path, user)?;
            let rendered = serde_json::to_string_pretty(&record).map_err(StorageError::from)?;
            println!("{rendered}");
        }
        Commands::Admin { action } => match action {
            AdminCommands::Users => {
                for summary in admin::owner_summaries(&store, &credentials, &session)? {
                    println!(
                        "{:<20} {:>6} files {:>12} bytes",
                        summary.owner, summary.file_count, summary.total_bytes
                    );
                }
            }
            AdminCommands::Files { owner } => {
                for (path, record) in admin::owner_files(&store, &session, &owner)? {
                    let flag = if record.read_only { "ro" } else { "rw" };
                    println!("{flag} {:>10} {path}", record.size);
                }
            }
            AdminCommands::Cat { owner, path } => {
                print!("{}", admin::read_owner_file(&store, &session, &owner, &path)?);
            }
            AdminCommands::AddUser { username, password } => {
                admin::add_user(&mut credentials, &session, &config, &username, &password)?;
                println!("added user {username}");
            }
            AdminCommands::RemoveUser { username } => {
                let purged = admin::remove_user(
                    &mut store,
                    &mut credentials,
                    &session,
                    &config,
                    &username,
                )?;
                println!("removed user {username} ({purged} files)");
            }
        },
    }

    Ok(())
}

fn content_or_stdin(content: Option<String>) -> Result<String, AppError> {
    match content {
        Some(content) => Ok(content),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}
