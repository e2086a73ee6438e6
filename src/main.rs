use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod git;

/// A minimal content-addressed git client.
#[derive(Parser, Debug)]
#[command(name = "minigit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty repository in the current directory
    Init,

    /// Compute a blob's object id, optionally writing it to the store
    HashObject {
        /// Write the object into the store
        #[arg(short = 'w')]
        write: bool,
        /// File to hash
        path: PathBuf,
    },

    /// Print an object's payload
    CatFile {
        /// Pretty-print the payload (the only supported form)
        #[arg(short = 'p')]
        pretty: bool,
        /// 40-hex object id
        sha: String,
    },

    /// List a tree object's entry names
    LsTree {
        /// 40-hex tree id
        sha: String,
    },

    /// Snapshot the working directory as a tree object
    WriteTree,

    /// Create a commit object for a tree
    CommitTree {
        /// 40-hex tree id
        tree: String,
        /// 40-hex parent commit id
        #[arg(short = 'p')]
        parent: Option<String>,
        /// Commit message
        #[arg(short = 'm')]
        message: String,
    },

    /// Clone a remote repository over Smart HTTP
    Clone {
        /// Repository URL
        url: String,
        /// Destination directory
        dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(cli.command) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Init => commands::init(),
        Commands::HashObject { write, path } => commands::hash_object(write, &path),
        Commands::CatFile { pretty, sha } => commands::cat_file(pretty, &sha),
        Commands::LsTree { sha } => commands::ls_tree(&sha),
        Commands::WriteTree => commands::write_tree(),
        Commands::CommitTree {
            tree,
            parent,
            message,
        } => commands::commit_tree(&tree, parent.as_deref(), &message),
        Commands::Clone { url, dir } => commands::clone(&url, &dir),
    }
}
