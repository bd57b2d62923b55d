//! SackDB CLI
//!
//! Command-line driver for SackDB sack files.
//!
//! # Commands
//!
//! - `put` - Store a file from the in/out directory under its file name
//! - `get` - Extract a stored file into the in/out directory
//! - `action` - Put and/or get one file in a single invocation
//! - `list` - List every physical record in the sack file
//! - `verify` - Check the sack file for a damaged or partial tail
//! - `clear` - Truncate the sack file to empty
//! - `keygen` - Generate a random key and IV as base64

mod commands;

use clap::{Parser, Subcommand};
use commands::{ActionOptions, StoreArgs};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SackDB command-line tools.
#[derive(Parser)]
#[command(name = "sackdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    /// Enable debug logging
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file in the sack under its file name
    Put {
        /// Directory to read the file from
        #[arg(long, default_value = ".")]
        io_dir: PathBuf,

        /// File name, also used as the key
        filename: String,
    },

    /// Extract a file from the sack into the in/out directory
    Get {
        /// Directory to write the file to
        #[arg(long, default_value = ".")]
        io_dir: PathBuf,

        /// Key, also used as the output file name
        filename: String,
    },

    /// Put and/or get one file, in that order
    Action {
        /// Directory files are read from and written to
        #[arg(long, default_value = ".")]
        io_dir: PathBuf,

        /// File name, also used as the key
        filename: String,

        /// Store the file in the sack
        #[arg(long)]
        put: bool,

        /// Extract the file from the sack
        #[arg(long)]
        get: bool,
    },

    /// List every record in the sack file
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check the sack file for damage
    Verify,

    /// Truncate the sack file to empty
    Clear {
        /// Confirm the irreversible clear
        #[arg(long)]
        yes: bool,
    },

    /// Generate a random key and IV, printed as base64
    Keygen {
        /// Key size in bytes (16, 24 or 32)
        #[arg(long, default_value_t = 32)]
        key_size: usize,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Put { io_dir, filename } => {
            let store = commands::open_store(&cli.store)?;
            commands::action::run(
                &store,
                &ActionOptions::new(&io_dir, &filename, cli.store.non_blocking).put(),
            )?;
        }
        Commands::Get { io_dir, filename } => {
            let store = commands::open_store(&cli.store)?;
            commands::action::run(
                &store,
                &ActionOptions::new(&io_dir, &filename, cli.store.non_blocking).get(),
            )?;
        }
        Commands::Action {
            io_dir,
            filename,
            put,
            get,
        } => {
            let store = commands::open_store(&cli.store)?;
            let mut options = ActionOptions::new(&io_dir, &filename, cli.store.non_blocking);
            if put {
                options = options.put();
            }
            if get {
                options = options.get();
            }
            commands::action::run(&store, &options)?;
        }
        Commands::List { format } => {
            let store = commands::open_store(&cli.store)?;
            commands::list::run(&store, &format)?;
        }
        Commands::Verify => {
            let store = commands::open_store(&cli.store)?;
            commands::verify::run(&store)?;
        }
        Commands::Clear { yes } => {
            let store = commands::open_store(&cli.store)?;
            commands::clear::run(&store, yes)?;
        }
        Commands::Keygen { key_size } => {
            commands::keygen::run(key_size)?;
        }
        Commands::Version => {
            println!("SackDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("SackDB Core v{}", sackdb_core::VERSION);
        }
    }

    Ok(())
}
