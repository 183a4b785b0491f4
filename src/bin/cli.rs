//! CaskKV CLI
//!
//! Local admin tool over a CaskKV data directory.

use std::process;

use caskkv::{CaskError, Config, DataType, Db};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// CaskKV CLI
#[derive(Parser, Debug)]
#[command(name = "caskkv-cli")]
#[command(about = "Admin CLI for a CaskKV data directory")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./caskkv_data")]
    dir: String,

    /// Segment capacity in KB
    #[arg(short = 's', long, default_value = "1024")]
    segment_kb: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a string value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a string key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a string key
    Del {
        /// The key to delete
        key: String,
    },

    /// Compact every data type now
    Merge,

    /// Show segment counts per data type
    Stats,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,caskkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // The background timer stays off: the process exits after one command
    let config = Config::builder()
        .dir(&args.dir)
        .max_file_size(args.segment_kb * 1024)
        .disable_auto_merge()
        .build();

    let db = match Db::open(config) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", args.dir, e);
            process::exit(1);
        }
    };

    let result = run(&db, args.command);
    let closed = db.close();

    if let Err(e) = result.and(closed) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(db: &Db, command: Commands) -> caskkv::Result<()> {
    match command {
        Commands::Get { key } => match db.get(key.as_bytes()) {
            Ok(value) => println!("{}", String::from_utf8_lossy(&value)),
            Err(CaskError::KeyNotExist) => println!("(nil)"),
            Err(e) => return Err(e),
        },
        Commands::Set { key, value } => {
            db.set(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Del { key } => {
            db.remove(key.as_bytes())?;
            println!("OK");
        }
        Commands::Merge => {
            db.merge()?;
            println!("OK");
        }
        Commands::Stats => {
            println!("dir: {}", db.dir().display());
            println!("string keys: {}", db.str_len()?);
            for data_type in DataType::ALL {
                println!(
                    "{:<5} segments: {:?}",
                    data_type.suffix(),
                    db.segment_ids(data_type)?
                );
            }
        }
    }
    Ok(())
}
