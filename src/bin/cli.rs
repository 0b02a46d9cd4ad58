//! gpnvm CLI
//!
//! Command-line interface for reading and writing attributes.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gpnvm::{AttributeStore, Config, NvmError, SyncPolicy};
use tracing_subscriber::{fmt, EnvFilter};

/// gpnvm CLI
#[derive(Parser, Debug)]
#[command(name = "gpnvm-cli")]
#[command(about = "CLI for the gpnvm attribute store")]
#[command(version)]
struct Args {
    /// Medium file
    #[arg(short, long, default_value = "nvm.bin")]
    medium: PathBuf,

    /// Fail instead of creating a missing medium
    #[arg(long)]
    no_create: bool,

    /// Leave flushing to the OS instead of syncing every write
    #[arg(long)]
    no_sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print an attribute
    Get {
        /// Attribute ID
        id: u8,
    },

    /// Set an attribute
    Set {
        /// Attribute ID
        id: u8,

        /// Value as hex (length = number of decoded bytes)
        value: String,
    },

    /// List the attribute directory
    List,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> gpnvm::Result<()> {
    let sync_policy = if args.no_sync {
        SyncPolicy::OsBuffered
    } else {
        SyncPolicy::EveryWrite
    };

    let config = Config::builder()
        .medium_path(&args.medium)
        .sync_policy(sync_policy)
        .create_if_missing(!args.no_create)
        .build();

    let mut store = AttributeStore::open(&config)?;

    match args.command {
        Commands::Get { id } => {
            let (length, value) = store.get_attribute(id)?;
            println!("{} (size {}): {}", id, length, hex::encode(value));
        }
        Commands::Set { id, value } => {
            let bytes = hex::decode(value.trim_start_matches("0x"))
                .map_err(|e| NvmError::Config(format!("Invalid hex value: {}", e)))?;
            let length = u8::try_from(bytes.len()).map_err(|_| {
                NvmError::Config(format!("Value is {} bytes, at most 255 allowed", bytes.len()))
            })?;

            store.set_attribute(id, length, &bytes)?;
            println!("{} (size {}): {}", id, length, hex::encode(&bytes));
        }
        Commands::List => {
            let directory = store.directory();
            println!(
                "num_entries = {}, total size = {}",
                directory.len(),
                directory.total_payload_size()
            );
            for (i, entry) in directory.entries().iter().enumerate() {
                println!(
                    "[{}] = {{ attr_id: {}, offset: {}, len: {} }}",
                    i, entry.attribute_id, entry.offset, entry.length
                );
            }
        }
    }

    Ok(())
}
