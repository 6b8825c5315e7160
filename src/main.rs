use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use savekeep::mirror::{ClientMirror, MirrorError};
use savekeep::{FileStore, SaveError, SaveService, SaveSummary, StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mirror error: {0}")]
    Mirror(#[from] MirrorError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Save error: {0}")]
    Save(#[from] SaveError),

    #[error("Save '{0}' not found")]
    NotFound(String),
}

#[derive(Parser)]
#[command(name = "savekeep")]
#[command(about = "Inspect, import and export game saves")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saves in the local mirror, newest first
    List {
        /// Mirror path
        #[arg(long, default_value = ".savekeep-mirror", env = "SAVEKEEP_MIRROR")]
        mirror: PathBuf,
    },

    /// Print one local save as JSON
    Show {
        /// Save id
        save_id: String,

        /// Mirror path
        #[arg(long, default_value = ".savekeep-mirror", env = "SAVEKEEP_MIRROR")]
        mirror: PathBuf,
    },

    /// Write one local save to a standalone file
    Export {
        /// Save id
        save_id: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Mirror path
        #[arg(long, default_value = ".savekeep-mirror", env = "SAVEKEEP_MIRROR")]
        mirror: PathBuf,
    },

    /// Import a save file into the local mirror
    Import {
        /// Save file to import
        file: PathBuf,

        /// Mirror path
        #[arg(long, default_value = ".savekeep-mirror", env = "SAVEKEEP_MIRROR")]
        mirror: PathBuf,
    },

    /// Delete a save from the local mirror
    Delete {
        /// Save id
        save_id: String,

        /// Mirror path
        #[arg(long, default_value = ".savekeep-mirror", env = "SAVEKEEP_MIRROR")]
        mirror: PathBuf,
    },

    /// Rebuild an owner's index in a server store from its records
    Reindex {
        /// Store root
        #[arg(long, default_value = ".savekeep", env = "SAVEKEEP_STORE")]
        store: PathBuf,

        /// Owner id
        #[arg(long)]
        owner: String,
    },
}

fn print_summaries(saves: &[SaveSummary]) {
    if saves.is_empty() {
        println!("No saves");
        return;
    }
    for save in saves {
        println!(
            "{}  {}  {} (level {} {})  [{}]",
            save.save_id,
            save.timestamp.to_rfc3339(),
            save.save_name,
            save.character_level,
            save.character_class,
            save.character_name
        );
    }
}

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List { mirror } => {
            let mirror = ClientMirror::open_or_init(&mirror)?;
            print_summaries(&mirror.list_local()?);
            Ok(())
        }
        Commands::Show { save_id, mirror } => {
            let mirror = ClientMirror::open(&mirror)?;
            let bytes = mirror.export_local(&save_id)?;
            std::io::stdout().write_all(&bytes)?;
            println!();
            Ok(())
        }
        Commands::Export {
            save_id,
            output,
            mirror,
        } => {
            let mirror = ClientMirror::open(&mirror)?;
            let bytes = mirror.export_local(&save_id)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    println!("Exported '{}' to {}", save_id, path.display());
                }
                None => {
                    std::io::stdout().write_all(&bytes)?;
                    println!();
                }
            }
            Ok(())
        }
        Commands::Import { file, mirror } => {
            let mirror = ClientMirror::open_or_init(&mirror)?;
            let bytes = std::fs::read(&file)?;
            let record = mirror.import_external(&bytes)?;
            println!(
                "Imported '{}' ({}) from {}",
                record.save_name,
                record.save_id,
                file.display()
            );
            Ok(())
        }
        Commands::Delete { save_id, mirror } => {
            let mirror = ClientMirror::open(&mirror)?;
            if !mirror.delete_local(&save_id)? {
                return Err(AppError::NotFound(save_id));
            }
            println!("Deleted '{}'", save_id);
            Ok(())
        }
        Commands::Reindex { store, owner } => {
            let service = SaveService::new(Arc::new(FileStore::open(&store)?));
            let saves = service.rebuild_index(&owner)?;
            println!("Rebuilt index for '{}' with {} save(s)", owner, saves.len());
            print_summaries(&saves);
            Ok(())
        }
    }
}
