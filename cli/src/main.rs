//! Thin CLI over `dictionary-core`'s in-memory stores (§0: "exercises the
//! library end-to-end against an in-memory store", mirroring the teacher's
//! `apollo-federation-cli` companion crate).

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dictionary_core::config::{DictionaryConfig, ValidatorOptions};
use dictionary_core::lang::LanguageTag;
use dictionary_core::service::DictionaryService;
use dictionary_core::store::memory::{MemoryGraphStore, MemoryLinkStore, MemoryTermStore};
use dictionary_core::term::{Term, TermHandle};

#[derive(Parser)]
#[command(name = "dictionary-cli", about = "Exercise the dictionary engine against an in-memory store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Insert one or more terms from a JSON file (a single term object, or
    /// an array of term objects).
    Insert {
        #[arg(long)]
        file: PathBuf,
    },
    /// Fetch a term by its local identifier and print it as JSON.
    Get {
        #[arg(long)]
        lid: String,
    },
    /// Validate a value against a descriptor's data definition.
    Validate {
        #[arg(long)]
        descriptor: String,
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "iso_639_3_eng")]
        language: String,
    },
    /// Validate a full term-shaped object, including its own sections.
    ValidateObject {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "iso_639_3_eng")]
        language: String,
    },
}

type Service = DictionaryService<MemoryTermStore, MemoryGraphStore, MemoryLinkStore>;

fn new_service() -> Service {
    DictionaryService::new(
        DictionaryConfig::default(),
        Arc::new(MemoryTermStore::new()),
        Arc::new(MemoryGraphStore::new()),
        Arc::new(MemoryLinkStore::new()),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    // Freshly seeded per invocation: there is no persistence backend in
    // scope (§1's non-goals), so every run starts from an empty store.
    let service = new_service();

    match cli.command {
        Command::Insert { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            let terms: Vec<Term> = match value {
                serde_json::Value::Array(_) => serde_json::from_value(value)?,
                other => vec![serde_json::from_value(other)?],
            };
            for term in terms {
                let lid = term.code.lid.clone();
                service.insert_term(term).await?;
                println!("inserted {lid}");
            }
        }
        Command::Get { lid } => {
            let term = service.get_term(&TermHandle::from(lid.as_str())).await?;
            println!("{}", serde_json::to_string_pretty(&term)?);
        }
        Command::Validate { descriptor, file, language } => {
            let raw = std::fs::read_to_string(&file)?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            let language: LanguageTag = language.parse()?;
            let report = service.validate_descriptor(&descriptor, &value, &language, &ValidatorOptions::default()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::ValidateObject { file, language } => {
            let raw = std::fs::read_to_string(&file)?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            let language: LanguageTag = language.parse()?;
            let report = service.validate_object(&value, &language, &ValidatorOptions::default()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
