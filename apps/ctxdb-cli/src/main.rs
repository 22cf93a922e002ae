use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ctxdb_core::config::Config;
use ctxdb_core::{HybridSearchOptions, SearchOptions, SearchRequest, VectorDatabase, VectorDocument};
use ctxdb_lance::LanceDbVectorDatabase;

mod args;
use args::Command;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = env::args().skip(1).collect();
    let command = match args::parse(&argv) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(2);
        }
    };
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let lance = config.lancedb()?;

    tokio::runtime::Runtime::new()?.block_on(async {
        let db = LanceDbVectorDatabase::open(lance).await?;
        info!(uri = db.uri(), "using LanceDB");
        run(&db, command).await
    })
}

async fn run(db: &LanceDbVectorDatabase, command: Command) -> Result<()> {
    match command {
        Command::Collections => {
            for name in db.list_collections().await? {
                println!("{name}");
            }
        }
        Command::Create { name, dimension, hybrid } => {
            if hybrid {
                db.create_hybrid_collection(&name, dimension).await?;
            } else {
                db.create_collection(&name, dimension).await?;
            }
            println!("✅ Collection '{name}' ready (dimension {dimension}{})", if hybrid { ", hybrid" } else { "" });
        }
        Command::Drop { name } => {
            db.drop_collection(&name).await?;
            println!("🗑️  Dropped '{name}'");
        }
        Command::Ingest { name, path, batch } => ingest(db, &name, &path, batch).await?,
        Command::Search { name, vector, top_k, filter } => {
            let options = SearchOptions { top_k, filter_expr: filter };
            for result in db.search(&name, &vector, &options).await? {
                println!("{}", serde_json::to_string(&result)?);
            }
        }
        Command::Hybrid { name, vector, text, limit, filter } => {
            let mut requests = Vec::new();
            if let Some(vector) = vector {
                requests.push(SearchRequest::vector(vector));
            }
            if let Some(text) = text {
                requests.push(SearchRequest::text(text));
            }
            let options = HybridSearchOptions { limit, filter_expr: filter };
            for result in db.hybrid_search(&name, &requests, &options).await? {
                println!("{}", serde_json::to_string(&result)?);
            }
        }
        Command::Query { name, filter, fields, limit } => {
            let filter = filter.unwrap_or_default();
            for row in db.query(&name, &filter, &fields, limit).await? {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
        Command::Delete { name, ids } => {
            db.delete(&name, &ids).await?;
            println!("🗑️  Deleted {} id(s) from '{name}'", ids.len());
        }
        Command::Stats { name, filter } => {
            let rows = db.count(&name, filter.as_deref()).await?;
            println!("📊 {name}: {rows} rows");
            println!("   database: {} ({:?} reads)", db.uri(), db.config().consistency);
        }
    }
    Ok(())
}

/// One `VectorDocument` JSON object per line; blank lines are skipped.
fn load_documents(path: &Path) -> Result<Vec<VectorDocument>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("{}:{}: invalid document", path.display(), i + 1))
        })
        .collect()
}

async fn ingest(db: &LanceDbVectorDatabase, name: &str, path: &Path, batch: usize) -> Result<()> {
    let docs = load_documents(path)?;
    if docs.is_empty() {
        println!("No documents to ingest");
        return Ok(());
    }
    println!("Ingesting {} documents into '{name}'", docs.len());

    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    for chunk in docs.chunks(batch) {
        db.insert(name, chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("done");
    println!("📊 {name}: {} rows", db.count(name, None).await?);
    Ok(())
}
