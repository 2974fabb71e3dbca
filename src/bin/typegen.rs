//! typegen CLI
//!
//! Loads a directory of TypeSchema documents, flattens profiles and writes one
//! declaration file per type.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use typeschema_codegen::{
    flatten, generate_all, Backend, DirectoryLoader, FlattenCache, InheritanceGraph, TypegenConfig,
};

#[derive(Parser)]
#[command(name = "typegen")]
#[command(about = "Generate type declarations from flattened type schemas")]
#[command(version)]
struct Cli {
    /// Config file (merged over typegen.toml and TYPEGEN_* variables)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Directory of TypeSchema JSON documents
    #[arg(short, long, global = true)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate declarations for every loaded schema
    Generate {
        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Target language
        #[arg(short, long, value_enum)]
        backend: Option<Backend>,
    },
    /// Print the flattened form of one schema as JSON
    Flatten {
        /// Canonical url of the schema
        url: String,
    },
    /// Print schema urls bases-first, or the inheritance cycles preventing that
    Order,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but some types failed
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = TypegenConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    let schema_dir = cli
        .schema_dir
        .clone()
        .or_else(|| config.loader.schema_dir.clone())
        .ok_or_else(|| anyhow!("no schema directory: pass --schema-dir or set loader.schema_dir"))?;

    let loader = DirectoryLoader::load(&schema_dir, &config.loader.load_config())
        .with_context(|| format!("loading schemas from {}", schema_dir.display()))?;
    if loader.is_empty() {
        bail!("no schemas found in {}", schema_dir.display());
    }

    match cli.command {
        Commands::Generate { out, backend } => {
            let out_dir = out.unwrap_or_else(|| config.output.dir.clone());
            let backend = backend.unwrap_or(config.codegen.backend);
            generate(&loader, &out_dir, backend, &config.codegen.file_header)
        }
        Commands::Flatten { url } => {
            let schema = loader
                .get(&url)
                .ok_or_else(|| anyhow!("schema not found: {}", url))?;
            let flattened = flatten(&loader, &schema)?;
            println!("{}", serde_json::to_string_pretty(&flattened)?);
            Ok(true)
        }
        Commands::Order => {
            let graph = InheritanceGraph::build(&loader.schemas());
            let cycles = graph.cycles();
            if !cycles.is_empty() {
                for cycle in &cycles {
                    eprintln!("❌ cycle: {}", cycle.join(" <-> "));
                }
                return Ok(false);
            }
            for url in graph.generation_order()? {
                println!("{}", url);
            }
            Ok(true)
        }
    }
}

fn generate(loader: &DirectoryLoader, out_dir: &Path, backend: Backend, header: &str) -> anyhow::Result<bool> {
    let schemas = loader.schemas();
    println!("📦 typegen");
    println!("  Schemas: {}", schemas.len());
    println!("  Bundle:  {}", loader.bundle_hash());
    println!("  Backend: {:?}", backend);
    println!();

    let graph = InheritanceGraph::build(&schemas);
    for missing in graph.missing_bases() {
        warn!(base = %missing.url, "base not in schema set");
    }

    let generator = backend.generator();
    let cache = FlattenCache::new();
    let report = generate_all(loader, &cache, &schemas, generator.as_ref());

    for (file, urls) in report.file_collisions(generator.as_ref()) {
        warn!(%file, claimants = ?urls, "output file claimed by several types, last write wins");
        println!("⚠️  {} is generated by {} types: {}", file, urls.len(), urls.join(", "));
    }

    if !report.generated.is_empty() {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("creating {}", out_dir.display()))?;
    }
    for entry in &report.generated {
        let path = out_dir.join(generator.file_name(&entry.output.identifier));
        let mut content = String::new();
        if !header.is_empty() {
            content.push_str(header);
            content.push_str("\n\n");
        }
        content.push_str(&generator.render_file(&entry.output));
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    }

    let stats = cache.stats();
    println!("✅ Generated {} types into {}", report.generated.len(), out_dir.display());
    println!("   Cache: {} hits, {} misses", stats.hits, stats.misses);

    if report.is_success() {
        return Ok(true);
    }

    println!();
    println!("❌ {} types failed:", report.failed_urls().len());
    for error in &report.errors {
        println!("   {}", error);
    }
    if report.generated.is_empty() {
        bail!("no types generated");
    }
    Ok(false)
}
