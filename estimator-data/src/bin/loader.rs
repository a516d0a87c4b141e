use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use estimator_data::MaterialCatalogLoader;
use estimator_db_sqlite::SqliteRepository;

/// Import the material catalog from CSV into an estimator database.
///
/// Materials CSV header:
/// `id,category_id,name_es,name_en,unit,price,image_url,is_active`
///
/// Prices are final DOP amounts. `image_url` may be empty and `is_active`
/// defaults to true. Importing an existing id updates that material.
#[derive(Parser, Debug)]
#[command(name = "estimator-catalog-loader", version, about)]
struct Args {
    /// Materials CSV
    #[arg(short, long)]
    file: PathBuf,

    /// Categories CSV (`id,name_es,name_en`), imported before the materials
    #[arg(short, long)]
    categories: Option<PathBuf>,

    /// sqlx database URL; `?mode=rwc` creates the file when missing
    #[arg(short, long, default_value = "sqlite:estimator.db?mode=rwc")]
    database: String,

    /// Apply schema migrations first
    #[arg(short, long)]
    migrate: bool,

    /// Seed directory to run after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

fn open_csv(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Cannot open {}", path.display()))
}

async fn prepare(
    repo: &SqliteRepository,
    args: &Args,
) -> Result<()> {
    if args.migrate {
        repo.run_migrations().await?;
        println!("Schema is up to date.");
    }
    if let Some(dir) = &args.seeds {
        repo.run_seeds(dir)
            .await
            .with_context(|| format!("Seeding from {} failed", dir.display()))?;
        println!("Applied seeds from {}.", dir.display());
    }
    Ok(())
}

async fn import_categories(
    repo: &SqliteRepository,
    path: &Path,
) -> Result<usize> {
    let records = MaterialCatalogLoader::parse_categories(open_csv(path)?)
        .with_context(|| format!("Bad categories file {}", path.display()))?;
    let written = MaterialCatalogLoader::load_categories(repo, &records).await?;
    Ok(written)
}

async fn import_materials(
    repo: &SqliteRepository,
    path: &Path,
) -> Result<usize> {
    let records = MaterialCatalogLoader::parse(open_csv(path)?)
        .with_context(|| format!("Bad materials file {}", path.display()))?;
    println!("Read {} materials from {}.", records.len(), path.display());
    let written = MaterialCatalogLoader::load(repo, &records).await?;
    Ok(written)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database).await?;
    prepare(&repo, &args).await?;

    if let Some(path) = &args.categories {
        let count = import_categories(&repo, path).await?;
        println!("Imported {count} categories.");
    }

    let count = import_materials(&repo, &args.file).await?;
    println!("Imported {count} materials into {}.", args.database);

    Ok(())
}
