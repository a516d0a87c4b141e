use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use estimator_cli::app::{self, EstimateCommand};
use estimator_cli::config::{AppConfig, CONFIG_ENV, DEFAULT_CONFIG_FILE, Overrides};
use estimator_cli::logging;
use estimator_cli::utils::{MaterialArg, parse_material_arg};
use estimator_core::{Locale, OwnerId, ProjectType};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Construction cost estimator.
///
/// Prices a project from its area, project type and a bill of materials
/// (amounts in Dominican pesos) and stores it as a project.
#[derive(Debug, Parser)]
#[command(name = "estimator", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Storage backend (`sqlite` or `memory`).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string, e.g. `sqlite:estimator.db?mode=rwc`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Display language for material names and amounts (`es` or `en`).
    #[arg(long, global = true, value_parser = parse_locale)]
    locale: Option<Locale>,

    /// Log level or filter directive; `RUST_LOG` takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the active material catalog.
    Catalog,

    /// Price a project and optionally save it.
    Estimate {
        /// Built area in square meters.
        #[arg(long)]
        area: String,

        /// Project type.
        #[arg(long = "type", value_parser = parse_project_type, default_value = "residential")]
        project_type: ProjectType,

        /// Material to add, as ID or ID:QTY. Repeat for several materials.
        #[arg(long = "material", value_parser = parse_material_arg)]
        materials: Vec<MaterialArg>,

        /// Save the estimate as a project with this name.
        #[arg(long, requires = "owner")]
        save: Option<String>,

        /// Owner of the saved project.
        #[arg(long)]
        owner: Option<String>,
    },

    /// List saved projects of an owner.
    Projects {
        #[arg(long)]
        owner: String,
    },
}

fn parse_locale(s: &str) -> Result<Locale, String> {
    Locale::parse(s).ok_or_else(|| format!("unknown locale '{s}', expected es or en"))
}

fn parse_project_type(s: &str) -> Result<ProjectType, String> {
    ProjectType::parse(s)
        .ok_or_else(|| format!("unknown project type '{s}', expected residential or commercial"))
}

fn parse_owner(s: &str) -> anyhow::Result<OwnerId> {
    OwnerId::new(s).ok_or_else(|| anyhow::anyhow!("owner must not be empty"))
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.as_deref().unwrap_or("warn"));

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = AppConfig::load(&config_path)?.with_overrides(Overrides {
        backend: cli.backend,
        db: cli.db,
        locale: cli.locale,
        log_level: cli.log_level,
    });

    if !logging::env_filter_present() {
        logging::set_log_level(&config.log_level)?;
    }
    if let Some(path) = &config.log_file {
        if let Err(error) = logging::enable_file_logging(path) {
            warn!(%error, "file logging disabled");
        }
    }

    debug!(backend = %config.database.backend, "opening store");
    let registry = app::build_registry();
    let repo = registry.create(&config.database).await?;
    let timeout = config.store_timeout();

    let report = match cli.command {
        Command::Catalog => app::run_catalog(&*repo, config.locale, timeout).await?,
        Command::Estimate {
            area,
            project_type,
            materials,
            save,
            owner,
        } => {
            let owner = owner.as_deref().map(parse_owner).transpose()?;
            let command = EstimateCommand {
                area,
                project_type,
                materials,
                save_as: save,
                owner,
            };
            app::run_estimate(&*repo, command, config.locale, timeout).await?
        }
        Command::Projects { owner } => {
            app::run_projects(&*repo, &parse_owner(&owner)?, config.locale, timeout).await?
        }
    };

    print!("{report}");
    Ok(())
}
