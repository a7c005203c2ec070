use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cubeq::{parser, Catalog, ErrorPayload, Validator, ValidatorConfig};

#[derive(Parser)]
#[command(name = "cubeq")]
#[command(about = "Validate and normalize semantic-layer cube queries")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a query document and print its canonical form
    Validate {
        /// Query file (JSON, or YAML for .yaml/.yml)
        query: PathBuf,

        /// Cube catalog (YAML) to check identifiers against
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Validator config (YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Security context (JSON) to pass through with the query
        #[arg(long)]
        context: Option<PathBuf>,
    },
    /// List every measure and dimension of a catalog
    Meta {
        /// Cube catalog (YAML)
        #[arg(long)]
        catalog: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Commands::Validate {
            query,
            catalog,
            config,
            context,
        } => run_validate(query, catalog, config, context),
        Commands::Meta { catalog } => {
            let catalog = Catalog::from_file(&catalog)
                .with_context(|| format!("loading catalog {}", catalog.display()))?;
            println!("{}", serde_json::to_string_pretty(&catalog.meta())?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_validate(
    query: PathBuf,
    catalog: Option<PathBuf>,
    config: Option<PathBuf>,
    context: Option<PathBuf>,
) -> Result<ExitCode> {
    let config = match config {
        Some(path) => ValidatorConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ValidatorConfig::default(),
    };

    let mut validator = Validator::new(config);
    if let Some(path) = catalog {
        let catalog = Catalog::from_file(&path)
            .with_context(|| format!("loading catalog {}", path.display()))?;
        validator = validator.with_catalog(catalog);
    }

    let raw = parser::parse_query_file(&query)
        .with_context(|| format!("reading query {}", query.display()))?;
    let security_context = match context {
        Some(path) => Some(
            parser::parse_context_file(&path)
                .with_context(|| format!("parsing context {}", path.display()))?,
        ),
        None => None,
    };

    info!(query = %query.display(), "validating");
    let output = match security_context {
        Some(ctx) => validator
            .validate_request(&raw, ctx)
            .map(|req| serde_json::to_value(req)),
        None => validator.validate(&raw).map(|q| Ok(q.to_json())),
    };

    match output {
        Ok(json) => {
            println!("{}", serde_json::to_string_pretty(&json?)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&ErrorPayload::from(err))?);
            Ok(ExitCode::FAILURE)
        }
    }
}
