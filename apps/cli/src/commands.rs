//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use ragcurate_core::{Curator, build_generator};
use ragcurate_shared::{
    AppConfig, GeneratorMode, config_file_path, init_config, init_config_at, load_config,
    load_config_from,
};
use ragcurate_storage::Storage;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ragcurate: collect and curate question/answer pairs.
#[derive(Parser)]
#[command(
    name = "ragcurate",
    version,
    about = "Annotate questions against candidate sources and curate the best answers.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.ragcurate/ragcurate.toml).
    #[arg(long, global = true, env = "RAGCURATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Apply migrations, then serve the annotation UI.
    Serve {
        /// Address to listen on.
        #[arg(long)]
        bind: Option<String>,

        /// Database file.
        #[arg(long)]
        db: Option<PathBuf>,

        /// Answer generator: simulated or chat.
        #[arg(long)]
        generator: Option<GeneratorMode>,
    },

    /// Apply pending database migrations and exit.
    Migrate {
        /// Database file.
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "ragcurate=info",
        1 => "ragcurate=debug,tower_http=debug",
        _ => "ragcurate=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Serve { bind, db, generator } => {
            let config = resolve_config(config_path)?;
            cmd_serve(apply_overrides(config, bind, db, generator)).await
        }
        Command::Migrate { db } => {
            let config = resolve_config(config_path)?;
            cmd_migrate(&apply_overrides(config, None, db, None)).await
        }
        Command::Config { action } => match action {
            // Runs before any config file exists.
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(&resolve_config(config_path)?),
        },
    }
}

/// Load the config file named on the command line, or the default one.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(p) if p.exists() => Ok(load_config_from(p)?),
        Some(p) => Err(eyre!("config file '{}' does not exist", p.display())),
        None => Ok(load_config()?),
    }
}

/// CLI flags win over config file values.
fn apply_overrides(
    mut config: AppConfig,
    bind: Option<String>,
    db: Option<PathBuf>,
    generator: Option<GeneratorMode>,
) -> AppConfig {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(db) = db {
        config.database.path = db;
    }
    if let Some(mode) = generator {
        config.generator.mode = mode;
    }
    config
}

async fn open_migrated(config: &AppConfig) -> Result<Storage> {
    let path = &config.database.path;
    let storage = Storage::open(path).await?;
    let applied = storage.migrate().await?;
    info!(
        db = %path.display(),
        applied,
        version = storage.schema_version().await,
        "database ready"
    );
    Ok(storage)
}

async fn cmd_serve(config: AppConfig) -> Result<()> {
    // Fail on a missing API key before touching the database.
    let generator = build_generator(&config.generator)?;
    let storage = open_migrated(&config).await?;

    let curator = Curator::new(Arc::new(storage), generator);
    println!("Serving on http://{}", config.server.bind);
    ragcurate_web::serve(&config.server.bind, curator).await?;
    Ok(())
}

async fn cmd_migrate(config: &AppConfig) -> Result<()> {
    let storage = open_migrated(config).await?;
    println!(
        "Database {} at schema version {}",
        config.database.path.display(),
        storage.schema_version().await
    );
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => {
            init_config_at(p)?;
            p.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    if let Ok(path) = config_file_path() {
        info!(path = %path.display(), "default config location");
    }
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_flags() {
        let cli = Cli::try_parse_from([
            "ragcurate", "-v", "serve", "--bind", "0.0.0.0:8080", "--db", "/tmp/x.db",
            "--generator", "chat",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Serve { bind, db, generator } => {
                assert_eq!(bind.as_deref(), Some("0.0.0.0:8080"));
                assert_eq!(db, Some(PathBuf::from("/tmp/x.db")));
                assert_eq!(generator, Some(GeneratorMode::Chat));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn rejects_unknown_generator() {
        let parsed = Cli::try_parse_from(["ragcurate", "serve", "--generator", "gpt"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn overrides_replace_only_given_values() {
        let base = AppConfig::default();
        let merged = apply_overrides(base.clone(), None, Some(PathBuf::from("other.db")), None);
        assert_eq!(merged.server.bind, base.server.bind);
        assert_eq!(merged.database.path, PathBuf::from("other.db"));
        assert_eq!(merged.generator.mode, GeneratorMode::Simulated);
    }

    #[tokio::test]
    async fn config_init_writes_explicit_path() {
        let dir = std::env::temp_dir().join(format!("ragcurate_cli_{}", std::process::id()));
        let path = dir.join("nested").join("ragcurate.toml");
        let _ = std::fs::remove_dir_all(&dir);

        let cli = Cli::try_parse_from([
            "ragcurate",
            "--config",
            path.to_str().expect("utf-8 temp path"),
            "config",
            "init",
        ])
        .expect("parse");
        run(cli).await.expect("config init");

        assert!(path.exists());
        let loaded = resolve_config(Some(&path)).expect("load written config");
        assert_eq!(loaded.server.bind, AppConfig::default().server.bind);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = resolve_config(Some(Path::new("/nonexistent/ragcurate.toml")));
        assert!(err.is_err());
    }
}
