//! # deployfig demo application
//!
//! A sample service entrypoint that shows how to wire
//! [deployfig](https://docs.rs/deployfig) into a real application. It does not
//! serve anything; it exists to demonstrate and manually verify deployfig's
//! behaviour.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example deployfig_demo -- show
//! cargo run --example deployfig_demo -- config list
//! ```
//!
//! The bundled `.env` selects `dev` and supplies a database password.
//!
//! ## Features demonstrated
//!
//! | Feature                 | How to exercise it                                                       |
//! |-------------------------|--------------------------------------------------------------------------|
//! | Stage selection         | `DEMO_ENV=prod cargo run --example deployfig_demo -- show`               |
//! | Missing selector        | Remove `DEMO_ENV` from `.env`, then run `show`                           |
//! | Override file           | Edit `demos/deployfig_demo/.env`                                         |
//! | Env beats override file | `DEMO_DB_PASSWORD=from-shell cargo run --example deployfig_demo -- show` |
//! | Field override          | `DEMO_HTTP_PORT=9999 cargo run --example deployfig_demo -- show`         |
//! | List override           | `DEMO_HTTP_ORIGINS=a.com,b.com cargo run --example deployfig_demo -- show` |
//! | Validation report       | `DEMO_PUBLIC_URL=nope DEMO_HTTP_PORT=0 cargo run --example deployfig_demo -- show` |
//! | `config list`           | `cargo run --example deployfig_demo -- config list`                      |
//! | `config get`            | `cargo run --example deployfig_demo -- config get http.port`             |
//! | `config gen`            | `cargo run --example deployfig_demo -- config gen`                       |
//! | Setup logging           | `cargo run --example deployfig_demo -- --verbose show`                   |

mod config;

use std::path::Path;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use deployfig::{ConfigArgs, Deployfig, DeployfigError, Snapshot, Stage};

use config::{DatabaseConfig, ServerConfig};

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// deployfig demo: a sample service entrypoint.
#[derive(Parser, Debug)]
#[command(name = "deployfig-demo")]
struct Cli {
    /// Log setup steps and env overrides.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Populate, validate and print both config structs.
    Show,
    /// Inspect the server config (list, get, gen).
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(verbose: bool) {
    let fallback = if verbose { "deployfig=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run setup against the demo's own directory.
///
/// Selector: `DEMO_ENV`. Defaults: `config/<stage>.yaml`. Override file: `.env`.
fn setup() -> Result<Snapshot, DeployfigError> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/deployfig_demo");

    Deployfig::setup()
        .env_prefix("DEMO_")
        .defaults(Stage::Dev, "config/dev.yaml")
        .defaults(Stage::Stage, "config/stage.yaml")
        .defaults(Stage::Prod, "config/prod.yaml")
        .override_file(".env")
        .start_dir(root)
        .load()
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn show() -> Result<(), DeployfigError> {
    let snapshot = deployfig::global::get().ok_or(DeployfigError::NotInstalled)?;
    let stage = snapshot
        .stage()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "<none>".into());
    println!("stage: {stage}");

    let server: ServerConfig = deployfig::global::load()?;
    println!("{} listening on {}:{}", server.name, server.http.host, server.http.port);
    println!("public url: {}", server.http.public_url.as_deref().unwrap_or_default());
    println!("origins: {}", server.http.origins.join(", "));

    let db: DatabaseConfig = deployfig::global::load()?;
    println!(
        "database: {} (pool {})",
        db.database.url.as_deref().unwrap_or_default(),
        db.database.pool_size
    );
    println!("database password: {:?}", db.database.password);
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let snapshot = setup().unwrap_or_else(|e| {
        eprintln!("Setup failed:\n{e}");
        std::process::exit(1);
    });

    match cli.command {
        Commands::Show => {
            // Installed globally so `show` can populate from anywhere.
            let _ = deployfig::global::install(snapshot);
            show().unwrap_or_else(|e| {
                eprintln!("Failed to load config:\n{e}");
                std::process::exit(1);
            });
        }
        Commands::Config(args) => {
            let action = args.into_action();
            snapshot
                .handle_and_print::<ServerConfig>(&action)
                .unwrap_or_else(|e| {
                    eprintln!("Config error:\n{e}");
                    std::process::exit(1);
                });
        }
    }
}
