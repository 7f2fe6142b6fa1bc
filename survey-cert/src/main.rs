//! Point d'entrée CLI pour survey-cert

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Convertir des points levés (DMS) en dessin DXF UTM et gérer les certificats
#[derive(Parser)]
#[command(name = "survey-cert")]
#[command(author, version)]
#[command(about = "Convertir des points levés en DXF UTM et servir l'API des certificats")]
#[command(long_about = "Conversion de coordonnées WGS84 (degrés/minutes/secondes) en UTM avec génération d'un dessin DXF.\n\nLa commande 'serve' expose l'API HTTP (conversion + certificats PostgreSQL).")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Convert {
            input,
            output,
            values,
            report,
            config,
        } => {
            info!(input = %input.display(), output = %output.display(), "Convert to DXF");
            cli::cmd_convert(
                &input,
                &output,
                values.as_deref(),
                report.as_deref(),
                config.as_deref(),
            )
            .await?;
        }
        Commands::Serve {
            bind,
            origin,
            no_db,
            schema,
            config,
            db,
        } => {
            cli::cmd_serve(bind, origin, no_db, schema, config.as_deref(), db).await?;
        }
        Commands::InitDb {
            schema,
            drop_schema,
            db,
        } => {
            info!(schema = %schema, drop_schema, "Initialize database");
            cli::cmd_init_db(&schema, drop_schema, db).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
