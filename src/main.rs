use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

mod auth;
mod config;
mod data;
mod db;
mod matching;
mod models;
mod report;
mod session;
mod status;
mod store;
mod vcard;
mod web;

use config::{ServeArgs, ServerConfig, SessionBackend, StoreArgs};
use session::{MemorySessionStore, SessionStore};

#[derive(Parser)]
#[command(name = "learning-on-matcher")]
#[command(about = "Matches Learning On tutoring teachers with students", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coordinator web app
    Serve {
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        serve: ServeArgs,
    },
    /// Create or upgrade the session schema
    InitDb {
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        database_url: String,
    },
    /// Rank candidate students for one teacher
    Rank {
        #[command(flatten)]
        store: StoreArgs,
        /// Teacher name or row index
        #[arg(long)]
        teacher: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report of the matching state
    Report {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

async fn connect(database_url: &str) -> anyhow::Result<sqlx::PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn sessions(args: &ServeArgs) -> anyhow::Result<Arc<dyn SessionStore>> {
    match args.sessions {
        SessionBackend::Memory => {
            info!("Keeping sessions in memory");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        SessionBackend::Postgres => {
            let Some(database_url) = &args.database_url else {
                bail!("DATABASE_URL must be set for Postgres sessions");
            };
            let pool = connect(database_url).await?;
            let store = db::PgSessionStore::new(pool);
            let purged = store.purge_expired().await?;
            info!("Keeping sessions in Postgres, purged {purged} expired");
            Ok(Arc::new(store))
        }
    }
}

async fn serve(store: StoreArgs, args: ServeArgs) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let layout = store.layout()?;
    let rows = store.open(client.clone())?;

    let (Some(client_id), Some(client_secret)) =
        (store.google_client_id.clone(), store.google_client_secret.clone())
    else {
        bail!("GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set for sign-in");
    };

    let config = ServerConfig::from(&args);
    let identity = auth::GoogleOAuth::new(
        client,
        client_id,
        client_secret,
        auth::callback_url(&config.public_url),
    );

    let state = Arc::new(web::AppState {
        sessions: sessions(&args).await?,
        config,
        layout,
        store: rows,
        identity: Arc::new(identity),
    });

    web::start_server(state).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { store, serve: args } => serve(store, args).await?,
        Commands::InitDb { database_url } => {
            let pool = connect(&database_url).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Rank {
            store,
            teacher,
            limit,
        } => {
            let layout = store.layout()?;
            let rows = store.open(reqwest::Client::new())?;
            let snapshot = data::load_snapshot(rows.as_ref(), &layout)
                .await
                .context("failed to load the spreadsheet")?;

            let found = teacher
                .parse::<usize>()
                .ok()
                .and_then(|index| snapshot.teacher(index))
                .or_else(|| snapshot.teachers.iter().find(|t| t.name == teacher));
            let Some(found) = found else {
                bail!("no teacher named {teacher}");
            };

            let candidates = matching::rank_candidates(&snapshot.students, found);
            if candidates.as_slice().is_empty() {
                println!("No candidate students for {}.", found.name);
                return Ok(());
            }

            if candidates.is_matched() {
                println!("{} is already matched:", found.name);
            } else {
                println!("Top students for {}:", found.name);
            }
            for candidate in candidates.as_slice().iter().take(limit) {
                let student = candidate.student;
                println!(
                    "- {} ({}, {}) score {} for {} / {}",
                    student.name,
                    student.city,
                    student.student_class,
                    candidate.score,
                    student.primary_subject,
                    student.secondary_subject
                );
            }
        }
        Commands::Report { store, out } => {
            let layout = store.layout()?;
            let rows = store.open(reqwest::Client::new())?;
            let snapshot = data::load_snapshot(rows.as_ref(), &layout)
                .await
                .context("failed to load the spreadsheet")?;

            let report = report::build_report(chrono::Local::now().date_naive(), &snapshot);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
