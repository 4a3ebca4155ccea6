use anyhow::Result;
use clap::{Parser, Subcommand};
use steamwatch::api::ApiServer;
use steamwatch::collectors::steam::SteamCollector;
use steamwatch::collectors::toplist::ToplistSync;
use steamwatch::database_ops::db::Db;
use steamwatch::database_ops::tracking;
use steamwatch::util::env as env_util;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "steamwatch", version, about = "Steam price tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Run the HTTP API server
    Serve,
    /// Collect current prices and metadata for tracked games
    CollectPrices {
        /// Comma-separated app ids (defaults to the tracked list in the store)
        #[arg(long, value_delimiter = ',')]
        app_ids: Option<Vec<i64>>,
    },
    /// Refresh the tracked-games list from the top-sellers pages
    SyncGames {
        /// How many search pages to walk (~25 games per page)
        #[arg(long, default_value_t = 40)]
        max_pages: u32,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    steamwatch::logging::init_tracing("info,sqlx=warn")?;
    env_util::init_env();

    let cli = Cli::parse();

    let database_url = env_util::db_url()?;
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 10u32);
    let db = Db::connect(&database_url, max_connections).await?;

    match cli.command {
        Commands::Serve => {
            let server = ApiServer::from_env()?;
            server.run(db).await?;
        }
        Commands::CollectPrices { app_ids } => {
            let collector = SteamCollector::from_env()?;
            let ids = match app_ids {
                Some(ids) if !ids.is_empty() => ids,
                _ => tracking::active_tracked_ids(&db).await?,
            };
            if ids.is_empty() {
                warn!("nothing to collect; run sync-games first or pass --app-ids");
                return Ok(());
            }
            let summary = collector.collect(&db, &ids).await?;
            info!(
                attempted = summary.attempted,
                priced = summary.priced,
                metadata_only = summary.metadata_only,
                failed = summary.failed,
                "done"
            );
        }
        Commands::SyncGames { max_pages } => {
            let collector = SteamCollector::from_env()?;
            let sync = ToplistSync::new(max_pages)?;
            let summary = sync.sync(&db, &collector).await?;
            info!(
                discovered = summary.discovered,
                added = summary.added,
                already_tracked = summary.already_tracked,
                skipped_free = summary.skipped_free,
                failed = summary.failed,
                "done"
            );
        }
    }

    Ok(())
}
