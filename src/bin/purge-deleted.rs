//! Hard-delete restaurants that have been soft-deleted for longer than the
//! retention window. Run daily (e.g. cron: 0 4 * * * /app/purge-deleted).
//!
//! Usage: purge-deleted [--days N] [--dry-run]

use chrono::{Duration, Utc};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use senbero_api::services::restaurants::RestaurantService;

#[derive(Parser)]
#[command(name = "purge-deleted", about = "Purge soft-deleted restaurants past retention")]
struct Args {
    /// Days a soft-deleted restaurant is kept before removal
    #[arg(long, default_value_t = 90)]
    days: i64,

    /// Only report how many records are past retention
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    if args.days < 0 {
        anyhow::bail!("--days must not be negative");
    }

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;

    let cutoff = Utc::now() - Duration::days(args.days);
    tracing::info!("Purging restaurants soft-deleted before {}", cutoff.to_rfc3339());

    if args.dry_run {
        let due: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM restaurants WHERE deleted_at IS NOT NULL AND deleted_at < $1",
        )
        .bind(cutoff)
        .fetch_one(&pool)
        .await?;
        tracing::info!("Dry run: {} restaurant(s) would be purged", due);
        return Ok(());
    }

    let purged = RestaurantService::purge_deleted(&pool, cutoff).await?;
    tracing::info!("Purged {} restaurant(s)", purged);
    Ok(())
}
