use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_gauge, register_gauge_vec, CounterVec, Gauge, GaugeVec};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::services::restaurants::RestaurantService;

lazy_static! {
    // ── Event counters ──────────────────────────────────────────────────────
    pub static ref SEARCHES_COUNTER: CounterVec = register_counter_vec!(
        "api_searches_total",
        "Search requests by kind (list, nearby) and outcome",
        &["kind", "status"]
    ).unwrap();

    pub static ref ADMIN_WRITES_COUNTER: CounterVec = register_counter_vec!(
        "api_admin_writes_total",
        "Administrative writes by action",
        &["action"]
    ).unwrap();

    pub static ref NEARBY_RESULTS_GAUGE: Gauge = register_gauge!(
        "api_nearby_results",
        "Result count of the most recent nearby search"
    ).unwrap();

    // ── Catalogue size ──────────────────────────────────────────────────────
    pub static ref RESTAURANTS_GAUGE: GaugeVec = register_gauge_vec!(
        "restaurants_total",
        "Restaurant records by state (active, deleted)",
        &["state"]
    ).unwrap();
}

pub fn record_search(kind: &str, ok: bool) {
    SEARCHES_COUNTER
        .with_label_values(&[kind, if ok { "ok" } else { "rejected" }])
        .inc();
}

/// Spawn the background catalogue collector (refreshes every 5 minutes).
pub fn start(pool: PgPool) {
    tokio::spawn(async move {
        if let Err(e) = collect(&pool).await {
            warn!("Metrics: initial collection failed: {}", e);
        }
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    let (active, deleted) = RestaurantService::count_by_state(pool).await?;
    RESTAURANTS_GAUGE.with_label_values(&["active"]).set(active as f64);
    RESTAURANTS_GAUGE.with_label_values(&["deleted"]).set(deleted as f64);
    info!("Metrics: {} active / {} deleted restaurant(s)", active, deleted);
    Ok(())
}
