use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;

use crate::engine::stats::{LeaveTypeStats, compute_year_stats};
use crate::model::leave_request::LeaveType;
use crate::store::LeaveStore;
use crate::store::mysql::MySqlStore;

/// Per-type leave day totals keyed by (employee_id, year). Entries are
/// dropped on every mutation touching the span, the TTL catches whatever
/// slips through.
pub static STATS_CACHE: Lazy<Cache<(u64, i32), HashMap<LeaveType, LeaveTypeStats>>> =
    Lazy::new(|| {
        Cache::builder()
            .max_capacity(10_000) // one entry per employee-year
            .time_to_live(Duration::from_secs(300)) // 5 min TTL
            .build()
    });

pub async fn lookup(employee_id: u64, year: i32) -> Option<HashMap<LeaveType, LeaveTypeStats>> {
    STATS_CACHE.get(&(employee_id, year)).await
}

pub async fn store(employee_id: u64, year: i32, stats: HashMap<LeaveType, LeaveTypeStats>) {
    STATS_CACHE.insert((employee_id, year), stats).await;
}

/// Drop the cached years a request span touches.
pub async fn invalidate_span(employee_id: u64, start: NaiveDate, end: NaiveDate) {
    STATS_CACHE.invalidate(&(employee_id, start.year())).await;
    if end.year() != start.year() {
        STATS_CACHE.invalidate(&(employee_id, end.year())).await;
    }
}

/// Pre-compute current-year stats for every employee with leave activity
/// this year, so dashboard widgets hit warm entries right after startup.
pub async fn warmup_stats_cache(pool: &MySqlPool, year: i32) -> Result<()> {
    let store = MySqlStore::new(pool.clone());
    let mut stream = sqlx::query_scalar::<_, u64>(
        r#"
        SELECT DISTINCT employee_id
        FROM leave_requests
        WHERE YEAR(start_date) = ?
        "#,
    )
    .bind(year)
    .fetch(pool);

    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let employee_id = row?;
        let requests = store.query_by_year(employee_id, year).await?;
        STATS_CACHE
            .insert((employee_id, year), compute_year_stats(&requests))
            .await;
        total_count += 1;
    }

    log::info!(
        "Leave stats warmup complete: {} employees for year {}",
        total_count,
        year
    );

    Ok(())
}
