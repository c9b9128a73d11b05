//! Overdue-dose detection.
//!
//! A read-only projection over pending administration records joined with
//! their active orders, plus a background poller that re-evaluates it on a
//! fixed interval. The projection never mutates anything and is safe to
//! call from any number of sessions concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{get_order, pending_records};
use crate::db::DatabaseError;
use crate::models::enums::OrderStatus;
use crate::models::AdministrationRecord;

/// Tolerance after the scheduled time before a dose counts as overdue.
pub const DEFAULT_GRACE_PERIOD_MINUTES: i64 = 60;

/// Poll interval for the background sweep, within the recommended
/// 2–5 minute band.
pub const RECOMMENDED_POLL_INTERVAL: StdDuration = StdDuration::from_secs(3 * 60);

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY: StdDuration = StdDuration::from_millis(50);

/// One overdue pending dose, joined with its order for display.
#[derive(Debug, Clone, Serialize)]
pub struct OverdueEntry {
    pub record: AdministrationRecord,
    pub order_name: String,
    pub dose: String,
    pub route: String,
    pub minutes_overdue: i64,
    pub high_risk: bool,
}

/// Pending doses past their grace period, most overdue first.
///
/// A record qualifies when `now > scheduled_time + grace` and its order is
/// still active. With a grace of zero this is every pending record whose
/// scheduled time has passed; growing the grace can only shrink the list.
pub fn overdue_list(
    conn: &Connection,
    patient_id: Option<&Uuid>,
    grace_minutes: i64,
    now: NaiveDateTime,
) -> Result<Vec<OverdueEntry>, DatabaseError> {
    let mut entries = Vec::new();

    // pending_records returns oldest schedule first, which is exactly
    // most-overdue-first here.
    for record in pending_records(conn, patient_id)? {
        if now <= record.scheduled_time + Duration::minutes(grace_minutes) {
            continue;
        }
        let order = get_order(conn, &record.order_id)?;
        if order.status != OrderStatus::Active {
            continue;
        }

        let minutes_overdue = (now - record.scheduled_time).num_minutes();
        entries.push(OverdueEntry {
            record,
            order_name: order.name,
            dose: order.dose,
            route: order.route,
            minutes_overdue,
            high_risk: order.is_high_risk || order.is_controlled_substance,
        });
    }

    Ok(entries)
}

/// Background thread that sweeps `overdue_list` on a fixed interval.
///
/// `stop()` (or dropping the handle) sets the shutdown flag and joins the
/// thread, so no timer outlives the owning context.
pub struct OverduePoller {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl OverduePoller {
    /// Start sweeping on a dedicated connection. The first sweep runs
    /// immediately; each sweep's entries go to `on_sweep`.
    pub fn start<F>(
        conn: Connection,
        patient_id: Option<Uuid>,
        grace_minutes: i64,
        interval: StdDuration,
        on_sweep: F,
    ) -> Self
    where
        F: Fn(Vec<OverdueEntry>) + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();

        let handle = std::thread::spawn(move || {
            tracing::info!(interval_secs = interval.as_secs(), "overdue poller started");
            poll_loop(&conn, patient_id.as_ref(), grace_minutes, interval, &flag, &on_sweep);
            tracing::info!("overdue poller stopped");
        });

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Request shutdown and wait for the sweep thread to exit.
    pub fn stop(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for OverduePoller {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn poll_loop<F>(
    conn: &Connection,
    patient_id: Option<&Uuid>,
    grace_minutes: i64,
    interval: StdDuration,
    shutdown: &AtomicBool,
    on_sweep: &F,
) where
    F: Fn(Vec<OverdueEntry>),
{
    while !shutdown.load(Ordering::Relaxed) {
        let now = chrono::Utc::now().naive_utc();
        match overdue_list(conn, patient_id, grace_minutes, now) {
            Ok(entries) => on_sweep(entries),
            Err(e) => tracing::warn!(error = %e, "overdue sweep failed"),
        }

        // Sleep in small increments for responsive shutdown
        let mut slept = StdDuration::ZERO;
        while slept < interval {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            let slice = SLEEP_GRANULARITY.min(interval - slept);
            std::thread::sleep(slice);
            slept += slice;
        }
    }
}
