use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::SqlitePool;

use crate::availability::{BookedInterval, ScheduleSource, WeeklyHours};
use crate::models::{BusinessHours, ScheduleEntry};

pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    // Enable WAL mode for better concurrent access
    sqlx::query("PRAGMA journal_mode=WAL").execute(pool).await?;

    // Create migrations tracking table
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(pool)
    .await?;

    // Run 001_init only if not already applied
    let applied: bool =
        sqlx::query_scalar("SELECT COUNT(*) > 0 FROM _migrations WHERE name = '001_init'")
            .fetch_one(pool)
            .await?;

    if !applied {
        let migration_sql = include_str!("../migrations/001_init.sql");
        for statement in migration_sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed).execute(pool).await.ok();
            }
        }
        sqlx::query("INSERT INTO _migrations (name) VALUES ('001_init')")
            .execute(pool)
            .await?;
        tracing::info!("Applied migration: 001_init");
    }

    // 002: indexes, including the live-booking unique index that backstops
    // the reservation guard against exact same-start races.
    let indexes_applied: bool =
        sqlx::query_scalar("SELECT COUNT(*) > 0 FROM _migrations WHERE name = '002_indexes'")
            .fetch_one(pool)
            .await?;

    if !indexes_applied {
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_client_tg_id ON bookings(client_tg_id)")
            .execute(pool).await.ok();
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_date ON bookings(date)")
            .execute(pool).await.ok();
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings(status)")
            .execute(pool).await.ok();
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_barber_date ON bookings(barber_id, date)")
            .execute(pool).await.ok();
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_schedule_barber ON weekly_schedule(barber_id)")
            .execute(pool).await.ok();
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_blocked_barber ON blocked_dates(barber_id)")
            .execute(pool).await.ok();
        // Two live bookings can never share a barber and an exact start.
        // Duration-aware overlap stays the guard's job; this closes the
        // remaining read-then-write race for the common case.
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_barber_start_live
             ON bookings(barber_id, date, start_time)
             WHERE status IN ('pending_payment', 'confirmed')",
        )
        .execute(pool)
        .await
        .ok();

        sqlx::query("INSERT INTO _migrations (name) VALUES ('002_indexes')")
            .execute(pool)
            .await?;
        tracing::info!("Applied migration: 002_indexes");
    }

    tracing::info!("Database migrations up to date");
    Ok(())
}

// ── Engine input readers ──
//
// These are the availability engine's two collaborators: the schedule read
// and the bookings read. Everything returned here is a plain snapshot; the
// engine never touches the pool.

fn parse_hhmm(raw: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M").with_context(|| format!("bad time of day: {raw}"))
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("bad date: {raw}"))
}

/// Resolve the schedule source for one barber: their own weekly schedule +
/// blocked dates if configured, otherwise the shop defaults.
pub async fn schedule_source_for_barber(
    pool: &SqlitePool,
    barber_id: i64,
) -> anyhow::Result<ScheduleSource> {
    let entries = sqlx::query_as::<_, ScheduleEntry>(
        "SELECT id, barber_id, day_of_week, start_time, end_time, is_available
         FROM weekly_schedule WHERE barber_id = ?",
    )
    .bind(barber_id)
    .fetch_all(pool)
    .await?;

    if entries.is_empty() {
        return default_schedule_source(pool).await;
    }

    let mut weekly = Vec::with_capacity(entries.len());
    for e in &entries {
        weekly.push(WeeklyHours {
            day_of_week: e.day_of_week as u8,
            start_time: parse_hhmm(&e.start_time)?,
            end_time: parse_hhmm(&e.end_time)?,
            is_available: e.is_available,
        });
    }

    let blocked_raw: Vec<String> =
        sqlx::query_scalar("SELECT date FROM blocked_dates WHERE barber_id = ?")
            .bind(barber_id)
            .fetch_all(pool)
            .await?;
    let mut blocked_dates = Vec::with_capacity(blocked_raw.len());
    for raw in &blocked_raw {
        blocked_dates.push(parse_date(raw)?);
    }

    Ok(ScheduleSource::Barber {
        weekly,
        blocked_dates,
    })
}

/// Shop default hours, or the fixed fallback window when none are set.
pub async fn default_schedule_source(pool: &SqlitePool) -> anyhow::Result<ScheduleSource> {
    let rows = sqlx::query_as::<_, BusinessHours>(
        "SELECT day_of_week, start_time, end_time, is_open FROM business_hours",
    )
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(ScheduleSource::Fallback);
    }

    let mut weekly = Vec::with_capacity(rows.len());
    for r in &rows {
        weekly.push(WeeklyHours {
            day_of_week: r.day_of_week as u8,
            start_time: parse_hhmm(&r.start_time)?,
            end_time: parse_hhmm(&r.end_time)?,
            is_available: r.is_open,
        });
    }

    Ok(ScheduleSource::BusinessDefault { weekly })
}

/// Non-cancelled bookings starting on `date` for the given barbers, parsed
/// into engine intervals. Expired (unpaid) bookings free their time too.
pub async fn bookings_for_day(
    pool: &SqlitePool,
    barber_ids: &[i64],
    date: &str,
) -> anyhow::Result<Vec<BookedInterval>> {
    let day = parse_date(date)?;

    let rows = sqlx::query_as::<_, (i64, i64, String, i64)>(
        "SELECT id, barber_id, start_time, duration_min FROM bookings
         WHERE date = ? AND status NOT IN ('cancelled', 'expired')",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    let mut intervals = Vec::with_capacity(rows.len());
    for (id, barber_id, start_raw, duration_min) in rows {
        if !barber_ids.contains(&barber_id) {
            continue;
        }
        intervals.push(BookedInterval {
            booking_id: id,
            barber_id,
            start: NaiveDateTime::new(day, parse_hhmm(&start_raw)?),
            duration_min,
        });
    }
    Ok(intervals)
}

/// Active barber ids in display order, for "any barber" availability mode.
pub async fn active_barber_ids(pool: &SqlitePool) -> anyhow::Result<Vec<i64>> {
    let ids =
        sqlx::query_scalar("SELECT id FROM barbers WHERE is_active = 1 ORDER BY sort_order ASC")
            .fetch_all(pool)
            .await?;
    Ok(ids)
}
