//! Slot availability engine.
//!
//! Pure functions over snapshots of a barber's schedule and existing
//! bookings; all I/O lives in `db.rs`. Callers read the inputs, compute
//! here, then act on the result. The Slot Reservation Guard
//! (`is_slot_available`) must be re-run against a freshly read booking
//! snapshot immediately before a booking row is written, so the window
//! between displaying availability and committing stays as small as the
//! storage round-trip.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;

/// Step between candidate slot starts (minutes).
pub const SLOT_STEP_MIN: i64 = 30;

/// Fallback open/close used when neither the barber nor the shop has
/// configured hours (hour, minute).
const FALLBACK_OPEN: (u32, u32) = (8, 0);
const FALLBACK_CLOSE: (u32, u32) = (18, 0);

// ── Input types ──

/// One weekday's recurring open window. `day_of_week`: 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone)]
pub struct WeeklyHours {
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

/// A non-cancelled booking as the engine sees it: an occupied interval.
/// Each booking occupies `[start, start + its own duration)` — the interval
/// is governed by the booked service, not by the request being checked.
#[derive(Debug, Clone)]
pub struct BookedInterval {
    pub booking_id: i64,
    pub barber_id: i64,
    pub start: NaiveDateTime,
    pub duration_min: i64,
}

impl BookedInterval {
    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(self.duration_min)
    }
}

/// Output unit: a candidate start time within a day, tagged bookable or not.
/// Unavailable slots are kept in the output so the caller can render them
/// as disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub time: String,
    pub available: bool,
}

/// Where the day's open window comes from, in priority order: the barber's
/// own schedule (with one-off closures), the shop default hours, or the
/// fixed fallback window.
#[derive(Debug, Clone)]
pub enum ScheduleSource {
    Barber {
        weekly: Vec<WeeklyHours>,
        blocked_dates: Vec<NaiveDate>,
    },
    BusinessDefault {
        weekly: Vec<WeeklyHours>,
    },
    Fallback,
}

impl ScheduleSource {
    /// Resolve the open window for `day`. `None` means the day is fully
    /// closed: a blocked date, a weekday marked unavailable, or no entry
    /// for that weekday at all.
    pub fn window_for(&self, day: NaiveDate) -> Option<(NaiveTime, NaiveTime)> {
        let weekday = weekday_index(day);
        match self {
            ScheduleSource::Barber {
                weekly,
                blocked_dates,
            } => {
                if blocked_dates.contains(&day) {
                    return None;
                }
                window_from_weekly(weekly, weekday)
            }
            ScheduleSource::BusinessDefault { weekly } => window_from_weekly(weekly, weekday),
            ScheduleSource::Fallback => Some((
                NaiveTime::from_hms_opt(FALLBACK_OPEN.0, FALLBACK_OPEN.1, 0).unwrap(),
                NaiveTime::from_hms_opt(FALLBACK_CLOSE.0, FALLBACK_CLOSE.1, 0).unwrap(),
            )),
        }
    }
}

fn window_from_weekly(weekly: &[WeeklyHours], weekday: u8) -> Option<(NaiveTime, NaiveTime)> {
    weekly
        .iter()
        .find(|e| e.day_of_week == weekday)
        .filter(|e| e.is_available)
        .map(|e| (e.start_time, e.end_time))
}

/// Slot-generation policy.
#[derive(Debug, Clone)]
pub struct SlotPolicy {
    /// Minutes between candidate starts.
    pub step_min: i64,
    /// When true (production behavior), a slot is offered as long as it
    /// starts before closing, even if the service would run past close.
    /// When false, slots whose end would pass closing are not generated.
    pub allow_overrun: bool,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            step_min: SLOT_STEP_MIN,
            allow_overrun: true,
        }
    }
}

// ── Errors ──

/// Malformed-input failures. "No availability" is never an error: an empty
/// slot list and a `false` guard result are ordinary return values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityError {
    InvalidDuration,
    NoCandidates,
    InvalidStep,
}

impl fmt::Display for AvailabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityError::InvalidDuration => {
                write!(f, "service duration must be a positive number of minutes")
            }
            AvailabilityError::NoCandidates => write!(f, "at least one barber id is required"),
            AvailabilityError::InvalidStep => write!(f, "slot step must be positive"),
        }
    }
}

impl std::error::Error for AvailabilityError {}

// ── Shared primitive ──

/// Weekday index with Sunday = 0, matching the schedule tables.
pub fn weekday_index(day: NaiveDate) -> u8 {
    day.weekday().num_days_from_sunday() as u8
}

/// Half-open interval overlap: `[a_start, a_end)` vs `[b_start, b_end)`.
/// Touching endpoints do not conflict, so back-to-back bookings are allowed.
fn overlaps(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

fn barber_has_conflict(
    barber_id: i64,
    start: NaiveDateTime,
    end: NaiveDateTime,
    bookings: &[BookedInterval],
    exclude_booking_ids: &[i64],
) -> bool {
    bookings.iter().any(|b| {
        b.barber_id == barber_id
            && !exclude_booking_ids.contains(&b.booking_id)
            && overlaps(start, end, b.start, b.end())
    })
}

// ── Availability Calculator ──

/// List all candidate slots for `day`, each tagged available or not.
///
/// With a single candidate barber this is the reschedule/admin view; with
/// several it answers "is ANY of them free" per slot. `bookings` must hold
/// the candidates' non-cancelled bookings whose start falls on `day`, each
/// carrying its own duration. `now` is the shop-local clock, used only to
/// gray out already-passed starts when `day` is today.
#[allow(clippy::too_many_arguments)]
pub fn compute_available_slots(
    day: NaiveDate,
    duration_min: i64,
    barber_ids: &[i64],
    bookings: &[BookedInterval],
    schedule: &ScheduleSource,
    exclude_booking_ids: &[i64],
    now: NaiveDateTime,
    policy: &SlotPolicy,
) -> Result<Vec<Slot>, AvailabilityError> {
    if duration_min <= 0 {
        return Err(AvailabilityError::InvalidDuration);
    }
    if barber_ids.is_empty() {
        return Err(AvailabilityError::NoCandidates);
    }
    if policy.step_min <= 0 {
        return Err(AvailabilityError::InvalidStep);
    }

    let (open, close) = match schedule.window_for(day) {
        Some(w) => w,
        None => return Ok(Vec::new()),
    };

    let close_dt = NaiveDateTime::new(day, close);
    let is_today = day == now.date();

    let mut slots = Vec::new();
    let mut t = open;
    while t < close {
        let new_start = NaiveDateTime::new(day, t);
        let new_end = new_start + Duration::minutes(duration_min);

        if policy.allow_overrun || new_end <= close_dt {
            let in_past = is_today && new_start < now;
            let available = !in_past
                && barber_ids.iter().any(|&id| {
                    !barber_has_conflict(id, new_start, new_end, bookings, exclude_booking_ids)
                });
            slots.push(Slot {
                time: t.format("%H:%M").to_string(),
                available,
            });
        }

        t += Duration::minutes(policy.step_min);
    }

    Ok(slots)
}

// ── Slot Reservation Guard ──

/// Authoritative conflict check, run right before a booking row is written.
///
/// `bookings` must be a *freshly read* snapshot of the barber's
/// non-cancelled bookings for the same calendar day as `proposed_start`.
/// `exclude_booking_ids` lets a reschedule skip the booking it is replacing,
/// so a booking never conflicts with itself.
pub fn is_slot_available(
    barber_id: i64,
    proposed_start: NaiveDateTime,
    duration_min: i64,
    bookings: &[BookedInterval],
    exclude_booking_ids: &[i64],
) -> Result<bool, AvailabilityError> {
    if duration_min <= 0 {
        return Err(AvailabilityError::InvalidDuration);
    }
    let proposed_end = proposed_start + Duration::minutes(duration_min);
    Ok(!barber_has_conflict(
        barber_id,
        proposed_start,
        proposed_end,
        bookings,
        exclude_booking_ids,
    ))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tm(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn dt(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::new(d(date), tm(time))
    }

    fn booking(id: i64, barber: i64, date: &str, start: &str, dur: i64) -> BookedInterval {
        BookedInterval {
            booking_id: id,
            barber_id: barber,
            start: dt(date, start),
            duration_min: dur,
        }
    }

    /// 2026-03-02 is a Monday.
    const MONDAY: &str = "2026-03-02";

    /// A `now` far before any test day, so no slot is "in the past".
    fn early_now() -> NaiveDateTime {
        dt("2026-01-01", "00:00")
    }

    fn monday_hours(start: &str, end: &str) -> ScheduleSource {
        ScheduleSource::Barber {
            weekly: vec![WeeklyHours {
                day_of_week: 1,
                start_time: tm(start),
                end_time: tm(end),
                is_available: true,
            }],
            blocked_dates: vec![],
        }
    }

    fn compute(
        duration: i64,
        barbers: &[i64],
        bookings: &[BookedInterval],
        schedule: &ScheduleSource,
    ) -> Vec<Slot> {
        compute_available_slots(
            d(MONDAY),
            duration,
            barbers,
            bookings,
            schedule,
            &[],
            early_now(),
            &SlotPolicy::default(),
        )
        .unwrap()
    }

    fn slot_by_time<'a>(slots: &'a [Slot], time: &str) -> &'a Slot {
        slots.iter().find(|s| s.time == time).unwrap()
    }

    // ── weekday_index ──

    #[test]
    fn test_weekday_index_sunday_is_zero() {
        assert_eq!(weekday_index(d("2026-03-01")), 0);
    }

    #[test]
    fn test_weekday_index_monday_is_one() {
        assert_eq!(weekday_index(d(MONDAY)), 1);
    }

    #[test]
    fn test_weekday_index_saturday_is_six() {
        assert_eq!(weekday_index(d("2026-03-07")), 6);
    }

    // ── slot generation ──

    #[test]
    fn test_open_day_yields_full_catalog() {
        let slots = compute(30, &[1], &[], &monday_hours("08:00", "18:00"));
        assert_eq!(slots.len(), 20);
        assert_eq!(slots[0].time, "08:00");
        assert_eq!(slots[19].time, "17:30");
        assert!(slots.iter().all(|s| s.available));
    }

    #[test]
    fn test_slots_are_chronological() {
        let slots = compute(30, &[1], &[], &monday_hours("08:00", "18:00"));
        let mut sorted = slots.clone();
        sorted.sort_by(|a, b| a.time.cmp(&b.time));
        assert_eq!(slots, sorted);
    }

    #[test]
    fn test_no_slot_starts_at_closing() {
        let slots = compute(30, &[1], &[], &monday_hours("10:00", "12:00"));
        assert_eq!(
            slots.iter().map(|s| s.time.as_str()).collect::<Vec<_>>(),
            vec!["10:00", "10:30", "11:00", "11:30"]
        );
    }

    #[test]
    fn test_fallback_window_catalog() {
        let slots = compute(30, &[1], &[], &ScheduleSource::Fallback);
        assert_eq!(slots.len(), 20);
        assert_eq!(slots[0].time, "08:00");
        assert_eq!(slots[19].time, "17:30");
    }

    #[test]
    fn test_business_default_hours_used() {
        let schedule = ScheduleSource::BusinessDefault {
            weekly: vec![WeeklyHours {
                day_of_week: 1,
                start_time: tm("09:00"),
                end_time: tm("13:00"),
                is_available: true,
            }],
        };
        let slots = compute(30, &[1], &[], &schedule);
        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0].time, "09:00");
        assert_eq!(slots[7].time, "12:30");
    }

    // ── closed days ──

    #[test]
    fn test_blocked_date_closes_day() {
        let schedule = ScheduleSource::Barber {
            weekly: vec![WeeklyHours {
                day_of_week: 1,
                start_time: tm("08:00"),
                end_time: tm("18:00"),
                is_available: true,
            }],
            blocked_dates: vec![d(MONDAY)],
        };
        assert!(compute(30, &[1], &[], &schedule).is_empty());
    }

    #[test]
    fn test_blocked_date_other_day_ignored() {
        let schedule = ScheduleSource::Barber {
            weekly: vec![WeeklyHours {
                day_of_week: 1,
                start_time: tm("08:00"),
                end_time: tm("18:00"),
                is_available: true,
            }],
            blocked_dates: vec![d("2026-03-09")],
        };
        assert_eq!(compute(30, &[1], &[], &schedule).len(), 20);
    }

    #[test]
    fn test_unavailable_weekday_closes_day() {
        let schedule = ScheduleSource::Barber {
            weekly: vec![WeeklyHours {
                day_of_week: 1,
                start_time: tm("08:00"),
                end_time: tm("18:00"),
                is_available: false,
            }],
            blocked_dates: vec![],
        };
        assert!(compute(30, &[1], &[], &schedule).is_empty());
    }

    #[test]
    fn test_missing_weekday_entry_closes_day() {
        // Schedule only covers Tuesday; requested day is Monday.
        let schedule = ScheduleSource::Barber {
            weekly: vec![WeeklyHours {
                day_of_week: 2,
                start_time: tm("08:00"),
                end_time: tm("18:00"),
                is_available: true,
            }],
            blocked_dates: vec![],
        };
        assert!(compute(30, &[1], &[], &schedule).is_empty());
    }

    #[test]
    fn test_blocked_date_overrides_even_with_bookings() {
        let schedule = ScheduleSource::Barber {
            weekly: vec![WeeklyHours {
                day_of_week: 1,
                start_time: tm("08:00"),
                end_time: tm("18:00"),
                is_available: true,
            }],
            blocked_dates: vec![d(MONDAY)],
        };
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 30)];
        assert!(compute(30, &[1], &bookings, &schedule).is_empty());
    }

    // ── conflicts ──

    #[test]
    fn test_existing_booking_blocks_only_overlapping_start() {
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 30)];
        let slots = compute(30, &[1], &bookings, &monday_hours("08:00", "18:00"));
        assert!(!slot_by_time(&slots, "10:00").available);
        assert!(slot_by_time(&slots, "09:30").available);
        assert!(slot_by_time(&slots, "10:30").available);
    }

    #[test]
    fn test_longer_service_conflicts_earlier_start() {
        // 60-minute request vs a 10:00–10:30 booking: 09:30–10:30 overlaps.
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 30)];
        let slots = compute(60, &[1], &bookings, &monday_hours("08:00", "18:00"));
        assert!(!slot_by_time(&slots, "09:30").available);
        assert!(!slot_by_time(&slots, "10:00").available);
        assert!(slot_by_time(&slots, "08:30").available);
        assert!(slot_by_time(&slots, "10:30").available);
    }

    #[test]
    fn test_booking_duration_governs_its_interval() {
        // A 90-minute booking at 10:00 occupies through 11:30.
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 90)];
        let slots = compute(30, &[1], &bookings, &monday_hours("08:00", "18:00"));
        assert!(!slot_by_time(&slots, "10:00").available);
        assert!(!slot_by_time(&slots, "10:30").available);
        assert!(!slot_by_time(&slots, "11:00").available);
        assert!(slot_by_time(&slots, "11:30").available);
    }

    #[test]
    fn test_unavailable_slots_still_listed() {
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 30)];
        let slots = compute(30, &[1], &bookings, &monday_hours("08:00", "18:00"));
        assert_eq!(slots.len(), 20);
    }

    #[test]
    fn test_multi_barber_any_free_wins() {
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 30)];
        let slots = compute(30, &[1, 2], &bookings, &monday_hours("08:00", "18:00"));
        // Barber 2 is free at 10:00.
        assert!(slot_by_time(&slots, "10:00").available);
    }

    #[test]
    fn test_multi_barber_all_busy_blocks_slot() {
        let bookings = vec![
            booking(1, 1, MONDAY, "10:00", 30),
            booking(2, 2, MONDAY, "10:00", 30),
        ];
        let slots = compute(30, &[1, 2], &bookings, &monday_hours("08:00", "18:00"));
        assert!(!slot_by_time(&slots, "10:00").available);
    }

    #[test]
    fn test_calculator_exclusion_frees_own_slot() {
        let bookings = vec![booking(7, 1, MONDAY, "10:00", 30)];
        let slots = compute_available_slots(
            d(MONDAY),
            30,
            &[1],
            &bookings,
            &monday_hours("08:00", "18:00"),
            &[7],
            early_now(),
            &SlotPolicy::default(),
        )
        .unwrap();
        assert!(slot_by_time(&slots, "10:00").available);
    }

    // ── past-time exclusion ──

    #[test]
    fn test_past_starts_marked_unavailable_today() {
        let now = dt(MONDAY, "12:15");
        let slots = compute_available_slots(
            d(MONDAY),
            30,
            &[1],
            &[],
            &monday_hours("08:00", "18:00"),
            &[],
            now,
            &SlotPolicy::default(),
        )
        .unwrap();
        assert!(!slot_by_time(&slots, "08:00").available);
        assert!(!slot_by_time(&slots, "12:00").available);
        assert!(slot_by_time(&slots, "12:30").available);
    }

    #[test]
    fn test_start_exactly_now_is_not_past() {
        let now = dt(MONDAY, "12:00");
        let slots = compute_available_slots(
            d(MONDAY),
            30,
            &[1],
            &[],
            &monday_hours("08:00", "18:00"),
            &[],
            now,
            &SlotPolicy::default(),
        )
        .unwrap();
        assert!(slot_by_time(&slots, "12:00").available);
    }

    #[test]
    fn test_future_day_has_no_past_exclusion() {
        // now is later in clock time but on an earlier date
        let now = dt("2026-03-01", "23:00");
        let slots = compute_available_slots(
            d(MONDAY),
            30,
            &[1],
            &[],
            &monday_hours("08:00", "18:00"),
            &[],
            now,
            &SlotPolicy::default(),
        )
        .unwrap();
        assert!(slots.iter().all(|s| s.available));
    }

    // ── overrun policy ──

    #[test]
    fn test_overrun_allowed_by_default() {
        // 60-minute service: 17:30 start runs past 18:00 close but is offered.
        let slots = compute(60, &[1], &[], &monday_hours("08:00", "18:00"));
        assert_eq!(slots.last().unwrap().time, "17:30");
        assert!(slots.last().unwrap().available);
    }

    #[test]
    fn test_overrun_disabled_truncates_catalog() {
        let policy = SlotPolicy {
            allow_overrun: false,
            ..SlotPolicy::default()
        };
        let slots = compute_available_slots(
            d(MONDAY),
            60,
            &[1],
            &[],
            &monday_hours("08:00", "18:00"),
            &[],
            early_now(),
            &policy,
        )
        .unwrap();
        assert_eq!(slots.last().unwrap().time, "17:00");
        assert_eq!(slots.len(), 19);
    }

    // ── input validation ──

    #[test]
    fn test_zero_duration_rejected() {
        let err = compute_available_slots(
            d(MONDAY),
            0,
            &[1],
            &[],
            &ScheduleSource::Fallback,
            &[],
            early_now(),
            &SlotPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(err, AvailabilityError::InvalidDuration);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let err = compute_available_slots(
            d(MONDAY),
            -30,
            &[1],
            &[],
            &ScheduleSource::Fallback,
            &[],
            early_now(),
            &SlotPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(err, AvailabilityError::InvalidDuration);
    }

    #[test]
    fn test_empty_candidates_rejected() {
        let err = compute_available_slots(
            d(MONDAY),
            30,
            &[],
            &[],
            &ScheduleSource::Fallback,
            &[],
            early_now(),
            &SlotPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(err, AvailabilityError::NoCandidates);
    }

    #[test]
    fn test_identical_inputs_identical_output() {
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 30)];
        let schedule = monday_hours("08:00", "18:00");
        let a = compute(30, &[1], &bookings, &schedule);
        let b = compute(30, &[1], &bookings, &schedule);
        assert_eq!(a, b);
    }

    // ── guard ──

    #[test]
    fn test_guard_rejects_overlap() {
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 30)];
        assert!(!is_slot_available(1, dt(MONDAY, "10:00"), 30, &bookings, &[]).unwrap());
    }

    #[test]
    fn test_guard_self_exclusion_for_reschedule() {
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 30)];
        assert!(is_slot_available(1, dt(MONDAY, "10:00"), 30, &bookings, &[1]).unwrap());
    }

    #[test]
    fn test_guard_allows_back_to_back_after() {
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 30)];
        assert!(is_slot_available(1, dt(MONDAY, "10:30"), 30, &bookings, &[]).unwrap());
    }

    #[test]
    fn test_guard_allows_back_to_back_before() {
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 30)];
        assert!(is_slot_available(1, dt(MONDAY, "09:30"), 30, &bookings, &[]).unwrap());
    }

    #[test]
    fn test_guard_is_duration_aware() {
        // The existing 90-minute booking still occupies 11:00.
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 90)];
        assert!(!is_slot_available(1, dt(MONDAY, "11:00"), 30, &bookings, &[]).unwrap());
        assert!(is_slot_available(1, dt(MONDAY, "11:30"), 30, &bookings, &[]).unwrap());
    }

    #[test]
    fn test_guard_rejects_surrounding_proposal() {
        let bookings = vec![booking(1, 1, MONDAY, "10:00", 30)];
        assert!(!is_slot_available(1, dt(MONDAY, "09:30"), 120, &bookings, &[]).unwrap());
    }

    #[test]
    fn test_guard_ignores_other_barbers() {
        let bookings = vec![booking(1, 2, MONDAY, "10:00", 30)];
        assert!(is_slot_available(1, dt(MONDAY, "10:00"), 30, &bookings, &[]).unwrap());
    }

    #[test]
    fn test_guard_invalid_duration() {
        let err = is_slot_available(1, dt(MONDAY, "10:00"), 0, &[], &[]).unwrap_err();
        assert_eq!(err, AvailabilityError::InvalidDuration);
    }

    #[test]
    fn test_guard_agrees_with_calculator() {
        // Every slot the calculator marks available in single-barber mode
        // must pass the guard against the same snapshot.
        let bookings = vec![
            booking(1, 1, MONDAY, "09:00", 60),
            booking(2, 1, MONDAY, "12:30", 90),
            booking(3, 1, MONDAY, "16:00", 30),
        ];
        let slots = compute(45, &[1], &bookings, &monday_hours("08:00", "18:00"));
        for slot in slots.iter().filter(|s| s.available) {
            let start = dt(MONDAY, &slot.time);
            assert!(
                is_slot_available(1, start, 45, &bookings, &[]).unwrap(),
                "guard rejected slot {} the calculator offered",
                slot.time
            );
        }
    }

    #[test]
    fn test_sequential_guarded_inserts_never_overlap() {
        // Admit bookings one at a time through the guard, then verify no
        // accepted pair overlaps.
        let attempts: &[(&str, i64)] = &[
            ("09:00", 60),
            ("09:30", 30), // overlaps the first
            ("10:00", 90),
            ("11:00", 30), // overlaps the third
            ("11:30", 30),
            ("11:30", 60), // exact start already taken
            ("12:00", 45),
        ];

        let mut accepted: Vec<BookedInterval> = Vec::new();
        for (i, (start, dur)) in attempts.iter().enumerate() {
            let start = dt(MONDAY, start);
            if is_slot_available(1, start, *dur, &accepted, &[]).unwrap() {
                accepted.push(BookedInterval {
                    booking_id: i as i64,
                    barber_id: 1,
                    start,
                    duration_min: *dur,
                });
            }
        }

        assert_eq!(accepted.len(), 4);
        for a in &accepted {
            for b in &accepted {
                if a.booking_id != b.booking_id {
                    assert!(
                        !overlaps(a.start, a.end(), b.start, b.end()),
                        "bookings {} and {} overlap",
                        a.booking_id,
                        b.booking_id
                    );
                }
            }
        }
    }
}
