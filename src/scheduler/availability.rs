use super::{SchedError, Scheduler};
use crate::model::{LocationId, Period, Staff, StaffId};
use crate::timezone;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

/// Shérifs libres au lieu `location` sur `[start, end)`.
///
/// Exclus: désactivés, rattachés à un autre lieu, ou ayant un congé, une
/// formation, un détachement ou un quart (n'importe quel lieu) actif qui
/// chevauche la fenêtre. Tri: nom, prénom, id.
pub(super) fn availability(
    scheduler: &Scheduler,
    location: LocationId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Staff>, SchedError> {
    if end <= start {
        return Err(SchedError::InvalidTimeRange);
    }
    if scheduler.roster.find_location(location).is_none() {
        return Err(SchedError::UnknownLocation(location.0));
    }
    let now = scheduler.now();

    let busy: HashSet<&StaffId> = scheduler
        .roster
        .shifts
        .iter()
        .filter(|s| s.is_active(now) && s.overlaps(start, end))
        .filter_map(|s| s.staff_id.as_ref())
        .collect();

    let mut out: Vec<Staff> = scheduler
        .roster
        .staff
        .iter()
        .filter(|p| p.enabled)
        .filter(|p| p.home_location_id.map_or(true, |home| home == location))
        .filter(|p| !busy.contains(&p.id))
        .filter(|p| !p.is_absent(start, end, now))
        .cloned()
        .collect();

    out.sort_by(|a, b| {
        a.last_name
            .cmp(&b.last_name)
            .then_with(|| a.first_name.cmp(&b.first_name))
            .then_with(|| a.id.cmp(&b.id))
    });
    debug!(location = %location, available = out.len(), "availability computed");
    Ok(out)
}

/// Fenêtre `[start, start + days)` où les jours sont comptés en heure murale du lieu.
pub(super) fn window(
    scheduler: &Scheduler,
    location: LocationId,
    start: DateTime<Utc>,
    days: i64,
) -> Result<(DateTime<Utc>, DateTime<Utc>), SchedError> {
    if days <= 0 {
        return Err(SchedError::InvalidTimeRange);
    }
    let tz = scheduler.location_tz(location)?;
    let end = timezone::add_days_in_zone(start, tz, days)?;
    Ok((start, end))
}
