use super::{SchedError, Scheduler};
use crate::model::{LocationId, Period, Shift, ShiftId, StaffId};
use crate::timezone;
use tracing::{info, warn};

/// Recopie les quarts de la semaine précédente d'un lieu sur la semaine courante.
///
/// Chaque copie est décalée de 7 jours en heure murale de son fuseau et garde
/// type, shérif et affectation prévue. Une copie identique (début, fin, shérif)
/// à un quart actif existant est ignorée; une copie dont le shérif serait en
/// conflit est importée sans shérif, et n'est pas réimportée ensuite.
/// Sans `commit`, rien n'est persisté.
pub(super) fn import_weekly_shifts(
    scheduler: &mut Scheduler,
    location: LocationId,
    commit: bool,
) -> Result<Vec<Shift>, SchedError> {
    let tz = scheduler.location_tz(location)?;
    let now = scheduler.now();
    let this_week = timezone::start_of_week(now, tz, scheduler.opts.week_start)?;
    let last_week = timezone::add_days_in_zone(this_week, tz, -7)?;

    let mut sources: Vec<&Shift> = scheduler
        .roster
        .shifts
        .iter()
        .filter(|s| {
            s.location_id == location
                && s.is_active(now)
                && s.start >= last_week
                && s.start < this_week
        })
        .collect();
    sources.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

    let mut imported: Vec<Shift> = Vec::new();
    for source in sources {
        let shift_tz = timezone::parse_tz(&source.timezone).unwrap_or(tz);
        let start = timezone::add_days_in_zone(source.start, shift_tz, 7)?;
        let end = timezone::add_days_in_zone(source.end, shift_tz, 7)?;
        if end <= start {
            return Err(SchedError::InvalidTimeRange);
        }

        let existing = || scheduler.roster.shifts.iter().chain(imported.iter());
        let already_there = |staff: &Option<StaffId>| {
            existing().any(|s| {
                s.location_id == location
                    && s.is_active(now)
                    && s.start == start
                    && s.end == end
                    && &s.staff_id == staff
            })
        };
        if already_there(&source.staff_id) {
            continue;
        }

        let busy = source.staff_id.as_ref().is_some_and(|staff| {
            existing().any(|s| s.is_assigned_to(staff) && s.is_active(now) && s.overlaps(start, end))
        });
        // une copie déjà importée sans shérif compte aussi
        if busy && already_there(&None) {
            continue;
        }
        let staff_id = if busy {
            warn!(source = %source.id, "imported shift left unassigned: staff conflict");
            None
        } else {
            source.staff_id.clone()
        };

        let copy = Shift {
            id: ShiftId::random(),
            start,
            end,
            staff_id,
            expiry: None,
            ..source.clone()
        };
        imported.push(copy);
    }

    if commit {
        info!(location = %location, count = imported.len(), "weekly shifts imported");
        scheduler.roster.shifts.extend(imported.iter().cloned());
    }
    Ok(imported)
}
