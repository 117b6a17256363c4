use super::{conflicts, util, SchedError, Scheduler};
use crate::model::{Period, Shift, ShiftId, StaffId};
use tracing::{debug, warn};

/// Assigne un shérif à un lot de quarts.
///
/// Les chevauchements internes au lot sont refusés même avec `override_conflicts`.
/// Avec `override_conflicts`, le shérif est retiré des quarts existants en conflit.
pub(super) fn assign_to_shifts(
    scheduler: &mut Scheduler,
    shift_ids: &[ShiftId],
    staff: &StaffId,
    override_conflicts: bool,
) -> Result<Vec<Shift>, SchedError> {
    let mut ids: Vec<ShiftId> = Vec::with_capacity(shift_ids.len());
    for id in shift_ids {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    if ids.is_empty() {
        return Err(SchedError::EmptyRequest);
    }

    let person = scheduler
        .roster
        .find_staff_by_id(staff)
        .ok_or_else(|| SchedError::UnknownStaff(staff.as_str().to_string()))?;
    if !person.enabled {
        return Err(SchedError::BusinessRule(format!(
            "staff member {staff} is disabled"
        )));
    }

    let now = scheduler.now();
    let mut positions = Vec::with_capacity(ids.len());
    for id in &ids {
        let Some(pos) = util::find_shift_index(&scheduler.roster.shifts, id) else {
            return Err(SchedError::UnknownShift(id.as_str().to_string()));
        };
        if !scheduler.roster.shifts[pos].is_active(now) {
            return Err(SchedError::BusinessRule(format!("shift {id} is expired")));
        }
        positions.push(pos);
    }

    let candidates: Vec<&Shift> = positions
        .iter()
        .map(|&pos| &scheduler.roster.shifts[pos])
        .collect();

    let internal = conflicts::self_conflicts(staff, &candidates);
    if !internal.is_empty() {
        return Err(SchedError::Conflict {
            staff: staff.clone(),
            conflicts: internal,
        });
    }

    let windows: Vec<_> = candidates
        .iter()
        .map(|s| (s.id.clone(), s.start, s.end))
        .collect();
    let existing = conflicts::existing_conflicts(scheduler, staff, &windows, &ids, now);

    if !existing.is_empty() {
        if !override_conflicts {
            return Err(SchedError::Conflict {
                staff: staff.clone(),
                conflicts: existing,
            });
        }
        for conflict in &existing {
            if let Some(shift) = scheduler.roster.find_shift_mut(&conflict.shift_b) {
                if shift.staff_id.take().is_some() {
                    warn!(shift = %conflict.shift_b, staff = %staff, "override: staff removed from conflicting shift");
                }
            }
        }
    }

    let mut assigned = Vec::with_capacity(positions.len());
    for pos in positions {
        let shift = &mut scheduler.roster.shifts[pos];
        shift.staff_id = Some(staff.clone());
        assigned.push(shift.clone());
    }
    debug!(staff = %staff, count = assigned.len(), "shifts assigned");
    Ok(assigned)
}
