use super::{conflicts, util, SchedError, Scheduler};
use crate::dto::ShiftDto;
use crate::model::{DutyId, Period, Shift, ShiftId, StaffId};
use crate::timezone;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Copie sur `persisted` les seuls champs modifiables de `input`:
/// type, début, fin, shérif, affectation prévue.
///
/// Lieu, expiration, fuseau, tâches et objets imbriqués restent ceux persistés.
pub fn merge_shift_update(persisted: &Shift, input: &ShiftDto) -> Shift {
    Shift {
        shift_type: input.shift_type,
        start: input.start_utc(),
        end: input.end_utc(),
        staff_id: input.sheriff_id.clone(),
        anticipated_assignment_id: input.anticipated_assignment_id,
        ..persisted.clone()
    }
}

pub(super) fn add_shift(scheduler: &mut Scheduler, input: &ShiftDto) -> Result<Shift, SchedError> {
    let location_tz = scheduler.location_tz(input.location_id)?;
    let tz_name = match input.timezone.as_deref().map(str::trim) {
        Some(tz) if !tz.is_empty() => timezone::parse_tz(tz)?.name().to_string(),
        _ => location_tz.name().to_string(),
    };

    let mut shift = Shift::new(
        input.shift_type,
        input.location_id,
        input.start_utc(),
        input.end_utc(),
        tz_name,
    )
    .map_err(|_| SchedError::InvalidTimeRange)?;
    shift.staff_id = input.sheriff_id.clone();
    shift.anticipated_assignment_id = input.anticipated_assignment_id;

    validate_links(scheduler, &shift)?;
    let now = scheduler.now();
    if let Some(staff) = &shift.staff_id {
        check_staff_free(scheduler, staff, &shift, now)?;
    }

    info!(shift = %shift.id, location = %shift.location_id, "shift added");
    scheduler.roster.shifts.push(shift.clone());
    Ok(shift)
}

pub(super) fn update_shift(
    scheduler: &mut Scheduler,
    input: &ShiftDto,
) -> Result<Shift, SchedError> {
    let id = input.id.as_ref().ok_or(SchedError::MissingId)?;
    let Some(pos) = util::find_shift_index(&scheduler.roster.shifts, id) else {
        return Err(SchedError::UnknownShift(id.as_str().to_string()));
    };

    let now = scheduler.now();
    let persisted = &scheduler.roster.shifts[pos];
    if !persisted.is_active(now) {
        return Err(SchedError::BusinessRule(format!("shift {id} is expired")));
    }

    let updated = merge_shift_update(persisted, input);
    if updated.end <= updated.start {
        return Err(SchedError::InvalidTimeRange);
    }
    validate_links(scheduler, &updated)?;
    if let Some(staff) = &updated.staff_id {
        check_staff_free(scheduler, staff, &updated, now)?;
    }

    debug!(shift = %updated.id, "shift updated");
    scheduler.roster.shifts[pos] = updated.clone();
    Ok(updated)
}

/// Expiration logique: le quart n'est jamais supprimé.
pub(super) fn expire_shift(scheduler: &mut Scheduler, shift_id: &ShiftId) -> Result<(), SchedError> {
    let now = scheduler.now();
    let shift = scheduler
        .roster
        .find_shift_mut(shift_id)
        .ok_or_else(|| SchedError::UnknownShift(shift_id.as_str().to_string()))?;
    if shift.is_active(now) {
        shift.expiry = Some(now);
        info!(shift = %shift_id, "shift expired");
    }
    Ok(())
}

/// Remplace les tâches d'un quart actif (triées, sans doublon).
///
/// Seul chemin d'écriture des tâches: l'ajout et la mise à jour les ignorent.
pub(super) fn set_duties(
    scheduler: &mut Scheduler,
    shift_id: &ShiftId,
    duties: &[DutyId],
) -> Result<Shift, SchedError> {
    let now = scheduler.now();
    let shift = scheduler
        .roster
        .find_shift_mut(shift_id)
        .ok_or_else(|| SchedError::UnknownShift(shift_id.as_str().to_string()))?;
    if !shift.is_active(now) {
        return Err(SchedError::BusinessRule(format!("shift {shift_id} is expired")));
    }
    let mut duties = duties.to_vec();
    duties.sort_unstable();
    duties.dedup();
    shift.duties = duties;
    debug!(shift = %shift_id, count = shift.duties.len(), "shift duties set");
    Ok(shift.clone())
}

fn validate_links(scheduler: &Scheduler, shift: &Shift) -> Result<(), SchedError> {
    if let Some(staff) = &shift.staff_id {
        let person = scheduler
            .roster
            .find_staff_by_id(staff)
            .ok_or_else(|| SchedError::UnknownStaff(staff.as_str().to_string()))?;
        if !person.enabled {
            return Err(SchedError::BusinessRule(format!(
                "staff member {staff} is disabled"
            )));
        }
    }
    if let Some(assignment) = shift.anticipated_assignment_id {
        if scheduler.roster.find_assignment(assignment).is_none() {
            return Err(SchedError::UnknownAssignment(assignment.0));
        }
    }
    Ok(())
}

fn check_staff_free(
    scheduler: &Scheduler,
    staff: &StaffId,
    shift: &Shift,
    now: DateTime<Utc>,
) -> Result<(), SchedError> {
    let window = [(shift.id.clone(), shift.start, shift.end)];
    let found = conflicts::existing_conflicts(
        scheduler,
        staff,
        &window,
        std::slice::from_ref(&shift.id),
        now,
    );
    if found.is_empty() {
        Ok(())
    } else {
        Err(SchedError::Conflict {
            staff: staff.clone(),
            conflicts: found,
        })
    }
}
