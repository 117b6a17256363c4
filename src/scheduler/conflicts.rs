use super::{util, Conflict, ConflictKind, Scheduler};
use crate::model::{Period, Shift, ShiftId, StaffId};
use chrono::{DateTime, Utc};

pub(super) fn detect_conflicts(scheduler: &Scheduler) -> Vec<Conflict> {
    let now = scheduler.now();
    let mut out = Vec::new();

    for staff in scheduler.roster.staff.iter() {
        let mut shifts: Vec<&Shift> =
            util::active_shifts_of(&scheduler.roster.shifts, &staff.id, &[], now).collect();
        shifts.sort_by_key(|s| s.start);

        for (idx, a) in shifts.iter().enumerate() {
            for b in shifts.iter().skip(idx + 1) {
                if util::overlaps(a.start, a.end, b.start, b.end) {
                    out.push(Conflict {
                        staff: staff.id.clone(),
                        shift_a: a.id.clone(),
                        shift_b: b.id.clone(),
                        kind: ConflictKind::Overlap,
                    });
                }
            }
        }
    }

    out
}

/// Paires de quarts candidats qui se chevauchent entre eux.
pub(super) fn self_conflicts(staff: &StaffId, candidates: &[&Shift]) -> Vec<Conflict> {
    let mut out = Vec::new();
    for (idx, a) in candidates.iter().enumerate() {
        for b in candidates.iter().skip(idx + 1) {
            if util::overlaps(a.start, a.end, b.start, b.end) {
                out.push(Conflict {
                    staff: staff.clone(),
                    shift_a: a.id.clone(),
                    shift_b: b.id.clone(),
                    kind: ConflictKind::SelfOverlap,
                });
            }
        }
    }
    out
}

/// Quarts actifs déjà assignés à `staff` (hors `exclude`) qui chevauchent un candidat.
pub(super) fn existing_conflicts(
    scheduler: &Scheduler,
    staff: &StaffId,
    candidates: &[(ShiftId, DateTime<Utc>, DateTime<Utc>)],
    exclude: &[ShiftId],
    now: DateTime<Utc>,
) -> Vec<Conflict> {
    let mut out = Vec::new();
    for existing in util::active_shifts_of(&scheduler.roster.shifts, staff, exclude, now) {
        for (id, start, end) in candidates {
            if existing.overlaps(*start, *end) {
                out.push(Conflict {
                    staff: staff.clone(),
                    shift_a: id.clone(),
                    shift_b: existing.id.clone(),
                    kind: ConflictKind::Overlap,
                });
            }
        }
    }
    out
}
