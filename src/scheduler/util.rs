use crate::model::{Period, Shift, ShiftId, StaffId};
use chrono::{DateTime, Utc};

pub(super) use crate::model::overlaps;

pub(super) fn find_shift_index(shifts: &[Shift], shift_id: &ShiftId) -> Option<usize> {
    shifts.iter().position(|s| &s.id == shift_id)
}

/// Quarts actifs assignés à `staff`, hors `exclude`.
pub(super) fn active_shifts_of<'a>(
    shifts: &'a [Shift],
    staff: &'a StaffId,
    exclude: &'a [ShiftId],
    now: DateTime<Utc>,
) -> impl Iterator<Item = &'a Shift> + 'a {
    shifts
        .iter()
        .filter(move |s| s.is_assigned_to(staff) && s.is_active(now) && !exclude.contains(&s.id))
}
