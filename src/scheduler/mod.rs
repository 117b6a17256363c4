mod assignment;
mod availability;
mod conflicts;
mod import;
mod mutate;
mod types;
mod util;

pub use mutate::merge_shift_update;
pub use types::{Conflict, ConflictKind, SchedError, ScheduleOptions};

use crate::clock::{Clock, SystemClock};
use crate::dto::ShiftDto;
use crate::model::{
    Assignment, DutyId, Location, LocationId, Period, Region, Roster, Shift, ShiftId, Staff,
    StaffId,
};
use crate::timezone;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

/// Scheduler : encapsule un Roster et applique les règles métier.
///
/// Chaque opération valide tout avant de muter: en cas d'erreur le roster
/// est laissé intact.
#[derive(Debug, Clone)]
pub struct Scheduler {
    roster: Roster,
    opts: ScheduleOptions,
    clock: Arc<dyn Clock>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_roster(Roster::default(), ScheduleOptions::default())
    }

    pub fn with_roster(roster: Roster, opts: ScheduleOptions) -> Self {
        Self {
            roster,
            opts,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock<C: Clock + 'static>(self, clock: C) -> Self {
        self.with_shared_clock(Arc::new(clock))
    }

    pub fn with_shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }
    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }
    pub fn into_roster(self) -> Roster {
        self.roster
    }
    pub fn options(&self) -> &ScheduleOptions {
        &self.opts
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn add_staff(&mut self, staff: Vec<Staff>) {
        self.roster.staff.extend(staff);
    }

    /// Ajoute ou remplace un lieu (même id).
    pub fn upsert_location(&mut self, location: Location) -> Result<(), SchedError> {
        if let Some(tz) = &location.timezone {
            timezone::parse_tz(tz)?;
        }
        match self.roster.locations.iter_mut().find(|l| l.id == location.id) {
            Some(existing) => *existing = location,
            None => self.roster.locations.push(location),
        }
        Ok(())
    }

    pub fn upsert_region(&mut self, region: Region) {
        match self.roster.regions.iter_mut().find(|r| r.id == region.id) {
            Some(existing) => *existing = region,
            None => self.roster.regions.push(region),
        }
    }

    pub fn upsert_assignment(&mut self, assignment: Assignment) -> Result<(), SchedError> {
        if self.roster.find_location(assignment.location_id).is_none() {
            return Err(SchedError::UnknownLocation(assignment.location_id.0));
        }
        match self.roster.assignments.iter_mut().find(|a| a.id == assignment.id) {
            Some(existing) => *existing = assignment,
            None => self.roster.assignments.push(assignment),
        }
        Ok(())
    }

    /// Fuseau effectif d'un lieu.
    pub fn location_tz(&self, location: LocationId) -> Result<Tz, SchedError> {
        let loc = self
            .roster
            .find_location(location)
            .ok_or(SchedError::UnknownLocation(location.0))?;
        match &loc.timezone {
            Some(tz) => timezone::parse_tz(tz),
            None => Ok(self.opts.default_timezone),
        }
    }

    pub fn add_shift(&mut self, input: &ShiftDto) -> Result<Shift, SchedError> {
        mutate::add_shift(self, input)
    }

    pub fn update_shift(&mut self, input: &ShiftDto) -> Result<Shift, SchedError> {
        mutate::update_shift(self, input)
    }

    pub fn expire_shift(&mut self, shift_id: &ShiftId) -> Result<(), SchedError> {
        mutate::expire_shift(self, shift_id)
    }

    pub fn set_duties(
        &mut self,
        shift_id: &ShiftId,
        duties: &[DutyId],
    ) -> Result<Shift, SchedError> {
        mutate::set_duties(self, shift_id, duties)
    }

    pub fn assign_to_shifts(
        &mut self,
        shift_ids: &[ShiftId],
        staff: &StaffId,
        override_conflicts: bool,
    ) -> Result<Vec<Shift>, SchedError> {
        assignment::assign_to_shifts(self, shift_ids, staff, override_conflicts)
    }

    pub fn availability(
        &self,
        location: LocationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Staff>, SchedError> {
        availability::availability(self, location, start, end)
    }

    pub fn availability_window(
        &self,
        location: LocationId,
        start: DateTime<Utc>,
        days: i64,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), SchedError> {
        availability::window(self, location, start, days)
    }

    pub fn import_weekly_shifts(
        &mut self,
        location: LocationId,
        commit: bool,
    ) -> Result<Vec<Shift>, SchedError> {
        import::import_weekly_shifts(self, location, commit)
    }

    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        conflicts::detect_conflicts(self)
    }

    /// Quarts actifs d'un lieu qui chevauchent `[start, end)`, triés par début.
    pub fn shifts_at(
        &self,
        location: LocationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Shift>, SchedError> {
        if end <= start {
            return Err(SchedError::InvalidTimeRange);
        }
        if self.roster.find_location(location).is_none() {
            return Err(SchedError::UnknownLocation(location.0));
        }
        let now = self.now();
        let mut out: Vec<Shift> = self
            .roster
            .shifts
            .iter()
            .filter(|s| s.location_id == location && s.is_active(now) && s.overlaps(start, end))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }
}
