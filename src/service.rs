//! Couche service: une requête = une transaction sur le stockage.
//!
//! Les requêtes sont sérialisées par un verrou en mémoire puis par le verrou
//! exclusif du stockage (fichier `.lock` pour `JsonStorage`, donc entre
//! processus). Le roster est rechargé sous verrou et n'est sauvegardé que si
//! l'opération réussit.

use crate::clock::{Clock, SystemClock};
use crate::dto::ShiftDto;
use crate::model::{DutyId, LocationId, Roster, Shift, ShiftId, Staff, StaffId};
use crate::scheduler::{Conflict, SchedError, ScheduleOptions, Scheduler};
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub struct RosterService<S: Storage> {
    storage: S,
    opts: ScheduleOptions,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl<S: Storage> RosterService<S> {
    pub fn new(storage: S, opts: ScheduleOptions) -> Self {
        Self {
            storage,
            opts,
            clock: Arc::new(SystemClock),
            lock: Mutex::new(()),
        }
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn scheduler(&self, roster: Roster) -> Scheduler {
        Scheduler::with_roster(roster, self.opts).with_shared_clock(Arc::clone(&self.clock))
    }

    /// Exécute `f` puis persiste, tout ou rien.
    pub fn transact<T, F>(&self, op: &str, f: F) -> Result<T, SchedError>
    where
        F: FnOnce(&mut Scheduler) -> Result<T, SchedError>,
    {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let out = self.storage.exclusive(|| -> Result<T, SchedError> {
            let mut scheduler = self.scheduler(self.storage.load()?);
            let out = f(&mut scheduler)?;
            self.storage.save(scheduler.roster())?;
            Ok(out)
        })?;
        info!(op, "roster committed");
        Ok(out)
    }

    /// Lecture seule: rien n'est sauvegardé.
    pub fn read<T, F>(&self, f: F) -> Result<T, SchedError>
    where
        F: FnOnce(&Scheduler) -> Result<T, SchedError>,
    {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.storage.exclusive(|| -> Result<T, SchedError> {
            let scheduler = self.scheduler(self.storage.load()?);
            f(&scheduler)
        })
    }

    pub fn assign_to_shifts(
        &self,
        shift_ids: &[ShiftId],
        staff: &StaffId,
        override_conflicts: bool,
    ) -> Result<Vec<Shift>, SchedError> {
        self.transact("assign", |s| {
            s.assign_to_shifts(shift_ids, staff, override_conflicts)
        })
    }

    pub fn add_shift(&self, input: &ShiftDto) -> Result<Shift, SchedError> {
        self.transact("add-shift", |s| s.add_shift(input))
    }

    pub fn update_shift(&self, input: &ShiftDto) -> Result<Shift, SchedError> {
        self.transact("update-shift", |s| s.update_shift(input))
    }

    pub fn expire_shift(&self, shift_id: &ShiftId) -> Result<(), SchedError> {
        self.transact("expire-shift", |s| s.expire_shift(shift_id))
    }

    pub fn set_duties(
        &self,
        shift_id: &ShiftId,
        duties: &[DutyId],
    ) -> Result<Shift, SchedError> {
        self.transact("set-duties", |s| s.set_duties(shift_id, duties))
    }

    pub fn import_weekly_shifts(
        &self,
        location: LocationId,
        commit: bool,
    ) -> Result<Vec<Shift>, SchedError> {
        if commit {
            self.transact("import-weekly", |s| s.import_weekly_shifts(location, true))
        } else {
            self.read(|s| s.clone().import_weekly_shifts(location, false))
        }
    }

    pub fn availability(
        &self,
        location: LocationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Staff>, SchedError> {
        self.read(|s| s.availability(location, start, end))
    }

    /// Disponibilités sur `days` jours à partir de `start`, comptés dans le fuseau du lieu.
    pub fn availability_for_days(
        &self,
        location: LocationId,
        start: DateTime<Utc>,
        days: i64,
    ) -> Result<Vec<Staff>, SchedError> {
        self.read(|s| {
            let (start, end) = s.availability_window(location, start, days)?;
            debug!(%start, %end, "availability window resolved");
            s.availability(location, start, end)
        })
    }

    pub fn shifts(
        &self,
        location: LocationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ShiftDto>, SchedError> {
        self.read(|s| {
            let shifts = s.shifts_at(location, start, end)?;
            Ok(shifts
                .iter()
                .map(|shift| ShiftDto::from_shift(shift, s.roster()))
                .collect())
        })
    }

    pub fn detect_conflicts(&self) -> Result<Vec<Conflict>, SchedError> {
        self.read(|s| Ok(s.detect_conflicts()))
    }
}
