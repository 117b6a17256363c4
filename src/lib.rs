#![forbid(unsafe_code)]
//! Sheriff Roster — planification des quarts de shérifs par lieu.
//!
//! - Détection de conflits à l'assignation (avec forçage optionnel).
//! - Disponibilités: congés, formations, détachements et quarts actifs exclus.
//! - Mise à jour partielle des quarts, expiration logique, import hebdomadaire.
//! - Instants stockés en UTC; fenêtres et semaines calculées dans le fuseau du lieu.

pub mod clock;
pub mod dto;
pub mod io;
pub mod model;
pub mod scheduler;
pub mod service;
pub mod storage;
pub mod timezone;

pub use clock::{Clock, FixedClock, SystemClock};
pub use dto::ShiftDto;
pub use model::{
    Assignment, AssignmentId, AwayLocation, DutyId, Leave, Location, LocationId, Period, Region,
    RegionId, Roster, Shift, ShiftId, ShiftType, Staff, StaffId, Training,
};
pub use scheduler::{Conflict, ConflictKind, SchedError, ScheduleOptions, Scheduler};
pub use service::RosterService;
pub use storage::{JsonStorage, MemoryStorage, Storage};
pub use timezone::WeekStart;
