use crate::model::{ShiftId, StaffId};
use crate::timezone::WeekStart;
use chrono_tz::Tz;
use std::fmt;
use thiserror::Error;

/// Options de planification
#[derive(Debug, Clone, Copy)]
pub struct ScheduleOptions {
    /// Fuseau des lieux qui n'en déclarent pas.
    pub default_timezone: Tz,
    pub week_start: WeekStart,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            default_timezone: chrono_tz::America::Vancouver,
            week_start: WeekStart::Sunday,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// chevauchement avec un quart déjà assigné
    Overlap,
    /// deux quarts demandés dans la même requête se chevauchent
    SelfOverlap,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Overlap => f.write_str("overlap"),
            ConflictKind::SelfOverlap => f.write_str("self-overlap"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub staff: StaffId,
    pub shift_a: ShiftId,
    pub shift_b: ShiftId,
    pub kind: ConflictKind,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid time range: end must be after start")]
    InvalidTimeRange,
    #[error("no shift given")]
    EmptyRequest,
    #[error("shift id is required")]
    MissingId,
    #[error("unknown staff member: {0}")]
    UnknownStaff(String),
    #[error("unknown shift: {0}")]
    UnknownShift(String),
    #[error("unknown location: {0}")]
    UnknownLocation(u32),
    #[error("unknown assignment: {0}")]
    UnknownAssignment(u32),
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error("{count} conflicting shift pair(s) for staff {staff}", count = .conflicts.len())]
    Conflict {
        staff: StaffId,
        conflicts: Vec<Conflict>,
    },
    #[error("business rule violated: {0}")]
    BusinessRule(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SchedError {
    /// Violation de règle métier (par opposition à une entrée invalide).
    pub fn is_business_rule(&self) -> bool {
        matches!(self, SchedError::Conflict { .. } | SchedError::BusinessRule(_))
    }
}
