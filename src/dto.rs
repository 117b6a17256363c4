//! Enregistrements plats échangés avec l'extérieur (JSON camelCase).
//!
//! Les objets imbriqués d'un `ShiftDto` ne sont remplis qu'en sortie; en
//! entrée ils sont ignorés par le planificateur.

use crate::model::{
    Assignment, AssignmentId, DutyId, Location, LocationId, Region, RegionId, Roster, Shift,
    ShiftId, ShiftType, Staff, StaffId, Training,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDto {
    pub id: RegionId,
    pub justin_id: u32,
    pub code: String,
    pub name: String,
    pub expiry_date: Option<DateTime<FixedOffset>>,
}

impl From<&Region> for RegionDto {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id,
            justin_id: region.justin_id,
            code: region.code.clone(),
            name: region.name.clone(),
            expiry_date: region.expiry.map(DateTime::<FixedOffset>::from),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    pub id: LocationId,
    pub name: String,
    pub agency_id: String,
    pub region_id: Option<RegionId>,
    pub timezone: Option<String>,
    #[serde(default)]
    pub region: Option<RegionDto>,
}

impl From<&Location> for LocationDto {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id,
            name: location.name.clone(),
            agency_id: location.agency_id.clone(),
            region_id: location.region_id,
            timezone: location.timezone.clone(),
            region: None,
        }
    }
}

impl LocationDto {
    pub fn with_region(location: &Location, roster: &Roster) -> Self {
        let mut dto = Self::from(location);
        dto.region = location
            .region_id
            .and_then(|id| roster.find_region(id))
            .map(RegionDto::from);
        dto
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDto {
    pub id: AssignmentId,
    pub name: String,
    pub location_id: LocationId,
    pub expiry_date: Option<DateTime<FixedOffset>>,
}

impl From<&Assignment> for AssignmentDto {
    fn from(assignment: &Assignment) -> Self {
        Self {
            id: assignment.id,
            name: assignment.name.clone(),
            location_id: assignment.location_id,
            expiry_date: assignment.expiry.map(DateTime::<FixedOffset>::from),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyDto {
    pub id: DutyId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffTrainingDto {
    pub training_type_id: Option<u32>,
    pub training_certification_expiry: Option<DateTime<FixedOffset>>,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    pub expiry_date: Option<DateTime<FixedOffset>>,
    pub sheriff_id: StaffId,
    pub comment: Option<String>,
}

impl StaffTrainingDto {
    pub fn from_training(staff: &StaffId, training: &Training) -> Self {
        Self {
            training_type_id: training.training_type_id,
            training_certification_expiry: training
                .certification_expiry
                .map(DateTime::<FixedOffset>::from),
            start_date: training.start.into(),
            end_date: training.end.into(),
            expiry_date: training.expiry.map(DateTime::<FixedOffset>::from),
            sheriff_id: staff.clone(),
            comment: training.comment.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffDto {
    pub id: StaffId,
    pub badge_number: String,
    pub first_name: String,
    pub last_name: String,
    pub is_enabled: bool,
    pub home_location_id: Option<LocationId>,
    #[serde(default)]
    pub training: Vec<StaffTrainingDto>,
}

impl From<&Staff> for StaffDto {
    fn from(staff: &Staff) -> Self {
        Self {
            id: staff.id.clone(),
            badge_number: staff.badge_number.clone(),
            first_name: staff.first_name.clone(),
            last_name: staff.last_name.clone(),
            is_enabled: staff.enabled,
            home_location_id: staff.home_location_id,
            training: staff
                .training
                .iter()
                .map(|t| StaffTrainingDto::from_training(&staff.id, t))
                .collect(),
        }
    }
}

/// Quart tel que reçu ou renvoyé à l'appelant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDto {
    #[serde(default)]
    pub id: Option<ShiftId>,
    #[serde(rename = "type", default)]
    pub shift_type: ShiftType,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    pub location_id: LocationId,
    #[serde(default)]
    pub sheriff_id: Option<StaffId>,
    #[serde(default)]
    pub anticipated_assignment_id: Option<AssignmentId>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub sheriff: Option<StaffDto>,
    #[serde(default)]
    pub location: Option<LocationDto>,
    #[serde(default)]
    pub anticipated_assignment: Option<AssignmentDto>,
    #[serde(default)]
    pub duties: Vec<DutyDto>,
}

impl ShiftDto {
    /// Nouveau quart à créer (sans id ni relations).
    pub fn new(
        shift_type: ShiftType,
        location_id: LocationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            shift_type,
            start_date: start.into(),
            end_date: end.into(),
            location_id,
            sheriff_id: None,
            anticipated_assignment_id: None,
            expiry_date: None,
            timezone: None,
            sheriff: None,
            location: None,
            anticipated_assignment: None,
            duties: Vec::new(),
        }
    }

    /// Projection plate, relations résolues dans `roster`.
    pub fn from_shift(shift: &Shift, roster: &Roster) -> Self {
        Self {
            id: Some(shift.id.clone()),
            shift_type: shift.shift_type,
            start_date: shift.start.into(),
            end_date: shift.end.into(),
            location_id: shift.location_id,
            sheriff_id: shift.staff_id.clone(),
            anticipated_assignment_id: shift.anticipated_assignment_id,
            expiry_date: shift.expiry.map(DateTime::<FixedOffset>::from),
            timezone: Some(shift.timezone.clone()),
            sheriff: shift
                .staff_id
                .as_ref()
                .and_then(|id| roster.find_staff_by_id(id))
                .map(StaffDto::from),
            location: roster
                .find_location(shift.location_id)
                .map(|l| LocationDto::with_region(l, roster)),
            anticipated_assignment: shift
                .anticipated_assignment_id
                .and_then(|id| roster.find_assignment(id))
                .map(AssignmentDto::from),
            duties: shift.duties.iter().map(|&id| DutyDto { id }).collect(),
        }
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start_date.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end_date.with_timezone(&Utc)
    }
}
