use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifiant fort pour un membre du personnel (shérif).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StaffId(String);

impl StaffId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiant fort pour Shift
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShiftId(String);

impl ShiftId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifiant d'un lieu (palais de justice, prison...).
    LocationId
);
numeric_id!(RegionId);
numeric_id!(
    /// Identifiant d'une affectation prévue (anticipated assignment).
    AssignmentId
);
numeric_id!(DutyId);

/// Enregistrement borné dans le temps `[start, end)`, éventuellement expiré.
///
/// Un enregistrement est actif tant que son expiration n'est pas renseignée
/// ou se situe strictement dans le futur.
pub trait Period {
    fn start(&self) -> DateTime<Utc>;
    fn end(&self) -> DateTime<Utc>;
    fn expiry(&self) -> Option<DateTime<Utc>>;

    fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expiry().map_or(true, |expiry| expiry > now)
    }

    /// Chevauchement demi-ouvert: des bornes qui se touchent ne chevauchent pas.
    fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        overlaps(self.start(), self.end(), start, end)
    }
}

pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

fn check_range(start: DateTime<Utc>, end: DateTime<Utc>, what: &str) -> Result<(), String> {
    if end <= start {
        return Err(format!("{what} end must be after start"));
    }
    Ok(())
}

macro_rules! impl_period {
    ($ty:ty) => {
        impl Period for $ty {
            fn start(&self) -> DateTime<Utc> {
                self.start
            }
            fn end(&self) -> DateTime<Utc> {
                self.end
            }
            fn expiry(&self) -> Option<DateTime<Utc>> {
                self.expiry
            }
        }
    };
}

/// Région administrative regroupant des lieux.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub justin_id: u32,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

/// Lieu de travail. Le fuseau sert aux calculs de fenêtres et d'import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub agency_id: String,
    #[serde(default)]
    pub region_id: Option<RegionId>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Location {
    pub fn new<N: Into<String>>(id: LocationId, name: N) -> Self {
        Self {
            id,
            name: name.into(),
            agency_id: String::new(),
            region_id: None,
            timezone: None,
        }
    }

    pub fn with_timezone<T: Into<String>>(mut self, tz: T) -> Self {
        self.timezone = Some(tz.into());
        self
    }
}

/// Affectation prévue d'un quart (ex: "Salle 101").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub name: String,
    pub location_id: LocationId,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

/// Congé d'un shérif.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leave {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Leave {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, String> {
        check_range(start, end, "leave")?;
        Ok(Self {
            start,
            end,
            expiry: None,
            leave_type: None,
            comment: None,
        })
    }
}

/// Formation suivie par un shérif.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Training {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_type_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Training {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, String> {
        check_range(start, end, "training")?;
        Ok(Self {
            start,
            end,
            expiry: None,
            training_type_id: None,
            certification_expiry: None,
            comment: None,
        })
    }
}

/// Détachement temporaire vers un autre lieu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwayLocation {
    pub location_id: LocationId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl AwayLocation {
    pub fn new(
        location_id: LocationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, String> {
        check_range(start, end, "away location")?;
        Ok(Self {
            location_id,
            start,
            end,
            expiry: None,
            comment: None,
        })
    }
}

impl_period!(Leave);
impl_period!(Training);
impl_period!(AwayLocation);

/// Membre du personnel planifiable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub id: StaffId,
    pub badge_number: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub home_location_id: Option<LocationId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leave: Vec<Leave>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub training: Vec<Training>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub away_locations: Vec<AwayLocation>,
}

fn enabled_default() -> bool {
    true
}

impl Staff {
    pub fn new<B, F, L>(badge_number: B, first_name: F, last_name: L) -> Self
    where
        B: Into<String>,
        F: Into<String>,
        L: Into<String>,
    {
        Self {
            id: StaffId::random(),
            badge_number: badge_number.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            enabled: true,
            home_location_id: None,
            leave: Vec::new(),
            training: Vec::new(),
            away_locations: Vec::new(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// Vrai si un congé, une formation ou un détachement actif chevauche la fenêtre.
    pub fn is_absent(&self, start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        any_active_overlap(&self.leave, start, end, now)
            || any_active_overlap(&self.training, start, end, now)
            || any_active_overlap(&self.away_locations, start, end, now)
    }
}

fn any_active_overlap<P: Period>(
    records: &[P],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    records
        .iter()
        .any(|p| p.is_active(now) && p.overlaps(start, end))
}

/// Type de quart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShiftType {
    #[default]
    Jail,
    Courts,
    Escorts,
    Other,
}

impl ShiftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::Jail => "jail",
            ShiftType::Courts => "courts",
            ShiftType::Escorts => "escorts",
            ShiftType::Other => "other",
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jail" => Ok(ShiftType::Jail),
            "courts" | "court" => Ok(ShiftType::Courts),
            "escorts" | "escort" => Ok(ShiftType::Escorts),
            "other" => Ok(ShiftType::Other),
            other => Err(format!("unknown shift type: {other}")),
        }
    }
}

/// Quart de travail (UTC). Jamais supprimé: on l'expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    #[serde(default)]
    pub shift_type: ShiftType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location_id: LocationId,
    #[serde(default)]
    pub staff_id: Option<StaffId>,
    #[serde(default)]
    pub anticipated_assignment_id: Option<AssignmentId>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duties: Vec<DutyId>,
}

impl Shift {
    /// Crée un shift non assigné en validant que `end > start`.
    pub fn new<T: Into<String>>(
        shift_type: ShiftType,
        location_id: LocationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timezone: T,
    ) -> Result<Self, String> {
        check_range(start, end, "shift")?;
        Ok(Self {
            id: ShiftId::random(),
            shift_type,
            start,
            end,
            location_id,
            staff_id: None,
            anticipated_assignment_id: None,
            expiry: None,
            timezone: timezone.into(),
            duties: Vec::new(),
        })
    }

    /// Durée en minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn is_assigned_to(&self, staff: &StaffId) -> bool {
        self.staff_id.as_ref() == Some(staff)
    }
}

impl_period!(Shift);

/// Jeu de données complet, tel que persisté.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Roster {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub staff: Vec<Staff>,
    #[serde(default)]
    pub shifts: Vec<Shift>,
}

impl Roster {
    pub fn find_staff_by_badge<'a>(&'a self, badge: &str) -> Option<&'a Staff> {
        self.staff.iter().find(|s| s.badge_number == badge)
    }
    pub fn find_staff_by_id<'a>(&'a self, id: &StaffId) -> Option<&'a Staff> {
        self.staff.iter().find(|s| &s.id == id)
    }
    pub fn find_staff_mut_by_id(&mut self, id: &StaffId) -> Option<&mut Staff> {
        self.staff.iter_mut().find(|s| &s.id == id)
    }
    pub fn find_shift(&self, id: &ShiftId) -> Option<&Shift> {
        self.shifts.iter().find(|s| &s.id == id)
    }
    pub fn find_shift_mut(&mut self, id: &ShiftId) -> Option<&mut Shift> {
        self.shifts.iter_mut().find(|s| &s.id == id)
    }
    pub fn find_location(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }
    pub fn find_assignment(&self, id: AssignmentId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.id == id)
    }
    pub fn find_region(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }
}
