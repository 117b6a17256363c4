#![forbid(unsafe_code)]
use chrono::{DateTime, TimeZone, Utc};
use sheriff_roster::{
    FixedClock, Location, LocationId, Roster, SchedError, ScheduleOptions, Scheduler, Shift,
    ShiftType, Staff, StaffId, WeekStart,
};

const LOC: LocationId = LocationId(1);
const OTHER: LocationId = LocationId(2);

fn at(m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, m, d, h, 0, 0).unwrap()
}

fn shift(
    location: LocationId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    staff: Option<&StaffId>,
) -> Shift {
    let mut s = Shift::new(ShiftType::Escorts, location, start, end, "America/Vancouver").unwrap();
    s.staff_id = staff.cloned();
    s
}

fn setup(
    now: DateTime<Utc>,
    week_start: WeekStart,
    shifts: impl FnOnce(&StaffId) -> Vec<Shift>,
) -> (Scheduler, StaffId) {
    let mut roster = Roster::default();
    roster
        .locations
        .push(Location::new(LOC, "Courthouse").with_timezone("America/Vancouver"));
    roster
        .locations
        .push(Location::new(OTHER, "Remand").with_timezone("America/Vancouver"));
    let staff = Staff::new("1001", "Jane", "Doe");
    let id = staff.id.clone();
    roster.staff.push(staff);
    roster.shifts = shifts(&id);
    let opts = ScheduleOptions {
        week_start,
        ..ScheduleOptions::default()
    };
    let s = Scheduler::with_roster(roster, opts).with_clock(FixedClock(now));
    (s, id)
}

#[test]
fn copies_last_week_onto_this_week() {
    // mercredi 18 mars, semaine courante à partir du dimanche 15
    let (mut s, staff) = setup(at(3, 18, 18), WeekStart::Sunday, |staff| {
        vec![
            shift(LOC, at(3, 9, 15), at(3, 10, 15), Some(staff)),
            // samedi 7 mars 23:30 heure locale: semaine d'avant
            shift(LOC, Utc.with_ymd_and_hms(2026, 3, 8, 7, 30, 0).unwrap(), at(3, 8, 9), None),
            // semaine courante
            shift(LOC, at(3, 15, 8), at(3, 15, 12), None),
            // autre lieu
            shift(OTHER, at(3, 11, 15), at(3, 11, 20), None),
        ]
    });

    let imported = s.import_weekly_shifts(LOC, true).unwrap();
    assert_eq!(imported.len(), 1);
    let copy = &imported[0];
    assert_eq!(copy.start, at(3, 16, 15));
    assert_eq!(copy.end, at(3, 17, 15));
    assert_eq!(copy.shift_type, ShiftType::Escorts);
    assert_eq!(copy.location_id, LOC);
    assert_eq!(copy.staff_id.as_ref(), Some(&staff));
    assert!(copy.expiry.is_none());
    assert_ne!(copy.id, s.roster().shifts[0].id);
    assert_eq!(s.roster().shifts.len(), 5);
}

#[test]
fn preview_does_not_persist() {
    let (mut s, _) = setup(at(3, 18, 18), WeekStart::Sunday, |staff| {
        vec![shift(LOC, at(3, 9, 15), at(3, 10, 15), Some(staff))]
    });

    let preview = s.import_weekly_shifts(LOC, false).unwrap();
    assert_eq!(preview.len(), 1);
    assert_eq!(s.roster().shifts.len(), 1);
}

#[test]
fn second_run_imports_nothing() {
    let (mut s, _) = setup(at(3, 18, 18), WeekStart::Sunday, |staff| {
        vec![
            shift(LOC, at(3, 9, 15), at(3, 10, 15), Some(staff)),
            shift(LOC, at(3, 12, 16), at(3, 12, 20), None),
        ]
    });

    assert_eq!(s.import_weekly_shifts(LOC, true).unwrap().len(), 2);
    assert!(s.import_weekly_shifts(LOC, true).unwrap().is_empty());
    assert_eq!(s.roster().shifts.len(), 4);
}

#[test]
fn keeps_wall_clock_across_dst() {
    // semaine du 8 mars: passage à l'heure d'été
    let (mut s, _) = setup(at(3, 11, 18), WeekStart::Sunday, |_| {
        vec![shift(LOC, at(3, 1, 18), at(3, 1, 22), None)]
    });

    let imported = s.import_weekly_shifts(LOC, true).unwrap();
    assert_eq!(imported.len(), 1);
    // 10:00-14:00 heure locale dans les deux cas
    assert_eq!(imported[0].start, at(3, 8, 17));
    assert_eq!(imported[0].end, at(3, 8, 21));
}

#[test]
fn expired_sources_are_skipped() {
    let (mut s, _) = setup(at(3, 18, 18), WeekStart::Sunday, |_| {
        let mut gone = shift(LOC, at(3, 9, 15), at(3, 10, 15), None);
        gone.expiry = Some(at(3, 12, 0));
        vec![gone]
    });
    assert!(s.import_weekly_shifts(LOC, true).unwrap().is_empty());
}

#[test]
fn conflicting_copy_is_left_unassigned() {
    let (mut s, _) = setup(at(3, 18, 18), WeekStart::Sunday, |staff| {
        vec![
            shift(LOC, at(3, 9, 15), at(3, 10, 15), Some(staff)),
            shift(OTHER, at(3, 16, 16), at(3, 16, 20), Some(staff)),
        ]
    });

    let imported = s.import_weekly_shifts(LOC, true).unwrap();
    assert_eq!(imported.len(), 1);
    assert!(imported[0].staff_id.is_none());
    assert!(s.detect_conflicts().is_empty());
}

#[test]
fn unassigned_copy_is_not_imported_twice() {
    let (mut s, _) = setup(at(3, 18, 18), WeekStart::Sunday, |staff| {
        vec![
            shift(LOC, at(3, 9, 15), at(3, 10, 15), Some(staff)),
            shift(OTHER, at(3, 16, 16), at(3, 16, 20), Some(staff)),
        ]
    });

    assert_eq!(s.import_weekly_shifts(LOC, true).unwrap().len(), 1);
    assert!(s.import_weekly_shifts(LOC, true).unwrap().is_empty());
    assert!(s.import_weekly_shifts(LOC, false).unwrap().is_empty());
    assert_eq!(s.roster().shifts.len(), 3);
}

#[test]
fn monday_week_start() {
    let now = at(3, 22, 18); // dimanche
    let source = |staff: &StaffId| vec![shift(LOC, at(3, 9, 15), at(3, 10, 15), Some(staff))];

    let (mut monday, _) = setup(now, WeekStart::Monday, source);
    let imported = monday.import_weekly_shifts(LOC, false).unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].start, at(3, 16, 15));

    let (mut sunday, _) = setup(now, WeekStart::Sunday, source);
    assert!(sunday.import_weekly_shifts(LOC, false).unwrap().is_empty());
}

#[test]
fn unknown_location() {
    let (mut s, _) = setup(at(3, 18, 18), WeekStart::Sunday, |_| Vec::new());
    assert!(matches!(
        s.import_weekly_shifts(LocationId(42), true),
        Err(SchedError::UnknownLocation(42))
    ));
}
