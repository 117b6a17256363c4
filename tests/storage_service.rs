#![forbid(unsafe_code)]
use chrono::{DateTime, Duration, TimeZone, Utc};
use sheriff_roster::{
    FixedClock, JsonStorage, Leave, Location, LocationId, MemoryStorage, Roster, RosterService,
    SchedError, ScheduleOptions, Shift, ShiftDto, ShiftId, ShiftType, Staff, StaffId, Storage,
};
use tempfile::tempdir;

const LOC: LocationId = LocationId(1);

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 18, 0, 0).unwrap()
}

fn day(n: i64) -> DateTime<Utc> {
    now() + Duration::days(n)
}

fn shift(id: &str, from: i64, to: i64) -> Shift {
    let mut s = Shift::new(ShiftType::Jail, LOC, day(from), day(to), "America/Vancouver").unwrap();
    s.id = ShiftId::new(id);
    s
}

fn roster() -> (Roster, StaffId) {
    let mut r = Roster::default();
    r.locations
        .push(Location::new(LOC, "Courthouse").with_timezone("America/Vancouver"));
    let mut staff = Staff::new("1001", "Jane", "Doe");
    staff.leave.push(Leave::new(day(20), day(21)).unwrap());
    let id = staff.id.clone();
    r.staff.push(staff);
    r.shifts = vec![shift("a", 1, 2), shift("b", 1, 3), shift("c", 5, 6)];
    (r, id)
}

fn service(r: Roster) -> RosterService<MemoryStorage> {
    RosterService::new(MemoryStorage::new(r), ScheduleOptions::default()).with_clock(FixedClock(now()))
}

#[test]
fn json_storage_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roster.json");
    let storage = JsonStorage::open(&path).unwrap();

    assert!(storage.load().unwrap().staff.is_empty());

    let (r, _) = roster();
    storage.save(&r).unwrap();
    let back = storage.load().unwrap();
    assert_eq!(back.staff, r.staff);
    assert_eq!(back.shifts, r.shifts);
    assert_eq!(back.locations, r.locations);
}

#[test]
fn json_storage_rejects_garbage() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roster.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(JsonStorage::open(&path).unwrap().load().is_err());
}

#[test]
fn failed_request_leaves_storage_untouched() {
    let (r, staff) = roster();
    let svc = service(r);

    svc.assign_to_shifts(&[ShiftId::new("a")], &staff, false)
        .unwrap();
    let err = svc
        .assign_to_shifts(&[ShiftId::new("b")], &staff, false)
        .unwrap_err();
    assert!(err.is_business_rule());

    let stored = svc.storage().snapshot();
    assert!(stored.find_shift(&ShiftId::new("a")).unwrap().is_assigned_to(&staff));
    assert!(stored.find_shift(&ShiftId::new("b")).unwrap().staff_id.is_none());
}

#[test]
fn override_persists_unassignment() {
    let (r, staff) = roster();
    let svc = service(r);

    svc.assign_to_shifts(&[ShiftId::new("a")], &staff, false)
        .unwrap();
    svc.assign_to_shifts(&[ShiftId::new("b")], &staff, true)
        .unwrap();

    let stored = svc.storage().snapshot();
    assert!(stored.find_shift(&ShiftId::new("a")).unwrap().staff_id.is_none());
    assert!(stored.find_shift(&ShiftId::new("b")).unwrap().is_assigned_to(&staff));
    assert!(svc.detect_conflicts().unwrap().is_empty());
}

#[test]
fn concurrent_overlapping_requests_admit_one() {
    let (r, staff) = roster();
    let svc = service(r);

    let results: Vec<Result<Vec<Shift>, SchedError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|id| {
                let svc = &svc;
                let staff = &staff;
                scope.spawn(move || svc.assign_to_shifts(&[ShiftId::new(id)], staff, false))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let stored = svc.storage().snapshot();
    let assigned = stored.shifts.iter().filter(|s| s.is_assigned_to(&staff)).count();
    assert_eq!(assigned, 1);
}

#[test]
fn read_paths_do_not_save() {
    let (mut r, staff) = roster();
    // quart de la semaine précédente (dimanche 22 février au samedi 28)
    let mut previous = shift("prev", -5, -4);
    previous.staff_id = Some(staff.clone());
    r.shifts.push(previous);
    let svc = service(r);

    let preview = svc.import_weekly_shifts(LOC, false).unwrap();
    assert_eq!(preview.len(), 1);
    assert_eq!(svc.storage().snapshot().shifts.len(), 4);

    let committed = svc.import_weekly_shifts(LOC, true).unwrap();
    assert_eq!(committed.len(), 1);
    assert_eq!(svc.storage().snapshot().shifts.len(), 5);

    let available = svc.availability_for_days(LOC, day(19), 3).unwrap();
    assert!(available.is_empty());
    let available = svc.availability(LOC, day(10), day(11)).unwrap();
    assert_eq!(available.len(), 1);
}

#[test]
fn add_update_expire_through_service() {
    let (r, staff) = roster();
    let svc = service(r);

    let mut input = ShiftDto::new(ShiftType::Courts, LOC, day(8), day(9));
    input.sheriff_id = Some(staff.clone());
    let created = svc.add_shift(&input).unwrap();

    let listed = svc.shifts(LOC, day(7), day(10)).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id.as_ref(), Some(&created.id));
    assert_eq!(
        listed[0].sheriff.as_ref().map(|p| p.badge_number.as_str()),
        Some("1001")
    );

    let mut edit = listed[0].clone();
    edit.sheriff_id = None;
    let updated = svc.update_shift(&edit).unwrap();
    assert!(updated.staff_id.is_none());

    svc.expire_shift(&created.id).unwrap();
    assert!(svc.shifts(LOC, day(7), day(10)).unwrap().is_empty());
    assert_eq!(
        svc.storage().snapshot().find_shift(&created.id).unwrap().expiry,
        Some(now())
    );
}

fn json_service(path: &std::path::Path) -> RosterService<JsonStorage> {
    RosterService::new(JsonStorage::open(path).unwrap(), ScheduleOptions::default())
        .with_clock(FixedClock(now()))
}

#[test]
fn services_sharing_a_file_keep_every_commit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roster.json");
    let (mut r, staff) = roster();
    r.shifts = (0..8).map(|i| shift(&format!("s{i}"), i, i + 1)).collect();
    JsonStorage::open(&path).unwrap().save(&r).unwrap();

    // un service par fil: seul le verrou du fichier les sérialise
    let results: Vec<bool> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = &path;
                let staff = &staff;
                scope.spawn(move || {
                    json_service(path)
                        .assign_to_shifts(&[ShiftId::new(format!("s{i}"))], staff, false)
                        .is_ok()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(results.iter().all(|ok| *ok));

    let stored = JsonStorage::open(&path).unwrap().load().unwrap();
    let assigned = stored.shifts.iter().filter(|s| s.is_assigned_to(&staff)).count();
    assert_eq!(assigned, 8);
}

#[test]
fn services_sharing_a_file_admit_one_overlap() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roster.json");
    let (r, staff) = roster();
    JsonStorage::open(&path).unwrap().save(&r).unwrap();

    let results: Vec<bool> = std::thread::scope(|scope| {
        let handles: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|id| {
                let path = &path;
                let staff = &staff;
                scope.spawn(move || {
                    json_service(path)
                        .assign_to_shifts(&[ShiftId::new(id)], staff, false)
                        .is_ok()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(results.iter().filter(|ok| **ok).count(), 1);

    let stored = JsonStorage::open(&path).unwrap().load().unwrap();
    assert_eq!(stored.shifts.iter().filter(|s| s.is_assigned_to(&staff)).count(), 1);
    assert!(path.with_extension("json.lock").exists());
}
