#![forbid(unsafe_code)]
use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::America::{Edmonton, Regina, Vancouver};
use sheriff_roster::timezone::{add_days_in_zone, parse_tz, resolve_local, start_of_week};
use sheriff_roster::{SchedError, WeekStart};

#[test]
fn seven_days_over_spring_forward() {
    let start = Utc.with_ymd_and_hms(2026, 3, 5, 19, 0, 0).unwrap();
    let end = add_days_in_zone(start, Edmonton, 7).unwrap();
    assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 12, 18, 0, 0).unwrap());
    assert_eq!(end - start, Duration::hours(167));
}

#[test]
fn seven_days_over_fall_back() {
    let start = Utc.with_ymd_and_hms(2026, 10, 29, 19, 0, 0).unwrap();
    let end = add_days_in_zone(start, Vancouver, 7).unwrap();
    assert_eq!(end - start, Duration::hours(169));
}

#[test]
fn no_dst_zone_is_plain_arithmetic() {
    let start = Utc.with_ymd_and_hms(2026, 3, 5, 19, 0, 0).unwrap();
    let end = add_days_in_zone(start, Regina, 7).unwrap();
    assert_eq!(end - start, Duration::days(7));
    assert_eq!(add_days_in_zone(end, Regina, -7).unwrap(), start);
}

#[test]
fn week_boundaries_are_local_midnight() {
    // mercredi 11 mars, 12:00 MDT
    let now = Utc.with_ymd_and_hms(2026, 3, 11, 18, 0, 0).unwrap();
    // dimanche 8 mars 00:00 MST (avant le changement de 02:00)
    assert_eq!(
        start_of_week(now, Edmonton, WeekStart::Sunday).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 8, 7, 0, 0).unwrap()
    );
    // lundi 9 mars 00:00 MDT
    assert_eq!(
        start_of_week(now, Edmonton, WeekStart::Monday).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 9, 6, 0, 0).unwrap()
    );
}

#[test]
fn week_start_of_local_date_not_utc_date() {
    // samedi 14 mars 20:00 PDT = dimanche 15 mars en UTC
    let now = Utc.with_ymd_and_hms(2026, 3, 15, 3, 0, 0).unwrap();
    assert_eq!(
        start_of_week(now, Vancouver, WeekStart::Sunday).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 8, 8, 0, 0).unwrap()
    );
}

#[test]
fn nonexistent_local_time_moves_forward() {
    let local = NaiveDate::from_ymd_opt(2026, 3, 8)
        .unwrap()
        .and_hms_opt(2, 30, 0)
        .unwrap();
    assert_eq!(
        resolve_local(Edmonton, local),
        Some(Utc.with_ymd_and_hms(2026, 3, 8, 9, 0, 0).unwrap())
    );
}

#[test]
fn ambiguous_local_time_takes_earliest() {
    let local = NaiveDate::from_ymd_opt(2026, 11, 1)
        .unwrap()
        .and_hms_opt(1, 30, 0)
        .unwrap();
    assert_eq!(
        resolve_local(Vancouver, local),
        Some(Utc.with_ymd_and_hms(2026, 11, 1, 8, 30, 0).unwrap())
    );
}

#[test]
fn end_of_calendar_does_not_overflow() {
    assert_eq!(resolve_local(Edmonton, NaiveDateTime::MAX), None);
    let start = Utc.with_ymd_and_hms(2026, 3, 5, 19, 0, 0).unwrap();
    assert!(add_days_in_zone(start, Edmonton, i64::MAX).is_err());
}

#[test]
fn parsing() {
    assert_eq!(parse_tz(" America/Edmonton ").unwrap(), Edmonton);
    assert!(matches!(
        parse_tz("Pacific/Nowhere"),
        Err(SchedError::InvalidTimezone(_))
    ));
    assert_eq!("Monday".parse::<WeekStart>().unwrap(), WeekStart::Monday);
    assert_eq!("dimanche".parse::<WeekStart>().unwrap(), WeekStart::Sunday);
    assert!("friday".parse::<WeekStart>().is_err());
    assert_eq!(WeekStart::default(), WeekStart::Sunday);
}
