//! Arithmétique calendaire dans un fuseau IANA.
//!
//! Les bornes sont calculées en heure locale puis converties en UTC: un
//! "+7 jours" qui traverse un changement d'heure donne 167 h ou 169 h.
//! Heure ambiguë (retour à l'heure d'hiver): on garde la plus tôt.
//! Heure inexistante (passage à l'heure d'été): premier instant valide après le trou.

use crate::scheduler::SchedError;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Premier jour de la semaine pour l'import hebdomadaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl FromStr for WeekStart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunday" | "sun" | "dimanche" => Ok(WeekStart::Sunday),
            "monday" | "mon" | "lundi" => Ok(WeekStart::Monday),
            other => Err(format!("unknown week start: {other}")),
        }
    }
}

pub fn parse_tz(name: &str) -> Result<Tz, SchedError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| SchedError::InvalidTimezone(name.to_string()))
}

/// Résout une heure locale en instant UTC.
pub fn resolve_local(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    if let Some(dt) = tz.from_local_datetime(&local).earliest() {
        return Some(dt.with_timezone(&Utc));
    }
    // trou DST: les décalages réels ne dépassent pas quelques heures
    (1..=24 * 60).find_map(|minutes| {
        let candidate = local.checked_add_signed(Duration::minutes(minutes))?;
        tz.from_local_datetime(&candidate)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Décale `instant` de `days` jours calendaires dans `tz` (même heure murale).
pub fn add_days_in_zone(
    instant: DateTime<Utc>,
    tz: Tz,
    days: i64,
) -> Result<DateTime<Utc>, SchedError> {
    let local = instant.with_timezone(&tz).naive_local();
    let shifted = if days >= 0 {
        local.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        local.checked_sub_days(Days::new(days.unsigned_abs()))
    }
    .ok_or(SchedError::InvalidTimeRange)?;
    resolve_local(tz, shifted).ok_or(SchedError::InvalidTimeRange)
}

/// Minuit local du premier jour de la semaine contenant `instant`.
pub fn start_of_week(
    instant: DateTime<Utc>,
    tz: Tz,
    week_start: WeekStart,
) -> Result<DateTime<Utc>, SchedError> {
    let date = instant.with_timezone(&tz).date_naive();
    let back = match week_start {
        WeekStart::Sunday => date.weekday().num_days_from_sunday(),
        WeekStart::Monday => date.weekday().num_days_from_monday(),
    };
    let first_day = date
        .checked_sub_days(Days::new(u64::from(back)))
        .ok_or(SchedError::InvalidTimeRange)?;
    resolve_local(tz, first_day.and_time(NaiveTime::MIN)).ok_or(SchedError::InvalidTimeRange)
}
