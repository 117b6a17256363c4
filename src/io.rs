use crate::dto::ShiftDto;
use crate::model::{Leave, LocationId, Roster, ShiftType, Staff};
use crate::scheduler::Conflict;
use anyhow::{bail, Context};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Import du personnel depuis CSV:
/// header `badge,first_name,last_name[,enabled][,home_location][,leave]`
pub fn import_staff_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Staff>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let badge = rec.get(0).context("missing badge")?.trim();
        let first = rec.get(1).context("missing first_name")?.trim();
        let last = rec.get(2).context("missing last_name")?.trim();
        if badge.is_empty() || last.is_empty() {
            bail!("invalid staff row (empty)");
        }
        let mut staff = Staff::new(badge, first, last);
        if let Some(flag) = non_empty(rec.get(3)) {
            staff.enabled = parse_bool(flag)
                .with_context(|| format!("invalid enabled value for badge {badge}"))?;
        }
        if let Some(home) = non_empty(rec.get(4)) {
            let id: u32 = home
                .parse()
                .with_context(|| format!("invalid home_location for badge {badge}"))?;
            staff.home_location_id = Some(LocationId(id));
        }
        if let Some(ranges) = non_empty(rec.get(5)) {
            staff.leave = parse_leave(ranges)
                .with_context(|| format!("invalid leave value for badge {badge}"))?;
        }
        out.push(staff);
    }
    Ok(out)
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|f| !f.is_empty())
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

/// Plages séparées par `;`, chacune `début/fin`, `début..fin` ou une date seule.
/// Une fin donnée comme date est inclusive (jour entier).
pub fn parse_leave(raw: &str) -> anyhow::Result<Vec<Leave>> {
    raw.split(';')
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|chunk| parse_leave_chunk(chunk.trim()))
        .collect()
}

fn parse_leave_chunk(chunk: &str) -> anyhow::Result<Leave> {
    if let Some((start_raw, end_raw)) = chunk.split_once('/').or_else(|| chunk.split_once("..")) {
        let (start, _) = parse_point(start_raw.trim())?;
        let (mut end, end_was_date) = parse_point(end_raw.trim())?;
        if end_was_date {
            end += Duration::days(1);
        }
        Leave::new(start, end).map_err(anyhow::Error::msg)
    } else {
        let (start, _) = parse_point(chunk)?;
        let end = start + Duration::days(1);
        Leave::new(start, end).map_err(anyhow::Error::msg)
    }
}

/// RFC3339, ou date `AAAA-MM-JJ` (minuit UTC). Le booléen indique une date seule.
pub fn parse_point(raw: &str) -> anyhow::Result<(DateTime<Utc>, bool)> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok((dt.with_timezone(&Utc), false));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date/datetime: {raw}"))?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .context("invalid midnight conversion")?;
    Ok((Utc.from_utc_datetime(&datetime), true))
}

/// Import de quarts: header `location_id,type,start,end[,badge][,timezone]` (RFC3339).
/// Les badges sont résolus dans `roster`.
pub fn import_shifts_csv<P: AsRef<Path>>(path: P, roster: &Roster) -> anyhow::Result<Vec<ShiftDto>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let location: u32 = rec
            .get(0)
            .context("missing location_id")?
            .trim()
            .parse()
            .context("location_id")?;
        let shift_type: ShiftType = rec
            .get(1)
            .context("missing type")?
            .parse()
            .map_err(anyhow::Error::msg)?;
        let start = DateTime::parse_from_rfc3339(rec.get(2).context("missing start")?.trim())
            .context("start RFC3339")?;
        let end = DateTime::parse_from_rfc3339(rec.get(3).context("missing end")?.trim())
            .context("end RFC3339")?;

        let mut dto = ShiftDto::new(
            shift_type,
            LocationId(location),
            start.with_timezone(&Utc),
            end.with_timezone(&Utc),
        );
        dto.start_date = start;
        dto.end_date = end;
        if let Some(badge) = non_empty(rec.get(4)) {
            let staff = roster
                .find_staff_by_badge(badge)
                .with_context(|| format!("unknown badge: {badge}"))?;
            dto.sheriff_id = Some(staff.id.clone());
        }
        dto.timezone = non_empty(rec.get(5)).map(str::to_string);
        out.push(dto);
    }
    Ok(out)
}

/// Export JSON du roster (jolie mise en forme)
pub fn export_roster_json<P: AsRef<Path>>(path: P, roster: &Roster) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(roster)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV des quarts: header `id,location_id,type,start,end,badge,expiry`
pub fn write_shifts_csv<W: Write>(out: W, roster: &Roster) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_writer(out);
    w.write_record(["id", "location_id", "type", "start", "end", "badge", "expiry"])?;
    for s in &roster.shifts {
        let badge = s
            .staff_id
            .as_ref()
            .and_then(|id| roster.find_staff_by_id(id))
            .map(|p| p.badge_number.as_str())
            .unwrap_or("");
        let location = s.location_id.to_string();
        let start = s.start.to_rfc3339();
        let end = s.end.to_rfc3339();
        let expiry = s.expiry.map(|e| e.to_rfc3339()).unwrap_or_default();
        w.write_record([
            s.id.as_str(),
            location.as_str(),
            s.shift_type.as_str(),
            start.as_str(),
            end.as_str(),
            badge,
            expiry.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_shifts_csv<P: AsRef<Path>>(path: P, roster: &Roster) -> anyhow::Result<()> {
    let file = fs::File::create(path.as_ref())
        .with_context(|| format!("creating {}", path.as_ref().display()))?;
    write_shifts_csv(file, roster)
}

/// Rapport de conflits: header `staff_id,shift_a,shift_b,kind`
pub fn export_conflicts_csv<P: AsRef<Path>>(path: P, conflicts: &[Conflict]) -> anyhow::Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(["staff_id", "shift_a", "shift_b", "kind"])?;
    for c in conflicts {
        let kind = c.kind.to_string();
        w.write_record([
            c.staff.as_str(),
            c.shift_a.as_str(),
            c.shift_b.as_str(),
            kind.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}
