#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use sheriff_roster::{
    dto::{ShiftDto, StaffDto},
    io,
    model::{
        Assignment, AssignmentId, AwayLocation, DutyId, Leave, Location, LocationId, Region,
        RegionId, Roster, ShiftId, ShiftType, Staff, StaffId, Training,
    },
    scheduler::{SchedError, ScheduleOptions},
    service::RosterService,
    storage::{JsonStorage, Storage},
    timezone::{self, WeekStart},
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification des quarts de shérifs
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du roster
    #[arg(long, global = true, env = "SHERIFF_ROSTER", default_value = "roster.json")]
    roster: String,

    /// Fuseau des lieux sans fuseau déclaré
    #[arg(long, global = true, default_value = "America/Vancouver")]
    default_tz: String,

    /// Premier jour de la semaine pour l'import hebdomadaire (sunday|monday)
    #[arg(long, global = true, default_value = "sunday")]
    week_start: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Déclarer une région
    AddRegion {
        #[arg(long)]
        id: u32,
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0)]
        justin_id: u32,
    },

    /// Déclarer ou mettre à jour un lieu
    AddLocation {
        #[arg(long)]
        id: u32,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        agency_id: String,
        #[arg(long)]
        region: Option<u32>,
        /// Fuseau IANA (ex: America/Edmonton)
        #[arg(long)]
        timezone: Option<String>,
    },

    /// Déclarer une affectation prévue
    AddAssignment {
        #[arg(long)]
        id: u32,
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: u32,
    },

    /// Ajouter un shérif
    AddStaff {
        #[arg(long)]
        badge: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        home_location: Option<u32>,
        #[arg(long)]
        disabled: bool,
    },

    /// Importer du personnel depuis un CSV
    ImportStaff {
        #[arg(long)]
        csv: String,
    },

    /// Enregistrer un congé, une formation ou un détachement
    AddAbsence {
        #[arg(long)]
        badge: String,
        /// leave | training | away
        #[arg(long)]
        kind: String,
        /// RFC3339 ou AAAA-MM-JJ
        #[arg(long)]
        start: String,
        /// RFC3339 ou AAAA-MM-JJ
        #[arg(long)]
        end: String,
        /// Lieu de détachement (kind = away)
        #[arg(long)]
        location: Option<u32>,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Créer un quart
    AddShift {
        #[arg(long)]
        location: u32,
        #[arg(long, default_value = "jail")]
        r#type: String,
        /// RFC3339
        #[arg(long)]
        start: String,
        /// RFC3339
        #[arg(long)]
        end: String,
        #[arg(long)]
        badge: Option<String>,
        #[arg(long)]
        assignment: Option<u32>,
        #[arg(long)]
        timezone: Option<String>,
    },

    /// Importer des quarts depuis un CSV
    ImportShifts {
        #[arg(long)]
        csv: String,
    },

    /// Modifier un quart (type, horaires, shérif, affectation prévue)
    UpdateShift {
        #[arg(long)]
        shift_id: String,
        #[arg(long)]
        r#type: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long, conflicts_with = "unassign")]
        badge: Option<String>,
        #[arg(long)]
        unassign: bool,
        #[arg(long)]
        assignment: Option<u32>,
    },

    /// Remplacer les tâches d'un quart
    SetDuties {
        #[arg(long)]
        shift_id: String,
        /// liste "1,2,..." (vide: aucune tâche)
        #[arg(long, default_value = "")]
        duties: String,
    },

    /// Assigner un shérif à des quarts
    Assign {
        /// liste "id1,id2,..."
        #[arg(long)]
        shifts: String,
        #[arg(long)]
        badge: String,
        /// Retire le shérif des quarts existants en conflit
        #[arg(long = "override")]
        override_conflicts: bool,
    },

    /// Shérifs disponibles à un lieu sur une fenêtre
    Availability {
        #[arg(long)]
        location: u32,
        /// RFC3339
        #[arg(long)]
        start: String,
        /// RFC3339
        #[arg(long, conflicts_with = "days")]
        end: Option<String>,
        /// Nombre de jours (heure murale du lieu)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Quarts actifs d'un lieu sur une fenêtre (JSON)
    Shifts {
        #[arg(long)]
        location: u32,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },

    /// Expirer un quart
    Expire {
        #[arg(long)]
        shift_id: String,
    },

    /// Recopier les quarts de la semaine précédente
    ImportWeekly {
        #[arg(long)]
        location: u32,
        /// Sans ce drapeau: aperçu uniquement
        #[arg(long)]
        commit: bool,
    },

    /// Lister et optionnellement exporter
    List {
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Vérifier les conflits
    Check {
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let opts = ScheduleOptions {
        default_timezone: timezone::parse_tz(&cli.default_tz)?,
        week_start: cli
            .week_start
            .parse::<WeekStart>()
            .map_err(anyhow::Error::msg)?,
    };
    let service = RosterService::new(JsonStorage::open(&cli.roster)?, opts);

    match run(&service, cli.cmd) {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<SchedError>() {
            // Code 2 = règle métier violée
            Some(sched) if sched.is_business_rule() => {
                eprintln!("refused: {sched}");
                if let SchedError::Conflict { conflicts, .. } = sched {
                    for c in conflicts {
                        eprintln!("  {} {} <-> {}", c.kind, c.shift_a, c.shift_b);
                    }
                }
                std::process::exit(2);
            }
            _ => Err(err),
        },
    }
}

fn run(service: &RosterService<JsonStorage>, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::AddRegion {
            id,
            code,
            name,
            justin_id,
        } => {
            service.transact("add-region", |s| {
                s.upsert_region(Region {
                    id: RegionId(id),
                    justin_id,
                    code,
                    name,
                    expiry: None,
                });
                Ok(())
            })?;
        }
        Commands::AddLocation {
            id,
            name,
            agency_id,
            region,
            timezone,
        } => {
            service.transact("add-location", |s| {
                if let Some(region) = region {
                    if s.roster().find_region(RegionId(region)).is_none() {
                        return Err(SchedError::BusinessRule(format!("unknown region {region}")));
                    }
                }
                let mut location = Location::new(LocationId(id), name);
                location.agency_id = agency_id;
                location.region_id = region.map(RegionId);
                location.timezone = timezone;
                s.upsert_location(location)
            })?;
        }
        Commands::AddAssignment { id, name, location } => {
            service.transact("add-assignment", |s| {
                s.upsert_assignment(Assignment {
                    id: AssignmentId(id),
                    name,
                    location_id: LocationId(location),
                    expiry: None,
                })
            })?;
        }
        Commands::AddStaff {
            badge,
            first_name,
            last_name,
            home_location,
            disabled,
        } => {
            let id = service.transact("add-staff", |s| {
                if s.roster().find_staff_by_badge(&badge).is_some() {
                    return Err(SchedError::BusinessRule(format!("badge {badge} already exists")));
                }
                let mut staff = Staff::new(badge, first_name, last_name);
                staff.enabled = !disabled;
                staff.home_location_id = home_location.map(LocationId);
                let id = staff.id.clone();
                s.add_staff(vec![staff]);
                Ok(id)
            })?;
            println!("{id}");
        }
        Commands::ImportStaff { csv } => {
            let staff = io::import_staff_csv(csv)?;
            let count = staff.len();
            service.transact("import-staff", |s| {
                for person in &staff {
                    if s.roster().find_staff_by_badge(&person.badge_number).is_some() {
                        return Err(SchedError::BusinessRule(format!(
                            "badge {} already exists",
                            person.badge_number
                        )));
                    }
                }
                s.add_staff(staff);
                Ok(())
            })?;
            println!("imported {count} staff member(s)");
        }
        Commands::AddAbsence {
            badge,
            kind,
            start,
            end,
            location,
            comment,
        } => {
            let (start, _) = io::parse_point(&start)?;
            let (end, _) = io::parse_point(&end)?;
            service.transact("add-absence", |s| {
                let id = staff_id(s.roster(), &badge)?;
                let away_location = location.map(LocationId);
                if let Some(loc) = away_location {
                    if s.roster().find_location(loc).is_none() {
                        return Err(SchedError::UnknownLocation(loc.0));
                    }
                }
                let Some(staff) = s.roster_mut().find_staff_mut_by_id(&id) else {
                    return Err(SchedError::UnknownStaff(badge.clone()));
                };
                match kind.as_str() {
                    "leave" => {
                        let mut leave =
                            Leave::new(start, end).map_err(|_| SchedError::InvalidTimeRange)?;
                        leave.comment = comment;
                        staff.leave.push(leave);
                    }
                    "training" => {
                        let mut training = Training::new(start, end)
                            .map_err(|_| SchedError::InvalidTimeRange)?;
                        training.comment = comment;
                        staff.training.push(training);
                    }
                    "away" => {
                        let Some(loc) = away_location else {
                            return Err(SchedError::BusinessRule(
                                "away absence requires --location".to_string(),
                            ));
                        };
                        let mut away = AwayLocation::new(loc, start, end)
                            .map_err(|_| SchedError::InvalidTimeRange)?;
                        away.comment = comment;
                        staff.away_locations.push(away);
                    }
                    other => {
                        return Err(SchedError::BusinessRule(format!(
                            "unknown absence kind: {other}"
                        )))
                    }
                }
                Ok(())
            })?;
        }
        Commands::AddShift {
            location,
            r#type,
            start,
            end,
            badge,
            assignment,
            timezone,
        } => {
            let shift_type: ShiftType = r#type.parse().map_err(anyhow::Error::msg)?;
            let start = parse_instant(&start)?;
            let end = parse_instant(&end)?;
            let shift = service.transact("add-shift", |s| {
                let mut dto = ShiftDto::new(shift_type, LocationId(location), start, end);
                dto.sheriff_id = badge
                    .as_deref()
                    .map(|b| staff_id(s.roster(), b))
                    .transpose()?;
                dto.anticipated_assignment_id = assignment.map(AssignmentId);
                dto.timezone = timezone;
                s.add_shift(&dto)
            })?;
            println!("{}", shift.id);
        }
        Commands::ImportShifts { csv } => {
            let roster = service.storage().load()?;
            let shifts = io::import_shifts_csv(csv, &roster)?;
            let created = service.transact("import-shifts", |s| {
                shifts
                    .iter()
                    .map(|dto| s.add_shift(dto))
                    .collect::<Result<Vec<_>, _>>()
            })?;
            println!("imported {} shift(s)", created.len());
        }
        Commands::UpdateShift {
            shift_id,
            r#type,
            start,
            end,
            badge,
            unassign,
            assignment,
        } => {
            let sid = ShiftId::new(shift_id);
            let shift_type = r#type
                .map(|t| t.parse::<ShiftType>())
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let start = start.as_deref().map(parse_instant).transpose()?;
            let end = end.as_deref().map(parse_instant).transpose()?;
            let updated = service.transact("update-shift", |s| {
                let current = s
                    .roster()
                    .find_shift(&sid)
                    .ok_or_else(|| SchedError::UnknownShift(sid.as_str().to_string()))?;
                let mut dto = ShiftDto::from_shift(current, s.roster());
                if let Some(t) = shift_type {
                    dto.shift_type = t;
                }
                if let Some(start) = start {
                    dto.start_date = start.into();
                }
                if let Some(end) = end {
                    dto.end_date = end.into();
                }
                if unassign {
                    dto.sheriff_id = None;
                } else if let Some(badge) = badge.as_deref() {
                    dto.sheriff_id = Some(staff_id(s.roster(), badge)?);
                }
                if let Some(a) = assignment {
                    dto.anticipated_assignment_id = Some(AssignmentId(a));
                }
                s.update_shift(&dto)
            })?;
            print_json(&ShiftDto::from_shift(&updated, &service.storage().load()?))?;
        }
        Commands::SetDuties { shift_id, duties } => {
            let duties = duties
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(|d| d.parse::<u32>().map(DutyId))
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("invalid duty list: {duties}"))?;
            let shift = service.set_duties(&ShiftId::new(shift_id), &duties)?;
            print_json(&ShiftDto::from_shift(&shift, &service.storage().load()?))?;
        }
        Commands::Assign {
            shifts,
            badge,
            override_conflicts,
        } => {
            let ids: Vec<ShiftId> = shifts
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ShiftId::new)
                .collect();
            let roster = service.storage().load()?;
            let staff = staff_id(&roster, &badge)?;
            let assigned = service.assign_to_shifts(&ids, &staff, override_conflicts)?;
            for s in &assigned {
                println!("{} assigned to {}", s.id, badge);
            }
        }
        Commands::Availability {
            location,
            start,
            end,
            days,
        } => {
            let start = parse_instant(&start)?;
            let available = match (end, days) {
                (Some(end), _) => {
                    service.availability(LocationId(location), start, parse_instant(&end)?)?
                }
                (None, Some(days)) => {
                    service.availability_for_days(LocationId(location), start, days)?
                }
                (None, None) => bail!("either --end or --days is required"),
            };
            let out: Vec<StaffDto> = available.iter().map(StaffDto::from).collect();
            print_json(&out)?;
        }
        Commands::Shifts {
            location,
            start,
            end,
        } => {
            let shifts = service.shifts(
                LocationId(location),
                parse_instant(&start)?,
                parse_instant(&end)?,
            )?;
            print_json(&shifts)?;
        }
        Commands::Expire { shift_id } => {
            service.expire_shift(&ShiftId::new(shift_id))?;
        }
        Commands::ImportWeekly { location, commit } => {
            let imported = service.import_weekly_shifts(LocationId(location), commit)?;
            let roster = service.storage().load()?;
            let out: Vec<ShiftDto> = imported
                .iter()
                .map(|s| ShiftDto::from_shift(s, &roster))
                .collect();
            print_json(&out)?;
            if !commit {
                eprintln!("preview only: {} shift(s) not saved", out.len());
            }
        }
        Commands::List { out_json, out_csv } => {
            let roster = service.storage().load()?;
            if let Some(path) = out_json {
                io::export_roster_json(path, &roster)?;
            }
            if let Some(path) = out_csv {
                io::export_shifts_csv(path, &roster)?;
            }
            // impression compacte
            for s in &roster.shifts {
                let assigned = s
                    .staff_id
                    .as_ref()
                    .and_then(|id| roster.find_staff_by_id(id))
                    .map(|p| p.badge_number.as_str())
                    .unwrap_or("-");
                let state = if s.expiry.is_some() { " (expired)" } else { "" };
                println!(
                    "{} | {} | {} → {} ({} min) | {}{}",
                    s.id,
                    s.shift_type,
                    s.start.to_rfc3339(),
                    s.end.to_rfc3339(),
                    s.duration_minutes(),
                    assigned,
                    state
                );
            }
        }
        Commands::Check { report } => {
            let conflicts = service.detect_conflicts()?;
            if conflicts.is_empty() {
                println!("OK: no conflicts");
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                if let Some(path) = report {
                    io::export_conflicts_csv(path, &conflicts)?;
                }
                // Code 2 = WARNING/INCOMPLETE
                std::process::exit(2);
            }
        }
    }
    Ok(())
}

fn staff_id(roster: &Roster, badge: &str) -> Result<StaffId, SchedError> {
    roster
        .find_staff_by_badge(badge)
        .map(|p| p.id.clone())
        .ok_or_else(|| SchedError::UnknownStaff(badge.to_string()))
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw.trim())
        .with_context(|| format!("expected RFC3339 instant: {raw}"))?
        .with_timezone(&Utc))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
