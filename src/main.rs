use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::info;

use clinicshift::calendar::{self, TargetPeriod};
use clinicshift::catalog::ShiftCatalog;
use clinicshift::clock::{Clock, SystemClock};
use clinicshift::config::Config;
use clinicshift::model::{Doctor, Shift};
use clinicshift::repository::InMemoryScheduleStore;
use clinicshift::scheduler::check_admissible;
use clinicshift::service::SchedulingService;

const USAGE: &str = "usage: clinicshift <command>
  weeks <year>              Monday starts of every week touching the year
  month <year> <month>      numbered weeks of a month
  check <from> [to]         whether a bulk creation may target the period
  demo                      run one creation against an in-memory store";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    clinicshift::observability::init(config.metrics_port)?;
    info!(
        "policy: max {} shifts per doctor, default horizon {} days",
        config.policy.max_shifts_per_doctor, config.policy.default_horizon_days
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["weeks", year] => {
            let year: i32 = year.parse()?;
            for range in calendar::weeks_of_year(year)?.ranges() {
                println!("{range}");
            }
        }
        ["month", year, month] => {
            let (year, month): (i32, u32) = (year.parse()?, month.parse()?);
            for week in 1..=calendar::week_count_in_month(year, month)? {
                let range = TargetPeriod::WeekOfMonth { year, month, week }.resolve()?;
                println!("week {week}: {range}");
            }
        }
        ["check", from, rest @ ..] if rest.len() <= 1 => {
            let start: NaiveDate = from.parse()?;
            let end = rest.first().map(|s| s.parse::<NaiveDate>()).transpose()?;
            let session = clinicshift::scheduler::CreationSession::new(config.policy, SystemClock.today());
            let proposal = session.propose(start, end)?;
            if proposal.defaulted {
                println!("no end date given, defaulting to {}", proposal.range.to);
            }
            match check_admissible(proposal.range, session.today()) {
                Ok(()) => println!("{} can be scheduled", proposal.range),
                Err(e) => println!("{e}"),
            }
        }
        ["demo"] => demo(config).await?,
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
    Ok(())
}

async fn demo(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let t = |h| NaiveTime::from_hms_opt(h, 0, 0).ok_or("bad hour");
    let catalog = ShiftCatalog::new(vec![
        Shift::new("Morning", t(7)?, t(12)?),
        Shift::new("Afternoon", t(13)?, t(18)?),
    ])?;
    let shifts: Vec<_> = catalog.iter().map(|s| s.id).collect();
    let store = Arc::new(InMemoryScheduleStore::new(catalog));
    let doctors: Vec<Doctor> = ["Ana Ruiz", "Bao Tran", "Chidi Okafor"]
        .into_iter()
        .map(|name| Doctor::new(name, "General Practice"))
        .collect();
    for doctor in &doctors {
        store.add_doctor(doctor.clone());
    }
    let ids: Vec<_> = doctors.iter().map(|d| d.id).collect();

    let service = SchedulingService::new(store.clone(), store.clone(), Arc::new(SystemClock), config.policy);
    let mut session = service.open_session();
    let start = session.today() + Duration::days(7);
    let proposal = session.propose(start, None)?;
    session.target(proposal.range)?;
    for shift in &shifts {
        session.add_shift(*shift)?;
    }
    service.precheck(&mut session, &ids).await?;
    for (i, doctor) in ids.iter().enumerate() {
        session.select(shifts[i % shifts.len()], *doctor)?;
    }
    let period_id = service.create_period(&mut session).await?;
    println!("created period {period_id} for {}", proposal.range);

    for day in service.weekly_grid(start).await?.days.values().flatten() {
        println!("{}  {:<10} {}  {}", day.date, day.shift.shift_type, day.shift.window(), day.doctor.full_name);
    }
    for gap in service.coverage_gaps(start).await? {
        println!("unscheduled in {}: {}", gap.week, gap.doctor.full_name);
    }
    Ok(())
}
