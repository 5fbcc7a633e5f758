mod args;
mod command;
mod render;

use std::{process::ExitCode, time::Duration};

use agro_stations::{
    auth::{Gate, HOME_PATH, LOGIN_PATH, Session, gate},
    backend::Backend as _,
    db::PgBackend,
    feed::{FeedDriver, FeedUpdate, InsertOutcome, RefreshPolicy, Resolution},
    logger,
    model::{Station, StationId, TimeRange},
    overview::StationOverview,
};
use anyhow::{Context as _, Result, anyhow, bail};
use args::Args;
use chrono::Utc;
use chrono_tz::Tz;
use clap::Parser as _;
use indexmap::IndexMap;
use tokio::io::{AsyncBufReadExt as _, BufReader, stdin};

use crate::{command::Command, render::render};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();
    logger::init(args.log_level);

    let backend = PgBackend::connect(&args.database_url).await?;

    let mut session = Session::new(backend.clone());
    if gate(HOME_PATH, session.current_user()) == Gate::Redirect(LOGIN_PATH) {
        session.sign_in(&args.email, &args.password).await?;
    }

    let stations: IndexMap<StationId, Station> = backend
        .list_stations()
        .await
        .context("failed to list stations")?
        .into_iter()
        .map(|s| (s.id.clone(), s))
        .collect();

    let mut station_id = match args.station_id {
        Some(id) => id,
        None => stations
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| anyhow!("no stations"))?,
    };
    if !stations.contains_key(&station_id) {
        bail!("unknown station: {station_id}");
    }
    let mut range = args.range;

    let policy = match args.poll_interval_secs {
        Some(secs) => RefreshPolicy::polling(Duration::from_secs(secs)),
        None => RefreshPolicy::push_only(),
    };
    let mut driver = FeedDriver::new(backend, policy);
    if let Err(err) = driver.select(station_id.clone(), range.window()).await {
        eprintln!("{:#}", err.context("failed to open live feed"));
    }
    print_overview(&stations, &station_id, range, &driver, args.timezone)?;

    let mut lines = BufReader::new(stdin()).lines();

    loop {
        tokio::select! {
            update = driver.next_update(), if !driver.is_idle() => {
                let Some(update) = update else {
                    continue;
                };

                if update == FeedUpdate::SubscriptionClosed {
                    eprintln!("live feed closed, reconnecting: {station_id}");
                    if let Err(err) = driver.select(station_id.clone(), range.window()).await {
                        eprintln!("{:#}", err.context("failed to reconnect live feed"));
                    }
                }

                if matches!(
                    update,
                    FeedUpdate::History(Resolution::Stale)
                        | FeedUpdate::Insert(InsertOutcome::Duplicate | InsertOutcome::Ignored)
                ) {
                    continue;
                }

                print_overview(&stations, &station_id, range, &driver, args.timezone)?;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read command")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(err) => {
                        eprintln!("{err:#}");
                        continue;
                    }
                };

                match command {
                    Command::Stations => {
                        for station in stations.values() {
                            println!("{}\t{}", station.id, station.name);
                        }
                    }
                    Command::Station(id) => {
                        if !stations.contains_key(&id) {
                            eprintln!("unknown station: {id}");
                            continue;
                        }
                        station_id = id;
                        if let Err(err) = driver.select(station_id.clone(), range.window()).await {
                            eprintln!("{:#}", err.context("failed to switch station"));
                            continue;
                        }
                        print_overview(&stations, &station_id, range, &driver, args.timezone)?;
                    }
                    Command::Range(r) => {
                        range = r;
                        if let Err(err) = driver.select(station_id.clone(), range.window()).await {
                            eprintln!("{:#}", err.context("failed to switch range"));
                            continue;
                        }
                        print_overview(&stations, &station_id, range, &driver, args.timezone)?;
                    }
                    Command::Quit => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    driver.close()?;
    session.sign_out();

    Ok(())
}

fn print_overview(
    stations: &IndexMap<StationId, Station>,
    station_id: &StationId,
    range: TimeRange,
    driver: &FeedDriver<PgBackend>,
    timezone: Tz,
) -> Result<()> {
    let station = stations
        .get(station_id)
        .ok_or_else(|| anyhow!("unknown station: {station_id}"))?;

    let feed = driver.feed();
    let overview = StationOverview::build(station, feed.series(), feed.load_state(), Utc::now());

    println!();
    print!(
        "{}",
        render(&overview, range, timezone).context("failed to render overview")?
    );

    Ok(())
}
