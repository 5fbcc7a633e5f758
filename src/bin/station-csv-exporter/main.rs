mod args;
mod csv;

use std::{fs::File, io, process::ExitCode};

use agro_stations::{
    auth::Session,
    backend::Backend as _,
    calibration::calibrate_series,
    db::PgBackend,
    logger,
    series::aggregate,
};
use anyhow::{Context as _, Result, anyhow};
use args::Args;
use chrono::Utc;
use clap::Parser as _;

use crate::csv::write_series;

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
    session.sign_in(&args.email, &args.password).await?;

    let station = backend
        .list_stations()
        .await
        .context("failed to list stations")?
        .into_iter()
        .find(|s| s.id == args.station_id)
        .ok_or_else(|| anyhow!("unknown station: {}", args.station_id))?;

    let since = Utc::now() - args.range.window();
    let measurements = backend
        .query_measurements(&station.id, since)
        .await
        .context("failed to fetch measurements")?;
    let series = aggregate(calibrate_series(&measurements, &station.sensors_config));

    let rows = match &args.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create file: {:?}", path))?;
            write_series(file, &series, args.timezone)?
        }
        None => write_series(io::stdout().lock(), &series, args.timezone)?,
    };

    log::info!("exported {rows} measurements of {}", station.id);
    session.sign_out();

    Ok(())
}
