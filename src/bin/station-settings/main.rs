mod args;

use std::process::ExitCode;

use agro_stations::{
    auth::Session, backend::Backend as _, db::PgBackend, logger, model::SensorsConfig,
    settings::SettingsEditor,
};
use anyhow::{Context as _, Result};
use args::{Args, Command};
use chrono::Utc;
use clap::Parser as _;

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

    let stations = backend
        .list_stations()
        .await
        .context("failed to list stations")?;
    let mut editor = SettingsEditor::new(stations)?;
    if let Some(station_id) = &args.station_id {
        editor.select(station_id)?;
    }

    let changed = match args.command {
        Command::List => {
            for station in editor.stations() {
                println!("{}\t{}", station.id, station.name);
            }
            false
        }
        Command::Add { name, offset } => {
            let draft = editor.draft_mut();
            let key = draft.add_sensor(Utc::now());
            if let Some(name) = name {
                draft.rename_sensor(&key, name)?;
            }
            draft.set_offset(&key, offset)?;
            println!("added sensor: {key}");
            true
        }
        Command::Remove { key } => {
            editor.draft_mut().remove_sensor(&key)?;
            true
        }
        Command::Rename { key, name } => {
            editor.draft_mut().rename_sensor(&key, name)?;
            true
        }
        Command::SetOffset { key, offset } => {
            editor.draft_mut().set_offset(&key, offset)?;
            true
        }
    };

    if changed {
        editor
            .save(&backend)
            .await
            .context("settings were not saved, try again")?;
        println!("saved");
    }

    let station = editor.station();
    println!();
    println!("{} ({})", station.name, station.id);
    print_config(editor.draft());

    session.sign_out();

    Ok(())
}

fn print_config(config: &SensorsConfig) {
    if config.is_empty() {
        println!("no sensors configured, use `add` to create one");
        return;
    }

    for (key, sensor) in config.iter() {
        println!("{key}\t{}\t{:+}", sensor.name, sensor.offset);
    }
}
