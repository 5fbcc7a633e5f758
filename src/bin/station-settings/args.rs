use agro_stations::model::StationId;
use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, env = "STATION_EMAIL")]
    pub email: String,

    #[arg(long, env = "STATION_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Defaults to the first station.
    #[arg(long)]
    pub station_id: Option<StationId>,

    #[arg(long, default_value = "warn")]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show stations and the calibration of the selected one.
    List,

    /// Add a sensor with a generated key.
    Add {
        #[arg(long)]
        name: Option<String>,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        offset: f64,
    },

    Remove {
        #[arg(long)]
        key: String,
    },

    Rename {
        #[arg(long)]
        key: String,

        #[arg(long)]
        name: String,
    },

    /// Set the additive correction of a sensor, e.g. `--offset -1.5`.
    SetOffset {
        #[arg(long)]
        key: String,

        #[arg(long, allow_hyphen_values = true)]
        offset: f64,
    },
}
