use std::path::PathBuf;

use agro_stations::model::{StationId, TimeRange};
use chrono_tz::Tz;
use clap::Parser;
use log::LevelFilter;

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, env = "TZ")]
    pub timezone: Tz,

    #[arg(long, env = "STATION_EMAIL")]
    pub email: String,

    #[arg(long, env = "STATION_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub station_id: StationId,

    #[arg(long, default_value = "24h")]
    pub range: TimeRange,

    /// Written to stdout when omitted.
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[arg(long, default_value = "warn")]
    pub log_level: LevelFilter,
}
