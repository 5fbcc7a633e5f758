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

    /// Defaults to the first station.
    #[arg(long)]
    pub station_id: Option<StationId>,

    #[arg(long, default_value = "24h")]
    pub range: TimeRange,

    /// Also re-query the history every N seconds.
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,

    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}
