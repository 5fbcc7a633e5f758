use std::str::FromStr;

use agro_stations::model::{StationId, TimeRange};
use anyhow::{Context as _, Error, bail};

/// A line typed into the running dashboard.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Stations,
    Station(StationId),
    Range(TimeRange),
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = match (words.next(), words.next()) {
            (Some("stations"), None) => Command::Stations,
            (Some("station"), Some(id)) => Command::Station(StationId::from(id)),
            (Some("range"), Some(range)) => Command::Range(
                range
                    .parse()
                    .with_context(|| format!("failed to parse range: {range}"))?,
            ),
            (Some("quit" | "exit"), None) => Command::Quit,
            _ => bail!(
                "unknown command: {} (try: stations, station <id>, range <12h|24h|48h|7d>, quit)",
                s.trim()
            ),
        };

        if words.next().is_some() {
            bail!("unexpected arguments: {}", s.trim());
        }

        Ok(command)
    }
}
