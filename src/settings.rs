use anyhow::{Context as _, Result, anyhow, bail};
use indexmap::IndexMap;
use log::info;

use crate::{
    backend::Backend,
    model::{SensorsConfig, Station, StationId},
};

/// Calibration editor over the station list. Edits go to a draft that is
/// only written back to the station list once the backend accepts it.
#[derive(Debug, Clone)]
pub struct SettingsEditor {
    stations: IndexMap<StationId, Station>,
    selected: StationId,
    draft: SensorsConfig,
}

impl SettingsEditor {
    pub fn new(stations: Vec<Station>) -> Result<Self> {
        let stations: IndexMap<StationId, Station> =
            stations.into_iter().map(|s| (s.id.clone(), s)).collect();

        let Some((selected, station)) = stations.first() else {
            bail!("no stations");
        };
        let selected = selected.clone();
        let draft = station.sensors_config.clone().or_defaults();

        Ok(Self {
            stations,
            selected,
            draft,
        })
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn station(&self) -> &Station {
        &self.stations[&self.selected]
    }

    /// Switches to another station, discarding unsaved edits.
    pub fn select(&mut self, station_id: &StationId) -> Result<()> {
        let station = self
            .stations
            .get(station_id)
            .ok_or_else(|| anyhow!("unknown station: {station_id}"))?;

        self.draft = station.sensors_config.clone().or_defaults();
        self.selected = station_id.clone();
        Ok(())
    }

    pub fn draft(&self) -> &SensorsConfig {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut SensorsConfig {
        &mut self.draft
    }

    /// On failure the station list is left untouched and the draft is kept,
    /// so the save can be retried.
    pub async fn save<B: Backend>(&mut self, backend: &B) -> Result<()> {
        backend
            .update_station_config(&self.selected, &self.draft)
            .await
            .context("failed to save sensors config")?;

        if let Some(station) = self.stations.get_mut(&self.selected) {
            station.sensors_config = self.draft.clone();
        }
        info!("saved sensors config: {}", self.selected);

        Ok(())
    }
}
