use super::coordinator::{
    CoordinatorSettings, EntityStatus, ForecastCoordinator, ForecastFeed, Snapshot,
};
use crate::config::{Config, LocationConfig};
use crate::datasources::{PageSource, VentuskyClient};
use crate::error::{Result, VentuskyError};
use crate::models::{CurrentConditions, DailyForecast, HourlyForecast, SensorReadings};
use chrono::{Local, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One independent coordinator per configured location.
pub struct ForecastHub {
    coordinators: HashMap<String, Arc<ForecastCoordinator>>,
}

impl ForecastHub {
    pub fn new() -> Self {
        Self {
            coordinators: HashMap::new(),
        }
    }

    /// Network-backed coordinators for every configured location
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut hub = Self::new();
        for location in &config.locations {
            let client = VentuskyClient::new(&config.fetch)?;
            let source = PageSource::http(client, location);
            let settings = CoordinatorSettings {
                interval: location.refresh_period(),
                failure_threshold: config.failure_threshold,
            };
            hub.insert(ForecastCoordinator::new(location.clone(), source, settings))?;
        }
        Ok(hub)
    }

    pub fn insert(&mut self, coordinator: ForecastCoordinator) -> Result<Arc<ForecastCoordinator>> {
        let id = coordinator.location().unique_id();
        if self.coordinators.contains_key(&id) {
            return Err(VentuskyError::Config(format!(
                "location {} is already configured",
                id
            )));
        }
        let coordinator = Arc::new(coordinator);
        self.coordinators.insert(id, Arc::clone(&coordinator));
        Ok(coordinator)
    }

    pub fn coordinator(&self, location: &LocationConfig) -> Result<&Arc<ForecastCoordinator>> {
        self.coordinators
            .get(&location.unique_id())
            .ok_or_else(|| VentuskyError::NotFound(format!("location {}", location.name)))
    }

    pub fn coordinators(&self) -> impl Iterator<Item = &Arc<ForecastCoordinator>> {
        self.coordinators.values()
    }

    async fn snapshot(&self, location: &LocationConfig) -> Result<Snapshot> {
        Ok(self.coordinator(location)?.current().await?)
    }

    pub async fn get_current_conditions(&self, location: &LocationConfig) -> Result<CurrentConditions> {
        self.current_conditions_at(location, Local::now().naive_local())
            .await
    }

    pub async fn current_conditions_at(
        &self,
        location: &LocationConfig,
        now: NaiveDateTime,
    ) -> Result<CurrentConditions> {
        let snapshot = self.snapshot(location).await?;
        CurrentConditions::select(&snapshot.forecast, now)
            .ok_or_else(|| VentuskyError::NotFound(format!("forecast slots for {}", location.name)))
    }

    pub async fn get_hourly_forecast(&self, location: &LocationConfig) -> Result<Vec<HourlyForecast>> {
        let snapshot = self.snapshot(location).await?;
        Ok(HourlyForecast::from_forecast(&snapshot.forecast))
    }

    pub async fn get_daily_forecast(&self, location: &LocationConfig) -> Result<Vec<DailyForecast>> {
        let snapshot = self.snapshot(location).await?;
        Ok(DailyForecast::from_forecast(&snapshot.forecast))
    }

    pub async fn get_sensor_readings(&self, location: &LocationConfig) -> Result<SensorReadings> {
        let snapshot = self.snapshot(location).await?;
        Ok(SensorReadings::from_forecast(
            &snapshot.forecast,
            Local::now().naive_local(),
        ))
    }

    pub async fn status(&self, location: &LocationConfig) -> Result<EntityStatus> {
        Ok(self.coordinator(location)?.status().await)
    }

    pub fn subscribe(
        &self,
        location: &LocationConfig,
    ) -> Result<watch::Receiver<Option<Arc<ForecastFeed>>>> {
        Ok(self.coordinator(location)?.subscribe())
    }

    /// Start every coordinator's polling loop, staggered so locations do not
    /// all hit the site at once.
    pub fn spawn_all(&self, shutdown: &watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        self.coordinators
            .values()
            .enumerate()
            .map(|(i, coordinator)| {
                let coordinator = Arc::clone(coordinator);
                let mut shutdown = shutdown.clone();
                let delay = Duration::from_secs(2 * i as u64);
                tokio::spawn(async move {
                    let stopped = tokio::select! {
                        _ = tokio::time::sleep(delay) => false,
                        _ = shutdown.changed() => true,
                    };
                    if !stopped {
                        coordinator.run(shutdown).await;
                    }
                })
            })
            .collect()
    }
}

impl Default for ForecastHub {
    fn default() -> Self {
        Self::new()
    }
}
