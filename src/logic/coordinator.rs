use crate::config::LocationConfig;
use crate::datasources::PageSource;
use crate::error::{NotAvailable, RefreshError, Stage};
use crate::models::{DailyForecast, Forecast, HourlyForecast};
use crate::parser;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::time::MissedTickBehavior;

/// A successfully normalized forecast and when it was fetched
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub forecast: Arc<Forecast>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FailedRefresh {
    pub stage: Stage,
    pub error: RefreshError,
    pub at: DateTime<Utc>,
}

/// What the entity layer shows for a location
#[derive(Debug, Clone, PartialEq)]
pub enum EntityStatus {
    /// No refresh has completed yet
    Pending,
    Fresh { fetched_at: DateTime<Utc> },
    /// Recent refreshes failed; the last good forecast is still served
    Stale {
        fetched_at: DateTime<Utc>,
        consecutive_failures: u32,
    },
    Unavailable { consecutive_failures: u32 },
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Pending => "pending",
            EntityStatus::Fresh { .. } => "available",
            EntityStatus::Stale { .. } => "stale",
            EntityStatus::Unavailable { .. } => "unavailable",
        }
    }
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hourly and daily arrays pushed to subscribers after every good refresh
#[derive(Debug, Clone, Serialize)]
pub struct ForecastFeed {
    pub entity_id: String,
    pub fetched_at: DateTime<Utc>,
    pub hourly: Vec<HourlyForecast>,
    pub daily: Vec<DailyForecast>,
}

#[derive(Debug, Clone, Copy)]
pub struct CoordinatorSettings {
    pub interval: Duration,
    pub failure_threshold: u32,
}

#[derive(Default)]
struct CoordinatorState {
    latest: Option<Snapshot>,
    consecutive_failures: u32,
    last_error: Option<FailedRefresh>,
    /// Bumped after every completed refresh attempt
    generation: u64,
}

impl CoordinatorState {
    fn last_outcome(&self) -> Result<Snapshot, RefreshError> {
        match (&self.last_error, &self.latest) {
            (Some(failed), _) => Err(failed.error.clone()),
            (None, Some(snapshot)) => Ok(snapshot.clone()),
            (None, None) => Err(RefreshError::Interrupted("no refresh completed".into())),
        }
    }
}

/// Owns the refresh lifecycle and the latest forecast for one location.
///
/// Refreshes are serialized; a caller that arrives while another refresh is in
/// flight waits for it and receives that refresh's outcome instead of starting
/// a second fetch.
pub struct ForecastCoordinator {
    location: LocationConfig,
    source: PageSource,
    settings: CoordinatorSettings,
    refresh_guard: Mutex<()>,
    state: RwLock<CoordinatorState>,
    feed: watch::Sender<Option<Arc<ForecastFeed>>>,
}

impl ForecastCoordinator {
    pub fn new(location: LocationConfig, source: PageSource, settings: CoordinatorSettings) -> Self {
        let (feed, _) = watch::channel(None);
        Self {
            location,
            source,
            settings,
            refresh_guard: Mutex::new(()),
            state: RwLock::new(CoordinatorState::default()),
            feed,
        }
    }

    pub fn location(&self) -> &LocationConfig {
        &self.location
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<ForecastFeed>>> {
        self.feed.subscribe()
    }

    /// Fetch, extract and normalize, then publish the result.
    ///
    /// On failure the previous forecast is kept and the failure is counted.
    pub async fn refresh(&self) -> Result<Snapshot, RefreshError> {
        let seen = self.state.read().await.generation;
        let _guard = self.refresh_guard.lock().await;
        {
            let state = self.state.read().await;
            if state.generation != seen {
                tracing::debug!("{}: joined in-flight refresh", self.location.name);
                return state.last_outcome();
            }
        }

        match self.fetch_and_parse().await {
            Ok(forecast) => Ok(self.publish(forecast).await),
            Err(error) => {
                self.record_failure(error.clone()).await;
                Err(error)
            }
        }
    }

    async fn fetch_and_parse(&self) -> Result<Forecast, RefreshError> {
        tracing::debug!("{}: fetching {}", self.location.name, self.source.describe());
        let html = self.source.fetch().await?;

        tracing::debug!("{}: parsing {} bytes", self.location.name, html.len());
        let name = self.location.name.clone();
        let parsed = tokio::task::spawn_blocking(move || parser::parse_page(&html, Some(&name)))
            .await
            .map_err(|e| RefreshError::Interrupted(e.to_string()))??;

        for warning in &parsed.warnings {
            tracing::warn!("{}: {}", self.location.name, warning);
        }
        Ok(parsed.forecast)
    }

    async fn publish(&self, forecast: Forecast) -> Snapshot {
        let snapshot = Snapshot {
            forecast: Arc::new(forecast),
            fetched_at: Utc::now(),
        };

        {
            let mut state = self.state.write().await;
            state.latest = Some(snapshot.clone());
            state.consecutive_failures = 0;
            state.last_error = None;
            state.generation += 1;
        }

        let feed = ForecastFeed {
            entity_id: self.location.entity_id(),
            fetched_at: snapshot.fetched_at,
            hourly: HourlyForecast::from_forecast(&snapshot.forecast),
            daily: DailyForecast::from_forecast(&snapshot.forecast),
        };
        self.feed.send_replace(Some(Arc::new(feed)));

        tracing::info!(
            "{}: forecast updated ({} days)",
            self.location.name,
            snapshot.forecast.forecast.len()
        );
        snapshot
    }

    async fn record_failure(&self, error: RefreshError) {
        let mut state = self.state.write().await;
        state.consecutive_failures += 1;
        state.generation += 1;
        state.last_error = Some(FailedRefresh {
            stage: error.stage(),
            error: error.clone(),
            at: Utc::now(),
        });

        let failures = state.consecutive_failures;
        tracing::warn!(
            "{}: refresh failed at {} stage ({} in a row): {}",
            self.location.name,
            error.stage(),
            failures,
            error
        );
        if failures == self.settings.failure_threshold {
            tracing::error!(
                "{}: marking unavailable after {} consecutive failures",
                self.location.name,
                failures
            );
        }
    }

    /// Latest forecast, unless none exists yet or failures crossed the threshold.
    pub async fn current(&self) -> Result<Snapshot, NotAvailable> {
        let state = self.state.read().await;
        if state.consecutive_failures >= self.settings.failure_threshold {
            return Err(NotAvailable::Degraded {
                consecutive_failures: state.consecutive_failures,
            });
        }
        match (&state.latest, &state.last_error) {
            (Some(snapshot), _) => Ok(snapshot.clone()),
            (None, Some(failed)) => Err(NotAvailable::FetchFailed(failed.error.clone())),
            (None, None) => Err(NotAvailable::NotYetFetched),
        }
    }

    pub async fn status(&self) -> EntityStatus {
        let state = self.state.read().await;
        let failures = state.consecutive_failures;
        match &state.latest {
            _ if failures >= self.settings.failure_threshold => EntityStatus::Unavailable {
                consecutive_failures: failures,
            },
            None if failures > 0 => EntityStatus::Unavailable {
                consecutive_failures: failures,
            },
            None => EntityStatus::Pending,
            Some(snapshot) if failures > 0 => EntityStatus::Stale {
                fetched_at: snapshot.fetched_at,
                consecutive_failures: failures,
            },
            Some(snapshot) => EntityStatus::Fresh {
                fetched_at: snapshot.fetched_at,
            },
        }
    }

    pub async fn last_error(&self) -> Option<FailedRefresh> {
        self.state.read().await.last_error.clone()
    }

    /// Refresh immediately, then every interval, until `shutdown` flips or its
    /// sender goes away. An in-flight refresh is dropped on shutdown without
    /// publishing anything.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "{}: polling every {}s",
            self.location.name,
            self.settings.interval.as_secs()
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            tokio::select! {
                _ = self.refresh() => {}
                _ = shutdown.changed() => {
                    tracing::info!("{}: abandoning in-flight refresh", self.location.name);
                    break;
                }
            }
        }

        tracing::debug!("{}: polling stopped", self.location.name);
    }
}
