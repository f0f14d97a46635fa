//! Wind acquisition: cache first, then one network fetch per coordinate,
//! then the best degraded value we can offer.
//!
//! Concurrent callers asking for the same coordinate share a single in-flight
//! request. The request runs on its own task, so it completes and clears its
//! in-flight marker even when every caller gives up on it. The in-flight map is
//! only locked to look up, register or clear a fetch, never across an await.

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError, RwLock, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{
    cache::{CacheEntry, Lookup, WeatherCache},
    clock::{Clock, SystemClock},
    config::WeatherSettings,
    error::WeatherError,
    model::{Coordinate, OperationStatus, WeatherReport, WindSample},
    provider::WeatherProvider,
};

type FetchResult = Result<CacheEntry<WeatherReport>, WeatherError>;
type InFlight = Shared<BoxFuture<'static, FetchResult>>;
type LastGood = Arc<RwLock<HashMap<String, CacheEntry<WeatherReport>>>>;
type InFlightMap = Arc<Mutex<HashMap<String, (u64, InFlight)>>>;

/// Where a [`WindReading`] came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingSource {
    Cache,
    Network,
    /// Last known good value, handed out because the fetch failed.
    Stale { reason: String },
    /// Calm placeholder, handed out because the fetch failed and nothing was cached.
    Synthetic { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindReading {
    pub coordinate: Coordinate,
    pub report: WeatherReport,
    pub captured_at: DateTime<Utc>,
    pub source: ReadingSource,
}

impl WindReading {
    fn new(coordinate: Coordinate, entry: CacheEntry<WeatherReport>, source: ReadingSource) -> Self {
        Self { coordinate, report: entry.value, captured_at: entry.captured_at, source }
    }

    pub fn wind(&self) -> WindSample {
        self.report.wind
    }

    /// True when this reading is a fallback rather than current data.
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, ReadingSource::Stale { .. } | ReadingSource::Synthetic { .. })
    }
}

/// Cache-backed wind source with request coalescing and optional auto-refresh.
#[derive(Clone)]
pub struct WeatherAcquisition {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for WeatherAcquisition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherAcquisition")
            .field("provider", &self.inner.provider)
            .field("settings", &self.inner.settings)
            .field("cached", &self.inner.cache.len())
            .finish_non_exhaustive()
    }
}

struct Inner {
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<WeatherCache<WeatherReport>>,
    last_good: LastGood,
    in_flight: InFlightMap,
    next_fetch_id: AtomicU64,
    settings: WeatherSettings,
    clock: Arc<dyn Clock>,
    status: watch::Sender<OperationStatus>,
    latest: watch::Sender<Option<WindReading>>,
    auto_refresh: tokio::sync::Mutex<Option<AutoRefresh>>,
}

#[derive(Debug)]
struct AutoRefresh {
    coordinate: Coordinate,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl AutoRefresh {
    async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!("Wind auto-refresh task ended abnormally: {}", e);
        }
    }
}

impl WeatherAcquisition {
    pub fn new(provider: Arc<dyn WeatherProvider>, settings: &WeatherSettings) -> Self {
        Self::with_clock(provider, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        provider: Arc<dyn WeatherProvider>,
        settings: &WeatherSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Arc::new(WeatherCache::with_clock(settings.cache_ttl(), clock.clone()));
        let (status, _) = watch::channel(OperationStatus::Idle);
        let (latest, _) = watch::channel(None);

        Self {
            inner: Arc::new(Inner {
                provider,
                cache,
                last_good: Arc::new(RwLock::new(HashMap::new())),
                in_flight: Arc::new(Mutex::new(HashMap::new())),
                next_fetch_id: AtomicU64::new(0),
                settings: settings.clone(),
                clock,
                status,
                latest,
                auto_refresh: tokio::sync::Mutex::new(None),
            }),
        }
    }

    pub fn cache(&self) -> &WeatherCache<WeatherReport> {
        &self.inner.cache
    }

    pub fn cache_key(&self, at: Coordinate) -> String {
        at.cache_key(self.inner.settings.key_precision)
    }

    pub fn status(&self) -> watch::Receiver<OperationStatus> {
        self.inner.status.subscribe()
    }

    pub fn latest(&self) -> watch::Receiver<Option<WindReading>> {
        self.inner.latest.subscribe()
    }

    /// Current wind at `at`.
    ///
    /// Errors only when the fetch failed and there is no fallback to offer;
    /// degraded readings are returned as `Ok` and flagged by their source.
    pub async fn acquire(&self, at: Coordinate) -> Result<WindReading, WeatherError> {
        let key = self.cache_key(at);

        match self.inner.cache.lookup(&key) {
            Lookup::Fresh(entry) => {
                debug!(%key, "wind cache hit");
                let reading = WindReading::new(at, entry, ReadingSource::Cache);
                self.inner.publish(OperationStatus::Success, &reading);
                return Ok(reading);
            }
            Lookup::Expired(entry) => {
                debug!(%key, "wind cache entry expired");
                self.inner.remember(&key, entry);
            }
            Lookup::Miss => debug!(%key, "wind cache miss"),
        }

        self.inner.status.send_replace(OperationStatus::Loading);

        let outcome = self.inner.join_or_start(&key, at).await;

        match outcome {
            Ok(entry) => {
                let reading = WindReading::new(at, entry, ReadingSource::Network);
                self.inner.publish(OperationStatus::Success, &reading);
                Ok(reading)
            }
            Err(err) => self.inner.degrade(at, &key, err),
        }
    }

    /// Drop the cached value for `at` and fetch again.
    pub async fn refresh(&self, at: Coordinate) -> Result<WindReading, WeatherError> {
        let key = self.cache_key(at);
        if let Some(entry) = self.inner.cache.invalidate(&key) {
            self.inner.remember(&key, entry);
        }
        self.acquire(at).await
    }

    /// Acquire now and then on every auto-refresh period, replacing any
    /// previous auto-refresh.
    pub async fn start_auto_refresh(&self, at: Coordinate) {
        let mut slot = self.inner.auto_refresh.lock().await;
        if let Some(previous) = slot.take() {
            debug!("Replacing wind auto-refresh for {}", previous.coordinate);
            previous.shutdown().await;
        }

        let period = self.inner.settings.auto_refresh();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let inner = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            refresh_loop(inner, at, period, token).await;
        });

        info!("Wind auto-refresh started for {} every {:?}", at, period);
        *slot = Some(AutoRefresh { coordinate: at, cancel, handle });
    }

    /// Stop auto-refresh. Once this returns, the refresh task has exited.
    pub async fn stop_auto_refresh(&self) {
        let previous = self.inner.auto_refresh.lock().await.take();
        if let Some(previous) = previous {
            let coordinate = previous.coordinate;
            previous.shutdown().await;
            info!("Wind auto-refresh stopped for {}", coordinate);
        }
    }

    pub async fn auto_refresh_target(&self) -> Option<Coordinate> {
        self.inner.auto_refresh.lock().await.as_ref().map(|r| r.coordinate)
    }
}

async fn refresh_loop(
    inner: Weak<Inner>,
    at: Coordinate,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(inner) = inner.upgrade() else {
            trace!("Wind acquisition dropped, ending auto-refresh");
            break;
        };
        let acquisition = WeatherAcquisition { inner };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = acquisition.acquire(at) => {
                if let Err(e) = result {
                    warn!("Wind auto-refresh for {} failed: {}", at, e);
                }
            }
        }
    }
}

impl Inner {
    fn join_or_start(&self, key: &str, at: Coordinate) -> InFlight {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, fetch)) = in_flight.get(key) {
            debug!(%key, "joining in-flight wind request");
            return fetch.clone();
        }

        let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        // The spawned task clears its marker through the same lock, so it
        // cannot do so before the insert below.
        let fetch = self.start_fetch(key.to_string(), at, id);
        in_flight.insert(key.to_string(), (id, fetch.clone()));
        fetch
    }

    fn start_fetch(&self, key: String, at: Coordinate, id: u64) -> InFlight {
        let provider = self.provider.clone();
        let cache = self.cache.clone();
        let last_good = self.last_good.clone();
        let in_flight = self.in_flight.clone();
        let timeout = self.settings.request_timeout();

        let marker = (in_flight.clone(), key.clone());
        let task = tokio::spawn(async move {
            debug!(%key, "requesting wind from provider");
            let result = match tokio::time::timeout(timeout, provider.current_weather(at)).await {
                Ok(Ok(report)) => {
                    let entry = cache.put(key.clone(), report);
                    last_good
                        .write()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(key.clone(), entry.clone());
                    Ok(entry)
                }
                Ok(Err(e)) => Err(e),
                Err(_) => Err(WeatherError::Timeout(timeout)),
            };
            clear_in_flight(&in_flight, &key, id);
            result
        });

        async move {
            task.await.unwrap_or_else(|e| {
                let (in_flight, key) = marker;
                clear_in_flight(&in_flight, &key, id);
                Err(WeatherError::Transport(format!("wind request task failed: {e}")))
            })
        }
        .boxed()
        .shared()
    }

    /// Keep `entry` as the degraded fallback for `key` unless we hold something newer.
    fn remember(&self, key: &str, entry: CacheEntry<WeatherReport>) {
        let mut last_good = self.last_good.write().unwrap_or_else(PoisonError::into_inner);
        match last_good.get(key) {
            Some(existing) if existing.captured_at >= entry.captured_at => {}
            _ => {
                last_good.insert(key.to_string(), entry);
            }
        }
    }

    fn degrade(
        &self,
        at: Coordinate,
        key: &str,
        err: WeatherError,
    ) -> Result<WindReading, WeatherError> {
        let message = err.to_string();
        self.status.send_replace(OperationStatus::Error(message.clone()));

        let stale = self.last_good.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned();
        if let Some(entry) = stale {
            warn!(%key, "wind fetch failed, serving value captured at {}: {}", entry.captured_at, err);
            let reading = WindReading::new(at, entry, ReadingSource::Stale { reason: message });
            self.latest.send_replace(Some(reading.clone()));
            return Ok(reading);
        }

        if self.settings.synthetic_fallback {
            warn!(%key, "wind fetch failed with nothing cached, serving calm wind: {}", err);
            let now = self.clock.now();
            let report = WeatherReport::from_wind("synthetic", WindSample::calm(), now);
            let entry = CacheEntry { value: report, captured_at: now };
            let reading = WindReading::new(at, entry, ReadingSource::Synthetic { reason: message });
            self.latest.send_replace(Some(reading.clone()));
            return Ok(reading);
        }

        warn!(%key, "wind fetch failed: {}", err);
        Err(err)
    }

    fn publish(&self, status: OperationStatus, reading: &WindReading) {
        self.status.send_replace(status);
        self.latest.send_replace(Some(reading.clone()));
    }
}

/// Forget the in-flight marker, unless a newer fetch already replaced it.
fn clear_in_flight(in_flight: &InFlightMap, key: &str, id: u64) {
    let mut in_flight = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
    if in_flight.get(key).is_some_and(|(current, _)| *current == id) {
        in_flight.remove(key);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(refresh) = self.auto_refresh.get_mut().take() {
            refresh.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use std::{collections::VecDeque, sync::atomic::AtomicUsize};

    /// Provider that replays scripted outcomes after an optional delay.
    #[derive(Debug, Default)]
    struct ScriptedProvider {
        calls: AtomicUsize,
        delay: Duration,
        script: Mutex<VecDeque<Result<WindSample, WeatherError>>>,
    }

    impl ScriptedProvider {
        fn new(delay: Duration, script: Vec<Result<WindSample, WeatherError>>) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), delay, script: Mutex::new(script.into()) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for ScriptedProvider {
        async fn current_weather(&self, _at: Coordinate) -> Result<WeatherReport, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(WeatherError::Transport("script exhausted".into())));
            next.map(|wind| WeatherReport::from_wind("scripted", wind, Utc::now()))
        }
    }

    fn wind(speed: f64, deg: f64) -> WindSample {
        WindSample::new(speed, deg).unwrap()
    }

    fn site() -> Coordinate {
        Coordinate::new(36.2754, 126.9094)
    }

    fn setup(
        provider: Arc<ScriptedProvider>,
        settings: WeatherSettings,
    ) -> (WeatherAcquisition, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let acq = WeatherAcquisition::with_clock(provider, &settings, clock.clone());
        (acq, clock)
    }

    #[tokio::test]
    async fn miss_fetches_then_hit_serves_from_cache() {
        let provider = ScriptedProvider::new(Duration::ZERO, vec![Ok(wind(4.0, 200.0))]);
        let (acq, _clock) = setup(provider.clone(), WeatherSettings::default());

        let first = acq.acquire(site()).await.unwrap();
        assert_eq!(first.source, ReadingSource::Network);
        assert_eq!(first.wind().direction_deg(), 200.0);

        let second = acq.acquire(site()).await.unwrap();
        assert_eq!(second.source, ReadingSource::Cache);
        assert_eq!(provider.calls(), 1);
        assert_eq!(*acq.status().borrow(), OperationStatus::Success);
    }

    #[tokio::test]
    async fn nearby_coordinates_share_a_cache_entry() {
        let provider = ScriptedProvider::new(Duration::ZERO, vec![Ok(wind(1.0, 10.0))]);
        let (acq, _clock) = setup(provider.clone(), WeatherSettings::default());

        acq.acquire(Coordinate::new(36.275_41, 126.909_41)).await.unwrap();
        let again = acq.acquire(Coordinate::new(36.275_39, 126.909_38)).await.unwrap();
        assert_eq!(again.source, ReadingSource::Cache);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_misses_coalesce_into_one_request() {
        let provider =
            ScriptedProvider::new(Duration::from_secs(1), vec![Ok(wind(3.0, 90.0)), Ok(wind(9.0, 0.0))]);
        let (acq, _clock) = setup(provider.clone(), WeatherSettings::default());

        let (a, b) = tokio::join!(acq.acquire(site()), acq.acquire(site()));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(provider.calls(), 1);
        assert_eq!(a.wind(), b.wind());
        assert_eq!(a.source, ReadingSource::Network);
        assert_eq!(b.source, ReadingSource::Network);
    }

    #[tokio::test(start_paused = true)]
    async fn different_keys_fetch_independently() {
        let provider =
            ScriptedProvider::new(Duration::from_secs(1), vec![Ok(wind(3.0, 90.0)), Ok(wind(5.0, 180.0))]);
        let (acq, _clock) = setup(provider.clone(), WeatherSettings::default());

        let other = Coordinate::new(37.0, 127.0);
        let (a, b) = tokio::join!(acq.acquire(site()), acq.acquire(other));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_without_cache_is_an_error() {
        let provider = ScriptedProvider::new(Duration::from_secs(60), vec![Ok(wind(3.0, 90.0))]);
        let (acq, _clock) = setup(provider.clone(), WeatherSettings::default());

        let err = acq.acquire(site()).await.unwrap_err();
        assert_eq!(err, WeatherError::Timeout(Duration::from_secs(30)));
        assert!(acq.status().borrow().is_error());
        assert!(acq.cache().is_empty(), "failures are not cached");
    }

    #[tokio::test]
    async fn failure_after_expiry_serves_stale_value() {
        let provider = ScriptedProvider::new(
            Duration::ZERO,
            vec![Ok(wind(6.0, 45.0)), Err(WeatherError::Status { status: 502, body: String::new() })],
        );
        let (acq, clock) = setup(provider.clone(), WeatherSettings::default());

        acq.acquire(site()).await.unwrap();
        clock.advance(chrono::Duration::minutes(40));

        let reading = acq.acquire(site()).await.unwrap();
        assert!(reading.is_degraded());
        assert!(matches!(reading.source, ReadingSource::Stale { .. }));
        assert_eq!(reading.wind().speed_mps(), 6.0);
        assert!(acq.status().borrow().is_error());
        assert_eq!(acq.latest().borrow().as_ref(), Some(&reading));
    }

    #[tokio::test]
    async fn refresh_bypasses_fresh_cache_but_keeps_fallback() {
        let provider = ScriptedProvider::new(
            Duration::ZERO,
            vec![Ok(wind(2.0, 10.0)), Err(WeatherError::Transport("offline".into()))],
        );
        let (acq, _clock) = setup(provider.clone(), WeatherSettings::default());

        acq.acquire(site()).await.unwrap();
        let reading = acq.refresh(site()).await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert!(matches!(reading.source, ReadingSource::Stale { .. }));
        assert_eq!(reading.wind().speed_mps(), 2.0);
    }

    #[tokio::test]
    async fn synthetic_fallback_when_enabled() {
        let provider =
            ScriptedProvider::new(Duration::ZERO, vec![Err(WeatherError::Parse("bad".into()))]);
        let settings = WeatherSettings { synthetic_fallback: true, ..WeatherSettings::default() };
        let (acq, _clock) = setup(provider, settings);

        let reading = acq.acquire(site()).await.unwrap();
        assert!(matches!(reading.source, ReadingSource::Synthetic { .. }));
        assert_eq!(reading.wind(), WindSample::calm());
        assert!(acq.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_fetches_periodically_until_stopped() {
        let provider = ScriptedProvider::new(
            Duration::ZERO,
            vec![Ok(wind(1.0, 0.0)), Ok(wind(2.0, 0.0)), Ok(wind(3.0, 0.0)), Ok(wind(4.0, 0.0))],
        );
        let settings =
            WeatherSettings { auto_refresh_secs: 600, cache_ttl_secs: 60, ..WeatherSettings::default() };
        let (acq, clock) = setup(provider.clone(), settings);
        let mut latest = acq.latest();

        acq.start_auto_refresh(site()).await;
        latest.changed().await.unwrap();
        assert_eq!(provider.calls(), 1);
        assert_eq!(acq.auto_refresh_target().await, Some(site()));

        clock.advance(chrono::Duration::minutes(10));
        tokio::time::sleep(Duration::from_secs(600)).await;
        latest.changed().await.unwrap();
        assert_eq!(provider.calls(), 2);

        acq.stop_auto_refresh().await;
        assert_eq!(acq.auto_refresh_target().await, None);
        clock.advance(chrono::Duration::minutes(30));
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn starting_new_auto_refresh_replaces_previous() {
        let provider = ScriptedProvider::new(
            Duration::ZERO,
            (0..10).map(|i| Ok(wind(f64::from(i), 0.0))).collect(),
        );
        let (acq, _clock) = setup(provider.clone(), WeatherSettings::default());
        let other = Coordinate::new(37.5, 127.0);

        acq.start_auto_refresh(site()).await;
        acq.start_auto_refresh(other).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(acq.auto_refresh_target().await, Some(other));
        let latest = acq.latest().borrow().clone().unwrap();
        assert_eq!(latest.coordinate, other);
        acq.stop_auto_refresh().await;
    }

    /// Never answers its first call; answers every later call at once.
    #[derive(Debug, Default)]
    struct StallsOnceProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for StallsOnceProvider {
        async fn current_weather(&self, _at: Coordinate) -> Result<WeatherReport, WeatherError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
            Ok(WeatherReport::from_wind("stalls-once", wind(5.0, 270.0), Utc::now()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_fetch_does_not_block_later_requests() {
        let provider = Arc::new(StallsOnceProvider::default());
        let acq = WeatherAcquisition::new(provider.clone(), &WeatherSettings::default());

        let gave_up = tokio::time::timeout(Duration::from_secs(1), acq.acquire(site())).await;
        assert!(gave_up.is_err());

        tokio::time::sleep(Duration::from_secs(600)).await;
        let started = tokio::time::Instant::now();
        let reading = acq.acquire(site()).await.unwrap();

        assert_eq!(reading.source, ReadingSource::Network);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_after_stopping_auto_refresh_mid_fetch_requests_again() {
        let provider = Arc::new(StallsOnceProvider::default());
        let acq = WeatherAcquisition::new(provider.clone(), &WeatherSettings::default());

        acq.start_auto_refresh(site()).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        acq.stop_auto_refresh().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(600)).await;
        let reading = acq.refresh(site()).await.unwrap();

        assert_eq!(reading.source, ReadingSource::Network);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_fetch_still_fills_the_cache() {
        let provider = ScriptedProvider::new(Duration::from_secs(5), vec![Ok(wind(7.0, 135.0))]);
        let (acq, _clock) = setup(provider.clone(), WeatherSettings::default());

        let gave_up = tokio::time::timeout(Duration::from_secs(1), acq.acquire(site())).await;
        assert!(gave_up.is_err());
        tokio::time::sleep(Duration::from_secs(10)).await;

        let reading = acq.acquire(site()).await.unwrap();
        assert_eq!(reading.source, ReadingSource::Cache);
        assert_eq!(reading.wind().speed_mps(), 7.0);
        assert_eq!(provider.calls(), 1);
    }
}
