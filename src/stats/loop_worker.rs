use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};

use chrono::Utc;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    api::{ApiError, StatsBackend},
    dashboard::Dashboard,
    models::SignalId,
};

use super::aggregate::{merge_signals, merge_video_sources, summarize};

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Marks an idle in-flight slot; otherwise the slot holds `generation + 1`.
const NO_POLL: u64 = 0;

/// Result of a single poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The cycle landed; carries the signals whose values were replaced.
    Applied(Vec<SignalId>),
    /// Another cycle of the same generation was still running.
    Skipped,
    /// The junction changed while the cycle was in flight.
    Stale,
    Failed(ApiError),
}

#[derive(Debug, Default)]
struct Target {
    generation: u64,
    junction_id: Option<String>,
}

/// Runs poll cycles against the stats backend and applies them to the
/// dashboard. Clones share the target junction and the in-flight slot.
#[derive(Clone)]
pub struct Poller {
    backend: Arc<dyn StatsBackend>,
    dashboard: Dashboard,
    target: Arc<Mutex<Target>>,
    in_flight: Arc<AtomicU64>,
}

/// Holds the in-flight slot for one generation. A cycle from a newer
/// generation may take the slot over; the old guard then leaves it alone.
struct InFlightGuard {
    slot: Arc<AtomicU64>,
    mark: u64,
}

impl InFlightGuard {
    fn acquire(slot: &Arc<AtomicU64>, generation: u64) -> Option<Self> {
        let mark = generation + 1;
        let mut current = slot.load(Ordering::Acquire);
        loop {
            if current != NO_POLL && current >= mark {
                return None;
            }
            match slot.compare_exchange(current, mark, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => {
                    return Some(Self {
                        slot: slot.clone(),
                        mark,
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let _ = self
            .slot
            .compare_exchange(self.mark, NO_POLL, Ordering::AcqRel, Ordering::Acquire);
    }
}

impl Poller {
    pub fn new(backend: Arc<dyn StatsBackend>, dashboard: Dashboard) -> Self {
        Self {
            backend,
            dashboard,
            target: Arc::new(Mutex::new(Target::default())),
            in_flight: Arc::new(AtomicU64::new(NO_POLL)),
        }
    }

    fn target(&self) -> MutexGuard<'_, Target> {
        self.target.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn generation(&self) -> u64 {
        self.target().generation
    }

    /// The junction being polled together with its generation.
    pub fn current(&self) -> Option<(String, u64)> {
        let target = self.target();
        target
            .junction_id
            .clone()
            .map(|junction_id| (junction_id, target.generation))
    }

    /// Points the poller at `junction_id` (or at nothing) and invalidates
    /// every cycle started before the call. Returns the new generation.
    pub fn retarget(&self, junction_id: Option<String>) -> u64 {
        let mut target = self.target();
        target.generation += 1;
        target.junction_id = junction_id;
        target.generation
    }

    pub fn is_polling(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) != NO_POLL
    }

    /// Fetches all four signals and applies them together, or not at all.
    pub async fn poll(&self, junction_id: &str, generation: u64) -> PollOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, generation) else {
            log::debug!("stats poll for junction {junction_id} skipped, previous poll still running");
            return PollOutcome::Skipped;
        };

        let fetched = tokio::try_join!(
            self.backend.latest_stats(junction_id, SignalId::A),
            self.backend.latest_stats(junction_id, SignalId::B),
            self.backend.latest_stats(junction_id, SignalId::C),
            self.backend.latest_stats(junction_id, SignalId::D),
        );

        if self.generation() != generation {
            log::debug!("discarding stats for junction {junction_id} from generation {generation}");
            return PollOutcome::Stale;
        }

        let responses = match fetched {
            Ok((a, b, c, d)) => [a, b, c, d],
            Err(err) => {
                self.dashboard.error(err.to_string());
                return PollOutcome::Failed(err);
            }
        };

        let mut updated = Vec::new();
        self.dashboard.update(|view| {
            updated = merge_signals(&mut view.signals, &responses);
            merge_video_sources(&mut view.video_sources, &responses);
            view.summary = summarize(&responses);
            view.last_updated = Some(Utc::now());
        });
        PollOutcome::Applied(updated)
    }
}

/// Polls immediately, then every `period` until `cancel_token` fires.
pub async fn poll_loop(
    poller: Poller,
    junction_id: String,
    generation: u64,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!("stats polling started for junction {junction_id} every {}s", period.as_secs_f32());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tokio::select! {
                    _ = poller.poll(&junction_id, generation) => {}
                    _ = cancel_token.cancelled() => break,
                }
            }
            _ = cancel_token.cancelled() => break,
        }
    }

    log_info!("stats polling stopped for junction {junction_id}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResult, LatestStatsResponse};
    use crate::models::{SignalStats, SignalStatus};
    use async_trait::async_trait;

    #[derive(Default)]
    struct FakeStats {
        failing: Mutex<Vec<SignalId>>,
        vehicles: Mutex<u64>,
        calls: AtomicU64,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl StatsBackend for FakeStats {
        async fn latest_stats(
            &self,
            _junction_id: &str,
            signal: SignalId,
        ) -> ApiResult<LatestStatsResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.lock().unwrap().contains(&signal) {
                return Err(ApiError::Server {
                    status: 500,
                    message: format!("Failed to fetch stats for signal {signal}"),
                });
            }
            let vehicles = *self.vehicles.lock().unwrap();
            Ok(LatestStatsResponse {
                signals: vec![SignalStats {
                    id: signal,
                    vehicles,
                    weight: 0.0,
                    efficiency: 50.0,
                    time: 30,
                    status: if signal == SignalId::C {
                        SignalStatus::Green
                    } else {
                        SignalStatus::Red
                    },
                    video: Some(format!("/media/processed_{signal}.mp4")),
                }],
            })
        }
    }

    fn error_lines(dashboard: &Dashboard) -> usize {
        dashboard.read(|view| {
            view.log
                .entries()
                .filter(|entry| entry.to_string().starts_with("[ERROR]"))
                .count()
        })
    }

    #[tokio::test]
    async fn successful_cycle_updates_everything() {
        let backend = Arc::new(FakeStats::default());
        *backend.vehicles.lock().unwrap() = 5;
        let dashboard = Dashboard::new();
        let poller = Poller::new(backend, dashboard.clone());

        let outcome = poller.poll("1", poller.generation()).await;

        assert_eq!(outcome, PollOutcome::Applied(SignalId::ALL.to_vec()));
        let view = dashboard.snapshot();
        assert_eq!(view.summary.total_vehicles, 20);
        assert!((view.summary.system_efficiency - 50.0).abs() < f64::EPSILON);
        assert_eq!(view.summary.cycle_time, 120);
        assert_eq!(view.summary.active_signal, Some(SignalId::C));
        assert_eq!(
            view.video_sources.get(SignalId::B),
            Some("/media/processed_B.mp4")
        );
        assert!(view.last_updated.is_some());
    }

    #[tokio::test]
    async fn one_failing_signal_aborts_the_cycle() {
        let backend = Arc::new(FakeStats::default());
        *backend.vehicles.lock().unwrap() = 3;
        let dashboard = Dashboard::new();
        let poller = Poller::new(backend.clone(), dashboard.clone());
        poller.poll("1", 0).await;
        let before = dashboard.snapshot();

        *backend.vehicles.lock().unwrap() = 9;
        backend.failing.lock().unwrap().push(SignalId::C);
        let outcome = poller.poll("1", 0).await;

        assert!(matches!(outcome, PollOutcome::Failed(ApiError::Server { status: 500, .. })));
        let after = dashboard.snapshot();
        for signal in SignalId::ALL {
            assert_eq!(after.signal(signal).vehicles, before.signal(signal).vehicles);
        }
        assert_eq!(after.summary, before.summary);
        assert_eq!(error_lines(&dashboard), 1);
        assert_eq!(
            after.log.last().map(ToString::to_string).as_deref(),
            Some("[ERROR] Failed to fetch stats for signal C")
        );
    }

    #[tokio::test]
    async fn result_from_an_old_generation_is_dropped() {
        let backend = Arc::new(FakeStats {
            delay: Some(Duration::from_millis(50)),
            ..FakeStats::default()
        });
        *backend.vehicles.lock().unwrap() = 7;
        let dashboard = Dashboard::new();
        let poller = Poller::new(backend, dashboard.clone());

        let generation = poller.generation();
        let pending = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.poll("1", generation).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        poller.retarget(Some("2".into()));

        assert_eq!(pending.await.unwrap(), PollOutcome::Stale);
        assert_eq!(dashboard.read(|v| v.summary.total_vehicles), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_poll_is_skipped() {
        let backend = Arc::new(FakeStats {
            delay: Some(Duration::from_secs(8)),
            ..FakeStats::default()
        });
        let poller = Poller::new(backend.clone(), Dashboard::new());

        let first = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.poll("1", 0).await })
        };
        tokio::task::yield_now().await;
        assert!(poller.is_polling());

        assert_eq!(poller.poll("1", 0).await, PollOutcome::Skipped);
        assert!(matches!(first.await.unwrap(), PollOutcome::Applied(_)));
        assert!(!poller.is_polling());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_cycle_does_not_hold_back_the_next_junction() {
        let backend = Arc::new(FakeStats {
            delay: Some(Duration::from_secs(3)),
            ..FakeStats::default()
        });
        let dashboard = Dashboard::new();
        let poller = Poller::new(backend.clone(), dashboard.clone());
        let old = poller.retarget(Some("1".into()));

        let first = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.poll("1", old).await })
        };
        tokio::task::yield_now().await;
        assert!(poller.is_polling());

        let new = poller.retarget(Some("2".into()));
        let second = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.poll("2", new).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(poller.poll("2", new).await, PollOutcome::Skipped);

        assert_eq!(first.await.unwrap(), PollOutcome::Stale);
        assert!(matches!(second.await.unwrap(), PollOutcome::Applied(_)));
        assert!(!poller.is_polling());
        assert_eq!(poller.poll("1", old).await, PollOutcome::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_polls_immediately_then_every_period() {
        let backend = Arc::new(FakeStats::default());
        let poller = Poller::new(backend.clone(), Dashboard::new());
        let token = CancellationToken::new();

        let handle = tokio::spawn(poll_loop(
            poller,
            "1".into(),
            0,
            Duration::from_secs(5),
            token.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 4);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 8);

        token.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 8);
    }
}
