use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tokio::{sync::Mutex, task::JoinHandle, time::Duration};
use tokio_util::sync::CancellationToken;

use crate::{api::StatsBackend, dashboard::Dashboard};

use super::loop_worker::{poll_loop, PollOutcome, Poller};

struct Worker {
    junction_id: String,
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Owns the periodic stats poller for the selected junction. At most one
/// worker runs at a time; restarting it invalidates cycles still in flight.
#[derive(Clone)]
pub struct StatsController {
    poller: Poller,
    period: Duration,
    worker: Arc<Mutex<Option<Worker>>>,
}

impl StatsController {
    pub fn new(backend: Arc<dyn StatsBackend>, dashboard: Dashboard, period: Duration) -> Self {
        Self {
            poller: Poller::new(backend, dashboard),
            period,
            worker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn generation(&self) -> u64 {
        self.poller.generation()
    }

    pub async fn active_junction(&self) -> Option<String> {
        self.worker
            .lock()
            .await
            .as_ref()
            .map(|worker| worker.junction_id.clone())
    }

    /// Starts polling `junction_id`, replacing any running worker.
    pub async fn start(&self, junction_id: String) -> Result<()> {
        let mut slot = self.worker.lock().await;
        if let Some(previous) = slot.take() {
            shutdown(previous).await?;
        }

        let generation = self.poller.retarget(Some(junction_id.clone()));
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            self.poller.clone(),
            junction_id.clone(),
            generation,
            self.period,
            cancel_token.clone(),
        ));

        info!("stats worker started for junction {junction_id} (generation {generation})");
        *slot = Some(Worker {
            junction_id,
            handle,
            cancel_token,
        });
        Ok(())
    }

    /// Stops polling. Results of cycles still in flight are discarded.
    pub async fn stop(&self) -> Result<()> {
        self.poller.retarget(None);
        match self.worker.lock().await.take() {
            Some(worker) => shutdown(worker).await,
            None => Ok(()),
        }
    }

    /// Runs one cycle for the polled junction right away. Returns `false`
    /// when nothing is being polled or a cycle is already running.
    pub async fn refresh_now(&self) -> bool {
        let Some((junction_id, generation)) = self.poller.current() else {
            return false;
        };
        !matches!(
            self.poller.poll(&junction_id, generation).await,
            PollOutcome::Skipped
        )
    }
}

async fn shutdown(worker: Worker) -> Result<()> {
    worker.cancel_token.cancel();
    worker
        .handle
        .await
        .with_context(|| format!("stats worker for junction {} failed to join", worker.junction_id))
}
