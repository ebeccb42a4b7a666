use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use rand::{rngs::StdRng, SeedableRng};
use tokio::{
    sync::{oneshot, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::state::{Frame, ScrambleConfig, ScrambleSession, TickOutcome};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error};

/// Receives every frame the animation produces.
pub type DisplaySink = Arc<dyn Fn(&str) + Send + Sync>;

struct Ticker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Drives a [`ScrambleSession`] on a tokio interval and owns the only tick
/// source for it. Starting any animation tears down the previous ticker
/// first.
#[derive(Clone)]
pub struct ScrambleController {
    id: String,
    session: Arc<Mutex<ScrambleSession>>,
    sink: DisplaySink,
    ticker: Arc<Mutex<Option<Ticker>>>,
}

impl ScrambleController {
    pub fn new(text: impl Into<String>, sink: DisplaySink, config: ScrambleConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session: Arc::new(Mutex::new(ScrambleSession::new(text, config))),
            sink,
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn snapshot(&self) -> ScrambleSession {
        self.session.lock().await.clone()
    }

    /// Scrambles every character on each continuous tick until [`stop`] is
    /// called.
    ///
    /// [`stop`]: ScrambleController::stop
    pub async fn start(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        shutdown_ticker(ticker_guard.take()).await;

        let period = {
            let mut session = self.session.lock().await;
            session.start_continuous();
            session.config().continuous_tick()
        };

        log_debug!("scramble {} started", self.id);
        *ticker_guard = Some(self.spawn_ticker(period, None));
    }

    pub async fn stop(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        shutdown_ticker(ticker_guard.take()).await;
        self.session.lock().await.stop();
        log_debug!("scramble {} stopped", self.id);
    }

    /// Runs both reveal phases and resolves once the display shows the
    /// original text. Fails if the animation is stopped or replaced first.
    pub async fn generate_back_to_original(&self) -> Result<()> {
        let done_rx = {
            let mut ticker_guard = self.ticker.lock().await;
            shutdown_ticker(ticker_guard.take()).await;

            let period = {
                let mut session = self.session.lock().await;
                session.begin_convergence();
                session.config().reveal_tick()
            };

            let (done_tx, done_rx) = oneshot::channel();
            *ticker_guard = Some(self.spawn_ticker(period, Some(done_tx)));
            done_rx
        };

        done_rx
            .await
            .map_err(|_| anyhow!("scramble {} was cancelled before converging", self.id))
    }

    fn spawn_ticker(&self, period: Duration, done: Option<oneshot::Sender<()>>) -> Ticker {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(tick_loop(
            self.id.clone(),
            self.session.clone(),
            self.sink.clone(),
            period,
            cancel.clone(),
            done,
        ));

        Ticker { handle, cancel }
    }
}

async fn shutdown_ticker(ticker: Option<Ticker>) {
    if let Some(ticker) = ticker {
        ticker.cancel.cancel();
        if let Err(err) = ticker.handle.await {
            if err.is_panic() {
                log_error!("scramble ticker panicked: {err}");
            }
        }
    }
}

async fn tick_loop(
    id: String,
    session: Arc<Mutex<ScrambleSession>>,
    sink: DisplaySink,
    period: Duration,
    cancel: CancellationToken,
    mut done: Option<oneshot::Sender<()>>,
) {
    // first frame lands one period after start, never immediately
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut rng = StdRng::from_entropy();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let frame: Option<Frame> = session.lock().await.step(&mut rng);
                let Some(frame) = frame else {
                    break;
                };

                sink(&frame.display);

                match frame.outcome {
                    TickOutcome::Continue => {}
                    TickOutcome::PhaseFinished(phase) => {
                        log_debug!("scramble {id} finished {phase:?}");
                    }
                    TickOutcome::Converged => {
                        if let Some(done) = done.take() {
                            let _ = done.send(());
                        }
                        break;
                    }
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}
