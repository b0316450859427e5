//! Async driver for [`TimerEngine`].
//!
//! [`TimerService`] owns the engine behind a tokio mutex and runs at most one
//! ticker task that calls [`TimerEngine::on_tick_from`] once per second while
//! the engine is running. Starting a new tick source aborts the previous one,
//! leaving `Running` aborts it too, and ticks are stamped with the engine's
//! tick epoch so a late tick from a replaced source is ignored.
//!
//! When a completion asks for an automatic start, the ticker waits
//! [`AUTO_START_DELAY`](crate::timer::AUTO_START_DELAY) and then runs
//! [`TimerEngine::run_auto_start`] against whatever state the engine is in
//! at that point. A ticker waiting out that delay survives other commands.
//!
//! Every event produced by a command or by the ticker is published on a
//! broadcast channel; see [`TimerService::subscribe`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval};

use crate::error::ValidationError;
use crate::events::Event;
use crate::storage::{KvStore, TimerConfigPatch};
use crate::timer::{Clock, SystemClock, TimerEngine};

const EVENT_CAPACITY: usize = 64;

struct Ticker {
    epoch: u64,
    /// Set while the task sleeps before an automatic start.
    awaiting_auto_start: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub struct TimerService<S, C = SystemClock> {
    engine: Arc<Mutex<TimerEngine<S, C>>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    events: broadcast::Sender<Event>,
    tick_interval: Duration,
}

impl<S, C> Clone for TimerService<S, C> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            ticker: self.ticker.clone(),
            events: self.events.clone(),
            tick_interval: self.tick_interval,
        }
    }
}

fn interval_from_now(period: Duration) -> Interval {
    time::interval_at(Instant::now() + period, period)
}

impl<S, C> TimerService<S, C>
where
    S: KvStore + 'static,
    C: Clock + 'static,
{
    pub fn new(engine: TimerEngine<S, C>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            ticker: Arc::new(Mutex::new(None)),
            events,
            tick_interval: Duration::from_secs(1),
        }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Run `f` with shared access to the engine.
    pub async fn with_engine<R>(&self, f: impl FnOnce(&TimerEngine<S, C>) -> R) -> R {
        let engine = self.engine.lock().await;
        f(&engine)
    }

    pub async fn snapshot(&self) -> Event {
        self.engine.lock().await.snapshot()
    }

    pub async fn start(&self) -> Option<Event> {
        self.command(TimerEngine::start).await
    }

    pub async fn pause(&self) -> Option<Event> {
        self.command(TimerEngine::pause).await
    }

    pub async fn resume(&self) -> Option<Event> {
        self.command(TimerEngine::resume).await
    }

    pub async fn reset(&self) -> Option<Event> {
        self.command(TimerEngine::reset).await
    }

    pub async fn skip(&self) -> Option<Event> {
        self.command(TimerEngine::skip).await
    }

    /// # Errors
    /// Returns the validation failure when any patched field is out of range.
    pub async fn update_config(&self, patch: &TimerConfigPatch) -> Result<Event, ValidationError> {
        let event = self.engine.lock().await.update_config(patch)?;
        self.publish(&event);
        Ok(event)
    }

    pub async fn reset_daily_progress(&self) -> Event {
        let event = self.engine.lock().await.reset_daily_progress();
        self.stop_ticker().await;
        self.publish(&event);
        event
    }

    /// Stop the ticker without touching the engine.
    pub async fn shutdown(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.handle.abort();
        }
    }

    async fn command(
        &self,
        f: impl FnOnce(&mut TimerEngine<S, C>) -> Option<Event>,
    ) -> Option<Event> {
        let (event, running_epoch) = {
            let mut engine = self.engine.lock().await;
            let event = f(&mut engine);
            (event, engine.is_running().then(|| engine.tick_epoch()))
        };
        match running_epoch {
            Some(epoch) => self.sync_ticker(epoch).await,
            None => self.stop_ticker().await,
        }
        if let Some(event) = &event {
            self.publish(event);
        }
        event
    }

    /// Make sure exactly one ticker is driving `epoch`.
    async fn sync_ticker(&self, epoch: u64) {
        let mut slot = self.ticker.lock().await;
        if let Some(ticker) = slot.as_ref() {
            if ticker.epoch == epoch && !ticker.handle.is_finished() {
                return;
            }
        }
        if let Some(previous) = slot.take() {
            previous.handle.abort();
        }
        let awaiting_auto_start = Arc::new(AtomicBool::new(false));
        let handle = self.spawn_ticker(epoch, awaiting_auto_start.clone());
        *slot = Some(Ticker {
            epoch,
            awaiting_auto_start,
            handle,
        });
    }

    /// Abort the ticker once the engine has left `Running`, unless it is
    /// waiting to run an automatic start.
    async fn stop_ticker(&self) {
        let mut slot = self.ticker.lock().await;
        let idle = slot
            .as_ref()
            .is_some_and(|t| !t.awaiting_auto_start.load(Ordering::SeqCst));
        if idle {
            if let Some(ticker) = slot.take() {
                ticker.handle.abort();
                tracing::trace!(epoch = ticker.epoch, "ticker cancelled");
            }
        }
    }

    fn spawn_ticker(
        &self,
        mut epoch: u64,
        awaiting_auto_start: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let engine = self.engine.clone();
        let ticker = self.ticker.clone();
        let events = self.events.clone();
        let period = self.tick_interval;

        tokio::spawn(async move {
            let mut interval = interval_from_now(period);
            loop {
                interval.tick().await;

                let event = {
                    let mut engine = engine.lock().await;
                    if engine.tick_epoch() != epoch || !engine.is_running() {
                        break;
                    }
                    let event = engine.on_tick_from(epoch);
                    // Flag before releasing the engine so no command can
                    // observe the completion without it.
                    if let Some(Event::TimerCompleted {
                        auto_start_in_ms: Some(_),
                        ..
                    }) = &event
                    {
                        awaiting_auto_start.store(true, Ordering::SeqCst);
                    }
                    event
                };
                let Some(event) = event else { continue };
                let _ = events.send(event.clone());

                let Event::TimerCompleted {
                    auto_start_in_ms: Some(delay_ms),
                    ..
                } = event
                else {
                    break;
                };

                time::sleep(Duration::from_millis(delay_ms)).await;
                let advanced = {
                    let mut engine = engine.lock().await;
                    awaiting_auto_start.store(false, Ordering::SeqCst);
                    engine
                        .run_auto_start()
                        .map(|event| (event, engine.tick_epoch()))
                };
                let Some((event, next_epoch)) = advanced else {
                    break;
                };
                let _ = events.send(event);

                epoch = next_epoch;
                if let Some(slot) = ticker.lock().await.as_mut() {
                    slot.epoch = next_epoch;
                }
                interval = interval_from_now(period);
            }
            tracing::trace!(epoch, "ticker stopped");
        })
    }

    fn publish(&self, event: &Event) {
        // No subscribers is fine.
        let _ = self.events.send(event.clone());
    }
}
