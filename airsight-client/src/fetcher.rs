//! Polling controller for the live readings of one device.
//!
//! A [`ReadingFetcher`] owns a background task that requests the latest
//! reading (or the recent window) of the selected device on spawn, on every
//! refresh tick, on [`ReadingFetcher::refresh`] and whenever the device
//! changes. The task is the only writer of the published [`FetchState`];
//! consumers observe it through a `watch` receiver.
//!
//! Responses are applied in the order they complete. Every request carries
//! the epoch of the device selection it was issued for, so an answer for a
//! device that is no longer selected is dropped instead of overwriting the
//! new device's state. Dropping the fetcher or calling
//! [`ReadingFetcher::shutdown`] cancels the timer and every pending request.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use airsight_api::models::{Reading, SensorData};
use airsight_api::quality::{self, Assessment};
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, timeout};

use crate::error::{FetchError, Result};
use crate::transport::SensorTransport;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FetcherOptions {
    /// Device to follow; nothing is requested while empty
    pub device_id: String,
    pub refresh_interval: Duration,
    /// Poll every `refresh_interval`; otherwise fetch once per device selection
    pub auto_refresh: bool,
    /// Ask for the recent window instead of the latest reading
    pub historical: bool,
    /// Upper bound for a single request
    pub request_timeout: Duration,
}

impl FetcherOptions {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            ..Self::default()
        }
    }
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            device_id: String::new(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            auto_refresh: true,
            historical: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// No device selected
    Idle,
    Loading,
    Ready,
    Error,
}

/// Snapshot published to consumers.
///
/// A failed attempt leaves `data` as it was, so the last good reading stays
/// visible next to the error; `is_connected` and `error` always reflect the
/// most recent completed attempt. `phase` stays `Loading` while any request
/// for the device is still pending.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState {
    pub device_id: String,
    pub phase: FetchPhase,
    pub data: Option<SensorData>,
    pub error: Option<String>,
    pub is_connected: bool,
    pub last_updated: Option<OffsetDateTime>,
}

impl FetchState {
    fn new(device_id: String) -> Self {
        Self {
            device_id,
            phase: FetchPhase::Idle,
            data: None,
            error: None,
            is_connected: false,
            last_updated: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == FetchPhase::Loading
    }

    /// Newest reading held, if any.
    pub fn reading(&self) -> Option<&Reading> {
        self.data.as_ref().and_then(SensorData::latest)
    }

    pub fn assessment(&self) -> Option<Assessment> {
        self.reading().map(quality::assess)
    }
}

enum Command {
    Refresh,
    SelectDevice(String),
}

pub struct ReadingFetcher {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<FetchState>,
    task: Option<JoinHandle<()>>,
}

impl ReadingFetcher {
    /// Starts following `options.device_id`. Must be called within a tokio runtime.
    pub fn spawn(transport: Arc<dyn SensorTransport>, options: FetcherOptions) -> Self {
        let (commands, command_receiver) = mpsc::unbounded_channel();
        let (state_sender, state) = watch::channel(FetchState::new(options.device_id.clone()));

        let poller = Poller {
            transport,
            options,
            state: state_sender,
            commands: command_receiver,
            epoch: 0,
            pending: 0,
            in_flight: JoinSet::new(),
        };

        Self {
            commands,
            state,
            task: Some(tokio::spawn(poller.run())),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.clone()
    }

    /// Requests an immediate fetch, even while another one is in flight.
    pub fn refresh(&self) {
        let _ = self.commands.send(Command::Refresh);
    }

    /// Follows another device. Pending answers for the previous one are dropped.
    pub fn select_device(&self, device_id: impl Into<String>) {
        let _ = self.commands.send(Command::SelectDevice(device_id.into()));
    }

    /// Stops polling and waits until the background task is gone. No state
    /// change is published after this returns.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for ReadingFetcher {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

type Outcome = (u64, Result<SensorData>);

struct Poller {
    transport: Arc<dyn SensorTransport>,
    options: FetcherOptions,
    state: watch::Sender<FetchState>,
    commands: mpsc::UnboundedReceiver<Command>,
    /// Bumped on every device selection
    epoch: u64,
    /// Requests of the current epoch not yet completed
    pending: usize,
    in_flight: JoinSet<Outcome>,
}

impl Poller {
    async fn run(mut self) {
        let mut ticker = self.ticker();
        self.begin();

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Refresh) => self.begin(),
                    Some(Command::SelectDevice(device_id)) => {
                        self.select(device_id);
                        ticker = self.ticker();
                        self.begin();
                    }
                    None => break,
                },
                _ = tick(&mut ticker) => self.begin(),
                Some(joined) = self.in_flight.join_next() => self.complete(joined),
            }
        }

        tracing::debug!("fetcher for {} stopped", self.options.device_id);
    }

    /// Repeating timer, first tick one period from now.
    fn ticker(&self) -> Option<Interval> {
        let period = self.options.refresh_interval;
        if !self.options.auto_refresh || period.is_zero() {
            return None;
        }

        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Some(interval)
    }

    fn select(&mut self, device_id: String) {
        tracing::debug!("switching from {} to {}", self.options.device_id, device_id);

        self.epoch += 1;
        self.pending = 0;
        self.in_flight.abort_all();
        self.options.device_id = device_id.clone();
        self.state.send_replace(FetchState::new(device_id));
    }

    fn begin(&mut self) {
        let device_id = self.options.device_id.clone();
        if device_id.is_empty() {
            tracing::debug!("no device id provided, skipping fetch");
            self.state.send_if_modified(|state| {
                let modified = state.phase != FetchPhase::Idle;
                state.phase = FetchPhase::Idle;
                modified
            });
            return;
        }

        self.pending += 1;
        self.state.send_modify(|state| state.phase = FetchPhase::Loading);

        let transport = Arc::clone(&self.transport);
        let epoch = self.epoch;
        let historical = self.options.historical;
        let limit = self.options.request_timeout;

        self.in_flight.spawn(async move {
            let result = timeout(limit, transport.fetch_readings(&device_id, historical))
                .await
                .unwrap_or(Err(FetchError::Timeout));

            (epoch, result)
        });
    }

    fn complete(&mut self, joined: std::result::Result<Outcome, JoinError>) {
        match joined {
            Ok((epoch, _)) if epoch != self.epoch => {
                tracing::debug!("discarding response issued for a previous device");
            }
            Ok((_, Ok(data))) => {
                self.pending = self.pending.saturating_sub(1);
                let phase = self.settled(FetchPhase::Ready);
                self.state.send_modify(|state| {
                    state.data = Some(data);
                    state.phase = phase;
                    state.error = None;
                    state.is_connected = true;
                    state.last_updated = Some(OffsetDateTime::now_utc());
                });
            }
            Ok((_, Err(e))) => {
                self.pending = self.pending.saturating_sub(1);
                tracing::warn!("error fetching sensor data for {}: {}", self.options.device_id, e);
                self.fail(e.to_string());
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                self.pending = self.pending.saturating_sub(1);
                tracing::error!("fetch task for {} failed: {}", self.options.device_id, e);
                self.fail(String::from("Failed to fetch data"));
            }
        }
    }

    /// `done` once nothing is pending, `Loading` otherwise.
    fn settled(&self, done: FetchPhase) -> FetchPhase {
        if self.pending > 0 { FetchPhase::Loading } else { done }
    }

    fn fail(&mut self, message: String) {
        let phase = self.settled(FetchPhase::Error);
        self.state.send_modify(|state| {
            state.phase = phase;
            state.error = Some(message);
            state.is_connected = false;
        });
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending::<()>().await,
    }
}
