use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::chain::{MarketReader, MarketWriter};
use crate::events::Event;
use crate::view_model::{MarketViewModel, RefreshOutcome};

/// Timer periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Network refresh period
    pub refresh_every: Duration,
    /// Countdown tick period
    pub tick_every: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_every: Duration::from_secs(15),
            tick_every: Duration::from_secs(1),
        }
    }
}

/// Seconds left until `deadline`, floored at zero.
pub fn countdown_secs(deadline: u64, now_secs: u64) -> u64 {
    deadline.saturating_sub(now_secs)
}

/// "m:ss" as the countdown display shows it.
pub fn format_countdown(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// The two background timers of a connected session: network refresh and
/// the local countdown. Both stop when this is stopped or dropped.
pub struct RefreshScheduler {
    refresh: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Spawn both timers. The first refresh runs immediately.
    pub fn start<C>(
        vm: Arc<MarketViewModel<C>>,
        config: SchedulerConfig,
        tx: mpsc::Sender<Event>,
    ) -> Self
    where
        C: MarketReader + MarketWriter + 'static,
    {
        let refresh = tokio::spawn(refresh_loop(vm.clone(), config.refresh_every, tx.clone()));
        let countdown = tokio::spawn(countdown_loop(vm, config.tick_every, tx));
        info!(
            refresh_secs = config.refresh_every.as_secs(),
            "refresh scheduler started"
        );
        Self {
            refresh: Some(refresh),
            countdown: Some(countdown),
        }
    }

    /// Abort both timers. Safe to call more than once.
    pub fn stop(&mut self) {
        let mut stopped = false;
        for handle in [self.refresh.take(), self.countdown.take()].into_iter().flatten() {
            handle.abort();
            stopped = true;
        }
        if stopped {
            info!("refresh scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.refresh.is_some() || self.countdown.is_some()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn refresh_loop<C>(vm: Arc<MarketViewModel<C>>, every: Duration, tx: mpsc::Sender<Event>)
where
    C: MarketReader + MarketWriter,
{
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let event = match vm.refresh().await {
            RefreshOutcome::Updated => Event::Refreshed,
            RefreshOutcome::Failed(e) => Event::RefreshFailed {
                reason: e.to_string(),
            },
            RefreshOutcome::Skipped | RefreshOutcome::Superseded => continue,
        };
        if tx.send(event).await.is_err() {
            debug!("event receiver gone, refresh loop exiting");
            return;
        }
    }
}

async fn countdown_loop<C>(vm: Arc<MarketViewModel<C>>, every: Duration, tx: mpsc::Sender<Event>)
where
    C: MarketReader + MarketWriter,
{
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        let remaining_secs = vm.seconds_remaining();
        if tx.send(Event::Countdown { remaining_secs }).await.is_err() {
            debug!("event receiver gone, countdown loop exiting");
            return;
        }
    }
}
