use std::time::Duration;
use serde::{Serialize, Deserialize};
use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Countdown for the active round. Lives inside the session state; only
/// [`TimerState::tick`] ever decrements it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimerState {
    pub seconds: u32,
    pub armed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick arrived while disarmed.
    Ignored,
    Ticked(u32),
    /// Reached zero. The timer is already disarmed, so this fires once.
    Expired,
}

impl TimerState {
    pub fn start(&mut self, seconds: u32) {
        self.seconds = seconds;
        self.armed = true;
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn clear(&mut self) {
        self.seconds = 0;
        self.armed = false;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.armed {
            return TickOutcome::Ignored;
        }

        self.seconds = self.seconds.saturating_sub(1);
        if self.seconds == 0 {
            self.armed = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Ticked(self.seconds)
        }
    }
}

/// One tick from an armed [`Clock`]. Carries the arm generation so ticks
/// queued before a disarm can be told apart from current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub generation: u64,
}

/// Background ticker that sends a [`ClockTick`] every `period` while armed.
pub struct Clock {
    period: Duration,
    tick_tx: mpsc::UnboundedSender<ClockTick>,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl Clock {
    pub fn new(period: Duration) -> (Self, mpsc::UnboundedReceiver<ClockTick>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let clock = Self {
            period,
            tick_tx,
            task: None,
            generation: 0,
        };
        (clock, tick_rx)
    }

    pub fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    /// Starts ticking. No-op when already armed.
    pub fn arm(&mut self) {
        if self.task.is_some() {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let period = self.period;
        let tick_tx = self.tick_tx.clone();

        self.task = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tick_tx.send(ClockTick { generation }).is_err() {
                    break;
                }
            }
        }));
        debug!("⏱️ Clock armed (generation {})", generation);
    }

    /// Stops ticking immediately. No-op when already disarmed.
    pub fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("⏹️ Clock disarmed (generation {})", self.generation);
        }
    }

    /// Whether `tick` came from the current arming.
    pub fn accepts(&self, tick: &ClockTick) -> bool {
        self.task.is_some() && tick.generation == self.generation
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.disarm();
    }
}
