//! One-second tick source for a running countdown.
//!
//! At most one ticker task is alive. Every tick carries the generation it
//! was started with so a tick queued before a restart can be told apart.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One elapsed second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

#[derive(Debug)]
pub struct TickDriver {
    handle: Option<JoinHandle<()>>,
    generation: Option<u64>,
    period: Duration,
    tx: UnboundedSender<Tick>,
}

impl TickDriver {
    pub fn new() -> (Self, UnboundedReceiver<Tick>) {
        Self::with_period(TICK_PERIOD)
    }

    pub fn with_period(period: Duration) -> (Self, UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                handle: None,
                generation: None,
                period,
                tx,
            },
            rx,
        )
    }

    /// Replace any live ticker with a fresh one. The first tick arrives one
    /// full period after this call.
    pub fn start(&mut self, generation: u64) {
        self.stop();

        let tx = self.tx.clone();
        let period = self.period;
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(Tick { generation }).is_err() {
                    break;
                }
            }
        });

        tracing::debug!(generation, "ticker started");
        self.handle = Some(handle);
        self.generation = Some(generation);
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(generation = ?self.generation, "ticker stopped");
        }
        self.generation = None;
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    /// Whether `tick` came from the ticker that is live right now.
    pub fn is_current(&self, tick: &Tick) -> bool {
        self.generation == Some(tick.generation)
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_tick_after_one_period() {
        let (mut driver, mut rx) = TickDriver::new();
        let started = Instant::now();
        driver.start(1);

        let tick = rx.recv().await;
        assert_eq!(tick, Some(Tick { generation: 1 }));
        assert!(started.elapsed() >= TICK_PERIOD);
        assert!(driver.is_current(&Tick { generation: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_generation() {
        let (mut driver, mut rx) = TickDriver::new();
        driver.start(1);
        driver.start(2);
        assert!(!driver.is_current(&Tick { generation: 1 }));

        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(Tick { generation: 2 }));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_silences_ticks() {
        let (mut driver, mut rx) = TickDriver::new();
        driver.start(7);
        assert_eq!(rx.recv().await, Some(Tick { generation: 7 }));

        driver.stop();
        assert!(!driver.is_live());
        assert_eq!(driver.generation(), None);
        let waited = time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(waited.is_err());
    }
}
