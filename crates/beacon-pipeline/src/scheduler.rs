//! The single-flight flush state machine.
//!
//! One dedicated tokio task owns the whole machine: the delay timer, every
//! state transition, and every drain cycle (run inline on the task). Because
//! nothing else can start a drain, "at most one flush scheduled or in flight"
//! holds structurally — there is no lock to get wrong.
//!
//! States map onto the task's loop:
//! - `Idle`: no deadline armed, waiting on the signal channel.
//! - `Scheduled`: a deadline is armed; a `Requested` signal in this state is
//!   a no-op (the armed timer already covers it).
//! - `Flushing`: the task is inside [`drain`]; signals sent meanwhile sit in
//!   the channel and are handled afterward.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::queue::EventQueue;
use crate::uploader::{drain, Uploader};

/// Signals accepted by the scheduler task.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FlushSignal {
    /// An event was queued; flush eventually (per the batch interval), or
    /// immediately when no interval is configured.
    Requested,
    /// Flush now, cancelling any armed timer.
    Immediate,
}

/// Bounded depth of the signal channel. A full channel means a flush is
/// already pending, so further signals coalesce instead of blocking.
const SIGNAL_QUEUE_DEPTH: usize = 64;

/// Handle for sending flush signals to the scheduler task. Cheap to clone.
#[derive(Clone)]
pub struct FlushScheduler {
    tx: mpsc::Sender<FlushSignal>,
}

impl FlushScheduler {
    /// Spawns the scheduler task and returns a signal handle.
    ///
    /// `batch_interval` of zero selects immediate mode: every `Requested`
    /// signal drains at once and the `Scheduled` state is never entered.
    ///
    /// The task exits when every handle has been dropped.
    pub fn spawn(queue: EventQueue, uploader: Uploader, batch_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel(SIGNAL_QUEUE_DEPTH);
        tokio::spawn(run(rx, queue, uploader, batch_interval));
        Self { tx }
    }

    /// Signals that an event was queued.
    pub fn request_flush(&self) {
        self.send(FlushSignal::Requested);
    }

    /// Requests an immediate flush, bypassing any armed timer.
    pub fn flush_now(&self) {
        self.send(FlushSignal::Immediate);
    }

    fn send(&self, signal: FlushSignal) {
        match self.tx.try_send(signal) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                // A backed-up channel already guarantees a pending flush.
                tracing::trace!("flush signal coalesced into pending backlog");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("flush scheduler task has shut down, dropping signal");
            }
        }
    }
}

/// What woke the scheduler task.
enum Wakeup {
    Signal(FlushSignal),
    TimerFired,
    Closed,
}

async fn run(
    mut rx: mpsc::Receiver<FlushSignal>,
    queue: EventQueue,
    uploader: Uploader,
    batch_interval: Duration,
) {
    let immediate_mode = batch_interval.is_zero();
    // `Some` while a delayed flush is armed (the `Scheduled` state).
    let mut deadline: Option<Instant> = None;

    loop {
        let wakeup = match deadline {
            Some(at) => tokio::select! {
                maybe = rx.recv() => maybe.map_or(Wakeup::Closed, Wakeup::Signal),
                () = sleep_until(at) => Wakeup::TimerFired,
            },
            None => rx.recv().await.map_or(Wakeup::Closed, Wakeup::Signal),
        };

        match wakeup {
            Wakeup::Signal(FlushSignal::Requested) if immediate_mode => {
                drain(&queue, &uploader).await;
            }
            Wakeup::Signal(FlushSignal::Requested) => {
                if deadline.is_none() {
                    deadline = Some(Instant::now() + batch_interval);
                }
            }
            Wakeup::Signal(FlushSignal::Immediate) | Wakeup::TimerFired => {
                // Disarm before draining so a request landing mid-drain can
                // arm a fresh timer.
                deadline = None;
                drain(&queue, &uploader).await;
            }
            Wakeup::Closed => break,
        }
    }

    tracing::debug!("flush scheduler task exiting");
}
