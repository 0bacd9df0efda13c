//! # Change Debouncing
//!
//! Coalesces bursts of notifications (one per keystroke) into a single
//! emission after a quiet period. Only the latest value survives; nothing
//! is queued.
//!
//! Two forms share those semantics:
//!
//! - [`Debouncer`]: a deadline-driven core for code that runs its own
//!   event loop (the content surface polls it with the current time)
//! - [`spawn_debouncer`] / [`spawn_debouncer_with`]: a tokio task driven
//!   through a [`DebounceHandle`]; dropping the handle discards whatever is
//!   pending

use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Deadline-based debouncer polled by its owner
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Replace the pending value and restart the quiet period
    pub fn notify(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(deadline) if deadline <= now => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    /// Drop the pending value without emitting it
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }
}

enum Command<T> {
    Notify(T),
    Flush(oneshot::Sender<()>),
    Cancel,
}

/// Handle to a debouncer task
pub struct DebounceHandle<T> {
    commands: mpsc::UnboundedSender<Command<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> DebounceHandle<T> {
    pub fn notify(&self, value: T) {
        let _ = self.commands.send(Command::Notify(value));
    }

    /// Emit the pending value now, if any, and wait until it was delivered
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Discard the pending value; later notifications still work
    pub fn cancel(&self) {
        let _ = self.commands.send(Command::Cancel);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Spawn a debouncer that calls `emit` with each coalesced value
pub fn spawn_debouncer_with<T, F>(quiet: Duration, emit: F) -> DebounceHandle<T>
where
    T: Send + 'static,
    F: FnMut(T) + Send + 'static,
{
    let (commands, receiver) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(quiet, receiver, emit));
    DebounceHandle { commands, task }
}

/// Spawn a debouncer that delivers coalesced values on a channel
pub fn spawn_debouncer<T: Send + 'static>(
    quiet: Duration,
) -> (DebounceHandle<T>, mpsc::UnboundedReceiver<T>) {
    let (output, values) = mpsc::unbounded_channel();
    let handle = spawn_debouncer_with(quiet, move |value| {
        let _ = output.send(value);
    });
    (handle, values)
}

async fn run<T, F>(quiet: Duration, mut commands: mpsc::UnboundedReceiver<Command<T>>, mut emit: F)
where
    F: FnMut(T),
{
    let mut pending: Option<T> = None;
    let sleep = tokio::time::sleep(quiet);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Notify(value)) => {
                    pending = Some(value);
                    sleep.as_mut().reset(tokio::time::Instant::now() + quiet);
                }
                Some(Command::Flush(ack)) => {
                    if let Some(value) = pending.take() {
                        emit(value);
                    }
                    let _ = ack.send(());
                }
                Some(Command::Cancel) => pending = None,
                // Handle dropped: teardown, pending value is discarded
                None => break,
            },
            () = &mut sleep, if pending.is_some() => {
                if let Some(value) = pending.take() {
                    emit(value);
                }
            }
        }
    }
}
