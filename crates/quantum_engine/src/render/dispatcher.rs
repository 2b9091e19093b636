//! Main-thread dispatcher
//!
//! The GL context belongs to the thread that created the window. Worker
//! threads hand closures to that thread through a bounded queue and block
//! until their closure has run. Submissions from one thread run in the order
//! they were made.

use std::time::Duration;

use crossbeam::channel::{bounded, select, Receiver, Sender};
use thiserror::Error;

use super::device::GraphicsDevice;

/// Capacity of the main-thread queue; submitters block while it is full
pub const MAIN_QUEUE_CAPACITY: usize = 15;

/// How long the loop waits for work before polling window events
const IDLE_POLL: Duration = Duration::from_millis(4);

/// Closure executed on the main thread
pub type MainJob = Box<dyn FnOnce(&mut dyn GraphicsDevice) + Send>;

/// Dispatcher errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The main-thread loop is gone; the closure did not run
    #[error("main-thread loop has stopped")]
    Stopped,
}

/// Why [`MainThread::run_until`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// `Dispatcher::stop` was called
    Stopped,
    /// The exit predicate returned true
    ExitRequested,
    /// Every dispatcher handle was dropped
    Disconnected,
}

/// Cloneable handle for posting work to the main thread
#[derive(Clone)]
pub struct Dispatcher {
    queue: Sender<MainJob>,
    stop: Sender<()>,
}

/// Receiving end, driven by the thread that owns the device
pub struct MainThread {
    queue: Receiver<MainJob>,
    stop: Receiver<()>,
}

/// Create a connected dispatcher and main-thread loop
pub fn main_thread_channel() -> (Dispatcher, MainThread) {
    let (queue_tx, queue_rx) = bounded(MAIN_QUEUE_CAPACITY);
    let (stop_tx, stop_rx) = bounded(1);
    (
        Dispatcher { queue: queue_tx, stop: stop_tx },
        MainThread { queue: queue_rx, stop: stop_rx },
    )
}

impl Dispatcher {
    /// Run `f` on the main thread and wait for its result
    ///
    /// Blocks while the queue is full and again until `f` has finished. Must
    /// not be called from the main thread itself.
    pub fn run_on_main<F, R>(&self, f: F) -> Result<R, DispatchError>
    where
        F: FnOnce(&mut dyn GraphicsDevice) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (done_tx, done_rx) = bounded(1);
        let job: MainJob = Box::new(move |device| {
            let _ = done_tx.send(f(device));
        });
        self.queue.send(job).map_err(|_| DispatchError::Stopped)?;
        done_rx.recv().map_err(|_| DispatchError::Stopped)
    }

    /// Ask the main-thread loop to return; queued closures are not drained
    pub fn stop(&self) {
        let _ = self.stop.try_send(());
    }

    /// Closures waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl MainThread {
    /// Execute queued closures until stopped or `should_exit` returns true
    ///
    /// Window events are polled whenever the queue stays empty for a short
    /// while, so `should_exit` keeps being evaluated when nothing is posted.
    pub fn run_until<F>(&mut self, device: &mut dyn GraphicsDevice, mut should_exit: F) -> LoopExit
    where
        F: FnMut(&dyn GraphicsDevice) -> bool,
    {
        loop {
            select! {
                recv(self.queue) -> job => match job {
                    Ok(job) => job(&mut *device),
                    Err(_) => return LoopExit::Disconnected,
                },
                recv(self.stop) -> _ => return LoopExit::Stopped,
                default(IDLE_POLL) => device.poll_events(),
            }
            if should_exit(&*device) {
                return LoopExit::ExitRequested;
            }
        }
    }

    /// Execute queued closures until stopped
    pub fn run(&mut self, device: &mut dyn GraphicsDevice) -> LoopExit {
        self.run_until(device, |_| false)
    }
}
