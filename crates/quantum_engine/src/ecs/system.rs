//! System trait and the threaded runtime behind every system
//!
//! A system owns two background threads. The mailbox thread applies add and
//! remove requests in the order they were sent; the ticker thread calls the
//! processor at a fixed interval. They communicate only through channels and
//! the entity-set lock. An add or remove never runs while a tick is in
//! progress, so a processor can free GPU objects in `release` without racing
//! a draw that still uses them.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, unbounded, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use super::component::ComponentType;
use super::entity::Entity;
use crate::foundation::time::Timer;

/// Wait used when a tick overran its interval
pub const MIN_TIMER_DELAY: Duration = Duration::from_nanos(1);

/// System errors
#[derive(Error, Debug)]
pub enum SystemError {
    /// `start` or `stop` after `terminate`
    #[error("system has been terminated")]
    AlreadyTerminated,

    /// A request reached a system that is no longer accepting work
    #[error("system is shut down")]
    SystemShutDown,

    /// A worker thread could not be spawned
    #[error("failed to spawn system thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Lifecycle of a system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    /// Created, never started
    New,
    /// Ticking
    Running,
    /// Not ticking; still accepting add/remove
    Stopped,
    /// Shut down for good
    Terminated,
}

/// Lifecycle and membership operations shared by all systems
pub trait System {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Begin ticking
    fn start(&mut self) -> Result<(), SystemError>;

    /// Stop ticking; a no-op when not running
    fn stop(&mut self) -> Result<(), SystemError>;

    /// Stop ticking and shut down the mailbox; a no-op when already terminated
    fn terminate(&mut self) -> Result<(), SystemError>;

    /// Whether the ticker is active
    fn is_running(&self) -> bool;

    /// Queue an entity for admission
    fn add_entity(&self, entity: Arc<Entity>) -> Result<(), SystemError>;

    /// Queue an entity for removal
    fn remove_entity(&self, id: &str) -> Result<(), SystemError>;
}

/// Per-system behavior plugged into [`SystemRuntime`]
pub trait EntityProcessor: Send + Sync + 'static {
    /// What the system keeps for each admitted entity
    type Record: Clone + Send + Sync + 'static;

    /// Why an entity could not be admitted
    type Error: fmt::Display;

    /// Short name used in logs and thread names
    fn name(&self) -> &'static str;

    /// Component types an entity must carry to be admitted
    fn requirements(&self) -> &[ComponentType];

    /// Build the record for an entity that satisfies the requirements
    fn admit(&self, entity: &Entity) -> Result<Self::Record, Self::Error>;

    /// Dispose of a record when its entity leaves the system
    fn release(&self, record: Self::Record);

    /// Run one tick over a snapshot of the admitted records
    fn process(&self, elapsed: f32, records: &[(String, Self::Record)]);
}

enum Request {
    Add(Arc<Entity>),
    Remove(String),
    Flush(Sender<()>),
    Terminate,
}

struct Shared<P: EntityProcessor> {
    processor: P,
    records: RwLock<Vec<(String, P::Record)>>,
    // held by membership changes and by a whole tick, so a record is never
    // released while a tick is still using it
    step: Mutex<()>,
}

impl<P: EntityProcessor> Shared<P> {
    fn add(&self, entity: &Entity) {
        let _step = self.step.lock();
        let name = self.processor.name();
        if !entity.satisfies(self.processor.requirements()) {
            log::debug!("{} system ignoring entity '{}'", name, entity.id());
            return;
        }
        if self.records.read().iter().any(|(id, _)| id == entity.id()) {
            log::warn!("{} system already has entity '{}'", name, entity.id());
            return;
        }

        match self.processor.admit(entity) {
            Ok(record) => {
                self.records.write().push((entity.id().to_string(), record));
                log::debug!("{} system added entity '{}'", name, entity.id());
            }
            Err(err) => {
                log::error!("{} system rejected entity '{}': {}", name, entity.id(), err);
            }
        }
    }

    fn remove(&self, id: &str) {
        let _step = self.step.lock();
        let removed = {
            let mut records = self.records.write();
            records
                .iter()
                .position(|(existing, _)| existing == id)
                .map(|index| records.remove(index))
        };
        match removed {
            Some((_, record)) => {
                self.processor.release(record);
                log::debug!("{} system removed entity '{}'", self.processor.name(), id);
            }
            None => log::debug!("{} system has no entity '{}'", self.processor.name(), id),
        }
    }

    fn clear(&self) {
        let _step = self.step.lock();
        let records = std::mem::take(&mut *self.records.write());
        for (_, record) in records {
            self.processor.release(record);
        }
    }

    fn tick(&self, elapsed: f32) {
        let _step = self.step.lock();
        let snapshot = self.records.read().clone();
        self.processor.process(elapsed, &snapshot);
    }
}

struct Ticker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Threaded driver for an [`EntityProcessor`]
pub struct SystemRuntime<P: EntityProcessor> {
    shared: Arc<Shared<P>>,
    interval: Duration,
    state: SystemState,
    mailbox: Sender<Request>,
    mailbox_thread: Option<JoinHandle<()>>,
    ticker: Option<Ticker>,
}

impl<P: EntityProcessor> SystemRuntime<P> {
    /// Create the system and its mailbox thread; ticking starts with `start`
    pub fn new(processor: P, interval: Duration) -> Result<Self, SystemError> {
        let shared = Arc::new(Shared {
            processor,
            records: RwLock::new(Vec::new()),
            step: Mutex::new(()),
        });

        // unbounded so scene loading never waits on the main thread
        let (mailbox, requests) = unbounded();
        let worker = Arc::clone(&shared);
        let mailbox_thread = thread::Builder::new()
            .name(format!("{}-mailbox", shared.processor.name()))
            .spawn(move || {
                for request in requests {
                    match request {
                        Request::Add(entity) => worker.add(&entity),
                        Request::Remove(id) => worker.remove(&id),
                        Request::Flush(ack) => {
                            let _ = ack.send(());
                        }
                        Request::Terminate => break,
                    }
                }
                worker.clear();
            })?;

        Ok(Self {
            shared,
            interval,
            state: SystemState::New,
            mailbox,
            mailbox_thread: Some(mailbox_thread),
            ticker: None,
        })
    }

    /// The plugged-in processor
    pub fn processor(&self) -> &P {
        &self.shared.processor
    }

    /// Current lifecycle state
    pub fn state(&self) -> SystemState {
        self.state
    }

    /// Tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one tick on the calling thread
    pub fn tick(&self, elapsed: f32) {
        self.shared.tick(elapsed);
    }

    /// Block until every request sent before this call has been applied
    pub fn flush(&self) -> Result<(), SystemError> {
        let (ack, done) = bounded(1);
        self.send(Request::Flush(ack))?;
        done.recv().map_err(|_| SystemError::SystemShutDown)
    }

    /// Number of admitted entities
    pub fn entity_count(&self) -> usize {
        self.shared.records.read().len()
    }

    /// Whether an entity with this id is admitted
    pub fn contains(&self, id: &str) -> bool {
        self.shared.records.read().iter().any(|(existing, _)| existing == id)
    }

    fn send(&self, request: Request) -> Result<(), SystemError> {
        if self.state == SystemState::Terminated {
            return Err(SystemError::SystemShutDown);
        }
        self.mailbox.send(request).map_err(|_| SystemError::SystemShutDown)
    }

    fn spawn_ticker(&self) -> Result<Ticker, SystemError> {
        let (stop, stopped) = bounded::<()>(0);
        let shared = Arc::clone(&self.shared);
        let interval = self.interval;

        let handle = thread::Builder::new()
            .name(format!("{}-ticker", shared.processor.name()))
            .spawn(move || {
                let mut timer = Timer::new();
                let mut wait = interval;
                loop {
                    match stopped.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let elapsed = timer.update();
                    shared.tick(elapsed);

                    let spent = timer.since_last();
                    log::trace!("{} tick took {:?}", shared.processor.name(), spent);
                    wait = interval
                        .checked_sub(spent)
                        .filter(|remaining| !remaining.is_zero())
                        .unwrap_or(MIN_TIMER_DELAY);
                }
            })?;

        Ok(Ticker { stop, handle })
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            drop(ticker.stop);
            if ticker.handle.join().is_err() {
                log::error!("{} ticker thread panicked", self.name());
            }
        }
    }
}

impl<P: EntityProcessor> System for SystemRuntime<P> {
    fn name(&self) -> &'static str {
        self.shared.processor.name()
    }

    fn start(&mut self) -> Result<(), SystemError> {
        match self.state {
            SystemState::Terminated => Err(SystemError::AlreadyTerminated),
            SystemState::Running => Ok(()),
            SystemState::New | SystemState::Stopped => {
                self.ticker = Some(self.spawn_ticker()?);
                self.state = SystemState::Running;
                log::info!("{} system started", self.name());
                Ok(())
            }
        }
    }

    fn stop(&mut self) -> Result<(), SystemError> {
        match self.state {
            SystemState::Terminated => Err(SystemError::AlreadyTerminated),
            SystemState::Running => {
                self.stop_ticker();
                self.state = SystemState::Stopped;
                log::info!("{} system stopped", self.name());
                Ok(())
            }
            SystemState::New | SystemState::Stopped => Ok(()),
        }
    }

    fn terminate(&mut self) -> Result<(), SystemError> {
        if self.state == SystemState::Terminated {
            return Ok(());
        }

        self.stop_ticker();
        let _ = self.mailbox.send(Request::Terminate);
        if let Some(handle) = self.mailbox_thread.take() {
            if handle.join().is_err() {
                log::error!("{} mailbox thread panicked", self.name());
            }
        }
        self.state = SystemState::Terminated;
        log::info!("{} system terminated", self.name());
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.state == SystemState::Running
    }

    fn add_entity(&self, entity: Arc<Entity>) -> Result<(), SystemError> {
        self.send(Request::Add(entity))
    }

    fn remove_entity(&self, id: &str) -> Result<(), SystemError> {
        self.send(Request::Remove(id.to_string()))
    }
}

impl<P: EntityProcessor> Drop for SystemRuntime<P> {
    fn drop(&mut self) {
        let _ = self.terminate();
    }
}
