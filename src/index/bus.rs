//! Fan-out of index events to every subscribed index
//!
//! Each subscriber owns a bounded queue drained by its own worker threads.
//! Publishing blocks only when a queue is full. Events are applied
//! asynchronously, so a publisher returning does not mean the indexes
//! already reflect the event; [`EventBus::wait_idle`] is the quiescence
//! probe for callers that need that.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::types::IndexEvent;

/// An index that consumes published events
pub trait IndexSubscriber: Send + Sync {
    /// Short name used for worker threads and logs
    fn name(&self) -> &'static str;

    /// Apply one event. Must tolerate concurrent calls.
    fn handle(&self, event: &IndexEvent);
}

/// Counter of outstanding work with a blocking "wait until zero"
#[derive(Default)]
pub struct InFlight {
    count: AtomicUsize,
    lock: Mutex<()>,
    idle: Condvar,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, n: usize) {
        self.count.fetch_add(n, Ordering::SeqCst);
    }

    pub fn done(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _guard = self.lock.lock();
            self.idle.notify_all();
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Block until the count drops to zero or `deadline` passes.
    /// Returns whether the count was zero on return.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut guard = self.lock.lock();
        while self.count() > 0 {
            if self.idle.wait_until(&mut guard, deadline).timed_out() {
                return self.count() == 0;
            }
        }
        true
    }
}

struct Subscription {
    name: &'static str,
    sender: Sender<Arc<IndexEvent>>,
}

pub struct EventBus {
    subscriptions: Vec<Subscription>,
    workers: Vec<JoinHandle<()>>,
    workers_per_index: usize,
    queue_capacity: usize,
    pending: Arc<InFlight>,
}

impl EventBus {
    pub fn new(workers_per_index: usize, queue_capacity: usize) -> Self {
        Self {
            subscriptions: Vec::new(),
            workers: Vec::new(),
            workers_per_index: workers_per_index.max(1),
            queue_capacity: queue_capacity.max(1),
            pending: Arc::new(InFlight::new()),
        }
    }

    /// Register an index and start its dispatch workers
    pub fn subscribe(&mut self, subscriber: Arc<dyn IndexSubscriber>) {
        let (sender, receiver) = bounded::<Arc<IndexEvent>>(self.queue_capacity);
        let name = subscriber.name();

        for i in 0..self.workers_per_index {
            let receiver = receiver.clone();
            let subscriber = Arc::clone(&subscriber);
            let pending = Arc::clone(&self.pending);

            let spawned = thread::Builder::new()
                .name(format!("{}-{}", name, i))
                .spawn(move || dispatch_loop(subscriber, receiver, pending));

            match spawned {
                Ok(handle) => self.workers.push(handle),
                Err(e) => log::error!("failed to spawn {} worker: {}", name, e),
            }
        }

        log::debug!("{} subscribed with {} workers", name, self.workers_per_index);
        self.subscriptions.push(Subscription { name, sender });
    }

    /// Enqueue an event for every subscriber
    pub fn publish(&self, event: IndexEvent) {
        let event = Arc::new(event);
        self.pending.add(self.subscriptions.len());

        for sub in &self.subscriptions {
            if sub.sender.send(Arc::clone(&event)).is_err() {
                log::warn!("{} queue is closed, dropping event", sub.name);
                self.pending.done();
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Events queued but not yet applied, summed over subscribers
    pub fn pending(&self) -> usize {
        self.pending.count()
    }

    /// Block until every queued event is applied or `timeout` expires.
    /// Returns whether the bus was idle on return.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.pending.wait_until(Instant::now() + timeout)
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        // Closing the senders ends the dispatch loops once queues drain
        self.subscriptions.clear();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn dispatch_loop(
    subscriber: Arc<dyn IndexSubscriber>,
    receiver: Receiver<Arc<IndexEvent>>,
    pending: Arc<InFlight>,
) {
    for event in receiver.iter() {
        let applied = catch_unwind(AssertUnwindSafe(|| subscriber.handle(&event)));
        if applied.is_err() {
            log::error!("{} panicked while applying {:?}", subscriber.name(), event);
        }
        pending.done();
    }
}
