// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! Process-wide publish/subscribe bus for SPA Guard lifecycle events.
//!
//! [`EventBus`] delivers every published [`Event`] to every currently-live
//! subscriber, synchronously, in registration order. It is intentionally not a
//! generic pub/sub crate: the event set is closed (see [`Event`]) so UI code
//! can match on it exhaustively.

mod event;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use spa_guard_error::{DiagnosticEvent, Diagnostics, TracingDiagnostics};

pub use event::Event;

type Handler = dyn Fn(&Event) + Send + Sync;

#[derive(Clone)]
struct Subscriber {
    active: Arc<AtomicBool>,
    handler: Arc<Handler>,
}

/// A token returned by [`EventBus::subscribe`]; dropping or calling
/// [`Unsubscribe::unsubscribe`] stops further delivery to that subscriber.
#[derive(Debug)]
pub struct Unsubscribe {
    active: Arc<AtomicBool>,
}

impl Unsubscribe {
    /// Stops delivering events to this subscriber. Idempotent.
    pub fn unsubscribe(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

/// The process-wide event bus.
///
/// Cloning an `EventBus` shares the same underlying subscriber list, the same
/// way cloning a [`spa_guard_clock::Clock`] shares the same underlying time.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    diagnostics: Arc<dyn Diagnostics>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscribers.lock().len())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Arc::new(TracingDiagnostics))
    }
}

impl EventBus {
    /// Creates a bus that reports subscriber panics to `diagnostics`.
    #[must_use]
    pub fn new(diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            diagnostics,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registers `handler` to receive every event published after this call.
    ///
    /// Handlers registered during an in-progress [`Self::publish`] call do not
    /// receive the event currently being published.
    pub fn subscribe<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));
        self.subscribers.lock().push(Subscriber {
            active: Arc::clone(&active),
            handler: Arc::new(handler),
        });
        Unsubscribe { active }
    }

    /// Synchronously delivers `event` to every subscriber alive at the start
    /// of this call, in registration order.
    ///
    /// A subscriber that panics is caught and reported through the bus's
    /// [`Diagnostics`] sink; delivery continues to the remaining subscribers.
    pub fn publish(&self, event: Event) {
        // Snapshot so that subscribers added during delivery don't receive
        // this event, and the lock isn't held while handlers run (a handler
        // calling `subscribe`/`unsubscribe` must not deadlock).
        let snapshot: Vec<Subscriber> = self.subscribers.lock().clone();
        for subscriber in snapshot {
            if !subscriber.active.load(Ordering::SeqCst) {
                continue;
            }
            let handler = Arc::clone(&subscriber.handler);
            let event_ref = &event;
            let result = catch_unwind(AssertUnwindSafe(|| (handler)(event_ref)));
            if let Err(panic) = result {
                let message = panic_message(&panic);
                self.diagnostics
                    .report(DiagnosticEvent::new("event-bus", format!("subscriber panicked: {message}")));
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn attempt_event(attempt: u32) -> Event {
        Event::RetryAttempt {
            attempt,
            delay_ms: 0,
            retry_id: "R1".into(),
        }
    }

    #[test]
    fn delivers_to_subscribers_in_registration_order() {
        let bus = EventBus::default();
        let order = Arc::new(StdMutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        let _u1 = bus.subscribe(move |_| o1.lock().unwrap().push(1));
        let o2 = Arc::clone(&order);
        let _u2 = bus.subscribe(move |_| o2.lock().unwrap().push(2));

        bus.publish(attempt_event(1));
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn unsubscribed_handler_stops_receiving() {
        let bus = EventBus::default();
        let count = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let c = Arc::clone(&count);
        let handle = bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(attempt_event(1));
        handle.unsubscribe();
        bus.publish(attempt_event(2));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscriber_registered_during_publish_does_not_see_that_event() {
        let bus = EventBus::default();
        let seen = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let bus_clone = bus.clone();
        let seen_clone = Arc::clone(&seen);
        let _u = bus.subscribe(move |_| {
            let seen_inner = Arc::clone(&seen_clone);
            bus_clone.subscribe(move |_| {
                seen_inner.fetch_add(1, Ordering::SeqCst);
            });
        });

        bus.publish(attempt_event(1));
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        bus.publish(attempt_event(2));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_subscriber_does_not_block_others() {
        let bus = EventBus::default();
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let _u1 = bus.subscribe(|_| panic!("boom"));
        let ran_clone = Arc::clone(&ran);
        let _u2 = bus.subscribe(move |_| ran_clone.store(true, Ordering::SeqCst));

        bus.publish(attempt_event(1));
        assert!(ran.load(Ordering::SeqCst));
    }
}
