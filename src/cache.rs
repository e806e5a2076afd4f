//! Process-wide translation cache with one in-flight request per key.
//!
//! A slot is either a completed translation or a shared handle to the
//! backend call currently producing it. Every caller asking for a key that is
//! in flight awaits the same call, so the backend sees at most one
//! outstanding request per (text, source, target).
//!
//! The flight writes its own result back when it completes. Callers hold a
//! [`FlightHandle`]; when the last handle of an unfinished flight is dropped,
//! the slot is removed and the backend call is dropped with it. Nothing is
//! stored until a flight finishes successfully.

use crate::error::TranslationError;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::task::{Context, Poll};
use tracing::debug;

pub type FlightResult = Result<String, TranslationError>;

/// Shared backend call; cloning it does not issue another call.
pub type Flight = Shared<BoxFuture<'static, FlightResult>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub source: String,
    pub target: String,
}

impl CacheKey {
    pub fn new(text: &str, source: &str, target: &str) -> Self {
        Self {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// Outcome of a cache lookup.
pub enum Lookup {
    /// Completed translation
    Hit(String),
    /// Another caller's backend call for the same key
    Joined(FlightHandle),
    /// A new backend call this caller started
    Started(FlightHandle),
}

enum Slot {
    Ready(String),
    InFlight { id: u64, flight: Flight },
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<CacheKey, Slot>,
    /// Completed keys, oldest first
    completed: VecDeque<CacheKey>,
    next_flight_id: u64,
}

impl CacheState {
    /// Drop the slot of flight `id` if no caller awaits it any more.
    fn release(&mut self, key: &CacheKey, id: u64) {
        let abandoned = match self.slots.get(key) {
            // Only the slot's own clone is left
            Some(Slot::InFlight { id: slot_id, flight }) => {
                *slot_id == id && flight.strong_count() == Some(1)
            }
            _ => false,
        };
        if abandoned {
            debug!("Dropping abandoned translation of {:?}", key.text);
            self.slots.remove(key);
        }
    }
}

/// One caller's interest in an in-flight translation.
///
/// Resolves to the flight's result. Dropping the last handle before the
/// flight finishes cancels the backend call and frees the key.
pub struct FlightHandle {
    flight: Option<Flight>,
    id: u64,
    key: CacheKey,
    state: Weak<Mutex<CacheState>>,
}

impl Future for FlightHandle {
    type Output = FlightResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<FlightResult> {
        match self.flight.as_mut() {
            Some(flight) => flight.poll_unpin(cx),
            None => Poll::Ready(Err(TranslationError::Backend {
                status: None,
                message: "translation handle already released".to_string(),
            })),
        }
    }
}

impl Drop for FlightHandle {
    fn drop(&mut self) {
        // Release our clone before inspecting how many are left
        drop(self.flight.take());
        if let Some(state) = self.state.upgrade() {
            lock_state(&state).release(&self.key, self.id);
        }
    }
}

#[derive(Clone)]
pub struct TranslationCache {
    state: Arc<Mutex<CacheState>>,
    capacity: usize,
}

impl TranslationCache {
    /// `capacity` bounds completed entries; in-flight requests are not counted.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the cached value, join the flight in progress, or start one with `start`.
    ///
    /// `start` runs under the cache lock and must only build the future, not poll it.
    pub fn lookup_or_start<F>(&self, key: &CacheKey, start: F) -> Lookup
    where
        F: FnOnce() -> BoxFuture<'static, FlightResult>,
    {
        let mut state = self.lock();

        match state.slots.get(key) {
            Some(Slot::Ready(value)) => return Lookup::Hit(value.clone()),
            Some(Slot::InFlight { id, flight }) => {
                return Lookup::Joined(self.handle(key, *id, flight.clone()))
            }
            None => {}
        }

        let fetch = start();
        let weak = Arc::downgrade(&self.state);
        let capacity = self.capacity;
        let settle_key = key.clone();
        let id = state.next_flight_id;
        state.next_flight_id += 1;

        let flight = async move {
            let result = fetch.await;
            settle(&weak, capacity, settle_key, id, &result);
            result
        }
        .boxed()
        .shared();

        state.slots.insert(
            key.clone(),
            Slot::InFlight {
                id,
                flight: flight.clone(),
            },
        );
        Lookup::Started(self.handle(key, id, flight))
    }

    /// Completed value for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        match self.lock().slots.get(key) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Number of completed entries.
    pub fn len(&self) -> usize {
        self.lock().completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys with a backend call in progress.
    pub fn in_flight(&self) -> usize {
        self.lock()
            .slots
            .values()
            .filter(|slot| matches!(slot, Slot::InFlight { .. }))
            .count()
    }

    fn handle(&self, key: &CacheKey, id: u64, flight: Flight) -> FlightHandle {
        FlightHandle {
            flight: Some(flight),
            id,
            key: key.clone(),
            state: Arc::downgrade(&self.state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    // No code path panics while holding the lock, but keep serving if one ever does
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Store a finished flight's result: successes become entries, failures free the key.
fn settle(
    state: &Weak<Mutex<CacheState>>,
    capacity: usize,
    key: CacheKey,
    id: u64,
    result: &FlightResult,
) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = lock_state(&state);

    match result {
        Ok(value) => {
            let previous = state.slots.insert(key.clone(), Slot::Ready(value.clone()));
            if !matches!(previous, Some(Slot::Ready(_))) {
                state.completed.push_back(key);
            }

            while state.completed.len() > capacity {
                if let Some(oldest) = state.completed.pop_front() {
                    debug!("Evicting cached translation of {:?}", oldest.text);
                    state.slots.remove(&oldest);
                }
            }
        }
        Err(_) => {
            let ours = matches!(
                state.slots.get(&key),
                Some(Slot::InFlight { id: slot_id, .. }) if *slot_id == id
            );
            if ours {
                state.slots.remove(&key);
            }
        }
    }
}
