//! # Idempotency Store
//!
//! Maps a [`RequestId`] to the response computed for it. The store is also
//! the per-key exclusion point: [`IdempotencyStore::try_claim`] grants at
//! most one caller the right to compute a given id. Concurrent duplicates
//! receive an [`InFlight`] handle and wait for the owner's result.
//!
//! If the owner gives up without a result ([`IdempotencyStore::abandon`],
//! typically because its future was dropped), waiting callers wake with
//! `None` and claim again.
//!
//! [`InMemoryStore`] bounds completed entries by capacity (oldest evicted
//! first) and by an optional TTL checked lazily on access.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::watch;
use waypoint_core::RequestId;

use crate::config::CacheConfig;
use crate::response::RouteResponse;

/// Outcome of [`IdempotencyStore::try_claim`].
#[derive(Debug)]
pub enum Claim {
    /// A response is already stored.
    Completed(RouteResponse),
    /// The caller now owns the computation and must `put` or `abandon`.
    Acquired,
    /// Another caller is computing this id.
    Pending(InFlight),
}

/// Handle on another caller's in-progress computation.
#[derive(Debug)]
pub struct InFlight {
    rx: watch::Receiver<Option<RouteResponse>>,
}

impl InFlight {
    /// Wait for the owner's response. `None` if the owner abandoned.
    pub async fn wait(mut self) -> Option<RouteResponse> {
        loop {
            let current = self.rx.borrow_and_update().clone();
            if current.is_some() {
                return current;
            }
            if self.rx.changed().await.is_err() {
                return self.rx.borrow().clone();
            }
        }
    }
}

/// Storage of completed responses keyed by request id.
pub trait IdempotencyStore: Send + Sync {
    /// The stored response for `id`, if present and fresh.
    fn get(&self, id: &RequestId) -> Option<RouteResponse>;

    /// Look up `id`, or claim the right to compute it.
    fn try_claim(&self, id: &RequestId) -> Claim;

    /// Store the response for `id` and release anyone waiting on it.
    fn put(&self, id: &RequestId, response: RouteResponse);

    /// Release a claim without storing a response.
    fn abandon(&self, id: &RequestId);

    /// Number of stored responses.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored response. Claims in progress are kept.
    fn clear(&self);
}

enum Slot {
    InFlight(watch::Sender<Option<RouteResponse>>),
    Done {
        response: RouteResponse,
        stored_at: Instant,
    },
}

/// Bounded in-process [`IdempotencyStore`] backed by `DashMap`.
///
/// The slot map and the eviction queue are never locked at the same time.
pub struct InMemoryStore {
    slots: DashMap<RequestId, Slot>,
    order: Mutex<VecDeque<RequestId>>,
    capacity: usize,
    ttl: Option<Duration>,
}

impl InMemoryStore {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            slots: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl())
    }

    pub fn shared(self) -> Arc<dyn IdempotencyStore> {
        Arc::new(self)
    }

    fn is_fresh(&self, stored_at: Instant) -> bool {
        self.ttl.map_or(true, |ttl| stored_at.elapsed() < ttl)
    }

    fn forget(&self, id: &RequestId) {
        self.order.lock().retain(|queued| queued != id);
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("entries", &self.slots.len())
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl IdempotencyStore for InMemoryStore {
    fn get(&self, id: &RequestId) -> Option<RouteResponse> {
        let expired = match self.slots.get(id).as_deref() {
            Some(Slot::Done {
                response,
                stored_at,
            }) => {
                if self.is_fresh(*stored_at) {
                    return Some(response.clone());
                }
                true
            }
            _ => false,
        };
        if expired {
            let removed = self.slots.remove_if(id, |_, slot| match slot {
                Slot::Done { stored_at, .. } => !self.is_fresh(*stored_at),
                Slot::InFlight(_) => false,
            });
            if removed.is_some() {
                self.forget(id);
            }
        }
        None
    }

    fn try_claim(&self, id: &RequestId) -> Claim {
        match self.slots.entry(id.clone()) {
            Entry::Vacant(vacant) => {
                let (tx, _rx) = watch::channel(None);
                vacant.insert(Slot::InFlight(tx));
                Claim::Acquired
            }
            Entry::Occupied(mut occupied) => {
                let fresh = match occupied.get() {
                    Slot::InFlight(tx) => return Claim::Pending(InFlight { rx: tx.subscribe() }),
                    Slot::Done {
                        response,
                        stored_at,
                    } => self.is_fresh(*stored_at).then(|| response.clone()),
                };
                if let Some(response) = fresh {
                    return Claim::Completed(response);
                }
                let (tx, _rx) = watch::channel(None);
                occupied.insert(Slot::InFlight(tx));
                drop(occupied);
                self.forget(id);
                Claim::Acquired
            }
        }
    }

    fn put(&self, id: &RequestId, response: RouteResponse) {
        let previous = self.slots.insert(
            id.clone(),
            Slot::Done {
                response: response.clone(),
                stored_at: Instant::now(),
            },
        );
        match previous {
            Some(Slot::InFlight(tx)) => {
                tx.send_replace(Some(response));
            }
            Some(Slot::Done { .. }) => self.forget(id),
            None => {}
        }

        let victims: Vec<RequestId> = {
            let mut order = self.order.lock();
            order.push_back(id.clone());
            let excess = order.len().saturating_sub(self.capacity);
            order.drain(..excess).collect()
        };
        for victim in victims {
            self.slots
                .remove_if(&victim, |_, slot| matches!(slot, Slot::Done { .. }));
            tracing::trace!(request_id = %victim, "evicted cached response");
        }
    }

    fn abandon(&self, id: &RequestId) {
        self.slots
            .remove_if(id, |_, slot| matches!(slot, Slot::InFlight(_)));
    }

    fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Done { .. }))
            .count()
    }

    fn clear(&self) {
        self.slots.retain(|_, slot| matches!(slot, Slot::InFlight(_)));
        self.order.lock().clear();
    }
}
