//! Per-expert topic registry for real-time viewers.
//!
//! ```text
//! Coordinator ── publish(SlotEvent) ──> ExpertRooms
//!                                          │ rooms[expert_id] = {sub1, sub3}
//!                                          ├── try_send ──> sub1 queue
//!                                          └── try_send ──> sub3 queue (full: dropped)
//! ```
//!
//! Each subscriber owns a bounded queue. Publishing never waits: a
//! subscriber whose queue is full or closed is removed from every room it
//! joined.

use crate::notifier::{ChangeNotifier, SlotEvent};
use crate::types::ExpertId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

/// Default per-subscriber queue capacity.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

/// Default cap on concurrent subscribers.
pub const DEFAULT_MAX_SUBSCRIBERS: usize = 1000;

/// Handle identifying one live connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A registered connection and its event queue.
#[derive(Debug)]
pub struct Subscriber {
    /// Handle to pass to `join`/`leave`/`disconnect`
    pub id: SubscriberId,
    /// Events for the rooms this subscriber joined, in emission order
    pub events: mpsc::Receiver<SlotEvent>,
}

struct Membership {
    sender: mpsc::Sender<SlotEvent>,
    rooms: HashSet<ExpertId>,
}

#[derive(Default)]
struct RoomState {
    subscribers: HashMap<SubscriberId, Membership>,
    rooms: HashMap<ExpertId, HashSet<SubscriberId>>,
}

impl RoomState {
    fn remove(&mut self, id: SubscriberId) -> bool {
        let Some(membership) = self.subscribers.remove(&id) else {
            return false;
        };
        for expert in membership.rooms {
            if let Some(members) = self.rooms.get_mut(&expert) {
                members.remove(&id);
                if members.is_empty() {
                    self.rooms.remove(&expert);
                }
            }
        }
        true
    }
}

/// Registry of expert rooms shared by all connections.
pub struct ExpertRooms {
    state: RwLock<RoomState>,
    buffer: usize,
    max_subscribers: usize,
    next_id: AtomicU64,
}

impl Default for ExpertRooms {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER, DEFAULT_MAX_SUBSCRIBERS)
    }
}

impl ExpertRooms {
    /// Creates a registry with the given queue capacity and subscriber cap.
    #[must_use]
    pub fn new(buffer: usize, max_subscribers: usize) -> Self {
        Self {
            state: RwLock::new(RoomState::default()),
            buffer: buffer.max(1),
            max_subscribers,
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new subscriber, or `None` when the registry is full.
    pub async fn connect(&self) -> Option<Subscriber> {
        let mut state = self.state.write().await;
        if state.subscribers.len() >= self.max_subscribers {
            return None;
        }
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, events) = mpsc::channel(self.buffer);
        state.subscribers.insert(
            id,
            Membership {
                sender,
                rooms: HashSet::new(),
            },
        );
        drop(state);

        debug!(subscriber = %id, "Subscriber connected");
        Some(Subscriber { id, events })
    }

    /// Add a subscriber to an expert's room. Returns `false` for an unknown handle.
    pub async fn join(&self, id: SubscriberId, expert: ExpertId) -> bool {
        let mut state = self.state.write().await;
        let Some(membership) = state.subscribers.get_mut(&id) else {
            return false;
        };
        membership.rooms.insert(expert);
        state.rooms.entry(expert).or_default().insert(id);
        debug!(subscriber = %id, expert_id = %expert, "Joined expert room");
        true
    }

    /// Remove a subscriber from an expert's room. Returns `false` for an unknown handle.
    pub async fn leave(&self, id: SubscriberId, expert: ExpertId) -> bool {
        let mut state = self.state.write().await;
        let Some(membership) = state.subscribers.get_mut(&id) else {
            return false;
        };
        membership.rooms.remove(&expert);
        if let Some(members) = state.rooms.get_mut(&expert) {
            members.remove(&id);
            if members.is_empty() {
                state.rooms.remove(&expert);
            }
        }
        debug!(subscriber = %id, expert_id = %expert, "Left expert room");
        true
    }

    /// Reap a subscriber from every room it joined.
    pub async fn disconnect(&self, id: SubscriberId) -> bool {
        let removed = self.state.write().await.remove(id);
        if removed {
            debug!(subscriber = %id, "Subscriber disconnected");
        }
        removed
    }

    /// Fan an event out to the expert's room.
    ///
    /// Returns the number of subscribers the event was queued for.
    pub async fn publish_event(&self, event: SlotEvent) -> usize {
        let expert = event.expert_id();
        let mut delivered = 0;
        let mut dropped = Vec::new();

        {
            let state = self.state.read().await;
            let Some(members) = state.rooms.get(&expert) else {
                return 0;
            };
            for id in members {
                let Some(membership) = state.subscribers.get(id) else {
                    continue;
                };
                match membership.sender.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(subscriber = %id, expert_id = %expert, "Subscriber queue full, dropping");
                        dropped.push(*id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!(subscriber = %id, "Subscriber queue closed, reaping");
                        dropped.push(*id);
                    }
                }
            }
        }

        if !dropped.is_empty() {
            let mut state = self.state.write().await;
            for id in &dropped {
                state.remove(*id);
            }
            metrics::counter!("booking_realtime_dropped_subscribers_total")
                .increment(dropped.len() as u64);
        }

        delivered
    }

    /// Number of subscribers in an expert's room
    pub async fn room_size(&self, expert: ExpertId) -> usize {
        self.state
            .read()
            .await
            .rooms
            .get(&expert)
            .map_or(0, HashSet::len)
    }

    /// Number of connected subscribers
    pub async fn subscriber_count(&self) -> usize {
        self.state.read().await.subscribers.len()
    }

    /// Whether new connections would be rejected
    pub async fn is_full(&self) -> bool {
        self.subscriber_count().await >= self.max_subscribers
    }
}

impl ChangeNotifier for ExpertRooms {
    fn publish(&self, event: SlotEvent) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let name = event.name();
            let delivered = self.publish_event(event).await;
            metrics::counter!("booking_slot_events_total", "event" => name).increment(1);
            debug!(event = name, delivered, "Slot event published");
        })
    }
}
