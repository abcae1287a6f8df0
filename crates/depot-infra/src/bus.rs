// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A per-asset publish/subscribe bus living entirely in process.

use depot_core::asset::AssetId;
use depot_core::event::EventBus;
use depot_core::services::{AssetEvent, AssetEventHandler, AssetNotificationBus, SubscriptionId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

struct Subscriber {
    subscription: SubscriptionId,
    handler: Arc<dyn AssetEventHandler>,
}

/// An [`AssetNotificationBus`] that dispatches on the publishing thread or from a queue.
///
/// [`notify`](InProcessBus::notify) delivers an event immediately on the calling
/// thread. [`publish`](InProcessBus::publish) queues it until the owner calls
/// [`dispatch_pending`](InProcessBus::dispatch_pending), which is how a host
/// funnels loader notifications into its own update loop.
///
/// Handlers are invoked without the subscriber table locked, so a handler may
/// subscribe or unsubscribe from inside its callback.
pub struct InProcessBus {
    subscribers: Mutex<HashMap<AssetId, Vec<Subscriber>>>,
    next_subscription: AtomicU64,
    queue: EventBus<AssetEvent>,
    // Serializes queued dispatch so events for one id keep their publish order.
    dispatch: Mutex<()>,
}

impl InProcessBus {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
            queue: EventBus::new(),
            dispatch: Mutex::new(()),
        }
    }

    /// Delivers `event` to every handler subscribed to its asset id, on the calling thread.
    ///
    /// Returns the number of handlers that received the event.
    pub fn notify(&self, event: AssetEvent) -> usize {
        let id = event.asset_id();
        let handlers: Vec<Arc<dyn AssetEventHandler>> = {
            let subscribers = self
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match subscribers.get(&id) {
                Some(list) => list.iter().map(|s| Arc::clone(&s.handler)).collect(),
                None => Vec::new(),
            }
        };

        if handlers.is_empty() {
            log::trace!("No subscribers for asset {id}, dropping event.");
        }
        for handler in &handlers {
            handler.handle_event(&event);
        }
        handlers.len()
    }

    /// Queues `event` for the next [`dispatch_pending`](InProcessBus::dispatch_pending).
    pub fn publish(&self, event: AssetEvent) {
        self.queue.publish(event);
    }

    /// Delivers every queued event in publish order. Returns how many were delivered.
    pub fn dispatch_pending(&self) -> usize {
        let _dispatch = self.dispatch.lock().unwrap_or_else(PoisonError::into_inner);
        let events = self.queue.drain();
        let count = events.len();
        for event in events {
            self.notify(event);
        }
        count
    }

    /// The number of queued, undelivered events.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// The number of live subscriptions for `id`.
    pub fn subscriber_count(&self, id: &AssetId) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map_or(0, Vec::len)
    }

    /// The number of live subscriptions across all ids.
    pub fn total_subscriptions(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }
}

impl Default for InProcessBus {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetNotificationBus for InProcessBus {
    fn subscribe(&self, id: AssetId, handler: Arc<dyn AssetEventHandler>) -> SubscriptionId {
        let subscription =
            SubscriptionId::new(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .push(Subscriber {
                subscription,
                handler,
            });
        log::trace!("Subscribed {:?} to asset {id}.", subscription);
        subscription
    }

    fn unsubscribe(&self, id: &AssetId, subscription: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(list) = subscribers.get_mut(id) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| s.subscription != subscription);
        let removed = list.len() != before;
        if list.is_empty() {
            subscribers.remove(id);
        }
        if removed {
            log::trace!("Unsubscribed {:?} from asset {id}.", subscription);
        }
        removed
    }
}
