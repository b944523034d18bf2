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

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Identifies one subscription on an [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Returns `false` once the subscriber wants to be dropped.
type Dispatch<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

struct Subscriber<E> {
    id: SubscriptionId,
    dispatch: Dispatch<E>,
    once: bool,
}

/// A named-channel publish/subscribe fan-out.
///
/// The bus is generic over the channel key `K` and the event payload `E`,
/// which keeps `assetry-core` decoupled from the events defined by higher
/// layers. Dispatch is synchronous: [`publish`](Self::publish) returns after
/// every subscriber of the channel has run.
///
/// The subscriber list of a channel is snapshotted before dispatch, so
/// handlers may subscribe or unsubscribe (on any channel) while an event is
/// being delivered. Subscribers added during a dispatch only see later events.
pub struct EventBus<K, E> {
    channels: Mutex<HashMap<K, Vec<Subscriber<E>>>>,
    next_id: AtomicU64,
}

impl<K, E> EventBus<K, E>
where
    K: Eq + Hash + Clone + 'static,
    E: Clone + Send + 'static,
{
    /// Creates a bus with no channels.
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers `handler` on the `key` channel until it is unsubscribed.
    pub fn subscribe(
        &self,
        key: K,
        handler: impl Fn(&E) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.insert(
            key,
            Arc::new(move |event: &E| {
                handler(event);
                true
            }),
            false,
        )
    }

    /// Registers `handler` for the next event on the `key` channel only.
    ///
    /// The subscription is removed before the handler runs, so a re-entrant
    /// publish from inside the handler cannot invoke it twice.
    pub fn subscribe_once(
        &self,
        key: K,
        handler: impl Fn(&E) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.insert(
            key,
            Arc::new(move |event: &E| {
                handler(event);
                true
            }),
            true,
        )
    }

    /// Returns a receiver fed with every event published on `key`.
    ///
    /// The subscription is pruned on the first publish after the receiver
    /// has been dropped.
    pub fn listen(&self, key: K) -> flume::Receiver<E> {
        let (sender, receiver) = flume::unbounded();
        self.insert(
            key,
            Arc::new(move |event: &E| sender.send(event.clone()).is_ok()),
            false,
        );
        receiver
    }

    /// Removes a subscription. Returns `false` if it was not registered on
    /// `key` (already removed, or a fired once-subscription).
    pub fn unsubscribe(&self, key: &K, id: SubscriptionId) -> bool {
        let mut channels = self.lock();
        let Some(subscribers) = channels.get_mut(key) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            channels.remove(key);
        }
        removed
    }

    /// Delivers `event` to every subscriber of `key`.
    ///
    /// Returns the number of subscribers invoked.
    pub fn publish(&self, key: &K, event: &E) -> usize {
        let snapshot: Vec<(SubscriptionId, Dispatch<E>)> = {
            let mut channels = self.lock();
            let Some(subscribers) = channels.get_mut(key) else {
                return 0;
            };
            let snapshot = subscribers
                .iter()
                .map(|s| (s.id, s.dispatch.clone()))
                .collect();
            subscribers.retain(|s| !s.once);
            if subscribers.is_empty() {
                channels.remove(key);
            }
            snapshot
        };

        log::trace!("Publishing an event to {} subscriber(s).", snapshot.len());

        let mut stale = Vec::new();
        for (id, dispatch) in &snapshot {
            if !dispatch(event) {
                stale.push(*id);
            }
        }
        for id in stale {
            log::trace!("Pruning disconnected subscriber {id:?}.");
            self.unsubscribe(key, id);
        }
        snapshot.len()
    }

    /// Number of live subscriptions on `key`.
    pub fn subscriber_count(&self, key: &K) -> usize {
        self.lock().get(key).map_or(0, Vec::len)
    }

    /// Removes every subscription on every channel.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn insert(&self, key: K, dispatch: Dispatch<E>, once: bool) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().entry(key).or_default().push(Subscriber { id, dispatch, once });
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Vec<Subscriber<E>>>> {
        self.channels.lock().expect("event bus channel table poisoned")
    }
}

impl<K, E> Default for EventBus<K, E>
where
    K: Eq + Hash + Clone + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> fmt::Debug for EventBus<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = self.channels.lock().map(|c| c.len()).unwrap_or_default();
        f.debug_struct("EventBus")
            .field("channels", &channels)
            .finish()
    }
}
