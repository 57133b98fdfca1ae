/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Dispatch engine: shared bus state and best-effort fanout.
//!
//! Every mutation of the routing stores happens inside a short,
//! non-suspending critical section, and delivery is one non-blocking mailbox
//! attempt per matching subscriber. Congestion becomes drop accounting on
//! the affected subscriber, never an error raised at the publisher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace, warn};

use crate::data_plane::mailbox::{FullPolicy, Mailbox, SendOutcome};
use crate::error::{BusError, CloseReason, DeliverError};
use crate::message::Message;
use crate::observability::{events, fields};
use crate::routing::pattern::{Segment, TopicKey, Wildcards};
use crate::routing::retained_store::RetainedStore;
use crate::routing::topic_trie::TopicTrie;
use crate::topic::Topic;

const COMPONENT: &str = "dispatch";

/// Shared state of one open subscription: the pattern it was registered
/// under and the mailbox deliveries land in.
pub(crate) struct SubscriptionCore {
    pub(crate) id: u64,
    pub(crate) pattern: Topic,
    segments: Vec<Segment>,
    pub(crate) mailbox: Mailbox<Message>,
}

/// Shared state of one bound endpoint. Only the point-to-point lane reaches
/// its mailbox; publish fanout never does.
pub(crate) struct EndpointCore {
    pub(crate) id: u64,
    pub(crate) topic: Topic,
    key: TopicKey,
    pub(crate) mailbox: Mailbox<Message>,
}

/// One bucket per stored pattern: the open subscriptions registered under it.
type SubscriberBucket = HashMap<u64, Arc<SubscriptionCore>>;

/// Storage owner for the routing stores and the dispatch paths that mutate
/// them.
pub(crate) struct BusCore {
    wildcards: Wildcards,
    default_queue_length: usize,
    default_full_policy: FullPolicy,
    pubsub: Mutex<TopicTrie<SubscriberBucket>>,
    retained: Mutex<RetainedStore>,
    endpoints: Mutex<HashMap<TopicKey, Arc<EndpointCore>>>,
    next_handle_id: AtomicU64,
}

impl BusCore {
    pub(crate) fn new(
        wildcards: Wildcards,
        default_queue_length: usize,
        default_full_policy: FullPolicy,
    ) -> Self {
        Self {
            wildcards,
            default_queue_length,
            default_full_policy,
            pubsub: Mutex::new(TopicTrie::new()),
            retained: Mutex::new(RetainedStore::new()),
            endpoints: Mutex::new(HashMap::new()),
            next_handle_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn default_queue_length(&self) -> usize {
        self.default_queue_length
    }

    pub(crate) fn default_full_policy(&self) -> FullPolicy {
        self.default_full_policy
    }

    /// Fans `message` out to every subscription whose pattern matches its
    /// topic. Never blocks and never fails; per-subscriber congestion is
    /// absorbed by the mailbox policy.
    pub(crate) fn publish(&self, message: Message) {
        let atoms = self.wildcards.literal_atoms(&message.topic);
        let targets: Vec<Arc<SubscriptionCore>> = {
            let trie = self.pubsub.lock().unwrap();
            let mut targets = Vec::new();
            trie.match_topic(&atoms, &mut |bucket: &SubscriberBucket| {
                targets.extend(bucket.values().cloned());
            });
            targets
        };

        for subscription in targets {
            let outcome = subscription.mailbox.try_send(message.clone());
            match outcome {
                SendOutcome::Accepted => trace!(
                    event = events::DISPATCH_DELIVER,
                    component = COMPONENT,
                    sub_id = subscription.id,
                    topic = fields::format_topic(&message.topic).as_str(),
                    "delivered to subscriber"
                ),
                SendOutcome::DroppedOldest => debug!(
                    event = events::DISPATCH_DROP_OLDEST,
                    component = COMPONENT,
                    sub_id = subscription.id,
                    topic = fields::format_topic(&message.topic).as_str(),
                    dropped = subscription.mailbox.dropped(),
                    "subscriber backlog full; evicted oldest"
                ),
                SendOutcome::Rejected => debug!(
                    event = events::DISPATCH_REJECT_NEWEST,
                    component = COMPONENT,
                    sub_id = subscription.id,
                    topic = fields::format_topic(&message.topic).as_str(),
                    dropped = subscription.mailbox.dropped(),
                    "subscriber backlog full; rejected newest"
                ),
                SendOutcome::Closed => trace!(
                    event = events::DISPATCH_SKIP_CLOSED,
                    component = COMPONENT,
                    sub_id = subscription.id,
                    "skipped closed subscriber"
                ),
            }
        }
    }

    /// Publishes `message` and stores it as the last value for its exact
    /// topic. The topic must be concrete.
    pub(crate) fn retain(&self, message: Message) -> Result<(), BusError> {
        let atoms = self.wildcards.concrete_atoms(&message.topic)?;
        self.publish(message.clone());
        let replaced = self.retained.lock().unwrap().set(&atoms, message.clone());
        debug!(
            event = events::RETAIN_SET,
            component = COMPONENT,
            topic = fields::format_topic(&message.topic).as_str(),
            replaced,
            "retained last value"
        );
        Ok(())
    }

    /// Removes the retained value for the exact topic, if any.
    pub(crate) fn unretain(&self, topic: &Topic) -> Result<(), BusError> {
        let atoms = self.wildcards.concrete_atoms(topic)?;
        let removed = self.retained.lock().unwrap().clear(&atoms);
        debug!(
            event = events::RETAIN_CLEAR,
            component = COMPONENT,
            topic = fields::format_topic(topic).as_str(),
            removed,
            "cleared retained value"
        );
        Ok(())
    }

    /// Validates `pattern`, registers a new subscription under it, and
    /// replays matching retained values into the fresh mailbox.
    pub(crate) fn subscribe(
        &self,
        pattern: Topic,
        queue_length: usize,
        policy: FullPolicy,
    ) -> Result<Arc<SubscriptionCore>, BusError> {
        let segments = self.wildcards.compile_pattern(&pattern)?;
        let subscription = Arc::new(SubscriptionCore {
            id: self.next_handle_id.fetch_add(1, Ordering::Relaxed),
            pattern,
            segments: segments.clone(),
            mailbox: Mailbox::new(queue_length, policy),
        });

        {
            let mut trie = self.pubsub.lock().unwrap();
            trie.get_or_insert_with(&segments, HashMap::new)
                .insert(subscription.id, subscription.clone());
        }
        debug!(
            event = events::SUBSCRIBE_OK,
            component = COMPONENT,
            sub_id = subscription.id,
            pattern = fields::format_topic(&subscription.pattern).as_str(),
            queue_length,
            "registered subscription"
        );

        // Retained replay shares the best-effort path: a flooded fresh
        // subscriber accounts its own losses.
        let replay = self.retained.lock().unwrap().matching(&segments);
        for message in replay {
            match subscription.mailbox.try_send(message) {
                SendOutcome::Accepted => trace!(
                    event = events::RETAIN_REPLAY,
                    component = COMPONENT,
                    sub_id = subscription.id,
                    "replayed retained value"
                ),
                _ => debug!(
                    event = events::RETAIN_REPLAY_DROP,
                    component = COMPONENT,
                    sub_id = subscription.id,
                    "retained replay refused by mailbox"
                ),
            }
        }

        Ok(subscription)
    }

    /// Removes a subscription from its bucket (pruning an emptied bucket
    /// node) and closes its mailbox with `reason`. Idempotent; unknown or
    /// already-removed subscriptions are accepted silently.
    pub(crate) fn remove_subscription(&self, subscription: &Arc<SubscriptionCore>, reason: CloseReason) {
        {
            let mut trie = self.pubsub.lock().unwrap();
            if let Some(bucket) = trie.get_mut(&subscription.segments) {
                bucket.remove(&subscription.id);
                if bucket.is_empty() {
                    trie.remove(&subscription.segments);
                }
            }
        }
        subscription.mailbox.close(reason);
        debug!(
            event = events::UNSUBSCRIBE_OK,
            component = COMPONENT,
            sub_id = subscription.id,
            reason = %reason,
            "removed subscription"
        );
    }

    /// Binds an endpoint to a concrete topic. At most one endpoint may be
    /// bound per canonical topic key across the bus.
    pub(crate) fn bind(
        &self,
        topic: Topic,
        queue_length: usize,
    ) -> Result<Arc<EndpointCore>, BusError> {
        let atoms = self.wildcards.concrete_atoms(&topic)?;
        let key = TopicKey::from_atoms(&atoms);
        let endpoint = Arc::new(EndpointCore {
            id: self.next_handle_id.fetch_add(1, Ordering::Relaxed),
            topic,
            key: key.clone(),
            mailbox: Mailbox::new(queue_length, FullPolicy::RejectNewest),
        });

        {
            let mut endpoints = self.endpoints.lock().unwrap();
            if endpoints.contains_key(&key) {
                warn!(
                    event = events::ENDPOINT_BIND_CONFLICT,
                    component = COMPONENT,
                    topic = fields::format_topic(&endpoint.topic).as_str(),
                    "endpoint already bound"
                );
                return Err(BusError::AlreadyBound);
            }
            endpoints.insert(key, endpoint.clone());
        }
        debug!(
            event = events::ENDPOINT_BIND_OK,
            component = COMPONENT,
            endpoint_id = endpoint.id,
            topic = fields::format_topic(&endpoint.topic).as_str(),
            queue_length,
            "bound endpoint"
        );
        Ok(endpoint)
    }

    /// Removes an endpoint from the index and closes its mailbox with
    /// `reason`. Idempotent.
    pub(crate) fn remove_endpoint(&self, endpoint: &Arc<EndpointCore>, reason: CloseReason) {
        {
            let mut endpoints = self.endpoints.lock().unwrap();
            if let Some(current) = endpoints.get(&endpoint.key) {
                if Arc::ptr_eq(current, endpoint) {
                    endpoints.remove(&endpoint.key);
                }
            }
        }
        endpoint.mailbox.close(reason);
        debug!(
            event = events::ENDPOINT_UNBIND,
            component = COMPONENT,
            endpoint_id = endpoint.id,
            reason = %reason,
            "removed endpoint"
        );
    }

    /// One non-blocking point-to-point delivery attempt to the endpoint
    /// bound at the message's (concrete) topic.
    pub(crate) fn publish_one(&self, message: Message) -> Result<(), DeliverError> {
        let atoms = self
            .wildcards
            .concrete_atoms(&message.topic)
            .map_err(DeliverError::Bus)?;
        let key = TopicKey::from_atoms(&atoms);
        let endpoint = self.endpoints.lock().unwrap().get(&key).cloned();
        let Some(endpoint) = endpoint else {
            debug!(
                event = events::PUBLISH_ONE_NO_ROUTE,
                component = COMPONENT,
                topic = fields::format_topic(&message.topic).as_str(),
                "no endpoint bound"
            );
            return Err(DeliverError::NoRoute);
        };

        match endpoint.mailbox.try_send(message) {
            SendOutcome::Accepted => {
                trace!(
                    event = events::PUBLISH_ONE_OK,
                    component = COMPONENT,
                    endpoint_id = endpoint.id,
                    "admitted point-to-point delivery"
                );
                Ok(())
            }
            SendOutcome::Rejected | SendOutcome::DroppedOldest => {
                debug!(
                    event = events::PUBLISH_ONE_FULL,
                    component = COMPONENT,
                    endpoint_id = endpoint.id,
                    "endpoint mailbox full"
                );
                Err(DeliverError::Full)
            }
            SendOutcome::Closed => {
                debug!(
                    event = events::PUBLISH_ONE_CLOSED,
                    component = COMPONENT,
                    endpoint_id = endpoint.id,
                    "endpoint mailbox closed"
                );
                Err(DeliverError::Closed)
            }
        }
    }

    pub(crate) fn subscription_count(&self) -> usize {
        let trie = self.pubsub.lock().unwrap();
        let mut count = 0;
        trie.for_each_value(&mut |bucket: &SubscriberBucket| count += bucket.len());
        count
    }

    pub(crate) fn endpoint_count(&self) -> usize {
        self.endpoints.lock().unwrap().len()
    }

    pub(crate) fn retained_count(&self) -> usize {
        self.retained.lock().unwrap().len()
    }

    #[cfg(test)]
    pub(crate) fn pubsub_is_empty(&self) -> bool {
        self.pubsub.lock().unwrap().is_empty()
    }
}
