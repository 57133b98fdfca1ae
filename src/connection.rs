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

//! Connection lifecycle and the request/reply primitives built on both
//! delivery lanes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::debug;
use uuid::Uuid;

use crate::data_plane::dispatch::{BusCore, EndpointCore, SubscriptionCore};
use crate::data_plane::mailbox::FullPolicy;
use crate::endpoint::Endpoint;
use crate::error::{BusError, CallError, CloseReason, DeliverError};
use crate::message::Message;
use crate::observability::{events, fields};
use crate::subscription::Subscription;
use crate::topic::{Token, Topic};

const COMPONENT: &str = "connection";

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_CALL_BACKOFF: Duration = Duration::from_millis(10);
const DEFAULT_CALL_BACKOFF_MAX: Duration = Duration::from_millis(200);

/// Per-subscription overrides; unset fields fall back to the bus defaults.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubscribeOptions {
    pub queue_length: Option<usize>,
    pub full: Option<FullPolicy>,
}

/// Per-bind overrides. The overflow policy of an endpoint is always
/// reject-newest so admission results are meaningful to the sender.
#[derive(Clone, Copy, Debug, Default)]
pub struct BindOptions {
    pub queue_length: Option<usize>,
}

/// Options for [`Connection::call_with`].
#[derive(Clone, Debug)]
pub struct CallOptions {
    /// Relative deadline, measured from the start of the call.
    pub timeout: Duration,
    /// Absolute deadline; takes precedence over `timeout` when set.
    pub deadline: Option<Instant>,
    /// Initial admission-retry backoff.
    pub backoff: Duration,
    /// Backoff ceiling.
    pub backoff_max: Duration,
    /// Correlation id stamped on the request; a fresh one is generated when
    /// unset.
    pub request_id: Option<String>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CALL_TIMEOUT,
            deadline: None,
            backoff: DEFAULT_CALL_BACKOFF,
            backoff_max: DEFAULT_CALL_BACKOFF_MAX,
            request_id: None,
        }
    }
}

struct Owned {
    subscriptions: HashMap<u64, Arc<SubscriptionCore>>,
    endpoints: HashMap<u64, Arc<EndpointCore>>,
}

pub(crate) struct ConnectionInner {
    pub(crate) core: Arc<BusCore>,
    id: String,
    label: Option<String>,
    /// `Some` while open; `None` once disconnected. Taking the contents is
    /// the disconnect snapshot.
    owned: Mutex<Option<Owned>>,
}

/// A handle onto the bus that owns everything it creates.
///
/// All subscriptions and endpoints opened through a connection are closed
/// when it disconnects, and dropping the connection disconnects it. Every
/// operation except [`disconnect`](Connection::disconnect) fails with
/// [`BusError::Disconnected`] afterwards.
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    pub(crate) fn open(core: Arc<BusCore>, label: Option<String>) -> Self {
        let inner = Arc::new(ConnectionInner {
            core,
            id: Uuid::new_v4().to_string(),
            label,
            owned: Mutex::new(Some(Owned {
                subscriptions: HashMap::new(),
                endpoints: HashMap::new(),
            })),
        });
        debug!(
            event = events::CONNECT,
            component = COMPONENT,
            conn_id = inner.id.as_str(),
            label = inner.label.as_deref().unwrap_or(fields::NONE),
            "connection opened"
        );
        Self { inner }
    }

    /// Publishes a payload to every matching subscriber. Best-effort: slow
    /// subscribers lose messages to their own mailbox policy, and the
    /// publisher is never blocked by them.
    pub fn publish(
        &self,
        topic: impl Into<Topic>,
        payload: impl Into<Bytes>,
    ) -> Result<(), BusError> {
        self.publish_message(Message::new(topic, payload))
    }

    /// Publishes a pre-built [`Message`], e.g. a reply carrying the
    /// requester's `reply_to` address.
    pub fn publish_message(&self, message: Message) -> Result<(), BusError> {
        self.ensure_open()?;
        self.inner.core.publish(message);
        Ok(())
    }

    /// Publishes and stores the payload as the last value for this exact
    /// topic, replayed to future matching subscribers.
    pub fn retain(
        &self,
        topic: impl Into<Topic>,
        payload: impl Into<Bytes>,
    ) -> Result<(), BusError> {
        self.ensure_open()?;
        self.inner.core.retain(Message::new(topic, payload))
    }

    /// Removes the retained value for this exact topic.
    pub fn unretain(&self, topic: impl Into<Topic>) -> Result<(), BusError> {
        self.ensure_open()?;
        self.inner.core.unretain(&topic.into())
    }

    /// Subscribes to a pattern with the bus defaults.
    pub fn subscribe(&self, pattern: impl Into<Topic>) -> Result<Subscription, BusError> {
        self.subscribe_with(pattern, SubscribeOptions::default())
    }

    /// Subscribes to a pattern. Matching retained values are replayed into
    /// the fresh mailbox before this returns.
    pub fn subscribe_with(
        &self,
        pattern: impl Into<Topic>,
        options: SubscribeOptions,
    ) -> Result<Subscription, BusError> {
        let pattern = pattern.into();
        let mut owned = self.inner.owned.lock().unwrap();
        let Some(owned) = owned.as_mut() else {
            return Err(BusError::Disconnected);
        };
        let queue_length = options
            .queue_length
            .unwrap_or_else(|| self.inner.core.default_queue_length());
        let policy = options
            .full
            .unwrap_or_else(|| self.inner.core.default_full_policy());
        let core = self.inner.core.subscribe(pattern, queue_length, policy)?;
        owned.subscriptions.insert(core.id, core.clone());
        Ok(Subscription::new(core, Arc::downgrade(&self.inner)))
    }

    /// Binds an endpoint to a concrete topic with the bus default queue
    /// length.
    pub fn bind(&self, topic: impl Into<Topic>) -> Result<Endpoint, BusError> {
        self.bind_with(topic, BindOptions::default())
    }

    /// Binds an endpoint to a concrete topic. Fails with
    /// [`BusError::AlreadyBound`] when any connection already holds an
    /// endpoint for the same topic.
    pub fn bind_with(
        &self,
        topic: impl Into<Topic>,
        options: BindOptions,
    ) -> Result<Endpoint, BusError> {
        let topic = topic.into();
        let mut owned = self.inner.owned.lock().unwrap();
        let Some(owned) = owned.as_mut() else {
            return Err(BusError::Disconnected);
        };
        let queue_length = options
            .queue_length
            .unwrap_or_else(|| self.inner.core.default_queue_length());
        let core = self.inner.core.bind(topic, queue_length)?;
        owned.endpoints.insert(core.id, core.clone());
        Ok(Endpoint::new(core, Arc::downgrade(&self.inner)))
    }

    /// One admission-signalled delivery attempt to the endpoint bound at a
    /// concrete topic. The refusal reasons (`no_route`, `full`, `closed`)
    /// are returned values, not faults.
    pub fn publish_one(
        &self,
        topic: impl Into<Topic>,
        payload: impl Into<Bytes>,
    ) -> Result<(), DeliverError> {
        self.publish_one_message(Message::new(topic, payload))
    }

    /// Point-to-point variant of [`publish_message`](Self::publish_message).
    pub fn publish_one_message(&self, message: Message) -> Result<(), DeliverError> {
        self.ensure_open()?;
        self.inner.core.publish_one(message)
    }

    /// Publishes a request carrying a fresh reply address and returns the
    /// subscription on that address, suitable for collecting multiple
    /// replies. The subscription is registered before the request is
    /// published, so even an instant responder cannot race it.
    pub fn request_sub(
        &self,
        topic: impl Into<Topic>,
        payload: impl Into<Bytes>,
    ) -> Result<Subscription, BusError> {
        let reply_to = fresh_reply_topic();
        let subscription = self.subscribe(reply_to.clone())?;
        self.publish_message(
            Message::new(topic, payload)
                .with_reply_to(reply_to)
                .with_id(Uuid::new_v4().to_string()),
        )?;
        Ok(subscription)
    }

    /// Publishes a request and awaits exactly the first reply. The temporary
    /// reply subscription (queue 1, reject-newest) is released on every exit
    /// path, including cancellation. Compose with
    /// [`tokio::time::timeout`] for a deadline.
    pub async fn request_once(
        &self,
        topic: impl Into<Topic>,
        payload: impl Into<Bytes>,
    ) -> Result<Message, CallError> {
        let reply_to = fresh_reply_topic();
        let subscription = self.subscribe_with(
            reply_to.clone(),
            SubscribeOptions {
                queue_length: Some(1),
                full: Some(FullPolicy::RejectNewest),
            },
        )?;
        self.publish_message(
            Message::new(topic, payload)
                .with_reply_to(reply_to)
                .with_id(Uuid::new_v4().to_string()),
        )?;
        subscription.recv().await.map_err(CallError::Closed)
    }

    /// Admission-signalled request/reply over the point-to-point lane, with
    /// the default options (1 s timeout).
    pub async fn call(
        &self,
        topic: impl Into<Topic>,
        payload: impl Into<Bytes>,
    ) -> Result<Message, CallError> {
        self.call_with(topic, payload, CallOptions::default()).await
    }

    /// Binds a temporary reply endpoint, delivers the request with
    /// exponential admission backoff until the server accepts it or the
    /// deadline passes, then awaits one reply against the same deadline.
    /// The reply endpoint is unbound on every terminal path, including
    /// cancellation.
    pub async fn call_with(
        &self,
        topic: impl Into<Topic>,
        payload: impl Into<Bytes>,
        options: CallOptions,
    ) -> Result<Message, CallError> {
        let topic = topic.into();
        let deadline = options
            .deadline
            .unwrap_or_else(|| Instant::now() + options.timeout);
        let reply_to = fresh_reply_topic();
        let reply_endpoint = self.bind_with(
            reply_to.clone(),
            BindOptions {
                queue_length: Some(1),
            },
        )?;
        let request_id = options
            .request_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let message = Message::new(topic, payload)
            .with_reply_to(reply_to)
            .with_id(request_id.clone());

        let mut backoff = options.backoff;
        let mut attempt = 0u32;
        loop {
            self.ensure_open()?;
            match self.inner.core.publish_one(message.clone()) {
                Ok(()) => break,
                Err(DeliverError::Bus(err)) => return Err(CallError::Bus(err)),
                Err(refusal) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!(
                            event = events::CALL_TIMEOUT,
                            component = COMPONENT,
                            conn_id = self.inner.id.as_str(),
                            request_id = request_id.as_str(),
                            topic = fields::format_topic(&message.topic).as_str(),
                            "deadline elapsed before the request was admitted"
                        );
                        return Err(CallError::Timeout);
                    }
                    attempt += 1;
                    debug!(
                        event = events::CALL_ADMIT_RETRY,
                        component = COMPONENT,
                        conn_id = self.inner.id.as_str(),
                        request_id = request_id.as_str(),
                        topic = fields::format_topic(&message.topic).as_str(),
                        attempt,
                        refusal = %refusal,
                        backoff_ms = backoff.as_millis() as u64,
                        "request refused; backing off"
                    );
                    sleep(backoff.min(deadline - now)).await;
                    backoff = (backoff * 2).min(options.backoff_max);
                }
            }
        }

        match timeout_at(deadline, reply_endpoint.recv()).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(reason)) => Err(CallError::Closed(reason)),
            Err(_) => {
                debug!(
                    event = events::CALL_TIMEOUT,
                    component = COMPONENT,
                    conn_id = self.inner.id.as_str(),
                    request_id = request_id.as_str(),
                    "deadline elapsed while awaiting the reply"
                );
                Err(CallError::Timeout)
            }
        }
    }

    /// Disconnects: closes every owned subscription and endpoint with reason
    /// `disconnected` and removes them from the bus. Idempotent; a second
    /// call is a no-op.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Whether this connection has been disconnected.
    pub fn is_disconnected(&self) -> bool {
        self.inner.owned.lock().unwrap().is_none()
    }

    fn ensure_open(&self) -> Result<(), BusError> {
        if self.inner.owned.lock().unwrap().is_some() {
            Ok(())
        } else {
            Err(BusError::Disconnected)
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.inner.disconnect();
    }
}

impl ConnectionInner {
    fn disconnect(&self) {
        let owned = self.owned.lock().unwrap().take();
        let Some(owned) = owned else {
            return;
        };
        for subscription in owned.subscriptions.values() {
            self.core
                .remove_subscription(subscription, CloseReason::Disconnected);
        }
        for endpoint in owned.endpoints.values() {
            self.core
                .remove_endpoint(endpoint, CloseReason::Disconnected);
        }
        debug!(
            event = events::DISCONNECT,
            component = COMPONENT,
            conn_id = self.id.as_str(),
            label = self.label.as_deref().unwrap_or(fields::NONE),
            "connection disconnected"
        );
    }

    /// Detaches a subscription handle: forgets it from the owned set and
    /// removes it from the bus. Safe to call repeatedly and after
    /// disconnect.
    pub(crate) fn release_subscription(&self, core: &Arc<SubscriptionCore>) {
        if let Some(owned) = self.owned.lock().unwrap().as_mut() {
            owned.subscriptions.remove(&core.id);
        }
        self.core
            .remove_subscription(core, CloseReason::Unsubscribed);
    }

    /// Endpoint counterpart of
    /// [`release_subscription`](Self::release_subscription).
    pub(crate) fn release_endpoint(&self, core: &Arc<EndpointCore>) {
        if let Some(owned) = self.owned.lock().unwrap().as_mut() {
            owned.endpoints.remove(&core.id);
        }
        self.core.remove_endpoint(core, CloseReason::Unbound);
    }
}

/// A fresh, collision-free reply address. Tokens are literal-wrapped so the
/// address stays concrete under any wildcard configuration.
fn fresh_reply_topic() -> Topic {
    Topic::from(vec![
        Token::literal("_reply"),
        Token::literal(Uuid::new_v4().simple().to_string()),
    ])
}
