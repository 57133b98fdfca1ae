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

use std::sync::{Arc, Weak};

use crate::connection::ConnectionInner;
use crate::data_plane::dispatch::SubscriptionCore;
use crate::error::CloseReason;
use crate::message::Message;
use crate::topic::Topic;

/// A receiver for one subscription pattern.
///
/// Messages queue in a bounded mailbox; what happens when it overflows is
/// the subscription's configured [`FullPolicy`](crate::FullPolicy), and
/// [`dropped`](Subscription::dropped) accounts for the losses. Dropping the
/// handle unsubscribes.
pub struct Subscription {
    core: Arc<SubscriptionCore>,
    owner: Weak<ConnectionInner>,
}

impl Subscription {
    pub(crate) fn new(core: Arc<SubscriptionCore>, owner: Weak<ConnectionInner>) -> Self {
        Self { core, owner }
    }

    /// Receives the next message, suspending until one arrives. Once the
    /// subscription is closed and its backlog drained, yields the close
    /// reason instead. Compose with [`tokio::time::timeout`] or
    /// `tokio::select!` for deadlines.
    pub async fn recv(&self) -> Result<Message, CloseReason> {
        self.core.mailbox.recv().await
    }

    /// Iteration form of [`recv`](Self::recv): `None` once the subscription
    /// is closed and drained.
    ///
    /// ```no_run
    /// # async fn example(subscription: topic_bus::Subscription) {
    /// while let Some(message) = subscription.next().await {
    ///     let _payload = message.payload;
    /// }
    /// # }
    /// ```
    pub async fn next(&self) -> Option<Message> {
        self.recv().await.ok()
    }

    /// The pattern this subscription was registered under.
    pub fn pattern(&self) -> &Topic {
        &self.core.pattern
    }

    /// Cumulative count of messages lost to this mailbox's overflow policy,
    /// including refused retained replay.
    pub fn dropped(&self) -> u64 {
        self.core.mailbox.dropped()
    }

    /// The close reason, once the subscription has been closed.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.core.mailbox.close_reason()
    }

    /// Unsubscribes: removes the pattern registration and closes the mailbox
    /// with reason `unsubscribed`, waking any pending receiver. Idempotent;
    /// dropping the handle has the same effect.
    pub fn unsubscribe(&self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.release_subscription(&self.core);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
