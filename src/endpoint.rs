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
use crate::data_plane::dispatch::EndpointCore;
use crate::error::CloseReason;
use crate::message::Message;
use crate::topic::Topic;

/// The receiving side of the point-to-point lane.
///
/// An endpoint is bound to one concrete topic and is the only binding for
/// that topic across the whole bus. It is reached exclusively through
/// [`publish_one`](crate::Connection::publish_one) and
/// [`call`](crate::Connection::call); publish fanout never delivers into it.
/// Dropping the handle unbinds.
pub struct Endpoint {
    core: Arc<EndpointCore>,
    owner: Weak<ConnectionInner>,
}

impl Endpoint {
    pub(crate) fn new(core: Arc<EndpointCore>, owner: Weak<ConnectionInner>) -> Self {
        Self { core, owner }
    }

    /// Receives the next admitted message, suspending until one arrives.
    /// Once the endpoint is closed and drained, yields the close reason.
    pub async fn recv(&self) -> Result<Message, CloseReason> {
        self.core.mailbox.recv().await
    }

    /// Iteration form of [`recv`](Self::recv): `None` once the endpoint is
    /// closed and drained.
    pub async fn next(&self) -> Option<Message> {
        self.recv().await.ok()
    }

    /// The concrete topic this endpoint is bound to.
    pub fn topic(&self) -> &Topic {
        &self.core.topic
    }

    /// Cumulative count of refused deliveries.
    pub fn dropped(&self) -> u64 {
        self.core.mailbox.dropped()
    }

    /// The close reason, once the endpoint has been closed.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.core.mailbox.close_reason()
    }

    /// Unbinds: frees the topic for a future bind and closes the mailbox
    /// with reason `unbound`, waking any pending receiver. Idempotent;
    /// dropping the handle has the same effect.
    pub fn unbind(&self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.release_endpoint(&self.core);
        }
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.unbind();
    }
}
