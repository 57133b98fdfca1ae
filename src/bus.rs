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

use std::sync::Arc;

use crate::connection::Connection;
use crate::data_plane::dispatch::BusCore;
use crate::data_plane::mailbox::FullPolicy;
use crate::error::BusError;
use crate::routing::pattern::Wildcards;

const DEFAULT_QUEUE_LENGTH: usize = 10;
const DEFAULT_SINGLE_WILDCARD: &str = "+";
const DEFAULT_MULTI_WILDCARD: &str = "#";

/// An in-process publish/subscribe bus.
///
/// A bus owns the topic-matching stores and hands out [`Connection`]s; all
/// traffic flows through connections. There is no process-wide state, and
/// any number of independent buses may coexist.
///
/// # Examples
///
/// ```
/// use topic_bus::{Bus, FullPolicy};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let bus = Bus::builder()
///     .queue_length(32)
///     .full_policy(FullPolicy::RejectNewest)
///     .build()
///     .unwrap();
///
/// let connection = bus.connect();
/// let subscription = connection.subscribe(["jobs", "#"]).unwrap();
///
/// connection.publish(["jobs", "started"], "build-17").unwrap();
///
/// let message = subscription.recv().await.unwrap();
/// assert_eq!(message.payload_str(), Some("build-17"));
/// # });
/// ```
pub struct Bus {
    core: Arc<BusCore>,
}

impl Bus {
    /// Creates a bus with default configuration: queue length 10, drop-oldest
    /// overflow, `+`/`#` wildcard symbols.
    pub fn new() -> Self {
        Self {
            core: Arc::new(BusCore::new(
                Wildcards {
                    single: DEFAULT_SINGLE_WILDCARD.to_string(),
                    multi: DEFAULT_MULTI_WILDCARD.to_string(),
                },
                DEFAULT_QUEUE_LENGTH,
                FullPolicy::default(),
            )),
        }
    }

    pub fn builder() -> BusBuilder {
        BusBuilder::default()
    }

    /// Opens a connection. Dropping the returned [`Connection`] disconnects
    /// it and releases everything it owns.
    pub fn connect(&self) -> Connection {
        Connection::open(self.core.clone(), None)
    }

    /// Opens a connection carrying a diagnostic label for lifecycle events.
    pub fn connect_named(&self, label: impl Into<String>) -> Connection {
        Connection::open(self.core.clone(), Some(label.into()))
    }

    /// Number of currently open subscriptions across all connections.
    pub fn subscription_count(&self) -> usize {
        self.core.subscription_count()
    }

    /// Number of currently bound endpoints.
    pub fn endpoint_count(&self) -> usize {
        self.core.endpoint_count()
    }

    /// Number of topics with a retained value.
    pub fn retained_count(&self) -> usize {
        self.core.retained_count()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

/// Configures and builds a [`Bus`].
#[derive(Clone, Debug)]
pub struct BusBuilder {
    queue_length: usize,
    full_policy: FullPolicy,
    single_wildcard: String,
    multi_wildcard: String,
}

impl Default for BusBuilder {
    fn default() -> Self {
        Self {
            queue_length: DEFAULT_QUEUE_LENGTH,
            full_policy: FullPolicy::default(),
            single_wildcard: DEFAULT_SINGLE_WILDCARD.to_string(),
            multi_wildcard: DEFAULT_MULTI_WILDCARD.to_string(),
        }
    }
}

impl BusBuilder {
    /// Default mailbox capacity for new subscriptions.
    pub fn queue_length(mut self, queue_length: usize) -> Self {
        self.queue_length = queue_length;
        self
    }

    /// Default overflow policy for new subscriptions.
    pub fn full_policy(mut self, full_policy: FullPolicy) -> Self {
        self.full_policy = full_policy;
        self
    }

    /// Token treated as the single-level wildcard in patterns.
    pub fn single_wildcard(mut self, symbol: impl Into<String>) -> Self {
        self.single_wildcard = symbol.into();
        self
    }

    /// Token treated as the multi-level wildcard in patterns.
    pub fn multi_wildcard(mut self, symbol: impl Into<String>) -> Self {
        self.multi_wildcard = symbol.into();
        self
    }

    pub fn build(self) -> Result<Bus, BusError> {
        if self.single_wildcard.is_empty() || self.multi_wildcard.is_empty() {
            return Err(BusError::InvalidConfig("wildcard symbols must be non-empty"));
        }
        if self.single_wildcard == self.multi_wildcard {
            return Err(BusError::InvalidConfig(
                "single- and multi-level wildcard symbols must differ",
            ));
        }
        Ok(Bus {
            core: Arc::new(BusCore::new(
                Wildcards {
                    single: self.single_wildcard,
                    multi: self.multi_wildcard,
                },
                self.queue_length,
                self.full_policy,
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Bus;
    use crate::error::BusError;

    #[test]
    fn builder_rejects_degenerate_wildcard_configuration() {
        assert!(matches!(
            Bus::builder().single_wildcard("").build(),
            Err(BusError::InvalidConfig(_))
        ));
        assert!(matches!(
            Bus::builder().single_wildcard("*").multi_wildcard("*").build(),
            Err(BusError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn custom_wildcard_symbols_drive_matching() {
        let bus = Bus::builder()
            .single_wildcard("*")
            .multi_wildcard(">")
            .build()
            .expect("valid configuration");
        let connection = bus.connect();
        let subscription = connection.subscribe(["a", "*", ">"]).expect("subscribe");

        // With custom symbols, "+" and "#" are ordinary data tokens.
        connection.publish(["a", "+", "#", "deep"], "p").expect("publish");

        let message = subscription.recv().await.expect("delivery");
        assert_eq!(message.payload_str(), Some("p"));
    }

    #[test]
    fn counters_start_at_zero() {
        let bus = Bus::new();

        assert_eq!(bus.subscription_count(), 0);
        assert_eq!(bus.endpoint_count(), 0);
        assert_eq!(bus.retained_count(), 0);
    }
}
