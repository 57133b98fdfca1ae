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

//! # topic-bus
//!
//! `topic-bus` is an in-process publish/subscribe bus for concurrent
//! components sharing one process. Messages are addressed by token-sequence
//! topics; subscriptions use MQTT-style wildcard patterns; the most recent
//! retained value per topic is replayed to late subscribers; and a separate
//! point-to-point lane offers admission-signalled delivery for request/reply.
//!
//! Delivery is deliberately best-effort: every subscriber owns a bounded
//! mailbox with an overflow policy, and a publisher is never blocked or
//! failed by a slow consumer. Losses surface as per-subscriber drop
//! counters instead.
//!
//! Typical usage is API-first and remains centered on [`Bus`] and
//! [`Connection`]. Internal modules are organized by domain layer to keep
//! behavior ownership explicit.
//!
//! ## Quick start
//!
//! ```
//! use topic_bus::Bus;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let bus = Bus::new();
//! let connection = bus.connect();
//!
//! // "+" matches exactly one topic position.
//! let subscription = connection.subscribe(["sensors", "+"]).unwrap();
//!
//! connection.publish(["sensors", "kitchen"], "21.5").unwrap();
//!
//! let message = subscription.recv().await.unwrap();
//! assert_eq!(message.payload_str(), Some("21.5"));
//! # });
//! ```
//!
//! ## Retained values
//!
//! ```
//! use topic_bus::Bus;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let bus = Bus::new();
//! let connection = bus.connect();
//!
//! connection.retain(["config", "mode"], "eco").unwrap();
//!
//! // A later subscriber still observes the last value.
//! let subscription = connection.subscribe(["config", "#"]).unwrap();
//! let message = subscription.recv().await.unwrap();
//! assert_eq!(message.payload_str(), Some("eco"));
//! # });
//! ```
//!
//! ## Request/reply
//!
//! ```
//! use topic_bus::Bus;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let bus = Bus::new();
//!
//! let server = bus.connect();
//! let requests = server.subscribe(["greeter"]).unwrap();
//! tokio::spawn(async move {
//!     while let Some(request) = requests.next().await {
//!         if let Some(reply_to) = request.reply_to.clone() {
//!             let name = request.payload_str().unwrap_or("?").to_string();
//!             server
//!                 .publish(reply_to, format!("hello {name}"))
//!                 .unwrap();
//!         }
//!     }
//! });
//!
//! let client = bus.connect();
//! let reply = client.request_once(["greeter"], "ada").await.unwrap();
//! assert_eq!(reply.payload_str(), Some("hello ada"));
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - API facade: outward [`Bus`], [`Connection`], [`Subscription`],
//!   [`Endpoint`] surface
//! - Routing: wildcard classification, the dual-mode matching trie, and the
//!   retained last-value store
//! - Data plane: bounded per-subscriber mailboxes and the best-effort
//!   dispatch engine
//! - Observability: canonical `tracing` event names and field formats
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events. Library code emits events and
//! does not unconditionally initialize a global subscriber. Binaries and
//! tests are responsible for one-time `tracing_subscriber` initialization at
//! process boundaries.

mod bus;
mod connection;
mod data_plane;
mod endpoint;
mod error;
mod message;
mod observability;
mod routing;
mod subscription;
mod topic;

pub use bus::{Bus, BusBuilder};
pub use connection::{BindOptions, CallOptions, Connection, SubscribeOptions};
pub use data_plane::mailbox::FullPolicy;
pub use endpoint::Endpoint;
pub use error::{BusError, CallError, CloseReason, DeliverError};
pub use message::Message;
pub use subscription::Subscription;
pub use topic::{Token, Topic};
