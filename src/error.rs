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

//! Structured error values for the bus surface.
//!
//! Validation failures (bad topics, bad configuration, conflicting binds,
//! operations on a disconnected connection) are [`BusError`]. Per-delivery
//! outcomes of the point-to-point lane are [`DeliverError`], values returned
//! to the caller rather than faults. Receivers observe their own close
//! through [`CloseReason`].

use thiserror::Error;

/// Why a subscription or endpoint mailbox was closed.
///
/// The reason is monotonic: once set it never changes, and receivers see it
/// only after draining any buffered messages.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum CloseReason {
    /// The subscription was explicitly unsubscribed.
    #[error("unsubscribed")]
    Unsubscribed,
    /// The owning connection disconnected.
    #[error("disconnected")]
    Disconnected,
    /// The endpoint was explicitly unbound.
    #[error("unbound")]
    Unbound,
}

/// Validation and lifecycle failures.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BusError {
    #[error("connection is disconnected")]
    Disconnected,
    #[error("invalid topic: {0}")]
    InvalidTopic(&'static str),
    #[error("invalid bus configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("an endpoint is already bound to this topic")]
    AlreadyBound,
}

/// Outcome of a point-to-point delivery attempt that did not admit the
/// message.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum DeliverError {
    /// No endpoint is bound to the target topic.
    #[error("no endpoint bound for topic")]
    NoRoute,
    /// The endpoint mailbox refused the message.
    #[error("endpoint mailbox is full")]
    Full,
    /// The endpoint mailbox is closed.
    #[error("endpoint mailbox is closed")]
    Closed,
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Failure of a request/reply interaction (`request_once` or `call`).
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum CallError {
    /// The deadline elapsed before a reply was admitted and received.
    #[error("call timed out before a reply arrived")]
    Timeout,
    /// The reply mailbox closed while waiting.
    #[error("reply channel closed: {0}")]
    Closed(CloseReason),
    #[error(transparent)]
    Bus(#[from] BusError),
}
