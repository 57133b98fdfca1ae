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

//! Bounded FIFO mailbox with an overflow policy and a monotonic close reason.
//!
//! Sends never block: on a full mailbox the configured [`FullPolicy`] decides
//! whether the oldest buffered item is evicted or the new one is discarded,
//! and either way the drop counter advances. Closing attaches a reason that
//! receivers observe only after the buffered backlog drains.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;

use crate::error::CloseReason;

/// What to do with a new item when the mailbox is full.
///
/// A blocking policy is deliberately absent: senders on this bus must never
/// be suspended by a slow receiver.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FullPolicy {
    /// Evict the oldest buffered item and enqueue the new one.
    #[default]
    DropOldest,
    /// Discard the new item.
    RejectNewest,
}

/// Per-attempt admission outcome of a non-blocking send.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SendOutcome {
    Accepted,
    DroppedOldest,
    Rejected,
    Closed,
}

struct Shared<T> {
    queue: VecDeque<T>,
    capacity: usize,
    policy: FullPolicy,
    closed: Option<CloseReason>,
    dropped: u64,
    recv_waiters: usize,
}

pub(crate) struct Mailbox<T> {
    shared: Mutex<Shared<T>>,
    notify: Notify,
}

impl<T> Mailbox<T> {
    pub(crate) fn new(capacity: usize, policy: FullPolicy) -> Self {
        Self {
            shared: Mutex::new(Shared {
                queue: VecDeque::with_capacity(capacity.min(64)),
                capacity,
                policy,
                closed: None,
                dropped: 0,
                recv_waiters: 0,
            }),
            notify: Notify::new(),
        }
    }

    /// Attempts one non-blocking enqueue.
    pub(crate) fn try_send(&self, item: T) -> SendOutcome {
        let outcome = {
            let mut shared = self.shared.lock().unwrap();
            if shared.closed.is_some() {
                return SendOutcome::Closed;
            }
            if shared.queue.len() < shared.capacity {
                shared.queue.push_back(item);
                SendOutcome::Accepted
            } else if shared.capacity == 0 && shared.recv_waiters > shared.queue.len() {
                // Rendezvous: a suspended receiver takes the item directly.
                shared.queue.push_back(item);
                SendOutcome::Accepted
            } else {
                match shared.policy {
                    FullPolicy::DropOldest if shared.capacity > 0 => {
                        shared.queue.pop_front();
                        shared.queue.push_back(item);
                        shared.dropped += 1;
                        SendOutcome::DroppedOldest
                    }
                    _ => {
                        shared.dropped += 1;
                        SendOutcome::Rejected
                    }
                }
            }
        };
        if matches!(outcome, SendOutcome::Accepted | SendOutcome::DroppedOldest) {
            self.notify.notify_one();
        }
        outcome
    }

    /// Receives the next buffered item, suspending until one arrives. Once
    /// the mailbox is closed and drained, yields the close reason.
    pub(crate) async fn recv(&self) -> Result<T, CloseReason> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before inspecting state so a send or close
            // racing this check cannot slip between them.
            notified.as_mut().enable();
            {
                let mut shared = self.shared.lock().unwrap();
                if let Some(item) = shared.queue.pop_front() {
                    return Ok(item);
                }
                if let Some(reason) = shared.closed {
                    return Err(reason);
                }
                shared.recv_waiters += 1;
            }
            let waiter = WaiterGuard { mailbox: self };
            notified.await;
            drop(waiter);
        }
    }

    /// Closes the mailbox. The first reason wins; buffered items remain
    /// receivable. Wakes every pending receiver.
    pub(crate) fn close(&self, reason: CloseReason) {
        {
            let mut shared = self.shared.lock().unwrap();
            if shared.closed.is_none() {
                shared.closed = Some(reason);
            }
        }
        self.notify.notify_waiters();
    }

    pub(crate) fn close_reason(&self) -> Option<CloseReason> {
        self.shared.lock().unwrap().closed
    }

    /// Cumulative count of items lost to the overflow policy.
    pub(crate) fn dropped(&self) -> u64 {
        self.shared.lock().unwrap().dropped
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.shared.lock().unwrap().queue.len()
    }
}

/// Keeps the waiter count accurate even when a pending `recv` is cancelled
/// mid-suspension.
struct WaiterGuard<'a, T> {
    mailbox: &'a Mailbox<T>,
}

impl<T> Drop for WaiterGuard<'_, T> {
    fn drop(&mut self) {
        self.mailbox.shared.lock().unwrap().recv_waiters -= 1;
    }
}
