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

use bytes::Bytes;

use crate::topic::Topic;

/// A routed unit of data: an addressed, opaque payload with optional
/// request/reply correlation.
///
/// Payloads are [`Bytes`], so cloning a message for fanout shares the
/// underlying buffer instead of copying it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub topic: Topic,
    pub payload: Bytes,
    /// Reply address for request/reply interactions, if the sender expects
    /// an answer.
    pub reply_to: Option<Topic>,
    /// Opaque correlation value chosen by the sender.
    pub id: Option<String>,
}

impl Message {
    pub fn new(topic: impl Into<Topic>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            reply_to: None,
            id: None,
        }
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<Topic>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Borrows the payload as UTF-8 text when it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::Message;
    use crate::topic::Topic;

    #[test]
    fn builder_style_accessors_round_trip() {
        let message = Message::new(["a", "b"], "payload")
            .with_reply_to(["reply"])
            .with_id("req-1");

        assert_eq!(message.topic, Topic::from(["a", "b"]));
        assert_eq!(message.payload_str(), Some("payload"));
        assert_eq!(message.reply_to, Some(Topic::from(["reply"])));
        assert_eq!(message.id.as_deref(), Some("req-1"));
    }

    #[test]
    fn payload_str_is_none_for_invalid_utf8() {
        let message = Message::new(["raw"], vec![0xffu8, 0xfe]);

        assert!(message.payload_str().is_none());
    }
}
