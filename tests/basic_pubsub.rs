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

mod support;

use support::{assert_silent, recv_soon};
use topic_bus::{Bus, Topic};

#[tokio::test]
async fn simple_topic_publish_reaches_subscriber() {
    support::init_tracing();
    let bus = Bus::new();
    let connection = bus.connect();
    let subscription = connection
        .subscribe(["simple", "topic"])
        .expect("subscribe should succeed");

    connection
        .publish(["simple", "topic"], "Hello")
        .expect("publish should succeed");

    let message = recv_soon(subscription.recv(), "simple topic delivery").await;
    assert_eq!(message.payload_str(), Some("Hello"));
    assert_eq!(message.topic, Topic::from(["simple", "topic"]));
    assert!(message.reply_to.is_none());
}

#[tokio::test]
async fn mailbox_preserves_publish_order() {
    let bus = Bus::new();
    let connection = bus.connect();
    let subscription = connection.subscribe(["seq"]).expect("subscribe");

    for i in 0..5 {
        connection
            .publish(["seq"], format!("m{i}"))
            .expect("publish");
    }

    for i in 0..5 {
        let message = recv_soon(subscription.recv(), "ordered delivery").await;
        assert_eq!(message.payload_str(), Some(format!("m{i}").as_str()));
    }
}

#[tokio::test]
async fn unrelated_topics_are_not_delivered() {
    let bus = Bus::new();
    let connection = bus.connect();
    let subscription = connection.subscribe(["only", "this"]).expect("subscribe");

    connection.publish(["only", "that"], "x").expect("publish");
    connection.publish(["only"], "y").expect("publish");
    connection
        .publish(["only", "this", "deeper"], "z")
        .expect("publish");

    assert_silent(subscription.recv(), "no matching publication").await;
}

#[tokio::test]
async fn empty_topic_addresses_the_root() {
    let bus = Bus::new();
    let connection = bus.connect();
    let subscription = connection.subscribe(Topic::root()).expect("subscribe");

    connection.publish(Topic::root(), "root").expect("publish");

    let message = recv_soon(subscription.recv(), "root delivery").await;
    assert_eq!(message.payload_str(), Some("root"));
}

#[test]
fn publish_is_usable_from_synchronous_code() {
    // Publishing is a plain function call: no runtime, no suspension point.
    let bus = Bus::new();
    let connection = bus.connect();

    connection.publish(["fire", "and", "forget"], "x").expect("publish");
    connection.retain(["last", "value"], "y").expect("retain");
}

#[tokio::test]
async fn every_matching_subscriber_receives_its_own_copy() {
    let bus = Bus::new();
    let connection = bus.connect();
    let first = connection.subscribe(["shared"]).expect("subscribe");
    let second = connection.subscribe(["shared"]).expect("subscribe");

    connection.publish(["shared"], "fanout").expect("publish");

    assert_eq!(
        recv_soon(first.recv(), "first subscriber").await.payload_str(),
        Some("fanout")
    );
    assert_eq!(
        recv_soon(second.recv(), "second subscriber").await.payload_str(),
        Some("fanout")
    );
}
