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

use std::sync::Arc;
use std::time::Duration;

use support::recv_soon;
use topic_bus::{Bus, BusError, CloseReason, DeliverError};

#[tokio::test]
async fn operations_fail_after_disconnect() {
    let bus = Bus::new();
    let connection = bus.connect();

    connection.disconnect();

    assert!(connection.is_disconnected());
    assert_eq!(
        connection.publish(["t"], "x"),
        Err(BusError::Disconnected)
    );
    assert_eq!(connection.retain(["t"], "x"), Err(BusError::Disconnected));
    assert_eq!(connection.unretain(["t"]), Err(BusError::Disconnected));
    assert!(matches!(
        connection.subscribe(["t"]),
        Err(BusError::Disconnected)
    ));
    assert!(matches!(connection.bind(["t"]), Err(BusError::Disconnected)));
    assert_eq!(
        connection.publish_one(["t"], "x"),
        Err(DeliverError::Bus(BusError::Disconnected))
    );
    assert!(matches!(
        connection.request_sub(["t"], "x"),
        Err(BusError::Disconnected)
    ));
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let bus = Bus::new();
    let connection = bus.connect();
    let _subscription = connection.subscribe(["t"]).expect("subscribe");

    connection.disconnect();
    connection.disconnect();

    assert!(connection.is_disconnected());
    assert_eq!(bus.subscription_count(), 0);
}

#[tokio::test]
async fn disconnect_closes_owned_subscriptions_and_endpoints() {
    let bus = Bus::new();
    let connection = bus.connect();
    let subscription = connection.subscribe(["s"]).expect("subscribe");
    let endpoint = connection.bind(["e"]).expect("bind");

    // Buffered messages survive the close and drain first.
    connection.publish(["s"], "buffered").expect("publish");
    connection.disconnect();

    let message = recv_soon(subscription.recv(), "buffered before disconnect").await;
    assert_eq!(message.payload_str(), Some("buffered"));
    assert_eq!(
        subscription.recv().await,
        Err(CloseReason::Disconnected)
    );
    assert_eq!(endpoint.recv().await, Err(CloseReason::Disconnected));
    assert_eq!(bus.subscription_count(), 0);
    assert_eq!(bus.endpoint_count(), 0);
}

#[tokio::test]
async fn unsubscribe_wakes_a_pending_receiver() {
    let bus = Bus::new();
    let connection = bus.connect();
    let subscription = Arc::new(connection.subscribe(["quiet"]).expect("subscribe"));

    let receiver = {
        let subscription = subscription.clone();
        tokio::spawn(async move { subscription.recv().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    subscription.unsubscribe();

    let outcome = tokio::time::timeout(Duration::from_millis(200), receiver)
        .await
        .expect("receiver must wake promptly")
        .expect("receiver task must not panic");
    assert_eq!(outcome, Err(CloseReason::Unsubscribed));
}

#[tokio::test]
async fn no_delivery_after_unsubscribe() {
    let bus = Bus::new();
    let connection = bus.connect();
    let subscription = connection.subscribe(["gone"]).expect("subscribe");

    subscription.unsubscribe();
    connection.publish(["gone"], "late").expect("publish");

    assert_eq!(subscription.recv().await, Err(CloseReason::Unsubscribed));
    assert_eq!(subscription.dropped(), 0);
    assert_eq!(subscription.close_reason(), Some(CloseReason::Unsubscribed));
}

#[tokio::test]
async fn unsubscribe_is_idempotent_and_sticky() {
    let bus = Bus::new();
    let connection = bus.connect();
    let subscription = connection.subscribe(["t"]).expect("subscribe");

    subscription.unsubscribe();
    subscription.unsubscribe();
    connection.disconnect();

    // The first close reason never changes.
    assert_eq!(subscription.close_reason(), Some(CloseReason::Unsubscribed));
}

#[tokio::test]
async fn dropping_handles_releases_bus_state() {
    let bus = Bus::new();
    let connection = bus.connect();

    {
        let _subscription = connection.subscribe(["scoped", "+"]).expect("subscribe");
        let _endpoint = connection.bind(["scoped", "ep"]).expect("bind");
        assert_eq!(bus.subscription_count(), 1);
        assert_eq!(bus.endpoint_count(), 1);
    }

    assert_eq!(bus.subscription_count(), 0);
    assert_eq!(bus.endpoint_count(), 0);

    // The pattern and topic are free again.
    let _subscription = connection.subscribe(["scoped", "+"]).expect("re-subscribe");
    let _endpoint = connection.bind(["scoped", "ep"]).expect("re-bind");
}

#[tokio::test]
async fn dropping_the_connection_disconnects_it() {
    let bus = Bus::new();
    let subscription = {
        let connection = bus.connect_named("ephemeral");
        connection.subscribe(["auto", "cleanup"]).expect("subscribe")
    };

    // The connection guard is gone; its subscription was closed with it.
    assert_eq!(subscription.recv().await, Err(CloseReason::Disconnected));
    assert_eq!(bus.subscription_count(), 0);
}

#[tokio::test]
async fn subscriptions_on_other_connections_are_unaffected_by_disconnect() {
    let bus = Bus::new();
    let doomed = bus.connect();
    let _doomed_sub = doomed.subscribe(["shared"]).expect("subscribe");

    let survivor_conn = bus.connect();
    let survivor = survivor_conn.subscribe(["shared"]).expect("subscribe");

    doomed.disconnect();
    survivor_conn.publish(["shared"], "still here").expect("publish");

    let message = recv_soon(survivor.recv(), "surviving subscription").await;
    assert_eq!(message.payload_str(), Some("still here"));
    assert_eq!(bus.subscription_count(), 1);
}
