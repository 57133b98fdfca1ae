//! Canonical structured event names used across the bus.

// Fanout dispatch events.
pub(crate) const DISPATCH_DELIVER: &str = "dispatch_deliver";
pub(crate) const DISPATCH_DROP_OLDEST: &str = "dispatch_drop_oldest";
pub(crate) const DISPATCH_REJECT_NEWEST: &str = "dispatch_reject_newest";
pub(crate) const DISPATCH_SKIP_CLOSED: &str = "dispatch_skip_closed";

// Retained store events.
pub(crate) const RETAIN_SET: &str = "retain_set";
pub(crate) const RETAIN_CLEAR: &str = "retain_clear";
pub(crate) const RETAIN_REPLAY: &str = "retain_replay";
pub(crate) const RETAIN_REPLAY_DROP: &str = "retain_replay_drop";

// Subscription lifecycle events.
pub(crate) const SUBSCRIBE_OK: &str = "subscribe_ok";
pub(crate) const UNSUBSCRIBE_OK: &str = "unsubscribe_ok";

// Point-to-point lane events.
pub(crate) const ENDPOINT_BIND_OK: &str = "endpoint_bind_ok";
pub(crate) const ENDPOINT_BIND_CONFLICT: &str = "endpoint_bind_conflict";
pub(crate) const ENDPOINT_UNBIND: &str = "endpoint_unbind";
pub(crate) const PUBLISH_ONE_OK: &str = "publish_one_ok";
pub(crate) const PUBLISH_ONE_NO_ROUTE: &str = "publish_one_no_route";
pub(crate) const PUBLISH_ONE_FULL: &str = "publish_one_full";
pub(crate) const PUBLISH_ONE_CLOSED: &str = "publish_one_closed";

// Connection lifecycle and request/reply events.
pub(crate) const CONNECT: &str = "connect";
pub(crate) const DISCONNECT: &str = "disconnect";
pub(crate) const CALL_ADMIT_RETRY: &str = "call_admit_retry";
pub(crate) const CALL_TIMEOUT: &str = "call_timeout";
