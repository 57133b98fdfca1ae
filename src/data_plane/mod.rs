//! Delivery layer: per-subscriber bounded mailboxes and the best-effort
//! dispatch engine that fans publications out to them.

pub(crate) mod dispatch;
pub(crate) mod mailbox;
