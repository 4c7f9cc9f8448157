//! Tower middleware layers applied around the forwarding handler.
//!
//! Correlation ID generation is handled inline in [`proxy::forward_handler`](crate::proxy::forward_handler).
//! Proxy header enrichment is in [`proxy::headers`](crate::proxy::headers).

pub mod cors;
