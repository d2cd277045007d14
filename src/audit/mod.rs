//! Structured operator-facing events.
//!
//! Findings, breaker pauses and run totals are emitted through `tracing`
//! on the `reflex::audit` target so any subscriber (plain text, JSON) can
//! capture them separately from debug chatter.

mod events;

pub use events::{
    emit_breaker_paused, emit_breaker_resumed, emit_finding, emit_scan_completed,
    emit_scan_started, AuditEvent, FindingAuditEvent,
};
