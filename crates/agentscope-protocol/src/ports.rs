//! Ingestion port.
//!
//! Live feeds and the replay driver push canonical events through this trait
//! without knowing which store sits behind it.

use crate::event::CanonicalEvent;
use std::sync::Arc;

/// Push-style consumer of canonical events.
///
/// Ingestion never fails: events reaching a sink have already been validated,
/// and semantic irregularities are the sink's to record, not to reject.
pub trait EventSink: Send + Sync {
    fn add_event(&self, event: CanonicalEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn add_event(&self, event: CanonicalEvent) {
        (**self).add_event(event);
    }
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn add_event(&self, event: CanonicalEvent) {
        (**self).add_event(event);
    }
}
