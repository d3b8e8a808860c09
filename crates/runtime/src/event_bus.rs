use std::sync::Arc;

use compute::AnimationFrame;
use foundation::BalloonId;
use parking_lot::Mutex;
use serde::Serialize;

/// How a descent run ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnimationOutcome {
    Completed,
    #[serde(rename_all = "camelCase")]
    Cancelled { frames_delivered: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimationEnd {
    pub id: BalloonId,
    pub outcome: AnimationOutcome,
}

/// What a descent run tells the presentation layer.
///
/// Per run: zero or more `Frame`s in strictly increasing index order, then
/// exactly one `Ended`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum AnimationEvent {
    Frame { id: BalloonId, frame: AnimationFrame },
    Ended(AnimationEnd),
}

impl AnimationEvent {
    pub fn id(&self) -> &BalloonId {
        match self {
            AnimationEvent::Frame { id, .. } => id,
            AnimationEvent::Ended(end) => &end.id,
        }
    }
}

/// Receiver of animation events. Closures work out of the box.
pub trait AnimationSink: Send {
    fn emit(&mut self, event: AnimationEvent);
}

impl<F> AnimationSink for F
where
    F: FnMut(AnimationEvent) + Send,
{
    fn emit(&mut self, event: AnimationEvent) {
        self(event)
    }
}

/// Shared, cloneable event recorder.
///
/// Clones append to the same log, so one bus can observe several runs.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Arc<Mutex<Vec<AnimationEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnimationEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn drain(&self) -> Vec<AnimationEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl AnimationSink for EventBus {
    fn emit(&mut self, event: AnimationEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{AnimationEnd, AnimationEvent, AnimationOutcome, AnimationSink, EventBus};
    use foundation::BalloonId;

    fn ended(id: &str) -> AnimationEvent {
        AnimationEvent::Ended(AnimationEnd {
            id: BalloonId::from(id),
            outcome: AnimationOutcome::Completed,
        })
    }

    #[test]
    fn clones_share_one_log() {
        let bus = EventBus::new();
        let mut a = bus.clone();
        let mut b = bus.clone();
        a.emit(ended("a"));
        b.emit(ended("b"));
        let ids: Vec<String> = bus.events().iter().map(|e| e.id().to_string()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(ended("x"));
        assert_eq!(bus.drain().len(), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = 0;
        {
            let mut sink = |_e: AnimationEvent| seen += 1;
            sink.emit(ended("c"));
            sink.emit(ended("c"));
        }
        assert_eq!(seen, 2);
    }
}
