//! Per-publish-cycle tracking and summaries.
//!
//! An [`EventContext`] lives for exactly one stage publish: it records when
//! dispatch began and which listeners completed. The [`EventTracker`] turns a
//! finished context into a [`CycleSummary`], logs it, and keeps a bounded
//! history of recent summaries for inspection.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use eventflow_id::EventId;
use serde::{Serialize, Serializer};
use tracing::info;

use crate::config::PublisherConfig;
use crate::event::AnyEvent;
use crate::stage::EventStage;

/// Record of one publish cycle in progress.
#[derive(Debug)]
pub struct EventContext {
    event_id: EventId,
    event_name: &'static str,
    stage: EventStage,
    started_at: DateTime<Utc>,
    clock: Instant,
    processed: Vec<String>,
}

impl EventContext {
    pub fn new(event: &dyn AnyEvent) -> Self {
        Self {
            event_id: event.id(),
            event_name: event.name(),
            stage: event.stage(),
            started_at: Utc::now(),
            clock: Instant::now(),
            processed: Vec::new(),
        }
    }

    /// Notes that `listener` handled the event successfully.
    pub fn record(&mut self, listener: &str) {
        self.processed.push(listener.to_string());
    }

    pub fn processed(&self) -> &[String] {
        &self.processed
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }
}

/// Outcome of one stage publish.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub event_id: EventId,
    pub event_name: String,
    pub stage: EventStage,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    /// Listeners that completed, in dispatch order.
    pub listeners: Vec<String>,
}

impl CycleSummary {
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Outcome of an event's whole lifecycle, produced when it reaches `End`.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub event_id: EventId,
    pub event_name: String,
    /// Stages published, in order.
    pub stages: Vec<EventStage>,
    /// Successful listener calls across all stages.
    pub listener_invocations: usize,
    /// Time from the first publish to the end of the `End` publish.
    #[serde(rename = "total_ms", serialize_with = "as_millis")]
    pub total: Duration,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(saturating_millis(*duration))
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Opens and closes publish cycles and keeps recent summaries.
#[derive(Debug)]
pub struct EventTracker {
    capacity: usize,
    log_cycles: bool,
    cycles: Mutex<VecDeque<CycleSummary>>,
    events: Mutex<VecDeque<EventSummary>>,
}

impl EventTracker {
    pub fn new(config: &PublisherConfig) -> Self {
        Self {
            capacity: config.summary_history,
            log_cycles: config.log_cycles,
            cycles: Mutex::new(VecDeque::new()),
            events: Mutex::new(VecDeque::new()),
        }
    }

    pub fn start(&self, event: &dyn AnyEvent) -> EventContext {
        EventContext::new(event)
    }

    /// Closes a cycle and returns its summary.
    pub fn complete(&self, context: EventContext) -> CycleSummary {
        let summary = CycleSummary {
            event_id: context.event_id,
            event_name: context.event_name.to_string(),
            stage: context.stage,
            started_at: context.started_at,
            duration: context.elapsed(),
            listeners: context.processed,
        };

        if self.log_cycles {
            info!(
                event = %summary.event_name,
                event_id = %summary.event_id,
                stage = %summary.stage,
                duration_ms = saturating_millis(summary.duration),
                listener_count = summary.listener_count(),
                listeners = %summary.listeners.join(", "),
                "Event summary"
            );
        }

        push_bounded(&self.cycles, summary.clone(), self.capacity);
        summary
    }

    /// Records an event that reached `End`.
    pub fn record_completion(&self, summary: EventSummary) {
        info!(
            event = %summary.event_name,
            event_id = %summary.event_id,
            duration_ms = saturating_millis(summary.total),
            stages = summary.stages.len(),
            listener_invocations = summary.listener_invocations,
            "Event completed"
        );
        push_bounded(&self.events, summary, self.capacity);
    }

    /// Most recent cycle summaries, oldest first.
    pub fn recent(&self) -> Vec<CycleSummary> {
        lock(&self.cycles).iter().cloned().collect()
    }

    /// Most recent completed events, oldest first.
    pub fn completed(&self) -> Vec<EventSummary> {
        lock(&self.events).iter().cloned().collect()
    }

    /// Cycle summaries for one event, oldest first.
    pub fn cycles_for(&self, event_id: EventId) -> Vec<CycleSummary> {
        lock(&self.cycles)
            .iter()
            .filter(|s| s.event_id == event_id)
            .cloned()
            .collect()
    }
}

impl Default for EventTracker {
    fn default() -> Self {
        Self::new(&PublisherConfig::default())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn push_bounded<T>(queue: &Mutex<VecDeque<T>>, item: T, capacity: usize) {
    if capacity == 0 {
        return;
    }
    let mut queue = lock(queue);
    while queue.len() >= capacity {
        queue.pop_front();
    }
    queue.push_back(item);
}
