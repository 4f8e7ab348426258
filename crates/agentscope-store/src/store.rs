use agentscope_protocol::{
    AgentId, CanonicalEvent, EventSink, EventType, Mode, RunId, TaskDonePayload, TaskId,
    TaskSpawnPayload, TaskState,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use crate::records::{AgentRecord, Metrics, StoreSnapshot, TaskRecord};
use crate::ring::RingBuffer;

pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of events kept in the ring buffer. Zero falls back to
    /// [`DEFAULT_CAPACITY`].
    pub capacity: usize,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct StoreState {
    events: RingBuffer<CanonicalEvent>,
    agents: IndexMap<AgentId, AgentRecord>,
    tasks: IndexMap<TaskId, TaskRecord>,
    metrics: Metrics,
    run_id: Option<RunId>,
    mode: Option<Mode>,
    warning_count: u64,
}

impl StoreState {
    fn apply(&mut self, event: CanonicalEvent) {
        if !event.run_id.is_empty() {
            self.run_id = Some(event.run_id.clone());
        }
        if let Some(mode) = event.mode {
            self.mode = Some(mode);
        }

        self.update_agent(&event);
        self.update_task(&event);
        self.metrics.record(event.is_error(), event.metrics.as_ref());

        // Buffered last so the event moves in without a clone.
        self.events.push(event);
    }

    fn update_agent(&mut self, event: &CanonicalEvent) {
        match self.agents.get_mut(&event.agent_id) {
            Some(agent) => {
                if !agent.state.can_transition_to(event.state) {
                    self.warning_count += 1;
                    warn!(
                        agent_id = %event.agent_id,
                        from = %agent.state,
                        to = %event.state,
                        "invalid agent state transition"
                    );
                }
                agent.state = event.state;
                agent.role = event.role;
                agent.last_seen = event.ts;
            }
            None => {
                self.agents.insert(
                    event.agent_id.clone(),
                    AgentRecord {
                        agent_id: event.agent_id.clone(),
                        role: event.role,
                        state: event.state,
                        last_seen: event.ts,
                    },
                );
            }
        }
    }

    fn update_task(&mut self, event: &CanonicalEvent) {
        let Some(task_id) = &event.task_id else {
            return;
        };

        match event.event_type {
            EventType::TaskSpawn => match event.payload_as::<TaskSpawnPayload>() {
                Ok(payload) => {
                    self.tasks.insert(
                        task_id.clone(),
                        TaskRecord {
                            task_id: task_id.clone(),
                            agent_id: event.agent_id.clone(),
                            state: TaskState::Active,
                            title: payload.title,
                            created: event.ts,
                            updated: event.ts,
                        },
                    );
                }
                Err(error) => {
                    debug!(%task_id, %error, "unreadable task_spawn payload, task not recorded");
                }
            },
            EventType::TaskDone => {
                let Some(task) = self.tasks.get_mut(task_id) else {
                    return;
                };
                match event.payload_as::<TaskDonePayload>() {
                    Ok(payload) => {
                        let next = TaskState::from_done_result(&payload.result);
                        if !task.state.can_transition_to(next) {
                            warn!(
                                %task_id,
                                from = %task.state,
                                to = %next,
                                "unexpected task lifecycle transition"
                            );
                        }
                        task.state = next;
                        task.updated = event.ts;
                    }
                    Err(error) => {
                        debug!(%task_id, %error, "unreadable task_done payload, task unchanged");
                    }
                }
            }
            EventType::TaskUpdate => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.updated = event.ts;
                }
            }
            _ => {}
        }
    }
}

/// In-memory store of canonical events and the state derived from them.
///
/// One `RwLock` guards everything: `add_event` takes it exclusively, every
/// query takes it shared. Queries never fail and always return owned copies.
#[derive(Debug)]
pub struct EventStore {
    state: RwLock<StoreState>,
}

impl EventStore {
    pub fn new(config: StoreConfig) -> Self {
        let capacity = if config.capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            config.capacity
        };
        Self {
            state: RwLock::new(StoreState {
                events: RingBuffer::new(capacity),
                agents: IndexMap::new(),
                tasks: IndexMap::new(),
                metrics: Metrics::default(),
                run_id: None,
                mode: None,
                warning_count: 0,
            }),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(StoreConfig::new().capacity(capacity))
    }

    #[instrument(
        level = "debug",
        skip(self, event),
        fields(agent_id = %event.agent_id, event_type = %event.event_type)
    )]
    pub fn add_event(&self, event: CanonicalEvent) {
        self.state.write().apply(event);
    }

    /// The newest `min(limit, count)` events, oldest first. `0` means all.
    pub fn events(&self, limit: usize) -> Vec<CanonicalEvent> {
        self.state.read().events.latest(limit).cloned().collect()
    }

    pub fn agent(&self, agent_id: &str) -> Option<AgentRecord> {
        self.state.read().agents.get(agent_id).cloned()
    }

    /// All agents in first-seen order.
    pub fn agents(&self) -> Vec<AgentRecord> {
        self.state.read().agents.values().cloned().collect()
    }

    pub fn task(&self, task_id: &str) -> Option<TaskRecord> {
        self.state.read().tasks.get(task_id).cloned()
    }

    /// All tasks in first-spawn order.
    pub fn tasks(&self) -> Vec<TaskRecord> {
        self.state.read().tasks.values().cloned().collect()
    }

    pub fn metrics(&self) -> Metrics {
        self.state.read().metrics
    }

    pub fn mode(&self) -> Option<Mode> {
        self.state.read().mode
    }

    pub fn run_id(&self) -> Option<RunId> {
        self.state.read().run_id.clone()
    }

    /// Number of agent transitions seen that the transition table disallows.
    pub fn warning_count(&self) -> u64 {
        self.state.read().warning_count
    }

    /// Events currently held, at most [`Self::capacity`].
    pub fn event_count(&self) -> usize {
        self.state.read().events.len()
    }

    pub fn capacity(&self) -> usize {
        self.state.read().events.capacity()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read();
        StoreSnapshot {
            run_id: state.run_id.clone(),
            mode: state.mode,
            agents: state.agents.values().cloned().collect(),
            tasks: state.tasks.values().cloned().collect(),
            metrics: state.metrics,
            warning_count: state.warning_count,
            event_count: state.events.len(),
            capacity: state.events.capacity(),
        }
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl EventSink for EventStore {
    fn add_event(&self, event: CanonicalEvent) {
        EventStore::add_event(self, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentscope_protocol::{AgentState, EventMetrics, Provider, Role};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 17, 22, 27, 0).unwrap()
    }

    fn event(agent: &str, state: AgentState, event_type: EventType) -> CanonicalEvent {
        CanonicalEvent::new(
            t0(),
            "run-1",
            Provider::Claude,
            agent,
            Role::Executor,
            state,
            event_type,
        )
    }

    fn tagged(tag: u32) -> CanonicalEvent {
        let mut e = event("a1", AgentState::Running, EventType::Message);
        e.ts = t0() + Duration::seconds(i64::from(tag));
        e.with_intent_ref(tag.to_string())
    }

    fn tags(events: &[CanonicalEvent]) -> Vec<String> {
        events
            .iter()
            .map(|e| e.intent_ref.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn zero_capacity_uses_default() {
        assert_eq!(EventStore::with_capacity(0).capacity(), DEFAULT_CAPACITY);
        assert_eq!(EventStore::default().capacity(), 10_000);
        assert_eq!(EventStore::with_capacity(100).capacity(), 100);
    }

    #[test]
    fn empty_store_queries_return_empty() {
        let store = EventStore::default();
        assert!(store.events(0).is_empty());
        assert!(store.events(10).is_empty());
        assert!(store.agents().is_empty());
        assert!(store.tasks().is_empty());
        assert!(store.agent("nobody").is_none());
        assert!(store.task("nothing").is_none());
        assert_eq!(store.metrics(), Metrics::default());
        assert_eq!(store.run_id(), None);
        assert_eq!(store.mode(), None);
        assert_eq!(store.warning_count(), 0);
        assert_eq!(store.event_count(), 0);
    }

    #[test]
    fn ring_buffer_keeps_newest_events_across_wraparound() {
        let store = EventStore::with_capacity(5);
        for tag in 0..10 {
            store.add_event(tagged(tag));
        }
        assert_eq!(store.event_count(), 5);
        assert_eq!(tags(&store.events(100)), vec!["5", "6", "7", "8", "9"]);
        assert_eq!(tags(&store.events(2)), vec!["8", "9"]);
        assert_eq!(tags(&store.events(0)).len(), 5);
        // Metrics count every event, not just the retained window.
        assert_eq!(store.metrics().event_count, 10);
    }

    #[test]
    fn event_count_is_min_of_inserts_and_capacity() {
        for inserted in [0u32, 1, 4, 7, 8, 9, 20] {
            let store = EventStore::with_capacity(8);
            for tag in 0..inserted {
                store.add_event(tagged(tag));
            }
            let expected = (inserted as usize).min(8);
            assert_eq!(store.event_count(), expected);
            let events = store.events(0);
            assert_eq!(events.len(), expected);
            let want: Vec<String> = (inserted - expected as u32..inserted)
                .map(|t| t.to_string())
                .collect();
            assert_eq!(tags(&events), want);
        }
    }

    #[test]
    fn first_event_creates_agent_without_warning() {
        let store = EventStore::default();
        store.add_event(event("a1", AgentState::Blocked, EventType::StateChange));
        let agent = store.agent("a1").unwrap();
        assert_eq!(agent.state, AgentState::Blocked);
        assert_eq!(agent.role, Role::Executor);
        assert_eq!(agent.last_seen, t0());
        assert_eq!(store.warning_count(), 0);
    }

    #[test]
    fn valid_transition_does_not_warn() {
        let store = EventStore::default();
        store.add_event(event("a1", AgentState::Idle, EventType::StateChange));
        store.add_event(event("a1", AgentState::Running, EventType::StateChange));
        assert_eq!(store.agent("a1").unwrap().state, AgentState::Running);
        assert_eq!(store.warning_count(), 0);
    }

    #[test]
    fn invalid_transition_applies_and_warns_once() {
        let store = EventStore::default();
        store.add_event(event("a1", AgentState::Idle, EventType::StateChange));
        store.add_event(event("a1", AgentState::Blocked, EventType::StateChange));
        assert_eq!(store.agent("a1").unwrap().state, AgentState::Blocked);
        assert_eq!(store.warning_count(), 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    #[test]
    fn invalid_transition_emits_warning() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let store = EventStore::default();
            store.add_event(event("a1", AgentState::Idle, EventType::StateChange));
            store.add_event(event("a1", AgentState::Running, EventType::StateChange));
            store.add_event(event("a1", AgentState::Idle, EventType::StateChange));
        });

        let output = logs.contents();
        assert_eq!(output.matches("invalid agent state transition").count(), 1);
        assert!(output.contains("WARN"));
        assert!(output.contains("agent_id=a1"));
        assert!(output.contains("from=running"));
        assert!(output.contains("to=idle"));
    }

    #[test]
    fn every_transition_pair_follows_the_table() {
        for from in AgentState::ALL {
            for to in AgentState::ALL {
                let store = EventStore::default();
                store.add_event(event("a1", from, EventType::StateChange));
                store.add_event(event("a1", to, EventType::StateChange));

                assert_eq!(store.agent("a1").unwrap().state, to, "{from} -> {to}");
                let expected = u64::from(!from.can_transition_to(to));
                assert_eq!(store.warning_count(), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn agent_record_refreshes_role_and_last_seen() {
        let store = EventStore::default();
        store.add_event(event("a1", AgentState::Idle, EventType::Message));
        let mut later = event("a1", AgentState::Running, EventType::Message);
        later.ts = t0() + Duration::seconds(30);
        later.role = Role::Debugger;
        store.add_event(later);

        let agent = store.agent("a1").unwrap();
        assert_eq!(agent.role, Role::Debugger);
        assert_eq!(agent.last_seen, t0() + Duration::seconds(30));
    }

    #[test]
    fn agents_listed_in_first_seen_order() {
        let store = EventStore::default();
        for id in ["planner", "executor", "reviewer", "executor", "planner"] {
            store.add_event(event(id, AgentState::Running, EventType::Message));
        }
        let ids: Vec<_> = store
            .agents()
            .into_iter()
            .map(|a| a.agent_id.to_string())
            .collect();
        assert_eq!(ids, vec!["planner", "executor", "reviewer"]);
    }

    #[test]
    fn task_spawn_then_failure() {
        let store = EventStore::default();
        store.add_event(
            event("a1", AgentState::Running, EventType::TaskSpawn)
                .with_task("t1")
                .with_payload(json!({"title": "X"})),
        );
        let task = store.task("t1").unwrap();
        assert_eq!(task.state, TaskState::Active);
        assert_eq!(task.title, "X");
        assert_eq!(task.agent_id.as_str(), "a1");

        let mut done = event("a1", AgentState::Running, EventType::TaskDone)
            .with_task("t1")
            .with_payload(json!({"result": "failure"}));
        done.ts = t0() + Duration::seconds(5);
        store.add_event(done);

        let task = store.task("t1").unwrap();
        assert_eq!(task.state, TaskState::Failed);
        assert_eq!(task.created, t0());
        assert_eq!(task.updated, t0() + Duration::seconds(5));
    }

    #[test]
    fn task_done_result_mapping() {
        for (result, expected) in [
            ("success", TaskState::Done),
            ("failure", TaskState::Failed),
            ("cancelled", TaskState::Cancelled),
            ("whatever", TaskState::Done),
        ] {
            let store = EventStore::default();
            store.add_event(
                event("a1", AgentState::Running, EventType::TaskSpawn)
                    .with_task("t1")
                    .with_payload(json!({"title": "T"})),
            );
            store.add_event(
                event("a1", AgentState::Running, EventType::TaskDone)
                    .with_task("t1")
                    .with_payload(json!({ "result": result })),
            );
            assert_eq!(store.task("t1").unwrap().state, expected, "{result}");
        }
    }

    #[test]
    fn task_done_for_unknown_task_is_noop() {
        let store = EventStore::default();
        store.add_event(
            event("a1", AgentState::Running, EventType::TaskDone)
                .with_task("ghost")
                .with_payload(json!({"result": "success"})),
        );
        assert!(store.task("ghost").is_none());
        assert!(store.tasks().is_empty());
        // The event itself is still stored and counted.
        assert_eq!(store.event_count(), 1);
    }

    #[test]
    fn task_update_only_refreshes_timestamp() {
        let store = EventStore::default();
        store.add_event(
            event("a1", AgentState::Running, EventType::TaskSpawn)
                .with_task("t1")
                .with_payload(json!({"title": "T"})),
        );
        let mut update = event("a2", AgentState::Running, EventType::TaskUpdate)
            .with_task("t1")
            .with_payload(json!({"progress": 50}));
        update.ts = t0() + Duration::seconds(3);
        store.add_event(update);

        let task = store.task("t1").unwrap();
        assert_eq!(task.state, TaskState::Active);
        assert_eq!(task.agent_id.as_str(), "a1");
        assert_eq!(task.updated, t0() + Duration::seconds(3));

        store.add_event(event("a1", AgentState::Running, EventType::TaskUpdate).with_task("t9"));
        assert!(store.task("t9").is_none());
    }

    #[test]
    fn task_spawn_with_unreadable_payload_is_skipped() {
        let store = EventStore::default();
        store.add_event(
            event("a1", AgentState::Running, EventType::TaskSpawn)
                .with_task("t1")
                .with_payload(json!("not an object")),
        );
        assert!(store.task("t1").is_none());
    }

    #[test]
    fn task_spawn_without_payload_has_empty_title() {
        let store = EventStore::default();
        store.add_event(event("a1", AgentState::Running, EventType::TaskSpawn).with_task("t1"));
        let task = store.task("t1").unwrap();
        assert_eq!(task.title, "");
        assert_eq!(task.state, TaskState::Active);
    }

    #[test]
    fn task_spawn_overwrites_existing_record() {
        let store = EventStore::default();
        for title in ["first", "second"] {
            store.add_event(
                event("a1", AgentState::Running, EventType::TaskSpawn)
                    .with_task("t1")
                    .with_payload(json!({ "title": title })),
            );
        }
        store.add_event(
            event("a1", AgentState::Running, EventType::TaskDone)
                .with_task("t1")
                .with_payload(json!({"result": "success"})),
        );
        store.add_event(
            event("a1", AgentState::Running, EventType::TaskSpawn)
                .with_task("t1")
                .with_payload(json!({"title": "third"})),
        );
        let task = store.task("t1").unwrap();
        assert_eq!(task.title, "third");
        assert_eq!(task.state, TaskState::Active);
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn task_events_without_task_id_are_ignored() {
        let store = EventStore::default();
        store.add_event(
            event("a1", AgentState::Running, EventType::TaskSpawn)
                .with_payload(json!({"title": "orphan"})),
        );
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn metrics_accumulate() {
        let store = EventStore::default();
        store.add_event(
            event("a1", AgentState::Running, EventType::ToolResult).with_metrics(EventMetrics {
                latency_ms: Some(120.0),
                tokens_in: Some(1_000),
                tokens_out: Some(200),
                cost_usd: Some(0.5),
            }),
        );
        store.add_event(event("a1", AgentState::Error, EventType::Error));
        store.add_event(
            event("a1", AgentState::Running, EventType::Message).with_metrics(EventMetrics {
                tokens_in: Some(10),
                ..EventMetrics::default()
            }),
        );

        let metrics = store.metrics();
        assert_eq!(metrics.event_count, 3);
        assert_eq!(metrics.error_count, 1);
        assert_eq!(metrics.total_latency_ms, 120.0);
        assert_eq!(metrics.total_tokens_in, 1_010);
        assert_eq!(metrics.total_tokens_out, 200);
        assert_eq!(metrics.total_cost_usd, 0.5);
    }

    #[test]
    fn run_id_and_mode_track_latest_reported() {
        let store = EventStore::default();
        store.add_event(event("a1", AgentState::Idle, EventType::Message).with_mode(Mode::Team));
        assert_eq!(store.mode(), Some(Mode::Team));
        assert_eq!(store.run_id().unwrap().as_str(), "run-1");

        let mut next = event("a1", AgentState::Running, EventType::Message);
        next.run_id = RunId::from("run-2");
        store.add_event(next);
        // An event without a mode leaves the last known mode in place.
        assert_eq!(store.mode(), Some(Mode::Team));
        assert_eq!(store.run_id().unwrap().as_str(), "run-2");
    }

    #[test]
    fn snapshot_is_consistent() {
        let store = EventStore::with_capacity(2);
        store.add_event(event("a1", AgentState::Idle, EventType::Message).with_mode(Mode::Ralph));
        store.add_event(event("a1", AgentState::Failed, EventType::StateChange));
        store.add_event(
            event("a2", AgentState::Running, EventType::TaskSpawn)
                .with_task("t1")
                .with_payload(json!({"title": "snap"})),
        );

        let snapshot = store.snapshot();
        assert_eq!(snapshot.mode, Some(Mode::Ralph));
        assert_eq!(snapshot.agents.len(), 2);
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.metrics.event_count, 3);
        assert_eq!(snapshot.warning_count, 1);
        assert_eq!(snapshot.event_count, 2);
        assert_eq!(snapshot.capacity, 2);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["tasks"][0]["state"], "active");
    }

    #[test]
    fn store_is_an_event_sink() {
        let store = Arc::new(EventStore::default());
        let sink: Arc<dyn EventSink> = store.clone();
        sink.add_event(event("a1", AgentState::Idle, EventType::Message));
        assert_eq!(store.event_count(), 1);
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let store = Arc::new(EventStore::with_capacity(64));
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..250 {
                        let agent = format!("agent-{w}");
                        let mut e = event(&agent, AgentState::Running, EventType::Message);
                        e.ts = t0() + Duration::milliseconds(i);
                        store.add_event(e);
                    }
                })
            })
            .collect();
        let readers: Vec<_> = (0..2)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let events = store.events(0);
                        assert!(events.len() <= 64);
                        assert!(store.event_count() <= 64);
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }

        assert_eq!(store.metrics().event_count, 1_000);
        assert_eq!(store.event_count(), 64);
        assert_eq!(store.agents().len(), 4);
        // running -> running is not in the table: every event after each
        // agent's first one warns.
        assert_eq!(store.warning_count(), 996);
    }
}
