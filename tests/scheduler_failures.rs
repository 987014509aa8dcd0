use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fetchdag::dag::{Controller, Task, TaskOutput};
use fetchdag::state::Payload;
use fetchdag::tasks::FetchContext;

/// Stub whose payload is configurable, so a "failed" remote task (degraded,
/// `Absent` payload) can sit next to healthy ones.
struct StubTask {
    name: String,
    deps: Vec<String>,
    payload: Payload,
    seen: Arc<Mutex<HashMap<String, Vec<Payload>>>>,
}

impl StubTask {
    fn new(
        name: &str,
        deps: &[&str],
        payload: Payload,
        seen: &Arc<Mutex<HashMap<String, Vec<Payload>>>>,
    ) -> Arc<dyn Task> {
        Arc::new(Self {
            name: name.to_string(),
            deps: deps.iter().map(|s| s.to_string()).collect(),
            payload,
            seen: Arc::clone(seen),
        })
    }
}

#[async_trait]
impl Task for StubTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        self.deps.clone()
    }

    async fn run(&self, _ctx: &FetchContext, deps: Vec<Payload>) -> TaskOutput {
        self.seen.lock().unwrap().insert(self.name.clone(), deps);
        TaskOutput::new(self.payload.clone(), vec![])
    }
}

fn prices(name: &str) -> Payload {
    let mut map = HashMap::new();
    map.insert(name.to_string(), 1.0);
    Payload::Prices(map)
}

fn seen_map() -> Arc<Mutex<HashMap<String, Vec<Payload>>>> {
    Arc::new(Mutex::new(HashMap::new()))
}

#[tokio::test]
async fn cycle_fails_fast_instead_of_hanging() {
    let seen = seen_map();
    let tasks: Vec<Arc<dyn Task>> = vec![
        StubTask::new("a", &["b"], Payload::Absent, &seen),
        StubTask::new("b", &["a"], Payload::Absent, &seen),
    ];

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        Controller::new(tasks).run(Arc::new(FetchContext::empty())),
    )
    .await
    .expect("scheduler hung on a cyclic task set");

    let err = result.unwrap_err();
    assert!(err.to_string().contains("cycle"), "unexpected error: {err}");
    // Nothing ran.
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dangling_dependency_fails_fast() {
    let seen = seen_map();
    let tasks: Vec<Arc<dyn Task>> = vec![
        StubTask::new("a", &[], Payload::Absent, &seen),
        StubTask::new("b", &["does-not-exist"], Payload::Absent, &seen),
    ];

    let err = Controller::new(tasks)
        .run(Arc::new(FetchContext::empty()))
        .await
        .unwrap_err();

    assert!(
        err.to_string().contains("unknown dependency"),
        "unexpected error: {err}"
    );
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_task_names_are_rejected() {
    let seen = seen_map();
    let tasks: Vec<Arc<dyn Task>> = vec![
        StubTask::new("a", &[], Payload::Absent, &seen),
        StubTask::new("a", &[], Payload::Absent, &seen),
    ];

    let err = Controller::new(tasks)
        .run(Arc::new(FetchContext::empty()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("duplicate"), "unexpected error: {err}");
}

#[tokio::test]
async fn failed_dependency_does_not_block_dependents() {
    let seen = seen_map();

    // A "failed" (degraded to Absent), B succeeded; C depends on both.
    let tasks: Vec<Arc<dyn Task>> = vec![
        StubTask::new("a", &[], Payload::Absent, &seen),
        StubTask::new("b", &[], prices("b"), &seen),
        StubTask::new("c", &["a", "b"], prices("c"), &seen),
    ];

    let (state, _) = Controller::new(tasks)
        .run(Arc::new(FetchContext::empty()))
        .await
        .unwrap();

    // C ran and observed A's explicit Absent next to B's real payload.
    let seen = seen.lock().unwrap();
    let deps = seen.get("c").expect("c never ran");
    assert!(deps[0].is_absent());
    assert!(deps[1].as_prices().unwrap().contains_key("b"));

    // All three are in the store, the degraded one included.
    assert!(state.get("a").unwrap().is_absent());
    assert!(state.get("b").is_some());
    assert!(state.get("c").is_some());
}
