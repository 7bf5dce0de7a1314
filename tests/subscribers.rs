use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tasklane::{AbortSignal, Event, EventKind, Subscribe, Task, TaskError};

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(EventKind, Option<u64>)>>,
}

impl Recorder {
    fn kinds_for(&self, instance: u64) -> Vec<EventKind> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, id)| *id == Some(instance))
            .map(|(kind, _)| *kind)
            .collect()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.seen.lock().unwrap().push((ev.kind, ev.instance));
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

struct Boom;

#[async_trait]
impl Subscribe for Boom {
    async fn on_event(&self, ev: &Event) {
        if ev.kind == EventKind::InstanceSucceeded {
            panic!("boom on success");
        }
    }

    fn name(&self) -> &'static str {
        "boom"
    }
}

fn echo(subs: Vec<Arc<dyn Subscribe>>) -> Task<u32, u32> {
    Task::builder("echo", |_s: AbortSignal, n: u32| async move { Ok::<_, TaskError>(n) })
        .with_subscribers(subs)
        .build()
}

#[tokio::test]
async fn subscriber_sees_lifecycle_in_order() {
    let rec = Arc::new(Recorder::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![rec.clone()];
    let task = echo(subs);

    let inst = task.perform(7);
    assert_eq!(inst.settled().await, Ok(7));
    task.shutdown().await;

    assert_eq!(
        rec.kinds_for(inst.id()),
        vec![
            EventKind::InstancePerformed,
            EventKind::InstanceStarted,
            EventKind::InstanceSucceeded,
        ]
    );
}

#[tokio::test]
async fn panicking_subscriber_is_isolated() {
    let rec = Arc::new(Recorder::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Boom), rec.clone()];
    let task = echo(subs);
    let mut rx = task.events();

    let inst = task.perform(1);
    inst.settled().await.ok();
    task.shutdown().await;

    assert!(rec.kinds_for(inst.id()).contains(&EventKind::InstanceSucceeded));

    let mut panicked = None;
    while let Ok(ev) = rx.try_recv() {
        if ev.kind == EventKind::SubscriberPanicked {
            panicked = Some(ev);
        }
    }
    let ev = panicked.expect("panic event published");
    assert_eq!(ev.task.as_deref(), Some("boom"));
    assert!(ev.reason.as_deref().unwrap_or_default().contains("boom on success"));
}

#[tokio::test]
async fn events_carry_policy_and_errors() {
    let task = Task::builder("save", |_s: AbortSignal, fail: bool| async move {
        if fail {
            return Err(TaskError::fail("disk full"));
        }
        Ok(())
    })
    .dropping()
    .build();
    let mut rx = task.events();

    let first = task.perform(true);
    let second = task.perform(false);
    assert!(second.is_dropped());
    first.settled().await.ok();

    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));

    let performed = events
        .iter()
        .find(|e| e.kind == EventKind::InstancePerformed)
        .expect("performed event");
    assert_eq!(performed.reason.as_deref(), Some("drop"));
    assert_eq!(performed.task.as_deref(), Some("save"));

    assert!(events
        .iter()
        .any(|e| e.kind == EventKind::InstanceDropped && e.instance == Some(second.id())));
    let failed = events
        .iter()
        .find(|e| e.kind == EventKind::InstanceFailed)
        .expect("failed event");
    assert!(failed.reason.as_deref().unwrap_or_default().contains("disk full"));
}

#[tokio::test]
async fn shutdown_without_subscribers_is_fine() {
    let task = echo(Vec::new());
    task.perform(3).settled().await.ok();
    task.shutdown().await;
    assert!(task.perform(4).is_dropped());
    assert_eq!(task.perform_count(), 2);
}
