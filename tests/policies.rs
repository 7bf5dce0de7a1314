use std::sync::{Arc, Mutex};
use std::time::Duration;

use tasklane::views::{computed_first_of, computed_last_of, computed_length, filtered_instances};
use tasklane::{
    AbortSignal, ConcurrencyPolicy, Deferred, InstanceFlag, InstanceStatus, Task, TaskError, defer,
};

type Gate = Deferred<(), ()>;

/// Instances block until their gate is resolved and honor cancellation.
fn gated(policy: ConcurrencyPolicy) -> Task<(u32, Gate), u32> {
    Task::builder("gated", |signal: AbortSignal, (n, gate): (u32, Gate)| async move {
        signal
            .guard(gate.promise().settled())
            .await?
            .map_err(|_| TaskError::fail("gate rejected"))?;
        Ok(n)
    })
    .with_policy(policy)
    .build()
}

fn gates(n: usize) -> Vec<Gate> {
    (0..n).map(|_| defer()).collect()
}

#[tokio::test]
async fn restartable_search_only_keeps_latest_query() {
    let search = Task::builder("search", |signal: AbortSignal, q: &'static str| async move {
        signal.guard(tokio::time::sleep(Duration::from_millis(20))).await?;
        Ok::<_, TaskError>(q.len())
    })
    .restartable()
    .build();

    let typed: Vec<_> = ["r", "ru", "rus", "rust"]
        .into_iter()
        .map(|q| search.perform(q))
        .collect();

    for stale in &typed[..3] {
        assert_eq!(stale.settled().await, Err(TaskError::Canceled));
    }
    assert_eq!(typed[3].settled().await, Ok(4));
    assert_eq!(search.last_successful(), Some(typed[3].clone()));
}

#[tokio::test]
async fn enqueue_never_exceeds_the_ceiling() {
    let task = gated(ConcurrencyPolicy::Enqueue { max: 3 });
    let gs = gates(8);
    let insts: Vec<_> = gs
        .iter()
        .enumerate()
        .map(|(i, g)| task.perform((i as u32, g.clone())))
        .collect();

    for (i, g) in gs.iter().enumerate() {
        assert!(task.running_instances().len() <= 3);
        g.resolve(());
        assert_eq!(insts[i].settled().await, Ok(i as u32));
    }
    assert!(task.is_idle());
    assert_eq!(task.perform_count(), 8);
}

#[tokio::test]
async fn enqueued_instances_start_in_invocation_order() {
    let task = gated(ConcurrencyPolicy::enqueuing());
    let gs = gates(4);
    let insts: Vec<_> = gs
        .iter()
        .enumerate()
        .map(|(i, g)| task.perform((i as u32, g.clone())))
        .collect();

    for (i, g) in gs.iter().enumerate() {
        assert!(insts[i].is_running());
        for later in &insts[i + 1..] {
            assert!(later.is_enqueued());
        }
        g.resolve(());
        insts[i].settled().await.ok();
    }
}

#[tokio::test]
async fn drop_policy_ignores_invocations_while_saturated() {
    let task = gated(ConcurrencyPolicy::Drop { max: 2 });
    let gs = gates(4);
    let insts: Vec<_> = gs
        .iter()
        .enumerate()
        .map(|(i, g)| task.perform((i as u32, g.clone())))
        .collect();

    let statuses: Vec<_> = insts.iter().map(|i| i.status()).collect();
    assert_eq!(
        statuses,
        vec![
            InstanceStatus::Running,
            InstanceStatus::Running,
            InstanceStatus::Dropped,
            InstanceStatus::Dropped,
        ]
    );
    assert_eq!(insts[2].started_at(), None);

    gs[0].resolve(());
    insts[0].settled().await.ok();
    assert!(task.perform((9, defer())).is_running());
}

#[tokio::test]
async fn keep_latest_runs_first_and_last() {
    let task = gated(ConcurrencyPolicy::keep_latest());
    let gs = gates(5);
    let insts: Vec<_> = gs
        .iter()
        .enumerate()
        .map(|(i, g)| task.perform((i as u32, g.clone())))
        .collect();
    for g in &gs {
        g.resolve(());
    }

    let mut outcomes = Vec::new();
    for inst in &insts {
        outcomes.push(inst.settled().await);
    }
    assert_eq!(outcomes[0], Ok(0));
    assert_eq!(outcomes[4], Ok(4));
    for dropped in &outcomes[1..4] {
        assert_eq!(*dropped, Err(TaskError::Dropped));
    }
}

#[tokio::test]
async fn cancel_all_settles_every_active_instance() {
    let task = gated(ConcurrencyPolicy::Enqueue { max: 2 });
    let insts: Vec<_> = (0..5).map(|i| task.perform((i, defer()))).collect();

    assert_eq!(task.cancel_all(), 5);
    assert_eq!(task.cancel_all(), 0);
    for inst in &insts {
        assert_eq!(inst.settled().await, Err(TaskError::Canceled));
    }
    assert!(task.is_idle());
}

#[tokio::test]
async fn anyhow_errors_are_recorded_as_failures() {
    let task = Task::new("parse", |_s: AbortSignal, raw: &'static str| async move {
        let n: u32 = raw
            .parse()
            .map_err(|e| anyhow::anyhow!("bad input {raw:?}: {e}"))?;
        Ok::<_, TaskError>(n)
    });

    assert_eq!(task.perform("42").settled().await, Ok(42));
    let bad = task.perform("x");
    let err = bad.settled().await.unwrap_err();
    assert_eq!(err.as_label(), "task_failed");
    assert!(err.to_string().contains("bad input"));
}

#[tokio::test]
async fn views_follow_status_changes() {
    let task = gated(ConcurrencyPolicy::enqueuing());
    let source = task.clone();
    let running = filtered_instances(move || source.clone(), Some(InstanceFlag::IsRunning));
    let source = task.clone();
    let waiting = filtered_instances(move || source.clone(), Some(InstanceFlag::IsEnqueued));
    let running_count = computed_length(&running);
    let next_up = computed_first_of(&waiting);
    let newest = computed_last_of(&waiting);

    assert_eq!(running_count.get(), 0);
    assert_eq!(next_up.get(), None);

    let (ga, gb) = (defer(), defer());
    let a = task.perform((1, ga.clone()));
    let b = task.perform((2, gb.clone()));
    let c = task.perform((3, defer()));

    assert_eq!(running.get(), vec![a.clone()]);
    assert_eq!(next_up.get(), Some(b.clone()));
    assert_eq!(newest.get(), Some(c.clone()));

    ga.resolve(());
    a.settled().await.ok();
    assert_eq!(running.get(), vec![b.clone()]);
    assert_eq!(running_count.get(), 1);
    assert_eq!(next_up.get(), Some(c.clone()));

    task.cancel_all();
    assert_eq!(running_count.get(), 0);
    assert_eq!(next_up.get(), None);
}

#[tokio::test]
async fn views_do_not_recompute_without_changes() {
    let task = gated(ConcurrencyPolicy::Unbounded);
    let source = task.clone();
    let all = filtered_instances(move || source.clone(), Some(InstanceFlag::IsActive));

    task.perform((1, defer()));
    all.get();
    all.get();
    assert_eq!(all.recomputations(), 1);

    task.perform((2, defer()));
    assert_eq!(all.get().len(), 2);
    assert_eq!(all.recomputations(), 2);
    task.cancel_all();
}

#[tokio::test]
async fn empty_key_is_always_empty() {
    let task = gated(ConcurrencyPolicy::Unbounded);
    let source = task.clone();
    let none = filtered_instances(move || source.clone(), None);
    task.perform((1, defer()));
    assert!(none.get().is_empty());
    assert_eq!(computed_length(&none).get(), 0);
    task.cancel_all();
}

#[tokio::test]
async fn view_follows_accessor_to_another_task() {
    let first = gated(ConcurrencyPolicy::Unbounded);
    let second = gated(ConcurrencyPolicy::Unbounded);
    let a = first.perform((1, defer()));
    let b = second.perform((2, defer()));

    let current = Arc::new(Mutex::new(first.clone()));
    let source = Arc::clone(&current);
    let active = filtered_instances(
        move || source.lock().unwrap().clone(),
        Some(InstanceFlag::IsActive),
    );
    assert_eq!(active.get(), vec![a.clone()]);

    *current.lock().unwrap() = second.clone();
    assert_ne!(first.revision(), second.revision());
    assert_eq!(active.get(), vec![b.clone()]);
    assert_eq!(active.recomputations(), 2);

    first.cancel_all();
    second.cancel_all();
}
