//! Type-ahead search: every keystroke restarts the lookup, so only the
//! latest query finishes.
//!
//! Run with: `cargo run --example search --features logging`

use std::sync::Arc;
use std::time::Duration;

use tasklane::views::{computed_last_of, filtered_instances};
use tasklane::{AbortSignal, InstanceFlag, LogWriter, Subscribe, Task, TaskError};
use tracing_subscriber::EnvFilter;

async fn lookup(signal: AbortSignal, query: String) -> Result<Vec<String>, TaskError> {
    // Debounce: a newer keystroke cancels us while we sleep.
    signal.guard(tokio::time::sleep(Duration::from_millis(150))).await?;

    let corpus = ["rust", "rustc", "rustup", "ruby", "runtime", "tokio"];
    let hits = corpus
        .iter()
        .filter(|w| w.starts_with(query.as_str()))
        .map(|w| w.to_string())
        .collect();
    Ok(hits)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), TaskError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tasklane=debug".into()))
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let search = Task::builder("search", lookup)
        .restartable()
        .with_subscribers(subs)
        .build();

    let source = search.clone();
    let latest = computed_last_of(&filtered_instances(
        move || source.clone(),
        Some(InstanceFlag::IsSuccessful),
    ));

    for query in ["r", "ru", "rus", "rust"] {
        search.perform(query.to_string());
        tokio::time::sleep(Duration::from_millis(40)).await;
    }

    if let Some(last) = search.last() {
        let hits = last.settled().await?;
        println!("hits: {hits:?}");
    }

    let winner = latest.get().map(|inst| inst.id());
    println!("latest successful instance: {winner:?}");
    search.print_task();
    println!("{}", search.table());

    search.shutdown().await;
    Ok(())
}
