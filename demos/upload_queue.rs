//! Upload queue: at most two uploads at a time, the rest wait their turn.
//!
//! Run with: `cargo run --example upload_queue`

use std::time::Duration;

use tasklane::views::{computed_length, filtered_instances};
use tasklane::{AbortSignal, InstanceFlag, Task, TaskError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let upload = Task::builder("upload", |signal: AbortSignal, file: (String, u64)| async move {
        let (name, size_kb) = file;
        for _ in 0..size_kb / 64 {
            signal.check()?;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        if name.ends_with(".tmp") {
            return Err(TaskError::fail(format!("refusing to upload {name}")));
        }
        Ok(size_kb)
    })
    .enqueuing()
    .max_concurrency(2)
    .max_retained(16)
    .build();

    let source = upload.clone();
    let waiting = computed_length(&filtered_instances(
        move || source.clone(),
        Some(InstanceFlag::IsEnqueued),
    ));

    let files = [
        ("photo.jpg", 512),
        ("notes.txt", 64),
        ("cache.tmp", 128),
        ("video.mp4", 1024),
        ("song.mp3", 256),
    ];
    let instances: Vec<_> = files
        .iter()
        .map(|(name, size)| upload.perform((name.to_string(), *size)))
        .collect();
    println!("waiting after submit: {}", waiting.get());

    // Changed our mind about the video.
    instances[3].cancel();

    for inst in &instances {
        match inst.settled().await {
            Ok(kb) => println!("#{} uploaded {kb} KiB", inst.id()),
            Err(e) => println!("#{} {}: {e}", inst.id(), e.as_label()),
        }
    }
    println!("{}", upload.table());

    upload.shutdown().await;
    Ok(())
}
