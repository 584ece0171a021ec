//! Fire-and-forget messages, partial results and a heartbeat
//!
//! Run with: RUST_LOG=info cargo run --example async_tasks
//!
//! Pool sizes can be overridden with CORE_POOL_SIZE and MAX_POOL_SIZE.

use rust_task_executor::prelude::*;
use std::thread;
use std::time::Duration;

const WORDS: [&str; 9] = [
    "the", "quick", "brown", "fox", "jumps", "over", "the", "lazy", "dog",
];

fn env_size(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let messages = TaskExecutor::new(
        PoolConfig::new(env_size("CORE_POOL_SIZE", 3), env_size("MAX_POOL_SIZE", 5))
            .with_queue_capacity(25)
            .with_thread_name_prefix("AnExecutor-"),
    )?;
    let workers = TaskExecutor::from_choice(ExecutorChoice::PlatformDefault)?;

    let scheduler = Scheduler::new("scheduling")?;
    let heartbeat = scheduler.schedule_heartbeat(Duration::from_secs(1), LogHeartbeatSink)?;

    log::info!("Scheduler should start now...");
    log::info!("Waiting few seconds...");
    thread::sleep(Duration::from_secs(2));

    log::info!("Starting async messages...");
    for i in 0..10u64 {
        let msg = format!("Hello async {}", i);
        messages.execute(i, move || {
            let wait = 500 + fastrand::u64(0..500);
            thread::sleep(Duration::from_millis(wait));
            log::info!("Async message [{}]: {}", wait, msg);
            thread::sleep(Duration::from_millis(500));
            Ok(())
        })?;
    }

    log::info!("Starting async processes that will return results...");
    let words: AggregateResult = AggregateResult::new(5);
    for i in 0..5u64 {
        workers.submit_to(&words, i, move || {
            let wait = 500 + fastrand::u64(0..1000);
            log::info!("{}) Going to process for {} ms", i, wait);
            thread::sleep(Duration::from_millis(wait));
            if wait % 2 == 0 {
                return Err(ExecutorError::task_failed(
                    i,
                    format!("task {} Not happy!", i),
                ));
            }
            Ok(WORDS[fastrand::usize(..WORDS.len())].to_string())
        })?;
    }

    log::info!("Waiting on the async result latch...");
    workers.await_all(&words, Duration::from_millis(1000));
    let summary = words.summary();
    log::info!(
        "*** Got async result from {} threads: {:?}",
        summary.succeeded,
        summary.results
    );

    heartbeat.cancel();
    scheduler.shutdown()?;
    workers.close()?;
    let shutdown = messages.close()?;
    log::info!(
        "Executor stats: {}",
        serde_json::to_string(&shutdown.stats).unwrap_or_default()
    );

    Ok(())
}
