use crate::helpers::{FAKE_UPID, ScriptedFetcher, Step};
use pve_tasks::prelude::{Context, Error, TaskWaiter, WaitOutcome};
use pve_tasks::proxmox::types::UniqueProcessId;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn setup(steps: &[Step]) -> (TaskWaiter, Arc<ScriptedFetcher>, UniqueProcessId) {
    let fetcher = Arc::new(ScriptedFetcher::new(steps));
    (
        TaskWaiter::new(fetcher.clone()),
        fetcher,
        UniqueProcessId::from(FAKE_UPID),
    )
}

#[tokio::test(start_paused = true)]
async fn completes_after_running_steps() {
    // Arrange
    let (waiter, fetcher, upid) = setup(&[Step::Running, Step::Running, Step::Stopped("OK")]);
    let start = Instant::now();

    // Act
    let result = waiter
        .wait(
            &Context::background(),
            &upid,
            Duration::from_secs(1),
            Duration::from_millis(10),
        )
        .await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(fetcher.calls(), 3);
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert!(start.elapsed() <= Duration::from_millis(30));
}

#[tokio::test(start_paused = true)]
async fn completed_task_is_not_polled_again() {
    // Arrange
    let (waiter, fetcher, upid) = setup(&[Step::Stopped("OK")]);

    // Act
    let result = waiter
        .wait(
            &Context::background(),
            &upid,
            Duration::from_secs(1),
            Duration::from_millis(10),
        )
        .await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_task_reports_exit_code() {
    // Arrange
    let (waiter, fetcher, upid) = setup(&[Step::Running, Step::Stopped("ERROR")]);

    // Act
    let result = waiter
        .wait(
            &Context::background(),
            &upid,
            Duration::from_secs(1),
            Duration::from_millis(10),
        )
        .await;

    // Assert
    match result.unwrap_err() {
        Error::JobFailed { job, exit_code } => {
            assert_eq!(job, upid);
            assert_eq!(exit_code, "ERROR");
        }
        error => panic!("unexpected error: {}", error),
    }
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn running_task_times_out() {
    // Arrange
    let (waiter, fetcher, upid) = setup(&[Step::Running]);
    let timeout = Duration::from_millis(50);
    let poll_interval = Duration::from_millis(10);

    // Act
    let result = waiter
        .wait(&Context::background(), &upid, timeout, poll_interval)
        .await;

    // Assert
    let error = result.unwrap_err();
    assert!(error.is_inconclusive());
    match error {
        Error::TimedOut { job, elapsed } => {
            assert_eq!(job, upid);
            assert!(elapsed >= timeout);
            assert!(elapsed <= timeout + poll_interval);
        }
        error => panic!("unexpected error: {}", error),
    }
    assert!((5..=6).contains(&fetcher.calls()));
}

#[tokio::test(start_paused = true)]
async fn query_error_is_not_retried() {
    // Arrange
    let (waiter, fetcher, upid) = setup(&[Step::TransportError, Step::Stopped("OK")]);
    let start = Instant::now();

    // Act
    let result = waiter
        .wait(
            &Context::background(),
            &upid,
            Duration::from_secs(1),
            Duration::from_millis(10),
        )
        .await;

    // Assert
    match result.unwrap_err() {
        Error::Query { job, source } => {
            assert_eq!(job, upid);
            assert!(matches!(*source, Error::InputOutput(_)));
        }
        error => panic!("unexpected error: {}", error),
    }
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn query_error_after_running_steps() {
    // Arrange
    let (waiter, fetcher, upid) = setup(&[Step::Running, Step::TransportError]);

    // Act
    let outcome = waiter
        .wait_outcome(
            &Context::background(),
            &upid,
            Duration::from_secs(1),
            Duration::from_millis(10),
        )
        .await
        .unwrap();

    // Assert
    assert!(matches!(outcome, WaitOutcome::QueryError(Error::InputOutput(_))));
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_sleep() {
    // Arrange
    let (waiter, fetcher, upid) = setup(&[Step::Running]);
    let ctx = Context::background();
    let cancel_ctx = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(15)).await;
        cancel_ctx.cancel();
    });

    // Act
    let result = waiter
        .wait(
            &ctx,
            &upid,
            Duration::from_secs(1),
            Duration::from_millis(100),
        )
        .await;

    // Assert
    match result.unwrap_err() {
        Error::Cancelled { job, elapsed } => {
            assert_eq!(job, upid);
            assert!(elapsed >= Duration::from_millis(15));
            assert!(elapsed < Duration::from_millis(100));
        }
        error => panic!("unexpected error: {}", error),
    }
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_waits_are_independent() {
    // Arrange
    let (first, first_fetcher, upid) = setup(&[Step::Running, Step::Stopped("OK")]);
    let (second, second_fetcher, _) = setup(&[Step::Running, Step::Running, Step::Stopped("WARNINGS: 1")]);
    let ctx = Context::background();

    // Act
    let (first_result, second_result) = tokio::join!(
        first.wait(&ctx, &upid, Duration::from_secs(1), Duration::from_millis(10)),
        second.wait(&ctx, &upid, Duration::from_secs(1), Duration::from_millis(10)),
    );

    // Assert
    assert!(first_result.is_ok());
    assert!(matches!(
        second_result,
        Err(Error::JobFailed { ref exit_code, .. }) if exit_code == "WARNINGS: 1"
    ));
    assert_eq!(first_fetcher.calls(), 2);
    assert_eq!(second_fetcher.calls(), 3);
}
