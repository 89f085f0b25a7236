//! Demonstrates the two admission bounds `RequestLimiter` supports.
//!
//! Run with: cargo run --example ratelimiter_example -p statcore-ratelimiter

use statcore_ratelimiter::{Bound, Outcome, RequestLimiter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    println!("=== statcore-ratelimiter demo ===\n");

    demo_max_operation_time().await;
    println!("\n{}\n", "=".repeat(50));
    demo_min_operation_time().await;
}

/// `MaxOperationTime` refuses admission once the window is exhausted and the
/// wait would blow through the deadline; `operation` never runs for a
/// refused call.
async fn demo_max_operation_time() {
    println!("1. MaxOperationTime");
    println!("   3 requests per second, each with a 50ms admission deadline.\n");

    let limiter = RequestLimiter::new(3, Duration::from_secs(1));
    let token = CancellationToken::new();
    let ran = Arc::new(AtomicUsize::new(0));

    for i in 1..=5 {
        let ran = Arc::clone(&ran);
        let outcome = limiter
            .limit(&token, Bound::MaxOperationTime(Duration::from_millis(50)), || async move {
                ran.fetch_add(1, Ordering::SeqCst);
                "response"
            })
            .await;

        match outcome {
            Ok(Outcome::Ran(body)) => println!("   request {i}: ran ({body})"),
            Ok(Outcome::Dropped) => println!("   request {i}: dropped"),
            Err(err) => println!("   request {i}: refused ({err})"),
        }
    }

    println!("\n   ran {} of 5 requests", ran.load(Ordering::SeqCst));
}

/// `MinOperationTime` never refuses admission; instead it pads a
/// faster-than-floor call out to the floor, which is the shape a host uses
/// to avoid hammering an upstream with a tight retry loop.
async fn demo_min_operation_time() {
    println!("2. MinOperationTime");
    println!("   No count limit; every call is padded to at least 100ms.\n");

    let limiter = RequestLimiter::new(100, Duration::from_secs(1));
    let token = CancellationToken::new();

    let started = std::time::Instant::now();
    let outcome = limiter
        .limit(&token, Bound::MinOperationTime(Duration::from_millis(100)), || async {
            "fast response"
        })
        .await
        .unwrap();

    match outcome {
        Outcome::Ran(body) => println!("   {body} after {:?}", started.elapsed()),
        Outcome::Dropped => unreachable!("MinOperationTime never drops"),
    }
}
