use ldcache::limiter::RateLimiterRegistry;
use std::time::{Duration, Instant};

#[test]
fn test_first_permit_is_immediate() {
    let limiter = RateLimiterRegistry::new(1.0);
    let started = Instant::now();
    limiter.acquire("example.org");
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[test]
fn test_same_host_permits_are_spaced() {
    // 10 permits per second, so the third acquire waits roughly 200ms
    let limiter = RateLimiterRegistry::new(10.0);
    let started = Instant::now();
    limiter.acquire("example.org");
    limiter.acquire("example.org");
    limiter.acquire("example.org");
    assert!(started.elapsed() >= Duration::from_millis(180));
}

#[test]
fn test_hosts_are_throttled_independently() {
    let limiter = RateLimiterRegistry::new(2.0);
    limiter.acquire("one.example.org");
    let started = Instant::now();
    limiter.acquire("two.example.org");
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[test]
fn test_nonpositive_rate_falls_back_to_default() {
    // falls back to 2/s instead of stalling forever
    let limiter = RateLimiterRegistry::new(0.0);
    let started = Instant::now();
    limiter.acquire("example.org");
    limiter.acquire("example.org");
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(400));
    assert!(elapsed < Duration::from_secs(2));
}

#[test]
fn test_idle_buckets_are_evicted() {
    let limiter = RateLimiterRegistry::with_limits(100.0, Duration::from_millis(50), 1000);
    limiter.acquire("one.example.org");
    assert_eq!(limiter.len(), 1);
    std::thread::sleep(Duration::from_millis(80));
    limiter.acquire("two.example.org");
    assert_eq!(limiter.len(), 1);
}

#[test]
fn test_bucket_count_is_bounded() {
    let limiter = RateLimiterRegistry::with_limits(100.0, Duration::from_secs(600), 2);
    limiter.acquire("one.example.org");
    limiter.acquire("two.example.org");
    limiter.acquire("three.example.org");
    assert!(limiter.len() <= 2);
}
