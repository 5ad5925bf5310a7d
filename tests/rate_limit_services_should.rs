use reelbox::server::services::rate_limit_services::{
    RateLimitConfig, RateLimitResult, exceeds_error_budget, window_pipeline, window_verdict,
};

const NOW: i64 = 1_714_557_600;

fn tight() -> RateLimitConfig {
    RateLimitConfig {
        max_requests_per_window: 3,
        window_seconds: 60,
        max_errors_before_timeout: 2,
        error_window_seconds: 600,
        timeout_duration_seconds: 300,
    }
}

#[test]
fn allow_requests_up_to_the_limit() {
    assert_eq!(
        window_verdict(&tight(), 1, 60, NOW),
        RateLimitResult::Allowed {
            remaining: 2,
            reset_at: NOW + 60
        }
    );
    assert_eq!(
        window_verdict(&tight(), 3, 12, NOW),
        RateLimitResult::Allowed {
            remaining: 0,
            reset_at: NOW + 12
        }
    );
}

#[test]
fn limit_once_the_window_is_full() {
    assert_eq!(
        window_verdict(&tight(), 4, 42, NOW),
        RateLimitResult::RateLimited { retry_after: 42 }
    );
}

#[test]
fn never_ask_for_a_zero_second_retry() {
    // redis reports -1 for a key without expiry
    assert_eq!(
        window_verdict(&tight(), 9, -1, NOW),
        RateLimitResult::RateLimited { retry_after: 1 }
    );
    assert_eq!(
        window_verdict(&tight(), 1, -1, NOW),
        RateLimitResult::Allowed {
            remaining: 2,
            reset_at: NOW
        }
    );
}

#[test]
fn time_clients_out_at_the_error_budget() {
    assert!(!exceeds_error_budget(&tight(), 1));
    assert!(exceeds_error_budget(&tight(), 2));
    assert!(exceeds_error_budget(&tight(), 7));
}

#[test]
fn leave_room_for_stream_segments_by_default() {
    let config = RateLimitConfig::default();

    assert_eq!(config.max_requests_per_window, 500);
    assert_eq!(config.window_seconds, 60);
    assert!(!exceeds_error_budget(&config, 49));
    assert!(exceeds_error_budget(&config, 50));
}

#[test]
fn only_start_the_window_clock_when_the_window_opens() {
    let packed = window_pipeline("reelbox_rate_limit:abc", 60).get_packed_pipeline();
    let packed = String::from_utf8_lossy(&packed);

    // SET ... EX 60 NX leaves an existing window's ttl alone, EXPIRE would reset it on every hit
    assert!(packed.contains("$3\r\nSET\r\n"));
    assert!(packed.contains("$2\r\nEX\r\n$2\r\n60\r\n$2\r\nNX\r\n"));
    assert!(packed.contains("$4\r\nINCR\r\n"));
    assert!(!packed.contains("EXPIRE"));
}

#[test]
fn let_clients_back_in_once_the_window_resets() {
    let config = tight();

    // hammering the full window keeps the original reset time
    assert_eq!(
        window_verdict(&config, 4, 30, NOW),
        RateLimitResult::RateLimited { retry_after: 30 }
    );
    assert_eq!(
        window_verdict(&config, 40, 1, NOW + 29),
        RateLimitResult::RateLimited { retry_after: 1 }
    );

    // the key expired, the next hit opens a fresh window
    assert_eq!(
        window_verdict(&config, 1, 60, NOW + 30),
        RateLimitResult::Allowed {
            remaining: 2,
            reset_at: NOW + 90
        }
    );
}
