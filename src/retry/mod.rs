//! Retry classification and backoff schedule for provider calls.


use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::constants::RETRY_BASE_DELAY;
use crate::provider::ProviderError;
use crate::provider::error::{
    CODE_CONNECTION_REFUSED, CODE_CONNECTION_RESET, CODE_DNS_FAILURE, CODE_TIMED_OUT,
};

const RETRYABLE_CODES: [&str; 5] = [
    CODE_CONNECTION_RESET,
    CODE_TIMED_OUT,
    CODE_CONNECTION_REFUSED,
    CODE_DNS_FAILURE,
    "EAI_AGAIN",
];

const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

static TRANSIENT_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)rate[\s_-]?limit|too many requests|quota|timed?[\s_-]?out")
        .expect("valid transient message regex")
});

/// Returns `true` when `err` looks transient and the call may be re-attempted.
pub fn is_retryable(err: &ProviderError) -> bool {
    if err
        .code
        .as_deref()
        .is_some_and(|code| RETRYABLE_CODES.iter().any(|c| c.eq_ignore_ascii_case(code)))
    {
        return true;
    }

    if err.status.is_some_and(|s| RETRYABLE_STATUSES.contains(&s)) {
        return true;
    }

    TRANSIENT_MESSAGE.is_match(&err.message)
}

/// Delay before retry number `retry` (1-based): 1s, 2s, 4s, ...
pub fn backoff_delay(retry: u32) -> Duration {
    let exponent = retry.saturating_sub(1).min(16);
    RETRY_BASE_DELAY.saturating_mul(1u32 << exponent)
}
