// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded retry budget for JMF submissions.
//
// Every failure mode of an attempt (no response, unparseable response,
// positive return code) is retried until the budget is spent.  There is no
// delay between attempts; the transport timeout is the only pacing.

use jmfwerk_core::ClientConfig;

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per submission, first one included.  Never zero.
    max_attempts: u32,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Send the same payload again; `remaining` attempts are left after it.
    Retry { remaining: u32 },
    /// The failed attempt was the last one; surface its error.
    Exhausted,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

impl RetryPolicy {
    /// A budget of `max_attempts`, raised to 1 if zero.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_attempts)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide after attempt number `attempt` (1-based) failed.
    pub fn after_failure(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            RetryDecision::Exhausted
        } else {
            RetryDecision::Retry {
                remaining: self.max_attempts - attempt - 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_one_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.after_failure(1),
            RetryDecision::Retry { remaining: 0 }
        );
        assert_eq!(policy.after_failure(2), RetryDecision::Exhausted);
    }

    #[test]
    fn zero_budget_is_raised_to_one() {
        let policy = RetryPolicy::new(0);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.after_failure(1), RetryDecision::Exhausted);
    }

    #[test]
    fn remaining_counts_down() {
        let policy = RetryPolicy::new(4);
        assert_eq!(policy.after_failure(1), RetryDecision::Retry { remaining: 2 });
        assert_eq!(policy.after_failure(3), RetryDecision::Retry { remaining: 0 });
        assert_eq!(policy.after_failure(4), RetryDecision::Exhausted);
    }

    #[test]
    fn follows_config() {
        let config = ClientConfig {
            max_attempts: 5,
            ..Default::default()
        };
        assert_eq!(RetryPolicy::from_config(&config).max_attempts(), 5);
    }
}
