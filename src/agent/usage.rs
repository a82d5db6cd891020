//! Token accounting and cost estimation.

use crate::models::TokenUsage;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Per-thousand-token rates in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    /// Rate applied to prompt tokens.
    pub input_per_1k: f64,
    /// Rate applied to completion tokens.
    pub output_per_1k: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        // gpt-4o-mini list price
        Self {
            input_per_1k: 0.00015,
            output_per_1k: 0.0006,
        }
    }
}

impl Pricing {
    /// `prompt/1000 * input + completion/1000 * output`.
    pub fn estimate(&self, usage: &TokenUsage) -> f64 {
        (usage.prompt_tokens as f64 / 1000.0) * self.input_per_1k
            + (usage.completion_tokens as f64 / 1000.0) * self.output_per_1k
    }
}

/// Token counts plus the derived cost for one model call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageMetrics {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub estimated_cost: f64,
}

impl UsageMetrics {
    pub fn new(usage: TokenUsage, pricing: &Pricing) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            estimated_cost: pricing.estimate(&usage),
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    /// Emit the usage and cost log lines.
    pub fn log(&self) {
        info!(
            prompt_tokens = self.prompt_tokens,
            completion_tokens = self.completion_tokens,
            total_tokens = self.total_tokens(),
            "Token usage"
        );
        info!(
            estimated_cost_usd = self.estimated_cost,
            "Estimated cost: ${:.6}", self.estimated_cost
        );
    }
}

impl fmt::Display for UsageMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} prompt + {} completion tokens (~${:.6})",
            self.prompt_tokens, self.completion_tokens, self.estimated_cost
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(prompt: u64, completion: u64) -> TokenUsage {
        TokenUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
        }
    }

    #[test]
    fn test_cost_is_linear_in_both_counts() {
        let pricing = Pricing {
            input_per_1k: 0.0015,
            output_per_1k: 0.002,
        };
        let cost = pricing.estimate(&usage(1000, 500));
        assert!((cost - 0.0025).abs() < 1e-12, "cost was {cost}");

        let doubled = pricing.estimate(&usage(2000, 1000));
        assert!((doubled - 2.0 * cost).abs() < 1e-12);
    }

    #[test]
    fn test_zero_usage_costs_nothing() {
        assert_eq!(Pricing::default().estimate(&usage(0, 0)), 0.0);
    }

    #[test]
    fn test_metrics_from_usage() {
        let metrics = UsageMetrics::new(
            usage(1000, 1000),
            &Pricing {
                input_per_1k: 0.001,
                output_per_1k: 0.003,
            },
        );
        assert_eq!(metrics.total_tokens(), 2000);
        assert!((metrics.estimated_cost - 0.004).abs() < 1e-12);
        assert_eq!(
            metrics.to_string(),
            "1000 prompt + 1000 completion tokens (~$0.004000)"
        );
    }
}
