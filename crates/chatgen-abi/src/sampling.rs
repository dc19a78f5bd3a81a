use serde::{Deserialize, Serialize};

/// Per-request sampling knobs handed to the engine's sampler factory.
///
/// The core only reads `max_tokens`; everything else is opaque to it and
/// interpreted by whatever [`crate::TokenSampler`] the engine builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    /// Upper bound on generated tokens. Negative means "until the context is full".
    pub max_tokens: i32,
    pub temperature: f32,
    pub top_p: f32,
    /// 0 disables top-k filtering.
    pub top_k: i32,
    pub repeat_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            repeat_penalty: 1.1,
        }
    }
}

impl SamplingParams {
    /// True when generation is bounded only by the context window.
    #[inline]
    pub fn is_unbounded(&self) -> bool {
        self.max_tokens < 0
    }

    /// Returns a clamped copy that every sampler can accept.
    ///
    /// - temperature < 0 → 0 (greedy)
    /// - top_p ∉ (0, 1] → 1 (disabled)
    /// - top_k < 0 → 0 (disabled)
    /// - repeat_penalty < 1 or NaN → 1 (disabled)
    pub fn normalized(&self) -> Self {
        let mut p = self.clone();

        if !(p.temperature >= 0.0) {
            p.temperature = 0.0;
        }
        if !(p.top_p > 0.0 && p.top_p <= 1.0) {
            p.top_p = 1.0;
        }
        if p.top_k < 0 {
            p.top_k = 0;
        }
        if !(p.repeat_penalty >= 1.0) {
            p.repeat_penalty = 1.0;
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-0.5, 0.0)]
    #[case(f32::NAN, 0.0)]
    #[case(1.3, 1.3)]
    fn temperature_is_clamped(#[case] input: f32, #[case] expected: f32) {
        let p = SamplingParams {
            temperature: input,
            ..Default::default()
        };
        assert_eq!(p.normalized().temperature, expected);
    }

    #[test]
    fn out_of_range_filters_are_disabled() {
        let p = SamplingParams {
            top_p: 0.0,
            top_k: -3,
            repeat_penalty: 0.8,
            ..Default::default()
        }
        .normalized();
        assert_eq!(p.top_p, 1.0);
        assert_eq!(p.top_k, 0);
        assert_eq!(p.repeat_penalty, 1.0);
    }

    #[test]
    fn negative_max_tokens_is_unbounded() {
        let p = SamplingParams {
            max_tokens: -1,
            ..Default::default()
        };
        assert!(p.is_unbounded());
        assert!(!SamplingParams::default().is_unbounded());
    }
}
