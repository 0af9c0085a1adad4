use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BudgetConfigError {
    #[error("Invalid budget config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Compression trigger ratio must be in (0, 1], got {0}")]
    InvalidTriggerRatio(f64),
    #[error("Total window must be greater than zero")]
    ZeroWindow,
}

/// Amounts subtracted from each category budget during the global
/// compression pass. No reduced budget goes below `floor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSlack {
    pub history: usize,
    pub files: usize,
    pub tools: usize,
    pub floor: usize,
}

impl Default for CompressionSlack {
    fn default() -> Self {
        Self {
            history: 6_000,
            files: 25_000,
            tools: 10_000,
            floor: 1_000,
        }
    }
}

impl CompressionSlack {
    pub(crate) fn reduce(&self, budget: usize, slack: usize) -> usize {
        budget.saturating_sub(slack).max(self.floor.min(budget))
    }
}

// Key point:
// Serializable
// Comparable
// Explicit defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenBudget {
    pub system_prompt: usize,
    pub conversation_history: usize,
    pub loaded_files: usize,
    pub tool_results: usize,
    pub safety_buffer: usize,
    pub output_reserved: usize,
    pub total_window: usize,
    /// Fraction of `total_window` at which the global compression pass runs.
    pub compression_trigger_ratio: f64,
    pub slack: CompressionSlack,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self::reference()
    }
}

impl TokenBudget {
    /// The 400k-window configuration the allocator was tuned against.
    pub fn reference() -> Self {
        Self {
            system_prompt: 10_000,
            conversation_history: 120_000,
            loaded_files: 150_000,
            tool_results: 60_000,
            safety_buffer: 10_000,
            output_reserved: 40_000,
            total_window: 400_000,
            compression_trigger_ratio: 0.875,
            slack: CompressionSlack::default(),
        }
    }

    /// Parse a JSON config. Missing fields take their reference values.
    pub fn from_json(raw: &str) -> Result<Self, BudgetConfigError> {
        let budget: TokenBudget = serde_json::from_str(raw)?;
        budget.validate()?;
        Ok(budget)
    }

    pub fn validate(&self) -> Result<(), BudgetConfigError> {
        if self.total_window == 0 {
            return Err(BudgetConfigError::ZeroWindow);
        }
        let ratio = self.compression_trigger_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(BudgetConfigError::InvalidTriggerRatio(ratio));
        }
        Ok(())
    }

    /// Token count at or above which the global compression pass runs.
    pub fn compression_threshold(&self) -> usize {
        (self.total_window as f64 * self.compression_trigger_ratio).ceil() as usize
    }

    pub fn reserved(&self) -> usize {
        self.safety_buffer + self.output_reserved
    }

    /// Category budgets shrunk by the slack amounts, for the global pass.
    pub(crate) fn tightened(&self) -> TokenBudget {
        let slack = &self.slack;
        TokenBudget {
            conversation_history: slack.reduce(self.conversation_history, slack.history),
            loaded_files: slack.reduce(self.loaded_files, slack.files),
            tool_results: slack.reduce(self.tool_results, slack.tools),
            ..self.clone()
        }
    }
}
