//! Token-budget allocation across request categories.
//!
//! The allocator never fails: it degrades content until it fits, and every
//! degradation is reported as a [`TrimNote`] so callers can warn the user.

pub mod config;
pub mod trimming;
pub mod usage;

use tracing::{debug, info, warn};

use crate::tokens::{HeuristicTokenizer, Tokenizer};
pub use config::{BudgetConfigError, CompressionSlack, TokenBudget};
pub use trimming::{trim_history, trim_sections, HistoryTrim, SectionTrim, SECTION_TRIMMED_MARKER};
pub use usage::{
    AllocatorInput, CategoryUsage, CompressionResult, ContextUsage, HistoryMessage, Role,
    TrimNote,
};

/// Fixed framing cost charged per history message (role and separators).
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionCategory {
    LoadedFiles,
    ToolResults,
}

pub struct TokenBudgetAllocator<T = HeuristicTokenizer> {
    budget: TokenBudget,
    tokenizer: T,
}

impl Default for TokenBudgetAllocator<HeuristicTokenizer> {
    fn default() -> Self {
        Self::new(TokenBudget::reference())
    }
}

impl TokenBudgetAllocator<HeuristicTokenizer> {
    pub fn new(budget: TokenBudget) -> Self {
        Self::with_tokenizer(budget, HeuristicTokenizer)
    }
}

impl<T> TokenBudgetAllocator<T>
where
    T: Tokenizer,
{
    pub fn with_tokenizer(budget: TokenBudget, tokenizer: T) -> Self {
        Self { budget, tokenizer }
    }

    pub fn budget(&self) -> &TokenBudget {
        &self.budget
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        self.tokenizer.count_tokens(text)
    }

    pub fn message_cost(&self, message: &HistoryMessage) -> usize {
        self.count_tokens(&message.content) + MESSAGE_OVERHEAD_TOKENS
    }

    pub fn build_usage(
        &self,
        system_prompt: &str,
        history: &[HistoryMessage],
        loaded_files: &[String],
        tool_results: &[String],
    ) -> ContextUsage {
        let per_category = CategoryUsage {
            system_prompt: self.count_tokens(system_prompt),
            conversation_history: history.iter().map(|m| self.message_cost(m)).sum(),
            loaded_files: self.sections_cost(loaded_files),
            tool_results: self.sections_cost(tool_results),
        };
        let subtotal = per_category.total();

        ContextUsage {
            per_category,
            subtotal,
            with_reserved: subtotal + self.budget.reserved(),
            total_window: self.budget.total_window,
        }
    }

    pub fn usage_of(&self, input: &AllocatorInput) -> ContextUsage {
        self.build_usage(
            &input.system_prompt,
            &input.history,
            &input.loaded_files,
            &input.tool_results,
        )
    }

    /// Fit `input` into the configured budgets.
    ///
    /// Runs the per-category passes, then at most one global pass with
    /// tightened budgets if the total still sits at or above the
    /// compression threshold.
    pub fn compress_to_budget(&self, input: AllocatorInput) -> CompressionResult {
        let mut notes = Vec::new();
        let AllocatorInput {
            system_prompt,
            history,
            loaded_files,
            tool_results,
        } = input;

        let system_prompt = self.clip_system_prompt(system_prompt, &mut notes);
        let mut trimmed = AllocatorInput {
            system_prompt,
            ..AllocatorInput::default()
        };
        trimmed.history = self.fit_history(history, self.budget.conversation_history, &mut notes);
        trimmed.loaded_files = self.fit_sections(
            loaded_files,
            self.budget.loaded_files,
            SectionCategory::LoadedFiles,
            &mut notes,
        );
        trimmed.tool_results = self.fit_sections(
            tool_results,
            self.budget.tool_results,
            SectionCategory::ToolResults,
            &mut notes,
        );

        let mut usage = self.usage_of(&trimmed);

        if usage.with_reserved >= self.budget.compression_threshold() {
            let before = usage.with_reserved;
            let tight = self.budget.tightened();

            trimmed.history = self.fit_history(
                std::mem::take(&mut trimmed.history),
                tight.conversation_history,
                &mut notes,
            );
            trimmed.loaded_files = self.fit_sections(
                std::mem::take(&mut trimmed.loaded_files),
                tight.loaded_files,
                SectionCategory::LoadedFiles,
                &mut notes,
            );
            trimmed.tool_results = self.fit_sections(
                std::mem::take(&mut trimmed.tool_results),
                tight.tool_results,
                SectionCategory::ToolResults,
                &mut notes,
            );

            usage = self.usage_of(&trimmed);
            info!(
                before,
                after = usage.with_reserved,
                window = usage.total_window,
                "global context compression pass"
            );
            notes.push(TrimNote::GlobalCompression {
                before,
                after: usage.with_reserved,
            });
        }

        if usage.exceeds_window() {
            warn!(
                with_reserved = usage.with_reserved,
                window = usage.total_window,
                "context still exceeds window after compression"
            );
        }

        CompressionResult {
            trimmed,
            usage,
            compressed: !notes.is_empty(),
            notes,
        }
    }

    fn sections_cost(&self, sections: &[String]) -> usize {
        sections.iter().map(|s| self.count_tokens(s)).sum()
    }

    fn clip_system_prompt(&self, prompt: String, notes: &mut Vec<TrimNote>) -> String {
        let from = self.count_tokens(&prompt);
        let limit = self.budget.system_prompt;
        if from <= limit {
            return prompt;
        }

        let clipped = self.tokenizer.truncate_to_tokens(&prompt, limit).to_string();
        let to = self.count_tokens(&clipped);
        debug!(from, to, "system prompt clipped");
        notes.push(TrimNote::SystemPromptTrimmed { from, to });
        clipped
    }

    fn fit_history(
        &self,
        history: Vec<HistoryMessage>,
        budget: usize,
        notes: &mut Vec<TrimNote>,
    ) -> Vec<HistoryMessage> {
        let total: usize = history.iter().map(|m| self.message_cost(m)).sum();
        if total <= budget {
            return history;
        }

        let HistoryTrim {
            kept,
            tokens_used,
            dropped,
        } = trim_history(history, budget, |m| self.message_cost(m));
        debug!(dropped, tokens_used, budget, "conversation history trimmed");
        notes.push(TrimNote::HistoryTrimmed {
            dropped_messages: dropped,
            kept_messages: kept.len(),
        });
        kept
    }

    fn fit_sections(
        &self,
        sections: Vec<String>,
        budget: usize,
        category: SectionCategory,
        notes: &mut Vec<TrimNote>,
    ) -> Vec<String> {
        if self.sections_cost(&sections) <= budget {
            return sections;
        }

        let SectionTrim {
            kept,
            tokens_used,
            dropped,
            clipped,
        } = trim_sections(sections, budget, &self.tokenizer);
        debug!(?category, dropped, clipped, tokens_used, budget, "sections trimmed");
        notes.push(match category {
            SectionCategory::LoadedFiles => TrimNote::LoadedFilesTrimmed {
                dropped_sections: dropped,
                clipped,
            },
            SectionCategory::ToolResults => TrimNote::ToolResultsTrimmed {
                dropped_sections: dropped,
                clipped,
            },
        });
        kept
    }
}
