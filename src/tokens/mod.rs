pub mod counter;

pub use counter::{ApproxTokenCounter, HeuristicTokenizer, TokenCounter, Tokenizer};
