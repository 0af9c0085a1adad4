use std::ops::Range;

pub trait TokenCounter {
    fn count_tokens(&self, content: &str) -> usize;
}

/// A token counter that can also locate token boundaries, so budgets can be
/// enforced by cutting the token stream rather than the character stream.
///
/// Implementations must be prefix-stable: cutting at the end of any span and
/// re-counting the prefix yields exactly the number of spans kept.
pub trait Tokenizer: TokenCounter {
    /// Contiguous byte ranges covering all of `content`, in order.
    fn token_spans(&self, content: &str) -> Vec<Range<usize>>;

    /// Longest prefix of `content` holding at most `max_tokens` tokens.
    fn truncate_to_tokens<'a>(&self, content: &'a str, max_tokens: usize) -> &'a str {
        if max_tokens == 0 {
            return "";
        }
        let spans = self.token_spans(content);
        if spans.len() <= max_tokens {
            return content;
        }
        &content[..spans[max_tokens - 1].end]
    }
}

/// v0: Approximate GPT-style tokenization
/// tokens(content) := ceil(len(content) / 4)
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproxTokenCounter;

impl TokenCounter for ApproxTokenCounter {
    fn count_tokens(&self, content: &str) -> usize {
        // Integer division ceil(len / 4) equivalent to (len + 4 - 1) / 4
        if content.is_empty() {
            0
        } else {
            (content.len() + 3) / 4
        }
    }
}

const ASCII_WORD_CAP: usize = 4;
const WIDE_WORD_CAP: usize = 2;

/// Deterministic BPE-shaped tokenizer.
///
/// A token is optional leading whitespace followed by one of:
/// - up to 4 ASCII alphanumerics or `_`
/// - up to 2 non-ASCII alphanumeric chars
/// - any single other character
///
/// Whitespace at the very end of the input forms one final token.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicTokenizer;

#[derive(PartialEq, Eq, Clone, Copy)]
enum CharClass {
    AsciiWord,
    WideWord,
    Other,
}

fn classify(c: char) -> CharClass {
    if c.is_ascii_alphanumeric() || c == '_' {
        CharClass::AsciiWord
    } else if !c.is_ascii() && c.is_alphanumeric() {
        CharClass::WideWord
    } else {
        CharClass::Other
    }
}

impl Tokenizer for HeuristicTokenizer {
    fn token_spans(&self, content: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::with_capacity(content.len() / 3 + 1);
        let mut chars = content.char_indices().peekable();
        let mut start = 0;

        loop {
            while let Some(&(_, c)) = chars.peek() {
                if !c.is_whitespace() {
                    break;
                }
                chars.next();
            }

            let Some((idx, first)) = chars.next() else {
                if start < content.len() {
                    spans.push(start..content.len());
                }
                break;
            };

            let class = classify(first);
            let cap = match class {
                CharClass::AsciiWord => ASCII_WORD_CAP,
                CharClass::WideWord => WIDE_WORD_CAP,
                CharClass::Other => 1,
            };
            let mut end = idx + first.len_utf8();
            let mut taken = 1;
            while taken < cap {
                match chars.peek() {
                    Some(&(i, c)) if classify(c) == class => {
                        end = i + c.len_utf8();
                        taken += 1;
                        chars.next();
                    }
                    _ => break,
                }
            }

            spans.push(start..end);
            start = end;
        }

        spans
    }
}

impl TokenCounter for HeuristicTokenizer {
    fn count_tokens(&self, content: &str) -> usize {
        self.token_spans(content).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces<'a>(text: &'a str) -> Vec<&'a str> {
        HeuristicTokenizer
            .token_spans(text)
            .into_iter()
            .map(|r| &text[r])
            .collect()
    }

    #[test]
    fn splits_words_into_capped_pieces() {
        assert_eq!(pieces("hello world"), vec!["hell", "o", " worl", "d"]);
        assert_eq!(pieces("fn main() {}"), vec!["fn", " main", "(", ")", " {", "}"]);
    }

    #[test]
    fn trailing_whitespace_is_one_token() {
        assert_eq!(pieces("ab  \n"), vec!["ab", "  \n"]);
        assert_eq!(pieces("   "), vec!["   "]);
        assert!(pieces("").is_empty());
    }

    #[test]
    fn non_ascii_words_use_small_pieces() {
        assert_eq!(pieces("日本語"), vec!["日本", "語"]);
        assert_eq!(pieces("é!"), vec!["é", "!"]);
    }

    #[test]
    fn spans_cover_input() {
        let text = "  let x = \"Grüße\";\r\n\tdone ";
        let spans = HeuristicTokenizer.token_spans(text);
        assert_eq!(spans.first().map(|r| r.start), Some(0));
        assert_eq!(spans.last().map(|r| r.end), Some(text.len()));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn truncation_is_prefix_stable() {
        let text = "The quick brown fox jumps over the lazy dog. 日本語 ok!\n  ";
        let total = HeuristicTokenizer.count_tokens(text);
        for n in 0..=total {
            let prefix = HeuristicTokenizer.truncate_to_tokens(text, n);
            assert_eq!(HeuristicTokenizer.count_tokens(prefix), n, "prefix of {n} tokens");
        }
        assert_eq!(HeuristicTokenizer.truncate_to_tokens(text, total + 5), text);
    }

    #[test]
    fn approx_counter_rounds_up() {
        assert_eq!(ApproxTokenCounter.count_tokens(""), 0);
        assert_eq!(ApproxTokenCounter.count_tokens("a"), 1);
        assert_eq!(ApproxTokenCounter.count_tokens("abcde"), 2);
    }
}
