//! Line/tag tokenizer for the dialogue script format.
//!
//! A script is plain UTF-8 text. Each nonempty line may open with a run of
//! bracketed control tags (`[pause][face_left]Hello`), which the tokenizer
//! splits off one by one; whatever follows the leading tags is a single line
//! of display text. Tags are opaque here; the presentation layer decides
//! what `[pause]` means.

/// A single parsed element of a dialogue script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bracket-delimited control marker from the start of a line, brackets
    /// included.
    Tag(String),
    /// One line of display text.
    Line(String),
    /// Structural end marker. The tokenizer appends exactly one, always.
    EndOfScript,
}

/// Tokenizes raw script text into display order.
///
/// Pure and total: malformed input never fails, it degrades to literal
/// text. Lines are split on any mix of `\r` and `\n`; empty lines are
/// skipped. A `[` that never closes on its own line is not a tag, so the
/// rest of that line is emitted verbatim, bracket included. Tags appearing
/// after the first non-tag character are literal text too.
pub fn tokenize(raw: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for line in raw.split(['\r', '\n']) {
        if line.is_empty() {
            continue;
        }
        let mut rest = line;
        while rest.starts_with('[') {
            let Some(close) = rest.find(']') else {
                break;
            };
            let (tag, tail) = rest.split_at(close + 1);
            tokens.push(Token::Tag(tag.to_string()));
            rest = tail;
        }
        if !rest.is_empty() {
            tokens.push(Token::Line(rest.to_string()));
        }
    }
    tokens.push(Token::EndOfScript);
    tokens
}
