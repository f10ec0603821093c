//! Tokenizer for the block-structured fragment grammar.
//!
//! # Responsibilities
//! - Split raw text into whitespace-separated tokens
//! - Track the 1-based source line of every token
//! - Handle `"quoted strings"` and `#` comments
//!
//! # Design Decisions
//! - Braces are ordinary tokens; the parser gives them meaning
//! - A quoted token keeps the line it started on, even if it spans lines

/// A single lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Source line the token started on. `None` marks a synthetic token
    /// that was never read from a file.
    pub line: Option<usize>,
    /// Token text with quotes removed.
    pub text: String,
}

impl Token {
    /// Create a token read from `line`.
    pub fn new(line: usize, text: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            text: text.into(),
        }
    }

    /// Create a token with no source line.
    pub fn synthetic(text: impl Into<String>) -> Self {
        Self {
            line: None,
            text: text.into(),
        }
    }
}

/// Split `input` into tokens.
///
/// Never fails: an unterminated quote swallows the rest of the input as
/// one token, which the parser will reject as a malformed block if it matters.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        if c == '\n' {
            line += 1;
            chars.next();
            continue;
        }
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            while let Some(&c) = chars.peek() {
                if c == '\n' {
                    break;
                }
                chars.next();
            }
            continue;
        }

        let start_line = line;
        let mut text = String::new();

        if c == '"' {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' if chars.peek() == Some(&'"') => {
                        text.push('"');
                        chars.next();
                    }
                    '"' => break,
                    '\n' => {
                        line += 1;
                        text.push(c);
                    }
                    _ => text.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                text.push(c);
                chars.next();
            }
        }

        tokens.push(Token::new(start_line, text));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_lines_and_words() {
        let tokens = tokenize("example.com {\n    root public\n}\n");
        assert_eq!(texts(&tokens), ["example.com", "{", "root", "public", "}"]);
        let lines: Vec<_> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, [Some(1), Some(1), Some(2), Some(2), Some(3)]);
    }

    #[test]
    fn test_quotes_and_comments() {
        let tokens = tokenize("# header\nheader X-Tag \"a \\\"b\\\" c\" # trailing\n");
        assert_eq!(texts(&tokens), ["header", "X-Tag", "a \"b\" c"]);
        assert!(tokens.iter().all(|t| t.line == Some(2)));
    }

    #[test]
    fn test_multiline_quote_keeps_start_line() {
        let tokens = tokenize("a \"one\ntwo\"\nb");
        assert_eq!(tokens[1].line, Some(1));
        assert_eq!(tokens[2], Token::new(3, "b"));
    }
}
