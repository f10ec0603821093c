//! Server block parser.
//!
//! # Responsibilities
//! - Group tokens into server blocks (keys + directives)
//! - Attach nested `{ ... }` tokens to the directive that opened them
//! - Reject structurally broken input with a line number
//!
//! # Design Decisions
//! - Directives are keyed by name; repeated directives share one group
//! - Group order is not preserved here; serialization re-sorts by line

use std::collections::HashMap;
use thiserror::Error;

use crate::caddyfile::lexer::{tokenize, Token};

/// Errors produced while parsing a fragment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A `{` was never closed.
    #[error("unclosed block opened on line {line}")]
    UnclosedBlock { line: usize },

    /// A brace appeared where no block could open or close.
    #[error("unexpected '{brace}' on line {line}")]
    UnexpectedBrace { brace: char, line: usize },

    /// A block has no site keys before its opening brace.
    #[error("block on line {line} has no keys")]
    MissingKeys { line: usize },

    /// A braceless block must be the only block in its file.
    #[error("block on line {line} must use braces when more than one block is defined")]
    UnbracedBlock { line: usize },
}

/// One parsed server block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerBlock {
    /// Site keys (addresses) in source order.
    pub keys: Vec<String>,
    /// Directive name → every token belonging to that directive.
    pub directives: HashMap<String, Vec<Token>>,
}

/// Parse raw fragment text into server blocks.
pub fn parse(input: &str) -> Result<Vec<ServerBlock>, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(input),
        pos: 0,
    };
    let mut blocks = Vec::new();

    while let Some(first) = parser.peek() {
        let line = first.line.unwrap_or(0);
        let (keys, braced) = parser.keys()?;
        if !braced && !blocks.is_empty() {
            return Err(ParseError::UnbracedBlock { line });
        }
        let directives = parser.directives(braced, line)?;
        blocks.push(ServerBlock { keys, directives });
    }

    Ok(blocks)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Read site keys. Returns the keys and whether a `{` opened the block.
    fn keys(&mut self) -> Result<(Vec<String>, bool), ParseError> {
        let mut keys = Vec::new();
        let mut line = self.peek().and_then(|t| t.line);
        let start = line.unwrap_or(0);

        while let Some(token) = self.peek() {
            match token.text.as_str() {
                "{" => {
                    self.pos += 1;
                    if keys.is_empty() {
                        return Err(ParseError::MissingKeys { line: start });
                    }
                    return Ok((keys, true));
                }
                "}" => {
                    return Err(ParseError::UnexpectedBrace {
                        brace: '}',
                        line: token.line.unwrap_or(0),
                    });
                }
                _ if token.line != line => break,
                text => {
                    let continues = text.ends_with(',');
                    keys.extend(
                        text.split(',')
                            .filter(|k| !k.is_empty())
                            .map(str::to_string),
                    );
                    self.pos += 1;
                    // A trailing comma carries the key list onto the next line.
                    if continues {
                        line = self.peek().and_then(|t| t.line);
                    }
                }
            }
        }

        // Brace on the line after the keys.
        if self.peek().is_some_and(|t| t.text == "{") {
            self.pos += 1;
            return Ok((keys, true));
        }

        Ok((keys, false))
    }

    fn directives(
        &mut self,
        braced: bool,
        open_line: usize,
    ) -> Result<HashMap<String, Vec<Token>>, ParseError> {
        let mut directives: HashMap<String, Vec<Token>> = HashMap::new();
        let mut current: Option<String> = None;
        let mut last_line = None;
        let mut depth = 0usize;

        loop {
            let Some(token) = self.next() else {
                if braced || depth > 0 {
                    return Err(ParseError::UnclosedBlock { line: open_line });
                }
                return Ok(directives);
            };

            if depth == 0 {
                match token.text.as_str() {
                    "}" if braced => return Ok(directives),
                    "}" => {
                        return Err(ParseError::UnexpectedBrace {
                            brace: '}',
                            line: token.line.unwrap_or(0),
                        })
                    }
                    "{" if current.is_none() => {
                        return Err(ParseError::UnexpectedBrace {
                            brace: '{',
                            line: token.line.unwrap_or(0),
                        })
                    }
                    "{" => depth += 1,
                    _ if current.is_none() || token.line != last_line => {
                        current = Some(token.text.clone());
                    }
                    _ => {}
                }
            } else if token.text == "{" {
                depth += 1;
            } else if token.text == "}" {
                depth -= 1;
            }

            last_line = token.line;
            if let Some(name) = &current {
                directives.entry(name.clone()).or_default().push(token);
            }
        }
    }
}
