//! Deterministic block serialization.
//!
//! The parser keeps directives in a hash map, so iteration order is
//! arbitrary. Groups are sorted by the line of their first token before
//! emitting, which makes the output byte-stable for unchanged input.

use std::cmp::Ordering;

use crate::caddyfile::lexer::Token;

const INDENT: &str = "    ";

/// A directive group ordered by where it first appeared in the source.
#[derive(Debug)]
struct DirectiveGroup<'a> {
    first_line: Option<usize>,
    name: &'a str,
    tokens: &'a [Token],
}

impl DirectiveGroup<'_> {
    /// Synthetic lines sort first; equal lines fall back to the name.
    fn order(&self, other: &Self) -> Ordering {
        self.first_line
            .cmp(&other.first_line)
            .then_with(|| self.name.cmp(other.name))
    }
}

/// Serialize one block.
///
/// Keys go one per line, all but the last followed by a comma, and the last
/// one carries the opening brace. Within a group a change of source line
/// between consecutive tokens starts a new output line.
pub fn serialize_block<'a, I>(keys: &[String], directives: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a Vec<Token>)>,
{
    let mut groups: Vec<DirectiveGroup<'a>> = directives
        .into_iter()
        .filter(|(_, tokens)| !tokens.is_empty())
        .map(|(name, tokens)| DirectiveGroup {
            first_line: tokens[0].line,
            name: name.as_str(),
            tokens: tokens.as_slice(),
        })
        .collect();
    groups.sort_by(|a, b| a.order(b));

    let mut out = String::new();
    for (i, key) in keys.iter().enumerate() {
        out.push_str(key);
        if i + 1 < keys.len() {
            out.push_str(",\n");
        }
    }
    out.push_str(" {\n");

    let mut depth = 0usize;
    for group in &groups {
        for line in split_lines(group.tokens) {
            write_line(&mut out, line, &mut depth);
        }
        depth = 0;
    }

    out.push_str("}\n");
    out
}

/// Split a group's tokens wherever the source line changes.
fn split_lines(tokens: &[Token]) -> Vec<&[Token]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for i in 1..tokens.len() {
        if tokens[i].line != tokens[i - 1].line {
            lines.push(&tokens[start..i]);
            start = i;
        }
    }
    if start < tokens.len() {
        lines.push(&tokens[start..]);
    }
    lines
}

fn write_line(out: &mut String, line: &[Token], depth: &mut usize) {
    let mut rest = line;
    if line.first().is_some_and(|t| t.text == "}") {
        *depth = depth.saturating_sub(1);
        rest = &line[1..];
    }

    for _ in 0..=*depth {
        out.push_str(INDENT);
    }
    let words: Vec<String> = line.iter().map(|t| quote(&t.text)).collect();
    out.push_str(&words.join(" "));
    out.push('\n');

    for token in rest {
        match token.text.as_str() {
            "{" => *depth += 1,
            "}" => *depth = depth.saturating_sub(1),
            _ => {}
        }
    }
}

/// Re-quote text that would not survive tokenization as a bare word.
fn quote(text: &str) -> String {
    let needs_quotes = text.is_empty()
        || text.starts_with('#')
        || text.chars().any(|c| c.is_whitespace() || c == '"');
    if needs_quotes {
        format!("\"{}\"", text.replace('"', "\\\""))
    } else {
        text.to_string()
    }
}
