//! Line scanning cursor handed to tokenizers.

use regex::Regex;

use crate::error::Result;

/// Default visual width of a tab stop.
pub const DEFAULT_TAB_SIZE: usize = 4;

/// Predicate over a single character.
///
/// Implemented for exact characters, compiled regexes (tested against the
/// character alone) and arbitrary closures.
pub trait CharMatcher {
    fn matches(&self, ch: char) -> bool;
}

impl CharMatcher for char {
    fn matches(&self, ch: char) -> bool {
        *self == ch
    }
}

impl CharMatcher for &Regex {
    fn matches(&self, ch: char) -> bool {
        let mut buf = [0u8; 4];
        self.is_match(ch.encode_utf8(&mut buf))
    }
}

impl<F: Fn(char) -> bool> CharMatcher for F {
    fn matches(&self, ch: char) -> bool {
        self(ch)
    }
}

/// Something [`ScanCursor::matches`] can test at the current position.
#[derive(Debug, Clone, Copy)]
pub enum Pattern<'p> {
    Literal(&'p str),
    Regex(&'p Regex),
}

impl<'p> From<&'p str> for Pattern<'p> {
    fn from(literal: &'p str) -> Self {
        Pattern::Literal(literal)
    }
}

impl<'p> From<&'p Regex> for Pattern<'p> {
    fn from(regex: &'p Regex) -> Self {
        Pattern::Regex(regex)
    }
}

/// Compiles a pattern source for use with [`ScanCursor::matches`].
///
/// # Errors
///
/// Returns `ModeError::MalformedPattern` if the source is not a valid regex.
pub fn compile_pattern(source: &str) -> Result<Regex> {
    Ok(Regex::new(source)?)
}

/// Successful match anchored at the cursor position.
///
/// Borrows from the scanned line, not from the cursor, so the cursor stays
/// usable while the match is alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'a> {
    text: &'a str,
    groups: Vec<Option<&'a str>>,
}

impl<'a> Match<'a> {
    /// Full matched text.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Capture group by index, group 0 being the whole match.
    ///
    /// Literal matches only carry group 0.
    pub fn group(&self, index: usize) -> Option<&'a str> {
        if index == 0 {
            return Some(self.text);
        }
        self.groups.get(index - 1).copied().flatten()
    }
}

/// Mutable position over one line of text.
///
/// Positions are byte offsets that always sit on character boundaries.
/// `token_start <= position <= text.len()` holds after every operation.
/// Only the runner (and composing modes inside this crate) move the token
/// start.
#[derive(Debug, Clone)]
pub struct ScanCursor<'a> {
    text: &'a str,
    position: usize,
    token_start: usize,
    line_start: usize,
    tab_size: usize,
}

impl<'a> ScanCursor<'a> {
    /// Creates a cursor at the start of `text`.
    ///
    /// # Arguments
    ///
    /// * `text`: One line, without its line terminator
    /// * `tab_size`: Tab stop width for [`indent_column`](Self::indent_column),
    ///   raised to 1 when zero
    pub fn new(text: &'a str, tab_size: usize) -> Self {
        Self {
            text,
            position: 0,
            token_start: 0,
            line_start: 0,
            tab_size: tab_size.max(1),
        }
    }

    /// Whole line being scanned.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Byte offset where the pending token begins.
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.text.len()
    }

    pub fn at_line_start(&self) -> bool {
        self.position == self.line_start
    }

    /// Character under the cursor without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes and returns the character under the cursor.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    /// Consumes the current character if `matcher` accepts it.
    pub fn eat(&mut self, matcher: impl CharMatcher) -> Option<char> {
        let ch = self.peek()?;
        if matcher.matches(ch) {
            self.position += ch.len_utf8();
            Some(ch)
        } else {
            None
        }
    }

    /// Consumes characters while `matcher` accepts them.
    ///
    /// Returns true if at least one character was consumed.
    pub fn eat_while(&mut self, matcher: impl CharMatcher) -> bool {
        let start = self.position;
        while let Some(ch) = self.peek() {
            if !matcher.matches(ch) {
                break;
            }
            self.position += ch.len_utf8();
        }
        self.position > start
    }

    pub fn eat_whitespace(&mut self) -> bool {
        self.eat_while(char::is_whitespace)
    }

    pub fn skip_to_end(&mut self) {
        self.position = self.text.len();
    }

    /// Moves to the next occurrence of `ch` without consuming it.
    ///
    /// Leaves the cursor in place and returns false when `ch` does not occur
    /// in the rest of the line.
    pub fn skip_to_char(&mut self, ch: char) -> bool {
        match self.rest().find(ch) {
            Some(offset) => {
                self.position += offset;
                true
            }
            None => false,
        }
    }

    /// Steps back `n` characters, stopping at the token start.
    pub fn retreat(&mut self, n: usize) {
        let floor = self.token_start;
        let mut position = self.position;
        for (offset, _) in self.text[floor..self.position].char_indices().rev().take(n) {
            position = floor + offset;
        }
        self.position = position;
    }

    /// Characters between the line start and the cursor.
    pub fn column(&self) -> usize {
        self.text[self.line_start..self.position].chars().count()
    }

    /// Visual width of the leading whitespace, tabs expanded to the next stop.
    pub fn indent_column(&self) -> usize {
        let mut width = 0;
        for ch in self.text.chars() {
            match ch {
                '\t' => width += self.tab_size - width % self.tab_size,
                c if c.is_whitespace() => width += 1,
                _ => break,
            }
        }
        width
    }

    /// Matches `pattern` at the cursor and consumes it on success.
    pub fn matches<'p>(&mut self, pattern: impl Into<Pattern<'p>>) -> Option<Match<'a>> {
        self.matches_with(pattern, true, false)
    }

    /// Matches `pattern` anchored at the cursor.
    ///
    /// A failed match never moves the cursor.
    ///
    /// # Arguments
    ///
    /// * `pattern`: Literal string or compiled regex; a regex only matches
    ///   when its match starts exactly at the cursor
    /// * `consume`: Advance past the matched text on success
    /// * `case_insensitive`: Compare literals after Unicode lower-casing;
    ///   regexes carry their own flags
    ///
    /// # Returns
    ///
    /// Matched text and, for regexes, its capture groups
    pub fn matches_with<'p>(
        &mut self,
        pattern: impl Into<Pattern<'p>>,
        consume: bool,
        case_insensitive: bool,
    ) -> Option<Match<'a>> {
        let rest = self.rest();
        let matched = match pattern.into() {
            Pattern::Literal(literal) => {
                let end = rest
                    .char_indices()
                    .nth(literal.chars().count())
                    .map_or(rest.len(), |(offset, _)| offset);
                let candidate = &rest[..end];
                let equal = if case_insensitive {
                    candidate.to_lowercase() == literal.to_lowercase()
                } else {
                    candidate == literal
                };
                if !equal {
                    return None;
                }
                Match {
                    text: candidate,
                    groups: Vec::new(),
                }
            }
            Pattern::Regex(regex) => {
                let captures = regex.captures(rest)?;
                let whole = captures.get(0)?;
                if whole.start() != 0 {
                    return None;
                }
                Match {
                    text: whole.as_str(),
                    groups: captures
                        .iter()
                        .skip(1)
                        .map(|group| group.map(|m| m.as_str()))
                        .collect(),
                }
            }
        };

        if consume {
            self.position += matched.text.len();
        }
        Some(matched)
    }

    /// Text of the pending token.
    pub fn current(&self) -> &'a str {
        &self.text[self.token_start..self.position]
    }

    /// Starts a new token at the cursor.
    pub(crate) fn begin_token(&mut self) {
        self.token_start = self.position;
    }

    /// Repositions the cursor, clamped to `[token_start, len]` and snapped
    /// back to a character boundary.
    pub(crate) fn set_position(&mut self, position: usize) {
        let mut position = position.clamp(self.token_start, self.text.len());
        while !self.text.is_char_boundary(position) {
            position -= 1;
        }
        self.position = position;
    }

    fn rest(&self) -> &'a str {
        &self.text[self.position..]
    }
}
