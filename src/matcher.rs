//! Shortcode tag matcher: tokenizes bracketed directive tags and pairs them.
//!
//! Tag grammar, in order of recognition:
//!
//! - `\[` and `\]` are literal two-character sequences, never delimiters.
//! - `[/name]` closes a pair.
//! - `[name attrs /]` is self-closing.
//! - `[name attrs]` opens a pair (or stands alone if no close follows).
//!
//! The attribute payload is opaque. It must start with whitespace, cannot
//! contain an unescaped `[` or `]`, and cannot end in a backslash, so
//! `[test2]` is never an occurrence of `test` and `\]` never closes a tag.
//!
//! Pairing uses an explicit stack instead of recursive patterns. A pair's
//! content may hold plain text and complete nested matches of the targeted
//! set; anything else (a non-targeted tag, an unbalanced targeted token)
//! blocks every pair that is still open around it.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::types::{MatchSpan, RegisteredNames};

/// One escaped bracket or one tag token per match. Only tag matches carry `name`.
#[allow(clippy::expect_used, reason = "literal pattern, checked by every tokenizer test")]
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(
        r"\\[\[\]]|\[(?P<close>/)?(?P<name>[A-Za-z0-9_-]+)(?P<attrs>(?:\s(?:\\[\[\]]|\\+[^\[\]\\]|[^\[\]\\])*?)?)(?P<sc>/)?\]",
    )
    .expect("valid regex");
});

/// Which directives a matching pass targets.
#[derive(Debug, Clone, Copy)]
pub enum Selector<'a> {
    /// Exactly one directive name, registered or not.
    Named(&'a str),
    /// Every directive whose name is absent from the registry snapshot.
    Unregistered(&'a RegisteredNames),
}

impl Selector<'_> {
    /// Whether tokens named `name` belong to the targeted set.
    pub fn targets(&self, name: &str) -> bool {
        return match self {
            Selector::Named(target) => *target == name,
            Selector::Unregistered(registered) => !registered.contains(name),
        };
    }
}

/// Shape of a tag token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `[/name]`
    Close,
    /// `[name ...]`
    Open,
    /// `[name .../]`
    SelfClosing,
}

/// A single tag token located in a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token shape.
    pub kind: TokenKind,
    /// Directive name.
    pub name: &'a str,
    /// Byte range from `[` through `]`.
    pub range: Range<usize>,
}

impl<'a> Token<'a> {
    /// The token alone as a match span.
    fn span(&self) -> MatchSpan<'a> {
        return MatchSpan { name: self.name, range: self.range.clone() };
    }
}

/// A targeted tag waiting for its close.
#[derive(Debug)]
struct Frame<'a> {
    /// Complete matches found inside this frame so far.
    inner: Vec<MatchSpan<'a>>,
    /// The token that opened the frame.
    opener: Token<'a>,
}

impl<'a> Frame<'a> {
    /// Matches that survive when this frame never closes. A self-closing
    /// opener stands on its own; a plain opener contributes nothing.
    fn into_standalone(self) -> Vec<MatchSpan<'a>> {
        let mut spans = Vec::with_capacity(self.inner.len().saturating_add(1));
        if self.opener.kind == TokenKind::SelfClosing {
            spans.push(self.opener.span());
        }
        spans.extend(self.inner);
        return spans;
    }
}

/// Depth-counting state for one matching pass.
#[derive(Debug, Default)]
struct Pairing<'a> {
    /// Complete top-level matches, in completion order.
    matched: Vec<MatchSpan<'a>>,
    /// Targeted tags still waiting for a close, innermost last.
    stack: Vec<Frame<'a>>,
}

impl<'a> Pairing<'a> {
    /// Every open frame is invalid: keep only what stands on its own.
    fn abandon_open_frames(&mut self) {
        for frame in self.stack.drain(..) {
            self.matched.extend(frame.into_standalone());
        }
    }

    /// Handle a targeted closing token.
    ///
    /// The nearest plain opener takes the close when the names agree, and
    /// any self-closing frames above it are complete on their own. Otherwise
    /// the close may pair with a same-name self-closing frame.
    fn close(&mut self, token: &Token<'a>) {
        let closes_opener = self
            .stack
            .iter()
            .rev()
            .find(|frame| return frame.opener.kind == TokenKind::Open)
            .is_some_and(|frame| return frame.opener.name == token.name);

        while self.stack.last().is_some_and(|top| {
            return top.opener.kind == TokenKind::SelfClosing && (closes_opener || top.opener.name != token.name);
        }) {
            if let Some(frame) = self.stack.pop() {
                self.settle(frame.into_standalone());
            }
        }

        let Some(frame) = self.stack.pop() else {
            return;
        };

        if frame.opener.name == token.name {
            let span = MatchSpan { name: frame.opener.name, range: frame.opener.range.start..token.range.end };
            self.settle(vec![span]);
        } else {
            self.stack.push(frame);
            self.abandon_open_frames();
        }
    }

    /// Advance the state machine by one token.
    fn feed(&mut self, token: Token<'a>, selector: &Selector<'_>) {
        if !selector.targets(token.name) {
            self.abandon_open_frames();
            return;
        }

        match token.kind {
            TokenKind::Close => self.close(&token),
            TokenKind::Open | TokenKind::SelfClosing => {
                self.stack.push(Frame { inner: Vec::new(), opener: token });
            },
        }
    }

    /// Close out the pass and return sorted spans.
    fn finish(mut self) -> Vec<MatchSpan<'a>> {
        self.abandon_open_frames();
        self.matched.sort_by_key(|span| return span.range.start);
        return self.matched;
    }

    /// Record complete matches in the enclosing frame, or at top level.
    fn settle(&mut self, spans: Vec<MatchSpan<'a>>) {
        match self.stack.last_mut() {
            Some(parent) => parent.inner.extend(spans),
            None => self.matched.extend(spans),
        }
    }
}

/// Split a body into tag tokens, skipping escaped brackets.
pub fn tokenize(body: &str) -> Vec<Token<'_>> {
    return TAG_PATTERN.captures_iter(body).filter_map(|cap| return token_from_capture(&cap)).collect();
}

/// Convert one pattern match into a token. Escapes and closing tokens with
/// a payload yield `None`.
fn token_from_capture<'a>(cap: &Captures<'a>) -> Option<Token<'a>> {
    let name = cap.name("name")?;
    let whole = cap.get(0)?;
    let is_close = cap.name("close").is_some();
    let is_self_closing = cap.name("sc").is_some();
    let has_attrs = cap.name("attrs").is_some_and(|m| return !m.is_empty());

    let kind = match (is_close, is_self_closing) {
        (false, false) => TokenKind::Open,
        (false, true) => TokenKind::SelfClosing,
        (true, false) if !has_attrs => TokenKind::Close,
        (true, _) => return None,
    };

    return Some(Token { kind, name: name.as_str(), range: whole.range() });
}

/// Find every complete occurrence of the targeted directives.
///
/// Self-closing tokens and balanced pairs both count, with nested pairs
/// folded into their outermost span. Spans are sorted by start and never
/// overlap.
pub fn find_matches<'a>(body: &'a str, selector: &Selector<'_>) -> Vec<MatchSpan<'a>> {
    let mut pairing = Pairing::default();
    for token in tokenize(body) {
        pairing.feed(token, selector);
    }
    return pairing.finish();
}

/// Every targeted token, paired or not.
///
/// Used to sweep partial tags once no complete occurrence remains.
pub fn find_leftovers<'a>(body: &'a str, selector: &Selector<'_>) -> Vec<MatchSpan<'a>> {
    return tokenize(body)
        .iter()
        .filter(|token| return selector.targets(token.name))
        .map(Token::span)
        .collect();
}

/// Every opening token (`[name ...]` or `[name .../]`) in body order.
pub fn find_openings(body: &str) -> Vec<MatchSpan<'_>> {
    return tokenize(body)
        .iter()
        .filter(|token| return token.kind != TokenKind::Close)
        .map(Token::span)
        .collect();
}
