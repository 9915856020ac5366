//! Inline highlight markup for operator text lines.
//!
//! Two syntaxes mark a span to be drawn in brand red: `[[WORD]]` and the
//! single-token shorthand `red:WORD`. Everything else keeps the line's
//! default color. Lines are upper-cased before parsing, so the shorthand
//! marker is matched case-insensitively.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RunColor {
    Blue,
    Red,
}

impl RunColor {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "blue" => Some(RunColor::Blue),
            "red" => Some(RunColor::Red),
            _ => None,
        }
    }
}

/// A contiguous span of text with a single assigned color.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub color: RunColor,
}

const OPEN: &str = "[[";
const CLOSE: &str = "]]";
const RED_PREFIX: &str = "red:";

/// Parse one display line into ordered colored runs.
///
/// Unterminated `[[` is preserved as literal default-colored text and
/// empty `[[]]` segments are dropped. Concatenating the run texts in
/// order reconstructs the input with the markers stripped.
pub fn parse_line(raw: &str, default_color: RunColor) -> Vec<StyledRun> {
    let normalized = normalize_red_prefix(raw);
    let mut runs = Vec::new();
    let mut rest = normalized.as_str();

    loop {
        match rest.find(OPEN) {
            None => {
                push_run(&mut runs, rest, default_color);
                break;
            }
            Some(i) => {
                push_run(&mut runs, &rest[..i], default_color);
                let after = &rest[i + OPEN.len()..];
                match after.find(CLOSE) {
                    None => {
                        // dangling marker stays literal, nothing is dropped
                        push_run(&mut runs, &rest[i..], default_color);
                        break;
                    }
                    Some(j) => {
                        push_run(&mut runs, &after[..j], RunColor::Red);
                        rest = &after[j + CLOSE.len()..];
                    }
                }
            }
        }
    }

    runs
}

fn push_run(runs: &mut Vec<StyledRun>, text: &str, color: RunColor) {
    if text.is_empty() {
        return;
    }
    runs.push(StyledRun {
        text: text.to_string(),
        color,
    });
}

/// Rewrite the single-token `red:WORD` shorthand into bracket syntax.
/// Token scope stops at whitespace; a bare `red:` with no token is kept
/// as literal text.
fn normalize_red_prefix(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(i) = find_red_prefix(rest) {
        out.push_str(&rest[..i]);
        let after = &rest[i + RED_PREFIX.len()..];
        let token_end = after
            .find(|c: char| c.is_whitespace())
            .unwrap_or(after.len());
        if token_end == 0 {
            out.push_str(&rest[i..i + RED_PREFIX.len()]);
        } else {
            out.push_str(OPEN);
            out.push_str(&after[..token_end]);
            out.push_str(CLOSE);
        }
        rest = &after[token_end..];
    }

    out.push_str(rest);
    out
}

/// Locate the next `red:` marker that begins a whitespace-delimited token.
fn find_red_prefix(s: &str) -> Option<usize> {
    let lower = s.to_ascii_lowercase();
    let mut from = 0;
    while let Some(rel) = lower[from..].find(RED_PREFIX) {
        let i = from + rel;
        let at_token_start = s[..i]
            .chars()
            .next_back()
            .map(|c| c.is_whitespace())
            .unwrap_or(true);
        if at_token_start {
            return Some(i);
        }
        from = i + RED_PREFIX.len();
    }
    None
}

/// Display casing applied to every operator line before parsing. Unicode
/// aware so non-ASCII input passes through without panicking.
pub fn uppercase_for_display(s: &str) -> String {
    s.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(runs: &[StyledRun]) -> String {
        runs.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn plain_line_is_one_default_run() {
        let runs = parse_line("SEA VIEW APARTMENT", RunColor::Blue);
        assert_eq!(
            runs,
            vec![StyledRun {
                text: "SEA VIEW APARTMENT".into(),
                color: RunColor::Blue
            }]
        );
    }

    #[test]
    fn empty_line_yields_no_runs() {
        assert!(parse_line("", RunColor::Blue).is_empty());
    }

    #[test]
    fn bracket_highlight_splits_runs() {
        let runs = parse_line("NEW [[EXCLUSIVE]] OFFER", RunColor::Blue);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].color, RunColor::Blue);
        assert_eq!(runs[1], StyledRun { text: "EXCLUSIVE".into(), color: RunColor::Red });
        assert_eq!(runs[2].text, " OFFER");
        assert_eq!(texts(&runs), "NEW EXCLUSIVE OFFER");
    }

    #[test]
    fn highlight_ignores_default_color() {
        let runs = parse_line("[[HOT]]", RunColor::Red);
        assert_eq!(runs, vec![StyledRun { text: "HOT".into(), color: RunColor::Red }]);
        let runs = parse_line("[[HOT]]", RunColor::Blue);
        assert_eq!(runs[0].color, RunColor::Red);
    }

    #[test]
    fn unterminated_marker_stays_literal() {
        let runs = parse_line("PRICE [[DROP", RunColor::Blue);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1], StyledRun { text: "[[DROP".into(), color: RunColor::Blue });
        assert_eq!(texts(&runs), "PRICE [[DROP");
    }

    #[test]
    fn empty_highlight_is_dropped() {
        let runs = parse_line("A[[]]B", RunColor::Blue);
        assert_eq!(texts(&runs), "AB");
        assert!(runs.iter().all(|r| r.color == RunColor::Blue));
    }

    #[test]
    fn red_prefix_matches_bracket_syntax() {
        let a = parse_line("BUY RED:NOW TODAY", RunColor::Blue);
        let b = parse_line("BUY [[NOW]] TODAY", RunColor::Blue);
        assert_eq!(a, b);
    }

    #[test]
    fn red_prefix_scope_stops_at_whitespace() {
        let runs = parse_line("RED:ONE TWO", RunColor::Blue);
        assert_eq!(runs[0], StyledRun { text: "ONE".into(), color: RunColor::Red });
        assert_eq!(runs[1].text, " TWO");
    }

    #[test]
    fn bare_red_prefix_is_literal() {
        let runs = parse_line("RED: NOTHING", RunColor::Blue);
        assert_eq!(texts(&runs), "RED: NOTHING");
        assert!(runs.iter().all(|r| r.color == RunColor::Blue));
    }

    #[test]
    fn red_prefix_only_matches_token_start() {
        let runs = parse_line("SHRED:X", RunColor::Blue);
        assert_eq!(texts(&runs), "SHRED:X");
        assert!(runs.iter().all(|r| r.color == RunColor::Blue));
    }

    #[test]
    fn multiple_highlights_keep_order() {
        let runs = parse_line("[[A]] MID [[B]]", RunColor::Blue);
        let colors: Vec<_> = runs.iter().map(|r| r.color).collect();
        assert_eq!(colors, vec![RunColor::Red, RunColor::Blue, RunColor::Red]);
        assert_eq!(texts(&runs), "A MID B");
    }

    #[test]
    fn non_ascii_passes_through() {
        let up = uppercase_for_display("appartement à Dubaï");
        let runs = parse_line(&up, RunColor::Blue);
        assert_eq!(texts(&runs), "APPARTEMENT À DUBAÏ");
    }
}
