//! Greedy word-wrap over styled tokens.
//!
//! Same first-fit strategy the page simulator has always used: words are appended to
//! the current line until the next one would cross `max_width`, then a new line starts.
//! A single word wider than the line is left on a line of its own (it overflows
//! horizontally, and `LaidLine::width` reports it).

use crate::layout::font_metrics::{get_metrics, FontFace};
use crate::layout::markup::{TextRun, Token};

/// One laid-out line, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidLine {
    /// Runs in drawing order, adjacent same-style runs already merged.
    pub runs: Vec<TextRun>,
    /// Natural width of the line in points.
    pub width: f32,
}

/// Width of a word in points, honouring per-run emphasis.
pub fn word_width(runs: &[TextRun], face: FontFace, size_pt: f32) -> f32 {
    runs.iter()
        .map(|run| {
            get_metrics(face.with_emphasis(run.bold, run.italic)).measure_pt(&run.text, size_pt)
        })
        .sum()
}

/// Breaks `tokens` into lines no wider than `max_width` points where possible.
///
/// An empty token list returns no lines. Consecutive `<br/>` produce empty lines.
pub fn break_lines(tokens: &[Token], face: FontFace, size_pt: f32, max_width: f32) -> Vec<LaidLine> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let space_w = get_metrics(face).space_width_pt(size_pt);
    let mut lines: Vec<LaidLine> = Vec::new();
    let mut current = LaidLine {
        runs: Vec::new(),
        width: 0.0,
    };

    for token in tokens {
        match token {
            Token::LineBreak => {
                lines.push(std::mem::replace(
                    &mut current,
                    LaidLine {
                        runs: Vec::new(),
                        width: 0.0,
                    },
                ));
            }
            Token::Word(runs) => {
                let word_w = word_width(runs, face, size_pt);
                let first_on_line = current.runs.is_empty();
                if !first_on_line && current.width + space_w + word_w > max_width {
                    // Current line is full; start the next one with this word.
                    lines.push(std::mem::replace(
                        &mut current,
                        LaidLine {
                            runs: Vec::new(),
                            width: 0.0,
                        },
                    ));
                    append_runs(&mut current.runs, runs, false);
                    current.width = word_w;
                } else {
                    append_runs(&mut current.runs, runs, !first_on_line);
                    current.width += if first_on_line { word_w } else { space_w + word_w };
                }
            }
        }
    }
    lines.push(current);
    lines
}

fn append_runs(line: &mut Vec<TextRun>, runs: &[TextRun], leading_space: bool) {
    for (i, run) in runs.iter().enumerate() {
        let prefix = if leading_space && i == 0 { " " } else { "" };
        match line.last_mut() {
            Some(last) if last.bold == run.bold && last.italic == run.italic => {
                last.text.push_str(prefix);
                last.text.push_str(&run.text);
            }
            _ => line.push(TextRun {
                text: format!("{prefix}{}", run.text),
                bold: run.bold,
                italic: run.italic,
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::markup::tokenize;

    #[test]
    fn test_empty_returns_no_lines() {
        assert!(break_lines(&[], FontFace::Helvetica, 10.0, 100.0).is_empty());
    }

    #[test]
    fn test_short_text_is_one_line() {
        let lines = break_lines(&tokenize("Rust"), FontFace::Helvetica, 10.0, 500.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].runs[0].text, "Rust");
        assert!(lines[0].width < 500.0);
    }

    #[test]
    fn test_long_text_wraps() {
        let text = "word ".repeat(60);
        let lines = break_lines(&tokenize(&text), FontFace::Helvetica, 10.0, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.width <= 200.0, "line width {} exceeds max", line.width);
        }
    }

    #[test]
    fn test_oversized_word_stays_on_own_line() {
        let lines = break_lines(
            &tokenize("Supercalifragilistic"),
            FontFace::Helvetica,
            10.0,
            20.0,
        );
        assert_eq!(lines.len(), 1);
        assert!(lines[0].width > 20.0);
    }

    #[test]
    fn test_styled_runs_merge_with_spaces() {
        let lines = break_lines(
            &tokenize("<b>Languages:</b> Python, Go"),
            FontFace::Helvetica,
            10.0,
            500.0,
        );
        assert_eq!(lines.len(), 1);
        let texts: Vec<&str> = lines[0].runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Languages:", " Python, Go"]);
        assert!(lines[0].runs[0].bold);
    }

    #[test]
    fn test_width_matches_sum_of_parts() {
        let lines = break_lines(&tokenize("ab cd"), FontFace::Helvetica, 10.0, 500.0);
        let metrics = get_metrics(FontFace::Helvetica);
        let expected = metrics.measure_pt("ab cd", 10.0);
        assert!((lines[0].width - expected).abs() < 1e-3);
    }

    #[test]
    fn test_hard_break_forces_new_line() {
        let lines = break_lines(&tokenize("a<br/>b"), FontFace::Helvetica, 10.0, 500.0);
        assert_eq!(lines.len(), 2);
    }
}
