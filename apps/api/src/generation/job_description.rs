//! Job description cleanup: the stored HTML becomes plain text lines for the prompt.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::layout::markup::decode_entity;

static HIDDEN_BLOCK_RE: OnceLock<Regex> = OnceLock::new();
static LINE_BREAK_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();
static ENTITY_RE: OnceLock<Regex> = OnceLock::new();

fn hidden_block_re() -> &'static Regex {
    HIDDEN_BLOCK_RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style|head|noscript)\b[^>]*>.*?</(script|style|head|noscript)\s*>")
            .expect("valid regex")
    })
}

fn line_break_re() -> &'static Regex {
    LINE_BREAK_RE.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>|</?(p|div|li|ul|ol|h[1-6]|tr|table|section|article|header|footer)\b[^>]*>")
            .expect("valid regex")
    })
}

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"))
}

fn entity_re() -> &'static Regex {
    ENTITY_RE.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid regex")
    })
}

/// Tags stripped, entities decoded, one non-empty trimmed line per block.
pub fn html_to_text(html: &str) -> String {
    let text = hidden_block_re().replace_all(html, "");
    let text = line_break_re().replace_all(&text, "\n");
    let text = tag_re().replace_all(&text, "");
    let text = entity_re().replace_all(&text, |caps: &Captures<'_>| {
        decode_entity(&caps[1])
            .map(|c| c.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
