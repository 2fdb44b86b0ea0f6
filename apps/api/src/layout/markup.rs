//! Inline markup understood by the renderer.
//!
//! Generated bullets carry `<b>…</b>` emphasis and skill lines are measured as
//! `<b>Category:</b> a, b, c`, so the same tokenizer feeds both `measure` and `render`.
//! Supported: `<b>`/`<strong>`, `<i>`/`<em>`, `<br/>`, and the entities
//! `&amp; &lt; &gt; &quot; &#39; &apos; &nbsp;` plus numeric `&#NNN;`. Unknown tags are dropped.

/// A run of text drawn in a single emphasis state.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A breakable unit. A word may switch emphasis mid-way (`<b>API</b>s`).
    Word(Vec<TextRun>),
    /// Hard line break from `<br/>`.
    LineBreak,
}

/// Escapes text so it survives a round trip through `tokenize` unchanged.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decodes a single entity body (the part between `&` and `;`).
pub fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn flush_run(run: &mut String, word: &mut Vec<TextRun>, bold: bool, italic: bool) {
    if run.is_empty() {
        return;
    }
    let same_style = word
        .last()
        .is_some_and(|last| last.bold == bold && last.italic == italic);
    if same_style {
        if let Some(last) = word.last_mut() {
            last.text.push_str(run);
        }
        run.clear();
    } else {
        word.push(TextRun {
            text: std::mem::take(run),
            bold,
            italic,
        });
    }
}

/// Splits markup into words and hard breaks. Whitespace separates words and is
/// otherwise discarded; the line breaker re-inserts single spaces.
pub fn tokenize(markup: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word: Vec<TextRun> = Vec::new();
    let mut run = String::new();
    let mut bold_depth = 0u32;
    let mut italic_depth = 0u32;

    let mut chars = markup.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        let bold = bold_depth > 0;
        let italic = italic_depth > 0;
        match c {
            '<' => {
                let Some(close) = markup[idx..].find('>') else {
                    run.push(c);
                    continue;
                };
                let tag = markup[idx + 1..idx + close].trim();
                let (closing, name) = match tag.strip_prefix('/') {
                    Some(rest) => (true, rest.trim()),
                    None => (false, tag.trim_end_matches('/').trim()),
                };
                let name = name
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                flush_run(&mut run, &mut word, bold, italic);
                match (name.as_str(), closing) {
                    ("b" | "strong", false) => bold_depth += 1,
                    ("b" | "strong", true) => bold_depth = bold_depth.saturating_sub(1),
                    ("i" | "em", false) => italic_depth += 1,
                    ("i" | "em", true) => italic_depth = italic_depth.saturating_sub(1),
                    ("br", _) => {
                        if !word.is_empty() {
                            tokens.push(Token::Word(std::mem::take(&mut word)));
                        }
                        tokens.push(Token::LineBreak);
                    }
                    _ => {}
                }
                while chars.peek().is_some_and(|(i, _)| *i <= idx + close) {
                    chars.next();
                }
            }
            '&' => {
                let decoded = markup[idx + 1..]
                    .find(';')
                    .filter(|end| *end <= 8)
                    .and_then(|end| {
                        decode_entity(&markup[idx + 1..idx + 1 + end]).map(|ch| (ch, end))
                    });
                match decoded {
                    Some((ch, end)) => {
                        run.push(ch);
                        while chars.peek().is_some_and(|(i, _)| *i <= idx + 1 + end) {
                            chars.next();
                        }
                    }
                    None => run.push('&'),
                }
            }
            c if c.is_whitespace() && c != '\u{a0}' => {
                flush_run(&mut run, &mut word, bold, italic);
                if !word.is_empty() {
                    tokens.push(Token::Word(std::mem::take(&mut word)));
                }
            }
            c => run.push(c),
        }
    }
    flush_run(&mut run, &mut word, bold_depth > 0, italic_depth > 0);
    if !word.is_empty() {
        tokens.push(Token::Word(word));
    }
    tokens
}

/// Returns the visible text with markup removed and words joined by single spaces.
pub fn plain_text(markup: &str) -> String {
    let mut lines: Vec<String> = vec![String::new()];
    for token in tokenize(markup) {
        match token {
            Token::Word(runs) => {
                if let Some(line) = lines.last_mut() {
                    if !line.is_empty() {
                        line.push(' ');
                    }
                    for run in runs {
                        line.push_str(&run.text);
                    }
                }
            }
            Token::LineBreak => lines.push(String::new()),
        }
    }
    lines.join("\n")
}
