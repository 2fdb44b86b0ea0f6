//! lopdf-backed document renderer.
//!
//! Draws with the non-embedded base-14 Helvetica family (plus Courier) in WinAnsi
//! encoding, so the static AFM tables in `font_metrics` describe the glyphs exactly and
//! `measure` agrees with what `render` draws.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use tracing::debug;

use crate::errors::AppError;
use crate::layout::fit::skill_line_markup;
use crate::layout::font_metrics::{get_metrics, FontFace};
use crate::layout::line_break::{break_lines, LaidLine};
use crate::layout::markup::{escape_text, tokenize, TextRun};
use crate::layout::renderer::{DocumentRenderer, SINGLE_LINE_TOLERANCE};
use crate::models::resume::{Contact, ResumeRecord};
use crate::variables::{Alignment, TextStyle, VariableSet};

const BULLET: &str = "\u{2022}";
/// Horizontal gap between the left and right column of a two-column row.
const COLUMN_GAP: f32 = 8.0;
const CONTACT_SEPARATOR: &str = "  |  ";

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl DocumentRenderer for PdfRenderer {
    fn measure(&self, fragment: &str, style: &TextStyle, max_width: f32) -> bool {
        if !(style.size > 0.0 && style.leading > 0.0 && max_width > 0.0) {
            return false;
        }
        let lines = break_lines(&tokenize(fragment), style.font, style.size, max_width);
        let height = lines.len() as f32 * style.leading;
        height <= style.leading * SINGLE_LINE_TOLERANCE
            && lines.iter().all(|line| line.width <= max_width)
    }

    fn usable_width(&self, vars: &VariableSet) -> f32 {
        vars.page.width - vars.page.margin_left - vars.page.margin_right
    }

    fn render(&self, record: &ResumeRecord, vars: &VariableSet) -> Result<Vec<u8>, AppError> {
        let usable_height = vars.page.height - vars.page.margin_top - vars.page.margin_bottom;
        if self.usable_width(vars) <= 0.0 || usable_height <= 0.0 {
            return Err(AppError::RenderFailure(
                "page margins leave no room for content".to_string(),
            ));
        }
        let mut writer = PageWriter::new(vars);
        draw_record(&mut writer, record, vars);
        let pages = writer.finish();
        debug!("Rendered resume for '{}' onto {} page(s)", record.name, pages.len());
        encode_document(pages, vars)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Record layout
// ────────────────────────────────────────────────────────────────────────────

fn draw_record(w: &mut PageWriter, record: &ResumeRecord, vars: &VariableSet) {
    let styles = &vars.styles;

    w.paragraph(&escape_text(&record.name), &styles.name);
    let contact = contact_line(&record.contact);
    if !contact.is_empty() {
        w.paragraph(&escape_text(&contact), &styles.contact);
    }

    if let Some(summary) = &record.summary {
        w.section_header("Summary", vars);
        w.paragraph(summary, &styles.body);
    }

    if let Some(education) = &record.education {
        w.section_header("Education", vars);
        for (i, entry) in education.iter().enumerate() {
            if i > 0 {
                w.gap(vars.spacing.entry_gap);
            }
            w.two_column(
                &escape_text(&entry.institution),
                entry.location.as_deref().unwrap_or_default(),
                &styles.institution,
            );
            let mut degree = escape_text(&entry.degree);
            if let Some(gpa) = &entry.gpa {
                degree.push_str(&format!(" (GPA: {})", escape_text(gpa)));
            }
            w.two_column(
                &format!("<i>{degree}</i>"),
                entry.dates.as_deref().unwrap_or_default(),
                &styles.job_details,
            );
            if let Some(details) = &entry.details {
                w.paragraph(details, &styles.body);
            }
        }
    }

    if let Some(skills) = &record.skills {
        w.section_header("Technical Skills", vars);
        for block in skills {
            w.paragraph(&skill_line_markup(&block.category, &block.items), &styles.skills);
        }
    }

    if let Some(experience) = &record.experience {
        w.section_header("Professional Experience", vars);
        for (i, entry) in experience.iter().enumerate() {
            if i > 0 {
                w.gap(vars.spacing.entry_gap);
            }
            w.two_column(
                &escape_text(&entry.company),
                entry.location.as_deref().unwrap_or_default(),
                &styles.job_title,
            );
            w.two_column(
                &format!("<i>{}</i>", escape_text(&entry.title)),
                entry.dates.as_deref().unwrap_or_default(),
                &styles.job_details,
            );
            for bullet in &entry.bullets {
                w.bullet(bullet, &styles.bullet);
            }
        }
    }

    if let Some(projects) = &record.projects {
        w.section_header("Projects", vars);
        for (i, project) in projects.iter().enumerate() {
            if i > 0 {
                w.gap(vars.spacing.entry_gap);
            }
            w.two_column(
                &escape_text(&project.title),
                project.dates.as_deref().unwrap_or_default(),
                &styles.job_title,
            );
            for bullet in &project.bullets {
                w.bullet(bullet, &styles.bullet);
            }
        }
    }

    if let Some(certifications) = &record.certifications {
        w.section_header("Certifications", vars);
        let nested = TextStyle {
            left_indent: styles.bullet.left_indent * 2.0,
            ..styles.bullet.clone()
        };
        for cert in certifications {
            w.bullet(&format!("<b>{}</b>", escape_text(&cert.name)), &styles.bullet);
            for bullet in &cert.bullets {
                w.bullet(bullet, &nested);
            }
        }
    }
}

fn contact_line(contact: &Contact) -> String {
    [
        &contact.email,
        &contact.phone,
        &contact.location,
        &contact.linkedin,
        &contact.github,
        &contact.medium,
        &contact.website,
    ]
    .into_iter()
    .flatten()
    .map(|s| s.trim())
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(CONTACT_SEPARATOR)
}

// ────────────────────────────────────────────────────────────────────────────
// Page writer
// ────────────────────────────────────────────────────────────────────────────

/// Cursor-based writer. `y` is the top of the next line in PDF user space.
struct PageWriter<'a> {
    vars: &'a VariableSet,
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: f32,
}

impl<'a> PageWriter<'a> {
    fn new(vars: &'a VariableSet) -> Self {
        Self {
            vars,
            pages: Vec::new(),
            ops: Vec::new(),
            y: vars.page.height - vars.page.margin_top,
        }
    }

    fn left(&self) -> f32 {
        self.vars.page.margin_left
    }

    fn right(&self) -> f32 {
        self.vars.page.width - self.vars.page.margin_right
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.y = self.vars.page.height - self.vars.page.margin_top;
    }

    /// Starts a new page unless `height` more points fit above the bottom margin.
    /// A fresh page always accepts the block, even if it is taller than the page.
    fn reserve(&mut self, height: f32) {
        let fresh_page = self.ops.is_empty();
        if !fresh_page && self.y - height < self.vars.page.margin_bottom {
            self.new_page();
        }
    }

    fn gap(&mut self, points: f32) {
        self.y -= points;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.ops);
        }
        self.pages
    }

    fn paragraph(&mut self, markup: &str, style: &TextStyle) {
        let x = self.left() + style.left_indent;
        let width = self.right() - x;
        let lines = break_lines(&tokenize(markup), style.font, style.size, width);
        self.y -= style.space_before;
        for line in &lines {
            self.reserve(style.leading);
            let x = match style.alignment {
                Alignment::Left => x,
                Alignment::Center => x + (width - line.width).max(0.0) / 2.0,
                Alignment::Right => x + (width - line.width).max(0.0),
            };
            self.draw_line(line, style, x);
            self.y -= style.leading;
        }
        self.y -= style.space_after;
    }

    /// Left column wraps if needed; the right column is a single plain-text line
    /// right-aligned against the margin on the first row.
    fn two_column(&mut self, left_markup: &str, right_text: &str, style: &TextStyle) {
        let right_runs = tokenize(&escape_text(right_text));
        let right_line = break_lines(&right_runs, style.font, style.size, f32::MAX)
            .into_iter()
            .next();
        let right_width = right_line.as_ref().map_or(0.0, |line| line.width);

        let x = self.left() + style.left_indent;
        let left_width = (self.right() - x - right_width - COLUMN_GAP).max(style.size);
        let lines = break_lines(&tokenize(left_markup), style.font, style.size, left_width);

        self.y -= style.space_before;
        self.reserve(style.leading * lines.len().max(1) as f32);
        for (i, line) in lines.iter().enumerate() {
            self.draw_line(line, style, x);
            if i == 0 {
                if let Some(right) = &right_line {
                    self.draw_line(right, style, self.right() - right.width);
                }
            }
            self.y -= style.leading;
        }
        if lines.is_empty() {
            if let Some(right) = &right_line {
                self.draw_line(right, style, self.right() - right.width);
                self.y -= style.leading;
            }
        }
        self.y -= style.space_after;
    }

    fn bullet(&mut self, markup: &str, style: &TextStyle) {
        let text_x = self.left() + style.left_indent;
        let width = self.right() - text_x;
        let lines = break_lines(&tokenize(markup), style.font, style.size, width);
        let marker_width = get_metrics(style.font).measure_pt(BULLET, style.size);
        let marker_x = (text_x - marker_width - style.size * 0.5).max(self.left());

        self.y -= style.space_before;
        for (i, line) in lines.iter().enumerate() {
            self.reserve(style.leading);
            if i == 0 {
                let marker = LaidLine {
                    runs: vec![TextRun {
                        text: BULLET.to_string(),
                        bold: false,
                        italic: false,
                    }],
                    width: marker_width,
                };
                self.draw_line(&marker, style, marker_x);
            }
            self.draw_line(line, style, text_x);
            self.y -= style.leading;
        }
        self.y -= style.space_after;
    }

    fn section_header(&mut self, title: &str, vars: &VariableSet) {
        let style = &vars.styles.section;
        let rule = &vars.section_rule;
        // Keep the header with at least one line of the section body.
        self.y -= style.space_before;
        self.reserve(style.leading + rule.space_after + vars.styles.body.leading);
        let lines = break_lines(
            &tokenize(&escape_text(&title.to_uppercase())),
            style.font,
            style.size,
            self.right() - self.left(),
        );
        for line in &lines {
            self.draw_line(line, style, self.left() + style.left_indent);
            self.y -= style.leading;
        }
        let rule_y = self.y + style.leading - style.size - 2.0;
        if rule.thickness > 0.0 {
            self.ops.extend([
                Operation::new("q", vec![]),
                Operation::new("w", vec![rule.thickness.into()]),
                Operation::new("m", vec![self.left().into(), rule_y.into()]),
                Operation::new("l", vec![self.right().into(), rule_y.into()]),
                Operation::new("S", vec![]),
                Operation::new("Q", vec![]),
            ]);
        }
        self.y -= rule.space_after;
        self.y -= style.space_after;
    }

    /// Emits one text object; the baseline sits one font size below the cursor.
    fn draw_line(&mut self, line: &LaidLine, style: &TextStyle, x: f32) {
        if line.runs.is_empty() {
            return;
        }
        let baseline = self.y - style.size;
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new("Td", vec![x.into(), baseline.into()]));
        for run in &line.runs {
            let face = style.font.with_emphasis(run.bold, run.italic);
            self.ops.push(Operation::new(
                "Tf",
                vec![face.resource_name().into(), style.size.into()],
            ));
            self.ops.push(Operation::new(
                "Tj",
                vec![Object::String(to_win_ansi(&run.text), StringFormat::Literal)],
            ));
        }
        self.ops.push(Operation::new("ET", vec![]));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Encoding
// ────────────────────────────────────────────────────────────────────────────

fn encode_document(pages: Vec<Vec<Operation>>, vars: &VariableSet) -> Result<Vec<u8>, AppError> {
    let render_err = |e: lopdf::Error| AppError::RenderFailure(e.to_string());

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for face in FontFace::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }.encode().map_err(render_err)?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                vars.page.width.into(),
                vars.page.height.into(),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| AppError::RenderFailure(e.to_string()))?;
    Ok(bytes)
}

/// Maps text to WinAnsiEncoding bytes. Unmappable characters become `?`.
fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '\u{20ac}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            _ => b'?',
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{ExperienceEntry, ProjectEntry, SkillBlock};

    fn sample_record() -> ResumeRecord {
        ResumeRecord {
            name: "Ada Lovelace".to_string(),
            contact: Contact {
                email: Some("ada@example.com".to_string()),
                location: Some("London".to_string()),
                ..Default::default()
            },
            summary: Some("Engineer who builds <b>analytical</b> engines.".to_string()),
            skills: Some(vec![SkillBlock {
                category: "Languages".to_string(),
                items: vec!["Rust".to_string(), "Go".to_string()],
            }]),
            experience: Some(vec![ExperienceEntry {
                company: "Analytical Engines Ltd".to_string(),
                title: "Programmer".to_string(),
                location: Some("London".to_string()),
                dates: Some("1842 \u{2013} 1843".to_string()),
                bullets: vec!["Wrote the first published algorithm.".to_string()],
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn test_measure_short_line_fits() {
        let style = VariableSet::default().styles.skills;
        assert!(PdfRenderer.measure("<b>Languages:</b> Rust, Go", &style, 540.0));
    }

    #[test]
    fn test_measure_wrapping_line_does_not_fit() {
        let style = VariableSet::default().styles.skills;
        let long = format!("<b>Languages:</b> {}", vec!["Rust"; 200].join(", "));
        assert!(!PdfRenderer.measure(&long, &style, 540.0));
    }

    #[test]
    fn test_measure_oversized_word_does_not_fit() {
        let style = VariableSet::default().styles.skills;
        assert!(!PdfRenderer.measure("Supercalifragilisticexpialidocious", &style, 20.0));
    }

    #[test]
    fn test_measure_never_fits_with_degenerate_style() {
        let fragment = format!("<b>Languages:</b> {}", vec!["Rust"; 60].join(", "));
        let zero_leading = TextStyle {
            leading: 0.0,
            ..VariableSet::default().styles.skills
        };
        assert!(!PdfRenderer.measure(&fragment, &zero_leading, 540.0));
        assert!(!PdfRenderer.measure("Rust", &zero_leading, 540.0));

        let negative_size = TextStyle {
            size: -9.5,
            ..VariableSet::default().styles.skills
        };
        assert!(!PdfRenderer.measure(&fragment, &negative_size, 540.0));
    }

    #[test]
    fn test_measure_is_deterministic() {
        let style = VariableSet::default().styles.skills;
        let fragment = "<b>Cloud:</b> AWS, GCP, Azure, Kubernetes, Terraform";
        for width in [50.0, 120.0, 180.0, 300.0] {
            assert_eq!(
                PdfRenderer.measure(fragment, &style, width),
                PdfRenderer.measure(fragment, &style, width)
            );
        }
    }

    #[test]
    fn test_usable_width_subtracts_margins() {
        assert_eq!(PdfRenderer.usable_width(&VariableSet::default()), 540.0);
    }

    #[test]
    fn test_render_produces_loadable_pdf_with_text() {
        let bytes = PdfRenderer
            .render(&sample_record(), &VariableSet::default())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("Lovelace"), "extracted text: {text}");
        assert!(text.contains("TECHNICAL SKILLS"), "extracted text: {text}");
    }

    #[test]
    fn test_long_record_paginates() {
        let mut record = sample_record();
        record.projects = Some(
            (0..40)
                .map(|i| ProjectEntry {
                    title: format!("Project {i}"),
                    dates: None,
                    bullets: vec!["Built something worth describing in detail.".to_string(); 3],
                })
                .collect(),
        );
        let bytes = PdfRenderer.render(&record, &VariableSet::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn test_impossible_margins_are_render_failures() {
        let mut vars = VariableSet::default();
        vars.page.margin_left = 400.0;
        vars.page.margin_right = 400.0;
        let err = PdfRenderer.render(&sample_record(), &vars).unwrap_err();
        assert!(matches!(err, AppError::RenderFailure(_)));
    }

    #[test]
    fn test_win_ansi_maps_typographic_characters() {
        assert_eq!(
            to_win_ansi("a\u{2022}\u{2013}\u{e9}\u{4e2d}"),
            vec![b'a', 0x95, 0x96, 0xe9, b'?']
        );
    }

    #[test]
    fn test_contact_line_skips_blank_fields() {
        let contact = Contact {
            email: Some("a@b.c".to_string()),
            phone: Some("  ".to_string()),
            github: Some("github.com/ada".to_string()),
            ..Default::default()
        };
        assert_eq!(contact_line(&contact), "a@b.c  |  github.com/ada");
    }
}
