//! Static font-metric tables for the base-14 faces the PDF renderer draws with.
//!
//! Character widths are in em units (relative to font size), taken from the Adobe
//! AFM files for the standard Type 1 fonts. The renderer never embeds fonts, so these
//! tables are the renderer's own ground truth: measurement and drawing agree exactly.
//! All tables cover ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Font faces
// ────────────────────────────────────────────────────────────────────────────

/// The font faces a `VariableSet` may name for a text style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFace {
    #[serde(rename = "Helvetica")]
    Helvetica,
    #[serde(rename = "Helvetica-Bold")]
    HelveticaBold,
    #[serde(rename = "Helvetica-Oblique")]
    HelveticaOblique,
    #[serde(rename = "Helvetica-BoldOblique")]
    HelveticaBoldOblique,
    /// Monospaced. Inline emphasis is ignored for Courier.
    #[serde(rename = "Courier")]
    Courier,
}

impl FontFace {
    pub const ALL: [FontFace; 5] = [
        FontFace::Helvetica,
        FontFace::HelveticaBold,
        FontFace::HelveticaOblique,
        FontFace::HelveticaBoldOblique,
        FontFace::Courier,
    ];

    /// PostScript base font name written into the PDF font dictionary.
    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Helvetica => "Helvetica",
            FontFace::HelveticaBold => "Helvetica-Bold",
            FontFace::HelveticaOblique => "Helvetica-Oblique",
            FontFace::HelveticaBoldOblique => "Helvetica-BoldOblique",
            FontFace::Courier => "Courier",
        }
    }

    /// Resource name used inside page content streams (`/F1` .. `/F5`).
    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::Helvetica => "F1",
            FontFace::HelveticaBold => "F2",
            FontFace::HelveticaOblique => "F3",
            FontFace::HelveticaBoldOblique => "F4",
            FontFace::Courier => "F5",
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, FontFace::HelveticaBold | FontFace::HelveticaBoldOblique)
    }

    pub fn is_italic(self) -> bool {
        matches!(
            self,
            FontFace::HelveticaOblique | FontFace::HelveticaBoldOblique
        )
    }

    /// Applies inline `<b>` / `<i>` emphasis on top of this face.
    pub fn with_emphasis(self, bold: bool, italic: bool) -> FontFace {
        if self == FontFace::Courier {
            return self;
        }
        match (self.is_bold() || bold, self.is_italic() || italic) {
            (false, false) => FontFace::Helvetica,
            (true, false) => FontFace::HelveticaBold,
            (false, true) => FontFace::HelveticaOblique,
            (true, true) => FontFace::HelveticaBoldOblique,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font face.
///
/// `widths[i]` = width of ASCII character `(i + 32)` in em units.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    pub face: FontFace,
    widths: [f32; 95],
    /// Fallback width for characters outside printable ASCII.
    pub average_char_width: f32,
}

impl FontMetricTable {
    /// Measures the width of a string in em units.
    ///
    /// Non-breaking spaces measure as a space; other non-ASCII characters fall back to
    /// `average_char_width`.
    pub fn measure_em(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = if c == '\u{a0}' { 32 } else { c as usize };
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum()
    }

    /// Measures the width of a string in points at `size_pt`.
    pub fn measure_pt(&self, s: &str, size_pt: f32) -> f32 {
        self.measure_em(s) * size_pt
    }

    pub fn space_width_pt(&self, size_pt: f32) -> f32 {
        self.widths[0] * size_pt
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

#[rustfmt::skip]
const HELVETICA_WIDTHS: [f32; 95] = [
    // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
    0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
    // 0      1      2      3      4      5      6      7      8      9
    0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
    // :      ;      <      =      >      ?      @
    0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
    // A      B      C      D      E      F      G      H      I      J      K      L      M
    0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
    // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
    0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
    // [      \      ]      ^      _      `
    0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
    // a      b      c      d      e      f      g      h      i      j      k      l      m
    0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
    // n      o      p      q      r      s      t      u      v      w      x      y      z
    0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
    // {      |      }      ~
    0.334, 0.260, 0.334, 0.584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [f32; 95] = [
    // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
    0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
    // 0      1      2      3      4      5      6      7      8      9
    0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
    // :      ;      <      =      >      ?      @
    0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
    // A      B      C      D      E      F      G      H      I      J      K      L      M
    0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
    // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
    0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
    // [      \      ]      ^      _      `
    0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
    // a      b      c      d      e      f      g      h      i      j      k      l      m
    0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
    // n      o      p      q      r      s      t      u      v      w      x      y      z
    0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
    // {      |      }      ~
    0.389, 0.280, 0.389, 0.584,
];

/// Helvetica, the default body face.
static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    face: FontFace::Helvetica,
    widths: HELVETICA_WIDTHS,
    average_char_width: 0.556,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    face: FontFace::HelveticaBold,
    widths: HELVETICA_BOLD_WIDTHS,
    average_char_width: 0.584,
};

/// Obliques are slanted regulars: identical advance widths.
static HELVETICA_OBLIQUE_TABLE: FontMetricTable = FontMetricTable {
    face: FontFace::HelveticaOblique,
    widths: HELVETICA_WIDTHS,
    average_char_width: 0.556,
};

static HELVETICA_BOLD_OBLIQUE_TABLE: FontMetricTable = FontMetricTable {
    face: FontFace::HelveticaBoldOblique,
    widths: HELVETICA_BOLD_WIDTHS,
    average_char_width: 0.584,
};

static COURIER_TABLE: FontMetricTable = FontMetricTable {
    face: FontFace::Courier,
    widths: [0.600; 95],
    average_char_width: 0.600,
};

/// Returns the static metric table for a given font face.
pub fn get_metrics(face: FontFace) -> &'static FontMetricTable {
    match face {
        FontFace::Helvetica => &HELVETICA_TABLE,
        FontFace::HelveticaBold => &HELVETICA_BOLD_TABLE,
        FontFace::HelveticaOblique => &HELVETICA_OBLIQUE_TABLE,
        FontFace::HelveticaBoldOblique => &HELVETICA_BOLD_OBLIQUE_TABLE,
        FontFace::Courier => &COURIER_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
