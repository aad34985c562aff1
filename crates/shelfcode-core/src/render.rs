//! # Visual Encoder
//!
//! Draws the bar pattern and digit text for a 13-digit code.
//!
//! ## Module Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      102 modules, left to right                         │
//! │                                                                         │
//! │  ┌─────┬──────────────────┬─────────┬──────────────────┬─────┐          │
//! │  │ 101 │  digits 1-6      │  01010  │  digits 7-13     │ 101 │          │
//! │  │guard│  6 × 7 modules   │ center  │  7 × 7 modules   │guard│          │
//! │  └─────┴──────────────────┴─────────┴──────────────────┴─────┘          │
//! │   0..3       3..45          45..50        50..99         99..102        │
//! │                                                                         │
//! │  Guard bars extend below the data bars; the digits sit underneath.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Not Scanner Compatible
//! Every digit is drawn from the same odd-parity ("L") table regardless of
//! its position, and the first digit is drawn as a pattern of its own
//! instead of selecting the parity of the left half. The result looks like a
//! retail barcode and carries the digits as text, but standard scanners will
//! not decode it. [`SCANNER_COMPATIBLE`] records this; staff key or scan the
//! printed digits, or a future encoder replaces this one.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::code::{BarcodeCode, CODE_LEN};

/// Whether the drawing can be decoded by standard barcode hardware.
pub const SCANNER_COMPATIBLE: bool = false;

/// Total modules in a drawing (guards included, quiet zone excluded).
pub const MODULE_COUNT: usize = 3 + 6 * 7 + 5 + 7 * 7 + 3;

const EDGE_GUARD: &str = "101";
const CENTER_GUARD: &str = "01010";

/// Odd-parity patterns, indexed by digit.
const L_PATTERNS: [&str; 10] = [
    "0001101", // 0
    "0011001", // 1
    "0010011", // 2
    "0111101", // 3
    "0100011", // 4
    "0110001", // 5
    "0101111", // 6
    "0111011", // 7
    "0110111", // 8
    "0001011", // 9
];

// =============================================================================
// Geometry
// =============================================================================

/// Sizes used when drawing. Not part of a code's identity.
///
/// All lengths are SVG user units; `quiet_zone` is counted in modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelGeometry {
    /// Width of one module.
    #[serde(default = "default_module_width")]
    pub module_width: f64,

    /// Height of the data bars.
    #[serde(default = "default_bar_height")]
    pub bar_height: f64,

    /// How far guard bars reach below the data bars.
    #[serde(default = "default_guard_extension")]
    pub guard_extension: f64,

    /// Blank modules on each side of the bars.
    #[serde(default = "default_quiet_zone")]
    pub quiet_zone: u32,

    /// Font size of the digit text.
    #[serde(default = "default_font_size")]
    pub font_size: f64,

    /// Space between the bars and the digit text.
    #[serde(default = "default_text_gap")]
    pub text_gap: f64,
}

fn default_module_width() -> f64 {
    2.0
}

fn default_bar_height() -> f64 {
    60.0
}

fn default_guard_extension() -> f64 {
    6.0
}

fn default_quiet_zone() -> u32 {
    9
}

fn default_font_size() -> f64 {
    14.0
}

fn default_text_gap() -> f64 {
    4.0
}

impl Default for LabelGeometry {
    fn default() -> Self {
        Self {
            module_width: default_module_width(),
            bar_height: default_bar_height(),
            guard_extension: default_guard_extension(),
            quiet_zone: default_quiet_zone(),
            font_size: default_font_size(),
            text_gap: default_text_gap(),
        }
    }
}

impl LabelGeometry {
    /// Width of the drawing, quiet zones included.
    pub fn total_width(&self) -> f64 {
        (MODULE_COUNT as f64 + 2.0 * f64::from(self.quiet_zone)) * self.module_width
    }

    /// Height of the drawing, digit text included.
    pub fn total_height(&self) -> f64 {
        self.bar_height + self.guard_extension + self.text_gap + self.font_size
    }

    /// Returns the name of the first unusable length, if any.
    ///
    /// Widths, bar height and font size must be positive; the guard
    /// extension and text gap may be zero.
    pub fn first_invalid_field(&self) -> Option<&'static str> {
        let positive = [
            ("module_width", self.module_width),
            ("bar_height", self.bar_height),
            ("font_size", self.font_size),
        ];
        let non_negative = [
            ("guard_extension", self.guard_extension),
            ("text_gap", self.text_gap),
        ];

        positive
            .into_iter()
            .find(|(_, v)| !(v.is_finite() && *v > 0.0))
            .or_else(|| {
                non_negative
                    .into_iter()
                    .find(|(_, v)| !(v.is_finite() && *v >= 0.0))
            })
            .map(|(name, _)| name)
    }
}

// =============================================================================
// Drawing
// =============================================================================

/// One dark bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub width: f64,
    pub height: f64,
    /// Part of a guard (drawn with the extension).
    pub guard: bool,
}

/// The digits printed under the bars.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingText {
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub content: String,
}

/// A rendered code: bars plus digit text, positioned in a
/// `width × height` box with the origin at the top left.
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeDrawing {
    pub bars: Vec<Bar>,
    pub text: DrawingText,
    pub width: f64,
    pub height: f64,
}

/// Returns the 102-module pattern of a code as `'0'`/`'1'` characters.
///
/// ## Example
/// ```rust
/// use shelfcode_core::code::BarcodeCode;
/// use shelfcode_core::render::{module_pattern, MODULE_COUNT};
///
/// let code = BarcodeCode::parse("4006381333931").unwrap();
/// let pattern = module_pattern(&code);
/// assert_eq!(pattern.len(), MODULE_COUNT);
/// assert!(pattern.starts_with("1010100011"));
/// ```
pub fn module_pattern(code: &BarcodeCode) -> String {
    module_runs(code)
        .into_iter()
        .map(|(pattern, _)| pattern)
        .collect()
}

/// Renders a code into bars and text.
pub fn render(code: &BarcodeCode, geometry: &LabelGeometry) -> BarcodeDrawing {
    let origin = f64::from(geometry.quiet_zone) * geometry.module_width;
    let mut bars: Vec<Bar> = Vec::new();
    let mut module = 0usize;
    let mut open: Option<(usize, bool)> = None;

    for (pattern, guard) in module_runs(code) {
        for ch in pattern.chars() {
            match (ch == '1', open) {
                (true, None) => open = Some((module, guard)),
                (false, Some((start, was_guard))) => {
                    bars.push(make_bar(start, module, was_guard, origin, geometry));
                    open = None;
                }
                _ => {}
            }
            module += 1;
        }
        // Guard bars never merge with data bars.
        if let Some((start, was_guard)) = open.take() {
            bars.push(make_bar(start, module, was_guard, origin, geometry));
        }
    }

    let width = geometry.total_width();
    let text = DrawingText {
        x: width / 2.0,
        y: geometry.bar_height + geometry.guard_extension + geometry.text_gap + geometry.font_size,
        font_size: geometry.font_size,
        content: code.as_str().to_string(),
    };

    BarcodeDrawing {
        bars,
        text,
        width,
        height: geometry.total_height(),
    }
}

fn make_bar(start: usize, end: usize, guard: bool, origin: f64, geometry: &LabelGeometry) -> Bar {
    Bar {
        x: origin + start as f64 * geometry.module_width,
        width: (end - start) as f64 * geometry.module_width,
        height: if guard {
            geometry.bar_height + geometry.guard_extension
        } else {
            geometry.bar_height
        },
        guard,
    }
}

/// Splits a code into pattern runs, each tagged with whether it is a guard.
fn module_runs(code: &BarcodeCode) -> Vec<(&'static str, bool)> {
    let digits = code.as_str().as_bytes();
    let mut runs = Vec::with_capacity(CODE_LEN + 3);

    runs.push((EDGE_GUARD, true));
    for &b in &digits[..6] {
        runs.push((L_PATTERNS[usize::from(b - b'0')], false));
    }
    runs.push((CENTER_GUARD, true));
    for &b in &digits[6..] {
        runs.push((L_PATTERNS[usize::from(b - b'0')], false));
    }
    runs.push((EDGE_GUARD, true));

    runs
}

// =============================================================================
// SVG Output
// =============================================================================

impl BarcodeDrawing {
    /// Standalone SVG document for the drawing.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        let _ = writeln!(
            out,
            r##"<rect x="0" y="0" width="{}" height="{}" fill="#ffffff"/>"##,
            self.width, self.height
        );
        self.write_elements(&mut out, 0.0, 0.0);
        out.push_str("</svg>\n");
        out
    }

    /// Appends the bars and text as SVG elements shifted by `(dx, dy)`.
    pub(crate) fn write_elements(&self, out: &mut String, dx: f64, dy: f64) {
        for bar in &self.bars {
            let _ = writeln!(
                out,
                r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#000000"/>"##,
                bar.x + dx,
                dy,
                bar.width,
                bar.height
            );
        }
        let _ = writeln!(
            out,
            r#"<text x="{}" y="{}" font-family="monospace" font-size="{}" text-anchor="middle">{}</text>"#,
            self.text.x + dx,
            self.text.y + dy,
            self.text.font_size,
            self.text.content
        );
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
