//! # Label Document
//!
//! Composes a printable SVG label: title, barcode drawing, optional price.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  Galaxy S24 Ultra 256GB      │  ← title (escaped, max 40 chars)
//! │  ▌▌ ▌▌▌ ▌ ▌▌ ▌ ▌▌▌ ▌ ▌▌ ▌▌  │  ← render::render
//! │        2000700000018         │
//! │                      $899.00 │  ← optional price
//! └──────────────────────────────┘
//! ```

use std::fmt::Write;

use crate::code::BarcodeCode;
use crate::money::Money;
use crate::render::{render, LabelGeometry};

/// Titles longer than this are cut and end in an ellipsis.
pub const MAX_LABEL_TITLE_CHARS: usize = 40;

/// What goes on a label.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub code: BarcodeCode,
    pub title: String,
    pub price: Option<Money>,
}

impl Label {
    pub fn new(code: BarcodeCode, title: impl Into<String>, price: Option<Money>) -> Self {
        Self {
            code,
            title: title.into(),
            price,
        }
    }
}

/// Renders a label as a standalone SVG document.
///
/// An empty title produces a label without a heading.
pub fn render_label(label: &Label, geometry: &LabelGeometry) -> String {
    let drawing = render(&label.code, geometry);
    let line = geometry.font_size * 1.4;
    let title = truncate_title(label.title.trim());

    let title_height = if title.is_empty() { 0.0 } else { line };
    let price_height = if label.price.is_some() { line } else { 0.0 };
    let width = drawing.width;
    let height = title_height + drawing.height + price_height + geometry.text_gap;

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );
    let _ = writeln!(
        out,
        r##"<rect x="0" y="0" width="{}" height="{}" fill="#ffffff"/>"##,
        width, height
    );

    if !title.is_empty() {
        let _ = writeln!(
            out,
            r#"<text x="{}" y="{}" font-family="sans-serif" font-size="{}" font-weight="bold" text-anchor="middle">{}</text>"#,
            width / 2.0,
            geometry.font_size,
            geometry.font_size,
            escape_xml(&title)
        );
    }

    drawing.write_elements(&mut out, 0.0, title_height);

    if let Some(price) = label.price {
        let margin = f64::from(geometry.quiet_zone) * geometry.module_width;
        let _ = writeln!(
            out,
            r#"<text x="{}" y="{}" font-family="sans-serif" font-size="{}" text-anchor="end">{}</text>"#,
            width - margin,
            title_height + drawing.height + price_height,
            geometry.font_size,
            escape_xml(&price.to_string())
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Cuts a title to [`MAX_LABEL_TITLE_CHARS`] characters, ellipsis included.
fn truncate_title(title: &str) -> String {
    if title.chars().count() <= MAX_LABEL_TITLE_CHARS {
        return title.to_string();
    }

    let mut cut: String = title.chars().take(MAX_LABEL_TITLE_CHARS - 1).collect();
    cut.push('…');
    cut
}

/// Escapes the five XML special characters.
fn escape_xml(text: &str) -> String {
    text.chars()
        .fold(String::with_capacity(text.len()), |mut acc, c| {
            match c {
                '&' => acc.push_str("&amp;"),
                '<' => acc.push_str("&lt;"),
                '>' => acc.push_str("&gt;"),
                '"' => acc.push_str("&quot;"),
                '\'' => acc.push_str("&apos;"),
                _ => acc.push(c),
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> BarcodeCode {
        BarcodeCode::parse("3000300000011").unwrap()
    }

    #[test]
    fn test_label_has_title_bars_and_price() {
        let label = Label::new(code(), "USB-C Cable", Some(Money::from_cents(1299)));
        let svg = render_label(&label, &LabelGeometry::default());

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">USB-C Cable</text>"));
        assert!(svg.contains(">3000300000011</text>"));
        assert!(svg.contains(">$12.99</text>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let label = Label::new(code(), "Tom & Jerry <Deluxe>", None);
        let svg = render_label(&label, &LabelGeometry::default());

        assert!(svg.contains("Tom &amp; Jerry &lt;Deluxe&gt;"));
        assert!(!svg.contains("<Deluxe>"));
    }

    #[test]
    fn test_long_title_is_truncated() {
        let title = "A".repeat(60);
        assert_eq!(truncate_title(&title).chars().count(), MAX_LABEL_TITLE_CHARS);
        assert!(truncate_title(&title).ends_with('…'));
        assert_eq!(truncate_title("Short"), "Short");
        assert_eq!(truncate_title(&"B".repeat(40)), "B".repeat(40));
    }

    #[test]
    fn test_empty_title_and_no_price() {
        let label = Label::new(code(), "", None);
        let svg = render_label(&label, &LabelGeometry::default());

        // Only the digit text remains.
        assert_eq!(svg.matches("<text").count(), 1);
        assert!(!svg.contains('$'));
    }
}
