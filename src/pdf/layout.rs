use pdf_writer::{Content, Name, Str};

use crate::config::Rgb;
use crate::fonts::{StdFont, to_winansi_bytes};

/// Helvetica ascender at 1000 units/em, as a ratio.
pub(super) const ASCENT: f32 = 0.718;

/// Bezier control-point distance for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

fn unit(c: Rgb) -> (f32, f32, f32) {
    (c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0)
}

pub(super) fn set_fill(content: &mut Content, c: Rgb) {
    let (r, g, b) = unit(c);
    content.set_fill_rgb(r, g, b);
}

pub(super) fn set_stroke(content: &mut Content, c: Rgb) {
    let (r, g, b) = unit(c);
    content.set_stroke_rgb(r, g, b);
}

pub(super) fn fill_rect(content: &mut Content, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
    content.save_state();
    set_fill(content, color);
    content.rect(x, y, w, h);
    content.fill_nonzero();
    content.restore_state();
}

pub(super) fn stroke_line(content: &mut Content, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgb) {
    content.save_state();
    content.set_line_width(width);
    set_stroke(content, color);
    content.move_to(x1, y1);
    content.line_to(x2, y2);
    content.stroke();
    content.restore_state();
}

pub(super) fn stroke_rect(content: &mut Content, x: f32, y: f32, w: f32, h: f32, width: f32, color: Rgb) {
    content.save_state();
    content.set_line_width(width);
    set_stroke(content, color);
    content.rect(x, y, w, h);
    content.stroke();
    content.restore_state();
}

/// Append a rounded rectangle path with (x, y) as the lower-left corner.
pub(super) fn rounded_rect_path(content: &mut Content, x: f32, y: f32, w: f32, h: f32, r: f32) {
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    let k = r * KAPPA;
    let (x2, y2) = (x + w, y + h);
    content.move_to(x + r, y);
    content.line_to(x2 - r, y);
    content.cubic_to(x2 - r + k, y, x2, y + r - k, x2, y + r);
    content.line_to(x2, y2 - r);
    content.cubic_to(x2, y2 - r + k, x2 - r + k, y2, x2 - r, y2);
    content.line_to(x + r, y2);
    content.cubic_to(x + r - k, y2, x, y2 - r + k, x, y2 - r);
    content.line_to(x, y + r);
    content.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    content.close_path();
}

pub(super) fn circle_path(content: &mut Content, cx: f32, cy: f32, r: f32) {
    let k = r * KAPPA;
    content.move_to(cx + r, cy);
    content.cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r);
    content.cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy);
    content.cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r);
    content.cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy);
    content.close_path();
}

#[derive(Clone, Copy)]
pub(super) struct TextStyle {
    pub(super) font: StdFont,
    pub(super) size: f32,
    pub(super) color: Rgb,
}

impl TextStyle {
    pub(super) fn new(font: StdFont, size: f32, color: Rgb) -> Self {
        Self { font, size, color }
    }

    pub(super) fn width(&self, text: &str) -> f32 {
        self.font.text_width(text, self.size)
    }
}

/// Draw one line of text with its baseline at `y`.
pub(super) fn show_text(content: &mut Content, style: TextStyle, x: f32, y: f32, text: &str) {
    if text.is_empty() {
        return;
    }
    content.save_state();
    set_fill(content, style.color);
    content
        .begin_text()
        .set_font(Name(style.font.pdf_name().as_bytes()), style.size)
        .next_line(x, y)
        .show(Str(&to_winansi_bytes(text)))
        .end_text();
    content.restore_state();
}

pub(super) fn show_text_centered(content: &mut Content, style: TextStyle, center_x: f32, y: f32, text: &str) {
    show_text(content, style, center_x - style.width(text) / 2.0, y, text);
}

pub(super) fn show_text_right(content: &mut Content, style: TextStyle, right_x: f32, y: f32, text: &str) {
    show_text(content, style, right_x - style.width(text), y, text);
}

/// Greedy word wrap: a word joins the current line while the measured width
/// of the whole line stays within `max_width`. Runs of whitespace collapse.
/// A single word wider than the line is broken at the character that overflows.
pub(crate) fn wrap_words(text: &str, font: StdFont, font_size: f32, max_width: f32) -> Vec<String> {
    let space_w = font.space_width(font_size);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_w = 0.0f32;

    for word in text.split_whitespace() {
        let word_w = font.text_width(word, font_size);
        if !line.is_empty() && line_w + space_w + word_w <= max_width {
            line.push(' ');
            line.push_str(word);
            line_w += space_w + word_w;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if word_w <= max_width {
            line.push_str(word);
            line_w = word_w;
            continue;
        }
        // Hard-break an overlong word.
        let mut piece = String::new();
        for ch in word.chars() {
            let mut candidate = piece.clone();
            candidate.push(ch);
            if !piece.is_empty() && font.text_width(&candidate, font_size) > max_width {
                lines.push(std::mem::replace(&mut piece, ch.to_string()));
            } else {
                piece = candidate;
            }
        }
        line_w = font.text_width(&piece, font_size);
        line = piece;
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Collapse whitespace and shorten with an ellipsis so the text fits on one line.
pub(crate) fn fit_single_line(text: &str, font: StdFont, font_size: f32, max_width: f32) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if font.text_width(&collapsed, font_size) <= max_width {
        return collapsed;
    }
    let ellipsis = "...";
    let budget = max_width - font.text_width(ellipsis, font_size);
    let mut out = String::new();
    let mut w = 0.0f32;
    for ch in collapsed.chars() {
        let cw = font.text_width(ch.encode_utf8(&mut [0u8; 4]), font_size);
        if w + cw > budget {
            break;
        }
        out.push(ch);
        w += cw;
    }
    let trimmed = out.trim_end();
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{trimmed}{ellipsis}")
}

/// Largest (w, h) with the image's aspect ratio that fits inside the box.
pub(super) fn fit_within(pixel_w: u32, pixel_h: u32, box_w: f32, box_h: f32) -> (f32, f32) {
    let aspect = pixel_w as f32 / pixel_h as f32;
    if box_w / box_h > aspect {
        (box_h * aspect, box_h)
    } else {
        (box_w, box_w / aspect)
    }
}

/// Paint an image XObject centred inside the given box, aspect preserved.
pub(super) fn draw_image_in_box(
    content: &mut Content,
    xobject: &str,
    pixel_w: u32,
    pixel_h: u32,
    x: f32,
    y: f32,
    box_w: f32,
    box_h: f32,
) {
    let (w, h) = fit_within(pixel_w, pixel_h, box_w, box_h);
    let ix = x + (box_w - w) / 2.0;
    let iy = y + (box_h - h) / 2.0;
    content.save_state();
    content.transform([w, 0.0, 0.0, h, ix, iy]);
    content.x_object(Name(xobject.as_bytes()));
    content.restore_state();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_measured_width() {
        let text = "Chest pain radiating to the left arm with shortness of breath on exertion";
        let max = 120.0;
        let lines = wrap_words(text, StdFont::Helvetica, 9.0, max);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(StdFont::Helvetica.text_width(line, 9.0) <= max, "{line:?} overflows");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_collapses_whitespace_and_handles_empty() {
        assert!(wrap_words("   ", StdFont::Helvetica, 9.0, 100.0).is_empty());
        assert_eq!(wrap_words("a \n\n b", StdFont::Helvetica, 9.0, 100.0), vec!["a b"]);
    }

    #[test]
    fn overlong_word_is_hard_broken() {
        let word = "x".repeat(200);
        let lines = wrap_words(&word, StdFont::Helvetica, 9.0, 50.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(StdFont::Helvetica.text_width(line, 9.0) <= 50.0);
        }
    }

    #[test]
    fn single_line_gets_ellipsis_only_when_needed() {
        assert_eq!(fit_single_line("Quezon  City", StdFont::Helvetica, 9.0, 200.0), "Quezon City");
        let long = "Block 12 Lot 4, Mabini Street, Barangay San Isidro, Quezon City, Metro Manila";
        let fitted = fit_single_line(long, StdFont::Helvetica, 9.0, 100.0);
        assert!(fitted.ends_with("..."));
        assert!(StdFont::Helvetica.text_width(&fitted, 9.0) <= 100.0);
    }

    #[test]
    fn fit_within_preserves_aspect() {
        let (w, h) = fit_within(200, 100, 50.0, 50.0);
        assert!((w - 50.0).abs() < 1e-4 && (h - 25.0).abs() < 1e-4);
        let (w, h) = fit_within(100, 400, 50.0, 50.0);
        assert!((w - 12.5).abs() < 1e-4 && (h - 50.0).abs() < 1e-4);
    }
}
