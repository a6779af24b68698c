use pdf_writer::{Name, Pdf, Ref};

/// The two standard-14 faces the record layout uses. Neither is embedded, so
/// widths come from the Adobe core font metrics below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StdFont {
    Helvetica,
    HelveticaBold,
}

impl StdFont {
    pub(crate) const ALL: [StdFont; 2] = [StdFont::Helvetica, StdFont::HelveticaBold];

    pub(crate) fn pdf_name(self) -> &'static str {
        match self {
            StdFont::Helvetica => "F1",
            StdFont::HelveticaBold => "F2",
        }
    }

    fn base_font(self) -> &'static [u8] {
        match self {
            StdFont::Helvetica => b"Helvetica",
            StdFont::HelveticaBold => b"Helvetica-Bold",
        }
    }

    fn ascii_widths(self) -> &'static [u16; 95] {
        match self {
            StdFont::Helvetica => &HELVETICA_ASCII,
            StdFont::HelveticaBold => &HELVETICA_BOLD_ASCII,
        }
    }

    /// Width of one WinAnsi byte at 1000 units/em.
    fn byte_width_1000(self, byte: u8) -> f32 {
        match byte {
            32..=126 => self.ascii_widths()[(byte - 32) as usize] as f32,
            // Latin-1 letters are mostly as wide as their base glyph; the
            // remaining punctuation averages out near a digit width.
            0xC0..=0xDE => 722.0,
            0xDF..=0xFF => 556.0,
            0x95 => 350.0, // bullet
            0x96 => 556.0,
            0x97 => 1000.0,
            0x85 => 1000.0,
            0x91 | 0x92 => 278.0,
            _ => 556.0,
        }
    }

    pub(crate) fn text_width(self, text: &str, font_size: f32) -> f32 {
        to_winansi_bytes(text)
            .iter()
            .filter(|&&b| b >= 32)
            .map(|&b| self.byte_width_1000(b) * font_size / 1000.0)
            .sum()
    }

    pub(crate) fn space_width(self, font_size: f32) -> f32 {
        self.byte_width_1000(b' ') * font_size / 1000.0
    }
}

#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // digits
    278, 278, 584, 584, 584, 556, 1015,                                             // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // N..Z
    278, 278, 278, 469, 556, 333,                                                   // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // n..z
    334, 260, 334, 584,                                                             // '{'..'~'
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Write both font dictionaries and return their object refs.
pub(crate) fn register_fonts(pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref) -> Vec<(StdFont, Ref)> {
    StdFont::ALL
        .iter()
        .map(|&font| {
            let font_ref = alloc();
            pdf.type1_font(font_ref)
                .base_font(Name(font.base_font()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            (font, font_ref)
        })
        .collect()
}

/// Map a single Unicode char to its WinAnsi byte, or None if unmappable.
fn char_to_winansi(c: char) -> Option<u8> {
    let byte = match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Characters outside the code page are replaced with '?'.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter(|c| !c.is_control())
        .map(|c| char_to_winansi(c).unwrap_or(b'?'))
        .collect()
}
