use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

/// Inter's natural line height relative to its font size.
pub const AUTO_LINE_HEIGHT: f32 = 1.210_227_2;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Width of a single line of text. Falls back to the calibrated table when
/// `fast` is set or no matching system font is installed.
pub fn measure_text_width(text: &str, font_size: f32, family: &str, bold: bool, fast: bool) -> f32 {
    if text.is_empty() || font_size <= 0.0 {
        return 0.0;
    }
    if !fast
        && let Ok(mut guard) = TEXT_MEASURER.lock()
        && let Some(width) = guard.measure(text, font_size, family, bold)
    {
        return width;
    }
    estimate_text_width(text, font_size, bold)
}

pub fn estimate_text_width(text: &str, font_size: f32, bold: bool) -> f32 {
    let weight_factor = if bold { 1.06 } else { 1.0 };
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(|ch| char_width_factor(ch) * font_size * weight_factor)
        .sum()
}

/// Splits on explicit line breaks, then wraps each line at word boundaries
/// so no line exceeds `max_width`. Words wider than the limit are broken
/// between characters. Always returns at least one line.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    font_size: f32,
    family: &str,
    bold: bool,
    fast: bool,
) -> Vec<String> {
    let width_of = |s: &str| measure_text_width(s, font_size, family, bold, fast);
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        if width_of(raw) <= max_width {
            lines.push(raw.to_string());
            continue;
        }
        let mut current = String::new();
        for word in raw.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if width_of(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if width_of(word) <= max_width {
                current = word.to_string();
                continue;
            }
            for ch in word.chars() {
                let mut next = current.clone();
                next.push(ch);
                if !current.is_empty() && width_of(&next) > max_width {
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                } else {
                    current = next;
                }
            }
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn char_width_factor(ch: char) -> f32 {
    // Advance widths of Inter Regular relative to the font size.
    match ch {
        ' ' => 0.281,
        '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.26,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.34,
        '-' => 0.39,
        'i' | 'j' | 'l' => 0.24,
        'f' | 't' | 'r' => 0.36,
        'I' => 0.27,
        'm' | 'w' => 0.86,
        'M' | 'W' => 0.92,
        'a'..='z' => 0.56,
        'A'..='Z' => 0.68,
        '1' => 0.42,
        '0'..='9' => 0.62,
        '#' | '%' | '&' | '@' => 0.84,
        _ => 0.6,
    }
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<(String, bool), Option<FontFace>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, family: &str, bold: bool) -> Option<f32> {
        let key = (family.trim().to_string(), bold);
        if !self.faces.contains_key(&key) {
            let face = self.load_face(&key.0, bold);
            self.faces.insert(key.clone(), face);
        }
        let face = self.faces.get_mut(&key)?.as_mut()?;
        face.measure_width(text, font_size)
    }

    fn load_face(&mut self, family: &str, bold: bool) -> Option<FontFace> {
        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }
        let families = if family.is_empty() {
            vec![Family::SansSerif]
        } else {
            vec![Family::Name(family)]
        };
        let query = Query {
            families: &families,
            weight: if bold { Weight::BOLD } else { Weight::NORMAL },
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let Some(id) = self.db.query(&query) else {
            debug!(family, bold; "No system font found, using width table");
            return None;
        };
        let mut loaded = None;
        self.db.with_face_data(id, |data, index| {
            if let Ok(face) = Face::parse(data, index) {
                loaded = Some(FontFace::new(data.to_vec(), index, &face));
            }
        });
        loaded
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    ascii_advances: [u16; 128],
    advance_cache: HashMap<char, Option<u16>>,
}

impl FontFace {
    fn new(data: Vec<u8>, index: u32, face: &Face<'_>) -> Self {
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        Self {
            data,
            index,
            units_per_em: f32::from(face.units_per_em().max(1)),
            ascii_advances,
            advance_cache: HashMap::new(),
        }
    }

    fn measure_width(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em;
        let fallback = font_size * 0.56;
        let mut width = 0.0f32;
        let mut face: Option<Face<'_>> = None;

        for ch in text.chars().filter(|ch| *ch != '\n') {
            let advance = if ch.is_ascii() {
                Some(self.ascii_advances[ch as usize]).filter(|adv| *adv > 0)
            } else if let Some(cached) = self.advance_cache.get(&ch) {
                *cached
            } else {
                if face.is_none() {
                    face = Face::parse(&self.data, self.index).ok();
                }
                let value = face.as_ref().and_then(|parsed| {
                    parsed
                        .glyph_index(ch)
                        .and_then(|glyph| parsed.glyph_hor_advance(glyph))
                });
                self.advance_cache.insert(ch, value);
                value
            };
            width += match advance {
                Some(adv) => f32::from(adv) * scale,
                None => fallback,
            };
        }
        Some(width.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_grows_with_text_and_weight() {
        let short = estimate_text_width("Step", 14.0, false);
        let long = estimate_text_width("Step description", 14.0, false);
        assert!(long > short);
        assert!(estimate_text_width("Step", 14.0, true) > short);
        assert_eq!(measure_text_width("", 14.0, "Inter", false, true), 0.0);
    }

    #[test]
    fn wrap_respects_width_and_line_breaks() {
        let text = "Confirm the shipping address before paying\nSecond line";
        let lines = wrap_text(text, 120.0, 14.0, "Inter", false, true);
        assert!(lines.len() >= 3);
        assert_eq!(lines.last().map(String::as_str), Some("Second line"));
        for line in &lines {
            assert!(estimate_text_width(line, 14.0, false) <= 120.0);
        }
    }

    #[test]
    fn wrap_breaks_words_longer_than_the_limit() {
        let lines = wrap_text("Supercalifragilistic", 40.0, 14.0, "Inter", false, true);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "Supercalifragilistic");
    }

    #[test]
    fn wrap_keeps_empty_input_as_one_line() {
        assert_eq!(wrap_text("", 100.0, 14.0, "Inter", false, true), vec![String::new()]);
    }
}
