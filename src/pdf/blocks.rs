use chrono::NaiveDateTime;

use crate::assets::AssetSource;
use crate::config::{MM, RenderConfig, Rgb};
use crate::error::Error;
use crate::fonts::StdFont;

use super::image::{self, LoadedImage};
use super::layout::{
    ASCENT, TextStyle, circle_path, draw_image_in_box, fill_rect, fit_single_line, rounded_rect_path,
    set_fill, set_stroke, show_text, show_text_centered, show_text_right, stroke_line, wrap_words,
};
use super::{PageSurface, Painted};

const WHITE: Rgb = [255, 255, 255];

/// One self-measuring, self-painting unit of document content.
pub trait ContentBlock {
    /// Height the block needs, known before painting.
    fn height(&self, config: &RenderConfig) -> Result<f32, Error>;

    /// Paint with the block's top edge at `top_y` and return the height used.
    fn paint(&self, surface: &mut PageSurface<'_>, top_y: f32) -> Result<f32, Error>;
}

/// Initials for the photo placeholder: first letter of each of the first two
/// words, uppercased. An empty name gives an empty string.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Branded band across the top of page 1.
pub struct HeaderBand {
    title: String,
    subtitle: String,
    logo: Option<LoadedImage>,
}

impl HeaderBand {
    pub const HEIGHT: f32 = 30.0 * MM;
    const LOGO_SIZE: f32 = 22.0 * MM;
    const RULE_GAP: f32 = 2.0;

    pub fn new(config: &RenderConfig, assets: &dyn AssetSource) -> Self {
        Self {
            logo: image::acquire("clinic logo", || assets.logo()),
            ..Self::without_logo(config)
        }
    }

    pub fn without_logo(config: &RenderConfig) -> Self {
        Self {
            title: config.clinic_name.clone(),
            subtitle: config.subtitle.clone(),
            logo: None,
        }
    }

    pub fn has_logo(&self) -> bool {
        self.logo.is_some()
    }
}

impl ContentBlock for HeaderBand {
    fn height(&self, _config: &RenderConfig) -> Result<f32, Error> {
        Ok(Self::HEIGHT + Self::RULE_GAP)
    }

    fn paint(&self, surface: &mut PageSurface<'_>, top_y: f32) -> Result<f32, Error> {
        let config = surface.config();
        let (page, palette) = (&config.page, &config.palette);
        let logo = match &self.logo {
            Some(img) => Some((surface.register_image(img)?, img.pixel_width, img.pixel_height)),
            None => None,
        };

        let content = surface.content()?;
        let header_y = top_y - Self::HEIGHT;
        let center_y = header_y + Self::HEIGHT / 2.0;
        fill_rect(content, 0.0, header_y, page.width, Self::HEIGHT, palette.primary);

        if let Some((name, w, h)) = &logo {
            draw_image_in_box(
                content,
                name,
                *w,
                *h,
                page.margin_side,
                center_y - Self::LOGO_SIZE / 2.0,
                Self::LOGO_SIZE,
                Self::LOGO_SIZE,
            );
        }

        // The text column sits right of the logo slot whether or not a logo loaded.
        let text_x = page.margin_side + Self::LOGO_SIZE + 10.0 * MM;
        let text_w = page.width - page.margin_side - text_x;
        let title_style = TextStyle::new(StdFont::HelveticaBold, 18.0, WHITE);
        let subtitle_style = TextStyle::new(StdFont::Helvetica, 11.0, WHITE);
        let title = fit_single_line(&self.title, title_style.font, title_style.size, text_w);
        let subtitle = fit_single_line(&self.subtitle, subtitle_style.font, subtitle_style.size, text_w);
        show_text(content, title_style, text_x, center_y + 5.0, &title);
        show_text(content, subtitle_style, text_x, center_y - 10.0, &subtitle);

        let rule_y = header_y - Self::RULE_GAP;
        stroke_line(
            content,
            page.margin_side,
            rule_y,
            page.width - page.margin_side,
            rule_y,
            1.5,
            palette.accent,
        );

        surface.record(Painted::Header);
        Ok(Self::HEIGHT + Self::RULE_GAP)
    }
}

/// Abbreviated header repainted at the top margin of every page after the first.
#[derive(Clone, Debug)]
pub struct ContinuationBanner {
    clinic_name: String,
    caption: String,
}

impl ContinuationBanner {
    pub const HEIGHT: f32 = 10.0 * MM;

    pub fn new(config: &RenderConfig, patient_name: &str, patient_id: &str) -> Self {
        Self {
            clinic_name: config.clinic_name.clone(),
            caption: format!("{patient_name} \u{00B7} {patient_id} (continued)"),
        }
    }
}

impl ContentBlock for ContinuationBanner {
    fn height(&self, _config: &RenderConfig) -> Result<f32, Error> {
        Ok(Self::HEIGHT)
    }

    fn paint(&self, surface: &mut PageSurface<'_>, top_y: f32) -> Result<f32, Error> {
        let config = surface.config();
        let page = &config.page;
        let content = surface.content()?;
        let y = top_y - Self::HEIGHT;
        let width = page.content_width();
        content.save_state();
        set_fill(content, config.palette.primary);
        rounded_rect_path(content, page.margin_side, y, width, Self::HEIGHT, 2.0 * MM);
        content.fill_nonzero();
        content.restore_state();

        let baseline = y + Self::HEIGHT / 2.0 - 10.0 * ASCENT / 2.0;
        let name_style = TextStyle::new(StdFont::HelveticaBold, 10.0, WHITE);
        let caption_style = TextStyle::new(StdFont::Helvetica, 9.0, WHITE);
        let half = width / 2.0 - 3.0 * MM;
        let name = fit_single_line(&self.clinic_name, name_style.font, name_style.size, half);
        let caption = fit_single_line(&self.caption, caption_style.font, caption_style.size, half);
        show_text(content, name_style, page.margin_side + 3.0 * MM, baseline, &name);
        show_text_right(
            content,
            caption_style,
            page.width - page.margin_side - 3.0 * MM,
            baseline,
            &caption,
        );

        surface.record(Painted::ContinuationBanner);
        Ok(Self::HEIGHT)
    }
}

/// Photo (or initials placeholder) beside the patient's name and id.
pub struct IdentityBanner {
    name: String,
    patient_id: String,
    photo: Option<LoadedImage>,
}

impl IdentityBanner {
    pub const PHOTO_SIZE: f32 = 40.0 * MM;
    const TRAILING: f32 = 7.0 * MM;

    /// Loads the photo through `assets`; any failure leaves the placeholder.
    pub fn new(name: &str, patient_id: &str, photo_ref: Option<&str>, assets: &dyn AssetSource) -> Self {
        let photo = photo_ref.and_then(|reference| image::acquire("patient photo", || assets.resolve(reference)));
        Self {
            name: name.to_string(),
            patient_id: patient_id.to_string(),
            photo,
        }
    }

    pub fn placeholder_only(name: &str, patient_id: &str) -> Self {
        Self {
            name: name.to_string(),
            patient_id: patient_id.to_string(),
            photo: None,
        }
    }

    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }
}

impl ContentBlock for IdentityBanner {
    fn height(&self, _config: &RenderConfig) -> Result<f32, Error> {
        Ok(Self::PHOTO_SIZE + Self::TRAILING)
    }

    fn paint(&self, surface: &mut PageSurface<'_>, top_y: f32) -> Result<f32, Error> {
        let config = surface.config();
        let (page, palette) = (&config.page, &config.palette);
        let size = Self::PHOTO_SIZE;
        let photo = match &self.photo {
            Some(img) => Some((surface.register_image(img)?, img.pixel_width, img.pixel_height)),
            None => None,
        };

        let content = surface.content()?;
        let y = top_y - size;
        let photo_x = page.width - page.margin_side - size;
        content.save_state();
        set_fill(content, palette.header_bg);
        set_stroke(content, palette.border);
        content.set_line_width(1.0);
        rounded_rect_path(content, photo_x, y, size, size, 3.0 * MM);
        content.fill_nonzero_and_stroke();
        content.restore_state();

        let center_x = photo_x + size / 2.0;
        let center_y = y + size / 2.0;
        let placeholder = match &photo {
            Some((name, w, h)) => {
                let inset = 2.0 * MM;
                draw_image_in_box(content, name, *w, *h, photo_x + inset, y + inset, size - 2.0 * inset, size - 2.0 * inset);
                None
            }
            None => {
                let initials = initials(&self.name);
                content.save_state();
                set_fill(content, palette.secondary);
                circle_path(content, center_x, center_y + 5.0 * MM, 12.0 * MM);
                content.fill_nonzero();
                content.restore_state();
                let style = TextStyle::new(StdFont::HelveticaBold, 20.0, WHITE);
                show_text_centered(content, style, center_x, center_y + 2.0 * MM, &initials);
                Some(initials)
            }
        };

        let text_w = photo_x - page.margin_side - 5.0 * MM;
        let name_style = TextStyle::new(StdFont::HelveticaBold, 20.0, palette.text_dark);
        let id_style = TextStyle::new(StdFont::Helvetica, 14.0, palette.text_light);
        let name = fit_single_line(&self.name, name_style.font, name_style.size, text_w);
        let id_line = fit_single_line(
            &format!("Patient ID: {}", self.patient_id),
            id_style.font,
            id_style.size,
            text_w,
        );
        show_text(content, name_style, page.margin_side, center_y + 6.0, &name);
        show_text(content, id_style, page.margin_side, center_y - 10.0, &id_line);

        surface.record(Painted::IdentityBanner { placeholder });
        Ok(size + Self::TRAILING)
    }
}

/// Light rounded bar naming the section that follows.
pub struct SectionTitle {
    title: String,
}

impl SectionTitle {
    const LEAD: f32 = 3.0 * MM;
    const BAR: f32 = 7.0 * MM;

    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl ContentBlock for SectionTitle {
    fn height(&self, _config: &RenderConfig) -> Result<f32, Error> {
        Ok(Self::LEAD + Self::BAR)
    }

    fn paint(&self, surface: &mut PageSurface<'_>, top_y: f32) -> Result<f32, Error> {
        let config = surface.config();
        let (page, palette) = (&config.page, &config.palette);
        let content = surface.content()?;
        let bar_y = top_y - Self::LEAD - Self::BAR;
        content.save_state();
        set_fill(content, palette.header_bg);
        rounded_rect_path(content, page.margin_side, bar_y, page.content_width(), Self::BAR, 2.0 * MM);
        content.fill_nonzero();
        content.restore_state();

        let style = TextStyle::new(StdFont::HelveticaBold, 12.0, palette.primary);
        let title = fit_single_line(&self.title, style.font, style.size, page.content_width() - 6.0 * MM);
        show_text(content, style, page.margin_side + 3.0 * MM, top_y - Self::LEAD - 5.0 * MM, &title);

        surface.record(Painted::SectionTitle(self.title.clone()));
        Ok(Self::LEAD + Self::BAR)
    }
}

/// Titled free-text box of fixed height. Text that does not fit is dropped;
/// this block never breaks across pages.
pub struct TextPanel {
    title: String,
    body: String,
    box_height: f32,
}

impl TextPanel {
    pub const DEFAULT_HEIGHT: f32 = 30.0 * MM;
    pub const LINE_HEIGHT: f32 = 4.0 * MM;
    const TITLE_HEIGHT: f32 = 5.0 * MM;
    const INNER_PAD: f32 = 5.0 * MM;
    const FONT_SIZE: f32 = 9.0;

    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            box_height: Self::DEFAULT_HEIGHT,
        }
    }

    pub fn with_height(mut self, box_height: f32) -> Self {
        self.box_height = box_height;
        self
    }

    /// Number of lines the box can show.
    pub fn capacity(&self) -> usize {
        (self.box_height / Self::LINE_HEIGHT).floor().max(0.0) as usize
    }

    /// Body wrapped to the panel's inner width, before truncation.
    pub fn lines(&self, config: &RenderConfig) -> Vec<String> {
        let max_width = config.page.content_width() - 2.0 * Self::INNER_PAD;
        wrap_words(&self.body, StdFont::Helvetica, Self::FONT_SIZE, max_width)
    }
}

impl ContentBlock for TextPanel {
    fn height(&self, config: &RenderConfig) -> Result<f32, Error> {
        if !self.box_height.is_finite() || self.box_height <= 0.0 {
            return Err(Error::violation(format!(
                "text panel {:?} has invalid height {}",
                self.title, self.box_height
            )));
        }
        if config.page.content_width() <= 2.0 * Self::INNER_PAD {
            return Err(Error::violation("page too narrow for a text panel"));
        }
        Ok(Self::TITLE_HEIGHT + self.box_height)
    }

    fn paint(&self, surface: &mut PageSurface<'_>, top_y: f32) -> Result<f32, Error> {
        let height = self.height(surface.config())?;
        let config = surface.config();
        let (page, palette) = (&config.page, &config.palette);
        let lines = self.lines(config);
        let capacity = self.capacity();
        let shown = lines.len().min(capacity);

        let content = surface.content()?;
        let title_style = TextStyle::new(StdFont::HelveticaBold, 10.0, palette.text_dark);
        show_text(content, title_style, page.margin_side, top_y - 10.0 * ASCENT, &self.title);

        let box_top = top_y - Self::TITLE_HEIGHT;
        content.save_state();
        set_fill(content, WHITE);
        set_stroke(content, palette.border);
        content.set_line_width(1.0);
        rounded_rect_path(
            content,
            page.margin_side,
            box_top - self.box_height,
            page.content_width(),
            self.box_height,
            2.0 * MM,
        );
        content.fill_nonzero_and_stroke();
        content.restore_state();

        let body_style = TextStyle::new(StdFont::Helvetica, Self::FONT_SIZE, palette.text_dark);
        let slack = (self.box_height - capacity as f32 * Self::LINE_HEIGHT) / 2.0;
        let mut baseline = box_top - slack - Self::FONT_SIZE * ASCENT;
        for line in &lines[..shown] {
            show_text(content, body_style, page.margin_side + Self::INNER_PAD, baseline, line);
            baseline -= Self::LINE_HEIGHT;
        }

        let dropped = lines.len() - shown;
        if dropped > 0 {
            log::debug!("text panel {:?}: {dropped} line(s) past capacity {capacity} not shown", self.title);
        }
        surface.record(Painted::TextPanel {
            title: self.title.clone(),
            lines_shown: shown,
            lines_dropped: dropped,
        });
        Ok(height)
    }
}

/// Per-page footer in the bottom margin: rule, disclaimer, page number,
/// generation time.
#[derive(Clone, Debug)]
pub struct FooterBand {
    disclaimer: String,
    generated_at: NaiveDateTime,
}

impl FooterBand {
    pub const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";
    /// Distance of the text baseline below the bottom margin.
    const DROP: f32 = 10.0 * MM;

    pub fn new(config: &RenderConfig, generated_at: NaiveDateTime) -> Self {
        Self {
            disclaimer: config.disclaimer.clone(),
            generated_at,
        }
    }

    pub fn timestamp(&self) -> String {
        self.generated_at.format(Self::TIMESTAMP_FORMAT).to_string()
    }
}

impl ContentBlock for FooterBand {
    fn height(&self, config: &RenderConfig) -> Result<f32, Error> {
        Ok(config.page.margin_bottom)
    }

    /// Painted at a fixed position; `top_y` is ignored.
    fn paint(&self, surface: &mut PageSurface<'_>, _top_y: f32) -> Result<f32, Error> {
        let config = surface.config();
        let (page, palette) = (&config.page, &config.palette);
        let page_label = format!("Page {}", surface.page_number());
        let generated = self.timestamp();

        let content = surface.content()?;
        let rule_y = page.margin_bottom;
        let footer_y = (rule_y - Self::DROP).max(0.0);
        stroke_line(
            content,
            page.margin_side,
            rule_y,
            page.width - page.margin_side,
            rule_y,
            0.5,
            palette.border,
        );

        let disclaimer_style = TextStyle::new(StdFont::Helvetica, 7.0, palette.text_light);
        let disclaimer = fit_single_line(&self.disclaimer, disclaimer_style.font, 7.0, page.content_width());
        show_text_centered(content, disclaimer_style, page.width / 2.0, footer_y + 6.0 * MM, &disclaimer);

        let meta_style = TextStyle::new(StdFont::Helvetica, 8.0, palette.text_light);
        show_text(content, meta_style, page.margin_side, footer_y, &page_label);
        show_text_right(
            content,
            meta_style,
            page.width - page.margin_side,
            footer_y,
            &format!("Generated: {generated}"),
        );

        surface.record(Painted::Footer { page_label, generated });
        Ok(page.margin_bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_from_first_two_words() {
        assert_eq!(initials("Juan Dela Cruz"), "JD");
        assert_eq!(initials("maria"), "M");
        assert_eq!(initials("  ana   reyes "), "AR");
    }

    #[test]
    fn initials_of_empty_name_are_empty() {
        assert_eq!(initials(""), "");
        assert_eq!(initials("   "), "");
    }

    #[test]
    fn text_panel_capacity_is_height_over_line_height() {
        assert_eq!(TextPanel::new("Notes", "").capacity(), 7);
        assert_eq!(TextPanel::new("Notes", "").with_height(10.0 * MM).capacity(), 2);
    }

    #[test]
    fn text_panel_rejects_non_positive_height() {
        let config = RenderConfig::default();
        assert!(TextPanel::new("Notes", "x").with_height(0.0).height(&config).is_err());
        assert!(TextPanel::new("Notes", "x").with_height(-5.0).height(&config).is_err());
    }

    #[test]
    fn text_panel_drops_lines_past_capacity() {
        use crate::pdf::{PageChrome, PageSurface};

        let config = RenderConfig::default();
        let at = chrono::NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let chrome = PageChrome {
            footer: FooterBand::new(&config, at),
            continuation: ContinuationBanner::new(&config, "Ana Reyes", "PT-2"),
        };
        let mut surface = PageSurface::new(&config, chrome).unwrap();
        surface.begin(&HeaderBand::without_logo(&config)).unwrap();

        let panel = TextPanel::new("Doctor's Notes", "follow up in two weeks ".repeat(100));
        let total = panel.lines(&config).len();
        assert!(total > panel.capacity());
        surface.place(&panel).unwrap();
        surface.place(&TextPanel::new("Remarks", "")).unwrap();
        let rendered = surface.finalize().unwrap();

        let panels: Vec<_> = rendered.pages[0]
            .painted
            .iter()
            .filter(|p| matches!(p, Painted::TextPanel { .. }))
            .cloned()
            .collect();
        assert_eq!(
            panels,
            vec![
                Painted::TextPanel {
                    title: "Doctor's Notes".into(),
                    lines_shown: 7,
                    lines_dropped: total - 7,
                },
                Painted::TextPanel {
                    title: "Remarks".into(),
                    lines_shown: 0,
                    lines_dropped: 0,
                },
            ]
        );
    }

    #[test]
    fn footer_timestamp_format() {
        let config = RenderConfig::default();
        let at = chrono::NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(FooterBand::new(&config, at).timestamp(), "2026-01-02 03:04:05");
    }
}
