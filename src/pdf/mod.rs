pub mod blocks;
pub(crate) mod image;
pub(crate) mod layout;
pub mod table;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::config::{MM, PageGeometry, RenderConfig};
use crate::error::Error;
use crate::fonts::{StdFont, register_fonts};

use blocks::{ContentBlock, ContinuationBanner, FooterBand, HeaderBand};
use image::LoadedImage;

/// Space left between consecutive blocks.
pub const GUTTER: f32 = 5.0 * MM;
/// Space between the page-1 header band and the first block.
const HEADER_GAP: f32 = 8.0 * MM;

/// Usable height of a continuation page: below the banner, above the footer.
pub(crate) fn body_capacity(page: &PageGeometry) -> f32 {
    page.height - page.margin_top - ContinuationBanner::HEIGHT - GUTTER - page.margin_bottom
}

/// Lifecycle of a [`PageSurface`]. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    Empty,
    PageOpen,
    Closed,
}

/// What a page received, in paint order.
#[derive(Clone, Debug, PartialEq)]
pub enum Painted {
    Header,
    ContinuationBanner,
    IdentityBanner {
        /// `Some(initials)` when the placeholder was drawn instead of a photo.
        placeholder: Option<String>,
    },
    SectionTitle(String),
    TableChunk {
        header: Vec<String>,
        /// First-column text of every data row in the chunk.
        rows: Vec<String>,
    },
    TextPanel {
        title: String,
        lines_shown: usize,
        lines_dropped: usize,
    },
    Footer {
        page_label: String,
        generated: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PageLog {
    pub number: usize,
    pub painted: Vec<Painted>,
}

impl PageLog {
    pub fn footers(&self) -> usize {
        self.painted
            .iter()
            .filter(|p| matches!(p, Painted::Footer { .. }))
            .count()
    }

    pub fn table_chunks(&self) -> impl Iterator<Item = (&[String], &[String])> {
        self.painted.iter().filter_map(|p| match p {
            Painted::TableChunk { header, rows } => Some((header.as_slice(), rows.as_slice())),
            _ => None,
        })
    }
}

/// Finished document plus the per-page paint log.
#[derive(Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub pages: Vec<PageLog>,
}

/// Chrome repainted by the surface itself on every page break.
#[derive(Clone)]
pub struct PageChrome {
    pub footer: FooterBand,
    pub continuation: ContinuationBanner,
}

/// Page flow controller for one output document: tracks the vertical cursor,
/// breaks pages, and paints the header, continuation banner and footers.
///
/// `Empty --begin--> PageOpen --ensure_space/break_page--> PageOpen --finalize--> Closed`
pub struct PageSurface<'a> {
    config: &'a RenderConfig,
    chrome: PageChrome,
    title: Option<String>,
    state: FlowState,

    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    fonts: Vec<(StdFont, Ref)>,
    image_xobjects: Vec<(String, Ref)>,

    sealed: Vec<Content>,
    content: Content,
    cursor: f32,
    page_number: usize,
    log: Vec<PageLog>,
}

impl<'a> PageSurface<'a> {
    pub fn new(config: &'a RenderConfig, chrome: PageChrome) -> Result<Self, Error> {
        config.page.validate()?;
        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };
        let catalog_id = alloc();
        let pages_id = alloc();
        let fonts = register_fonts(&mut pdf, &mut alloc);

        Ok(Self {
            config,
            chrome,
            title: None,
            state: FlowState::Empty,
            pdf,
            next_id,
            catalog_id,
            pages_id,
            fonts,
            image_xobjects: Vec::new(),
            sealed: Vec::new(),
            content: Content::new(),
            cursor: config.page.height - config.page.margin_top,
            page_number: 0,
            log: Vec::new(),
        })
    }

    /// Document title written to the info dictionary.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn config(&self) -> &'a RenderConfig {
        self.config
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    fn bottom(&self) -> f32 {
        self.config.page.margin_bottom
    }

    /// Vertical space left above the bottom margin on the open page.
    pub fn remaining(&self) -> f32 {
        self.cursor - self.bottom()
    }

    /// Usable height of a freshly opened continuation page.
    pub fn fresh_page_capacity(&self) -> f32 {
        body_capacity(&self.config.page)
    }

    fn require_open(&self, op: &str) -> Result<(), Error> {
        match self.state {
            FlowState::PageOpen => Ok(()),
            FlowState::Empty => Err(Error::violation(format!("{op} before the first page was opened"))),
            FlowState::Closed => Err(Error::violation(format!("{op} after finalize"))),
        }
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }

    /// Content stream of the open page.
    pub(crate) fn content(&mut self) -> Result<&mut Content, Error> {
        self.require_open("drawing")?;
        Ok(&mut self.content)
    }

    pub(crate) fn record(&mut self, painted: Painted) {
        if let Some(page) = self.log.last_mut() {
            page.painted.push(painted);
        }
    }

    /// Embed an image once and return the XObject name to paint it with.
    pub(crate) fn register_image(&mut self, img: &LoadedImage) -> Result<String, Error> {
        self.require_open("image registration")?;
        let mut next_id = self.next_id;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };
        let xobj_ref = image::embed(&mut self.pdf, img, &mut alloc);
        self.next_id = next_id;
        let name = format!("Im{}", self.image_xobjects.len() + 1);
        self.image_xobjects.push((name.clone(), xobj_ref));
        Ok(name)
    }

    /// `Empty -> PageOpen`: open page 1 and paint the branded header band.
    pub fn begin(&mut self, header: &HeaderBand) -> Result<(), Error> {
        if self.state != FlowState::Empty {
            return Err(Error::violation("begin called twice"));
        }
        self.state = FlowState::PageOpen;
        self.page_number = 1;
        self.log.push(PageLog {
            number: 1,
            painted: Vec::new(),
        });
        let top = self.config.page.height;
        let used = header.paint(self, top)?;
        self.cursor = top - used - HEADER_GAP;
        log::debug!("page 1 opened, cursor={:.2}", self.cursor);
        Ok(())
    }

    /// Break to a new page when `required` does not fit above the bottom
    /// margin. Returns whether a break happened.
    pub fn ensure_space(&mut self, required: f32) -> Result<bool, Error> {
        self.require_open("ensure_space")?;
        if !required.is_finite() || required < 0.0 {
            return Err(Error::violation(format!("invalid block height {required}")));
        }
        if self.cursor - required >= self.bottom() {
            return Ok(false);
        }
        if required > self.fresh_page_capacity() {
            return Err(Error::violation(format!(
                "block of {required:.1}pt cannot fit on any page (capacity {:.1}pt)",
                self.fresh_page_capacity()
            )));
        }
        self.break_page()?;
        Ok(true)
    }

    /// Seal the open page with its footer and open the next one.
    pub fn break_page(&mut self) -> Result<(), Error> {
        self.require_open("break_page")?;
        self.seal_page()?;
        self.page_number += 1;
        self.log.push(PageLog {
            number: self.page_number,
            painted: Vec::new(),
        });
        let top = self.config.page.height - self.config.page.margin_top;
        let banner = self.chrome.continuation.clone();
        let used = banner.paint(self, top)?;
        self.cursor = top - used - GUTTER;
        log::debug!("page {} opened, cursor={:.2}", self.page_number, self.cursor);
        Ok(())
    }

    fn seal_page(&mut self) -> Result<(), Error> {
        let footer = self.chrome.footer.clone();
        footer.paint(self, self.bottom())?;
        self.sealed.push(std::mem::replace(&mut self.content, Content::new()));
        Ok(())
    }

    /// Move the cursor past a painted block plus the inter-block gutter.
    pub fn advance(&mut self, consumed: f32) -> Result<(), Error> {
        self.require_open("advance")?;
        if !consumed.is_finite() || consumed < 0.0 {
            return Err(Error::violation(format!("invalid consumed height {consumed}")));
        }
        if self.cursor - consumed < self.bottom() - 0.01 {
            return Err(Error::violation(format!(
                "block of {consumed:.1}pt painted past the bottom margin ({:.1}pt left)",
                self.remaining()
            )));
        }
        // The gutter is blank space; it never pushes the cursor into the margin.
        self.cursor = (self.cursor - consumed - GUTTER).max(self.bottom());
        Ok(())
    }

    /// Measure, fit, paint, advance.
    pub fn place(&mut self, block: &dyn ContentBlock) -> Result<f32, Error> {
        let height = block.height(self.config)?;
        self.ensure_space(height)?;
        let top = self.cursor;
        let used = block.paint(self, top)?;
        self.advance(used)?;
        Ok(used)
    }

    /// Paint the last footer and serialize the document. Exactly once.
    pub fn finalize(&mut self) -> Result<RenderedPdf, Error> {
        self.require_open("finalize")?;
        self.seal_page()?;
        self.state = FlowState::Closed;

        let contents = std::mem::take(&mut self.sealed);
        let n = contents.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| self.alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| self.alloc()).collect();
        let info_id = self.alloc();
        let mut pdf = std::mem::replace(&mut self.pdf, Pdf::new());

        for (i, c) in contents.into_iter().enumerate() {
            let raw = c.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
        }

        pdf.catalog(self.catalog_id).pages(self.pages_id);
        pdf.pages(self.pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        let page = &self.config.page;
        for i in 0..n {
            let mut page_obj = pdf.page(page_ids[i]);
            page_obj
                .media_box(Rect::new(0.0, 0.0, page.width, page.height))
                .parent(self.pages_id)
                .contents(content_ids[i]);
            let mut resources = page_obj.resources();
            {
                let mut fonts = resources.fonts();
                for (font, font_ref) in &self.fonts {
                    fonts.pair(Name(font.pdf_name().as_bytes()), *font_ref);
                }
            }
            if !self.image_xobjects.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &self.image_xobjects {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        {
            let mut info = pdf.document_info(info_id);
            if let Some(title) = &self.title {
                info.title(TextStr(title));
            }
            info.producer(TextStr(concat!("clinic-record-pdf ", env!("CARGO_PKG_VERSION"))));
        }

        log::debug!("document finalized with {n} page(s)");
        Ok(RenderedPdf {
            bytes: pdf.finish(),
            pages: std::mem::take(&mut self.log),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use super::blocks::{IdentityBanner, TextPanel};

    fn chrome(config: &RenderConfig) -> PageChrome {
        let generated_at = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap();
        PageChrome {
            footer: FooterBand::new(config, generated_at),
            continuation: ContinuationBanner::new(config, "Juan Dela Cruz", "PT-20260001"),
        }
    }

    fn header(config: &RenderConfig) -> HeaderBand {
        HeaderBand::without_logo(config)
    }

    #[test]
    fn drawing_before_begin_is_a_violation() {
        let config = RenderConfig::default();
        let mut surface = PageSurface::new(&config, chrome(&config)).unwrap();
        assert_eq!(surface.state(), FlowState::Empty);
        assert!(matches!(surface.ensure_space(10.0), Err(Error::ContractViolation(_))));
        assert!(matches!(surface.finalize(), Err(Error::ContractViolation(_))));
    }

    #[test]
    fn ensure_space_breaks_only_when_needed() {
        let config = RenderConfig::default();
        let mut surface = PageSurface::new(&config, chrome(&config)).unwrap();
        surface.begin(&header(&config)).unwrap();
        let remaining = surface.remaining();
        assert!(!surface.ensure_space(remaining).unwrap());
        assert!(surface.ensure_space(remaining + 1.0).unwrap());
        assert_eq!(surface.page_number(), 2);
        assert!((surface.remaining() - surface.fresh_page_capacity()).abs() < 1e-3);
    }

    #[test]
    fn advance_adds_gutter() {
        let config = RenderConfig::default();
        let mut surface = PageSurface::new(&config, chrome(&config)).unwrap();
        surface.begin(&header(&config)).unwrap();
        let before = surface.cursor();
        surface.advance(20.0).unwrap();
        assert!((before - surface.cursor() - 20.0 - GUTTER).abs() < 1e-3);
    }

    #[test]
    fn block_taller_than_any_page_is_rejected() {
        let config = RenderConfig::default();
        let mut surface = PageSurface::new(&config, chrome(&config)).unwrap();
        surface.begin(&header(&config)).unwrap();
        let err = surface.ensure_space(config.page.height).unwrap_err();
        assert!(matches!(err, Error::ContractViolation(_)));
        assert_eq!(surface.page_number(), 1);
    }

    #[test]
    fn every_page_gets_one_footer_and_later_pages_a_banner() {
        let config = RenderConfig::default();
        let mut surface = PageSurface::new(&config, chrome(&config)).unwrap();
        surface.begin(&header(&config)).unwrap();
        let banner = IdentityBanner::placeholder_only("Juan Dela Cruz", "PT-20260001");
        for _ in 0..12 {
            surface.place(&banner).unwrap();
        }
        let rendered = surface.finalize().unwrap();
        assert!(rendered.pages.len() >= 3);
        for page in &rendered.pages {
            assert_eq!(page.footers(), 1, "page {}", page.number);
            let first = &page.painted[0];
            if page.number == 1 {
                assert_eq!(first, &Painted::Header);
            } else {
                assert_eq!(first, &Painted::ContinuationBanner);
            }
        }
        assert!(rendered.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn everything_after_finalize_fails_loudly() {
        let config = RenderConfig::default();
        let mut surface = PageSurface::new(&config, chrome(&config)).unwrap();
        surface.begin(&header(&config)).unwrap();
        surface.finalize().unwrap();
        assert_eq!(surface.state(), FlowState::Closed);

        let panel = TextPanel::new("Notes", "late");
        assert!(matches!(surface.place(&panel), Err(Error::ContractViolation(_))));
        assert!(matches!(surface.advance(1.0), Err(Error::ContractViolation(_))));
        assert!(matches!(surface.break_page(), Err(Error::ContractViolation(_))));
        assert!(matches!(surface.finalize(), Err(Error::ContractViolation(_))));
        assert!(matches!(surface.begin(&header(&config)), Err(Error::ContractViolation(_))));
    }

    #[test]
    fn negative_heights_are_violations() {
        let config = RenderConfig::default();
        let mut surface = PageSurface::new(&config, chrome(&config)).unwrap();
        surface.begin(&header(&config)).unwrap();
        assert!(surface.ensure_space(-1.0).is_err());
        assert!(surface.advance(f32::NAN).is_err());
    }
}
