use crate::config::{RenderConfig, Rgb};
use crate::error::Error;
use crate::fonts::StdFont;

use super::blocks::{ContentBlock, SectionTitle};
use super::layout::{TextStyle, fill_rect, fit_single_line, show_text, stroke_line, stroke_rect, wrap_words};
use super::{GUTTER, PageSurface, Painted, body_capacity};

const HEADER_FONT_SIZE: f32 = 10.0;
const HEADER_PAD: f32 = 8.0;
const HEADER_LEADING: f32 = 12.0;
const BODY_FONT_SIZE: f32 = 9.0;
const BODY_PAD: f32 = 6.0;
const BODY_LEADING: f32 = 11.0;
const GRID_WIDTH: f32 = 0.5;
const BOX_WIDTH: f32 = 1.0;
const CONTINUED: &str = "(cont.)";

/// Header row plus data rows. Designated columns word-wrap; all other cells
/// are single-line. Rows never straddle a page: a paginated table is painted
/// in chunks, each with its own copy of the header row.
#[derive(Clone, Debug)]
pub struct InfoTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    wrap: Vec<usize>,
    col_widths: Option<Vec<f32>>,
}

/// One physical row, already broken into lines per cell.
#[derive(Debug)]
struct RowLayout {
    /// First-column text, for the paint log.
    label: String,
    cells: Vec<Vec<String>>,
    height: f32,
    /// Index of the source row; continuation rows share it, and with it
    /// their background.
    source: usize,
}

impl InfoTable {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            header,
            rows,
            wrap: Vec::new(),
            col_widths: None,
        }
    }

    /// Let cells in column `col` wrap onto several lines.
    pub fn wrap_column(mut self, col: usize) -> Self {
        if !self.wrap.contains(&col) {
            self.wrap.push(col);
        }
        self
    }

    /// Explicit column widths in points. Defaults to an even split of the
    /// content width.
    pub fn with_col_widths(mut self, widths: Vec<f32>) -> Self {
        self.col_widths = Some(widths);
        self
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn header_height() -> f32 {
        HEADER_LEADING + 2.0 * HEADER_PAD
    }

    fn column_widths(&self, config: &RenderConfig) -> Result<Vec<f32>, Error> {
        let ncols = self.header.len();
        if ncols < 2 {
            return Err(Error::violation(format!("table needs at least 2 columns, got {ncols}")));
        }
        if let Some(i) = self.rows.iter().position(|r| r.len() != ncols) {
            return Err(Error::violation(format!(
                "table row {i} has {} cells, header has {ncols}",
                self.rows[i].len()
            )));
        }
        if let Some(col) = self.wrap.iter().find(|&&c| c >= ncols) {
            return Err(Error::violation(format!("wrap column {col} out of range")));
        }

        let available = config.page.content_width();
        let widths = match &self.col_widths {
            None => vec![available / ncols as f32; ncols],
            Some(w) => {
                if w.len() != ncols {
                    return Err(Error::violation(format!(
                        "{} column widths for {ncols} columns",
                        w.len()
                    )));
                }
                if w.iter().any(|w| !w.is_finite() || *w <= 2.0 * BODY_PAD) {
                    return Err(Error::violation(format!("invalid column widths {w:?}")));
                }
                let total: f32 = w.iter().sum();
                if total > available + 0.01 {
                    return Err(Error::violation(format!(
                        "columns span {total:.1}pt, content width is {available:.1}pt"
                    )));
                }
                w.clone()
            }
        };
        Ok(widths)
    }

    fn cell_lines(&self, col: usize, text: &str, width: f32) -> Vec<String> {
        let inner = width - 2.0 * BODY_PAD;
        if self.wrap.contains(&col) {
            let lines = wrap_words(text, StdFont::Helvetica, BODY_FONT_SIZE, inner);
            if lines.is_empty() { vec![String::new()] } else { lines }
        } else {
            vec![fit_single_line(text, StdFont::Helvetica, BODY_FONT_SIZE, inner)]
        }
    }

    /// Break every row into lines, splitting rows taller than `max_row_height`
    /// into continuation rows.
    fn layout_rows(&self, widths: &[f32], max_row_height: f32) -> Result<Vec<RowLayout>, Error> {
        let max_lines = ((max_row_height - 2.0 * BODY_PAD) / BODY_LEADING).floor();
        if max_lines < 1.0 {
            return Err(Error::violation(format!(
                "no room for a single table row ({max_row_height:.1}pt available)"
            )));
        }
        let max_lines = max_lines as usize;

        let mut out = Vec::with_capacity(self.rows.len());
        for (source, row) in self.rows.iter().enumerate() {
            let cells: Vec<Vec<String>> = row
                .iter()
                .enumerate()
                .map(|(col, text)| self.cell_lines(col, text, widths[col]))
                .collect();
            let line_count = cells.iter().map(Vec::len).max().unwrap_or(1);
            let pieces = line_count.div_ceil(max_lines);
            if pieces > 1 {
                log::debug!("table row {source} needs {line_count} lines, split into {pieces} rows");
            }

            for piece in 0..pieces {
                let piece_cells: Vec<Vec<String>> = cells
                    .iter()
                    .enumerate()
                    .map(|(col, lines)| {
                        if self.wrap.contains(&col) {
                            lines.iter().skip(piece * max_lines).take(max_lines).cloned().collect()
                        } else if piece == 0 {
                            lines.clone()
                        } else if col == 0 {
                            let label = format!("{} {CONTINUED}", row[0].trim());
                            vec![fit_single_line(&label, StdFont::Helvetica, BODY_FONT_SIZE, widths[0] - 2.0 * BODY_PAD)]
                        } else {
                            Vec::new()
                        }
                    })
                    .collect();
                let lines = piece_cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
                let label = piece_cells[0].first().cloned().unwrap_or_default();
                out.push(RowLayout {
                    label,
                    cells: piece_cells,
                    height: lines as f32 * BODY_LEADING + 2.0 * BODY_PAD,
                    source,
                });
            }
        }
        Ok(out)
    }

    fn paint_chunk(
        &self,
        surface: &mut PageSurface<'_>,
        top_y: f32,
        widths: &[f32],
        rows: &[RowLayout],
    ) -> Result<f32, Error> {
        let config = surface.config();
        let palette = &config.palette;
        let left = config.page.margin_side;
        let total_w: f32 = widths.iter().sum();
        let col_x: Vec<f32> = widths
            .iter()
            .scan(left, |x, w| {
                let start = *x;
                *x += w;
                Some(start)
            })
            .collect();

        let content = surface.content()?;
        let header_h = Self::header_height();
        fill_rect(content, left, top_y - header_h, total_w, header_h, palette.primary);
        let header_style = TextStyle::new(StdFont::HelveticaBold, HEADER_FONT_SIZE, [255, 255, 255]);
        for (col, title) in self.header.iter().enumerate() {
            let text = fit_single_line(title, header_style.font, header_style.size, widths[col] - 2.0 * HEADER_PAD);
            show_text(content, header_style, col_x[col] + HEADER_PAD, top_y - HEADER_PAD - HEADER_FONT_SIZE, &text);
        }

        let body_style = TextStyle::new(StdFont::Helvetica, BODY_FONT_SIZE, palette.text_dark);
        let mut y = top_y - header_h;
        let mut row_edges = Vec::with_capacity(rows.len());
        for row in rows {
            let bg: Rgb = if row.source % 2 == 0 { [255, 255, 255] } else { palette.alt_row_bg };
            fill_rect(content, left, y - row.height, total_w, row.height, bg);
            for (col, lines) in row.cells.iter().enumerate() {
                let mut baseline = y - BODY_PAD - BODY_FONT_SIZE;
                for line in lines {
                    show_text(content, body_style, col_x[col] + BODY_PAD, baseline, line);
                    baseline -= BODY_LEADING;
                }
            }
            y -= row.height;
            row_edges.push(y);
        }

        let bottom = y;
        let right = left + total_w;
        // Grid: row separators, then column separators, then the outer box.
        stroke_line(content, left, top_y - header_h, right, top_y - header_h, GRID_WIDTH, palette.border);
        for edge in &row_edges[..row_edges.len().saturating_sub(1)] {
            stroke_line(content, left, *edge, right, *edge, GRID_WIDTH, palette.border);
        }
        for x in &col_x[1..] {
            stroke_line(content, *x, top_y, *x, bottom, GRID_WIDTH, palette.border);
        }
        stroke_rect(content, left, bottom, total_w, top_y - bottom, BOX_WIDTH, palette.border);

        surface.record(Painted::TableChunk {
            header: self.header.clone(),
            rows: rows.iter().map(|r| r.label.clone()).collect(),
        });
        Ok(top_y - bottom)
    }

    /// Paint the table across as many pages as it needs, starting at the
    /// cursor. A section title, if given, is kept on the same page as the
    /// header row and first data row. Returns the number of chunks painted.
    pub fn flow(&self, surface: &mut PageSurface<'_>, title: Option<&SectionTitle>) -> Result<usize, Error> {
        let config = surface.config();
        let widths = self.column_widths(config)?;
        let header_h = Self::header_height();
        let title_slot = match title {
            Some(t) => t.height(config)? + GUTTER,
            None => 0.0,
        };
        let rows = self.layout_rows(&widths, body_capacity(&config.page) - header_h - title_slot)?;

        let mut pending_title = title;
        if rows.is_empty() {
            log::debug!("table {:?} has no rows, header suppressed", self.header);
            if let Some(t) = pending_title {
                surface.place(t)?;
            }
            return Ok(0);
        }

        let mut chunks = 0;
        let mut start = 0;
        while start < rows.len() {
            let lead = if pending_title.is_some() { title_slot } else { 0.0 };
            surface.ensure_space(lead + header_h + rows[start].height)?;
            if let Some(t) = pending_title.take() {
                let top = surface.cursor();
                let used = t.paint(surface, top)?;
                surface.advance(used)?;
            }

            let available = surface.remaining();
            let mut used = header_h;
            let mut end = start;
            while end < rows.len() && used + rows[end].height <= available {
                log::debug!(
                    "TABLE row={} label={:?} row_h={:.2} chunk_h={:.2} remaining={:.2}",
                    end,
                    rows[end].label,
                    rows[end].height,
                    used,
                    available
                );
                used += rows[end].height;
                end += 1;
            }
            if end == start {
                return Err(Error::violation(format!(
                    "table row {start} ({:.1}pt) does not fit after a page break",
                    rows[start].height
                )));
            }

            let top = surface.cursor();
            let painted = self.paint_chunk(surface, top, &widths, &rows[start..end])?;
            surface.advance(painted)?;
            chunks += 1;
            start = end;
            if start < rows.len() {
                surface.break_page()?;
            }
        }
        Ok(chunks)
    }
}

impl ContentBlock for InfoTable {
    /// Height of the whole table as one chunk.
    fn height(&self, config: &RenderConfig) -> Result<f32, Error> {
        let widths = self.column_widths(config)?;
        let header_h = Self::header_height();
        let rows = self.layout_rows(&widths, body_capacity(&config.page) - header_h)?;
        if rows.is_empty() {
            return Ok(0.0);
        }
        Ok(header_h + rows.iter().map(|r| r.height).sum::<f32>())
    }

    /// Paint the whole table at `top_y` without breaking. Use [`InfoTable::flow`]
    /// for tables that may run past the page.
    fn paint(&self, surface: &mut PageSurface<'_>, top_y: f32) -> Result<f32, Error> {
        let config = surface.config();
        let widths = self.column_widths(config)?;
        let rows = self.layout_rows(&widths, body_capacity(&config.page) - Self::header_height())?;
        if rows.is_empty() {
            return Ok(0.0);
        }
        self.paint_chunk(surface, top_y, &widths, &rows)
    }
}
