use std::time::Instant;

use chrono::{Local, NaiveDateTime};

use crate::assets::AssetSource;
use crate::config::RenderConfig;
use crate::error::Error;
use crate::model::RecordSnapshot;
use crate::pdf::blocks::{ContinuationBanner, FooterBand, HeaderBand, IdentityBanner, SectionTitle};
use crate::pdf::table::InfoTable;
use crate::pdf::{PageChrome, PageLog, PageSurface, RenderedPdf};
use crate::store::RecordStore;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Which record to export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportRequest {
    /// A live complaint, rendered with its patient's current details.
    Complaint(u64),
    /// An archived complaint snapshot.
    Archive(u64),
}

impl ExportRequest {
    /// Attachment filename the dashboard offers for download.
    pub fn filename(&self) -> String {
        match self {
            ExportRequest::Complaint(id) => format!("patient_complaint_{id}.pdf"),
            ExportRequest::Archive(id) => format!("patient_archive_{id}.pdf"),
        }
    }
}

#[derive(Debug)]
pub struct ExportedDocument {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
    pub pages: Vec<PageLog>,
}

impl ExportedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Look up the record behind `request` and flatten it for rendering.
pub fn resolve(store: &dyn RecordStore, request: ExportRequest) -> Result<RecordSnapshot, Error> {
    match request {
        ExportRequest::Complaint(id) => store
            .patient_complaint(id)
            .map(|(patient, complaint)| RecordSnapshot::from_live(&patient, &complaint))
            .ok_or_else(|| Error::NotFound {
                kind: "complaint",
                id: id.to_string(),
            }),
        ExportRequest::Archive(id) => store
            .archived_complaint(id)
            .map(|archive| RecordSnapshot::from_archive(&archive))
            .ok_or_else(|| Error::NotFound {
                kind: "archived complaint",
                id: id.to_string(),
            }),
    }
}

/// Export with the current local time in the footer.
pub fn export(
    store: &dyn RecordStore,
    assets: &dyn AssetSource,
    config: &RenderConfig,
    request: ExportRequest,
) -> Result<ExportedDocument, Error> {
    export_at(store, assets, config, request, Local::now().naive_local())
}

/// Export with a fixed footer timestamp. The same record and timestamp always
/// give the same bytes.
pub fn export_at(
    store: &dyn RecordStore,
    assets: &dyn AssetSource,
    config: &RenderConfig,
    request: ExportRequest,
    generated_at: NaiveDateTime,
) -> Result<ExportedDocument, Error> {
    let t0 = Instant::now();

    let snapshot = resolve(store, request)?;
    let t_resolve = t0.elapsed();

    let rendered = render_snapshot(&snapshot, assets, config, generated_at)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: resolve={:.1}ms, render={:.1}ms, total={:.1}ms (output {} bytes, {} pages)",
        t_resolve.as_secs_f64() * 1000.0,
        (t_total - t_resolve).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        rendered.bytes.len(),
        rendered.pages.len(),
    );

    Ok(ExportedDocument {
        bytes: rendered.bytes,
        content_type: PDF_CONTENT_TYPE,
        filename: request.filename(),
        pages: rendered.pages,
    })
}

fn with_header(header: [&str; 2], rows: Vec<Vec<String>>) -> InfoTable {
    InfoTable::new(header.iter().map(|h| h.to_string()).collect(), rows)
}

/// Lay out one snapshot: header band, identity banner, then the personal,
/// medical and complaint sections.
pub fn render_snapshot(
    snapshot: &RecordSnapshot,
    assets: &dyn AssetSource,
    config: &RenderConfig,
    generated_at: NaiveDateTime,
) -> Result<RenderedPdf, Error> {
    let chrome = PageChrome {
        footer: FooterBand::new(config, generated_at),
        continuation: ContinuationBanner::new(config, &snapshot.full_name, &snapshot.patient_id),
    };
    let mut surface = PageSurface::new(config, chrome)?;
    surface.set_title(format!("{} - {}", snapshot.full_name, config.subtitle));

    surface.begin(&HeaderBand::new(config, assets))?;
    surface.place(&IdentityBanner::new(
        &snapshot.full_name,
        &snapshot.patient_id,
        snapshot.photo.as_deref(),
        assets,
    ))?;

    let sections = [
        (
            "Personal Information",
            with_header(["Field", "Value"], snapshot.personal_rows()),
        ),
        (
            "Medical Information",
            with_header(["Parameter", "Value"], snapshot.medical_rows()),
        ),
        (
            snapshot.complaint_section_title(),
            with_header(["Field", "Information"], snapshot.complaint_rows()).wrap_column(1),
        ),
    ];
    for (title, table) in &sections {
        let chunks = table.flow(&mut surface, Some(&SectionTitle::new(*title)))?;
        log::debug!("section {title:?}: {} row(s) in {chunks} chunk(s)", table.row_count());
    }

    surface.finalize()
}
