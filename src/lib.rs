pub mod assets;
pub mod config;
mod error;
pub mod export;
mod fonts;
pub mod model;
pub mod pdf;
pub mod store;

pub use assets::{AssetSource, DirAssets, MemoryAssets, NoAssets};
pub use config::RenderConfig;
pub use error::Error;
pub use export::{ExportRequest, ExportedDocument, export, export_at};
pub use model::RecordSnapshot;
pub use store::{InMemoryStore, RecordStore};

use std::path::{Path, PathBuf};
use std::time::Instant;

/// Export one record and write it to `output`, or to the record's attachment
/// filename inside `output` when that is a directory. Returns the path written.
pub fn export_to_file(
    store: &dyn RecordStore,
    assets: &dyn AssetSource,
    config: &RenderConfig,
    request: ExportRequest,
    output: Option<&Path>,
) -> Result<PathBuf, Error> {
    let doc = export(store, assets, config, request)?;
    let t0 = Instant::now();

    let path = match output {
        Some(p) if p.is_dir() => p.join(&doc.filename),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(&doc.filename),
    };
    std::fs::write(&path, &doc.bytes).map_err(Error::Io)?;

    log::info!(
        "Timing: write={:.1}ms ({} bytes, {} pages to {})",
        t0.elapsed().as_secs_f64() * 1000.0,
        doc.bytes.len(),
        doc.page_count(),
        path.display(),
    );
    Ok(path)
}
