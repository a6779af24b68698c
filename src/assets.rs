use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Environment variable naming the branding/media directory.
pub const ASSET_DIR_ENV: &str = "CLINIC_PDF_ASSETS";

const LOGO_CANDIDATES: [&str; 3] = ["logo.png", "logo.jpg", "logo.jpeg"];

/// Byte source for the clinic logo and stored image references (patient
/// photos). Implementations only fetch bytes; decoding happens in the renderer.
pub trait AssetSource {
    /// Logo bytes, or `ErrorKind::NotFound` when the clinic has none.
    fn logo(&self) -> io::Result<Vec<u8>>;

    /// Resolve a stored path or URL reference such as
    /// `/media/patient_profiles/p1.jpg`.
    fn resolve(&self, reference: &str) -> io::Result<Vec<u8>>;
}

/// No logo and no images; every photo falls back to initials.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAssets;

impl AssetSource for NoAssets {
    fn logo(&self) -> io::Result<Vec<u8>> {
        Err(io::ErrorKind::NotFound.into())
    }

    fn resolve(&self, _reference: &str) -> io::Result<Vec<u8>> {
        Err(io::ErrorKind::NotFound.into())
    }
}

/// Assets under one directory. References are taken relative to it, with any
/// URL scheme/host and leading slashes dropped.
#[derive(Clone, Debug)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory from `CLINIC_PDF_ASSETS`, if set and non-empty.
    pub fn from_env() -> Option<Self> {
        std::env::var(ASSET_DIR_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Self::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn local_path(&self, reference: &str) -> io::Result<PathBuf> {
        let path_part = match reference.split_once("://") {
            Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
            None => reference,
        };
        let relative = Path::new(path_part.trim_start_matches(['/', '\\']));
        if relative.as_os_str().is_empty() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "empty image reference"));
        }
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("reference escapes the asset directory: {reference}"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetSource for DirAssets {
    fn logo(&self) -> io::Result<Vec<u8>> {
        for name in LOGO_CANDIDATES {
            let path = self.root.join(name);
            if path.is_file() {
                return std::fs::read(&path);
            }
        }
        Err(io::ErrorKind::NotFound.into())
    }

    fn resolve(&self, reference: &str) -> io::Result<Vec<u8>> {
        let path = self.local_path(reference)?;
        std::fs::read(&path).map_err(|e| io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
    }
}

/// In-memory assets keyed by reference string.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssets {
    pub logo: Option<Vec<u8>>,
    pub files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn with_logo(mut self, bytes: Vec<u8>) -> Self {
        self.logo = Some(bytes);
        self
    }

    pub fn with_file(mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.files.insert(reference.into(), bytes);
        self
    }
}

impl AssetSource for MemoryAssets {
    fn logo(&self) -> io::Result<Vec<u8>> {
        self.logo.clone().ok_or_else(|| io::ErrorKind::NotFound.into())
    }

    fn resolve(&self, reference: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(reference)
            .cloned()
            .ok_or_else(|| io::ErrorKind::NotFound.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_resolve_under_the_root() {
        let assets = DirAssets::new("/srv/clinic");
        assert_eq!(
            assets.local_path("/media/patient_profiles/p1.jpg").unwrap(),
            PathBuf::from("/srv/clinic/media/patient_profiles/p1.jpg")
        );
        assert_eq!(
            assets.local_path("http://localhost:8000/media/p1.jpg").unwrap(),
            PathBuf::from("/srv/clinic/media/p1.jpg")
        );
    }

    #[test]
    fn parent_components_are_refused() {
        let assets = DirAssets::new("/srv/clinic");
        let err = assets.local_path("../../etc/passwd").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(assets.local_path("").unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn missing_files_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let assets = DirAssets::new(dir.path());
        assert_eq!(assets.logo().unwrap_err().kind(), io::ErrorKind::NotFound);
        assert_eq!(assets.resolve("media/none.png").unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn logo_is_picked_up_from_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logo.jpg"), b"jpeg").unwrap();
        let assets = DirAssets::new(dir.path());
        assert_eq!(assets.logo().unwrap(), b"jpeg");
    }
}
