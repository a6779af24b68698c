mod common;

use std::fs;
use std::path::Path;
use std::process::Command;

use clinic_record_pdf::{Error, ExportRequest, InMemoryStore, NoAssets, export, export_to_file};

fn write_records(dir: &Path) -> std::path::PathBuf {
    let store = InMemoryStore::new()
        .with_patient(common::patient())
        .with_complaint(common::complaint(11, "Sore throat"))
        .with_archive(common::archive(21, "Back pain"));
    let path = dir.join("records.json");
    fs::write(&path, serde_json::to_string_pretty(&store).unwrap()).unwrap();
    path
}

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_clinic-record-pdf"))
}

#[test]
fn unknown_record_is_not_found_and_writes_nothing() {
    let store = InMemoryStore::new().with_patient(common::patient());
    let err = export(&store, &NoAssets, &common::config(), ExportRequest::Complaint(404)).unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: "complaint", .. }));

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.pdf");
    let err = export_to_file(&store, &NoAssets, &common::config(), ExportRequest::Archive(1), Some(&out));
    assert!(err.is_err_and(|e| e.is_not_found()));
    assert!(!out.exists());
}

#[test]
fn export_to_directory_uses_attachment_filename() {
    let dir = tempfile::tempdir().unwrap();
    let store = InMemoryStore::new().with_archive(common::archive(21, "Back pain"));
    let path = export_to_file(&store, &NoAssets, &common::config(), ExportRequest::Archive(21), Some(dir.path())).unwrap();
    assert_eq!(path, dir.path().join("patient_archive_21.pdf"));
    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert_eq!(common::page_count(&bytes), 1);
}

#[test]
fn cli_exports_complaint_and_archive() {
    let dir = tempfile::tempdir().unwrap();
    let records = write_records(dir.path());

    let out = dir.path().join("complaint.pdf");
    let status = cli()
        .arg("--records")
        .arg(&records)
        .arg("-o")
        .arg(&out)
        .args(["complaint", "11"])
        .env_remove("CLINIC_PDF_ASSETS")
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(common::page_count(&fs::read(&out).unwrap()), 1);

    let status = cli()
        .arg("--records")
        .arg(&records)
        .arg("-o")
        .arg(dir.path())
        .args(["archive", "21"])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(dir.path().join("patient_archive_21.pdf").is_file());
}

#[test]
fn cli_exits_non_zero_for_missing_record() {
    let dir = tempfile::tempdir().unwrap();
    let records = write_records(dir.path());
    let output = cli()
        .arg("--records")
        .arg(&records)
        .arg("-o")
        .arg(dir.path())
        .args(["archive", "999"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("archived complaint 999 not found"));
    assert!(!dir.path().join("patient_archive_999.pdf").exists());
}

#[test]
fn cli_applies_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let records = write_records(dir.path());
    let config = dir.path().join("render.json");
    fs::write(&config, r##"{"clinic_name": "Northside Family Clinic", "palette": {"primary": "#1E3A8A"}}"##).unwrap();

    let out = dir.path().join("c.pdf");
    let status = cli()
        .arg("--records")
        .arg(&records)
        .arg("--config")
        .arg(&config)
        .arg("-o")
        .arg(&out)
        .args(["complaint", "11"])
        .status()
        .unwrap();
    assert!(status.success());
    let contents = common::page_contents(&fs::read(&out).unwrap());
    assert!(contents[0].contains("(Northside Family Clinic) Tj"));
}

#[test]
fn cli_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let records = write_records(dir.path());
    let config = dir.path().join("render.json");
    fs::write(&config, r#"{"page": {"margin_side": 400}}"#).unwrap();
    let status = cli()
        .arg("--records")
        .arg(&records)
        .arg("--config")
        .arg(&config)
        .args(["complaint", "11"])
        .current_dir(dir.path())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}
