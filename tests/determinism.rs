mod common;

use chrono::Duration;
use clinic_record_pdf::pdf::Painted;
use clinic_record_pdf::{ExportRequest, MemoryAssets, NoAssets, export_at};
use regex::Regex;

#[test]
fn same_record_and_timestamp_give_identical_bytes() {
    let store = common::store_with(common::complaint(1, &common::long_text(3_000)), common::patient());
    let config = common::config();
    let first = export_at(&store, &NoAssets, &config, ExportRequest::Complaint(1), common::generated_at()).unwrap();
    let second = export_at(&store, &NoAssets, &config, ExportRequest::Complaint(1), common::generated_at()).unwrap();
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(first.pages, second.pages);
}

#[test]
fn images_do_not_break_determinism() {
    let mut patient = common::patient();
    patient.profile_image = Some(common::PHOTO_REF.into());
    let store = common::store_with(common::complaint(1, "Cough"), patient);
    let assets = MemoryAssets::default()
        .with_logo(common::jpeg_bytes(64, 64))
        .with_file(common::PHOTO_REF, common::png_bytes(30, 40));
    let render = || {
        export_at(&store, &assets, &common::config(), ExportRequest::Complaint(1), common::generated_at())
            .unwrap()
            .bytes
    };
    assert_eq!(render(), render());
}

#[test]
fn timestamp_is_the_only_varying_content() {
    let store = common::store_with(common::complaint(1, "Cough"), common::patient());
    let config = common::config();
    let at = common::generated_at();
    let a = export_at(&store, &NoAssets, &config, ExportRequest::Complaint(1), at).unwrap();
    let b = export_at(&store, &NoAssets, &config, ExportRequest::Complaint(1), at + Duration::seconds(1)).unwrap();
    assert_ne!(a.bytes, b.bytes);

    let strip = |pages: &[clinic_record_pdf::pdf::PageLog]| -> Vec<Painted> {
        pages
            .iter()
            .flat_map(|p| p.painted.iter().cloned())
            .filter(|p| !matches!(p, Painted::Footer { .. }))
            .collect()
    };
    assert_eq!(strip(&a.pages), strip(&b.pages));
}

#[test]
fn footer_shows_page_number_and_generation_time() {
    let store = common::store_with(common::complaint(2, &common::long_text(4_000)), common::patient());
    let doc = export_at(&store, &NoAssets, &common::config(), ExportRequest::Complaint(2), common::generated_at()).unwrap();

    let stamp = Regex::new(r"\(Generated: (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\) Tj").unwrap();
    let contents = common::page_contents(&doc.bytes);
    assert!(contents.len() >= 2);
    for (i, content) in contents.iter().enumerate() {
        let found: Vec<&str> = stamp
            .captures_iter(content)
            .map(|c| c.get(1).unwrap().as_str())
            .collect();
        assert_eq!(found, ["2026-03-14 09:26:53"], "page {}", i + 1);
        assert!(content.contains(&format!("(Page {}) Tj", i + 1)));
    }

    for page in &doc.pages {
        let footer = page.painted.iter().find_map(|p| match p {
            Painted::Footer { page_label, generated } => Some((page_label.clone(), generated.clone())),
            _ => None,
        });
        assert_eq!(
            footer,
            Some((format!("Page {}", page.number), "2026-03-14 09:26:53".to_string()))
        );
    }
}
