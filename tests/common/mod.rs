#![allow(dead_code)]

use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime};
use clinic_record_pdf::model::{ArchivedComplaint, Complaint, Patient};
use clinic_record_pdf::{InMemoryStore, RenderConfig};

pub const PHOTO_REF: &str = "/media/patient_profiles/juan.png";

/// Footer timestamp used by every deterministic export.
pub fn generated_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 14)
        .unwrap()
        .and_hms_opt(9, 26, 53)
        .unwrap()
}

pub fn config() -> RenderConfig {
    RenderConfig::default()
}

pub fn patient() -> Patient {
    Patient {
        patient_id: "PT-20260001".into(),
        firstname: "Juan".into(),
        middlename: Some("Dela".into()),
        lastname: "Cruz".into(),
        address: "Block 12 Lot 4, Mabini Street, Barangay San Isidro, Quezon City".into(),
        birthdate: NaiveDate::from_ymd_opt(1980, 2, 29).unwrap(),
        age: 46,
        gender: "Male".into(),
        contact_number: "+63 917 555 0101".into(),
        blood_pressure: Some("120/80".into()),
        weight: Some(70.0),
        height: Some(172.5),
        profile_image: None,
    }
}

pub fn complaint(id: u64, chief_complaint: &str) -> Complaint {
    Complaint {
        id,
        patient_id: "PT-20260001".into(),
        chief_complaint: chief_complaint.into(),
        lab_examination: Some("CBC, chest X-ray".into()),
        test_result: None,
        final_diagnosis: Some("Acute bronchitis".into()),
        treatment: Some("Rest, fluids, salbutamol inhaler as needed".into()),
        date_created: None,
    }
}

pub fn archive(id: u64, chief_complaint: &str) -> ArchivedComplaint {
    let p = patient();
    ArchivedComplaint {
        id,
        patient_id: p.patient_id,
        firstname: p.firstname,
        middlename: None,
        lastname: p.lastname,
        address: p.address,
        birthdate: p.birthdate,
        age: p.age,
        gender: p.gender,
        contact_number: p.contact_number,
        blood_pressure: None,
        weight: None,
        height: None,
        profile_image: None,
        chief_complaint: chief_complaint.into(),
        lab_examination: None,
        test_result: None,
        final_diagnosis: None,
        treatment: None,
        archived_at: None,
    }
}

/// Roughly `len` characters of complaint prose.
pub fn long_text(len: usize) -> String {
    let sentence = "Persistent productive cough with intermittent fever and chest tightness at night. ";
    let mut text = sentence.repeat(len / sentence.len() + 1);
    text.truncate(len);
    text
}

pub fn store_with(complaint: Complaint, patient: Patient) -> InMemoryStore {
    InMemoryStore::new().with_patient(patient).with_complaint(complaint)
}

pub fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(w, h, |x, y| image::Rgba([(x * 7) as u8, (y * 5) as u8, 160, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn jpeg_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(w, h, image::Rgb([0, 151, 167]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

/// Decompressed content stream of every page, in page order.
pub fn page_contents(bytes: &[u8]) -> Vec<String> {
    let doc = lopdf::Document::load_mem(bytes).expect("generated PDF parses");
    doc.get_pages()
        .values()
        .map(|id| {
            let raw = doc.get_page_content(*id).expect("page content");
            String::from_utf8_lossy(&raw).into_owned()
        })
        .collect()
}

pub fn page_count(bytes: &[u8]) -> usize {
    lopdf::Document::load_mem(bytes)
        .expect("generated PDF parses")
        .get_pages()
        .len()
}

/// Colour image XObjects in the file. Soft masks are DeviceGray and not counted.
pub fn rgb_image_count(bytes: &[u8]) -> usize {
    let doc = lopdf::Document::load_mem(bytes).expect("generated PDF parses");
    let name_is = |dict: &lopdf::Dictionary, key: &[u8], want: &[u8]| {
        dict.get(key).and_then(|v| v.as_name()).is_ok_and(|n| n == want)
    };
    doc.objects
        .values()
        .filter_map(|o| o.as_stream().ok())
        .filter(|s| name_is(&s.dict, b"Subtype", b"Image") && name_is(&s.dict, b"ColorSpace", b"DeviceRGB"))
        .count()
}
