use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: String,
    pub firstname: String,
    #[serde(default)]
    pub middlename: Option<String>,
    pub lastname: String,
    pub address: String,
    pub birthdate: NaiveDate,
    pub age: u32,
    pub gender: String,
    pub contact_number: String,
    #[serde(default)]
    pub blood_pressure: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>, // kg
    #[serde(default)]
    pub height: Option<f64>, // cm
    /// Stored path or URL of the profile photo.
    #[serde(default)]
    pub profile_image: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Complaint {
    pub id: u64,
    /// `Patient::patient_id` this complaint belongs to.
    pub patient_id: String,
    pub chief_complaint: String,
    #[serde(default)]
    pub lab_examination: Option<String>,
    #[serde(default)]
    pub test_result: Option<String>,
    #[serde(default)]
    pub final_diagnosis: Option<String>,
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub date_created: Option<NaiveDateTime>,
}

/// Self-contained copy of a patient and one complaint, taken when the
/// complaint was archived. Holds no relation to the live tables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchivedComplaint {
    pub id: u64,
    pub patient_id: String,
    pub firstname: String,
    #[serde(default)]
    pub middlename: Option<String>,
    pub lastname: String,
    pub address: String,
    pub birthdate: NaiveDate,
    pub age: u32,
    pub gender: String,
    pub contact_number: String,
    #[serde(default)]
    pub blood_pressure: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub profile_image: Option<String>,
    pub chief_complaint: String,
    #[serde(default)]
    pub lab_examination: Option<String>,
    #[serde(default)]
    pub test_result: Option<String>,
    #[serde(default)]
    pub final_diagnosis: Option<String>,
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub archived_at: Option<NaiveDateTime>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotSource {
    LiveComplaint,
    Archive,
}

/// Fully resolved, display-ready field set for one export.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSnapshot {
    pub source: SnapshotSource,
    /// Store id of the complaint or archive entry (used in the filename).
    pub record_id: u64,
    pub patient_id: String,
    pub full_name: String,
    pub birthdate: String,
    pub age: String,
    pub gender: String,
    pub contact_number: String,
    pub address: String,
    pub blood_pressure: String,
    pub weight: String,
    pub height: String,
    pub chief_complaint: String,
    pub lab_examination: String,
    pub test_result: String,
    pub final_diagnosis: String,
    pub treatment: String,
    pub photo: Option<String>,
}

impl RecordSnapshot {
    pub fn from_live(patient: &Patient, complaint: &Complaint) -> Self {
        Self {
            source: SnapshotSource::LiveComplaint,
            record_id: complaint.id,
            patient_id: patient.patient_id.clone(),
            full_name: full_name(&patient.firstname, patient.middlename.as_deref(), &patient.lastname),
            birthdate: patient.birthdate.format("%Y-%m-%d").to_string(),
            age: patient.age.to_string(),
            gender: patient.gender.clone(),
            contact_number: patient.contact_number.clone(),
            address: patient.address.clone(),
            blood_pressure: or_na(patient.blood_pressure.as_deref()),
            weight: measurement(patient.weight, "kg"),
            height: measurement(patient.height, "cm"),
            chief_complaint: complaint.chief_complaint.clone(),
            lab_examination: or_na(complaint.lab_examination.as_deref()),
            test_result: or_na(complaint.test_result.as_deref()),
            final_diagnosis: or_na(complaint.final_diagnosis.as_deref()),
            treatment: or_na(complaint.treatment.as_deref()),
            photo: non_blank(patient.profile_image.as_deref()).map(str::to_string),
        }
    }

    pub fn from_archive(archive: &ArchivedComplaint) -> Self {
        Self {
            source: SnapshotSource::Archive,
            record_id: archive.id,
            patient_id: archive.patient_id.clone(),
            full_name: full_name(&archive.firstname, archive.middlename.as_deref(), &archive.lastname),
            birthdate: archive.birthdate.format("%Y-%m-%d").to_string(),
            age: archive.age.to_string(),
            gender: archive.gender.clone(),
            contact_number: archive.contact_number.clone(),
            address: archive.address.clone(),
            blood_pressure: or_na(archive.blood_pressure.as_deref()),
            weight: measurement(archive.weight, "kg"),
            height: measurement(archive.height, "cm"),
            chief_complaint: archive.chief_complaint.clone(),
            lab_examination: or_na(archive.lab_examination.as_deref()),
            test_result: or_na(archive.test_result.as_deref()),
            final_diagnosis: or_na(archive.final_diagnosis.as_deref()),
            treatment: or_na(archive.treatment.as_deref()),
            photo: non_blank(archive.profile_image.as_deref()).map(str::to_string),
        }
    }

    pub fn personal_rows(&self) -> Vec<Vec<String>> {
        vec![
            vec!["Date of Birth".into(), self.birthdate.clone()],
            vec!["Age".into(), self.age.clone()],
            vec!["Gender".into(), self.gender.clone()],
            vec!["Contact Number".into(), self.contact_number.clone()],
            vec!["Address".into(), self.address.clone()],
        ]
    }

    pub fn medical_rows(&self) -> Vec<Vec<String>> {
        vec![
            vec!["Blood Pressure".into(), self.blood_pressure.clone()],
            vec!["Weight".into(), self.weight.clone()],
            vec!["Height".into(), self.height.clone()],
        ]
    }

    pub fn complaint_rows(&self) -> Vec<Vec<String>> {
        vec![
            vec!["Chief Complaint".into(), self.chief_complaint.clone()],
            vec!["Lab Examination".into(), self.lab_examination.clone()],
            vec!["Test Result".into(), self.test_result.clone()],
            vec!["Final Diagnosis".into(), self.final_diagnosis.clone()],
            vec!["Treatment".into(), self.treatment.clone()],
        ]
    }

    pub fn complaint_section_title(&self) -> &'static str {
        match self.source {
            SnapshotSource::Archive => "Complaint Details",
            SnapshotSource::LiveComplaint => "Current Complaint",
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn or_na(s: Option<&str>) -> String {
    non_blank(s).unwrap_or(NOT_AVAILABLE).to_string()
}

/// `first middle last`; a missing or blank middle name leaves a single space.
pub fn full_name(first: &str, middle: Option<&str>, last: &str) -> String {
    [Some(first), middle, Some(last)]
        .into_iter()
        .flatten()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Zero and missing measurements both read as `N/A`. Whole values keep one
/// decimal place so 70 kg prints as `70.0 kg`.
fn measurement(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if v != 0.0 && v.is_finite() => {
            if v.fract() == 0.0 {
                format!("{v:.1} {unit}")
            } else {
                format!("{v} {unit}")
            }
        }
        _ => NOT_AVAILABLE.to_string(),
    }
}
