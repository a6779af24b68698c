use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{ArchivedComplaint, Complaint, Patient};

/// Read access to the records an export needs. `None` means the id does not
/// resolve; the exporter turns that into [`Error::NotFound`].
pub trait RecordStore {
    /// A live complaint together with the patient it belongs to.
    fn patient_complaint(&self, complaint_id: u64) -> Option<(Patient, Complaint)>;

    fn archived_complaint(&self, archive_id: u64) -> Option<ArchivedComplaint>;
}

/// Records held in memory, loadable from a JSON document of the form
/// `{"patients": [...], "complaints": [...], "archives": [...]}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryStore {
    pub patients: Vec<Patient>,
    pub complaints: Vec<Complaint>,
    pub archives: Vec<ArchivedComplaint>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        let store = Self::from_json_str(&text)?;
        log::debug!(
            "loaded {} patient(s), {} complaint(s), {} archive(s) from {}",
            store.patients.len(),
            store.complaints.len(),
            store.archives.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn with_patient(mut self, patient: Patient) -> Self {
        self.patients.push(patient);
        self
    }

    pub fn with_complaint(mut self, complaint: Complaint) -> Self {
        self.complaints.push(complaint);
        self
    }

    pub fn with_archive(mut self, archive: ArchivedComplaint) -> Self {
        self.archives.push(archive);
        self
    }
}

impl RecordStore for InMemoryStore {
    fn patient_complaint(&self, complaint_id: u64) -> Option<(Patient, Complaint)> {
        let complaint = self.complaints.iter().find(|c| c.id == complaint_id)?;
        let patient = self.patients.iter().find(|p| p.patient_id == complaint.patient_id);
        if patient.is_none() {
            log::warn!(
                "complaint {complaint_id} references unknown patient {}",
                complaint.patient_id
            );
        }
        Some((patient?.clone(), complaint.clone()))
    }

    fn archived_complaint(&self, archive_id: u64) -> Option<ArchivedComplaint> {
        self.archives.iter().find(|a| a.id == archive_id).cloned()
    }
}
