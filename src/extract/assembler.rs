//! Final entity composition

use crate::types::{Entity, SourceRecord};

/// Combines normalized fields with the source record's identifiers.
///
/// Field validity is established upstream by the name and title
/// normalizers; nothing is re-checked here.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityAssembler;

impl EntityAssembler {
    pub fn assemble(
        &self,
        first_name: String,
        last_name: String,
        job_title: String,
        record: &SourceRecord,
    ) -> Entity {
        Entity {
            first_name,
            last_name,
            job_title,
            contact: record.contact.clone(),
            origin: record.origin.clone(),
        }
    }
}
