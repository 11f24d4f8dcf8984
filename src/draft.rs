// Form state for editing a record before it is submitted.

use crate::error::{ConsoleError, ConsoleResult};
use crate::types::{DummyRecord, RecordId, RecordPayload};

/// Length limit shared by every record field.
pub const MAX_FIELD_CHARS: usize = 100;

/// Whether submitting the form creates a record or replaces an existing one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Creating,
    Editing(RecordId),
}

/// The editable fields of a record, as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordDraft {
    pub name: String,
    pub description: String,
    pub optional_field: String,
}

impl RecordDraft {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        optional_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            optional_field: optional_field.into(),
        }
    }

    /// Checks field lengths: name and description 1 to 100 characters,
    /// optional field at most 100.
    pub fn validate(&self) -> ConsoleResult<()> {
        required("name", &self.name)?;
        required("description", &self.description)?;
        if self.optional_field.chars().count() > MAX_FIELD_CHARS {
            return Err(ConsoleError::Validation(format!(
                "optional field must be at most {MAX_FIELD_CHARS} characters"
            )));
        }
        Ok(())
    }

    /// Validated request body; an empty optional field becomes `None`.
    pub fn to_payload(&self) -> ConsoleResult<RecordPayload> {
        self.validate()?;
        Ok(RecordPayload::new(
            self.name.clone(),
            self.description.clone(),
            Some(self.optional_field.clone()),
        ))
    }
}

fn required(field: &str, value: &str) -> ConsoleResult<()> {
    let len = value.chars().count();
    if len == 0 || len > MAX_FIELD_CHARS {
        return Err(ConsoleError::Validation(format!(
            "{field} must be 1 to {MAX_FIELD_CHARS} characters"
        )));
    }
    Ok(())
}

/// A draft plus the mode it will be submitted in. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormDraft {
    pub mode: EditMode,
    pub fields: RecordDraft,
}

impl FormDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an existing record for editing.
    pub fn edit(record: &DummyRecord) -> Self {
        Self {
            mode: EditMode::Editing(record.id),
            fields: RecordDraft::new(
                record.name.clone(),
                record.description.clone(),
                record.optional_field.clone().unwrap_or_default(),
            ),
        }
    }

    /// Switches mode. Any typed fields are dropped.
    pub fn switch_mode(&mut self, mode: EditMode) {
        self.mode = mode;
        self.fields = RecordDraft::default();
    }

    /// Back to an empty create form.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
