//! Single-field edit state for the task detail view.

use serde::Serialize;

use crate::error::Result;
use crate::task::{FieldUpdate, Task, TaskField};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditingField {
    pub field: TaskField,
    pub draft: String,
}

/// At most one field is being edited at a time.
#[derive(Debug, Clone, Default)]
pub struct FieldEditor {
    editing: Option<EditingField>,
}

impl FieldEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing `field`, seeding the draft from `task`. Replaces any open edit.
    pub fn begin(&mut self, task: &Task, field: TaskField) -> &EditingField {
        self.editing.insert(EditingField {
            field,
            draft: field.current_text(task),
        })
    }

    /// Returns false when no edit is open.
    pub fn set_draft(&mut self, draft: impl Into<String>) -> bool {
        match self.editing.as_mut() {
            Some(editing) => {
                editing.draft = draft.into();
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self) -> Option<EditingField> {
        self.editing.take()
    }

    /// Parse the draft. The edit stays open so a failed save can be retried.
    pub fn commit(&self) -> Result<Option<FieldUpdate>> {
        self.editing
            .as_ref()
            .map(|editing| FieldUpdate::parse(editing.field, &editing.draft))
            .transpose()
    }

    pub fn finish(&mut self) {
        self.editing = None;
    }

    pub fn editing(&self) -> Option<&EditingField> {
        self.editing.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }
}
