use serde::{Deserialize, Serialize};

use super::domain::{
    Declaration, DeclarationDraft, DeclarationId, DraftField, FieldKind, MARITAL_STATUS_UNMARRIED,
};
use super::validation::{validate, ValidationErrors};

/// Tabs of the declaration form, in display order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormTab {
    #[default]
    Child,
    Parents,
    Declarant,
    Documents,
}

impl FormTab {
    pub const ALL: [FormTab; 4] = [
        FormTab::Child,
        FormTab::Parents,
        FormTab::Declarant,
        FormTab::Documents,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            FormTab::Child => 0,
            FormTab::Parents => 1,
            FormTab::Declarant => 2,
            FormTab::Documents => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormTab::Child => "Enfant",
            FormTab::Parents => "Parents",
            FormTab::Declarant => "Déclarant",
            FormTab::Documents => "Documents",
        }
    }
}

/// Value carried by a single field edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("unknown declaration field `{0}`")]
    UnknownField(String),
    #[error("field `{0}` is a checkbox and takes a boolean")]
    ExpectedFlag(DraftField),
    #[error("field `{0}` takes a text value")]
    ExpectedText(DraftField),
    #[error("tab index {0} is out of range (0..=3)")]
    TabOutOfRange(usize),
}

/// Form state for a declaration being created or edited.
///
/// A form without an identity is a new declaration; one built through
/// [`DeclarationForm::edit`] carries the identity of the stored record it updates.
#[derive(Debug, Clone, Default)]
pub struct DeclarationForm {
    draft: DeclarationDraft,
    identity: Option<DeclarationId>,
    tab: FormTab,
    errors: ValidationErrors,
}

impl DeclarationForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// New-declaration form seeded with caller-provided values.
    pub fn with_draft(draft: DeclarationDraft) -> Self {
        Self {
            draft,
            ..Self::default()
        }
    }

    pub fn edit(declaration: &Declaration) -> Self {
        Self::hydrate(declaration.id.clone(), declaration.draft.clone())
    }

    /// Edit form for a stored identity. Date-valued fields keep only their date part.
    pub fn hydrate(identity: DeclarationId, mut draft: DeclarationDraft) -> Self {
        for field in DraftField::ALL {
            if field.kind() != FieldKind::Date {
                continue;
            }
            if let Some(value) = draft.text_mut(field) {
                if let Some((date, _)) = value.split_once('T') {
                    *value = date.to_string();
                }
            }
        }

        Self {
            draft,
            identity: Some(identity),
            ..Self::default()
        }
    }

    pub fn draft(&self) -> &DeclarationDraft {
        &self.draft
    }

    pub fn identity(&self) -> Option<&DeclarationId> {
        self.identity.as_ref()
    }

    pub fn is_edit(&self) -> bool {
        self.identity.is_some()
    }

    pub fn current_tab(&self) -> FormTab {
        self.tab
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn set_field_by_name(
        &mut self,
        name: &str,
        value: FieldValue,
    ) -> Result<(), DraftError> {
        let field =
            DraftField::from_name(name).ok_or_else(|| DraftError::UnknownField(name.to_string()))?;
        self.set_field(field, value)
    }

    /// Assign one field. Clearing `parentsMaries` also wipes the marriage details and
    /// resets the marital-status label in the same step.
    pub fn set_field(&mut self, field: DraftField, value: FieldValue) -> Result<(), DraftError> {
        match (field, value) {
            (DraftField::ParentsMaries, FieldValue::Flag(married)) => {
                self.draft.parents_maries = married;
                if !married {
                    self.draft.date_mariage_parents.clear();
                    self.draft.lieu_mariage_parents.clear();
                    self.draft.statut_marital = MARITAL_STATUS_UNMARRIED.to_string();
                }
                Ok(())
            }
            (DraftField::ParentsMaries, FieldValue::Text(_)) => Err(DraftError::ExpectedFlag(field)),
            (_, FieldValue::Flag(_)) => Err(DraftError::ExpectedText(field)),
            (_, FieldValue::Text(text)) => {
                let slot = self
                    .draft
                    .text_mut(field)
                    .ok_or(DraftError::ExpectedFlag(field))?;
                *slot = text;
                Ok(())
            }
        }
    }

    pub fn switch_tab(&mut self, index: usize) -> Result<FormTab, DraftError> {
        let tab = FormTab::from_index(index).ok_or(DraftError::TabOutOfRange(index))?;
        self.tab = tab;
        Ok(tab)
    }

    /// Run validation and keep the result for inline display.
    pub fn validate(&mut self) -> bool {
        self.errors = validate(&self.draft);
        self.errors.is_empty()
    }

    pub(crate) fn set_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }
}
