use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::domain::{DeclarationDraft, DraftField};

pub const MSG_NOM_REQUIRED: &str = "Nom obligatoire";
pub const MSG_PRENOM_REQUIRED: &str = "Prénom obligatoire";
pub const MSG_DATE_NAISSANCE_REQUIRED: &str = "Date de naissance obligatoire";
pub const MSG_DATE_MARIAGE_REQUIRED: &str = "Date de mariage obligatoire";
pub const MSG_LIEU_MARIAGE_REQUIRED: &str = "Lieu de mariage obligatoire";
pub const MSG_NOM_PERE_REQUIRED: &str = "Nom du père obligatoire";
pub const MSG_PRENOM_PERE_REQUIRED: &str = "Prénom du père obligatoire";
pub const MSG_NOM_MERE_REQUIRED: &str = "Nom de la mère obligatoire";
pub const MSG_PRENOM_MERE_REQUIRED: &str = "Prénom de la mère obligatoire";
pub const MSG_IDENTITY_DOCUMENT_INVALID: &str =
    "Pièce d'identité invalide (9 à 12 caractères alphanumériques)";

const IDENTITY_DOCUMENT_MIN_LEN: usize = 9;
const IDENTITY_DOCUMENT_MAX_LEN: usize = 12;

/// Field-level messages produced by [`validate`]. Empty means the draft can be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<DraftField, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: DraftField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: DraftField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = DraftField> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DraftField, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn insert(&mut self, field: DraftField, message: &str) {
        self.0.insert(field, message.to_string());
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(|field| field.as_str()).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Check a draft against the declaration rules for its marital branch.
pub fn validate(draft: &DeclarationDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    require(&mut errors, DraftField::Nom, &draft.nom, MSG_NOM_REQUIRED);
    require(
        &mut errors,
        DraftField::Prenom,
        &draft.prenom,
        MSG_PRENOM_REQUIRED,
    );
    require(
        &mut errors,
        DraftField::DateNaissance,
        &draft.date_naissance,
        MSG_DATE_NAISSANCE_REQUIRED,
    );

    if draft.parents_maries {
        // Date inputs never carry padding, so only emptiness matters here.
        if draft.date_mariage_parents.is_empty() {
            errors.insert(DraftField::DateMariageParents, MSG_DATE_MARIAGE_REQUIRED);
        }
        require(
            &mut errors,
            DraftField::LieuMariageParents,
            &draft.lieu_mariage_parents,
            MSG_LIEU_MARIAGE_REQUIRED,
        );
        require(
            &mut errors,
            DraftField::NomPere,
            &draft.nom_pere,
            MSG_NOM_PERE_REQUIRED,
        );
        require(
            &mut errors,
            DraftField::PrenomPere,
            &draft.prenom_pere,
            MSG_PRENOM_PERE_REQUIRED,
        );
    } else {
        require(
            &mut errors,
            DraftField::NomMere,
            &draft.nom_mere,
            MSG_NOM_MERE_REQUIRED,
        );
        require(
            &mut errors,
            DraftField::PrenomMere,
            &draft.prenom_mere,
            MSG_PRENOM_MERE_REQUIRED,
        );
    }

    for field in DraftField::IDENTITY_DOCUMENTS {
        let value = draft.text(field).unwrap_or_default().trim();
        if !value.is_empty() && !is_identity_document_number(value) {
            errors.insert(field, MSG_IDENTITY_DOCUMENT_INVALID);
        }
    }

    errors
}

/// `^[A-Za-z0-9]{9,12}$`
pub fn is_identity_document_number(value: &str) -> bool {
    (IDENTITY_DOCUMENT_MIN_LEN..=IDENTITY_DOCUMENT_MAX_LEN).contains(&value.len())
        && value.bytes().all(|byte| byte.is_ascii_alphanumeric())
}

fn require(errors: &mut ValidationErrors, field: DraftField, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(field, message);
    }
}
