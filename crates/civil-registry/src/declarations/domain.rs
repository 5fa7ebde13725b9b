use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marital-status label applied whenever the parents are recorded as unmarried.
pub const MARITAL_STATUS_UNMARRIED: &str = "Non marié";
/// Default parent status for a new draft.
pub const PARENT_ALIVE: &str = "Vivant";
pub const PARENT_DECEASED: &str = "Décédé";

pub const SEX_MALE: &str = "M";
pub const SEX_FEMALE: &str = "F";

/// Key under which the store keeps the server-stamped declaration time.
pub const DECLARATION_TIMESTAMP_KEY: &str = "dateDeclaration";

/// Schemaless document body as exchanged with the document store.
pub type DocumentFields = Map<String, Value>;

/// Identity assigned by the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclarationId(pub String);

impl fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-progress birth declaration as edited through the tabbed form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeclarationDraft {
    pub nom: String,
    pub prenom: String,
    pub date_naissance: String,
    pub heure_naissance: String,
    pub lieu_naissance: String,
    pub sexe: String,

    pub nom_pere: String,
    pub prenom_pere: String,
    pub date_naissance_pere: String,
    pub lieu_naissance_pere: String,
    pub profession_pere: String,
    pub nationalite_pere: String,
    pub adresse_pere: String,
    pub piece_id_pere: String,
    pub statut_pere: String,

    pub nom_mere: String,
    pub prenom_mere: String,
    pub nom_jeune_fille_mere: String,
    pub date_naissance_mere: String,
    pub lieu_naissance_mere: String,
    pub profession_mere: String,
    pub nationalite_mere: String,
    pub adresse_mere: String,
    pub piece_id_mere: String,
    pub statut_mere: String,

    pub statut_marital: String,
    pub parents_maries: bool,
    pub date_mariage_parents: String,
    pub lieu_mariage_parents: String,

    pub nom_declarant: String,
    pub prenom_declarant: String,
    pub adresse_declarant: String,
    pub lien_declarant: String,
    pub piece_id_declarant: String,

    pub certificat_accouchement: String,
    pub livret_famille: String,
    pub acte_naiss_pere: String,
    pub acte_naiss_mere: String,
    pub acte_reconnaissance: String,
    pub certificat_nationalite: String,
}

impl Default for DeclarationDraft {
    fn default() -> Self {
        Self {
            nom: String::new(),
            prenom: String::new(),
            date_naissance: String::new(),
            heure_naissance: String::new(),
            lieu_naissance: String::new(),
            sexe: SEX_MALE.to_string(),
            nom_pere: String::new(),
            prenom_pere: String::new(),
            date_naissance_pere: String::new(),
            lieu_naissance_pere: String::new(),
            profession_pere: String::new(),
            nationalite_pere: String::new(),
            adresse_pere: String::new(),
            piece_id_pere: String::new(),
            statut_pere: PARENT_ALIVE.to_string(),
            nom_mere: String::new(),
            prenom_mere: String::new(),
            nom_jeune_fille_mere: String::new(),
            date_naissance_mere: String::new(),
            lieu_naissance_mere: String::new(),
            profession_mere: String::new(),
            nationalite_mere: String::new(),
            adresse_mere: String::new(),
            piece_id_mere: String::new(),
            statut_mere: PARENT_ALIVE.to_string(),
            statut_marital: MARITAL_STATUS_UNMARRIED.to_string(),
            parents_maries: false,
            date_mariage_parents: String::new(),
            lieu_mariage_parents: String::new(),
            nom_declarant: String::new(),
            prenom_declarant: String::new(),
            adresse_declarant: String::new(),
            lien_declarant: String::new(),
            piece_id_declarant: String::new(),
            certificat_accouchement: String::new(),
            livret_famille: String::new(),
            acte_naiss_pere: String::new(),
            acte_naiss_mere: String::new(),
            acte_reconnaissance: String::new(),
            certificat_nationalite: String::new(),
        }
    }
}

/// Names of every draft field, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    Nom,
    Prenom,
    DateNaissance,
    HeureNaissance,
    LieuNaissance,
    Sexe,
    NomPere,
    PrenomPere,
    DateNaissancePere,
    LieuNaissancePere,
    ProfessionPere,
    NationalitePere,
    AdressePere,
    PieceIdPere,
    StatutPere,
    NomMere,
    PrenomMere,
    NomJeuneFilleMere,
    DateNaissanceMere,
    LieuNaissanceMere,
    ProfessionMere,
    NationaliteMere,
    AdresseMere,
    PieceIdMere,
    StatutMere,
    StatutMarital,
    ParentsMaries,
    DateMariageParents,
    LieuMariageParents,
    NomDeclarant,
    PrenomDeclarant,
    AdresseDeclarant,
    LienDeclarant,
    PieceIdDeclarant,
    CertificatAccouchement,
    LivretFamille,
    ActeNaissPere,
    ActeNaissMere,
    ActeReconnaissance,
    CertificatNationalite,
}

/// How a field is captured by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Date,
    Select,
    Checkbox,
}

impl DraftField {
    pub const ALL: [DraftField; 40] = [
        DraftField::Nom,
        DraftField::Prenom,
        DraftField::DateNaissance,
        DraftField::HeureNaissance,
        DraftField::LieuNaissance,
        DraftField::Sexe,
        DraftField::NomPere,
        DraftField::PrenomPere,
        DraftField::DateNaissancePere,
        DraftField::LieuNaissancePere,
        DraftField::ProfessionPere,
        DraftField::NationalitePere,
        DraftField::AdressePere,
        DraftField::PieceIdPere,
        DraftField::StatutPere,
        DraftField::NomMere,
        DraftField::PrenomMere,
        DraftField::NomJeuneFilleMere,
        DraftField::DateNaissanceMere,
        DraftField::LieuNaissanceMere,
        DraftField::ProfessionMere,
        DraftField::NationaliteMere,
        DraftField::AdresseMere,
        DraftField::PieceIdMere,
        DraftField::StatutMere,
        DraftField::StatutMarital,
        DraftField::ParentsMaries,
        DraftField::DateMariageParents,
        DraftField::LieuMariageParents,
        DraftField::NomDeclarant,
        DraftField::PrenomDeclarant,
        DraftField::AdresseDeclarant,
        DraftField::LienDeclarant,
        DraftField::PieceIdDeclarant,
        DraftField::CertificatAccouchement,
        DraftField::LivretFamille,
        DraftField::ActeNaissPere,
        DraftField::ActeNaissMere,
        DraftField::ActeReconnaissance,
        DraftField::CertificatNationalite,
    ];

    /// Identity-document numbers checked against the alphanumeric pattern.
    pub const IDENTITY_DOCUMENTS: [DraftField; 3] = [
        DraftField::PieceIdPere,
        DraftField::PieceIdMere,
        DraftField::PieceIdDeclarant,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DraftField::Nom => "nom",
            DraftField::Prenom => "prenom",
            DraftField::DateNaissance => "dateNaissance",
            DraftField::HeureNaissance => "heureNaissance",
            DraftField::LieuNaissance => "lieuNaissance",
            DraftField::Sexe => "sexe",
            DraftField::NomPere => "nomPere",
            DraftField::PrenomPere => "prenomPere",
            DraftField::DateNaissancePere => "dateNaissancePere",
            DraftField::LieuNaissancePere => "lieuNaissancePere",
            DraftField::ProfessionPere => "professionPere",
            DraftField::NationalitePere => "nationalitePere",
            DraftField::AdressePere => "adressePere",
            DraftField::PieceIdPere => "pieceIdPere",
            DraftField::StatutPere => "statutPere",
            DraftField::NomMere => "nomMere",
            DraftField::PrenomMere => "prenomMere",
            DraftField::NomJeuneFilleMere => "nomJeuneFilleMere",
            DraftField::DateNaissanceMere => "dateNaissanceMere",
            DraftField::LieuNaissanceMere => "lieuNaissanceMere",
            DraftField::ProfessionMere => "professionMere",
            DraftField::NationaliteMere => "nationaliteMere",
            DraftField::AdresseMere => "adresseMere",
            DraftField::PieceIdMere => "pieceIdMere",
            DraftField::StatutMere => "statutMere",
            DraftField::StatutMarital => "statutMarital",
            DraftField::ParentsMaries => "parentsMaries",
            DraftField::DateMariageParents => "dateMariageParents",
            DraftField::LieuMariageParents => "lieuMariageParents",
            DraftField::NomDeclarant => "nomDeclarant",
            DraftField::PrenomDeclarant => "prenomDeclarant",
            DraftField::AdresseDeclarant => "adresseDeclarant",
            DraftField::LienDeclarant => "lienDeclarant",
            DraftField::PieceIdDeclarant => "pieceIdDeclarant",
            DraftField::CertificatAccouchement => "certificatAccouchement",
            DraftField::LivretFamille => "livretFamille",
            DraftField::ActeNaissPere => "acteNaissPere",
            DraftField::ActeNaissMere => "acteNaissMere",
            DraftField::ActeReconnaissance => "acteReconnaissance",
            DraftField::CertificatNationalite => "certificatNationalite",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            DraftField::ParentsMaries => FieldKind::Checkbox,
            DraftField::DateNaissance
            | DraftField::DateNaissancePere
            | DraftField::DateNaissanceMere
            | DraftField::DateMariageParents => FieldKind::Date,
            DraftField::Sexe | DraftField::StatutPere | DraftField::StatutMere => {
                FieldKind::Select
            }
            _ => FieldKind::Text,
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! text_accessors {
    ($($variant:ident => $field:ident),* $(,)?) => {
        impl DeclarationDraft {
            /// Current value of a text-valued field; `None` for the checkbox.
            pub fn text(&self, field: DraftField) -> Option<&str> {
                match field {
                    $(DraftField::$variant => Some(self.$field.as_str()),)*
                    DraftField::ParentsMaries => None,
                }
            }

            pub(crate) fn text_mut(&mut self, field: DraftField) -> Option<&mut String> {
                match field {
                    $(DraftField::$variant => Some(&mut self.$field),)*
                    DraftField::ParentsMaries => None,
                }
            }
        }
    };
}

text_accessors! {
    Nom => nom,
    Prenom => prenom,
    DateNaissance => date_naissance,
    HeureNaissance => heure_naissance,
    LieuNaissance => lieu_naissance,
    Sexe => sexe,
    NomPere => nom_pere,
    PrenomPere => prenom_pere,
    DateNaissancePere => date_naissance_pere,
    LieuNaissancePere => lieu_naissance_pere,
    ProfessionPere => profession_pere,
    NationalitePere => nationalite_pere,
    AdressePere => adresse_pere,
    PieceIdPere => piece_id_pere,
    StatutPere => statut_pere,
    NomMere => nom_mere,
    PrenomMere => prenom_mere,
    NomJeuneFilleMere => nom_jeune_fille_mere,
    DateNaissanceMere => date_naissance_mere,
    LieuNaissanceMere => lieu_naissance_mere,
    ProfessionMere => profession_mere,
    NationaliteMere => nationalite_mere,
    AdresseMere => adresse_mere,
    PieceIdMere => piece_id_mere,
    StatutMere => statut_mere,
    StatutMarital => statut_marital,
    DateMariageParents => date_mariage_parents,
    LieuMariageParents => lieu_mariage_parents,
    NomDeclarant => nom_declarant,
    PrenomDeclarant => prenom_declarant,
    AdresseDeclarant => adresse_declarant,
    LienDeclarant => lien_declarant,
    PieceIdDeclarant => piece_id_declarant,
    CertificatAccouchement => certificat_accouchement,
    LivretFamille => livret_famille,
    ActeNaissPere => acte_naiss_pere,
    ActeNaissMere => acte_naiss_mere,
    ActeReconnaissance => acte_reconnaissance,
    CertificatNationalite => certificat_nationalite,
}

impl DeclarationDraft {
    /// Build the store payload: draft fields, integer marital flag and declaration time.
    pub fn to_document(&self, declared_at: &str) -> DocumentFields {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        fields.insert(
            DraftField::ParentsMaries.as_str().to_string(),
            Value::from(u8::from(self.parents_maries)),
        );
        fields.insert(
            DECLARATION_TIMESTAMP_KEY.to_string(),
            Value::String(declared_at.to_string()),
        );
        fields
    }
}

/// Failure to read a stored document back into a declaration.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("declaration {id}: unreadable parentsMaries value {found}")]
    MaritalFlag { id: DeclarationId, found: Value },
    #[error("declaration {id}: {source}")]
    Decode {
        id: DeclarationId,
        #[source]
        source: serde_json::Error,
    },
}

/// Declaration as persisted by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub id: DeclarationId,
    #[serde(flatten)]
    pub draft: DeclarationDraft,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_declaration: Option<String>,
}

impl Declaration {
    /// Decode a stored document. Missing fields fall back to draft defaults and the
    /// stored 0/1 marital flag maps back to a boolean.
    pub fn from_document(
        id: DeclarationId,
        mut fields: DocumentFields,
    ) -> Result<Self, DocumentError> {
        let parents_maries = match fields.remove(DraftField::ParentsMaries.as_str()) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => flag,
            Some(Value::Number(number)) => number.as_f64().map_or(false, |value| value != 0.0),
            Some(other) => return Err(DocumentError::MaritalFlag { id, found: other }),
        };
        let date_declaration = match fields.remove(DECLARATION_TIMESTAMP_KEY) {
            Some(Value::String(stamp)) => Some(stamp),
            _ => None,
        };

        let mut draft: DeclarationDraft = serde_json::from_value(Value::Object(fields))
            .map_err(|source| DocumentError::Decode {
                id: id.clone(),
                source,
            })?;
        draft.parents_maries = parents_maries;

        Ok(Self {
            id,
            draft,
            date_declaration,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.draft.prenom, self.draft.nom)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_names_round_trip_through_lookup() {
        for field in DraftField::ALL {
            assert_eq!(DraftField::from_name(field.as_str()), Some(field));
        }
        assert_eq!(DraftField::from_name("unknown"), None);
    }

    #[test]
    fn serde_names_match_field_names() {
        let value = serde_json::to_value(DeclarationDraft::default()).expect("serializes");
        let object = value.as_object().expect("object");
        assert_eq!(object.len(), DraftField::ALL.len());
        for field in DraftField::ALL {
            assert!(object.contains_key(field.as_str()), "missing {field}");
        }
    }

    #[test]
    fn document_stores_marital_flag_as_integer() {
        let mut draft = DeclarationDraft::default();
        draft.parents_maries = true;

        let fields = draft.to_document("2024-01-06T08:00:00.000Z");
        assert_eq!(fields.get("parentsMaries"), Some(&json!(1)));
        assert_eq!(
            fields.get("dateDeclaration"),
            Some(&json!("2024-01-06T08:00:00.000Z"))
        );

        draft.parents_maries = false;
        assert_eq!(draft.to_document("x").get("parentsMaries"), Some(&json!(0)));
    }

    #[test]
    fn stored_flag_maps_back_to_boolean() {
        let id = DeclarationId("decl-1".to_string());
        let married = Declaration::from_document(
            id.clone(),
            json!({ "nom": "Rakoto", "parentsMaries": 1 })
                .as_object()
                .cloned()
                .expect("object"),
        )
        .expect("decodes");
        assert!(married.draft.parents_maries);

        let legacy = Declaration::from_document(
            id.clone(),
            json!({ "parentsMaries": true }).as_object().cloned().expect("object"),
        )
        .expect("decodes");
        assert!(legacy.draft.parents_maries);

        let unmarried = Declaration::from_document(
            id,
            json!({ "parentsMaries": 0 }).as_object().cloned().expect("object"),
        )
        .expect("decodes");
        assert!(!unmarried.draft.parents_maries);
    }

    #[test]
    fn missing_fields_take_draft_defaults() {
        let declaration = Declaration::from_document(
            DeclarationId("decl-2".to_string()),
            json!({ "nom": "Rasoa", "dateDeclaration": "2024-02-01T00:00:00.000Z" })
                .as_object()
                .cloned()
                .expect("object"),
        )
        .expect("decodes");

        assert_eq!(declaration.draft.nom, "Rasoa");
        assert_eq!(declaration.draft.sexe, SEX_MALE);
        assert_eq!(declaration.draft.statut_marital, MARITAL_STATUS_UNMARRIED);
        assert_eq!(
            declaration.date_declaration.as_deref(),
            Some("2024-02-01T00:00:00.000Z")
        );
    }

    #[test]
    fn rejects_textual_marital_flag() {
        let result = Declaration::from_document(
            DeclarationId("decl-3".to_string()),
            json!({ "parentsMaries": "oui" }).as_object().cloned().expect("object"),
        );
        assert!(matches!(result, Err(DocumentError::MaritalFlag { .. })));
    }
}
