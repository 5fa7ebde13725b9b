//! Headless field widgets: label, current value, input type and inline error for
//! each field shown on a tab of the declaration form.

use serde::Serialize;

use super::domain::{DraftField, PARENT_ALIVE, PARENT_DECEASED, SEX_FEMALE, SEX_MALE};
use super::draft::{DeclarationForm, FormTab};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

const SEX_OPTIONS: &[SelectOption] = &[
    SelectOption {
        value: SEX_MALE,
        label: "Garçon",
    },
    SelectOption {
        value: SEX_FEMALE,
        label: "Fille",
    },
];

const PARENT_STATUS_OPTIONS: &[SelectOption] = &[
    SelectOption {
        value: PARENT_ALIVE,
        label: "Vivant",
    },
    SelectOption {
        value: PARENT_DECEASED,
        label: "Décédé",
    },
];

const MARITAL_OPTIONS: &[SelectOption] = &[
    SelectOption {
        value: "true",
        label: "Mariés",
    },
    SelectOption {
        value: "false",
        label: "Non mariés",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Date,
    Select(&'static [SelectOption]),
    Radio(&'static [SelectOption]),
}

impl InputKind {
    fn html_type(self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Date => "date",
            InputKind::Select(_) => "select",
            InputKind::Radio(_) => "radio",
        }
    }

    fn options(self) -> &'static [SelectOption] {
        match self {
            InputKind::Select(options) | InputKind::Radio(options) => options,
            InputKind::Text | InputKind::Date => &[],
        }
    }
}

/// Static description of one labelled input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWidget {
    pub field: DraftField,
    pub label: &'static str,
    pub input: InputKind,
    pub required: bool,
}

const fn text(field: DraftField, label: &'static str) -> FieldWidget {
    FieldWidget {
        field,
        label,
        input: InputKind::Text,
        required: false,
    }
}

const fn date(field: DraftField, label: &'static str) -> FieldWidget {
    FieldWidget {
        field,
        label,
        input: InputKind::Date,
        required: false,
    }
}

const fn required(widget: FieldWidget) -> FieldWidget {
    FieldWidget {
        required: true,
        ..widget
    }
}

/// Rendered state of a widget for the current form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub value: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "has_no_options")]
    pub options: &'static [SelectOption],
}

fn has_no_options(options: &&'static [SelectOption]) -> bool {
    options.is_empty()
}

pub fn render(widget: &FieldWidget, form: &DeclarationForm) -> FieldView {
    let draft = form.draft();
    let value = match widget.field {
        DraftField::ParentsMaries => draft.parents_maries.to_string(),
        field => draft.text(field).unwrap_or_default().to_string(),
    };

    FieldView {
        name: widget.field.as_str(),
        label: widget.label,
        input_type: widget.input.html_type(),
        value,
        required: widget.required,
        error: form.errors().get(widget.field).map(str::to_string),
        options: widget.input.options(),
    }
}

const CHILD_WIDGETS: &[FieldWidget] = &[
    required(text(DraftField::Nom, "Nom de l'enfant")),
    required(text(DraftField::Prenom, "Prénom de l'enfant")),
    required(date(DraftField::DateNaissance, "Date de naissance")),
    text(DraftField::HeureNaissance, "Heure de naissance (HH:mm)"),
    text(DraftField::LieuNaissance, "Lieu de naissance"),
    FieldWidget {
        field: DraftField::Sexe,
        label: "Sexe",
        input: InputKind::Select(SEX_OPTIONS),
        required: false,
    },
];

const MARITAL_WIDGET: FieldWidget = FieldWidget {
    field: DraftField::ParentsMaries,
    label: "Statut marital des parents",
    input: InputKind::Radio(MARITAL_OPTIONS),
    required: false,
};

const FATHER_WIDGETS: &[FieldWidget] = &[
    required(text(DraftField::NomPere, "Nom du père")),
    required(text(DraftField::PrenomPere, "Prénom du père")),
    date(DraftField::DateNaissancePere, "Date de naissance du père"),
    text(DraftField::LieuNaissancePere, "Lieu de naissance du père"),
    text(DraftField::ProfessionPere, "Profession du père"),
    text(DraftField::NationalitePere, "Nationalité du père"),
    text(DraftField::AdressePere, "Adresse du père"),
    text(DraftField::PieceIdPere, "Numéro pièce d'identité du père"),
    FieldWidget {
        field: DraftField::StatutPere,
        label: "Statut du père",
        input: InputKind::Select(PARENT_STATUS_OPTIONS),
        required: false,
    },
];

const MOTHER_WIDGETS: &[FieldWidget] = &[
    required(text(DraftField::NomMere, "Nom de la mère")),
    required(text(DraftField::PrenomMere, "Prénom de la mère")),
    date(DraftField::DateNaissanceMere, "Date de naissance de la mère"),
    text(DraftField::LieuNaissanceMere, "Lieu de naissance de la mère"),
    text(DraftField::ProfessionMere, "Profession de la mère"),
    text(DraftField::NationaliteMere, "Nationalité de la mère"),
    text(DraftField::AdresseMere, "Adresse de la mère"),
    text(DraftField::PieceIdMere, "Numéro pièce d'identité de la mère"),
    FieldWidget {
        field: DraftField::StatutMere,
        label: "Statut de la mère",
        input: InputKind::Select(PARENT_STATUS_OPTIONS),
        required: false,
    },
];

const MARRIAGE_WIDGETS: &[FieldWidget] = &[
    date(DraftField::DateMariageParents, "Date de mariage"),
    text(DraftField::LieuMariageParents, "Lieu de mariage"),
];

const DECLARANT_WIDGETS: &[FieldWidget] = &[
    text(DraftField::NomDeclarant, "Nom du déclarant"),
    text(DraftField::PrenomDeclarant, "Prénom du déclarant"),
    text(DraftField::AdresseDeclarant, "Adresse du déclarant"),
    text(DraftField::LienDeclarant, "Lien avec l'enfant"),
    text(DraftField::PieceIdDeclarant, "Numéro pièce d'identité du déclarant"),
];

const DOCUMENT_WIDGETS: &[FieldWidget] = &[
    text(DraftField::CertificatAccouchement, "Certificat d'accouchement"),
    text(DraftField::LivretFamille, "Livret de famille"),
    text(DraftField::ActeNaissPere, "Acte de naissance du père"),
    text(DraftField::ActeNaissMere, "Acte de naissance de la mère"),
    text(DraftField::ActeReconnaissance, "Acte de reconnaissance"),
    text(DraftField::CertificatNationalite, "Certificat de nationalité"),
];

/// Widgets shown on `tab`. The parents tab shows the father and marriage sections only
/// when the parents are married.
pub fn tab_widgets(tab: FormTab, parents_maries: bool) -> Vec<FieldWidget> {
    match tab {
        FormTab::Child => CHILD_WIDGETS.to_vec(),
        FormTab::Parents => {
            let mut widgets = vec![MARITAL_WIDGET];
            if parents_maries {
                widgets.extend_from_slice(FATHER_WIDGETS);
                widgets.extend_from_slice(MOTHER_WIDGETS);
                widgets.extend_from_slice(MARRIAGE_WIDGETS);
            } else {
                widgets.extend_from_slice(MOTHER_WIDGETS);
            }
            widgets
        }
        FormTab::Declarant => DECLARANT_WIDGETS.to_vec(),
        FormTab::Documents => DOCUMENT_WIDGETS.to_vec(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabView {
    pub index: usize,
    pub label: &'static str,
    pub active: bool,
}

/// Everything needed to draw the form in its current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub title: &'static str,
    pub tabs: Vec<TabView>,
    pub fields: Vec<FieldView>,
    pub submit_label: &'static str,
    pub submitting: bool,
}

impl FormView {
    pub fn build(form: &DeclarationForm, submitting: bool) -> Self {
        let current = form.current_tab();
        let tabs = FormTab::ALL
            .into_iter()
            .map(|tab| TabView {
                index: tab.index(),
                label: tab.label(),
                active: tab == current,
            })
            .collect();
        let fields = tab_widgets(current, form.draft().parents_maries)
            .iter()
            .map(|widget| render(widget, form))
            .collect();

        let submit_label = match (submitting, form.is_edit()) {
            (true, _) => "Enregistrement...",
            (false, true) => "Mettre à jour",
            (false, false) => "Enregistrer",
        };

        Self {
            title: if form.is_edit() {
                "Modifier la déclaration"
            } else {
                "Nouvelle déclaration"
            },
            tabs,
            fields,
            submit_label,
            submitting,
        }
    }
}
