use std::fmt::Write as _;

use serde::Serialize;

use super::domain::{Declaration, SEX_FEMALE, SEX_MALE};

/// Downloadable rendering of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedDocument {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to lay out declaration document: {0}")]
    Layout(#[from] std::fmt::Error),
}

/// Stateless renderer turning a stored declaration into a previewable document.
pub trait DeclarationRenderer: Send + Sync {
    fn render(&self, declaration: &Declaration) -> Result<RenderedDocument, RenderError>;
}

/// Plain-text birth declaration certificate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextCertificateRenderer;

impl DeclarationRenderer for TextCertificateRenderer {
    fn render(&self, declaration: &Declaration) -> Result<RenderedDocument, RenderError> {
        let d = &declaration.draft;
        let mut body = String::new();

        writeln!(body, "DÉCLARATION DE NAISSANCE")?;
        writeln!(body, "Référence : {}", declaration.id)?;
        if let Some(declared_at) = &declaration.date_declaration {
            writeln!(body, "Déclarée le : {declared_at}")?;
        }

        section(&mut body, "Enfant")?;
        row(&mut body, "Nom", &d.nom)?;
        row(&mut body, "Prénom", &d.prenom)?;
        row(&mut body, "Date de naissance", &d.date_naissance)?;
        row(&mut body, "Heure de naissance", &d.heure_naissance)?;
        row(&mut body, "Lieu de naissance", &d.lieu_naissance)?;
        row(&mut body, "Sexe", sex_label(&d.sexe))?;

        if d.parents_maries {
            section(&mut body, "Père")?;
            row(&mut body, "Nom", &d.nom_pere)?;
            row(&mut body, "Prénom", &d.prenom_pere)?;
            row(&mut body, "Date de naissance", &d.date_naissance_pere)?;
            row(&mut body, "Lieu de naissance", &d.lieu_naissance_pere)?;
            row(&mut body, "Profession", &d.profession_pere)?;
            row(&mut body, "Nationalité", &d.nationalite_pere)?;
            row(&mut body, "Adresse", &d.adresse_pere)?;
            row(&mut body, "Pièce d'identité", &d.piece_id_pere)?;
            row(&mut body, "Statut", &d.statut_pere)?;
        }

        section(&mut body, "Mère")?;
        row(&mut body, "Nom", &d.nom_mere)?;
        row(&mut body, "Prénom", &d.prenom_mere)?;
        row(&mut body, "Nom de jeune fille", &d.nom_jeune_fille_mere)?;
        row(&mut body, "Date de naissance", &d.date_naissance_mere)?;
        row(&mut body, "Lieu de naissance", &d.lieu_naissance_mere)?;
        row(&mut body, "Profession", &d.profession_mere)?;
        row(&mut body, "Nationalité", &d.nationalite_mere)?;
        row(&mut body, "Adresse", &d.adresse_mere)?;
        row(&mut body, "Pièce d'identité", &d.piece_id_mere)?;
        row(&mut body, "Statut", &d.statut_mere)?;

        section(&mut body, "Mariage")?;
        row(&mut body, "Statut marital", &d.statut_marital)?;
        if d.parents_maries {
            row(&mut body, "Date de mariage", &d.date_mariage_parents)?;
            row(&mut body, "Lieu de mariage", &d.lieu_mariage_parents)?;
        }

        section(&mut body, "Déclarant")?;
        row(&mut body, "Nom", &d.nom_declarant)?;
        row(&mut body, "Prénom", &d.prenom_declarant)?;
        row(&mut body, "Adresse", &d.adresse_declarant)?;
        row(&mut body, "Lien avec l'enfant", &d.lien_declarant)?;
        row(&mut body, "Pièce d'identité", &d.piece_id_declarant)?;

        section(&mut body, "Pièces justificatives")?;
        row(&mut body, "Certificat d'accouchement", &d.certificat_accouchement)?;
        row(&mut body, "Livret de famille", &d.livret_famille)?;
        row(&mut body, "Acte de naissance du père", &d.acte_naiss_pere)?;
        row(&mut body, "Acte de naissance de la mère", &d.acte_naiss_mere)?;
        row(&mut body, "Acte de reconnaissance", &d.acte_reconnaissance)?;
        row(&mut body, "Certificat de nationalité", &d.certificat_nationalite)?;

        Ok(RenderedDocument {
            file_name: file_name(declaration),
            content_type: "text/plain; charset=utf-8",
            body,
        })
    }
}

fn section(body: &mut String, title: &str) -> std::fmt::Result {
    writeln!(body)?;
    writeln!(body, "== {title} ==")
}

fn row(body: &mut String, label: &str, value: &str) -> std::fmt::Result {
    let value = value.trim();
    writeln!(body, "{label} : {}", if value.is_empty() { "-" } else { value })
}

fn sex_label(sexe: &str) -> &str {
    match sexe {
        SEX_MALE => "Garçon",
        SEX_FEMALE => "Fille",
        _ => "-",
    }
}

fn file_name(declaration: &Declaration) -> String {
    let slug: String = format!("{}-{}", declaration.draft.nom, declaration.draft.prenom)
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("declaration-{}.txt", slug.trim_matches('-'))
}
