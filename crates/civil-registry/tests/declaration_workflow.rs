//! End-to-end declaration scenarios driven through the public API: an operator signs in,
//! fills the tabbed form from the live list, saves it and reads the result back.

mod common {
    use civil_registry::declarations::{DeclarationDraft, DeclarationForm, FieldValue};

    pub(super) fn fill(form: &mut DeclarationForm, edits: &[(&str, FieldValue)]) {
        for (name, value) in edits {
            form.set_field_by_name(name, value.clone())
                .expect("known declaration field");
        }
    }

    pub(super) fn child_and_mother() -> Vec<(&'static str, FieldValue)> {
        vec![
            ("nom", "Rakoto".into()),
            ("prenom", "Jean".into()),
            ("dateNaissance", "2024-01-05".into()),
            ("nomMere", "Rasoa".into()),
            ("prenomMere", "Marie".into()),
        ]
    }

    pub(super) fn seeded_draft(nom: &str, sexe: &str) -> DeclarationDraft {
        let mut draft = DeclarationDraft::default();
        draft.nom = nom.to_string();
        draft.prenom = "Aina".to_string();
        draft.date_naissance = "2024-02-11".to_string();
        draft.sexe = sexe.to_string();
        draft.nom_mere = "Vola".to_string();
        draft.prenom_mere = "Hanta".to_string();
        draft
    }
}

use std::sync::Arc;

use civil_registry::auth::{AuthFlow, AuthProvider, InMemoryAuthProvider, SignUpRequest};
use civil_registry::declarations::{
    validate, DeclarationCollectionView, DeclarationId, DeclarationRenderer,
    DeclarationStatistics, DeclarationSubmitter, DraftField, FormTab, FormView,
    InMemoryDeclarationStore, LogNotifier, SubmitOutcome, TextCertificateRenderer, ViewState,
};

use common::*;

#[tokio::test]
async fn operator_registers_and_records_a_declaration() {
    let auth = Arc::new(InMemoryAuthProvider::new());
    let flow = AuthFlow::new(auth.clone());
    let mut session = auth.watch();
    flow.sign_up(&SignUpRequest {
        email: "agent@example.org".to_string(),
        password: "secret-1".to_string(),
        confirm_password: "secret-1".to_string(),
    })
    .await
    .expect("account created");
    session.changed().await.expect("session change");
    assert!(session.borrow().is_some());

    let store = Arc::new(InMemoryDeclarationStore::new());
    let submitter = DeclarationSubmitter::new(store.clone());
    let mut view = DeclarationCollectionView::mount(store.clone());
    assert_eq!(view.next_event().await, Some(&ViewState::Loaded));
    assert!(view.declarations().is_empty());

    let form = view.open_new_form();
    fill(form, &child_and_mother());
    form.switch_tab(FormTab::Declarant.index()).expect("tab exists");
    let rendered = FormView::build(form, submitter.is_in_flight());
    assert_eq!(rendered.submit_label, "Enregistrer");
    assert!(rendered.tabs[2].active);

    let outcome = view
        .submit_open_form(&submitter, &LogNotifier)
        .await
        .expect("form open")
        .expect("saved");
    assert!(matches!(outcome, SubmitOutcome::Created(_)));
    assert!(view.open_form().is_none());

    view.next_event().await;
    view.set_search("rasoa");
    let listed = view.filtered();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].full_name(), "Jean Rakoto");
    assert!(listed[0].date_declaration.is_some());

    let document = TextCertificateRenderer
        .render(listed[0])
        .expect("document renders");
    assert!(document.body.contains("Prénom : Marie"));

    view.unmount();
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test]
async fn edit_round_trip_switches_branch_and_statistics_follow() {
    let store = Arc::new(InMemoryDeclarationStore::with_documents([
        (
            DeclarationId("seed-1".to_string()),
            seeded_draft("Rabe", "F").to_document("2024-02-12T09:00:00.000Z"),
        ),
        (
            DeclarationId("seed-2".to_string()),
            seeded_draft("Rakoto", "M").to_document("2024-03-01T09:00:00.000Z"),
        ),
    ]));
    let submitter = DeclarationSubmitter::new(store.clone());
    let mut view = DeclarationCollectionView::mount(store.clone());
    view.next_event().await;

    let form = view
        .open_edit_form(&DeclarationId("seed-2".to_string()))
        .expect("seeded declaration listed");
    form.set_field(DraftField::ParentsMaries, true.into())
        .expect("checkbox");
    assert!(!validate(form.draft()).is_empty());
    fill(
        form,
        &[
            ("nomPere", "Rakoto".into()),
            ("prenomPere", "Paul".into()),
            ("dateMariageParents", "2019-08-17".into()),
            ("lieuMariageParents", "Toamasina".into()),
        ],
    );
    assert!(validate(form.draft()).is_empty());

    let outcome = view
        .submit_open_form(&submitter, &LogNotifier)
        .await
        .expect("form open")
        .expect("saved");
    assert!(matches!(outcome, SubmitOutcome::Updated(_)));

    view.next_event().await;
    let stats = DeclarationStatistics::from_declarations(view.declarations());
    assert_eq!(stats.total, 2);
    assert_eq!(stats.by_parents_status[0].value, 1);
    assert_eq!(stats.by_sex[0].percent, "50.0%");
    assert_eq!(stats.monthly_births.len(), 1);
    assert_eq!(stats.monthly_births[0].month, "2024-02");
}
