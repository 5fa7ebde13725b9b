use crate::infra::{clock_for, seed_declarations};
use chrono::NaiveDate;
use civil_registry::auth::{AuthFlow, InMemoryAuthProvider, SignUpRequest};
use civil_registry::declarations::{
    DeclarationCollectionView, DeclarationRenderer, DeclarationStatistics, DeclarationStore,
    DeclarationSubmitter, DraftField, FieldValue, InMemoryDeclarationStore, LogNotifier,
    SubmissionError, SubmitOutcome, TextCertificateRenderer, ViewState,
};
use civil_registry::error::AppError;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Declaration date stamped on every save (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) declared_on: Option<NaiveDate>,
    /// Search term applied to the declaration list.
    #[arg(long, default_value = "rakoto")]
    pub(crate) search: String,
    /// Print the certificate of the first matching declaration.
    #[arg(long)]
    pub(crate) show_document: bool,
}

const DEMO_EMAIL: &str = "agent@etat-civil.mg";
const DEMO_PASSWORD: &str = "demo-secret";

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        declared_on,
        search,
        show_document,
    } = args;

    let clock = clock_for(declared_on);
    let store = Arc::new(InMemoryDeclarationStore::new());
    let auth = Arc::new(InMemoryAuthProvider::new());

    println!("Birth declaration back office demo");
    let user = AuthFlow::new(auth.clone())
        .sign_up(&SignUpRequest {
            email: DEMO_EMAIL.to_string(),
            password: DEMO_PASSWORD.to_string(),
            confirm_password: DEMO_PASSWORD.to_string(),
        })
        .await?;
    println!("- signed up as {} ({})", user.email, user.uid);

    let mut view = DeclarationCollectionView::mount(store.clone());
    refresh(&mut view).await;

    let submitter = DeclarationSubmitter::with_clock(store.clone(), clock.clone());
    let form = view.open_new_form();
    form.set_field(DraftField::Nom, FieldValue::from("Rakoto"))?;
    form.set_field(DraftField::Prenom, FieldValue::from("Andry"))?;
    form.set_field(DraftField::LieuNaissance, FieldValue::from("Antsirabe"))?;

    println!("\nSaving an incomplete declaration");
    if let Some(Err(SubmissionError::Invalid(_))) =
        view.submit_open_form(&submitter, &LogNotifier).await
    {
        if let Some(form) = view.open_form() {
            for (field, message) in form.errors().iter() {
                println!("  - {}: {message}", field.as_str());
            }
        }
    }

    if let Some(form) = view.open_form_mut() {
        form.set_field(DraftField::DateNaissance, FieldValue::from("2024-03-02"))?;
        form.set_field(DraftField::NomMere, FieldValue::from("Rakotobe"))?;
        form.set_field(DraftField::PrenomMere, FieldValue::from("Soa"))?;
    }

    println!("\nSaving the completed declaration");
    match view.submit_open_form(&submitter, &LogNotifier).await {
        Some(Ok(SubmitOutcome::Created(id))) => println!("- created declaration {id}"),
        Some(Ok(outcome)) => println!("- save finished: {outcome:?}"),
        Some(Err(err)) => return Err(err.into()),
        None => println!("- no form was open"),
    }
    refresh(&mut view).await;
    view.unmount();

    let seeded = seed_declarations(store.clone(), clock).await?;
    println!("- seeded {seeded} sample declarations");

    let mut view = DeclarationCollectionView::mount(store.clone());
    refresh(&mut view).await;
    view.set_search(search.as_str());
    let matches = view.filtered();
    println!("\nSearch \"{search}\": {} match(es)", matches.len());
    for declaration in &matches {
        println!(
            "  - {} | né(e) le {} | mère {}",
            declaration.full_name(),
            declaration.draft.date_naissance,
            declaration.draft.nom_mere
        );
    }

    if show_document {
        if let Some(declaration) = matches.first() {
            let document = TextCertificateRenderer.render(declaration)?;
            println!("\n{}\n{}", document.file_name, document.body);
        }
    }

    render_statistics(&DeclarationStatistics::from_declarations(
        view.declarations(),
    ));

    view.unmount();
    AuthFlow::new(auth).sign_out().await?;
    Ok(())
}

async fn refresh<S>(view: &mut DeclarationCollectionView<S>)
where
    S: DeclarationStore + ?Sized,
{
    match view.next_event().await.cloned() {
        Some(ViewState::Loaded) => {
            println!("- live list holds {} declaration(s)", view.declarations().len())
        }
        Some(ViewState::Error(message)) => println!("- live list failed: {message}"),
        Some(ViewState::Loading) | None => println!("- live list closed before loading"),
    }
}

fn render_statistics(statistics: &DeclarationStatistics) {
    println!("\nStatistics ({} declarations)", statistics.total);
    for share in statistics
        .by_sex
        .iter()
        .chain(statistics.by_parents_status.iter())
    {
        println!("  - {}: {} ({})", share.label, share.value, share.percent);
    }
    for month in &statistics.monthly_births {
        println!(
            "  - {}: {} garçon(s), {} fille(s)",
            month.month, month.boys, month.girls
        );
    }
}
