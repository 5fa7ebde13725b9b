use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use civil_registry::declarations::domain::SEX_FEMALE;
use civil_registry::declarations::submission::Clock;
use civil_registry::declarations::{
    DeclarationDraft, DeclarationForm, DeclarationStore, DeclarationSubmitter, SubmissionError,
    SubmissionListener, SubmitOutcome,
};
use civil_registry::users::{UserDirectory, UserError, UserForm, UserRole, UserStatus};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Clock pinned to midnight UTC of `date`, or the wall clock when no date is given.
pub(crate) fn clock_for(date: Option<NaiveDate>) -> Clock {
    match date {
        Some(date) => {
            let instant = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
            Arc::new(move || instant)
        }
        None => Arc::new(Utc::now),
    }
}

/// A few complete declarations covering both marital branches.
pub(crate) fn sample_declarations() -> Vec<DeclarationDraft> {
    let mut rakoto = DeclarationDraft::default();
    rakoto.nom = "Rakoto".to_string();
    rakoto.prenom = "Jean".to_string();
    rakoto.date_naissance = "2024-01-05".to_string();
    rakoto.heure_naissance = "06:45".to_string();
    rakoto.lieu_naissance = "Antananarivo".to_string();
    rakoto.nom_mere = "Rasoa".to_string();
    rakoto.prenom_mere = "Marie".to_string();
    rakoto.piece_id_mere = "101201304567".to_string();

    let mut randria = DeclarationDraft::default();
    randria.nom = "Randrianarisoa".to_string();
    randria.prenom = "Hery".to_string();
    randria.date_naissance = "2024-02-17".to_string();
    randria.lieu_naissance = "Toamasina".to_string();
    randria.sexe = SEX_FEMALE.to_string();
    randria.parents_maries = true;
    randria.statut_marital = "Marié".to_string();
    randria.nom_pere = "Randrianarisoa".to_string();
    randria.prenom_pere = "Lova".to_string();
    randria.nom_mere = "Rakotomalala".to_string();
    randria.prenom_mere = "Fara".to_string();
    randria.date_mariage_parents = "2019-08-03".to_string();
    randria.lieu_mariage_parents = "Toamasina".to_string();

    let mut razafy = DeclarationDraft::default();
    razafy.nom = "Razafy".to_string();
    razafy.prenom = "Niry".to_string();
    razafy.date_naissance = "2024-02-29".to_string();
    razafy.lieu_naissance = "Fianarantsoa".to_string();
    razafy.sexe = SEX_FEMALE.to_string();
    razafy.nom_mere = "Razafy".to_string();
    razafy.prenom_mere = "Voahangy".to_string();
    razafy.nom_declarant = "Razafy".to_string();
    razafy.prenom_declarant = "Tiana".to_string();
    razafy.lien_declarant = "Grand-mère".to_string();

    vec![rakoto, randria, razafy]
}

struct SeedListener;

impl SubmissionListener for SeedListener {
    fn on_saved(&mut self, _outcome: &SubmitOutcome) {}

    fn on_closed(&mut self) {}
}

/// Insert the sample declarations through the regular submission path.
pub(crate) async fn seed_declarations<S>(store: Arc<S>, clock: Clock) -> Result<usize, SubmissionError>
where
    S: DeclarationStore + ?Sized,
{
    let submitter = DeclarationSubmitter::with_clock(store, clock);
    let mut created = 0;
    for draft in sample_declarations() {
        let form = DeclarationForm::with_draft(draft);
        if let SubmitOutcome::Created(_) = submitter.submit(&form, &mut SeedListener).await? {
            created += 1;
        }
    }
    info!(created, "seeded sample declarations");
    Ok(created)
}

/// Back-office accounts covering each role.
pub(crate) fn sample_users() -> Vec<UserForm> {
    let account = |email: &str, name: &str, role: UserRole, status: UserStatus| UserForm {
        email: email.to_string(),
        display_name: name.to_string(),
        role,
        password: "changeme-1".to_string(),
        status,
    };
    vec![
        account("admin@etat-civil.mg", "Hery Andriamanana", UserRole::Admin, UserStatus::Active),
        account(
            "moderateur@etat-civil.mg",
            "Vola Rasoanaivo",
            UserRole::Moderator,
            UserStatus::Active,
        ),
        account("guichet@etat-civil.mg", "Tiana Rakotobe", UserRole::User, UserStatus::Inactive),
    ]
}

pub(crate) async fn seed_users<D>(directory: &D) -> Result<usize, UserError>
where
    D: UserDirectory + ?Sized,
{
    let samples = sample_users();
    for form in &samples {
        directory.create(form).await?;
    }
    info!(created = samples.len(), "seeded sample user accounts");
    Ok(samples.len())
}
