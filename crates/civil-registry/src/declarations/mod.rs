//! Birth declaration records: field validation, the tabbed draft form, gated submission
//! to a document store and the live list kept in sync with it.

pub mod collection;
pub mod document;
pub mod domain;
pub mod draft;
pub mod memory;
pub mod prompts;
pub mod router;
pub mod statistics;
pub mod store;
pub mod submission;
pub mod validation;
pub mod widgets;

#[cfg(test)]
mod tests;

pub use collection::{filter_declarations, DeclarationCollectionView, DeleteOutcome, ViewState};
pub use document::{DeclarationRenderer, RenderError, RenderedDocument, TextCertificateRenderer};
pub use domain::{Declaration, DeclarationDraft, DeclarationId, DocumentFields, DraftField};
pub use draft::{DeclarationForm, DraftError, FieldValue, FormTab};
pub use memory::InMemoryDeclarationStore;
pub use prompts::{Confirm, LogNotifier, Notifier};
pub use router::{declaration_router, DeclarationRoutesState};
pub use statistics::DeclarationStatistics;
pub use store::{DeclarationStore, Snapshot, StoreError, Subscription, SubscriptionError};
pub use submission::{DeclarationSubmitter, SubmissionError, SubmissionListener, SubmitOutcome};
pub use validation::{validate, ValidationErrors};
pub use widgets::{tab_widgets, FieldView, FieldWidget, FormView};
