//! Mental-health support chatbot built from a fixed cascade of text
//! classifiers: crisis detection first, then conversation flow, then
//! emotion. The first stage that claims a message picks the reply.

pub mod cascade;
pub mod error;
pub mod model;
pub mod predictor;
pub mod response;
pub mod server;
pub mod session;
pub mod settings;
pub mod stage;
pub mod tfidf;
pub mod transcript;

pub use cascade::{Cascade, Reply};
pub use error::StartupError;
pub use predictor::Predictor;
pub use session::Session;
pub use settings::Settings;
pub use stage::{StageId, Verdict};

use model::LoadedModels;
use response::ResponseSelector;

/// Loads every model and response table named by `settings` and assembles
/// the cascade.
pub fn load_cascade(settings: &Settings) -> Result<Cascade, StartupError> {
    let models = LoadedModels::load(&settings.models.paths())?;
    let responses = ResponseSelector::load_from_file(&settings.responses.file)?;
    Ok(Cascade::from_models(
        models,
        responses,
        &settings.cascade.crisis_positive_label,
        &settings.cascade.flow_unknown_label,
    ))
}
