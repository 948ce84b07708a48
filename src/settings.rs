//! Layered settings: `Config.toml` (optional) overridden by `CHATBOT__*`
//! environment variables.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::StartupError;
use crate::model::ModelPaths;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ModelSettings {
    pub dir: PathBuf,
    pub crisis_detector: String,
    pub crisis_classifier: String,
    pub flow_model: String,
    pub empathy_model: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            crisis_detector: "crisis_detector.json".into(),
            crisis_classifier: "crisis_classifier.json".into(),
            flow_model: "flow_model.json".into(),
            empathy_model: "empathy_model.json".into(),
        }
    }
}

impl ModelSettings {
    pub fn paths(&self) -> ModelPaths {
        ModelPaths {
            crisis_detector: self.dir.join(&self.crisis_detector),
            crisis_classifier: self.dir.join(&self.crisis_classifier),
            flow_model: self.dir.join(&self.flow_model),
            empathy_model: self.dir.join(&self.empathy_model),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ResponseSettings {
    pub file: PathBuf,
}

impl Default for ResponseSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from("models/responses.json"),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CascadeSettings {
    pub crisis_positive_label: String,
    pub flow_unknown_label: String,
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self {
            crisis_positive_label: "true".into(),
            flow_unknown_label: "unknown".into(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Repl,
    Server,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SessionSettings {
    pub mode: Mode,
    pub exit_token: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Repl,
            exit_token: "quit".into(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub models: ModelSettings,
    pub responses: ResponseSettings,
    pub cascade: CascadeSettings,
    pub session: SessionSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Reads `Config` (any format the config crate knows) from the working
    /// directory, if present, then applies environment overrides.
    pub fn load() -> Result<Self, StartupError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("Config").required(false))
            .add_source(
                config::Environment::with_prefix("CHATBOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn from_toml(toml: &str) -> Result<Self, StartupError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
