#![allow(dead_code)]

use std::path::PathBuf;

use mindful_cascade::{load_cascade, Cascade, Settings};

/// Settings pointing at the artifacts shipped in `models/`.
pub fn shipped_settings() -> Settings {
    let models_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models");
    let mut settings = Settings::default();
    settings.responses.file = models_dir.join("responses.json");
    settings.models.dir = models_dir;
    settings
}

pub fn shipped_cascade() -> Cascade {
    load_cascade(&shipped_settings()).expect("shipped models load")
}
