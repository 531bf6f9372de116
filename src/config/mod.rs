//! Configuration module for WikiVox.
//!
//! Settings are read from a TOML file and layered under CLI flags.

mod settings;

pub use settings::{GeneralSettings, SearchSettings, Settings, TtsSettings, WikiSettings};
