use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Base URL of the REST backend, e.g. "https://api.example.dev"
  pub api_base_url: String,
  /// OAuth client id for the Google sign-in flow
  pub google_client_id: Option<String>,
  #[serde(default)]
  pub firebase: FirebaseConfig,
  #[serde(default)]
  pub environment: Environment,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirebaseConfig {
  /// Firebase project id for direct Firestore reads
  pub project_id: Option<String>,
  /// Cloud-function endpoint that moves ended events to the past list
  pub move_events_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  #[default]
  Development,
  Production,
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./agora.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/agora/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(Error::Config(format!("config file not found: {}", p.display())));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::from_env()?,
    };

    config.apply_env_overrides();
    Ok(config)
  }

  /// Build a config purely from environment variables.
  ///
  /// `AGORA_API_BASE_URL` is required; `AGORA_GOOGLE_CLIENT_ID`,
  /// `AGORA_FIREBASE_PROJECT_ID`, `AGORA_FIREBASE_MOVE_EVENTS_URL` and
  /// `AGORA_ENV` are optional.
  pub fn from_env() -> Result<Self> {
    let api_base_url = std::env::var("AGORA_API_BASE_URL").map_err(|_| {
      Error::Config(
        "no configuration found. Create agora.yaml or set AGORA_API_BASE_URL".to_string(),
      )
    })?;

    let mut config = Self {
      api_base_url,
      google_client_id: None,
      firebase: FirebaseConfig::default(),
      environment: Environment::default(),
    };
    config.apply_env_overrides();
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("agora.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("agora").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| Error::Config(format!("failed to read config file {}: {e}", path.display())))?;

    serde_yaml::from_str(&contents)
      .map_err(|e| Error::Config(format!("failed to parse config file {}: {e}", path.display())))
  }

  fn apply_env_overrides(&mut self) {
    if let Ok(url) = std::env::var("AGORA_API_BASE_URL") {
      self.api_base_url = url;
    }
    if let Ok(id) = std::env::var("AGORA_GOOGLE_CLIENT_ID") {
      self.google_client_id = Some(id);
    }
    if let Ok(id) = std::env::var("AGORA_FIREBASE_PROJECT_ID") {
      self.firebase.project_id = Some(id);
    }
    if let Ok(url) = std::env::var("AGORA_FIREBASE_MOVE_EVENTS_URL") {
      self.firebase.move_events_url = Some(url);
    }
    if let Ok(env) = std::env::var("AGORA_ENV") {
      self.environment = match env.to_lowercase().as_str() {
        "production" | "prod" => Environment::Production,
        _ => Environment::Development,
      };
    }
  }
}
