//! Process configuration from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::StageTimeouts;
use crate::types::IngestError;

/// Model identifier sent with every embedding request.
pub const DEFAULT_EMBED_MODEL: &str = "embed-english-v3.0";

const DEFAULT_DB_PATH: &str = "./docloom.sqlite";

/// Everything the trigger binary needs to assemble a pipeline.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub cohere_api_key: String,
    pub embed_model: String,
    pub db_path: PathBuf,
    pub timeouts: StageTimeouts,
}

impl IngestConfig {
    /// Loads configuration from the environment, reading `.env` first if
    /// one is present.
    ///
    /// `COHERE_API_KEY` is required; everything else has a default.
    /// Stage budgets can be overridden with `DOCLOOM_FETCH_TIMEOUT_SECS`,
    /// `DOCLOOM_PARSE_TIMEOUT_SECS`, `DOCLOOM_EMBED_TIMEOUT_SECS`, and
    /// `DOCLOOM_STORE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, IngestError> {
        dotenvy::dotenv().ok();

        let cohere_api_key = env::var("COHERE_API_KEY")
            .map_err(|_| IngestError::Config("COHERE_API_KEY is not set".into()))?;
        let embed_model =
            env::var("DOCLOOM_EMBED_MODEL").unwrap_or_else(|_| DEFAULT_EMBED_MODEL.to_string());
        let db_path = env::var("DOCLOOM_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let mut timeouts = StageTimeouts::default();
        if let Some(budget) = env_secs("DOCLOOM_FETCH_TIMEOUT_SECS")? {
            timeouts.fetch = budget;
        }
        if let Some(budget) = env_secs("DOCLOOM_PARSE_TIMEOUT_SECS")? {
            timeouts.parse = budget;
        }
        if let Some(budget) = env_secs("DOCLOOM_EMBED_TIMEOUT_SECS")? {
            timeouts.embed = budget;
        }
        if let Some(budget) = env_secs("DOCLOOM_STORE_TIMEOUT_SECS")? {
            timeouts.store = budget;
        }

        Ok(Self {
            cohere_api_key,
            embed_model,
            db_path,
            timeouts,
        })
    }
}

fn env_secs(key: &str) -> Result<Option<Duration>, IngestError> {
    match env::var(key) {
        Err(_) => Ok(None),
        Ok(raw) => raw
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| {
                IngestError::Config(format!(
                    "{key} must be an integer number of seconds, got '{raw}'"
                ))
            }),
    }
}
