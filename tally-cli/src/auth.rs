use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use tally_parse::Provider;

use crate::state::tally_home;

/// Provider credentials from `~/.tally/auth.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

pub fn load_auth() -> Result<AuthState> {
    let p = tally_home()?.join("auth.json");
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

fn env_var(provider: Provider) -> &'static str {
    match provider {
        Provider::Anthropic => "ANTHROPIC_API_KEY",
        Provider::OpenAI => "OPENAI_API_KEY",
    }
}

/// Environment variable first, then auth.json. `None` means no credentials.
pub fn api_key(provider: Provider) -> Result<Option<String>> {
    if let Ok(key) = std::env::var(env_var(provider)) {
        if !key.trim().is_empty() {
            return Ok(Some(key.trim().to_string()));
        }
    }

    let auth = load_auth()?;
    let stored = match provider {
        Provider::Anthropic => auth.anthropic_api_key,
        Provider::OpenAI => auth.openai_api_key,
    };
    Ok(stored.filter(|k| !k.trim().is_empty()))
}
