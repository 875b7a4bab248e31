//! Configuration: chain/treasury settings from env, and Binno agent
//! configuration (prompts + optional question bank) from TOML.
//!
//! See `ChainConfig`, `BinnoConfig` and `Prompts` for expected schema.

use serde::Deserialize;
use tracing::{info, error};

/// ERC-20 transfers to this address are irrecoverable; used as the burn sink.
pub const DEAD_ADDRESS: &str = "0x000000000000000000000000000000000000dEaD";

const DEFAULT_RPC_URL: &str = "https://bsc-dataseed.binance.org";
const DEFAULT_EXPLORER: &str = "https://bscscan.com";
const DEFAULT_BURN_AMOUNT: &str = "1000";
const DEFAULT_JOURNAL_PATH: &str = "data/burn_journal.jsonl";

/// Treasury/chain settings, read once at startup.
#[derive(Clone, Debug)]
pub struct ChainConfig {
  pub rpc_url: String,
  pub treasury_key: Option<String>,
  pub token_address: Option<String>,
  /// Decimal token amount transferred per burn.
  pub burn_amount: String,
  pub explorer_base: String,
  pub journal_path: String,
}

impl ChainConfig {
  pub fn from_env() -> Self {
    let non_empty = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());
    Self {
      rpc_url: non_empty("BSC_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.into()),
      treasury_key: non_empty("PRIVATE_KEY_TREASURY"),
      token_address: non_empty("TOKEN_ADDRESS"),
      burn_amount: non_empty("BURN_AMOUNT").unwrap_or_else(|| DEFAULT_BURN_AMOUNT.into()),
      explorer_base: non_empty("BSCSCAN_URL").unwrap_or_else(|| DEFAULT_EXPLORER.into()),
      journal_path: non_empty("BURN_JOURNAL_PATH").unwrap_or_else(|| DEFAULT_JOURNAL_PATH.into()),
    }
  }

  /// True only if both the treasury signing key and the token address were supplied.
  pub fn is_configured(&self) -> bool {
    self.treasury_key.is_some() && self.token_address.is_some()
  }

  pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
    format!("{}/tx/{}", self.explorer_base.trim_end_matches('/'), tx_hash)
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct BinnoConfig {
  #[serde(default)]
  pub prompts: Prompts,
  /// Optional static question bank overriding the built-in fallback questions.
  #[serde(default)]
  pub questions: Vec<String>,
}

/// Prompts used by the OpenAI client. Defaults are sensible for Web3 project
/// assessment. You can override them in TOML if you need to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  // Adaptive question generation
  pub question_system: String,
  pub question_user_template: String,
  // Final analysis
  pub analysis_system: String,
  pub analysis_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      question_system: "You are Binno, a Web3 project advisor interviewing a founder. Ask ONE focused follow-up question based on the conversation so far. Output ONLY the question text, under 30 words. Never repeat a question already asked.".into(),
      question_user_template: "Question {index} of {total}.\nConversation so far:\n{transcript}\n\nAsk the next question.".into(),
      analysis_system: "You are Binno, a strict Web3 project analyst. Respond ONLY with strict JSON.".into(),
      analysis_user_template: "Interview transcript:\n{transcript}\n\nReturn JSON with fields: score (integer 0-100), verdict (string, 2-3 sentences), strengths (array of short strings), risks (array of short strings). Judge readiness of the project across product, tokenomics, security and go-to-market.".into(),
    }
  }
}

/// Attempt to load `BinnoConfig` from BINNO_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_binno_config_from_env() -> Option<BinnoConfig> {
  let path = std::env::var("BINNO_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<BinnoConfig>(&s) {
      Ok(cfg) => {
        info!(target: "ctdhub_backend", %path, "Loaded Binno config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "ctdhub_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "ctdhub_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn explorer_url_has_no_double_slash() {
    let mut cfg = ChainConfig {
      rpc_url: String::new(),
      treasury_key: None,
      token_address: None,
      burn_amount: "1000".into(),
      explorer_base: "https://bscscan.com/".into(),
      journal_path: String::new(),
    };
    assert_eq!(cfg.explorer_tx_url("0xabc"), "https://bscscan.com/tx/0xabc");
    cfg.explorer_base = "https://bscscan.com".into();
    assert_eq!(cfg.explorer_tx_url("0xabc"), "https://bscscan.com/tx/0xabc");
  }

  #[test]
  fn configured_requires_key_and_token() {
    let mut cfg = ChainConfig {
      rpc_url: DEFAULT_RPC_URL.into(),
      treasury_key: None,
      token_address: None,
      burn_amount: DEFAULT_BURN_AMOUNT.into(),
      explorer_base: DEFAULT_EXPLORER.into(),
      journal_path: DEFAULT_JOURNAL_PATH.into(),
    };
    assert!(!cfg.is_configured());
    cfg.treasury_key = Some("0x01".into());
    assert!(!cfg.is_configured());
    cfg.token_address = Some("0x000000000000000000000000000000000000beef".into());
    assert!(cfg.is_configured());
  }
}
