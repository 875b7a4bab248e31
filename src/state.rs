//! Application state: burn registry, questionnaire sessions, chain service,
//! OpenAI client, and prompts.
//!
//! This module owns:
//!   - the burn registry (journal-backed idempotence guard)
//!   - the in-memory questionnaire session store
//!   - the prompts + question bank (from TOML or defaults)
//!   - optional chain service and OpenAI client

use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::chain::BscService;
use crate::config::{load_binno_config_from_env, ChainConfig, Prompts};
use crate::domain::Session;
use crate::openai::OpenAI;
use crate::registry::BurnRegistry;
use crate::seeds::fallback_questions;

/// Number of questions per questionnaire session.
pub const QUESTION_COUNT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub burns: Arc<BurnRegistry>,
    pub sessions: Arc<RwLock<HashMap<String, Session>>>,
    pub chain: Option<BscService>,
    pub chain_cfg: ChainConfig,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
    pub question_bank: Vec<String>,
}

impl AppState {
    /// Build state from env: chain config, burn journal, Binno config, OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let chain_cfg = ChainConfig::from_env();
        let burns = Arc::new(BurnRegistry::open(PathBuf::from(&chain_cfg.journal_path)));

        let chain = BscService::from_config(&chain_cfg);
        match &chain {
            Some(svc) => {
                info!(target: "burn", treasury = %svc.treasury_address(), rpc = %chain_cfg.rpc_url, amount = %chain_cfg.burn_amount, "Burn service enabled");
            }
            None => {
                warn!(target: "burn", "Burn service disabled (PRIVATE_KEY_TREASURY / TOKEN_ADDRESS missing or invalid)");
            }
        }

        // Load TOML config if provided (prompts + optional question bank).
        let cfg_opt = load_binno_config_from_env();
        let prompts = cfg_opt
            .as_ref()
            .map(|c| c.prompts.clone())
            .unwrap_or_default();
        let question_bank = match cfg_opt.as_ref().filter(|c| !c.questions.is_empty()) {
            Some(c) => {
                info!(target: "binno", count = c.questions.len(), "Using question bank from TOML config");
                c.questions.clone()
            }
            None => fallback_questions(),
        };

        // Build optional OpenAI client (if API key present).
        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "ctdhub_backend", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
        } else {
            info!(target: "ctdhub_backend", "OpenAI disabled (no OPENAI_API_KEY). Using static question bank.");
        }

        Self {
            burns,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            chain,
            chain_cfg,
            openai,
            prompts,
            question_bank,
        }
    }

    /// Test constructor: volatile registry, no chain, no OpenAI.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            burns: Arc::new(BurnRegistry::in_memory()),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            chain: None,
            chain_cfg: ChainConfig {
                rpc_url: "http://localhost:8545".into(),
                treasury_key: None,
                token_address: None,
                burn_amount: "1000".into(),
                explorer_base: "https://bscscan.com".into(),
                journal_path: String::new(),
            },
            openai: None,
            prompts: Prompts::default(),
            question_bank: fallback_questions(),
        }
    }

    pub async fn insert_session(&self, s: Session) {
        self.sessions.write().await.insert(s.id.clone(), s);
    }

    pub async fn get_session(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Replace a stored session with an updated copy.
    pub async fn store_session(&self, s: Session) {
        self.sessions.write().await.insert(s.id.clone(), s);
    }

    /// Static question for position `index` (0-based), cycling if the bank is
    /// shorter than the session.
    pub fn bank_question(&self, index: usize) -> String {
        let bank = &self.question_bank;
        bank[index % bank.len()].clone()
    }
}
