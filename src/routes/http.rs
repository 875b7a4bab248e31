//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, State}, Json};
use tracing::{info, instrument};

use crate::domain::BurnStatus;
use crate::error::ApiError;
use crate::logic::{answer_session, final_report, run_guarded_burn, start_session, BurnOutcome};
use crate::protocol::*;
use crate::state::AppState;
use crate::util::normalize_address;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> Json<HealthOut> {
  Json(HealthOut {
    ok: true,
    burn_configured: state.chain.is_some(),
    ai_configured: state.openai.is_some(),
  })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_burn(
  State(state): State<Arc<AppState>>,
  Json(body): Json<BurnIn>,
) -> Result<Json<BurnOut>, ApiError> {
  // Validation happens before any chain access; a malformed address never
  // costs an RPC round trip.
  let raw = body.user_address.as_deref().unwrap_or_default();
  let address = normalize_address(raw).ok_or(ApiError::InvalidAddress)?;

  let chain = state.chain.as_ref().ok_or(ApiError::NotConfigured)?;
  let amount = state.chain_cfg.burn_amount.clone();

  let outcome =
    run_guarded_burn(&state.burns, &address, || async move { chain.burn_tokens(&amount).await })
      .await?;

  let out = match outcome {
    BurnOutcome::Burned(receipt) => {
      info!(target: "burn", %address, tx_hash = %receipt.tx_hash, "HTTP burn completed");
      BurnOut {
        success: true,
        explorer_url: Some(state.chain_cfg.explorer_tx_url(&receipt.tx_hash)),
        tx_hash: receipt.tx_hash,
        amount: Some(receipt.amount),
        already_burned: None,
      }
    }
    BurnOutcome::AlreadyBurned { tx_hash } => {
      info!(target: "burn", %address, %tx_hash, "HTTP burn replayed");
      BurnOut {
        success: true,
        explorer_url: Some(state.chain_cfg.explorer_tx_url(&tx_hash)),
        tx_hash,
        amount: None,
        already_burned: Some(true),
      }
    }
  };
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(%address))]
pub async fn http_get_burn_status(
  State(state): State<Arc<AppState>>,
  Path(address): Path<String>,
) -> Result<Json<BurnStatusOut>, ApiError> {
  let address = normalize_address(&address).ok_or(ApiError::InvalidAddress)?;
  let (status, tx_hash) = match state.burns.lookup(&address).await {
    None => ("unknown", None),
    Some(BurnStatus::Pending) => ("pending", None),
    Some(BurnStatus::Burned { tx_hash, .. }) => ("burned", Some(tx_hash)),
  };
  Ok(Json(BurnStatusOut { address, status, tx_hash }))
}

/// Treasury address, token balance and decimals. Useful for checking the
/// treasury can still fund burns without reading chain explorers.
#[instrument(level = "info", skip(state))]
pub async fn http_get_treasury(
  State(state): State<Arc<AppState>>,
) -> Result<Json<TreasuryOut>, ApiError> {
  let chain = state.chain.as_ref().ok_or(ApiError::NotConfigured)?;
  let address = chain.treasury_address();
  let balance = chain.get_balance(&address).await?;
  let decimals = chain.get_decimals().await?;
  Ok(Json(TreasuryOut {
    address,
    balance,
    decimals,
    burn_amount: state.chain_cfg.burn_amount.clone(),
  }))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_questionnaire_start(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartIn>,
) -> Result<Json<QuestionOut>, ApiError> {
  // A wallet address on a session is optional metadata; validate when present.
  let user_address = match body.user_address.as_deref() {
    Some(raw) => Some(normalize_address(raw).ok_or(ApiError::InvalidAddress)?),
    None => None,
  };
  Ok(Json(start_session(&state, user_address).await))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, answer_len = body.answer.len()))]
pub async fn http_post_questionnaire_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionAnswerIn>,
) -> Result<Json<SessionAnswerOut>, ApiError> {
  let out = answer_session(&state, &body.session_id, &body.answer).await?;
  info!(target: "binno", session_id = %body.session_id, complete = out.complete, "HTTP answer recorded");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_questionnaire_analysis(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnalysisIn>,
) -> Result<Json<AnalysisOut>, ApiError> {
  let out = final_report(&state, &body.session_id).await?;
  info!(target: "binno", session_id = %body.session_id, score = out.score, source = ?out.source, "HTTP analysis served");
  Ok(Json(out))
}
