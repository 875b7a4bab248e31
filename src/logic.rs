//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - The guarded burn flow: reserve -> submit -> confirm/release
//!   - Questionnaire session flow (adaptive questions with static fallback)
//!   - Final analysis (model-backed with local fallback)

use std::future::Future;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::chain::{BurnReceipt, ChainError};
use crate::domain::{AnalysisSource, Exchange, Session};
use crate::error::ApiError;
use crate::protocol::{AnalysisOut, QuestionOut, SessionAnswerOut};
use crate::registry::{BurnRegistry, Reservation};
use crate::seeds::fallback_analysis;
use crate::state::{AppState, QUESTION_COUNT};

/// Result of a guarded burn. A replay carries the original tx hash only.
#[derive(Clone, Debug)]
pub enum BurnOutcome {
  Burned(BurnReceipt),
  AlreadyBurned { tx_hash: String },
}

/// The exactly-once flow around a chain submission.
///
/// Reserves the (normalized) address before calling `submit`, so a concurrent
/// request for the same address fails fast instead of racing the chain call.
/// Confirms the reservation only after the transaction is observed; releases
/// it on failure so the caller may retry.
#[instrument(level = "info", skip(registry, submit), fields(%address))]
pub async fn run_guarded_burn<F, Fut>(
  registry: &BurnRegistry,
  address: &str,
  submit: F,
) -> Result<BurnOutcome, ApiError>
where
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<BurnReceipt, ChainError>>,
{
  match registry.reserve(address).await {
    Reservation::AlreadyBurned { tx_hash, .. } => {
      info!(target: "burn", %address, %tx_hash, "Replaying already-confirmed burn");
      Ok(BurnOutcome::AlreadyBurned { tx_hash })
    }
    Reservation::AlreadyPending => {
      warn!(target: "burn", %address, "Rejecting concurrent burn request");
      Err(ApiError::BurnInProgress)
    }
    Reservation::Reserved => match submit().await {
      Ok(receipt) => {
        registry.confirm(address, &receipt.tx_hash, &receipt.amount).await;
        Ok(BurnOutcome::Burned(receipt))
      }
      Err(e) => {
        registry.release(address).await;
        error!(target: "burn", %address, error = %e, "Chain submission failed; reservation released");
        Err(ApiError::Chain(e))
      }
    },
  }
}

/// Open a questionnaire session and serve its first question.
#[instrument(level = "info", skip(state), fields(has_address = user_address.is_some()))]
pub async fn start_session(state: &AppState, user_address: Option<String>) -> QuestionOut {
  let question = pick_question(state, &[], 0).await;
  let session = Session {
    id: Uuid::new_v4().to_string(),
    user_address,
    transcript: Vec::new(),
    current_question: question.clone(),
    complete: false,
  };
  let out = QuestionOut {
    session_id: session.id.clone(),
    question,
    index: 1,
    total: QUESTION_COUNT,
  };
  state.insert_session(session).await;
  info!(target: "binno", session_id = %out.session_id, "Questionnaire session started");
  out
}

/// Record an answer and serve the next question, or close the session.
#[instrument(level = "info", skip(state, answer), fields(%session_id, answer_len = answer.len()))]
pub async fn answer_session(
  state: &AppState,
  session_id: &str,
  answer: &str,
) -> Result<SessionAnswerOut, ApiError> {
  let mut session = state
    .get_session(session_id)
    .await
    .ok_or_else(|| ApiError::SessionNotFound(session_id.to_string()))?;
  if session.complete {
    return Err(ApiError::SessionComplete);
  }

  session.transcript.push(Exchange {
    question: std::mem::take(&mut session.current_question),
    answer: answer.to_string(),
  });
  let answered = session.transcript.len();

  if answered >= QUESTION_COUNT {
    session.complete = true;
    state.store_session(session).await;
    info!(target: "binno", %session_id, "Questionnaire complete");
    return Ok(SessionAnswerOut {
      complete: true,
      question: None,
      index: answered,
      total: QUESTION_COUNT,
    });
  }

  let question = pick_question(state, &session.transcript, answered).await;
  session.current_question = question.clone();
  state.store_session(session).await;

  Ok(SessionAnswerOut {
    complete: false,
    question: Some(question),
    index: answered + 1,
    total: QUESTION_COUNT,
  })
}

/// Final report for a session. The transcript may be partial; the fallback
/// report scores completeness, the model judges whatever was answered.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn final_report(state: &AppState, session_id: &str) -> Result<AnalysisOut, ApiError> {
  let session = state
    .get_session(session_id)
    .await
    .ok_or_else(|| ApiError::SessionNotFound(session_id.to_string()))?;

  if let Some(oa) = &state.openai {
    match oa.final_analysis(&state.prompts, &session.transcript).await {
      Ok(report) => return Ok(AnalysisOut::from_report(report, AnalysisSource::Model)),
      Err(e) => {
        error!(target: "binno", %session_id, error = %e, "OpenAI analysis failed; using local fallback");
      }
    }
  }
  Ok(AnalysisOut::from_report(
    fallback_analysis(&session.transcript),
    AnalysisSource::LocalFallback,
  ))
}

/// Next question for position `index` (0-based): model-generated when OpenAI
/// is available, static bank entry otherwise (or when the model fails).
async fn pick_question(state: &AppState, transcript: &[Exchange], index: usize) -> String {
  if let Some(oa) = &state.openai {
    match oa
      .next_question(&state.prompts, transcript, index + 1, QUESTION_COUNT)
      .await
    {
      Ok(q) => return q,
      Err(e) => {
        error!(target: "binno", error = %e, index, "Question generation failed; serving bank question");
      }
    }
  }
  state.bank_question(index)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  const ADDR: &str = "0xabcdef0123456789abcdef0123456789abcdef01";

  fn receipt() -> BurnReceipt {
    BurnReceipt { tx_hash: "0xdeadbeef".into(), amount: "1000".into() }
  }

  #[tokio::test]
  async fn second_burn_replays_without_submitting() {
    let reg = BurnRegistry::in_memory();
    let calls = AtomicUsize::new(0);

    let first = run_guarded_burn(&reg, ADDR, || async {
      calls.fetch_add(1, Ordering::SeqCst);
      Ok(receipt())
    })
    .await
    .expect("first burn");
    assert!(matches!(first, BurnOutcome::Burned(_)));

    let second = run_guarded_burn(&reg, ADDR, || async {
      calls.fetch_add(1, Ordering::SeqCst);
      Ok(receipt())
    })
    .await
    .expect("second burn");
    match second {
      BurnOutcome::AlreadyBurned { tx_hash } => assert_eq!(tx_hash, "0xdeadbeef"),
      other => panic!("expected replay, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1, "chain must be hit exactly once");
  }

  #[tokio::test]
  async fn failed_submission_releases_the_guard() {
    let reg = BurnRegistry::in_memory();

    let err = run_guarded_burn(&reg, ADDR, || async {
      Err(ChainError::Rpc("insufficient funds for gas * price + value".into()))
    })
    .await
    .expect_err("must fail");
    assert!(matches!(err, ApiError::Chain(_)));
    assert_eq!(reg.lookup(ADDR).await, None, "failed burn must not be marked");

    // Retry proceeds past the guard.
    let retried = run_guarded_burn(&reg, ADDR, || async { Ok(receipt()) })
      .await
      .expect("retry");
    assert!(matches!(retried, BurnOutcome::Burned(_)));
  }

  #[tokio::test]
  async fn in_flight_reservation_blocks_concurrent_burn() {
    let reg = BurnRegistry::in_memory();
    assert_eq!(reg.reserve(ADDR).await, Reservation::Reserved);

    let calls = AtomicUsize::new(0);
    let err = run_guarded_burn(&reg, ADDR, || async {
      calls.fetch_add(1, Ordering::SeqCst);
      Ok(receipt())
    })
    .await
    .expect_err("must reject");
    assert!(matches!(err, ApiError::BurnInProgress));
    assert_eq!(calls.load(Ordering::SeqCst), 0, "no submission while pending");
  }

  #[tokio::test]
  async fn questionnaire_runs_to_completion_on_bank_questions() {
    let state = AppState::for_tests();
    let started = start_session(&state, None).await;
    assert_eq!(started.index, 1);
    assert_eq!(started.total, QUESTION_COUNT);
    assert!(!started.question.is_empty());

    let mut last = None;
    for i in 0..QUESTION_COUNT {
      let out = answer_session(&state, &started.session_id, "a fairly long answer about the project")
        .await
        .expect("answer accepted");
      if i + 1 < QUESTION_COUNT {
        assert!(!out.complete);
        assert!(out.question.is_some());
        assert_eq!(out.index, i + 2);
      } else {
        assert!(out.complete);
        assert!(out.question.is_none());
      }
      last = Some(out);
    }
    assert!(last.unwrap().complete);

    // Session is closed: further answers are rejected.
    let err = answer_session(&state, &started.session_id, "extra")
      .await
      .expect_err("closed session");
    assert!(matches!(err, ApiError::SessionComplete));
  }

  #[tokio::test]
  async fn analysis_without_openai_is_local_fallback() {
    let state = AppState::for_tests();
    let started = start_session(&state, None).await;
    answer_session(&state, &started.session_id, "short").await.unwrap();

    let report = final_report(&state, &started.session_id).await.expect("report");
    assert_eq!(report.source, AnalysisSource::LocalFallback);

    let missing = final_report(&state, "no-such-session").await.expect_err("404");
    assert!(matches!(missing, ApiError::SessionNotFound(_)));
  }
}
