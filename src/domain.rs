//! Domain models: burn records and state, questionnaire sessions, analysis reports.

use serde::{Deserialize, Serialize};

/// A confirmed burn. At most one exists per wallet address; created on first
/// successful on-chain transfer and never mutated or deleted afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BurnRecord {
  /// Normalized (lowercased, 0x-prefixed) wallet address.
  pub address: String,
  pub tx_hash: String,
  /// Decimal token amount as submitted (not base units).
  pub amount: String,
}

/// Per-address burn state. Absence from the registry means UNKNOWN.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BurnStatus {
  /// Reserved: a transaction for this address is in flight.
  Pending,
  /// Confirmed on chain.
  Burned { tx_hash: String, amount: String },
}

/// One question/answer exchange within a questionnaire session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exchange {
  pub question: String,
  pub answer: String,
}

/// A Binno questionnaire session, kept in memory and keyed by UUID.
#[derive(Clone, Debug)]
pub struct Session {
  pub id: String,
  pub user_address: Option<String>,
  /// Completed question/answer pairs, in order.
  pub transcript: Vec<Exchange>,
  /// The question currently awaiting an answer. Empty once the session is complete.
  pub current_question: String,
  pub complete: bool,
}

/// Final questionnaire verdict.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
  /// 0-100.
  pub score: u8,
  pub verdict: String,
  pub strengths: Vec<String>,
  pub risks: Vec<String>,
}

/// Where did the analysis come from? Logged and returned so the UI can label
/// AI-generated vs. locally computed reports.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
  Model,
  LocalFallback,
}
