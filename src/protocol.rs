//! Public protocol structs for the HTTP endpoints (serde ready).
//! Wire field names are camelCase to match the existing platform clients.
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{AnalysisReport, AnalysisSource};

//
// Burn flow
//

#[derive(Debug, Deserialize)]
pub struct BurnIn {
    #[serde(rename = "userAddress")]
    pub user_address: Option<String>,
}

/// Success payload for the burn endpoint. `already_burned` is present (true)
/// only on idempotent replays, which carry the original tx hash and no amount.
#[derive(Debug, Serialize)]
pub struct BurnOut {
    pub success: bool,
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(rename = "alreadyBurned", skip_serializing_if = "Option::is_none")]
    pub already_burned: Option<bool>,
    #[serde(rename = "explorerUrl", skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BurnStatusOut {
    pub address: String,
    /// "unknown" | "pending" | "burned"
    pub status: &'static str,
    #[serde(rename = "txHash", skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

//
// Binno questionnaire
//

#[derive(Debug, Deserialize)]
pub struct StartIn {
    #[serde(rename = "userAddress")]
    pub user_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionOut {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub question: String,
    /// 1-based position of this question.
    pub index: usize,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct SessionAnswerIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct SessionAnswerOut {
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub index: usize,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisOut {
    pub score: u8,
    pub verdict: String,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub source: AnalysisSource,
}

impl AnalysisOut {
    pub fn from_report(report: AnalysisReport, source: AnalysisSource) -> Self {
        Self {
            score: report.score,
            verdict: report.verdict,
            strengths: report.strengths,
            risks: report.risks,
            source,
        }
    }
}

/// Treasury inspection payload (ops/debugging; no secrets).
#[derive(Debug, Serialize)]
pub struct TreasuryOut {
    pub address: String,
    /// Token balance as a decimal string.
    pub balance: String,
    pub decimals: u8,
    #[serde(rename = "burnAmount")]
    pub burn_amount: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    #[serde(rename = "burnConfigured")]
    pub burn_configured: bool,
    #[serde(rename = "aiConfigured")]
    pub ai_configured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burn_out_replay_shape() {
        let out = BurnOut {
            success: true,
            tx_hash: "0xh".into(),
            amount: None,
            already_burned: Some(true),
            explorer_url: None,
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["txHash"], "0xh");
        assert_eq!(json["alreadyBurned"], true);
        assert!(json.get("amount").is_none());
        assert!(json.get("explorerUrl").is_none());
    }

    #[test]
    fn burn_in_accepts_camel_case() {
        let body: BurnIn =
            serde_json::from_str(r#"{"userAddress":"0xABC"}"#).unwrap();
        assert_eq!(body.user_address.as_deref(), Some("0xABC"));
        let empty: BurnIn = serde_json::from_str("{}").unwrap();
        assert!(empty.user_address.is_none());
    }
}
