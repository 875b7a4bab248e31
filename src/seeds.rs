//! Built-in fallback content for the Binno questionnaire.
//!
//! Used when OpenAI is unavailable (no key, or a call fails): a static question
//! bank and a locally computed analysis. Last resort, intentionally generic.

use crate::domain::{AnalysisReport, Exchange};

/// Static question bank, served in order when no model is available.
/// A TOML `questions` list (BINNO_CONFIG_PATH) overrides this bank.
pub fn fallback_questions() -> Vec<String> {
  [
    "Describe your Web3 project in one or two sentences. What problem does it solve?",
    "Who is your target user, and how do they discover your product today?",
    "What does your token actually do? Why does the project need one?",
    "How is the token supply distributed between team, investors and community?",
    "Which chain(s) do you deploy on, and why that choice?",
    "Have your smart contracts been audited? By whom, and what was found?",
    "How does the project generate revenue or sustain itself after launch?",
    "What is your biggest technical risk right now?",
    "Who are your closest competitors, and what makes you different?",
    "What milestone are you targeting in the next six months?",
  ]
  .into_iter()
  .map(String::from)
  .collect()
}

/// Locally computed analysis when the model is unavailable.
/// Scores answer engagement only (length-based), so it is honest about being
/// a rough signal rather than a fake model verdict.
pub fn fallback_analysis(transcript: &[Exchange]) -> AnalysisReport {
  let answered = transcript.iter().filter(|e| !e.answer.trim().is_empty()).count();
  let substantive = transcript
    .iter()
    .filter(|e| e.answer.trim().chars().count() >= 40)
    .count();

  let total = transcript.len().max(1);
  let mut score = (answered * 50 / total) + (substantive * 50 / total);
  score = score.min(100);

  let mut strengths = Vec::new();
  let mut risks = Vec::new();
  if substantive * 2 >= total {
    strengths.push("Detailed answers across most of the interview".to_string());
  } else {
    risks.push("Several answers were too brief to assess".to_string());
  }
  if answered < total {
    risks.push(format!("{} of {} questions went unanswered", total - answered, total));
  }
  risks.push("Automated offline review; request a full AI analysis for a substantive verdict".to_string());

  AnalysisReport {
    score: score as u8,
    verdict: format!(
      "Offline review only: {answered} of {total} questions answered, {substantive} in depth. \
       This score reflects interview completeness, not project quality."
    ),
    strengths,
    risks,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ex(q: &str, a: &str) -> Exchange {
    Exchange { question: q.into(), answer: a.into() }
  }

  #[test]
  fn bank_has_ten_distinct_questions() {
    let qs = fallback_questions();
    assert_eq!(qs.len(), 10);
    let mut uniq = qs.clone();
    uniq.sort();
    uniq.dedup();
    assert_eq!(uniq.len(), qs.len());
  }

  #[test]
  fn empty_transcript_scores_zero() {
    let report = fallback_analysis(&[]);
    assert_eq!(report.score, 0);
  }

  #[test]
  fn thorough_answers_score_high() {
    let long = "We are building a decentralized credential registry for online \
                education with verifiable on-chain attestations.";
    let transcript: Vec<Exchange> = (0..10).map(|i| ex(&format!("q{i}"), long)).collect();
    let report = fallback_analysis(&transcript);
    assert_eq!(report.score, 100);
    assert!(report.strengths.iter().any(|s| s.contains("Detailed")));
  }

  #[test]
  fn short_answers_are_flagged() {
    let transcript: Vec<Exchange> = (0..10).map(|i| ex(&format!("q{i}"), "yes")).collect();
    let report = fallback_analysis(&transcript);
    assert!(report.score <= 50);
    assert!(report.risks.iter().any(|r| r.contains("too brief")));
  }
}
