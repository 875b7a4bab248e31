//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Validate and normalize an EVM wallet address.
/// Accepts `0x` followed by exactly 40 hex chars (any casing) and returns the
/// lowercased form. Idempotence keys and journal entries always use this form,
/// so the same wallet spelled with mixed case maps to one record.
pub fn normalize_address(raw: &str) -> Option<String> {
  let s = raw.trim();
  let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
  if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
    return None;
  }
  Some(format!("0x{}", hex.to_ascii_lowercase()))
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
#[allow(dead_code)]
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max { s.to_string() } else { format!("{}… ({} bytes total)", &s[..max], s.len()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_accepts_mixed_case_and_lowercases() {
    let got = normalize_address("0xABCDEF0123456789ABCDEF0123456789ABCDEF01").expect("valid");
    assert_eq!(got, "0xabcdef0123456789abcdef0123456789abcdef01");
  }

  #[test]
  fn normalize_trims_surrounding_whitespace() {
    let got = normalize_address("  0xabcdef0123456789abcdef0123456789abcdef01 ").expect("valid");
    assert_eq!(got, "0xabcdef0123456789abcdef0123456789abcdef01");
  }

  #[test]
  fn normalize_rejects_bad_input() {
    assert!(normalize_address("").is_none());
    assert!(normalize_address("abcdef0123456789abcdef0123456789abcdef01").is_none()); // no 0x
    assert!(normalize_address("0xabcdef").is_none()); // too short
    assert!(normalize_address("0xabcdef0123456789abcdef0123456789abcdef0123").is_none()); // too long
    assert!(normalize_address("0xzzcdef0123456789abcdef0123456789abcdef01").is_none()); // not hex
  }

  #[test]
  fn fill_template_replaces_all_occurrences() {
    let out = fill_template("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]);
    assert_eq!(out, "x and y and x");
  }
}
