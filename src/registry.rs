//! Burn registry: the per-address idempotence guard.
//!
//! Each wallet address moves through a small state machine:
//!
//!   UNKNOWN -> PENDING (reserved, transaction submitted)
//!   PENDING -> BURNED  (transaction confirmed)
//!   PENDING -> UNKNOWN (released on chain failure)
//!
//! `reserve` is the concurrency guard: an atomic insert-if-absent under one
//! write lock, taken before the (seconds-long) chain call. Two concurrent
//! requests for the same address cannot both reach the chain; the loser sees
//! `AlreadyPending`.
//!
//! Confirmed records are appended to a JSON-lines journal and replayed at
//! startup, so "at most one burn per address" survives process restarts.
//! Pending reservations are volatile on purpose: a crash mid-submission
//! releases the reservation implicitly and the user may retry.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::PathBuf;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::domain::{BurnRecord, BurnStatus};

/// Outcome of an attempt to reserve an address for burning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reservation {
  /// The caller holds the reservation and may submit the transaction.
  Reserved,
  /// Another request for this address is already in flight.
  AlreadyPending,
  /// This address has already burned; replay the original result.
  AlreadyBurned { tx_hash: String, amount: String },
}

pub struct BurnRegistry {
  inner: RwLock<HashMap<String, BurnStatus>>,
  journal: Option<PathBuf>,
}

impl BurnRegistry {
  /// Open a registry backed by a JSON-lines journal, replaying any confirmed
  /// records found there. Journal IO errors degrade to a volatile registry
  /// rather than refusing to start.
  pub fn open(journal: PathBuf) -> Self {
    let mut map = HashMap::new();

    if let Some(parent) = journal.parent() {
      if !parent.as_os_str().is_empty() {
        if let Err(e) = std::fs::create_dir_all(parent) {
          error!(target: "burn", path = %journal.display(), error = %e, "Cannot create journal directory; registry will be volatile");
          return Self { inner: RwLock::new(map), journal: None };
        }
      }
    }

    match std::fs::read_to_string(&journal) {
      Ok(contents) => {
        for (n, line) in contents.lines().enumerate() {
          if line.trim().is_empty() {
            continue;
          }
          match serde_json::from_str::<BurnRecord>(line) {
            Ok(rec) => {
              map.insert(
                rec.address,
                BurnStatus::Burned { tx_hash: rec.tx_hash, amount: rec.amount },
              );
            }
            Err(e) => {
              warn!(target: "burn", path = %journal.display(), line = n + 1, error = %e, "Skipping unparseable journal line");
            }
          }
        }
        info!(target: "burn", path = %journal.display(), replayed = map.len(), "Burn journal replayed");
      }
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        info!(target: "burn", path = %journal.display(), "No burn journal yet; starting empty");
      }
      Err(e) => {
        error!(target: "burn", path = %journal.display(), error = %e, "Cannot read journal; registry will be volatile");
        return Self { inner: RwLock::new(map), journal: None };
      }
    }

    Self { inner: RwLock::new(map), journal: Some(journal) }
  }

  /// Volatile registry without a journal.
  pub fn in_memory() -> Self {
    Self { inner: RwLock::new(HashMap::new()), journal: None }
  }

  /// Atomically reserve `address` (insert-if-absent). The address must already
  /// be normalized (lowercase 0x + 40 hex).
  pub async fn reserve(&self, address: &str) -> Reservation {
    let mut map = self.inner.write().await;
    match map.get(address) {
      Some(BurnStatus::Pending) => Reservation::AlreadyPending,
      Some(BurnStatus::Burned { tx_hash, amount }) => {
        Reservation::AlreadyBurned { tx_hash: tx_hash.clone(), amount: amount.clone() }
      }
      None => {
        map.insert(address.to_string(), BurnStatus::Pending);
        Reservation::Reserved
      }
    }
  }

  /// PENDING -> BURNED. Appends the record to the journal.
  pub async fn confirm(&self, address: &str, tx_hash: &str, amount: &str) {
    let mut map = self.inner.write().await;
    map.insert(
      address.to_string(),
      BurnStatus::Burned { tx_hash: tx_hash.to_string(), amount: amount.to_string() },
    );
    // Journal while holding the lock so replayed state can never be ahead of
    // or behind the in-memory map.
    if let Some(path) = &self.journal {
      let rec = BurnRecord {
        address: address.to_string(),
        tx_hash: tx_hash.to_string(),
        amount: amount.to_string(),
      };
      if let Err(e) = append_record(path, &rec) {
        error!(target: "burn", %address, path = %path.display(), error = %e, "Failed to journal confirmed burn");
      }
    }
    info!(target: "burn", %address, %tx_hash, %amount, "Burn confirmed");
  }

  /// PENDING -> UNKNOWN. Never removes a confirmed record.
  pub async fn release(&self, address: &str) {
    let mut map = self.inner.write().await;
    if matches!(map.get(address), Some(BurnStatus::Pending)) {
      map.remove(address);
      info!(target: "burn", %address, "Reservation released");
    }
  }

  /// Current state for an address; `None` means UNKNOWN.
  pub async fn lookup(&self, address: &str) -> Option<BurnStatus> {
    self.inner.read().await.get(address).cloned()
  }

  /// Number of confirmed burns (pending reservations excluded).
  pub async fn burned_count(&self) -> usize {
    self
      .inner
      .read()
      .await
      .values()
      .filter(|s| matches!(s, BurnStatus::Burned { .. }))
      .count()
  }
}

fn append_record(path: &PathBuf, rec: &BurnRecord) -> std::io::Result<()> {
  let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
  let line = serde_json::to_string(rec).map_err(std::io::Error::other)?;
  writeln!(file, "{line}")
}

#[cfg(test)]
mod tests {
  use super::*;

  const ADDR: &str = "0xabcdef0123456789abcdef0123456789abcdef01";

  #[tokio::test]
  async fn reserve_then_confirm_is_replayed_to_later_callers() {
    let reg = BurnRegistry::in_memory();
    assert_eq!(reg.reserve(ADDR).await, Reservation::Reserved);
    reg.confirm(ADDR, "0xhash", "1000").await;

    match reg.reserve(ADDR).await {
      Reservation::AlreadyBurned { tx_hash, amount } => {
        assert_eq!(tx_hash, "0xhash");
        assert_eq!(amount, "1000");
      }
      other => panic!("expected AlreadyBurned, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn concurrent_reservation_is_rejected_until_released() {
    let reg = BurnRegistry::in_memory();
    assert_eq!(reg.reserve(ADDR).await, Reservation::Reserved);
    assert_eq!(reg.reserve(ADDR).await, Reservation::AlreadyPending);

    reg.release(ADDR).await;
    assert_eq!(reg.reserve(ADDR).await, Reservation::Reserved);
  }

  #[tokio::test]
  async fn release_never_drops_a_confirmed_record() {
    let reg = BurnRegistry::in_memory();
    reg.reserve(ADDR).await;
    reg.confirm(ADDR, "0xhash", "1000").await;
    reg.release(ADDR).await;

    assert!(matches!(reg.lookup(ADDR).await, Some(BurnStatus::Burned { .. })));
    assert_eq!(reg.burned_count().await, 1);
  }

  #[tokio::test]
  async fn journal_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("burns.jsonl");

    {
      let reg = BurnRegistry::open(path.clone());
      reg.reserve(ADDR).await;
      reg.confirm(ADDR, "0xhash", "1000").await;
    }

    let reopened = BurnRegistry::open(path);
    match reopened.lookup(ADDR).await {
      Some(BurnStatus::Burned { tx_hash, amount }) => {
        assert_eq!(tx_hash, "0xhash");
        assert_eq!(amount, "1000");
      }
      other => panic!("expected Burned after replay, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn pending_reservations_are_not_journaled() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("burns.jsonl");

    {
      let reg = BurnRegistry::open(path.clone());
      reg.reserve(ADDR).await;
      // process "crashes" before confirm
    }

    let reopened = BurnRegistry::open(path);
    assert_eq!(reopened.lookup(ADDR).await, None);
    assert_eq!(reopened.reserve(ADDR).await, Reservation::Reserved);
  }

  #[tokio::test]
  async fn corrupt_journal_lines_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("burns.jsonl");
    std::fs::write(
      &path,
      format!(
        "{}\nnot json at all\n",
        serde_json::to_string(&BurnRecord {
          address: ADDR.into(),
          tx_hash: "0xhash".into(),
          amount: "1000".into(),
        })
        .unwrap()
      ),
    )
    .unwrap();

    let reg = BurnRegistry::open(path);
    assert!(matches!(reg.lookup(ADDR).await, Some(BurnStatus::Burned { .. })));
    assert_eq!(reg.burned_count().await, 1);
  }
}
