//! Treasury transfer service for BNB Smart Chain.
//!
//! One job: a single BEP-20 `transfer(DEAD_ADDRESS, amount)` signed by the
//! server-held treasury key, awaited to one confirmation. Read-only balance
//! and decimals helpers ride along. No retry, no custom nonce or gas strategy;
//! nonce management is the signing provider's concern.
//!
//! NOTE: We never log the treasury key.

use std::str::FromStr;

use alloy::network::EthereumWallet;
use alloy::primitives::{
  utils::{format_units, parse_units},
  Address, U256,
};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::config::{ChainConfig, DEAD_ADDRESS};

sol! {
  #[sol(rpc)]
  contract Bep20 {
    function transfer(address to, uint256 amount) external returns (bool);
    function decimals() external view returns (uint8);
    function balanceOf(address owner) external view returns (uint256);
  }
}

#[derive(Debug, Error)]
pub enum ChainError {
  #[error("invalid address: {0}")]
  InvalidAddress(String),

  #[error("invalid burn amount '{0}': {1}")]
  InvalidAmount(String, String),

  #[error("token transfer returned false")]
  TransferRejected,

  #[error("{0}")]
  Rpc(String),
}

/// Coarse classification of chain-level failures, used to pick the
/// human-readable message surfaced to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainErrorKind {
  RejectedByUser,
  InsufficientFunds,
  Generic,
}

/// Substring match against known provider/wallet error texts.
pub fn classify_chain_error(message: &str) -> ChainErrorKind {
  let m = message.to_lowercase();
  if m.contains("user rejected") || m.contains("user denied") || m.contains("action_rejected") {
    return ChainErrorKind::RejectedByUser;
  }
  if m.contains("insufficient funds")
    || m.contains("insufficient balance")
    || m.contains("transfer amount exceeds balance")
    || m.contains("gas required exceeds")
  {
    return ChainErrorKind::InsufficientFunds;
  }
  ChainErrorKind::Generic
}

/// Result of a successful burn submission.
#[derive(Clone, Debug)]
pub struct BurnReceipt {
  pub tx_hash: String,
  /// Decimal amount as configured (not base units).
  pub amount: String,
}

#[derive(Clone)]
pub struct BscService {
  provider: DynProvider,
  token_address: Address,
  burn_address: Address,
  treasury_address: Address,
}

impl BscService {
  /// Construct the service if the treasury key and token address are present
  /// and parseable; otherwise return None. Construction does not touch the
  /// network, so a bad RPC URL surfaces on first call rather than at startup.
  pub fn from_config(cfg: &ChainConfig) -> Option<Self> {
    let key = cfg.treasury_key.as_deref()?;
    let token = cfg.token_address.as_deref()?;

    let signer = match PrivateKeySigner::from_str(key.trim()) {
      Ok(s) => s,
      Err(e) => {
        error!(target: "burn", error = %e, "PRIVATE_KEY_TREASURY is not a valid private key");
        return None;
      }
    };
    let treasury_address = signer.address();

    let token_address = match Address::from_str(&token.trim().to_lowercase()) {
      Ok(a) => a,
      Err(e) => {
        error!(target: "burn", error = %e, "TOKEN_ADDRESS is not a valid address");
        return None;
      }
    };
    // DEAD_ADDRESS is a compile-time constant; lowercase to skip checksum validation.
    let burn_address = Address::from_str(&DEAD_ADDRESS.to_lowercase()).ok()?;

    let url = match cfg.rpc_url.parse() {
      Ok(u) => u,
      Err(e) => {
        error!(target: "burn", url = %cfg.rpc_url, error = %e, "BSC_RPC_URL is not a valid URL");
        return None;
      }
    };

    let provider = ProviderBuilder::new()
      .wallet(EthereumWallet::from(signer))
      .connect_http(url)
      .erased();

    Some(Self { provider, token_address, burn_address, treasury_address })
  }

  pub fn treasury_address(&self) -> String {
    self.treasury_address.to_string()
  }

  fn token(&self) -> Bep20::Bep20Instance<DynProvider> {
    Bep20::new(self.token_address, self.provider.clone())
  }

  #[instrument(level = "info", skip(self))]
  pub async fn get_decimals(&self) -> Result<u8, ChainError> {
    self
      .token()
      .decimals()
      .call()
      .await
      .map_err(|e| ChainError::Rpc(e.to_string()))
  }

  /// Token balance of `address`, formatted as a decimal string.
  #[instrument(level = "info", skip(self))]
  pub async fn get_balance(&self, address: &str) -> Result<String, ChainError> {
    let addr =
      Address::from_str(address).map_err(|e| ChainError::InvalidAddress(e.to_string()))?;
    let token = self.token();
    let decimals = token
      .decimals()
      .call()
      .await
      .map_err(|e| ChainError::Rpc(e.to_string()))?;
    let raw: U256 = token
      .balanceOf(addr)
      .call()
      .await
      .map_err(|e| ChainError::Rpc(e.to_string()))?;
    format_units(raw, decimals).map_err(|e| ChainError::Rpc(e.to_string()))
  }

  /// Transfer `amount` (decimal string) of the token from the treasury to the
  /// dead address and wait for one confirmation.
  #[instrument(level = "info", skip(self), fields(%amount, token = %self.token_address))]
  pub async fn burn_tokens(&self, amount: &str) -> Result<BurnReceipt, ChainError> {
    let token = self.token();
    let decimals = token
      .decimals()
      .call()
      .await
      .map_err(|e| ChainError::Rpc(e.to_string()))?;
    let units: U256 = parse_units(amount, decimals)
      .map_err(|e| ChainError::InvalidAmount(amount.to_string(), e.to_string()))?
      .get_absolute();

    let pending = token
      .transfer(self.burn_address, units)
      .send()
      .await
      .map_err(|e| ChainError::Rpc(e.to_string()))?;
    let receipt = pending
      .get_receipt()
      .await
      .map_err(|e| ChainError::Rpc(e.to_string()))?;

    if !receipt.status() {
      return Err(ChainError::TransferRejected);
    }

    let tx_hash = receipt.transaction_hash.to_string();
    info!(target: "burn", %tx_hash, %amount, "Burn transfer confirmed on chain");
    Ok(BurnReceipt { tx_hash, amount: amount.to_string() })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // Well-known throwaway dev key (anvil account 0); never funded on mainnet.
  const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
  const TOKEN: &str = "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82";

  fn cfg(key: Option<&str>, token: Option<&str>) -> ChainConfig {
    ChainConfig {
      rpc_url: "https://bsc-dataseed.binance.org".into(),
      treasury_key: key.map(String::from),
      token_address: token.map(String::from),
      burn_amount: "1000".into(),
      explorer_base: "https://bscscan.com".into(),
      journal_path: "data/burn_journal.jsonl".into(),
    }
  }

  #[test]
  fn service_requires_key_and_token() {
    assert!(BscService::from_config(&cfg(None, None)).is_none());
    assert!(BscService::from_config(&cfg(Some(DEV_KEY), None)).is_none());
    assert!(BscService::from_config(&cfg(None, Some(TOKEN))).is_none());
    assert!(BscService::from_config(&cfg(Some(DEV_KEY), Some(TOKEN))).is_some());
  }

  #[test]
  fn service_rejects_garbage_key_or_token() {
    assert!(BscService::from_config(&cfg(Some("not-a-key"), Some(TOKEN))).is_none());
    assert!(BscService::from_config(&cfg(Some(DEV_KEY), Some("not-an-address"))).is_none());
  }

  #[test]
  fn classification_matches_known_reasons() {
    assert_eq!(
      classify_chain_error("server returned an error response: insufficient funds for gas * price + value"),
      ChainErrorKind::InsufficientFunds
    );
    assert_eq!(
      classify_chain_error("execution reverted: BEP20: transfer amount exceeds balance"),
      ChainErrorKind::InsufficientFunds
    );
    assert_eq!(
      classify_chain_error("MetaMask Tx Signature: User denied transaction signature"),
      ChainErrorKind::RejectedByUser
    );
    assert_eq!(classify_chain_error("nonce too low"), ChainErrorKind::Generic);
  }
}
