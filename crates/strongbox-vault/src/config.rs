use std::path::Path;

use serde::{Deserialize, Serialize};
use strongbox_core::asset::AssetKind;
use strongbox_core::constants::{DEFAULT_CLAIM_NAME, DEFAULT_CLAIM_SYMBOL};
use strongbox_core::error::StrongboxError;

/// How deposit records are keyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPolicy {
    /// One record per configuring account.
    Account,
    /// One record per configuring account and asset.
    AccountAsset,
    /// Unlimited records, each keyed by a freshly minted claim token.
    Claim,
}

/// What withdrawal does to the configured-keys enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Enumeration {
    /// Withdrawn keys stay listed.
    #[default]
    Retain,
    /// Withdrawal removes the key.
    PruneOnWithdraw,
}

/// Vault variant selection, loaded from JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub slot_policy: SlotPolicy,
    pub enumeration: Enumeration,
    pub accepted_assets: Vec<AssetKind>,
    pub claim_name: String,
    pub claim_symbol: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            slot_policy: SlotPolicy::Claim,
            enumeration: Enumeration::Retain,
            accepted_assets: vec![AssetKind::Native, AssetKind::Fungible, AssetKind::Item],
            claim_name: DEFAULT_CLAIM_NAME.into(),
            claim_symbol: DEFAULT_CLAIM_SYMBOL.into(),
        }
    }
}

impl VaultConfig {
    pub fn from_json_str(json: &str) -> Result<Self, StrongboxError> {
        serde_json::from_str(json).map_err(|e| StrongboxError::Serialization(format!("vault config: {e}")))
    }

    /// Read and parse a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StrongboxError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| StrongboxError::Storage(format!("reading {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Single-account vault for one asset kind.
    pub fn per_account(kind: AssetKind) -> Self {
        Self { slot_policy: SlotPolicy::Account, accepted_assets: vec![kind], ..Self::default() }
    }

    /// One record per account and asset, any asset kind.
    pub fn per_holding() -> Self {
        Self { slot_policy: SlotPolicy::AccountAsset, ..Self::default() }
    }

    pub fn accepts(&self, kind: AssetKind) -> bool {
        self.accepted_assets.contains(&kind)
    }
}
