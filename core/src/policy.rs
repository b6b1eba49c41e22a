// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

//! Security policy, classifying requests by the level of user
//! involvement they require.
//!
//! Each `for_*` function is pure and inspects only the request fields
//! passed in. [Policy::Deny] is reserved for structurally invalid requests,
//! requests that are valid but unusual are routed through a warning.

use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter};

use ledger_ada_apdu::path::{Bip44Path, ChainType, I_ADDRESS};

use crate::engine::Error;

/// Trust outcome for a request
#[derive(Copy, Clone, PartialEq, Debug, Display, EnumIter, TryFromPrimitive)]
#[repr(u8)]
pub enum Policy {
    /// Proceed without user interaction
    Allow = 1,
    /// Refuse the request
    Deny = 2,
    /// Ask the user before responding
    PromptBeforeResponse = 3,
    /// Warn the user of an unusual request, then ask
    PromptWarnUnusual = 4,
    /// Show the result to the user before responding
    ShowBeforeResponse = 5,
}

impl Policy {
    /// Convert [Policy::Deny] to [Error::PolicyDenied], passing other
    /// outcomes through
    pub fn check(self) -> Result<Policy, Error> {
        match self {
            Policy::Deny => {
                #[cfg(feature = "log")]
                log::warn!("request denied by policy");

                Err(Error::PolicyDenied)
            }
            p => Ok(p),
        }
    }

    /// Whether the request needs any user interaction
    pub fn is_interactive(&self) -> bool {
        !matches!(self, Policy::Allow | Policy::Deny)
    }
}

/// Transaction-wide context used by per-element policies, set by
/// [TxInitReq][ledger_ada_apdu::tx::TxInitReq] and cleared once the
/// transaction ends.
///
/// Per-element policies treat a missing context as unusual.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TxContext {
    /// Account the transaction is signed for (unhardened)
    pub account: u32,
    /// Witnesses still expected before the transaction is complete
    pub witnesses: u16,
}

impl TxContext {
    pub const fn new(account: u32, witnesses: u16) -> Self {
        Self { account, witnesses }
    }
}

/// Structural address validation, provided by the address format codec
pub trait AddressCheck {
    /// Returns true when `raw` is a well-formed binary address
    fn is_well_formed(&self, raw: &[u8]) -> bool;
}

impl<T: AddressCheck> AddressCheck for &T {
    fn is_well_formed(&self, raw: &[u8]) -> bool {
        T::is_well_formed(self, raw)
    }
}

/// Header-only [AddressCheck], validating the address type nibble and
/// the length expected for that type
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct HeaderCheck;

/// Base address length (header + payment hash + staking hash)
pub const BASE_ADDRESS_LEN: usize = 57;

/// Enterprise / reward address length (header + single hash)
pub const SHORT_ADDRESS_LEN: usize = 29;

/// Minimum pointer address length
pub const MIN_POINTER_ADDRESS_LEN: usize = 30;

/// Minimum Byron address length
pub const MIN_BYRON_ADDRESS_LEN: usize = 2;

/// Address type from the upper header nibble
#[derive(Copy, Clone, PartialEq, Debug, Display)]
pub enum AddressType {
    Base,
    Pointer,
    Enterprise,
    Byron,
    Reward,
}

impl AddressType {
    /// Decode address type from an address header byte
    pub fn from_header(header: u8) -> Option<Self> {
        match header >> 4 {
            0..=3 => Some(AddressType::Base),
            4 | 5 => Some(AddressType::Pointer),
            6 | 7 => Some(AddressType::Enterprise),
            8 => Some(AddressType::Byron),
            14 | 15 => Some(AddressType::Reward),
            _ => None,
        }
    }
}

/// Whether the payment part of a Shelley address is a script hash
pub fn has_script_payment(raw: &[u8]) -> bool {
    match raw.first() {
        Some(h) if h >> 4 < 8 => (h >> 4) & 0x01 != 0,
        _ => false,
    }
}

impl AddressCheck for HeaderCheck {
    fn is_well_formed(&self, raw: &[u8]) -> bool {
        let header = match raw.first() {
            Some(h) => *h,
            None => return false,
        };

        match AddressType::from_header(header) {
            Some(AddressType::Base) => raw.len() == BASE_ADDRESS_LEN,
            Some(AddressType::Enterprise) | Some(AddressType::Reward) => {
                raw.len() == SHORT_ADDRESS_LEN
            }
            Some(AddressType::Pointer) => raw.len() >= MIN_POINTER_ADDRESS_LEN,
            Some(AddressType::Byron) => raw.len() >= MIN_BYRON_ADDRESS_LEN,
            None => false,
        }
    }
}

/// Ordinary payment path `44'/1815'/a'/{0,1}/i` with reasonable indices
fn is_standard_spending(path: &Bip44Path) -> bool {
    path.len() == 5
        && path.has_reasonable_account()
        && matches!(
            path.chain_type(),
            Some(ChainType::External) | Some(ChainType::Internal)
        )
        && path.has_reasonable_address()
}

/// Ordinary staking path `44'/1815'/a'/2/0`
fn is_standard_staking(path: &Bip44Path) -> bool {
    path.len() == 5
        && path.has_reasonable_account()
        && path.chain_type() == Some(ChainType::Staking)
        && path.get(I_ADDRESS) == Some(0)
}

/// Staking path is the ordinary staking key of `account`
fn is_staking_for(staking: &Bip44Path, account: Option<u32>) -> bool {
    is_standard_staking(staking) && account.is_some() && staking.account() == account
}

/// Prefix check over the spending path and any staking path
fn has_valid_prefixes(path: &Bip44Path, staking: Option<&Bip44Path>) -> bool {
    path.has_valid_prefix() && staking.map_or(true, |s| s.has_valid_prefix())
}

fn is_standard_address(path: &Bip44Path) -> bool {
    is_standard_spending(path) || is_standard_staking(path)
}

/// Policy for exporting an extended public key
pub fn for_get_extended_public_key(path: &Bip44Path) -> Policy {
    if !path.has_valid_prefix() {
        return Policy::Deny;
    }

    // Keys are normally exported at the account level
    if !path.has_reasonable_account() || path.contains_chain_type() {
        return Policy::PromptWarnUnusual;
    }

    Policy::PromptBeforeResponse
}

/// Policy for announcing a bulk public key export
pub fn for_get_public_keys_init(num_paths: u32) -> Policy {
    match num_paths {
        0 => Policy::Deny,
        1 => Policy::Allow,
        _ => Policy::PromptBeforeResponse,
    }
}

/// Whether an address from `path` (and optional `staking` key) is one
/// the wallet would derive for itself
fn is_standard_derivation(path: &Bip44Path, staking: Option<&Bip44Path>) -> bool {
    is_standard_address(path) && staking.map_or(true, |s| is_staking_for(s, path.account()))
}

/// Policy for deriving an address to be shown on the device
pub fn for_show_derive_address(path: &Bip44Path, staking: Option<&Bip44Path>) -> Policy {
    if !has_valid_prefixes(path, staking) {
        return Policy::Deny;
    }

    if is_standard_derivation(path, staking) {
        Policy::ShowBeforeResponse
    } else {
        Policy::PromptWarnUnusual
    }
}

/// Policy for deriving an address to be returned to the host
pub fn for_return_derive_address(path: &Bip44Path, staking: Option<&Bip44Path>) -> Policy {
    if !has_valid_prefixes(path, staking) {
        return Policy::Deny;
    }

    if is_standard_derivation(path, staking) {
        Policy::Allow
    } else {
        Policy::PromptBeforeResponse
    }
}

/// Policy for attesting a UTxO
pub fn for_attest_utxo() -> Policy {
    Policy::Allow
}

/// Policy for starting a transaction
pub fn for_sign_tx_init() -> Policy {
    Policy::Allow
}

/// Policy for adding a transaction input
pub fn for_sign_tx_input() -> Policy {
    Policy::Allow
}

/// Policy for an output paying a raw (third-party) address
pub fn for_sign_tx_output_address(raw: &[u8], check: impl AddressCheck) -> Policy {
    if !check.is_well_formed(raw) {
        return Policy::Deny;
    }

    Policy::PromptBeforeResponse
}

/// Policy for a change output, paying an address derived from `path`
/// and delegated to the optional `staking` key
pub fn for_sign_tx_output_path(
    ctx: Option<&TxContext>,
    path: &Bip44Path,
    staking: Option<&Bip44Path>,
) -> Policy {
    if !has_valid_prefixes(path, staking) {
        return Policy::Deny;
    }

    let account = match ctx {
        Some(c) => c.account,
        None => return Policy::PromptWarnUnusual,
    };

    let is_change = path.len() == 5
        && path.account() == Some(account)
        && path.chain_type() == Some(ChainType::Internal)
        && path.has_reasonable_address()
        && staking.map_or(true, |s| is_staking_for(s, Some(account)));

    if is_change {
        Policy::Allow
    } else {
        Policy::PromptWarnUnusual
    }
}

/// Policy for the transaction fee
pub fn for_sign_tx_fee(_fee: u64) -> Policy {
    Policy::PromptBeforeResponse
}

/// Policy for a witness request
pub fn for_sign_tx_witness(ctx: Option<&TxContext>, path: &Bip44Path) -> Policy {
    if !path.has_valid_prefix() {
        return Policy::Deny;
    }

    let account = match ctx {
        Some(c) => c.account,
        None => return Policy::PromptWarnUnusual,
    };

    let unusual = path.account() != Some(account)
        || !path.has_reasonable_account()
        || !path.has_valid_chain_type()
        || !path.contains_address();

    if unusual {
        Policy::PromptWarnUnusual
    } else {
        Policy::Allow
    }
}

/// Policy for confirming the whole transaction
pub fn for_sign_tx_confirm() -> Policy {
    Policy::PromptBeforeResponse
}
