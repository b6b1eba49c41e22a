// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

//! Cardano hardware wallet core
//!
//! This provides the security [policy] and a common [Engine][engine::Engine]
//! driving user confirmation of sensitive requests, for execution on
//! hardware wallets.
//!
//! Requests are decoded from APDUs via [Request::parse][engine::Request::parse],
//! see [ledger_ada_apdu] for APDU objects and wire encodings.
//!
//! ## Operations
//!
//! Every request is first classified by the [policy] into one of five
//! [outcomes][policy::Policy]:
//!
//! - [`Allow`][policy::Policy::Allow] requests are answered without user interaction
//! - [`Deny`][policy::Policy::Deny] requests fail with [`PolicyDenied`][engine::Error::PolicyDenied]
//! - [`PromptBeforeResponse`][policy::Policy::PromptBeforeResponse],
//!   [`PromptWarnUnusual`][policy::Policy::PromptWarnUnusual] and
//!   [`ShowBeforeResponse`][policy::Policy::ShowBeforeResponse] requests start a
//!   confirmation [flow][engine::Flow]
//!
//! ### Confirmation flows
//!
//! Flows are started with [`Engine::start`][engine::Engine::start] (or
//! [`Engine::request`][engine::Engine::request] for decoded requests), and
//! resumed with [`Engine::update`][engine::Engine::update] for each user
//! response until the engine returns [`UiResult::Exit`][engine::UiResult::Exit]
//! with the approval outcome. Only one flow may be active at a time.
//!
//! Facts shown to the user (paths, amounts, addresses) are collected into
//! pages by the [`Pager`][engine::Pager] and rendered via the platform
//! [`Render`][engine::Render] implementation.
//!
//! ### Executing a transaction
//!
//! 1. Issue [`TxInitReq`][ledger_ada_apdu::tx::TxInitReq] to set the signing account
//! 2. Add inputs via [`TxInputReq`][ledger_ada_apdu::tx::TxInputReq]
//! 3. Add outputs via [`TxOutputReq`][ledger_ada_apdu::tx::TxOutputReq] (third-party)
//!    or [`TxChangeOutputReq`][ledger_ada_apdu::tx::TxChangeOutputReq] (change),
//!    followed by token, datum and reference script flows where present
//! 4. Set the fee via [`TxFeeReq`][ledger_ada_apdu::tx::TxFeeReq]
//! 5. Confirm the transaction ([`TxConfirm`][engine::flows::TxConfirm])
//! 6. Request witnesses via [`TxWitnessReq`][ledger_ada_apdu::tx::TxWitnessReq]
//!

#![cfg_attr(not(feature = "std"), no_std)]

pub use ledger_ada_apdu::{self as apdu};

pub mod engine;

pub mod helpers;

pub mod policy;
