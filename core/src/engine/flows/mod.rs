// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

//! Confirmation flows, one per request kind.
//!
//! Each flow is constructed from the [Policy] computed for its request,
//! which selects the first step. [Policy::Deny] never creates a flow and
//! [Policy::Allow] skips directly to the response.

use core::{fmt::Write, str::from_utf8};

use emstr::{helpers::Hex, EncodeStr};
use heapless::String;

use crate::{helpers::fmt_hex, policy::Policy};

use super::{
    display::Display,
    flow::Next,
    pager::{MAX_LABEL_LEN, MAX_VALUE_LEN},
    render::Render,
    Error,
};

mod keys;
pub use keys::{GetKey, GetKeyStep, KeysInit, KeysInitStep};

mod address;
pub use address::{DeriveAddress, DeriveAddressStep};

mod output;
pub use output::{
    CollateralOutput, CollateralOutputStep, OutputAddressBytes, OutputAddressBytesStep,
    OutputAddressParams, OutputAddressParamsStep,
};

mod assets;
pub use assets::{Datum, DatumKind, DatumStep, RefScript, RefScriptStep, Token, TokenStep};

mod tx;
pub use tx::{Fee, FeeStep, OutputConfirm, OutputConfirmStep, TxConfirm, TxConfirmStep, Witness, WitnessStep};

/// Maximum chunk of a datum or script retained for display
pub const MAX_PREVIEW_LEN: usize = 32;

/// Address bytes shown per fact, filling a value once hex encoded
pub const ADDRESS_CHUNK_LEN: usize = MAX_VALUE_LEN / 2;

/// Select the entry step for a policy outcome
pub(crate) fn entry<S>(policy: Policy, select: impl Fn(Policy) -> Option<S>) -> Result<S, Error> {
    let p = policy.check()?;

    match select(p) {
        Some(s) => Ok(s),
        None => {
            #[cfg(feature = "log")]
            log::error!("unsupported policy {} for flow", p);

            Err(Error::UnexpectedFlowState)
        }
    }
}

/// Show chunk `chunk` of an address, the first chunk opening a new page.
///
/// Addresses longer than [ADDRESS_CHUNK_LEN] span several facts labelled
/// `label (i/n)`, each resuming at `this(chunk + 1)` until every byte has
/// been shown and the flow continues at `next`.
pub(crate) fn address_chunk<R: Render, S>(
    display: &mut Display<R>,
    label: &str,
    raw: &[u8],
    chunk: u8,
    this: impl Fn(u8) -> S,
    next: S,
) -> Result<Next<S>, Error> {
    let total = raw.chunks(ADDRESS_CHUNK_LEN).len();
    let data = raw
        .chunks(ADDRESS_CHUNK_LEN)
        .nth(chunk as usize)
        .ok_or(Error::InvalidLength)?;

    let mut buff = [0u8; MAX_VALUE_LEN];
    let value = fmt_hex(data, &mut buff)?;

    let mut numbered = String::<MAX_LABEL_LEN>::new();
    let label = if total > 1 {
        write!(numbered, "{label} ({}/{total})", chunk + 1).map_err(|_| Error::InvalidLength)?;
        numbered.as_str()
    } else {
        label
    };

    let shown = match chunk {
        0 => display.fact_new_page(label, value)?,
        _ => display.fact(label, value)?,
    };

    let following = chunk + 1;
    if (following as usize) < total {
        Ok(shown.then(this(following)))
    } else {
        Ok(shown.then(next))
    }
}

/// Format a sized blob preview as `N bytes: 0123..`
pub(crate) fn fmt_preview<'a>(size: u32, preview: &[u8], buff: &'a mut [u8]) -> &'a str {
    let r = if (size as usize) > preview.len() {
        emstr::write!(&mut buff[..], size, " bytes: ", Hex(preview), "..")
    } else {
        emstr::write!(&mut buff[..], size, " bytes: ", Hex(preview))
    };

    let n = match r {
        Ok(v) => v,
        Err(_) => return "ENCODE_ERR",
    };

    match from_utf8(&buff[..n]) {
        Ok(v) => v,
        Err(_) => "INVALID_UTF8",
    }
}
