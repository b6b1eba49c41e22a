// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

//! Formatting helpers for on-device display of request fields

use core::{fmt::Write, str::from_utf8};

use emstr::{
    helpers::{Fractional, Hex},
    EncodeStr,
};
use heapless::String;

use ledger_ada_apdu::path::Bip44Path;

use crate::engine::{Error, MAX_VALUE_LEN};

/// Lovelace per ADA
pub const LOVELACE_PER_ADA: i64 = 1_000_000;

/// Format a lovelace amount as ADA
pub fn fmt_ada(lovelace: u64, buff: &mut [u8]) -> &str {
    let value = match i64::try_from(lovelace) {
        Ok(v) => v,
        Err(_) => return "VALUE_ERR",
    };

    let mut n = match emstr::write!(&mut buff[..], Fractional::<i64>::new(value, LOVELACE_PER_ADA))
    {
        Ok(v) => v,
        Err(_) => return "ENCODE_ERR",
    };

    match emstr::write!(&mut buff[n..], " ADA") {
        Ok(v) => n += v,
        Err(_) => return "ENCODE_ERR",
    }

    match from_utf8(&buff[..n]) {
        Ok(v) => v,
        Err(_) => "INVALID_UTF8",
    }
}

/// Format a token quantity, tokens carry no decimal places
pub fn fmt_amount(value: u64, buff: &mut [u8]) -> &str {
    let n = match emstr::write!(&mut buff[..], value) {
        Ok(v) => v,
        Err(_) => return "ENCODE_ERR",
    };

    match from_utf8(&buff[..n]) {
        Ok(v) => v,
        Err(_) => "INVALID_UTF8",
    }
}

/// Format bytes as hex, failing with [Error::InvalidLength] where the
/// output does not fit `buff`. Data is never shortened.
pub fn fmt_hex<'a>(data: &[u8], buff: &'a mut [u8]) -> Result<&'a str, Error> {
    if data.len() * 2 > buff.len() {
        return Err(Error::InvalidLength);
    }

    let n = emstr::write!(&mut buff[..], Hex(data)).map_err(|_| Error::InvalidLength)?;

    from_utf8(&buff[..n]).map_err(|_| Error::InvalidLength)
}

/// Format a derivation path as `m/44'/1815'/0'/0/1`
pub fn fmt_path(path: &Bip44Path) -> String<MAX_VALUE_LEN> {
    let mut s = String::new();
    // Longest path (10 hardened u32 segments) fits in MAX_VALUE_LEN
    let r = write!(s, "{path}");
    debug_assert!(r.is_ok(), "path exceeds display buffer");
    s
}
