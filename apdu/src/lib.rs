// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

//! Protocol / APDU definitions for Cardano app communication
//!
//! This module provides the request objects carrying the fields the wallet
//! security policy needs (derivation paths, raw output addresses, amounts
//! and fees) along with their binary encodings.
//!
//! Framing and dispatch of APDUs is left to the transport, objects here
//! only describe APDU payloads.
//! All multi-byte fields are big-endian, matching the BIP-0032 serialisation
//! of derivation path segments.
//!

#![no_std]

pub use ledger_proto::{ApduError, ApduStatic};

pub mod address;
pub mod path;
pub mod prelude;
pub mod pubkey;
pub mod tx;

/// Cardano APDU Class
pub const ADA_APDU_CLA: u8 = 0xd7;

/// Cardano APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum Instruction {
    /// Announce a bulk public key export
    GetExtendedPublicKeysInit = 0x0f,

    /// Export an extended public key
    GetExtendedPublicKey = 0x10,

    /// Derive an address, returning or displaying it
    DeriveAddress = 0x11,

    /// Initialise a transaction
    TxInit = 0x20,

    /// Add a transaction input
    TxInput = 0x21,

    /// Add a transaction output to a third-party address
    TxOutput = 0x22,

    /// Add a transaction output to an address owned by this device
    TxChangeOutput = 0x23,

    /// Set the transaction fee
    TxFee = 0x24,

    /// Request a witness for a given path
    TxWitness = 0x25,

    /// Attest a UTxO
    AttestUtxo = 0x30,
}

/// Helper macro for encoding `bitflags` types
#[macro_export]
macro_rules! encdec_bitflags {
    ($b:ty) => {
        impl encdec::Encode for $b {
            type Error = ApduError;

            fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
                let bits: u8 = self.bits();
                encdec::Encode::encode(&bits, buff).map_err(|e| e.into())
            }

            fn encode_len(&self) -> Result<usize, Self::Error> {
                let bits: u8 = self.bits();
                encdec::Encode::encode_len(&bits).map_err(|e| e.into())
            }
        }

        impl encdec::DecodeOwned for $b {
            type Output = $b;
            type Error = ApduError;

            fn decode_owned(buff: &[u8]) -> Result<(Self, usize), Self::Error> {
                if buff.is_empty() {
                    return Err(ApduError::InvalidLength);
                }
                let v = <$b>::from_bits_truncate(buff[0]);
                Ok((v, 1))
            }
        }
    };
}
