// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

//! BIP-0044 derivation paths, as carried in request APDUs
//!
//! Paths are encoded as a single segment count followed by that many
//! big-endian `u32` segments:
//!
//! ## Encoding:
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     COUNT     |          SEGMENT_0 (u32, big endian)          /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! /               |          SEGMENT_1 (u32, big endian)  ...     /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use byteorder::{BigEndian, ByteOrder};
use encdec::{DecodeOwned, Encode};
use heapless::Vec;
use ledger_proto::ApduError;
use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter};

/// Maximum number of segments in a path
pub const MAX_PATH_LEN: usize = 10;

/// Hardened derivation flag (high bit)
pub const HARDENED: u32 = 1 << 31;

/// BIP-0044 purpose segment (unhardened)
pub const BIP44_PURPOSE: u32 = 44;

/// SLIP-0044 coin type for ADA (unhardened)
pub const ADA_COIN_TYPE: u32 = 1815;

/// Accounts at or above this index are considered unusual
pub const MAX_REASONABLE_ACCOUNT: u32 = 100;

/// Address indices at or above this value are considered unusual
pub const MAX_REASONABLE_ADDRESS: u32 = 1_000_000;

/// Segment indices within a path
pub const I_PURPOSE: usize = 0;
pub const I_COIN_TYPE: usize = 1;
pub const I_ACCOUNT: usize = 2;
pub const I_CHAIN: usize = 3;
pub const I_ADDRESS: usize = 4;

/// Check whether a segment has the hardened flag set
pub const fn is_hardened(segment: u32) -> bool {
    segment & HARDENED != 0
}

/// Set the hardened flag on a segment
pub const fn harden(segment: u32) -> u32 {
    segment | HARDENED
}

/// Chain / role types allowed at [I_CHAIN]
#[derive(Copy, Clone, PartialEq, Debug, Display, EnumIter, TryFromPrimitive)]
#[repr(u32)]
pub enum ChainType {
    /// Receive addresses
    External = 0,
    /// Change addresses
    Internal = 1,
    /// Staking keys
    Staking = 2,
}

/// BIP-0044 derivation path with up to [MAX_PATH_LEN] segments
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Bip44Path(Vec<u32, MAX_PATH_LEN>);

impl Bip44Path {
    /// Create a path from a slice of segments
    pub fn new(segments: &[u32]) -> Result<Self, ApduError> {
        Vec::from_slice(segments)
            .map(Self)
            .map_err(|_| ApduError::InvalidLength)
    }

    /// Parse a path from the start of a buffer, returning the path
    /// and the number of bytes consumed
    pub fn parse(buff: &[u8]) -> Result<(Self, usize), ApduError> {
        Self::decode_owned(buff)
    }

    /// Number of segments in the path
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path segments
    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    /// Fetch a raw segment by index
    pub fn get(&self, index: usize) -> Option<u32> {
        self.0.get(index).copied()
    }

    /// Checks for the `44'/1815'/account'` prefix
    pub fn has_valid_prefix(&self) -> bool {
        self.len() > I_ACCOUNT
            && self.0[I_PURPOSE] == harden(BIP44_PURPOSE)
            && self.0[I_COIN_TYPE] == harden(ADA_COIN_TYPE)
            && is_hardened(self.0[I_ACCOUNT])
    }

    pub fn contains_account(&self) -> bool {
        self.len() > I_ACCOUNT
    }

    /// Account segment is present and hardened
    pub fn has_valid_account(&self) -> bool {
        matches!(self.get(I_ACCOUNT), Some(a) if is_hardened(a))
    }

    /// Account segment is valid and below [MAX_REASONABLE_ACCOUNT]
    pub fn has_reasonable_account(&self) -> bool {
        matches!(self.account(), Some(a) if a < MAX_REASONABLE_ACCOUNT)
    }

    /// Unhardened account index, if the account segment is valid
    pub fn account(&self) -> Option<u32> {
        match self.get(I_ACCOUNT) {
            Some(a) if is_hardened(a) => Some(a & !HARDENED),
            _ => None,
        }
    }

    pub fn contains_chain_type(&self) -> bool {
        self.len() > I_CHAIN
    }

    /// Chain segment is present, soft, and one of the [ChainType] roles
    pub fn has_valid_chain_type(&self) -> bool {
        self.chain_type().is_some()
    }

    pub fn chain_type(&self) -> Option<ChainType> {
        self.get(I_CHAIN)
            .and_then(|c| ChainType::try_from_primitive(c).ok())
    }

    pub fn contains_address(&self) -> bool {
        self.len() > I_ADDRESS
    }

    /// Address segment is present, soft, and below [MAX_REASONABLE_ADDRESS]
    pub fn has_reasonable_address(&self) -> bool {
        matches!(self.address(), Some(a) if a < MAX_REASONABLE_ADDRESS)
    }

    /// Address index, if present and soft
    pub fn address(&self) -> Option<u32> {
        match self.get(I_ADDRESS) {
            Some(a) if !is_hardened(a) => Some(a),
            _ => None,
        }
    }
}

impl Encode for Bip44Path {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(1 + self.0.len() * 4)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = self.0.len() as u8;
        for (i, s) in self.0.iter().enumerate() {
            BigEndian::write_u32(&mut buff[1 + i * 4..], *s);
        }

        Ok(n)
    }
}

impl DecodeOwned for Bip44Path {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        let count = buff[0] as usize;
        if count > MAX_PATH_LEN {
            return Err(ApduError::InvalidEncoding);
        }

        let n = 1 + count * 4;
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        let mut p = Vec::new();
        for c in buff[1..n].chunks_exact(4) {
            // Capacity checked above
            let _ = p.push(BigEndian::read_u32(c));
        }

        Ok((Self(p), n))
    }
}

/// Display paths in `m/44'/1815'/0'/0/1` form
impl core::fmt::Display for Bip44Path {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "m")?;
        for s in self.0.iter() {
            if is_hardened(*s) {
                write!(f, "/{}'", s & !HARDENED)?;
            } else {
                write!(f, "/{s}")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Bip44Path {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use std::string::ToString;

    use rand::random;

    use super::*;
    use crate::test::encode_decode_apdu;

    const H: u32 = HARDENED;

    #[test]
    fn hardened_flag() {
        for _ in 0..1000 {
            let v: u32 = random();
            assert_eq!(is_hardened(v), v >> 31 == 1, "hardened mismatch for {v:#x}");
            assert!(is_hardened(harden(v & !H)));
            assert!(!is_hardened(v & !H));
        }
    }

    #[test]
    fn decode_path() {
        let buff = [
            0x03, 0x80, 0x00, 0x00, 0x2c, 0x80, 0x00, 0x07, 0x17, 0x80, 0x00, 0x00, 0x01, 0xff,
        ];

        let (p, n) = Bip44Path::parse(&buff).unwrap();

        assert_eq!(n, 13);
        assert_eq!(p.segments(), &[44 | H, 1815 | H, 1 | H]);
        assert_eq!(p.to_string(), "m/44'/1815'/1'");
    }

    #[test]
    fn decode_malformed() {
        let tests: &[(&[u8], ApduError)] = &[
            (&[], ApduError::InvalidLength),
            (&[0x01, 0x80, 0x00], ApduError::InvalidLength),
            (&[0x02, 0x80, 0x00, 0x00, 0x2c], ApduError::InvalidLength),
            (&[0x0b; 64], ApduError::InvalidEncoding),
        ];

        for (buff, e) in tests {
            let r = Bip44Path::parse(buff);
            match (&r, e) {
                (Err(ApduError::InvalidLength), ApduError::InvalidLength) => (),
                (Err(ApduError::InvalidEncoding), ApduError::InvalidEncoding) => (),
                _ => panic!("unexpected result {r:?} for {buff:02x?}"),
            }
        }
    }

    #[test]
    fn encode_decode_max_len() {
        let p = Bip44Path::new(&[H | 44, H | 1815, H, 0, 1, 2, 3, 4, 5, 6]).unwrap();

        let mut buff = [0u8; 64];
        let n = encode_decode_apdu(&mut buff, &p);
        assert_eq!(n, 41);

        assert!(Bip44Path::new(&[0u32; MAX_PATH_LEN + 1]).is_err());
    }

    #[test]
    fn prefix() {
        let tests: &[(&[u32], bool)] = &[
            (&[], false),
            (&[44 | H, 1815 | H], false),
            (&[44 | H, 1815 | H, H], true),
            (&[44 | H, 1815 | H, 0], false),
            (&[44, 1815 | H, H], false),
            (&[44 | H, 1815, H], false),
            (&[1852 | H, 1815 | H, H, 0, 0], false),
            (&[44 | H, 1815 | H, 7 | H, 0, 1], true),
        ];

        for (s, v) in tests {
            let p = Bip44Path::new(s).unwrap();
            assert_eq!(p.has_valid_prefix(), *v, "prefix check for {p}");
        }
    }

    #[test]
    fn truncated_paths() {
        let p = Bip44Path::new(&[44 | H, 1815 | H, H]).unwrap();

        assert!(p.contains_account());
        assert!(p.has_valid_account());
        assert!(p.has_reasonable_account());
        assert!(!p.contains_chain_type());
        assert!(!p.has_valid_chain_type());
        assert!(!p.contains_address());
        assert!(!p.has_reasonable_address());
        assert_eq!(p.chain_type(), None);
        assert_eq!(p.address(), None);

        let p = Bip44Path::default();
        assert!(!p.contains_account());
        assert!(!p.has_valid_account());
        assert_eq!(p.account(), None);
    }

    #[test]
    fn account_and_address_bounds() {
        let p = Bip44Path::new(&[44 | H, 1815 | H, 100 | H, 2, 1_000_000]).unwrap();
        assert!(p.has_valid_account());
        assert!(!p.has_reasonable_account());
        assert_eq!(p.chain_type(), Some(ChainType::Staking));
        assert!(!p.has_reasonable_address());

        let p = Bip44Path::new(&[44 | H, 1815 | H, 99 | H, 3, 999_999]).unwrap();
        assert!(p.has_reasonable_account());
        assert!(!p.has_valid_chain_type());
        assert!(p.has_reasonable_address());

        // Hardened address indices are present but never reasonable
        let p = Bip44Path::new(&[44 | H, 1815 | H, H, 0, 5 | H]).unwrap();
        assert!(p.contains_address());
        assert_eq!(p.address(), None);
        assert!(!p.has_reasonable_address());

        // Soft account segments are never valid
        let p = Bip44Path::new(&[44 | H, 1815 | H, 0, 0, 0]).unwrap();
        assert!(!p.has_valid_account());
        assert!(!p.has_reasonable_account());
    }
}
