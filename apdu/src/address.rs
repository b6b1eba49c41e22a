// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

//! Address derivation APDUs

use encdec::{DecodeOwned, Encode};
use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter};

use crate::{path::Bip44Path, ApduError, ApduStatic, Instruction, ADA_APDU_CLA};

/// Address derivation mode
#[derive(Copy, Clone, PartialEq, Debug, Display, EnumIter, TryFromPrimitive)]
#[repr(u8)]
pub enum AddressMode {
    /// Return the derived address to the host
    Return = 0x01,
    /// Display the derived address on the device
    Display = 0x02,
}

/// Address derivation request APDU
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     MODE      |  HAS_STAKING  |                               /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               /
/// /                         SPENDING_PATH                         /
/// /                  (count + N * u32 big endian)                 /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                  STAKING_PATH (if HAS_STAKING)                /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct DeriveAddressReq {
    /// Return or display the address
    pub mode: AddressMode,
    /// Payment / spending key path
    pub spending: Bip44Path,
    /// Optional staking key path
    pub staking: Option<Bip44Path>,
}

impl DeriveAddressReq {
    /// Create a new [DeriveAddressReq] APDU
    pub fn new(mode: AddressMode, spending: Bip44Path, staking: Option<Bip44Path>) -> Self {
        Self {
            mode,
            spending,
            staking,
        }
    }
}

impl ApduStatic for DeriveAddressReq {
    const CLA: u8 = ADA_APDU_CLA;
    const INS: u8 = Instruction::DeriveAddress as u8;
}

impl Encode for DeriveAddressReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        let mut n = 2 + self.spending.encode_len()?;
        if let Some(s) = &self.staking {
            n += s.encode_len()?;
        }
        Ok(n)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < 2 {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = self.mode as u8;
        buff[1] = self.staking.is_some() as u8;

        let mut n = 2;
        n += self.spending.encode(&mut buff[n..])?;
        if let Some(s) = &self.staking {
            n += s.encode(&mut buff[n..])?;
        }

        Ok(n)
    }
}

impl DecodeOwned for DeriveAddressReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.len() < 2 {
            return Err(ApduError::InvalidLength);
        }

        let mode = AddressMode::try_from(buff[0]).map_err(|_| ApduError::InvalidEncoding)?;

        let mut n = 2;
        let (spending, l) = Bip44Path::decode_owned(&buff[n..])?;
        n += l;

        let staking = match buff[1] {
            0 => None,
            1 => {
                let (s, l) = Bip44Path::decode_owned(&buff[n..])?;
                n += l;
                Some(s)
            }
            _ => return Err(ApduError::InvalidEncoding),
        };

        Ok((Self::new(mode, spending, staking), n))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{path::HARDENED, test::encode_decode_apdu};

    const H: u32 = HARDENED;

    #[test]
    fn derive_address_apdu() {
        let spending = Bip44Path::new(&[44 | H, 1815 | H, H, 0, 3]).unwrap();
        let staking = Bip44Path::new(&[44 | H, 1815 | H, H, 2, 0]).unwrap();

        let mut buff = [0u8; 128];

        let apdu = DeriveAddressReq::new(AddressMode::Display, spending.clone(), None);
        assert_eq!(encode_decode_apdu(&mut buff, &apdu), 23);

        let apdu = DeriveAddressReq::new(AddressMode::Return, spending, Some(staking));
        assert_eq!(encode_decode_apdu(&mut buff, &apdu), 44);
    }

    #[test]
    fn derive_address_malformed() {
        let tests: &[&[u8]] = &[
            // Too short for header
            &[0x01],
            // Unknown mode
            &[0x07, 0x00, 0x00],
            // Invalid staking flag
            &[0x01, 0x05, 0x00],
            // Missing staking path
            &[0x01, 0x01, 0x00],
            // Truncated spending path
            &[0x02, 0x00, 0x02, 0x80, 0x00, 0x00, 0x2c],
        ];

        for t in tests {
            assert!(
                DeriveAddressReq::decode_owned(t).is_err(),
                "decode should fail for {t:02x?}"
            );
        }
    }
}
