// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

//! Extended public key export APDUs

use byteorder::{BigEndian, ByteOrder};
use encdec::{DecodeOwned, Encode};

use crate::{path::Bip44Path, ApduError, ApduStatic, Instruction, ADA_APDU_CLA};

/// Bulk export init APDU, announces the number of keys to be requested
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           NUM_PATHS                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ExtPubKeysInitReq {
    /// Number of keys to be exported
    pub num_paths: u32,
}

impl ExtPubKeysInitReq {
    pub fn new(num_paths: u32) -> Self {
        Self { num_paths }
    }
}

impl ApduStatic for ExtPubKeysInitReq {
    const CLA: u8 = ADA_APDU_CLA;
    const INS: u8 = Instruction::GetExtendedPublicKeysInit as u8;
}

impl Encode for ExtPubKeysInitReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(4)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < 4 {
            return Err(ApduError::InvalidLength);
        }
        BigEndian::write_u32(buff, self.num_paths);
        Ok(4)
    }
}

impl DecodeOwned for ExtPubKeysInitReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.len() < 4 {
            return Err(ApduError::InvalidLength);
        }
        Ok((Self::new(BigEndian::read_u32(buff)), 4))
    }
}

/// Extended public key request APDU
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                        DERIVATION_PATH                        /
/// /                  (count + N * u32 big endian)                 /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct ExtPubKeyReq {
    /// Path for key derivation
    pub path: Bip44Path,
}

impl ExtPubKeyReq {
    /// Create a new [ExtPubKeyReq] APDU
    pub fn new(path: Bip44Path) -> Self {
        Self { path }
    }
}

impl ApduStatic for ExtPubKeyReq {
    const CLA: u8 = ADA_APDU_CLA;
    const INS: u8 = Instruction::GetExtendedPublicKey as u8;
}

impl Encode for ExtPubKeyReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        self.path.encode_len()
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        self.path.encode(buff)
    }
}

impl DecodeOwned for ExtPubKeyReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        let (path, n) = Bip44Path::decode_owned(buff)?;
        Ok((Self::new(path), n))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{path::HARDENED, test::encode_decode_apdu};

    #[test]
    fn ext_pub_key_apdu() {
        let path = Bip44Path::new(&[44 | HARDENED, 1815 | HARDENED, HARDENED]).unwrap();
        let apdu = ExtPubKeyReq::new(path);

        let mut buff = [0u8; 64];
        let n = encode_decode_apdu(&mut buff, &apdu);
        assert_eq!(n, 13);
    }

    #[test]
    fn ext_pub_keys_init_apdu() {
        let apdu = ExtPubKeysInitReq::new(rand::random());

        let mut buff = [0u8; 16];
        encode_decode_apdu(&mut buff, &apdu);

        assert!(ExtPubKeysInitReq::decode_owned(&buff[..3]).is_err());
    }
}
