// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

//! Transaction signing APDUs, carrying the fields checked by the signing policy.
//!
//! See [ledger_ada_core::engine] for interaction and state machines

use byteorder::{BigEndian, ByteOrder};
use encdec::{DecodeOwned, Encode};
use heapless::Vec;

use crate::{path::Bip44Path, ApduError, ApduStatic, Instruction, ADA_APDU_CLA};

/// Maximum raw address length accepted in an output
pub const MAX_ADDRESS_LEN: usize = 128;

/// Transaction hash length
pub const TX_HASH_LEN: usize = 32;

/// Transaction init APDU, sets the signing account and element counts
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        ACCOUNT_INDEX                          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          NUM_INPUTS           |          NUM_OUTPUTS          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         NUM_WITNESSES         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TxInitReq {
    /// Signing account (unhardened index)
    pub account: u32,
    /// Number of inputs to be added
    pub num_inputs: u16,
    /// Number of outputs to be added
    pub num_outputs: u16,
    /// Number of witnesses to be requested
    pub num_witnesses: u16,
}

impl TxInitReq {
    /// Create a new [TxInitReq] APDU
    pub fn new(account: u32, num_inputs: u16, num_outputs: u16, num_witnesses: u16) -> Self {
        Self {
            account,
            num_inputs,
            num_outputs,
            num_witnesses,
        }
    }
}

impl ApduStatic for TxInitReq {
    const CLA: u8 = ADA_APDU_CLA;
    const INS: u8 = Instruction::TxInit as u8;
}

impl Encode for TxInitReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(10)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < 10 {
            return Err(ApduError::InvalidLength);
        }

        BigEndian::write_u32(&mut buff[0..], self.account);
        BigEndian::write_u16(&mut buff[4..], self.num_inputs);
        BigEndian::write_u16(&mut buff[6..], self.num_outputs);
        BigEndian::write_u16(&mut buff[8..], self.num_witnesses);

        Ok(10)
    }
}

impl DecodeOwned for TxInitReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.len() < 10 {
            return Err(ApduError::InvalidLength);
        }

        let v = Self::new(
            BigEndian::read_u32(&buff[0..]),
            BigEndian::read_u16(&buff[4..]),
            BigEndian::read_u16(&buff[6..]),
            BigEndian::read_u16(&buff[8..]),
        );

        Ok((v, 10))
    }
}

/// Reference to a transaction output, shared by input and attestation APDUs
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                        TX_HASH (32 bytes)                     /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         OUTPUT_INDEX                          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct UtxoRef {
    /// Hash of the transaction containing the output
    pub tx_hash: [u8; TX_HASH_LEN],
    /// Index of the output in that transaction
    pub index: u32,
}

impl UtxoRef {
    const LEN: usize = TX_HASH_LEN + 4;

    pub fn new(tx_hash: [u8; TX_HASH_LEN], index: u32) -> Self {
        Self { tx_hash, index }
    }
}

impl Encode for UtxoRef {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(Self::LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < Self::LEN {
            return Err(ApduError::InvalidLength);
        }

        buff[..TX_HASH_LEN].copy_from_slice(&self.tx_hash);
        BigEndian::write_u32(&mut buff[TX_HASH_LEN..], self.index);

        Ok(Self::LEN)
    }
}

impl DecodeOwned for UtxoRef {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.len() < Self::LEN {
            return Err(ApduError::InvalidLength);
        }

        let mut tx_hash = [0u8; TX_HASH_LEN];
        tx_hash.copy_from_slice(&buff[..TX_HASH_LEN]);
        let index = BigEndian::read_u32(&buff[TX_HASH_LEN..]);

        Ok((Self::new(tx_hash, index), Self::LEN))
    }
}

/// Add transaction input APDU
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TxInputReq {
    pub utxo: UtxoRef,
}

impl ApduStatic for TxInputReq {
    const CLA: u8 = ADA_APDU_CLA;
    const INS: u8 = Instruction::TxInput as u8;
}

impl Encode for TxInputReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        self.utxo.encode_len()
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        self.utxo.encode(buff)
    }
}

impl DecodeOwned for TxInputReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        let (utxo, n) = UtxoRef::decode_owned(buff)?;
        Ok((Self { utxo }, n))
    }
}

/// Attest UTxO APDU
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AttestUtxoReq {
    pub utxo: UtxoRef,
}

impl ApduStatic for AttestUtxoReq {
    const CLA: u8 = ADA_APDU_CLA;
    const INS: u8 = Instruction::AttestUtxo as u8;
}

impl Encode for AttestUtxoReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        self.utxo.encode_len()
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        self.utxo.encode(buff)
    }
}

impl DecodeOwned for AttestUtxoReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        let (utxo, n) = UtxoRef::decode_owned(buff)?;
        Ok((Self { utxo }, n))
    }
}

bitflags::bitflags! {
    /// Transaction output flags
    pub struct OutputFlags: u8 {
        /// Output carries a datum hash
        const DATUM_HASH = 1 << 0;
        /// Output carries an inline datum
        const INLINE_DATUM = 1 << 1;
        /// Output carries a reference script
        const REF_SCRIPT = 1 << 2;
        /// Output is a collateral return
        const COLLATERAL = 1 << 3;
    }
}

crate::encdec_bitflags!(OutputFlags);

/// Add transaction output APDU, for outputs to a raw (third-party) address
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                       AMOUNT (lovelace)                       +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     FLAGS     |  ADDRESS_LEN  |                               /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               /
/// /                          ADDRESS...                           /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct TxOutputReq {
    /// Output amount in lovelace
    pub amount: u64,
    /// Output flags
    pub flags: OutputFlags,
    /// Raw binary address
    pub address: Vec<u8, MAX_ADDRESS_LEN>,
}

impl TxOutputReq {
    /// Create a new [TxOutputReq] APDU
    pub fn new(amount: u64, flags: OutputFlags, address: &[u8]) -> Result<Self, ApduError> {
        let address = Vec::from_slice(address).map_err(|_| ApduError::InvalidLength)?;
        Ok(Self {
            amount,
            flags,
            address,
        })
    }
}

impl ApduStatic for TxOutputReq {
    const CLA: u8 = ADA_APDU_CLA;
    const INS: u8 = Instruction::TxOutput as u8;
}

impl Encode for TxOutputReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(8 + 1 + 1 + self.address.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        BigEndian::write_u64(&mut buff[0..], self.amount);
        self.flags.encode(&mut buff[8..])?;
        buff[9] = self.address.len() as u8;
        buff[10..n].copy_from_slice(&self.address);

        Ok(n)
    }
}

impl DecodeOwned for TxOutputReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.len() < 10 {
            return Err(ApduError::InvalidLength);
        }

        let amount = BigEndian::read_u64(&buff[0..]);
        let (flags, _) = OutputFlags::decode_owned(&buff[8..])?;

        let address_len = buff[9] as usize;
        if address_len > MAX_ADDRESS_LEN {
            return Err(ApduError::InvalidEncoding);
        }
        if buff.len() < 10 + address_len {
            return Err(ApduError::InvalidLength);
        }

        let v = Self::new(amount, flags, &buff[10..][..address_len])?;

        Ok((v, 10 + address_len))
    }
}

/// Add change output APDU, for outputs to an address derived on this device
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                       AMOUNT (lovelace)                       +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     FLAGS     |  HAS_STAKING  |                               /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               /
/// /                         SPENDING_PATH                         /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                  STAKING_PATH (if HAS_STAKING)                /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct TxChangeOutputReq {
    /// Output amount in lovelace
    pub amount: u64,
    /// Output flags
    pub flags: OutputFlags,
    /// Payment key path for the change address
    pub path: Bip44Path,
    /// Optional staking key path for the change address
    pub staking: Option<Bip44Path>,
}

impl TxChangeOutputReq {
    /// Create a new [TxChangeOutputReq] APDU
    pub fn new(
        amount: u64,
        flags: OutputFlags,
        path: Bip44Path,
        staking: Option<Bip44Path>,
    ) -> Self {
        Self {
            amount,
            flags,
            path,
            staking,
        }
    }
}

impl ApduStatic for TxChangeOutputReq {
    const CLA: u8 = ADA_APDU_CLA;
    const INS: u8 = Instruction::TxChangeOutput as u8;
}

impl Encode for TxChangeOutputReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        let mut n = 10 + self.path.encode_len()?;
        if let Some(s) = &self.staking {
            n += s.encode_len()?;
        }
        Ok(n)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < 10 {
            return Err(ApduError::InvalidLength);
        }

        BigEndian::write_u64(&mut buff[0..], self.amount);
        self.flags.encode(&mut buff[8..])?;
        buff[9] = self.staking.is_some() as u8;

        let mut n = 10;
        n += self.path.encode(&mut buff[n..])?;
        if let Some(s) = &self.staking {
            n += s.encode(&mut buff[n..])?;
        }

        Ok(n)
    }
}

impl DecodeOwned for TxChangeOutputReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.len() < 10 {
            return Err(ApduError::InvalidLength);
        }

        let amount = BigEndian::read_u64(&buff[0..]);
        let (flags, _) = OutputFlags::decode_owned(&buff[8..])?;

        let mut n = 10;
        let (path, l) = Bip44Path::decode_owned(&buff[n..])?;
        n += l;

        let staking = match buff[9] {
            0 => None,
            1 => {
                let (s, l) = Bip44Path::decode_owned(&buff[n..])?;
                n += l;
                Some(s)
            }
            _ => return Err(ApduError::InvalidEncoding),
        };

        Ok((Self::new(amount, flags, path, staking), n))
    }
}

/// Set transaction fee APDU
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                        FEE (lovelace)                         +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TxFeeReq {
    /// Fee in lovelace
    pub fee: u64,
}

impl TxFeeReq {
    pub fn new(fee: u64) -> Self {
        Self { fee }
    }
}

impl ApduStatic for TxFeeReq {
    const CLA: u8 = ADA_APDU_CLA;
    const INS: u8 = Instruction::TxFee as u8;
}

impl Encode for TxFeeReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(8)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < 8 {
            return Err(ApduError::InvalidLength);
        }
        BigEndian::write_u64(buff, self.fee);
        Ok(8)
    }
}

impl DecodeOwned for TxFeeReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.len() < 8 {
            return Err(ApduError::InvalidLength);
        }
        Ok((Self::new(BigEndian::read_u64(buff)), 8))
    }
}

/// Witness request APDU, asks for a signature with the key at `path`
#[derive(Clone, PartialEq, Debug)]
pub struct TxWitnessReq {
    /// Path of the witnessing key
    pub path: Bip44Path,
}

impl TxWitnessReq {
    pub fn new(path: Bip44Path) -> Self {
        Self { path }
    }
}

impl ApduStatic for TxWitnessReq {
    const CLA: u8 = ADA_APDU_CLA;
    const INS: u8 = Instruction::TxWitness as u8;
}

impl Encode for TxWitnessReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        self.path.encode_len()
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        self.path.encode(buff)
    }
}

impl DecodeOwned for TxWitnessReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        let (path, n) = Bip44Path::decode_owned(buff)?;
        Ok((Self::new(path), n))
    }
}

#[cfg(test)]
mod test {
    use rand::random;

    use super::*;
    use crate::{path::HARDENED, test::encode_decode_apdu};

    const H: u32 = HARDENED;

    #[test]
    fn encode_decode_tx_init() {
        let apdu = TxInitReq::new(random(), random(), random(), random());

        let mut buff = [0u8; 32];
        assert_eq!(encode_decode_apdu(&mut buff, &apdu), 10);
    }

    #[test]
    fn encode_decode_utxo() {
        let utxo = UtxoRef::new(random(), random());

        let mut buff = [0u8; 64];
        encode_decode_apdu(&mut buff, &TxInputReq { utxo });
        encode_decode_apdu(&mut buff, &AttestUtxoReq { utxo });
    }

    #[test]
    fn encode_decode_tx_output() {
        let mut address = [0u8; 57];
        address[0] = 0x01;
        address[1..].iter_mut().for_each(|b| *b = random());

        let tests = &[
            OutputFlags::empty(),
            OutputFlags::DATUM_HASH,
            OutputFlags::INLINE_DATUM | OutputFlags::REF_SCRIPT,
            OutputFlags::COLLATERAL,
        ];

        let mut buff = [0u8; 128];
        for flags in tests {
            let apdu = TxOutputReq::new(random(), *flags, &address).unwrap();
            assert_eq!(encode_decode_apdu(&mut buff, &apdu), 67);
        }
    }

    #[test]
    fn tx_output_bad_length() {
        // Declared address length exceeds available data
        let mut buff = [0u8; 16];
        buff[9] = 12;
        assert!(TxOutputReq::decode_owned(&buff).is_err());

        // Address longer than supported
        assert!(TxOutputReq::new(0, OutputFlags::empty(), &[0u8; 129]).is_err());
    }

    #[test]
    fn encode_decode_change_output() {
        let path = Bip44Path::new(&[44 | H, 1815 | H, H, 1, 7]).unwrap();
        let staking = Bip44Path::new(&[44 | H, 1815 | H, H, 2, 0]).unwrap();

        let mut buff = [0u8; 128];

        let apdu = TxChangeOutputReq::new(1_000_000, OutputFlags::empty(), path.clone(), None);
        assert_eq!(encode_decode_apdu(&mut buff, &apdu), 31);

        let apdu = TxChangeOutputReq::new(42, OutputFlags::DATUM_HASH, path, Some(staking));
        assert_eq!(encode_decode_apdu(&mut buff, &apdu), 52);
    }

    #[test]
    fn encode_decode_fee_witness() {
        let mut buff = [0u8; 64];

        encode_decode_apdu(&mut buff, &TxFeeReq::new(170_000));

        let path = Bip44Path::new(&[44 | H, 1815 | H, H, 0, 0]).unwrap();
        assert_eq!(encode_decode_apdu(&mut buff, &TxWitnessReq::new(path)), 21);
    }
}
