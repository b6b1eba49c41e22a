// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

use encdec::DecodeOwned;

use ledger_ada_apdu::{prelude::*, tx::MAX_ADDRESS_LEN, ApduError, ApduStatic};

use super::{flow::Flow, flows::*, Driver, Error};
use crate::policy::{self, has_script_payment, AddressCheck, Policy, TxContext};

/// [`Engine`][super::Engine] requests, decoded from request [APDUs][crate::apdu]
#[derive(Clone, PartialEq, Debug)]
pub enum Request {
    /// Announce a bulk public key export
    GetExtendedPublicKeysInit(ExtPubKeysInitReq),

    /// Export an extended public key
    GetExtendedPublicKey(ExtPubKeyReq),

    /// Derive an address
    DeriveAddress(DeriveAddressReq),

    /// Start a transaction
    TxInit(TxInitReq),

    /// Add a transaction input
    TxInput(TxInputReq),

    /// Add an output to a raw address
    TxOutput(TxOutputReq),

    /// Add an output to a device-owned address
    TxChangeOutput(TxChangeOutputReq),

    /// Set the transaction fee
    TxFee(TxFeeReq),

    /// Request a witness
    TxWitness(TxWitnessReq),

    /// Attest a UTxO
    AttestUtxo(AttestUtxoReq),
}

/// Helper for decoding APDUs to requests
fn decode_request<T>(buff: &[u8]) -> Result<Request, ApduError>
where
    T: DecodeOwned<Output = T, Error = ApduError>,
    Request: From<T>,
{
    T::decode_owned(buff).map(|(v, _n)| Request::from(v))
}

impl Request {
    /// Parse an incoming APDU to an engine request
    pub fn parse(ins: u8, buff: &[u8]) -> Result<Self, ApduError> {
        match ins {
            ExtPubKeysInitReq::INS => decode_request::<ExtPubKeysInitReq>(buff),
            ExtPubKeyReq::INS => decode_request::<ExtPubKeyReq>(buff),
            DeriveAddressReq::INS => decode_request::<DeriveAddressReq>(buff),
            TxInitReq::INS => decode_request::<TxInitReq>(buff),
            TxInputReq::INS => decode_request::<TxInputReq>(buff),
            TxOutputReq::INS => decode_request::<TxOutputReq>(buff),
            TxChangeOutputReq::INS => decode_request::<TxChangeOutputReq>(buff),
            TxFeeReq::INS => decode_request::<TxFeeReq>(buff),
            TxWitnessReq::INS => decode_request::<TxWitnessReq>(buff),
            AttestUtxoReq::INS => decode_request::<AttestUtxoReq>(buff),
            _ => Err(ApduError::InvalidEncoding),
        }
    }

    /// Compute the security [Policy] for this request, with `ctx` set
    /// while a transaction is in progress
    pub fn policy(&self, ctx: Option<&TxContext>, check: impl AddressCheck) -> Policy {
        match self {
            Request::GetExtendedPublicKeysInit(r) => policy::for_get_public_keys_init(r.num_paths),
            Request::GetExtendedPublicKey(r) => policy::for_get_extended_public_key(&r.path),
            Request::DeriveAddress(r) => match r.mode {
                AddressMode::Display => {
                    policy::for_show_derive_address(&r.spending, r.staking.as_ref())
                }
                AddressMode::Return => {
                    policy::for_return_derive_address(&r.spending, r.staking.as_ref())
                }
            },
            Request::TxInit(_) => policy::for_sign_tx_init(),
            Request::TxInput(_) => policy::for_sign_tx_input(),
            Request::TxOutput(r) => policy::for_sign_tx_output_address(&r.address, check),
            Request::TxChangeOutput(r) => {
                policy::for_sign_tx_output_path(ctx, &r.path, r.staking.as_ref())
            }
            Request::TxFee(r) => policy::for_sign_tx_fee(r.fee),
            Request::TxWitness(r) => policy::for_sign_tx_witness(ctx, &r.path),
            Request::AttestUtxo(_) => policy::for_attest_utxo(),
        }
    }

    /// Build the confirmation [Flow] for this request, returning `None`
    /// for requests that never involve the user
    pub fn flow(
        &self,
        ctx: Option<&TxContext>,
        check: impl AddressCheck,
        drv: impl Driver,
    ) -> Result<Option<Flow>, Error> {
        let p = self.policy(ctx, check).check()?;

        let f = match self {
            Request::GetExtendedPublicKeysInit(r) => KeysInit::new(p, r.num_paths)?.into(),
            Request::GetExtendedPublicKey(r) => GetKey::new(p, r.path.clone())?.into(),
            Request::DeriveAddress(r) => {
                let mut buff = [0u8; MAX_ADDRESS_LEN];
                let n = drv.derive_address(&r.spending, r.staking.as_ref(), &mut buff)?;
                let address = buff.get(..n).ok_or(Error::InvalidLength)?;

                DeriveAddress::new(p, r.mode, r.spending.clone(), r.staking.clone(), address)?
                    .into()
            }
            Request::TxOutput(r) if r.flags.contains(OutputFlags::COLLATERAL) => {
                CollateralOutput::new(p, r.amount, &r.address)?.into()
            }
            Request::TxOutput(r) => {
                let has_datum = r
                    .flags
                    .intersects(OutputFlags::DATUM_HASH | OutputFlags::INLINE_DATUM);
                let warn_datum = has_script_payment(&r.address) && !has_datum;

                OutputAddressBytes::new(p, r.amount, &r.address, warn_datum)?.into()
            }
            Request::TxChangeOutput(r) => {
                let warn_datum = r
                    .flags
                    .intersects(OutputFlags::DATUM_HASH | OutputFlags::INLINE_DATUM);

                OutputAddressParams::new(
                    p,
                    r.amount,
                    r.path.clone(),
                    r.staking.clone(),
                    None,
                    warn_datum,
                )?
                .into()
            }
            Request::TxFee(r) => Fee::new(p, r.fee)?.into(),
            Request::TxWitness(r) => Witness::new(p, r.path.clone())?.into(),
            Request::TxInit(_) | Request::TxInput(_) | Request::AttestUtxo(_) => return Ok(None),
        };

        Ok(Some(f))
    }
}

impl From<ExtPubKeysInitReq> for Request {
    fn from(a: ExtPubKeysInitReq) -> Self {
        Request::GetExtendedPublicKeysInit(a)
    }
}

impl From<ExtPubKeyReq> for Request {
    fn from(a: ExtPubKeyReq) -> Self {
        Request::GetExtendedPublicKey(a)
    }
}

impl From<DeriveAddressReq> for Request {
    fn from(a: DeriveAddressReq) -> Self {
        Request::DeriveAddress(a)
    }
}

impl From<TxInitReq> for Request {
    fn from(a: TxInitReq) -> Self {
        Request::TxInit(a)
    }
}

impl From<TxInputReq> for Request {
    fn from(a: TxInputReq) -> Self {
        Request::TxInput(a)
    }
}

impl From<TxOutputReq> for Request {
    fn from(a: TxOutputReq) -> Self {
        Request::TxOutput(a)
    }
}

impl From<TxChangeOutputReq> for Request {
    fn from(a: TxChangeOutputReq) -> Self {
        Request::TxChangeOutput(a)
    }
}

impl From<TxFeeReq> for Request {
    fn from(a: TxFeeReq) -> Self {
        Request::TxFee(a)
    }
}

impl From<TxWitnessReq> for Request {
    fn from(a: TxWitnessReq) -> Self {
        Request::TxWitness(a)
    }
}

impl From<AttestUtxoReq> for Request {
    fn from(a: AttestUtxoReq) -> Self {
        Request::AttestUtxo(a)
    }
}

#[cfg(test)]
mod test {
    use encdec::Encode;
    use ledger_ada_apdu::path::HARDENED;

    use super::*;
    use crate::policy::HeaderCheck;

    const H: u32 = HARDENED;

    fn encode_parse<T: Encode<Error = ApduError> + ApduStatic + Into<Request>>(req: T) {
        let mut buff = [0u8; 256];
        let n = req.encode(&mut buff).unwrap();

        let r = Request::parse(T::INS, &buff[..n]).unwrap();
        assert_eq!(r, req.into());
    }

    #[test]
    fn parse_requests() {
        let path = Bip44Path::new(&[44 | H, 1815 | H, H, 0, 1]).unwrap();

        encode_parse(ExtPubKeysInitReq::new(3));
        encode_parse(ExtPubKeyReq::new(path.clone()));
        encode_parse(DeriveAddressReq::new(AddressMode::Display, path.clone(), None));
        encode_parse(TxInitReq::new(0, 1, 2, 1));
        encode_parse(TxOutputReq::new(1_000_000, OutputFlags::empty(), &[0x61; 29]).unwrap());
        encode_parse(TxFeeReq::new(170_000));
        encode_parse(TxWitnessReq::new(path));
    }

    #[test]
    fn parse_unknown() {
        assert!(Request::parse(0xff, &[]).is_err());
        assert!(Request::parse(TxFeeReq::INS, &[0x00; 3]).is_err());
    }

    #[test]
    fn request_policies() {
        let ctx = TxContext::new(0, 1);
        let path = |s: &[u32]| Bip44Path::new(s).unwrap();

        let mut base = [0u8; 57];
        base[0] = 0x01;

        let tests: &[(Request, Policy)] = &[
            (
                ExtPubKeyReq::new(path(&[44 | H, 1815 | H, H])).into(),
                Policy::PromptBeforeResponse,
            ),
            (
                DeriveAddressReq::new(
                    AddressMode::Display,
                    path(&[44 | H, 1815 | H, H, 0, 0]),
                    Some(path(&[44 | H, 1815 | H, H, 2, 0])),
                )
                .into(),
                Policy::ShowBeforeResponse,
            ),
            (
                DeriveAddressReq::new(
                    AddressMode::Return,
                    path(&[44 | H, 1815 | H, H, 0, 0]),
                    Some(path(&[44 | H, 1815 | H])),
                )
                .into(),
                Policy::Deny,
            ),
            (
                TxOutputReq::new(1, OutputFlags::empty(), &base).unwrap().into(),
                Policy::PromptBeforeResponse,
            ),
            (
                TxOutputReq::new(1, OutputFlags::empty(), &base[..20])
                    .unwrap()
                    .into(),
                Policy::Deny,
            ),
            (
                DeriveAddressReq::new(
                    AddressMode::Return,
                    path(&[44 | H, 1815 | H, H, 0, 0]),
                    Some(path(&[44 | H, 1815 | H, 57 | H, 2, 999])),
                )
                .into(),
                Policy::PromptBeforeResponse,
            ),
            (
                DeriveAddressReq::new(
                    AddressMode::Display,
                    path(&[44 | H, 1815 | H, H, 0, 0]),
                    Some(path(&[44 | H, 1815 | H, 57 | H, 2, 999])),
                )
                .into(),
                Policy::PromptWarnUnusual,
            ),
            (
                TxChangeOutputReq::new(
                    1,
                    OutputFlags::empty(),
                    path(&[44 | H, 1815 | H, H, 1, 0]),
                    Some(path(&[44 | H, 1815 | H, H, 2, 0])),
                )
                .into(),
                Policy::Allow,
            ),
            (
                TxChangeOutputReq::new(
                    1,
                    OutputFlags::empty(),
                    path(&[44 | H, 1815 | H, H, 1, 0]),
                    Some(path(&[44 | H, 1815 | H, 57 | H, 2, 0])),
                )
                .into(),
                Policy::PromptWarnUnusual,
            ),
            (TxFeeReq::new(170_000).into(), Policy::PromptBeforeResponse),
            (
                TxWitnessReq::new(path(&[44 | H, 1815 | H, 1 | H, 0, 0])).into(),
                Policy::PromptWarnUnusual,
            ),
        ];

        for (r, p) in tests {
            assert_eq!(r.policy(Some(&ctx), HeaderCheck), *p, "request: {r:?}");
        }
    }

    #[test]
    fn request_policies_outside_tx() {
        let own = Bip44Path::new(&[44 | H, 1815 | H, H, 0, 0]).unwrap();

        let r: Request = TxWitnessReq::new(own).into();
        assert_eq!(r.policy(None, HeaderCheck), Policy::PromptWarnUnusual);
    }
}
