//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    address::{AddressMode, DeriveAddressReq},
    path::{Bip44Path, ChainType},
    pubkey::{ExtPubKeyReq, ExtPubKeysInitReq},
    tx::{
        AttestUtxoReq, OutputFlags, TxChangeOutputReq, TxFeeReq, TxInitReq, TxInputReq,
        TxOutputReq, TxWitnessReq, UtxoRef,
    },
    Instruction,
};
