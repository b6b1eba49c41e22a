// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

use ledger_ada_apdu::ApduError;

/// [Engine][super::Engine] and policy errors
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[repr(u8)]
pub enum Error {
    /// Request could not be decoded
    #[cfg_attr(feature = "thiserror", error("malformed input"))]
    MalformedInput = 0x00,

    /// Request rejected by the security policy
    #[cfg_attr(feature = "thiserror", error("rejected by security policy"))]
    PolicyDenied = 0x01,

    /// Request rejected by the user
    #[cfg_attr(feature = "thiserror", error("rejected by user"))]
    UserRejected = 0x02,

    /// Flow started or resumed in an unexpected state
    #[cfg_attr(feature = "thiserror", error("unexpected flow state"))]
    UnexpectedFlowState = 0x03,

    /// Invalid argument length
    #[cfg_attr(feature = "thiserror", error("invalid argument length"))]
    InvalidLength = 0x04,

    /// Message encoding failed
    #[cfg_attr(feature = "thiserror", error("message encoding failed"))]
    EncodingFailed = 0x05,
}

impl From<ApduError> for Error {
    fn from(_: ApduError) -> Self {
        Error::MalformedInput
    }
}
