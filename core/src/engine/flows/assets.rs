// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

use core::str::from_utf8;

use emstr::{helpers::Hex, EncodeStr};
use heapless::Vec;
use strum::EnumIter;

use super::{entry, fmt_preview, MAX_PREVIEW_LEN};
use crate::{
    engine::{
        display::Display,
        flow::{FlowKind, Next, Steps},
        pager::MAX_VALUE_LEN,
        render::Render,
        Error,
    },
    helpers::{fmt_amount, fmt_hex},
    policy::Policy,
};

/// Minting policy id length
pub const POLICY_ID_LEN: usize = 28;

/// Maximum asset name length
pub const MAX_ASSET_NAME_LEN: usize = 32;

/// Datum hash length
pub const DATUM_HASH_LEN: usize = 32;

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum TokenStep {
    DisplayName,
    DisplayAmount,
    Respond,
}

/// Native token carried in an output
#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    step: TokenStep,
    policy_id: [u8; POLICY_ID_LEN],
    name: Vec<u8, MAX_ASSET_NAME_LEN>,
    amount: u64,
}

impl Token {
    pub fn new(
        policy: Policy,
        policy_id: [u8; POLICY_ID_LEN],
        name: &[u8],
        amount: u64,
    ) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptBeforeResponse | Policy::PromptWarnUnusual => {
                Some(TokenStep::DisplayName)
            }
            Policy::Allow => Some(TokenStep::Respond),
            _ => None,
        })?;

        let name = Vec::from_slice(name).map_err(|_| Error::InvalidLength)?;

        Ok(Self {
            step,
            policy_id,
            name,
            amount,
        })
    }
}

impl Steps for Token {
    type Step = TokenStep;

    const KIND: FlowKind = FlowKind::Token;

    fn step(&self) -> TokenStep {
        self.step
    }

    fn set_step(&mut self, step: TokenStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: TokenStep,
        display: &mut Display<R>,
    ) -> Result<Next<TokenStep>, Error> {
        match step {
            TokenStep::DisplayName => {
                // Full policy id and name fit a single value
                let mut buff = [0u8; MAX_VALUE_LEN];
                let n = emstr::write!(&mut buff[..], Hex(&self.policy_id), '.', Hex(&self.name))
                    .map_err(|_| Error::EncodingFailed)?;
                let v = from_utf8(&buff[..n]).map_err(|_| Error::EncodingFailed)?;

                Ok(display.fact("Asset", v)?.then(TokenStep::DisplayAmount))
            }
            TokenStep::DisplayAmount => {
                let mut buff = [0u8; 24];
                let v = fmt_amount(self.amount, &mut buff);
                Ok(display.fact("Quantity", v)?.then(TokenStep::Respond))
            }
            TokenStep::Respond => Ok(Next::Approve),
        }
    }
}

/// Datum attached to an output
#[derive(Clone, PartialEq, Debug)]
pub enum DatumKind {
    /// Hash of a datum provided elsewhere
    Hash([u8; DATUM_HASH_LEN]),
    /// Inline datum, with total size and leading bytes
    Inline {
        size: u32,
        preview: Vec<u8, MAX_PREVIEW_LEN>,
    },
}

impl DatumKind {
    /// Create an inline datum description from its size and leading bytes
    pub fn inline(size: u32, data: &[u8]) -> Self {
        let n = data.len().min(MAX_PREVIEW_LEN);
        let mut preview = Vec::new();
        // Truncated to capacity above
        let _ = preview.extend_from_slice(&data[..n]);
        Self::Inline { size, preview }
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum DatumStep {
    Display,
    Respond,
}

/// Output datum (hash or inline)
#[derive(Clone, PartialEq, Debug)]
pub struct Datum {
    step: DatumStep,
    datum: DatumKind,
}

impl Datum {
    pub fn new(policy: Policy, datum: DatumKind) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptBeforeResponse | Policy::PromptWarnUnusual => Some(DatumStep::Display),
            Policy::Allow => Some(DatumStep::Respond),
            _ => None,
        })?;

        Ok(Self { step, datum })
    }
}

impl Steps for Datum {
    type Step = DatumStep;

    const KIND: FlowKind = FlowKind::Datum;

    fn step(&self) -> DatumStep {
        self.step
    }

    fn set_step(&mut self, step: DatumStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: DatumStep,
        display: &mut Display<R>,
    ) -> Result<Next<DatumStep>, Error> {
        match step {
            DatumStep::Display => {
                let mut buff = [0u8; MAX_VALUE_LEN];
                let shown = match &self.datum {
                    DatumKind::Hash(h) => display.fact("Datum hash", fmt_hex(h, &mut buff)?)?,
                    DatumKind::Inline { size, preview } => {
                        display.fact("Inline datum", fmt_preview(*size, preview, &mut buff))?
                    }
                };
                Ok(shown.then(DatumStep::Respond))
            }
            DatumStep::Respond => Ok(Next::Approve),
        }
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum RefScriptStep {
    Display,
    Respond,
}

/// Output reference script
#[derive(Clone, PartialEq, Debug)]
pub struct RefScript {
    step: RefScriptStep,
    size: u32,
    preview: Vec<u8, MAX_PREVIEW_LEN>,
}

impl RefScript {
    /// Create a reference script flow from the script size and leading bytes
    pub fn new(policy: Policy, size: u32, data: &[u8]) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptBeforeResponse | Policy::PromptWarnUnusual => {
                Some(RefScriptStep::Display)
            }
            Policy::Allow => Some(RefScriptStep::Respond),
            _ => None,
        })?;

        let n = data.len().min(MAX_PREVIEW_LEN);
        let preview = Vec::from_slice(&data[..n]).map_err(|_| Error::InvalidLength)?;

        Ok(Self {
            step,
            size,
            preview,
        })
    }
}

impl Steps for RefScript {
    type Step = RefScriptStep;

    const KIND: FlowKind = FlowKind::RefScript;

    fn step(&self) -> RefScriptStep {
        self.step
    }

    fn set_step(&mut self, step: RefScriptStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: RefScriptStep,
        display: &mut Display<R>,
    ) -> Result<Next<RefScriptStep>, Error> {
        match step {
            RefScriptStep::Display => {
                let mut buff = [0u8; MAX_VALUE_LEN];
                let v = fmt_preview(self.size, &self.preview, &mut buff);
                Ok(display.fact("Reference script", v)?.then(RefScriptStep::Respond))
            }
            RefScriptStep::Respond => Ok(Next::Approve),
        }
    }
}
