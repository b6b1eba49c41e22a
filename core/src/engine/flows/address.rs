// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

use heapless::Vec;
use strum::EnumIter;

use ledger_ada_apdu::{address::AddressMode, path::Bip44Path, tx::MAX_ADDRESS_LEN};

use super::{address_chunk, entry};
use crate::{
    engine::{
        display::Display,
        flow::{FlowKind, Next, Steps},
        render::{Render, Statuses},
        Error,
    },
    helpers::fmt_path,
    policy::Policy,
};

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum DeriveAddressStep {
    Warning,
    DisplayPath,
    DisplayStaking,
    /// Address chunk index
    DisplayAddress(u8),
    Confirm,
    Respond,
}

/// Address derivation, shown for verification or returned to the host
#[derive(Clone, PartialEq, Debug)]
pub struct DeriveAddress {
    step: DeriveAddressStep,
    mode: AddressMode,
    spending: Bip44Path,
    staking: Option<Bip44Path>,
    address: Vec<u8, MAX_ADDRESS_LEN>,
}

impl DeriveAddress {
    /// Create an address flow, `address` is the raw address derived
    /// from the provided paths
    pub fn new(
        policy: Policy,
        mode: AddressMode,
        spending: Bip44Path,
        staking: Option<Bip44Path>,
        address: &[u8],
    ) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptWarnUnusual => Some(DeriveAddressStep::Warning),
            Policy::PromptBeforeResponse | Policy::ShowBeforeResponse => {
                Some(DeriveAddressStep::DisplayPath)
            }
            Policy::Allow => Some(DeriveAddressStep::Respond),
            Policy::Deny => None,
        })?;

        let address = Vec::from_slice(address).map_err(|_| Error::InvalidLength)?;

        Ok(Self {
            step,
            mode,
            spending,
            staking,
            address,
        })
    }
}

impl Steps for DeriveAddress {
    type Step = DeriveAddressStep;

    const KIND: FlowKind = FlowKind::DeriveAddress;

    fn step(&self) -> DeriveAddressStep {
        self.step
    }

    fn set_step(&mut self, step: DeriveAddressStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: DeriveAddressStep,
        display: &mut Display<R>,
    ) -> Result<Next<DeriveAddressStep>, Error> {
        let next = match step {
            DeriveAddressStep::Warning => display
                .warning("Unusual address path, proceed with care")?
                .then(DeriveAddressStep::DisplayPath),
            DeriveAddressStep::DisplayPath => display
                .fact("Address path", &fmt_path(&self.spending))?
                .then(DeriveAddressStep::DisplayStaking),
            DeriveAddressStep::DisplayStaking => match &self.staking {
                Some(s) => display
                    .fact("Staking path", &fmt_path(s))?
                    .then(DeriveAddressStep::DisplayAddress(0)),
                None => Next::Goto(DeriveAddressStep::DisplayAddress(0)),
            },
            DeriveAddressStep::DisplayAddress(chunk) => address_chunk(
                display,
                "Address",
                &self.address,
                chunk,
                DeriveAddressStep::DisplayAddress,
                DeriveAddressStep::Confirm,
            )?,
            DeriveAddressStep::Confirm => {
                let shown = match self.mode {
                    AddressMode::Display => {
                        display.confirm("Verify address", "", Statuses::ADDRESS)?
                    }
                    AddressMode::Return => {
                        display.confirm("Export address", "", Statuses::ACTION)?
                    }
                };
                shown.then(DeriveAddressStep::Respond)
            }
            DeriveAddressStep::Respond => Next::Approve,
        };

        Ok(next)
    }
}
