// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

use heapless::Vec;
use strum::EnumIter;

use ledger_ada_apdu::{path::Bip44Path, tx::MAX_ADDRESS_LEN};

use super::{address_chunk, entry};
use crate::{
    engine::{
        display::Display,
        flow::{FlowKind, Next, Steps},
        render::Render,
        Error,
    },
    helpers::{fmt_ada, fmt_path},
    policy::Policy,
};

/// Amount fact shared by output flows
fn amount<R: Render, S>(display: &mut Display<R>, lovelace: u64, next: S) -> Result<Next<S>, Error> {
    let mut buff = [0u8; 32];
    let v = fmt_ada(lovelace, &mut buff);
    Ok(display.fact("Amount", v)?.then(next))
}

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum OutputAddressBytesStep {
    WarningDatum,
    /// Address chunk index
    DisplayAddress(u8),
    DisplayAmount,
    Respond,
}

/// Output paying a third-party address given as raw bytes
#[derive(Clone, PartialEq, Debug)]
pub struct OutputAddressBytes {
    step: OutputAddressBytesStep,
    amount: u64,
    address: Vec<u8, MAX_ADDRESS_LEN>,
}

impl OutputAddressBytes {
    /// Create an output flow, `warn_datum` is set for outputs locked by a
    /// script without a datum
    pub fn new(policy: Policy, amount: u64, address: &[u8], warn_datum: bool) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptBeforeResponse | Policy::PromptWarnUnusual if warn_datum => {
                Some(OutputAddressBytesStep::WarningDatum)
            }
            Policy::PromptBeforeResponse | Policy::PromptWarnUnusual => {
                Some(OutputAddressBytesStep::DisplayAddress(0))
            }
            Policy::Allow => Some(OutputAddressBytesStep::Respond),
            _ => None,
        })?;

        let address = Vec::from_slice(address).map_err(|_| Error::InvalidLength)?;

        Ok(Self {
            step,
            amount,
            address,
        })
    }
}

impl Steps for OutputAddressBytes {
    type Step = OutputAddressBytesStep;

    const KIND: FlowKind = FlowKind::OutputAddressBytes;

    fn step(&self) -> OutputAddressBytesStep {
        self.step
    }

    fn set_step(&mut self, step: OutputAddressBytesStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: OutputAddressBytesStep,
        display: &mut Display<R>,
    ) -> Result<Next<OutputAddressBytesStep>, Error> {
        match step {
            OutputAddressBytesStep::WarningDatum => Ok(display
                .warning("Script address without datum")?
                .then(OutputAddressBytesStep::DisplayAddress(0))),
            OutputAddressBytesStep::DisplayAddress(chunk) => address_chunk(
                display,
                "Send to address",
                &self.address,
                chunk,
                OutputAddressBytesStep::DisplayAddress,
                OutputAddressBytesStep::DisplayAmount,
            ),
            OutputAddressBytesStep::DisplayAmount => {
                amount(display, self.amount, OutputAddressBytesStep::Respond)
            }
            OutputAddressBytesStep::Respond => Ok(Next::Approve),
        }
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum OutputAddressParamsStep {
    DisplayBegin,
    WarningDatum,
    DisplayPaymentPath,
    DisplayStakingInfo,
    /// Address chunk index
    DisplayAddress(u8),
    DisplayAmount,
    Respond,
}

/// Output paying an address derived on the device (change)
#[derive(Clone, PartialEq, Debug)]
pub struct OutputAddressParams {
    step: OutputAddressParamsStep,
    unusual: bool,
    warn_datum: bool,
    amount: u64,
    path: Bip44Path,
    staking: Option<Bip44Path>,
    address: Option<Vec<u8, MAX_ADDRESS_LEN>>,
}

impl OutputAddressParams {
    /// Create a change output flow, `address` is the derived address
    /// where available, `warn_datum` is set for change outputs carrying data
    pub fn new(
        policy: Policy,
        amount: u64,
        path: Bip44Path,
        staking: Option<Bip44Path>,
        address: Option<&[u8]>,
        warn_datum: bool,
    ) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptBeforeResponse | Policy::PromptWarnUnusual => {
                Some(OutputAddressParamsStep::DisplayBegin)
            }
            Policy::Allow => Some(OutputAddressParamsStep::Respond),
            _ => None,
        })?;

        let address = match address {
            Some(a) => Some(Vec::from_slice(a).map_err(|_| Error::InvalidLength)?),
            None => None,
        };

        Ok(Self {
            step,
            unusual: policy == Policy::PromptWarnUnusual,
            warn_datum,
            amount,
            path,
            staking,
            address,
        })
    }
}

impl Steps for OutputAddressParams {
    type Step = OutputAddressParamsStep;

    const KIND: FlowKind = FlowKind::OutputAddressParams;

    fn step(&self) -> OutputAddressParamsStep {
        self.step
    }

    fn set_step(&mut self, step: OutputAddressParamsStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: OutputAddressParamsStep,
        display: &mut Display<R>,
    ) -> Result<Next<OutputAddressParamsStep>, Error> {
        use OutputAddressParamsStep as S;

        let next = match step {
            S::DisplayBegin if self.unusual => display
                .warning("Change output with unusual path")?
                .then(S::WarningDatum),
            S::DisplayBegin => display
                .prompt("Review change output", "")?
                .then(S::WarningDatum),
            S::WarningDatum if self.warn_datum => display
                .warning("Change output carries a datum")?
                .then(S::DisplayPaymentPath),
            S::WarningDatum => Next::Goto(S::DisplayPaymentPath),
            S::DisplayPaymentPath => display
                .fact("Payment path", &fmt_path(&self.path))?
                .then(S::DisplayStakingInfo),
            S::DisplayStakingInfo => {
                let shown = match &self.staking {
                    Some(s) => display.fact("Staking path", &fmt_path(s))?,
                    None => display.fact("Staking", "none")?,
                };
                shown.then(S::DisplayAddress(0))
            }
            S::DisplayAddress(chunk) => match &self.address {
                Some(a) => {
                    address_chunk(display, "Address", a, chunk, S::DisplayAddress, S::DisplayAmount)?
                }
                None => Next::Goto(S::DisplayAmount),
            },
            S::DisplayAmount => amount(display, self.amount, S::Respond)?,
            S::Respond => Next::Approve,
        };

        Ok(next)
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum CollateralOutputStep {
    DisplayIntro,
    /// Address chunk index
    DisplayAddress(u8),
    DisplayAmount,
    Respond,
}

/// Collateral return output
#[derive(Clone, PartialEq, Debug)]
pub struct CollateralOutput {
    step: CollateralOutputStep,
    amount: u64,
    address: Vec<u8, MAX_ADDRESS_LEN>,
}

impl CollateralOutput {
    pub fn new(policy: Policy, amount: u64, address: &[u8]) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptBeforeResponse | Policy::PromptWarnUnusual => {
                Some(CollateralOutputStep::DisplayIntro)
            }
            Policy::Allow => Some(CollateralOutputStep::Respond),
            _ => None,
        })?;

        let address = Vec::from_slice(address).map_err(|_| Error::InvalidLength)?;

        Ok(Self {
            step,
            amount,
            address,
        })
    }
}

impl Steps for CollateralOutput {
    type Step = CollateralOutputStep;

    const KIND: FlowKind = FlowKind::CollateralOutput;

    fn step(&self) -> CollateralOutputStep {
        self.step
    }

    fn set_step(&mut self, step: CollateralOutputStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: CollateralOutputStep,
        display: &mut Display<R>,
    ) -> Result<Next<CollateralOutputStep>, Error> {
        match step {
            CollateralOutputStep::DisplayIntro => Ok(display
                .prompt("Review collateral return", "")?
                .then(CollateralOutputStep::DisplayAddress(0))),
            CollateralOutputStep::DisplayAddress(chunk) => address_chunk(
                display,
                "Collateral return",
                &self.address,
                chunk,
                CollateralOutputStep::DisplayAddress,
                CollateralOutputStep::DisplayAmount,
            ),
            CollateralOutputStep::DisplayAmount => {
                amount(display, self.amount, CollateralOutputStep::Respond)
            }
            CollateralOutputStep::Respond => Ok(Next::Approve),
        }
    }
}
