// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

use strum::EnumIter;

use ledger_ada_apdu::path::Bip44Path;

use super::entry;
use crate::{
    engine::{
        display::Display,
        flow::{FlowKind, Next, Steps},
        render::{Render, Statuses},
        Error,
    },
    helpers::{fmt_ada, fmt_path},
    policy::Policy,
};

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum OutputConfirmStep {
    FinalConfirm,
    Respond,
}

/// Confirmation closing an output and its attachments
#[derive(Clone, PartialEq, Debug)]
pub struct OutputConfirm {
    step: OutputConfirmStep,
}

impl OutputConfirm {
    pub fn new(policy: Policy) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptBeforeResponse | Policy::PromptWarnUnusual => {
                Some(OutputConfirmStep::FinalConfirm)
            }
            Policy::Allow => Some(OutputConfirmStep::Respond),
            _ => None,
        })?;

        Ok(Self { step })
    }
}

impl Steps for OutputConfirm {
    type Step = OutputConfirmStep;

    const KIND: FlowKind = FlowKind::OutputConfirm;

    fn step(&self) -> OutputConfirmStep {
        self.step
    }

    fn set_step(&mut self, step: OutputConfirmStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: OutputConfirmStep,
        display: &mut Display<R>,
    ) -> Result<Next<OutputConfirmStep>, Error> {
        match step {
            OutputConfirmStep::FinalConfirm => Ok(display
                .confirm("Confirm output", "", Statuses::ACTION)?
                .then(OutputConfirmStep::Respond)),
            OutputConfirmStep::Respond => Ok(Next::Approve),
        }
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum FeeStep {
    Display,
    Respond,
}

/// Transaction fee
#[derive(Clone, PartialEq, Debug)]
pub struct Fee {
    step: FeeStep,
    fee: u64,
}

impl Fee {
    pub fn new(policy: Policy, fee: u64) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptBeforeResponse | Policy::PromptWarnUnusual => Some(FeeStep::Display),
            Policy::Allow => Some(FeeStep::Respond),
            _ => None,
        })?;

        Ok(Self { step, fee })
    }
}

impl Steps for Fee {
    type Step = FeeStep;

    const KIND: FlowKind = FlowKind::Fee;

    fn step(&self) -> FeeStep {
        self.step
    }

    fn set_step(&mut self, step: FeeStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: FeeStep,
        display: &mut Display<R>,
    ) -> Result<Next<FeeStep>, Error> {
        match step {
            FeeStep::Display => {
                let mut buff = [0u8; 32];
                let v = fmt_ada(self.fee, &mut buff);
                Ok(display.fact("Transaction fee", v)?.then(FeeStep::Respond))
            }
            FeeStep::Respond => Ok(Next::Approve),
        }
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum WitnessStep {
    Warning,
    Display,
    Respond,
}

/// Witness (signature) request
#[derive(Clone, PartialEq, Debug)]
pub struct Witness {
    step: WitnessStep,
    path: Bip44Path,
}

impl Witness {
    pub fn new(policy: Policy, path: Bip44Path) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptWarnUnusual => Some(WitnessStep::Warning),
            Policy::PromptBeforeResponse | Policy::ShowBeforeResponse => {
                Some(WitnessStep::Display)
            }
            Policy::Allow => Some(WitnessStep::Respond),
            Policy::Deny => None,
        })?;

        Ok(Self { step, path })
    }
}

impl Steps for Witness {
    type Step = WitnessStep;

    const KIND: FlowKind = FlowKind::Witness;

    fn step(&self) -> WitnessStep {
        self.step
    }

    fn set_step(&mut self, step: WitnessStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: WitnessStep,
        display: &mut Display<R>,
    ) -> Result<Next<WitnessStep>, Error> {
        let next = match step {
            WitnessStep::Warning => display
                .warning("Unusual witness requested")?
                .then(WitnessStep::Display),
            WitnessStep::Display => display
                .fact("Witness path", &fmt_path(&self.path))?
                .then(WitnessStep::Respond),
            WitnessStep::Respond => Next::Approve,
        };

        Ok(next)
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum TxConfirmStep {
    Confirm,
    Respond,
}

/// Final transaction confirmation
#[derive(Clone, PartialEq, Debug)]
pub struct TxConfirm {
    step: TxConfirmStep,
}

impl TxConfirm {
    pub fn new(policy: Policy) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptBeforeResponse | Policy::PromptWarnUnusual => {
                Some(TxConfirmStep::Confirm)
            }
            Policy::Allow => Some(TxConfirmStep::Respond),
            _ => None,
        })?;

        Ok(Self { step })
    }
}

impl Steps for TxConfirm {
    type Step = TxConfirmStep;

    const KIND: FlowKind = FlowKind::TxConfirm;

    fn step(&self) -> TxConfirmStep {
        self.step
    }

    fn set_step(&mut self, step: TxConfirmStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: TxConfirmStep,
        display: &mut Display<R>,
    ) -> Result<Next<TxConfirmStep>, Error> {
        match step {
            TxConfirmStep::Confirm => Ok(display
                .confirm("Sign transaction", "", Statuses::ACTION)?
                .then(TxConfirmStep::Respond)),
            TxConfirmStep::Respond => Ok(Next::Approve),
        }
    }
}
