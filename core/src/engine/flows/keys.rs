// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

use core::str::from_utf8;

use emstr::EncodeStr;
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
    helpers::fmt_path,
    policy::Policy,
};

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum GetKeyStep {
    Warning,
    Prompt,
    Display,
    Confirm,
    Respond,
}

/// Extended public key export
#[derive(Clone, PartialEq, Debug)]
pub struct GetKey {
    step: GetKeyStep,
    path: Bip44Path,
}

impl GetKey {
    pub fn new(policy: Policy, path: Bip44Path) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptWarnUnusual => Some(GetKeyStep::Warning),
            Policy::PromptBeforeResponse => Some(GetKeyStep::Prompt),
            Policy::ShowBeforeResponse => Some(GetKeyStep::Display),
            Policy::Allow => Some(GetKeyStep::Respond),
            Policy::Deny => None,
        })?;

        Ok(Self { step, path })
    }

    pub fn path(&self) -> &Bip44Path {
        &self.path
    }
}

impl Steps for GetKey {
    type Step = GetKeyStep;

    const KIND: FlowKind = FlowKind::GetKey;

    fn step(&self) -> GetKeyStep {
        self.step
    }

    fn set_step(&mut self, step: GetKeyStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: GetKeyStep,
        display: &mut Display<R>,
    ) -> Result<Next<GetKeyStep>, Error> {
        let next = match step {
            GetKeyStep::Warning => display
                .warning("Unusual request, proceed with care")?
                .then(GetKeyStep::Prompt),
            GetKeyStep::Prompt => display
                .prompt("Export public key", "")?
                .then(GetKeyStep::Display),
            GetKeyStep::Display => display
                .fact("Public key", &fmt_path(&self.path))?
                .then(GetKeyStep::Confirm),
            GetKeyStep::Confirm => display
                .confirm("Confirm export", "", Statuses::ACTION)?
                .then(GetKeyStep::Respond),
            GetKeyStep::Respond => Next::Approve,
        };

        Ok(next)
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, EnumIter)]
pub enum KeysInitStep {
    Confirm,
    Respond,
}

/// Bulk public key export announcement
#[derive(Clone, PartialEq, Debug)]
pub struct KeysInit {
    step: KeysInitStep,
    num_paths: u32,
}

impl KeysInit {
    pub fn new(policy: Policy, num_paths: u32) -> Result<Self, Error> {
        let step = entry(policy, |p| match p {
            Policy::PromptBeforeResponse | Policy::PromptWarnUnusual => {
                Some(KeysInitStep::Confirm)
            }
            Policy::Allow => Some(KeysInitStep::Respond),
            _ => None,
        })?;

        Ok(Self { step, num_paths })
    }
}

impl Steps for KeysInit {
    type Step = KeysInitStep;

    const KIND: FlowKind = FlowKind::KeysInit;

    fn step(&self) -> KeysInitStep {
        self.step
    }

    fn set_step(&mut self, step: KeysInitStep) {
        self.step = step;
    }

    fn handle<R: Render>(
        &self,
        step: KeysInitStep,
        display: &mut Display<R>,
    ) -> Result<Next<KeysInitStep>, Error> {
        match step {
            KeysInitStep::Confirm => {
                let mut buff = [0u8; 24];
                let n = emstr::write!(&mut buff[..], self.num_paths, " keys")
                    .map_err(|_| Error::EncodingFailed)?;
                let subtitle = from_utf8(&buff[..n]).map_err(|_| Error::EncodingFailed)?;

                let shown = display.confirm("Export public keys", subtitle, Statuses::ACTION)?;
                Ok(shown.then(KeysInitStep::Respond))
            }
            KeysInitStep::Respond => Ok(Next::Approve),
        }
    }
}
