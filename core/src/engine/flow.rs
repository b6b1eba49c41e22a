// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

use core::fmt::Debug;

use strum::{Display, EnumIter};

use super::{
    display::{Display as Screens, Shown},
    flows::*,
    render::Render,
    Error,
};

/// Flow kinds, one confirmation sequence per request type
#[derive(Copy, Clone, PartialEq, Debug, Display, EnumIter)]
pub enum FlowKind {
    GetKey,
    KeysInit,
    DeriveAddress,
    OutputAddressBytes,
    OutputAddressParams,
    CollateralOutput,
    Token,
    Datum,
    RefScript,
    OutputConfirm,
    Fee,
    Witness,
    TxConfirm,
}

/// Continuation returned by step handlers
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Next<S> {
    /// Continue immediately with the provided step
    Goto(S),
    /// Wait for the user to accept, then resume at the provided step
    Wait(S),
    /// Flow complete, approve the request
    Approve,
}

impl Shown {
    /// Continue at `step`, waiting for the user if a screen was rendered
    pub fn then<S>(self, step: S) -> Next<S> {
        match self {
            Shown::Nothing => Next::Goto(step),
            Shown::Rendered => Next::Wait(step),
        }
    }
}

/// Per-flow step sequence
pub trait Steps {
    /// Step enumeration, ordered by execution
    type Step: Copy + PartialOrd + Debug;

    const KIND: FlowKind;

    /// Current step
    fn step(&self) -> Self::Step;

    fn set_step(&mut self, step: Self::Step);

    /// Execute `step`, returning the continuation
    fn handle<R: Render>(
        &self,
        step: Self::Step,
        display: &mut Screens<R>,
    ) -> Result<Next<Self::Step>, Error>;
}

/// Flow progress after driving
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Progress {
    /// Waiting on the user
    Suspended,
    /// All steps executed
    Complete,
}

/// Run steps until the flow suspends or completes
pub fn drive<S: Steps, R: Render>(flow: &mut S, display: &mut Screens<R>) -> Result<Progress, Error> {
    loop {
        let step = flow.step();

        #[cfg(feature = "log")]
        log::debug!("{} step: {:?}", S::KIND, step);

        let (next, progress) = match flow.handle(step, display)? {
            Next::Goto(n) => (n, None),
            Next::Wait(n) => (n, Some(Progress::Suspended)),
            Next::Approve => return Ok(Progress::Complete),
        };

        // Steps only advance
        if next <= step {
            #[cfg(feature = "log")]
            log::error!("{} step {:?} -> {:?} does not advance", S::KIND, step, next);

            return Err(Error::UnexpectedFlowState);
        }

        flow.set_step(next);

        if let Some(p) = progress {
            return Ok(p);
        }
    }
}

/// Active flow, at most one per [Engine][super::Engine]
#[derive(Clone, PartialEq, Debug, Default)]
pub enum Flow {
    #[default]
    None,
    GetKey(GetKey),
    KeysInit(KeysInit),
    DeriveAddress(DeriveAddress),
    OutputAddressBytes(OutputAddressBytes),
    OutputAddressParams(OutputAddressParams),
    CollateralOutput(CollateralOutput),
    Token(Token),
    Datum(Datum),
    RefScript(RefScript),
    OutputConfirm(OutputConfirm),
    Fee(Fee),
    Witness(Witness),
    TxConfirm(TxConfirm),
}

impl Flow {
    /// Kind of the active flow, if any
    pub fn kind(&self) -> Option<FlowKind> {
        let k = match self {
            Flow::None => return None,
            Flow::GetKey(_) => GetKey::KIND,
            Flow::KeysInit(_) => KeysInit::KIND,
            Flow::DeriveAddress(_) => DeriveAddress::KIND,
            Flow::OutputAddressBytes(_) => OutputAddressBytes::KIND,
            Flow::OutputAddressParams(_) => OutputAddressParams::KIND,
            Flow::CollateralOutput(_) => CollateralOutput::KIND,
            Flow::Token(_) => Token::KIND,
            Flow::Datum(_) => Datum::KIND,
            Flow::RefScript(_) => RefScript::KIND,
            Flow::OutputConfirm(_) => OutputConfirm::KIND,
            Flow::Fee(_) => Fee::KIND,
            Flow::Witness(_) => Witness::KIND,
            Flow::TxConfirm(_) => TxConfirm::KIND,
        };
        Some(k)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Flow::None)
    }

    /// Drive the active flow
    pub fn drive<R: Render>(&mut self, display: &mut Screens<R>) -> Result<Progress, Error> {
        match self {
            Flow::None => Err(Error::UnexpectedFlowState),
            Flow::GetKey(f) => drive(f, display),
            Flow::KeysInit(f) => drive(f, display),
            Flow::DeriveAddress(f) => drive(f, display),
            Flow::OutputAddressBytes(f) => drive(f, display),
            Flow::OutputAddressParams(f) => drive(f, display),
            Flow::CollateralOutput(f) => drive(f, display),
            Flow::Token(f) => drive(f, display),
            Flow::Datum(f) => drive(f, display),
            Flow::RefScript(f) => drive(f, display),
            Flow::OutputConfirm(f) => drive(f, display),
            Flow::Fee(f) => drive(f, display),
            Flow::Witness(f) => drive(f, display),
            Flow::TxConfirm(f) => drive(f, display),
        }
    }
}

macro_rules! flow_from {
    ($($t:ident),* $(,)?) => {
        $(
            impl From<$t> for Flow {
                fn from(f: $t) -> Self {
                    Flow::$t(f)
                }
            }
        )*
    };
}

flow_from!(
    GetKey,
    KeysInit,
    DeriveAddress,
    OutputAddressBytes,
    OutputAddressParams,
    CollateralOutput,
    Token,
    Datum,
    RefScript,
    OutputConfirm,
    Fee,
    Witness,
    TxConfirm,
);
