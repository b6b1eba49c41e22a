// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

//! The [Engine] drives on-device confirmation of security sensitive requests.
//!
//! Requests are classified by the [policy][crate::policy], then the
//! resulting [Flow] is started with [Engine::start] and advanced with
//! [Engine::update] on each user response until it exits with the
//! approval outcome.
//! See [apdu][crate::apdu] for APDU protocol / encoding specifications.

use strum::EnumIter;

use ledger_ada_apdu::path::Bip44Path;

use crate::policy::{AddressCheck, TxContext};

mod error;
pub use error::Error;

mod pager;
pub use pager::{
    fact_lines, Paged, Pager, CHARS_PER_LINE, FACT_OVERHEAD_LINES, MAX_FACTS_PER_PAGE,
    MAX_LABEL_LEN, MAX_LINES_PER_PAGE, MAX_TEXT_LEN, MAX_VALUE_LEN,
};

mod render;
pub use render::{
    text, Choice, ChoiceKind, ConfirmStyle, Fact, Page, Render, Screen, Statuses, Text,
};

mod display;
pub use display::{Display, Shown};

mod flow;
pub use flow::{drive, Flow, FlowKind, Next, Progress, Steps};

pub mod flows;

mod request;
pub use request::Request;

/// Engine state
#[derive(Copy, Clone, PartialEq, Debug, strum::Display, EnumIter)]
pub enum State {
    /// No flow active
    Idle,
    /// Flow waiting on the user
    Running,
    /// Flow steps complete, waiting on the user to dismiss the last page
    Finishing,
}

/// User response to the current screen
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Resume {
    Accept,
    Reject,
}

/// Result type for engine operations
///
/// Indicates whether the flow is waiting on the user or has exited
/// with the approval outcome.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UiResult<R = ()> {
    /// None indicates no active flow
    None,
    /// Waiting on user input
    Pending,
    /// Exit used to signal flow completion
    Exit(R),
}

impl<R> UiResult<R> {
    /// Map on UiResult exit value
    pub fn map_exit<O>(&self, mut f: impl FnMut(&R) -> O) -> UiResult<O> {
        match self {
            UiResult::None => UiResult::None,
            UiResult::Pending => UiResult::Pending,
            UiResult::Exit(ref v) => {
                let o = f(v);
                UiResult::Exit(o)
            }
        }
    }

    /// Check if a UiResult is the `Exit` variant
    pub fn is_exit(&self) -> bool {
        matches!(self, UiResult::Exit(..))
    }
}

impl UiResult<bool> {
    /// Returns `Ok(true)` once approved, `Ok(false)` while no outcome is
    /// available, and [Error::UserRejected] on rejection
    pub fn approved(&self) -> Result<bool, Error> {
        match self {
            UiResult::Exit(true) => Ok(true),
            UiResult::Exit(false) => Err(Error::UserRejected),
            _ => Ok(false),
        }
    }
}

/// [`Driver`] trait provides platform support for [`Engine`] instances
pub trait Driver {
    /// Derive the raw address for the provided key paths into `buff`,
    /// returning the address length
    fn derive_address(
        &self,
        spending: &Bip44Path,
        staking: Option<&Bip44Path>,
        buff: &mut [u8],
    ) -> Result<usize, Error>;
}

impl<T: Driver> Driver for &T {
    fn derive_address(
        &self,
        spending: &Bip44Path,
        staking: Option<&Bip44Path>,
        buff: &mut [u8],
    ) -> Result<usize, Error> {
        T::derive_address(self, spending, staking, buff)
    }
}

impl<T: Driver> Driver for &mut T {
    fn derive_address(
        &self,
        spending: &Bip44Path,
        staking: Option<&Bip44Path>,
        buff: &mut [u8],
    ) -> Result<usize, Error> {
        T::derive_address(self, spending, staking, buff)
    }
}

/// [Engine] runs one confirmation flow at a time, rendering via the
/// platform [Render] implementation
pub struct Engine<DRV: Driver, R: Render> {
    state: State,
    rejecting: bool,

    tx: Option<TxContext>,
    tx_closing: bool,

    flow: Flow,
    display: Display<R>,

    drv: DRV,
}

impl<DRV: Driver, R: Render> Engine<DRV, R> {
    /// Create a new engine instance with the provided driver and renderer
    pub fn new(drv: DRV, render: R) -> Self {
        Self {
            state: State::Idle,
            rejecting: false,
            tx: None,
            tx_closing: false,
            flow: Flow::None,
            display: Display::new(render),
            drv,
        }
    }

    /// Current engine state
    pub fn state(&self) -> State {
        self.state
    }

    /// Kind of the active flow, if any
    pub fn active(&self) -> Option<FlowKind> {
        self.flow.kind()
    }

    /// Whether the rejection question is showing
    pub fn is_rejecting(&self) -> bool {
        self.rejecting
    }

    /// Transaction context for per-element policies, present between
    /// [Request::TxInit] and the end of the transaction
    pub fn tx(&self) -> Option<&TxContext> {
        self.tx.as_ref()
    }

    pub fn display(&self) -> &Display<R> {
        &self.display
    }

    /// Access the platform renderer
    pub fn render(&self) -> &R {
        self.display.render()
    }

    pub fn render_mut(&mut self) -> &mut R {
        self.display.render_mut()
    }

    /// Handle an incoming request, starting its confirmation flow.
    ///
    /// Requests denied by policy fail with [Error::PolicyDenied], requests
    /// needing no confirmation exit approved immediately.
    pub fn request(
        &mut self,
        req: &Request,
        check: impl AddressCheck,
        style: ConfirmStyle,
    ) -> Result<UiResult<bool>, Error> {
        #[cfg(feature = "log")]
        log::debug!("request: {:?}", req);

        self.ensure_idle()?;

        if let Request::TxInit(r) = req {
            self.tx = Some(TxContext::new(r.account, r.num_witnesses));
            self.tx_closing = false;
        }

        let flow = match req.flow(self.tx.as_ref(), check, &self.drv) {
            Ok(f) => f,
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };

        if let Request::TxWitness(_) = req {
            self.witnessed();
        }

        match flow {
            Some(f) => self.start(f, style),
            None => {
                if self.tx_closing {
                    self.end_tx();
                }
                Ok(UiResult::Exit(true))
            }
        }
    }

    /// Start a confirmation flow, running steps until the first screen
    /// requiring user input.
    ///
    /// Starting a flow while another is active is an error, resetting
    /// the engine.
    pub fn start(
        &mut self,
        flow: impl Into<Flow>,
        style: ConfirmStyle,
    ) -> Result<UiResult<bool>, Error> {
        let flow = flow.into();

        self.ensure_idle()?;

        let kind = match flow.kind() {
            Some(k) => k,
            None => return Err(Error::UnexpectedFlowState),
        };

        #[cfg(feature = "log")]
        log::info!("start {} flow ({} style)", kind, style);

        #[cfg(not(feature = "log"))]
        let _ = kind;

        self.display.reset();
        self.display.set_style(style);
        self.flow = flow;
        self.state = State::Running;

        self.step()
    }

    /// Handle a user response, resuming the active flow
    pub fn update(&mut self, resume: Resume) -> Result<UiResult<bool>, Error> {
        if self.state == State::Idle {
            return Ok(UiResult::None);
        }

        #[cfg(feature = "log")]
        log::debug!("resume: {:?} (state: {}, rejecting: {})", resume, self.state, self.rejecting);

        match resume {
            Resume::Accept => self.accept(),
            Resume::Reject => self.reject(),
        }
    }

    /// Abandon any active flow and transaction, clearing all flow and
    /// page state
    pub fn reset(&mut self) {
        self.clear_flow();
        self.end_tx();
    }

    fn clear_flow(&mut self) {
        self.flow = Flow::None;
        self.display.reset();
        self.state = State::Idle;
        self.rejecting = false;
    }

    /// Count a witness request against the transaction, closing it once
    /// the last expected witness is handled
    fn witnessed(&mut self) {
        if let Some(tx) = self.tx.as_mut() {
            tx.witnesses = tx.witnesses.saturating_sub(1);
            self.tx_closing = tx.witnesses == 0;
        }
    }

    fn end_tx(&mut self) {
        #[cfg(feature = "log")]
        log::debug!("end tx: {:?}", self.tx);

        self.tx = None;
        self.tx_closing = false;
    }

    fn ensure_idle(&mut self) -> Result<(), Error> {
        if self.state == State::Idle {
            return Ok(());
        }

        #[cfg(feature = "log")]
        log::error!("flow {:?} already active", self.flow.kind());

        self.reset();

        Err(Error::UnexpectedFlowState)
    }

    fn accept(&mut self) -> Result<UiResult<bool>, Error> {
        // "Yes, reject"
        if self.rejecting {
            return Ok(self.finish(false));
        }

        // Screen held back behind a page of facts
        if self.display.show_deferred() {
            return Ok(UiResult::Pending);
        }

        if self.state == State::Finishing {
            return Ok(self.finish(true));
        }

        self.step()
    }

    fn reject(&mut self) -> Result<UiResult<bool>, Error> {
        // "Go back"
        if self.rejecting {
            self.rejecting = false;
            self.display.restore();
            return Ok(UiResult::Pending);
        }

        match self.display.style() {
            ConfirmStyle::Light => Ok(self.finish(false)),
            ConfirmStyle::Full => {
                if let Err(e) = self.display.reject_prompt() {
                    self.reset();
                    return Err(e);
                }
                self.rejecting = true;
                Ok(UiResult::Pending)
            }
        }
    }

    fn step(&mut self) -> Result<UiResult<bool>, Error> {
        let r = match self.flow.drive(&mut self.display) {
            Ok(Progress::Suspended) => Ok(UiResult::Pending),
            // Show remaining facts before responding
            Ok(Progress::Complete) => match self.display.force() {
                Ok(Shown::Rendered) => {
                    self.state = State::Finishing;
                    Ok(UiResult::Pending)
                }
                Ok(Shown::Nothing) => Ok(self.finish(true)),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        if r.is_err() {
            #[cfg(feature = "log")]
            log::warn!("flow {:?} failed: {:?}", self.flow.kind(), r);

            self.reset();
        }

        r
    }

    fn finish(&mut self, approved: bool) -> UiResult<bool> {
        #[cfg(feature = "log")]
        log::log!(
            if approved { log::Level::Info } else { log::Level::Warn },
            "{:?} flow {}",
            self.flow.kind(),
            if approved { "approved" } else { "rejected" }
        );

        // Nothing follows a confirmed transaction without witnesses
        let confirmed = self.flow.kind() == Some(FlowKind::TxConfirm)
            && matches!(&self.tx, Some(tx) if tx.witnesses == 0);

        self.display.status(approved);
        self.clear_flow();

        if !approved || self.tx_closing || confirmed {
            self.end_tx();
        }

        UiResult::Exit(approved)
    }
}
