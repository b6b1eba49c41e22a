// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

//! Screen descriptions passed to the platform [Render] implementation

use heapless::{String, Vec};
use strum::Display;

use super::{
    pager::{MAX_FACTS_PER_PAGE, MAX_LABEL_LEN, MAX_TEXT_LEN, MAX_VALUE_LEN},
    Error,
};

/// Short screen text (titles, warnings, statuses)
pub type Text = String<MAX_TEXT_LEN>;

/// Build a [Text] from a string slice
pub fn text(s: &str) -> Result<Text, Error> {
    String::try_from(s).map_err(|_| Error::InvalidLength)
}

/// A labelled value shown to the user, for example `("Fee", "0.17 ADA")`
#[derive(Clone, PartialEq, Debug)]
pub struct Fact {
    label: String<MAX_LABEL_LEN>,
    value: String<MAX_VALUE_LEN>,
}

impl Fact {
    pub fn new(label: &str, value: &str) -> Result<Self, Error> {
        let label = String::try_from(label).map_err(|_| Error::InvalidLength)?;
        let value = String::try_from(value).map_err(|_| Error::InvalidLength)?;

        Ok(Self { label, value })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A page of facts
pub type Page = Vec<Fact, MAX_FACTS_PER_PAGE>;

/// Confirmation style, fixed for the duration of a flow
#[derive(Copy, Clone, PartialEq, Debug, Default, Display)]
pub enum ConfirmStyle {
    /// Two button confirm / cancel, rejecting immediately
    Light,
    /// Hold to approve, with a second chance on rejection
    #[default]
    Full,
}

/// Choice kinds
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ChoiceKind {
    /// Intermediate question, accepting continues the flow
    Prompt,
    /// Final confirmation of a flow
    Confirm(ConfirmStyle),
    /// Confirm rejection, with the option to go back
    Reject,
}

/// Yes / no question shown to the user
#[derive(Clone, PartialEq, Debug)]
pub struct Choice {
    pub kind: ChoiceKind,
    pub title: Text,
    pub subtitle: Text,
}

impl Choice {
    /// Accept and reject button labels for this choice
    pub fn buttons(&self) -> (&'static str, &'static str) {
        match self.kind {
            ChoiceKind::Prompt => ("Continue", "Reject"),
            ChoiceKind::Confirm(ConfirmStyle::Light) => ("Confirm", "Cancel"),
            ChoiceKind::Confirm(ConfirmStyle::Full) => ("Hold to approve", "Reject"),
            ChoiceKind::Reject => ("Yes, Reject", "Go back"),
        }
    }
}

/// Status texts shown once a confirmation completes
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Statuses {
    pub confirmed: &'static str,
    pub rejected: &'static str,
}

impl Statuses {
    /// Generic action statuses
    pub const ACTION: Statuses = Statuses {
        confirmed: "Action confirmed",
        rejected: "Action rejected",
    };

    /// Address verification statuses
    pub const ADDRESS: Statuses = Statuses {
        confirmed: "Address verified",
        rejected: "Address rejected",
    };
}

impl Default for Statuses {
    fn default() -> Self {
        Self::ACTION
    }
}

/// Screens that may be re-rendered
#[derive(Clone, PartialEq, Debug)]
pub enum Screen {
    Page(Page),
    Warning(Text),
    Choice(Choice),
}

/// Platform rendering, implemented by the firmware UI (or test harnesses).
///
/// Each call replaces the current screen, user responses are returned
/// to the engine via [Engine::update][super::Engine::update].
pub trait Render {
    /// Show a page of facts
    fn page(&mut self, facts: &[Fact]);

    /// Show a warning
    fn warning(&mut self, text: &str);

    /// Show a yes / no choice
    fn choice(&mut self, choice: &Choice);

    /// Show a terminal status
    fn status(&mut self, text: &str, approved: bool);
}

impl<T: Render> Render for &mut T {
    fn page(&mut self, facts: &[Fact]) {
        T::page(self, facts)
    }

    fn warning(&mut self, text: &str) {
        T::warning(self, text)
    }

    fn choice(&mut self, choice: &Choice) {
        T::choice(self, choice)
    }

    fn status(&mut self, text: &str, approved: bool) {
        T::status(self, text, approved)
    }
}
