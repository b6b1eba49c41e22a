// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

use super::{
    pager::{Paged, Pager},
    render::{text, Choice, ChoiceKind, ConfirmStyle, Fact, Render, Screen, Statuses},
    Error,
};

/// Whether a display operation rendered a screen (and the flow must wait
/// for the user) or only accumulated state
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Shown {
    Nothing,
    Rendered,
}

/// Display context shared by all flows, wrapping the platform [Render]
/// with fact paging and screen ordering.
///
/// Warnings, prompts and confirmations render any accumulated facts first,
/// the screen itself is then deferred until the user accepts that page.
pub struct Display<R: Render> {
    render: R,
    pager: Pager,
    style: ConfirmStyle,
    statuses: Option<Statuses>,
    current: Option<Screen>,
    deferred: Option<Screen>,
}

impl<R: Render> Display<R> {
    pub fn new(render: R) -> Self {
        Self {
            render,
            pager: Pager::new(),
            style: ConfirmStyle::default(),
            statuses: None,
            current: None,
            deferred: None,
        }
    }

    /// Confirmation style for the active flow
    pub fn style(&self) -> ConfirmStyle {
        self.style
    }

    pub(crate) fn set_style(&mut self, style: ConfirmStyle) {
        self.style = style;
    }

    /// Access the underlying renderer
    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn render_mut(&mut self) -> &mut R {
        &mut self.render
    }

    /// Pager state
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Last rendered screen (excluding rejection prompts)
    pub fn current(&self) -> Option<&Screen> {
        self.current.as_ref()
    }

    /// Whether a confirmation has been shown in this flow
    pub fn confirmed(&self) -> bool {
        self.statuses.is_some()
    }

    /// Add a fact, rendering the accumulated page if it is full
    pub fn fact(&mut self, label: &str, value: &str) -> Result<Shown, Error> {
        let fact = Fact::new(label, value)?;

        match self.pager.push(fact)? {
            Paged::Stored => Ok(Shown::Nothing),
            Paged::Flushed(page) => {
                self.show(Screen::Page(page));
                Ok(Shown::Rendered)
            }
        }
    }

    /// Add a fact at the start of a new page, rendering any accumulated facts
    pub fn fact_new_page(&mut self, label: &str, value: &str) -> Result<Shown, Error> {
        let fact = Fact::new(label, value)?;

        match self.pager.push_new_page(fact)? {
            Paged::Stored => Ok(Shown::Nothing),
            Paged::Flushed(page) => {
                self.show(Screen::Page(page));
                Ok(Shown::Rendered)
            }
        }
    }

    /// Render any accumulated facts
    pub fn force(&mut self) -> Result<Shown, Error> {
        match self.pager.flush()? {
            Some(page) => {
                self.show(Screen::Page(page));
                Ok(Shown::Rendered)
            }
            None => Ok(Shown::Nothing),
        }
    }

    /// Show a warning
    pub fn warning(&mut self, message: &str) -> Result<Shown, Error> {
        let screen = Screen::Warning(text(message)?);
        self.screen(screen)
    }

    /// Show an intermediate prompt
    pub fn prompt(&mut self, title: &str, subtitle: &str) -> Result<Shown, Error> {
        let choice = Choice {
            kind: ChoiceKind::Prompt,
            title: text(title)?,
            subtitle: text(subtitle)?,
        };
        self.screen(Screen::Choice(choice))
    }

    /// Show the final confirmation using the flow [ConfirmStyle], with
    /// `statuses` shown on completion
    pub fn confirm(
        &mut self,
        title: &str,
        subtitle: &str,
        statuses: Statuses,
    ) -> Result<Shown, Error> {
        let choice = Choice {
            kind: ChoiceKind::Confirm(self.style),
            title: text(title)?,
            subtitle: text(subtitle)?,
        };
        self.statuses = Some(statuses);
        self.screen(Screen::Choice(choice))
    }

    /// Show the rejection question, leaving the current screen to return to
    pub(crate) fn reject_prompt(&mut self) -> Result<(), Error> {
        let choice = Choice {
            kind: ChoiceKind::Reject,
            title: text("Reject?")?,
            subtitle: text("")?,
        };
        self.render.choice(&choice);
        Ok(())
    }

    /// Re-render the current screen
    pub(crate) fn restore(&mut self) {
        if let Some(s) = self.current.take() {
            self.show(s);
        }
    }

    /// Render a deferred screen, returning true if there was one
    pub(crate) fn show_deferred(&mut self) -> bool {
        match self.deferred.take() {
            Some(s) => {
                self.show(s);
                true
            }
            None => false,
        }
    }

    /// Render the terminal status for the flow outcome
    pub(crate) fn status(&mut self, approved: bool) {
        match (approved, self.statuses) {
            (true, Some(s)) => self.render.status(s.confirmed, true),
            (true, None) => (),
            (false, s) => self
                .render
                .status(s.unwrap_or_default().rejected, false),
        }
    }

    /// Clear all flow state
    pub fn reset(&mut self) {
        self.pager.reset();
        self.style = ConfirmStyle::default();
        self.statuses = None;
        self.current = None;
        self.deferred = None;
    }

    /// Render accumulated facts then `screen`, or `screen` directly
    fn screen(&mut self, screen: Screen) -> Result<Shown, Error> {
        if self.deferred.is_some() {
            #[cfg(feature = "log")]
            log::error!("screen requested with deferred screen pending");

            return Err(Error::UnexpectedFlowState);
        }

        match self.pager.flush()? {
            Some(page) => {
                self.show(Screen::Page(page));
                self.deferred = Some(screen);
            }
            None => self.show(screen),
        }

        Ok(Shown::Rendered)
    }

    fn show(&mut self, screen: Screen) {
        match &screen {
            Screen::Page(p) => self.render.page(p),
            Screen::Warning(t) => self.render.warning(t),
            Screen::Choice(c) => self.render.choice(c),
        }
        self.current = Some(screen);
    }
}
