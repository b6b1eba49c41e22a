// Copyright (c) 2022-2023 The ledger-ada Developers
// SPDX-License-Identifier: Apache-2.0

//! Fact accumulation into line-bounded pages.
//!
//! Each fact is estimated to take `value.len() / CHARS_PER_LINE` lines plus
//! [FACT_OVERHEAD_LINES] for the label and spacing. Facts are collected
//! until the next would exceed [MAX_LINES_PER_PAGE], at which point the
//! accumulated page is returned for rendering and the new fact is held as
//! pending, to open the following page.

use static_assertions::const_assert;

use super::{
    render::{Fact, Page},
    Error,
};

/// Line budget per page
pub const MAX_LINES_PER_PAGE: usize = 10;

/// Characters per rendered line
pub const CHARS_PER_LINE: usize = 18;

/// Lines used by each fact in addition to its wrapped value
pub const FACT_OVERHEAD_LINES: usize = 2;

/// Maximum facts per page
pub const MAX_FACTS_PER_PAGE: usize = 5;

/// Maximum fact label length
pub const MAX_LABEL_LEN: usize = 30;

/// Maximum fact value length
pub const MAX_VALUE_LEN: usize = 128;

/// Maximum length for titles, warnings and statuses
pub const MAX_TEXT_LEN: usize = 50;

// A single fact of maximum length must fit on an empty page
const_assert!(MAX_VALUE_LEN / CHARS_PER_LINE + FACT_OVERHEAD_LINES <= MAX_LINES_PER_PAGE);

// The line budget, not the fact count, bounds a page
const_assert!(MAX_FACTS_PER_PAGE * FACT_OVERHEAD_LINES >= MAX_LINES_PER_PAGE);

/// Estimated lines used by a fact
pub fn fact_lines(fact: &Fact) -> usize {
    fact.value().len() / CHARS_PER_LINE + FACT_OVERHEAD_LINES
}

/// Result of pushing a fact
#[derive(Clone, PartialEq, Debug)]
pub enum Paged {
    /// Fact stored on the current page
    Stored,
    /// Page full, the returned facts must be rendered
    Flushed(Page),
}

/// Page accumulator
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Pager {
    page: Page,
    lines: usize,
    pending: Option<Fact>,
}

impl Pager {
    pub const fn new() -> Self {
        Self {
            page: Page::new(),
            lines: 0,
            pending: None,
        }
    }

    /// Facts on the current page
    pub fn facts(&self) -> &[Fact] {
        &self.page
    }

    /// Estimated lines used on the current page
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Fact held over for the next page
    pub fn pending(&self) -> Option<&Fact> {
        self.pending.as_ref()
    }

    /// True when there is nothing to render
    pub fn is_empty(&self) -> bool {
        self.page.is_empty() && self.pending.is_none()
    }

    /// Add a fact, returning the accumulated page if the fact does not fit
    pub fn push(&mut self, fact: Fact) -> Result<Paged, Error> {
        self.drain_pending()?;

        let lines = fact_lines(&fact);

        if self.lines + lines > MAX_LINES_PER_PAGE || self.page.is_full() {
            #[cfg(feature = "log")]
            log::debug!("page full ({} lines), flushing", self.lines);

            let page = self.take_page();
            self.pending = Some(fact);

            return Ok(Paged::Flushed(page));
        }

        self.append(fact, lines)?;

        Ok(Paged::Stored)
    }

    /// Add a fact so it opens a page, returning the accumulated page if
    /// there is one
    pub fn push_new_page(&mut self, fact: Fact) -> Result<Paged, Error> {
        self.drain_pending()?;

        if !self.page.is_empty() {
            let page = self.take_page();
            self.pending = Some(fact);

            return Ok(Paged::Flushed(page));
        }

        let lines = fact_lines(&fact);
        self.append(fact, lines)?;

        Ok(Paged::Stored)
    }

    /// Return everything accumulated, including the pending fact
    pub fn flush(&mut self) -> Result<Option<Page>, Error> {
        self.drain_pending()?;

        if self.page.is_empty() {
            return Ok(None);
        }

        Ok(Some(self.take_page()))
    }

    /// Discard all facts
    pub fn reset(&mut self) {
        self.page.clear();
        self.lines = 0;
        self.pending = None;
    }

    /// Move the pending fact to the start of the current page
    fn drain_pending(&mut self) -> Result<(), Error> {
        let fact = match self.pending.take() {
            Some(f) => f,
            None => return Ok(()),
        };

        // Pending facts are only held across an empty page
        if !self.page.is_empty() {
            #[cfg(feature = "log")]
            log::error!("pending fact with non-empty page");

            return Err(Error::UnexpectedFlowState);
        }

        let lines = fact_lines(&fact);
        self.append(fact, lines)
    }

    fn append(&mut self, fact: Fact, lines: usize) -> Result<(), Error> {
        self.page
            .push(fact)
            .map_err(|_| Error::UnexpectedFlowState)?;
        self.lines += lines;
        Ok(())
    }

    fn take_page(&mut self) -> Page {
        let page = core::mem::take(&mut self.page);
        self.lines = 0;
        page
    }
}
