#![allow(unused)]

use log::debug;

use ledger_ada_core::{
    apdu::path::{Bip44Path, HARDENED},
    engine::{Choice, ChoiceKind, Driver, Engine, Error, Fact, Render, Resume, UiResult},
};

pub const H: u32 = HARDENED;

/// Initialise test logging, ignoring repeat initialisation
pub fn init_log() {
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, Default::default());
}

/// Build a path from segments
pub fn path(segments: &[u32]) -> Bip44Path {
    Bip44Path::new(segments).unwrap()
}

/// Rendered screen record
#[derive(Clone, PartialEq, Debug)]
pub enum Shown {
    Page(Vec<(String, String)>),
    Warning(String),
    Choice(ChoiceKind, String),
    Status(String, bool),
}

impl Shown {
    pub fn labels(&self) -> Vec<&str> {
        match self {
            Shown::Page(p) => p.iter().map(|(l, _)| l.as_str()).collect(),
            _ => vec![],
        }
    }
}

/// [Render] implementation recording rendered screens
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    pub screens: Vec<Shown>,
}

impl Recorder {
    pub fn last(&self) -> Option<&Shown> {
        self.screens.last()
    }

    pub fn pages(&self) -> Vec<&Shown> {
        self.screens
            .iter()
            .filter(|s| matches!(s, Shown::Page(_)))
            .collect()
    }
}

impl Render for Recorder {
    fn page(&mut self, facts: &[Fact]) {
        debug!("page: {:?}", facts);

        let p = facts
            .iter()
            .map(|f| (f.label().to_string(), f.value().to_string()))
            .collect();
        self.screens.push(Shown::Page(p));
    }

    fn warning(&mut self, text: &str) {
        debug!("warning: {}", text);
        self.screens.push(Shown::Warning(text.to_string()));
    }

    fn choice(&mut self, choice: &Choice) {
        debug!("choice: {:?}", choice);
        self.screens
            .push(Shown::Choice(choice.kind, choice.title.to_string()));
    }

    fn status(&mut self, text: &str, approved: bool) {
        debug!("status: {} ({})", text, approved);
        self.screens.push(Shown::Status(text.to_string(), approved));
    }
}

/// Driver implementation for test use, producing a base address
/// with the path segments as key hashes
pub struct TestDriver;

pub const TEST_ADDRESS_LEN: usize = 57;

impl Driver for TestDriver {
    fn derive_address(
        &self,
        spending: &Bip44Path,
        staking: Option<&Bip44Path>,
        buff: &mut [u8],
    ) -> Result<usize, Error> {
        if buff.len() < TEST_ADDRESS_LEN {
            return Err(Error::InvalidLength);
        }

        buff[..TEST_ADDRESS_LEN].fill(0);
        buff[0] = 0x01;

        for (i, s) in spending.segments().iter().enumerate().take(7) {
            buff[1 + i * 4..][..4].copy_from_slice(&s.to_be_bytes());
        }
        if let Some(p) = staking {
            for (i, s) in p.segments().iter().enumerate().take(7) {
                buff[29 + i * 4..][..4].copy_from_slice(&s.to_be_bytes());
            }
        }

        Ok(TEST_ADDRESS_LEN)
    }
}

pub type TestEngine = Engine<TestDriver, Recorder>;

pub fn engine() -> TestEngine {
    Engine::new(TestDriver, Recorder::default())
}

/// Accept every screen until the active flow exits
pub fn accept_all(e: &mut TestEngine) -> anyhow::Result<bool> {
    for _ in 0..32 {
        match e.update(Resume::Accept)? {
            UiResult::Exit(v) => return Ok(v),
            UiResult::Pending => (),
            UiResult::None => return Err(anyhow::anyhow!("no active flow")),
        }
    }

    Err(anyhow::anyhow!("flow did not complete"))
}
