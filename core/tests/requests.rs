use encdec::Encode;

use ledger_ada_core::{
    apdu::{prelude::*, ApduStatic},
    engine::{
        flows::TxConfirm, ConfirmStyle, Error, FlowKind, Request, Resume, State, UiResult,
    },
    policy::{HeaderCheck, Policy, TxContext},
};

mod helpers;
use helpers::*;

/// Encode a request object and parse it back as an engine request
fn parse<T: Encode + ApduStatic>(req: T) -> anyhow::Result<Request> {
    let mut buff = [0u8; 256];
    let n = req
        .encode(&mut buff)
        .map_err(|_| anyhow::anyhow!("encode failed"))?;

    Request::parse(T::INS, &buff[..n]).map_err(|e| anyhow::anyhow!("parse failed: {e:?}"))
}

/// Build an output request, mapping APDU errors
fn output(amount: u64, flags: OutputFlags, address: &[u8]) -> anyhow::Result<TxOutputReq> {
    TxOutputReq::new(amount, flags, address).map_err(|e| anyhow::anyhow!("invalid output: {e:?}"))
}

#[test]
fn tx_sequence() -> anyhow::Result<()> {
    init_log();

    let mut e = engine();

    // Init and inputs never involve the user
    let r = parse(TxInitReq::new(0, 1, 2, 2))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Exit(true));
    assert_eq!(e.tx(), Some(&TxContext::new(0, 2)));

    let r = parse(TxInputReq {
        utxo: UtxoRef::new([0x5a; 32], 1),
    })?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Exit(true));

    // Third-party output
    let mut base = [0u8; 57];
    base[0] = 0x01;
    let r = parse(output(2_000_000, OutputFlags::empty(), &base)?)?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Pending);
    assert_eq!(e.active(), Some(FlowKind::OutputAddressBytes));
    assert!(accept_all(&mut e)?);

    // Ordinary change output needs no confirmation
    let r = parse(TxChangeOutputReq::new(
        500_000,
        OutputFlags::empty(),
        path(&[44 | H, 1815 | H, H, 1, 0]),
        Some(path(&[44 | H, 1815 | H, H, 2, 0])),
    ))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Exit(true));

    // Fee
    let r = parse(TxFeeReq::new(170_000))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Pending);
    assert_eq!(e.state(), State::Finishing);
    assert_eq!(
        e.render().last(),
        Some(&Shown::Page(vec![(
            "Transaction fee".into(),
            "0.17 ADA".into()
        )]))
    );
    assert_eq!(e.update(Resume::Accept)?, UiResult::Exit(true));

    // Own witnesses are allowed, the last one ends the transaction
    let r = parse(TxWitnessReq::new(path(&[44 | H, 1815 | H, H, 0, 3])))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Exit(true));
    assert_eq!(e.tx(), Some(&TxContext::new(0, 1)));

    let r = parse(TxWitnessReq::new(path(&[44 | H, 1815 | H, H, 2, 0])))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Exit(true));
    assert_eq!(e.tx(), None);

    // Further witnesses no longer belong to a transaction
    let r = parse(TxWitnessReq::new(path(&[44 | H, 1815 | H, H, 0, 3])))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Pending);
    assert!(matches!(e.render().last(), Some(Shown::Warning(_))));

    Ok(())
}

#[test]
fn witness_without_tx_warns() -> anyhow::Result<()> {
    init_log();

    let mut e = engine();
    assert_eq!(e.tx(), None);

    // Account 0 is not assumed without a transaction
    let r = parse(TxWitnessReq::new(path(&[44 | H, 1815 | H, H, 0, 0])))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Pending);
    assert!(matches!(e.render().last(), Some(Shown::Warning(_))));

    assert!(accept_all(&mut e)?);
    assert_eq!(e.tx(), None);

    Ok(())
}

#[test]
fn rejection_ends_tx() -> anyhow::Result<()> {
    init_log();

    let mut e = engine();

    let r = parse(TxInitReq::new(3, 1, 1, 1))?;
    e.request(&r, HeaderCheck, ConfirmStyle::Light)?;
    assert_eq!(e.tx(), Some(&TxContext::new(3, 1)));

    let r = parse(TxFeeReq::new(170_000))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Light)?, UiResult::Pending);
    assert_eq!(e.update(Resume::Reject)?, UiResult::Exit(false));
    assert_eq!(e.tx(), None);

    // Witnesses for the abandoned account now warn
    let r = parse(TxWitnessReq::new(path(&[44 | H, 1815 | H, 3 | H, 0, 0])))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Light)?, UiResult::Pending);
    assert!(matches!(e.render().last(), Some(Shown::Warning(_))));

    Ok(())
}

#[test]
fn reset_ends_tx() -> anyhow::Result<()> {
    init_log();

    let mut e = engine();

    let r = parse(TxInitReq::new(0, 1, 1, 1))?;
    e.request(&r, HeaderCheck, ConfirmStyle::Full)?;
    assert!(e.tx().is_some());

    e.reset();
    assert_eq!(e.tx(), None);

    // Denied requests abort the transaction
    let r = parse(TxInitReq::new(0, 1, 1, 1))?;
    e.request(&r, HeaderCheck, ConfirmStyle::Full)?;

    let r = parse(TxWitnessReq::new(path(&[44 | H, 60 | H, H, 0, 0])))?;
    assert_eq!(
        e.request(&r, HeaderCheck, ConfirmStyle::Full),
        Err(Error::PolicyDenied)
    );
    assert_eq!(e.tx(), None);

    Ok(())
}

#[test]
fn foreign_witness_warns() -> anyhow::Result<()> {
    init_log();

    let mut e = engine();

    let r = parse(TxInitReq::new(0, 1, 1, 1))?;
    e.request(&r, HeaderCheck, ConfirmStyle::Full)?;

    // Witness for account 1 while signing for account 0
    let r = parse(TxWitnessReq::new(path(&[44 | H, 1815 | H, 1 | H, 0, 0])))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Pending);
    assert!(matches!(e.render().last(), Some(Shown::Warning(_))));

    assert_eq!(e.update(Resume::Accept)?, UiResult::Pending);
    assert_eq!(
        e.render().last(),
        Some(&Shown::Page(vec![(
            "Witness path".into(),
            "m/44'/1815'/1'/0/0".into()
        )]))
    );

    assert_eq!(e.update(Resume::Accept)?, UiResult::Exit(true));

    Ok(())
}

#[test]
fn malformed_output_denied() -> anyhow::Result<()> {
    init_log();

    let mut e = engine();

    // Base address header with a truncated body
    let mut raw = [0u8; 20];
    raw[0] = 0x01;

    let r = parse(output(1, OutputFlags::empty(), &raw)?)?;
    assert_eq!(
        e.request(&r, HeaderCheck, ConfirmStyle::Full),
        Err(Error::PolicyDenied)
    );
    assert!(e.render().screens.is_empty());
    assert_eq!(e.state(), State::Idle);

    // Witness outside the Cardano purpose / coin type
    let r = parse(TxWitnessReq::new(path(&[44 | H, 60 | H, H, 0, 0])))?;
    assert_eq!(
        e.request(&r, HeaderCheck, ConfirmStyle::Full),
        Err(Error::PolicyDenied)
    );

    Ok(())
}

#[test]
fn collateral_output() -> anyhow::Result<()> {
    init_log();

    let mut enterprise = [0u8; 29];
    enterprise[0] = 0x61;

    let mut e = engine();
    let r = parse(output(5_000_000, OutputFlags::COLLATERAL, &enterprise)?)?;

    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Pending);
    assert_eq!(e.active(), Some(FlowKind::CollateralOutput));
    assert!(accept_all(&mut e)?);

    Ok(())
}

#[test]
fn derive_address_request() -> anyhow::Result<()> {
    init_log();

    let mut e = engine();

    // Returned addresses for standard paths need no confirmation
    let r = parse(DeriveAddressReq::new(
        AddressMode::Return,
        path(&[44 | H, 1815 | H, H, 0, 1]),
        None,
    ))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Exit(true));

    // Shown addresses are verified by the user
    let r = parse(DeriveAddressReq::new(
        AddressMode::Display,
        path(&[44 | H, 1815 | H, H, 0, 1]),
        Some(path(&[44 | H, 1815 | H, H, 2, 0])),
    ))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Pending);
    assert!(accept_all(&mut e)?);

    // Derived address is shown alone
    let pages = e.render().pages();
    assert_eq!(pages.len(), 2);
    match pages[1] {
        Shown::Page(p) => {
            assert_eq!(p.len(), 1);
            assert!(p[0].1.starts_with("01"));
            assert_eq!(p[0].1.len(), TEST_ADDRESS_LEN * 2);
        }
        s => panic!("unexpected screen {s:?}"),
    }

    assert_eq!(
        e.render().last(),
        Some(&Shown::Status("Address verified".into(), true))
    );

    Ok(())
}

#[test]
fn keys_init_request() -> anyhow::Result<()> {
    init_log();

    let mut e = engine();

    let r = parse(ExtPubKeysInitReq::new(1))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Light)?, UiResult::Exit(true));

    let r = parse(ExtPubKeysInitReq::new(0))?;
    assert_eq!(
        e.request(&r, HeaderCheck, ConfirmStyle::Light),
        Err(Error::PolicyDenied)
    );

    let r = parse(ExtPubKeysInitReq::new(4))?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Light)?, UiResult::Pending);
    assert_eq!(e.active(), Some(FlowKind::KeysInit));

    // Requests while a flow is active abort it
    let r = parse(ExtPubKeyReq::new(path(&[44 | H, 1815 | H, H])))?;
    assert_eq!(
        e.request(&r, HeaderCheck, ConfirmStyle::Light),
        Err(Error::UnexpectedFlowState)
    );
    assert_eq!(e.active(), None);

    Ok(())
}

#[test]
fn unknown_instruction() {
    assert!(Request::parse(0x7f, &[0u8; 4]).is_err());
}

#[test]
fn confirm_ends_tx_without_witnesses() -> anyhow::Result<()> {
    init_log();

    let mut e = engine();

    let r = parse(TxInitReq::new(0, 1, 1, 0))?;
    e.request(&r, HeaderCheck, ConfirmStyle::Full)?;
    assert_eq!(e.tx(), Some(&TxContext::new(0, 0)));

    e.start(TxConfirm::new(Policy::PromptBeforeResponse)?, ConfirmStyle::Full)?;
    assert!(accept_all(&mut e)?);
    assert_eq!(e.tx(), None);

    // With witnesses outstanding the transaction stays open
    let r = parse(TxInitReq::new(0, 1, 1, 1))?;
    e.request(&r, HeaderCheck, ConfirmStyle::Full)?;

    e.start(TxConfirm::new(Policy::PromptBeforeResponse)?, ConfirmStyle::Full)?;
    assert!(accept_all(&mut e)?);
    assert_eq!(e.tx(), Some(&TxContext::new(0, 1)));

    Ok(())
}

#[test]
fn long_address_shown_in_full() -> anyhow::Result<()> {
    init_log();

    let mut byron = [0u8; 90];
    byron[0] = 0x82;
    for (i, b) in byron.iter_mut().enumerate().skip(1) {
        *b = i as u8;
    }

    let mut e = engine();
    let r = parse(output(1_000_000, OutputFlags::empty(), &byron)?)?;
    assert_eq!(e.request(&r, HeaderCheck, ConfirmStyle::Full)?, UiResult::Pending);
    assert!(accept_all(&mut e)?);

    // Address split over two numbered facts, one per page
    let pages = e.render().pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].labels(), vec!["Send to address (1/2)"]);
    assert_eq!(pages[1].labels(), vec!["Send to address (2/2)", "Amount"]);

    let mut shown = String::new();
    for p in &pages {
        if let Shown::Page(facts) = p {
            for (label, value) in facts {
                if label.starts_with("Send to address") {
                    shown.push_str(value);
                }
            }
        }
    }

    let expected: String = byron.iter().map(|b| format!("{b:02x}")).collect();
    assert!(shown.eq_ignore_ascii_case(&expected), "shown {shown}");

    Ok(())
}
