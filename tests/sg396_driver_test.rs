//! SG396 driver integration tests
//!
//! Exercises the full property surface against the in-memory mock instrument.

use sg396::transport::mock::Call;
use sg396::transport::MockTransport;
use sg396::{
    Angle, Frequency, Property, PropertyValue, Sg396, Sg396Error, Sg396State, TransportError,
};

fn driver() -> (Sg396<MockTransport>, MockTransport) {
    let mock = MockTransport::new();
    (Sg396::new(mock.clone()), mock)
}

/// Every numeric property survives set-then-get within two-decimal rounding.
#[tokio::test]
async fn test_numeric_round_trip() {
    let (mut sg, _mock) = driver();
    let values = [0.0, 1.0, -1.0, 0.004, 12.345, -47.5, 1234.5678, 2.0e9, 6.0e9 + 0.33];

    for property in [Property::LfAmplitude, Property::RfAmplitude, Property::LfOffset] {
        for v in values {
            sg.set(property, v).await.unwrap();
            let read = sg.get(property).await.unwrap().as_f64().unwrap();
            assert!((read - v).abs() <= 0.01, "{property}: wrote {v}, read {read}");
        }
    }

    for v in values {
        sg.set_frequency(Frequency::from_hz(v)).await.unwrap();
        let read = sg.frequency().await.unwrap().as_hz();
        assert!((read - v).abs() <= 0.01, "frequency: wrote {v}, read {read}");

        sg.set_phase(Angle::from_degrees(v)).await.unwrap();
        let read = sg.phase().await.unwrap().as_degrees();
        assert!((read - v).abs() <= 0.01, "phase: wrote {v}, read {read}");
    }
}

#[tokio::test]
async fn test_typed_accessors_send_expected_commands() {
    let (mut sg, mock) = driver();
    sg.set_lf_amplitude(0.5).await.unwrap();
    sg.set_rf_amplitude(-10.0).await.unwrap();
    sg.set_lf_offset(-0.25).await.unwrap();
    sg.set_frequency(Frequency::from_mhz(10.0)).await.unwrap();
    sg.set_phase(Angle::from_degrees(45.0)).await.unwrap();

    assert_eq!(
        mock.writes(),
        vec![
            "AMPL0.50",
            "AMPR-10.00",
            "OFSL-0.25",
            "FREQ10000000.00",
            "PHAS45.00"
        ]
    );
}

#[tokio::test]
async fn test_frequency_write_uses_two_decimals() {
    let (mut sg, mock) = driver();
    sg.set(Property::Frequency, Frequency::from_hz(1000000.5))
        .await
        .unwrap();
    assert_eq!(mock.writes(), vec!["FREQ1000000.50"]);
}

#[tokio::test]
async fn test_getters_send_queries() {
    let mock = MockTransport::new()
        .with_register("AMPL", "0.50")
        .with_register("AMPR", "-10.00")
        .with_register("OFSL", "0.00")
        .with_register("FREQ", "1000000.500000")
        .with_register("PHAS", "90.00");
    let mut sg = Sg396::new(mock.clone());

    assert_eq!(sg.lf_amplitude().await.unwrap(), 0.5);
    assert_eq!(sg.rf_amplitude().await.unwrap(), -10.0);
    assert_eq!(sg.lf_offset().await.unwrap(), 0.0);
    assert_eq!(sg.frequency().await.unwrap(), Frequency::from_hz(1000000.5));
    assert_eq!(sg.phase().await.unwrap(), Angle::from_degrees(90.0));
    assert_eq!(
        mock.queries(),
        vec!["AMPL?", "AMPR?", "OFSL?", "FREQ?", "PHAS?"]
    );
    assert!(mock.writes().is_empty());
}

#[tokio::test]
async fn test_toggle_writes() {
    let (mut sg, mock) = driver();
    sg.set_lf_toggle(true).await.unwrap();
    sg.set_rf_toggle(true).await.unwrap();
    sg.set_lf_toggle(false).await.unwrap();
    sg.set_rf_toggle(false).await.unwrap();
    assert_eq!(mock.writes(), vec!["ENBL1", "ENBR1", "ENBL0", "ENBR0"]);
}

#[tokio::test]
async fn test_toggle_replies() {
    let (mut sg, mock) = driver();
    mock.push_reply("ENBL?", "1");
    mock.push_reply("ENBL?", "0");
    mock.push_reply("ENBL?", "2");
    mock.push_reply("ENBR?", "");

    assert!(sg.lf_toggle().await.unwrap());
    assert!(!sg.lf_toggle().await.unwrap());
    match sg.lf_toggle().await {
        Err(Sg396Error::UnrecognizedReply { property, reply }) => {
            assert_eq!(property, "lf_toggle");
            assert_eq!(reply, "2");
        }
        other => panic!("expected UnrecognizedReply, got {other:?}"),
    }
    assert!(matches!(
        sg.rf_toggle().await,
        Err(Sg396Error::UnrecognizedReply { property: "rf_toggle", .. })
    ));
}

#[tokio::test]
async fn test_unsupported_property_issues_no_transport_call() {
    let (mut sg, mock) = driver();

    for result in [
        sg.get(Property::RfPllLoopFilterMode).await.map(|_| ()),
        sg.set(Property::RfPllLoopFilterMode, 1.0).await,
        sg.set(Property::RfPllLoopFilterMode, true).await,
        sg.rf_pll_loop_filter_mode().await.map(|_| ()),
        sg.set_rf_pll_loop_filter_mode(0.0).await,
    ] {
        assert!(matches!(
            result,
            Err(Sg396Error::NotSupported {
                property: "rf_pll_loop_filter_mode"
            })
        ));
    }

    // Even a dead transport is never reached.
    mock.inject_next_failure(TransportError::Disconnected);
    assert!(matches!(
        sg.rf_pll_loop_filter_mode().await,
        Err(Sg396Error::NotSupported { .. })
    ));
    assert!(mock.call_log().is_empty());
}

#[tokio::test]
async fn test_rel_phase() {
    let (mut sg, mock) = driver();
    sg.rel_phase().await.unwrap();
    assert_eq!(mock.call_log(), vec![Call::Write("RPHS".to_string())]);
}

#[tokio::test]
async fn test_transport_errors_propagate_unchanged() {
    let (mut sg, mock) = driver();

    mock.inject_next_failure(TransportError::Timeout(std::time::Duration::from_secs(1)));
    assert!(matches!(
        sg.frequency().await,
        Err(Sg396Error::Transport(TransportError::Timeout(_)))
    ));

    mock.inject_next_failure(TransportError::Disconnected);
    assert!(matches!(
        sg.set_rf_toggle(true).await,
        Err(Sg396Error::Transport(TransportError::Disconnected))
    ));

    mock.inject_next_failure(TransportError::Malformed("bad".to_string()));
    assert!(matches!(
        sg.rel_phase().await,
        Err(Sg396Error::Transport(TransportError::Malformed(_)))
    ));

    // One attempt per call, no retries.
    assert_eq!(mock.call_log().len(), 3);
}

#[tokio::test]
async fn test_invalid_values_never_reach_transport() {
    let (mut sg, mock) = driver();
    assert!(matches!(
        sg.set_lf_amplitude(f64::NAN).await,
        Err(Sg396Error::InvalidValue { property: "lf_amplitude", .. })
    ));
    assert!(matches!(
        sg.set(Property::Frequency, Angle::from_degrees(1.0)).await,
        Err(Sg396Error::TypeMismatch { property: "frequency", .. })
    ));
    assert!(matches!(
        sg.set(Property::RfToggle, 1.0).await,
        Err(Sg396Error::TypeMismatch { property: "rf_toggle", .. })
    ));
    assert!(mock.call_log().is_empty());
}

#[tokio::test]
async fn test_numeric_reply_garbage() {
    let (mut sg, mock) = driver();
    mock.push_reply("AMPR?", "OVLD");
    assert!(matches!(
        sg.rf_amplitude().await,
        Err(Sg396Error::InvalidNumericReply { property: "rf_amplitude", .. })
    ));
}

#[tokio::test]
async fn test_generic_set_with_parsed_input() {
    let (mut sg, mock) = driver();
    for (name, text) in [
        ("frequency", "2.5 kHz"),
        ("phase", "-90 deg"),
        ("rf_toggle", "on"),
        ("lf_offset", "0.1"),
    ] {
        let property: Property = name.parse().unwrap();
        let value = PropertyValue::parse_for(property, text).unwrap();
        sg.set(property, value).await.unwrap();
    }
    assert_eq!(
        mock.writes(),
        vec!["FREQ2500.00", "PHAS-90.00", "ENBR1", "OFSL0.10"]
    );
}

#[tokio::test]
async fn test_snapshot_and_apply() {
    let state = Sg396State {
        lf_amplitude: 0.5,
        rf_amplitude: -20.0,
        lf_toggle: false,
        rf_toggle: true,
        frequency: Frequency::from_mhz(100.0),
        lf_offset: 0.1,
        phase: Angle::from_degrees(12.5),
    };

    let (mut sg, mock) = driver();
    sg.apply(&state).await.unwrap();
    assert_eq!(
        mock.writes(),
        vec![
            "AMPL0.50",
            "AMPR-20.00",
            "ENBL0",
            "ENBR1",
            "FREQ100000000.00",
            "OFSL0.10",
            "PHAS12.50"
        ]
    );

    assert_eq!(sg.snapshot().await.unwrap(), state);
    assert_eq!(
        mock.queries(),
        vec!["AMPL?", "AMPR?", "ENBL?", "ENBR?", "FREQ?", "OFSL?", "PHAS?"]
    );
}

#[tokio::test]
async fn test_snapshot_stops_at_first_error() {
    let mock = MockTransport::new()
        .with_register("AMPL", "0.50")
        .with_register("AMPR", "-20.00")
        .with_register("ENBL", "maybe");
    let mut sg = Sg396::new(mock.clone());

    assert!(matches!(
        sg.snapshot().await,
        Err(Sg396Error::UnrecognizedReply { property: "lf_toggle", .. })
    ));
    assert_eq!(mock.queries(), vec!["AMPL?", "AMPR?", "ENBL?"]);
}

#[tokio::test]
async fn test_snapshot_serializes_in_declared_units() {
    let state = Sg396State {
        lf_amplitude: 0.5,
        rf_amplitude: -20.0,
        lf_toggle: false,
        rf_toggle: true,
        frequency: Frequency::from_hz(1000.0),
        lf_offset: 0.0,
        phase: Angle::from_degrees(90.0),
    };
    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["frequency"], 1000.0);
    assert_eq!(json["phase"], 90.0);
    assert_eq!(json["rf_toggle"], true);
}

#[tokio::test]
async fn test_boxed_transport_driver() {
    let mock = MockTransport::new();
    let transport: Box<dyn sg396::transport::MessageTransport> = Box::new(mock.clone());
    let mut sg = Sg396::new(transport);
    sg.set_rf_toggle(true).await.unwrap();
    assert!(sg.rf_toggle().await.unwrap());
    assert_eq!(mock.writes(), vec!["ENBR1"]);
}
