use domain::ManualClock;
use soil_sdi12::{
    Acquirer, AcquisitionError, AcquisitionTiming, Command, EXPECTED_FIELDS, ParseError, ScriptedBus,
    Sdi12Address, parse_response,
};
use std::sync::Arc;
use std::time::Duration;

fn data_command() -> Command {
    Command::SendData(Sdi12Address::default(), 0)
}

fn measure_command() -> Command {
    Command::StartMeasurement(Sdi12Address::default())
}

fn acquirer(bus: ScriptedBus) -> (Acquirer<ScriptedBus>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let acquirer = Acquirer::new(bus, clock.clone(), AcquisitionTiming::default());
    (acquirer, clock)
}

#[test]
fn parses_three_fields_after_address() {
    let raw = parse_response(b"0+123.4+25.6+789.0\r\n").expect("valid response");
    assert_eq!(raw.vwc_raw, 123.4);
    assert_eq!(raw.temperature, 25.6);
    assert_eq!(raw.ec_raw, 789.0);
}

#[test]
fn two_separators_are_rejected() {
    let err = parse_response(b"0+123.4+25.6\r\n").expect_err("two fields");
    assert_eq!(err, ParseError::FieldCount { found: 2 });
}

#[test]
fn extra_separators_are_rejected() {
    let err = parse_response(b"0+1+2+3+4\r\n").expect_err("four fields");
    assert_eq!(err, ParseError::FieldCount { found: 4 });
}

#[test]
fn address_only_or_empty_is_too_short() {
    assert_eq!(
        parse_response(b"0").expect_err("address only"),
        ParseError::ResponseTooShort { len: 1 }
    );
    assert_eq!(
        parse_response(b"").expect_err("empty"),
        ParseError::ResponseTooShort { len: 0 }
    );
}

#[test]
fn negative_sign_reduces_separator_count() {
    // 负值用 `-` 作前缀，不产生 `+` 分隔符
    let err = parse_response(b"0+1975.3-2.1+412.0\r\n").expect_err("negative field");
    assert_eq!(err, ParseError::FieldCount { found: 2 });
}

#[test]
fn unparsable_field_reads_as_zero() {
    let raw = parse_response(b"0+abc+25.6+789.0\r\n").expect("structurally valid");
    assert_eq!(raw.vwc_raw, 0.0);
    assert_eq!(raw.temperature, 25.6);
}

#[tokio::test]
async fn acquisition_sends_measure_then_data() {
    let (mut acquirer, clock) = acquirer(ScriptedBus::demo());

    let acquisition = acquirer.acquire().await;
    let raw = acquisition.result.expect("demo reading");

    assert_eq!(raw.vwc_raw, 1975.3);
    assert_eq!(raw.temperature, 22.4);
    assert_eq!(raw.ec_raw, 412.0);
    assert_eq!(acquirer.bus().sent(), ["0M!", "0D0!"]);
    assert_eq!(clock.total_slept(), Duration::from_millis(2000));
    assert_eq!(acquisition.started_at, Duration::ZERO);
}

#[tokio::test]
async fn measurement_acknowledgement_is_not_parsed() {
    // 只为 M! 预置应答，D0! 无响应
    let bus = ScriptedBus::new().with_reply(measure_command(), "00013\r\n");
    let (mut acquirer, _clock) = acquirer(bus);

    let err = acquirer.acquire().await.result.expect_err("no data");
    assert!(matches!(
        err,
        AcquisitionError::Parse(ParseError::ResponseTooShort { len: 0 })
    ));
}

#[tokio::test]
async fn queued_replies_take_precedence() {
    let mut bus = ScriptedBus::demo();
    bus.push_reply(data_command(), "0+1.0+2.0\r\n");
    let (mut acquirer, _clock) = acquirer(bus);

    let first = acquirer.acquire().await.result;
    assert!(matches!(
        first,
        Err(AcquisitionError::Parse(ParseError::FieldCount { found: 2 }))
    ));

    let second = acquirer.acquire().await.result.expect("sticky reply");
    assert_eq!(second.vwc_raw, 1975.3);
}

#[tokio::test]
async fn overlong_response_is_rejected() {
    // 第三个字段在缓冲上限处被截断
    let long = format!("0+1975.3+22.4+{}\r\n", "4".repeat(114));
    let bus = ScriptedBus::new().with_reply(data_command(), long);
    let (mut acquirer, _clock) = acquirer(bus);

    let err = acquirer.acquire().await.result.expect_err("truncated reply");
    assert!(matches!(
        err,
        AcquisitionError::Parse(ParseError::ResponseTooLong { len: 128 })
    ));
}

#[tokio::test]
async fn response_filling_buffer_exactly_is_accepted() {
    let reply = "0+1+2+3\r\n";
    let bus = ScriptedBus::new().with_reply(data_command(), reply);
    let clock = Arc::new(ManualClock::new());
    let timing = AcquisitionTiming {
        max_response_len: reply.len(),
        ..AcquisitionTiming::default()
    };
    let mut acquirer = Acquirer::new(bus, clock, timing);

    let raw = acquirer.acquire().await.result.expect("reply within limit");
    assert_eq!(raw.ec_raw, 3.0);
}

#[test]
fn field_count_error_names_expected_count() {
    let err = parse_response(b"0+1+2\r\n").expect_err("two fields");
    assert_eq!(
        err.to_string(),
        format!("expected {} field separators, found 2", EXPECTED_FIELDS)
    );
}

#[tokio::test]
async fn bus_failure_is_reported() {
    let mut bus = ScriptedBus::demo();
    bus.fail_next_send("port unplugged");
    let (mut acquirer, clock) = acquirer(bus);

    let err = acquirer.acquire().await.result.expect_err("send fails");
    assert!(matches!(err, AcquisitionError::Bus(_)));
    assert_eq!(clock.total_slept(), Duration::ZERO);
    assert!(acquirer.bus().sent().is_empty());
}
