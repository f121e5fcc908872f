//! Tests for the framer and response parser working together.

use fcu_controller::protocol::{Framer, RawLine, ResponseRecord};

fn records(chunks: &[&[u8]]) -> Vec<ResponseRecord> {
    let mut framer = Framer::new();
    chunks
        .iter()
        .flat_map(|chunk| framer.feed(chunk))
        .filter(|line| !line.is_blank())
        .map(|line| ResponseRecord::parse(&line))
        .collect()
}

#[test]
fn welcome_then_ack_in_one_chunk() {
    let wire = concat!(
        r#"{"type":"welcome","message":"FCU ready","data":{"t":"Takeoff","l":"Land"}}"#,
        "\n",
        r#"{"type":"command","message":"Takeoff executed","data":{"command_id":17}}"#,
        "\n",
    );

    let parsed = records(&[wire.as_bytes()]);
    assert_eq!(parsed.len(), 2);

    match &parsed[0] {
        ResponseRecord::Welcome { message, data } => {
            assert_eq!(message, "FCU ready");
            assert_eq!(data.len(), 2);
            assert_eq!(data["t"], "Takeoff");
        }
        other => panic!("Expected Welcome, got {other:?}"),
    }
    match &parsed[1] {
        ResponseRecord::CommandAck {
            message,
            command_id,
        } => {
            assert_eq!(message, "Takeoff executed");
            assert_eq!(command_id.as_deref(), Some("17"));
        }
        other => panic!("Expected CommandAck, got {other:?}"),
    }
}

#[test]
fn debug_telemetry_split_across_chunks() {
    let wire = br#"{"type":"debug","message":"Telemetry","data":{"world_position":{"x":1.5,"y":-2.0,"z":10.25},"gnss":{"fix":true}}}
"#;
    let (head, tail) = wire.split_at(37);

    let parsed = records(&[head, tail]);
    assert_eq!(parsed.len(), 1);
    match &parsed[0] {
        ResponseRecord::Debug { message, data } => {
            assert_eq!(message, "Telemetry");
            assert_eq!(data["world_position"]["z"], 10.25);
            assert_eq!(data["gnss"]["fix"], true);
        }
        other => panic!("Expected Debug, got {other:?}"),
    }
}

#[test]
fn help_listing_from_data() {
    let line = RawLine::new(
        r#"{"type":"help","message":"Available commands","data":{"commands":{"a":"Arm","d":"Disarm"}}}"#,
    )
    .unwrap();

    match ResponseRecord::parse(&line) {
        ResponseRecord::Help { message, commands } => {
            assert_eq!(message, "Available commands");
            assert_eq!(commands.len(), 2);
            assert_eq!(commands["d"], "Disarm");
        }
        other => panic!("Expected Help, got {other:?}"),
    }
}

#[test]
fn help_listing_keeps_server_key_order() {
    let line = RawLine::new(
        r#"{"type":"help","message":"Commands","data":{"commands":{"t":"Takeoff","l":"Land","a":"Unlock"}}}"#,
    )
    .unwrap();

    match ResponseRecord::parse(&line) {
        ResponseRecord::Help { commands, .. } => {
            let keys: Vec<&str> = commands.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["t", "l", "a"]);
        }
        other => panic!("Expected Help, got {other:?}"),
    }
}

#[test]
fn welcome_data_keeps_server_key_order() {
    let line = RawLine::new(r#"{"type":"welcome","message":"hi","data":{"q":"Quit","d":"Lock","a":"Unlock"}}"#)
        .unwrap();

    match ResponseRecord::parse(&line) {
        ResponseRecord::Welcome { data, .. } => {
            let keys: Vec<&str> = data.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["q", "d", "a"]);
        }
        other => panic!("Expected Welcome, got {other:?}"),
    }
}

#[test]
fn mixed_stream_keeps_order_and_fallbacks() {
    let wire = b"{\"type\":\"status\",\"message\":\"Idle\"}\r\n\
plain text from server\n\
\n\
{\"type\":\"mystery\",\"message\":\"?\"}\n\
[1,2,3]\n\
{\"type\":\"error\",\"message\":\"Not armed\"}\n\
{\"type\":\"goodbye\",\"message\":\"Bye\"}\n\
{\"type\":\"status\"";

    let parsed = records(&[&wire[..]]);
    let kinds: Vec<&str> = parsed.iter().map(ResponseRecord::kind).collect();
    assert_eq!(
        kinds,
        vec![
            "status",
            "unstructured",
            "mystery",
            "unstructured",
            "error",
            "goodbye"
        ]
    );
    assert_eq!(parsed[1].message(), "plain text from server");
    assert_eq!(parsed[3].message(), "[1,2,3]");
    assert!(!parsed[1].is_structured());
    assert!(parsed[2].is_structured());
}

#[test]
fn invalid_utf8_does_not_stall_the_stream() {
    let mut wire = b"{\"type\":\"status\",\"message\":\"caf".to_vec();
    wire.extend_from_slice(&[0xff, 0xfe]);
    wire.extend_from_slice(b"\"}\n{\"type\":\"status\",\"message\":\"next\"}\n");

    let parsed = records(&[wire.as_slice()]);
    assert_eq!(parsed.len(), 2);
    assert!(matches!(parsed[0], ResponseRecord::Status { .. }));
    assert!(parsed[0].message().starts_with("caf"));
    assert_eq!(parsed[1].message(), "next");
}

#[test]
fn encoded_commands_are_single_lines() {
    assert_eq!(Framer::encode("t").unwrap(), b"t\n");
    assert_eq!(Framer::encode("quit").unwrap(), b"quit\n");
    assert!(Framer::encode("t\nl").is_err());
}
