//! Integration tests for artifact decoding
//!
//! The decoder consumes adversarial model output; these tests pin the
//! classification contract: total (never panics, never errors),
//! first-match-wins, and graceful degradation to chat.

use artifex::artifact::{Artifact, decode_artifact};

#[test]
fn decodes_every_artifact_type() {
    let doc = decode_artifact(
        "```json\n{\"type\":\"doc\",\"title\":\"PRD\",\"content\":\"<h1>PRD</h1>\"}\n```",
    );
    assert!(matches!(doc, Artifact::Document { .. }));

    let ppt = decode_artifact(
        "```json\n{\"type\":\"ppt\",\"title\":\"Pitch\",\"slides\":[{\"title\":\"Intro\",\"content\":\"<p>hi</p>\"}]}\n```",
    );
    assert!(matches!(ppt, Artifact::Presentation { .. }));

    let sheet = decode_artifact(
        "```json\n{\"type\":\"spreadsheet\",\"title\":\"Budget\",\"columns\":[\"Item\"],\"data\":[[\"Rent\"]]}\n```",
    );
    assert!(matches!(sheet, Artifact::Spreadsheet { .. }));

    let code = decode_artifact(
        "```json\n{\"type\":\"code\",\"title\":\"m.py\",\"language\":\"python\",\"content\":\"pass\"}\n```",
    );
    assert!(matches!(code, Artifact::Code { .. }));

    let plan = decode_artifact(
        "```json\n{\"type\":\"plan\",\"content\":\"Three steps\",\"steps\":[\"a\",\"b\",\"c\"]}\n```",
    );
    assert!(matches!(plan, Artifact::Plan { .. }));

    let chat = decode_artifact("Sure, what would you like to build?");
    assert!(matches!(chat, Artifact::Chat { .. }));
}

#[test]
fn first_of_two_fenced_blocks_wins() {
    let input = concat!(
        "Two artifacts follow.\n",
        "```json\n{\"type\":\"spreadsheet\",\"title\":\"Winner\",\"columns\":[],\"data\":[]}\n```\n",
        "```json\n{\"type\":\"doc\",\"title\":\"Loser\",\"content\":\"x\"}\n```\n",
    );

    match decode_artifact(input) {
        Artifact::Spreadsheet { title, .. } => assert_eq!(title, "Winner"),
        other => panic!("Expected first block's Spreadsheet, got {other:?}"),
    }
}

#[test]
fn well_formed_code_round_trip() {
    let input = "```json\n{\"type\":\"code\",\"title\":\"a.py\",\"language\":\"python\",\"content\":\"print(1)\"}\n```";
    match decode_artifact(input) {
        Artifact::Code {
            title,
            language,
            content,
            suggested_questions,
        } => {
            assert_eq!(title, "a.py");
            assert_eq!(language, "python");
            assert_eq!(content, "print(1)");
            assert!(suggested_questions.is_empty());
        }
        other => panic!("Expected Code, got {other:?}"),
    }
}

#[test]
fn ragged_spreadsheet_rows_kept_as_is() {
    let input =
        r#"{"type":"spreadsheet","title":"T","columns":["A","B"],"data":[["1"],["2","3","4"]]}"#;
    match decode_artifact(input) {
        Artifact::Spreadsheet { columns, rows, .. } => {
            assert_eq!(columns, vec!["A", "B"]);
            assert_eq!(rows, vec![
                vec!["1".to_string()],
                vec!["2".to_string(), "3".to_string(), "4".to_string()],
            ]);
        }
        other => panic!("Expected Spreadsheet, got {other:?}"),
    }
}

#[test]
fn unrecognized_type_yields_chat_with_original_text() {
    let input = "```json\n{\"type\":\"unknown_widget\",\"foo\":\"bar\"}\n```";
    match decode_artifact(input) {
        Artifact::Chat { text, .. } => assert_eq!(text, input),
        other => panic!("Expected Chat, got {other:?}"),
    }
}

#[test]
fn prose_without_braces_never_attempts_parsing() {
    let input = "Hello! How can I help you build your app today?";
    match decode_artifact(input) {
        Artifact::Chat { text, .. } => assert_eq!(text, input),
        other => panic!("Expected Chat, got {other:?}"),
    }
}

#[test]
fn decoder_is_total_over_pseudo_random_input() {
    // Deterministic LCG byte soup: truncated JSON, stray fences, brace
    // runs. The decoder must classify all of it without panicking.
    let mut state: u64 = 0x2545f4914f6cdd1d;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as u8
    };

    for round in 0..500 {
        let len = (round % 97) + 1;
        let bytes: Vec<u8> = (0..len).map(|_| next()).collect();
        let text = String::from_utf8_lossy(&bytes);

        let artifact = decode_artifact(&text);
        // Random bytes should essentially always degrade to chat, and
        // in that case carry the input through untouched.
        if let Artifact::Chat { text: out, .. } = artifact {
            assert_eq!(out, text);
        }
    }

    // Structured-ish hostile prefixes around a valid payload fragment
    let payload = r#"{"type":"doc","title":"T","content":"x"}"#;
    for cut in 0..payload.len() {
        let truncated = &payload[..cut];
        let _ = decode_artifact(truncated);
        let _ = decode_artifact(&format!("```json\n{truncated}"));
        let _ = decode_artifact(&format!("```json\n{truncated}\n```"));
    }
}
