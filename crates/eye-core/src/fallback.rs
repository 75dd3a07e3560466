//! Deterministic fallback planner.
//!
//! Used whenever the controller is unavailable, disabled, or returns a
//! plan that fails validation. The constructed plans are well-formed by
//! construction and cover three shapes: transcribe-and-acknowledge for
//! audio input, direct synthesis for the say-prefix, and chat-then-speak
//! for everything else.

use serde_json::{json, Value};

use eye_types::{
    Criteria, Plan, Purpose, RouteName, Step, StepKind, TargetModel, ToolCall, ToolName,
    PLAN_VERSION,
};

/// Build a plan for the given planning input (the inbound message in
/// phase A, `{"text": ..., "phase": "postprocess"}` in phase B).
pub fn build_plan(input: &Value) -> Plan {
    let text = input.get("text").and_then(Value::as_str).unwrap_or("");
    let audio_b64 = input
        .get("audio_b64")
        .and_then(Value::as_str)
        .filter(|a| !a.is_empty());

    if let Some(audio) = audio_b64 {
        return transcribe_plan(audio);
    }
    if let Some(said) = strip_say_prefix(text) {
        return speak_plan(said);
    }
    chat_plan()
}

/// Audio input: transcribe, then speak a fixed acknowledgement.
fn transcribe_plan(audio_b64: &str) -> Plan {
    plan(
        vec![
            tool_step(
                "stt1",
                ToolName::SttTranscribe,
                json!({ "audio_b64": audio_b64 }),
                &[],
                "transcript",
            ),
            tool_step(
                "tts1",
                ToolName::TtsSpeak,
                json!({ "text": "Принято. Распознал." }),
                &["stt1"],
                "ack_audio",
            ),
        ],
        &["transcript.text != ''"],
        &["ack_audio", "transcript"],
    )
}

/// Say-prefix input: speak the remainder verbatim.
fn speak_plan(said: &str) -> Plan {
    plan(
        vec![tool_step(
            "tts1",
            ToolName::TtsSpeak,
            json!({ "text": said, "preset": "imp_light" }),
            &[],
            "speech",
        )],
        &["speech.data_b64 != ''"],
        &["speech"],
    )
}

/// Anything else: chat on the 20b route, then speak the reply.
fn chat_plan() -> Plan {
    plan(
        vec![
            Step {
                id: "llm1".to_string(),
                kind: StepKind::Model,
                route: Some(TargetModel {
                    name: RouteName::TwentyB,
                    purpose: Purpose::Chat,
                }),
                call: None,
                wait_for: vec![],
                emit: Some("reply".to_string()),
            },
            tool_step(
                "tts1",
                ToolName::TtsSpeak,
                json!({ "text": "${reply.text}" }),
                &["llm1"],
                "speech",
            ),
        ],
        &["reply.text != ''"],
        &["reply", "speech"],
    )
}

/// The spoken remainder after a `скажи:` / `say:` prefix, if present.
///
/// Matching is case-insensitive on the trimmed text. The prefix is
/// stripped by character count, not byte count, so the Cyrillic form
/// slices safely.
fn strip_say_prefix(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    for prefix in ["скажи:", "say:"] {
        if lower.starts_with(prefix) {
            let chars = prefix.chars().count();
            let offset = trimmed
                .char_indices()
                .nth(chars)
                .map(|(i, _)| i)
                .unwrap_or(trimmed.len());
            return Some(trimmed[offset..].trim_start());
        }
    }
    None
}

fn tool_step(id: &str, tool: ToolName, args: Value, wait_for: &[&str], emit: &str) -> Step {
    let args = match args {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    Step {
        id: id.to_string(),
        kind: StepKind::Tool,
        route: None,
        call: Some(ToolCall { tool, args }),
        wait_for: wait_for.iter().map(|s| s.to_string()).collect(),
        emit: Some(emit.to_string()),
    }
}

fn plan(steps: Vec<Step>, success_when: &[&str], deliver: &[&str]) -> Plan {
    Plan {
        version: PLAN_VERSION.to_string(),
        route_parts: Default::default(),
        steps,
        criteria: Criteria {
            success_when: success_when.iter().map(|s| s.to_string()).collect(),
            deliver: deliver.iter().map(|s| s.to_string()).collect(),
        },
    }
}
