//! Reply extraction from the flow runtime's run envelope.
//!
//! The runtime fills different slots of `outputs[0].outputs[0]` depending on which stage
//! produced the answer. Slots are tried in a fixed order and the first non-blank string wins.
//! Nothing is synthesized from partial data.

use serde_json::Value;

/// One candidate location of the reply text inside a run output.
pub struct ReplySlot {
    /// Path relative to `outputs[0].outputs[0]`, for logging.
    pub name: &'static str,
    pub read: fn(&Value) -> Option<&str>,
}

fn artifacts_message(output: &Value) -> Option<&str> {
    output.pointer("/artifacts/message")?.as_str()
}

fn outputs_message(output: &Value) -> Option<&str> {
    output.pointer("/outputs/message/message")?.as_str()
}

fn results_text(output: &Value) -> Option<&str> {
    output.pointer("/results/message/text")?.as_str()
}

fn first_message(output: &Value) -> Option<&str> {
    output.pointer("/messages/0/message")?.as_str()
}

/// Candidate slots in priority order.
pub const REPLY_SLOTS: &[ReplySlot] = &[
    ReplySlot {
        name: "artifacts.message",
        read: artifacts_message,
    },
    ReplySlot {
        name: "outputs.message.message",
        read: outputs_message,
    },
    ReplySlot {
        name: "results.message.text",
        read: results_text,
    },
    ReplySlot {
        name: "messages[0].message",
        read: first_message,
    },
];

/// `outputs[0].outputs[0]`, if both levels are present and non-empty.
pub fn first_run_output(envelope: &Value) -> Option<&Value> {
    envelope.pointer("/outputs/0/outputs/0")
}

/// Returns the reply and the slot it came from.
pub fn extract_reply_with_slot(envelope: &Value) -> Option<(&'static str, String)> {
    let output = first_run_output(envelope)?;
    REPLY_SLOTS.iter().find_map(|slot| {
        (slot.read)(output)
            .filter(|text| !text.trim().is_empty())
            .map(|text| (slot.name, text.to_string()))
    })
}

pub fn extract_reply(envelope: &Value) -> Option<String> {
    extract_reply_with_slot(envelope).map(|(_, reply)| reply)
}
