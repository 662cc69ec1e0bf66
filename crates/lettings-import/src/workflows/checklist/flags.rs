use super::mapping::kind_for_label;
use crate::workflows::property_list::domain::ChecklistItemKind;
use crate::workflows::property_list::normalizer::sanitize_field;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A checklist line found on a page, e.g. `GAS SAFETY: YES REF GS-114`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistFlag {
    pub kind: ChecklistItemKind,
    pub completed: bool,
    pub document_ref: Option<String>,
}

fn flag_line_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?P<label>[a-z][a-z0-9/&_ -]*?)\s*(?::|\s)\s*(?P<flag>yes|no|y|n|done|received|completed?|pending|outstanding|true|false|✓|✔|✗|✘)(?:\s+(?P<rest>.*?))?\s*$",
        )
        .expect("checklist line pattern compiles")
    })
}

fn document_ref_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:ref(?:erence)?|doc(?:ument)?)\b[\s.:#]*([a-z0-9][a-z0-9/_.\-]*)")
            .expect("document ref pattern compiles")
    })
}

/// Interpret a yes/no style completion marker.
pub(crate) fn parse_completion(flag: &str) -> Option<bool> {
    match flag.trim().to_lowercase().as_str() {
        "yes" | "y" | "done" | "received" | "complete" | "completed" | "true" | "✓" | "✔" => {
            Some(true)
        }
        "no" | "n" | "pending" | "outstanding" | "false" | "✗" | "✘" => Some(false),
        _ => None,
    }
}

/// Scan a page line by line for recognized checklist labels with a completion
/// marker. The first line for a given item wins.
pub(crate) fn checklist_flags(text: &str) -> Vec<ChecklistFlag> {
    let mut flags: Vec<ChecklistFlag> = Vec::new();

    for line in text.lines() {
        let Some(captures) = flag_line_pattern().captures(line) else {
            continue;
        };
        let Some(kind) = kind_for_label(&captures["label"]) else {
            continue;
        };
        if flags.iter().any(|flag| flag.kind == kind) {
            continue;
        }
        let Some(completed) = parse_completion(&captures["flag"]) else {
            continue;
        };

        let document_ref = captures
            .name("rest")
            .and_then(|rest| document_ref_pattern().captures(rest.as_str()))
            .and_then(|doc| sanitize_field(&doc[1]));

        flags.push(ChecklistFlag {
            kind,
            completed,
            document_ref,
        });
    }

    flags
}
