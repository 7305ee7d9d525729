//! Executability classifier
//!
//! Decides whether an assistant message describes a runnable HTTP call, and so
//! whether the Manual / Automatic choice is offered for it.

use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::synth::synthesize;
use crate::models::{KeyValue, RequestDraft};

static HTTP_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("http url regex"));

static BEARER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)bearer\s+[a-z0-9._-]+").expect("bearer regex"));

static LABELED_JSON_BODY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Request\s*Body|Body|Payload|JSON\s*Body)[^\n]*\n(?s:.)*?\{(?s:.)*?\}")
        .expect("labeled json body regex")
});

const CREDENTIAL_HEADERS: [&str; 4] = ["authorization", "x-api-key", "api-key", "apikey"];

/// Individual checks behind an executability decision
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    pub has_url: bool,
    pub has_method: bool,
    pub has_headers: bool,
    pub has_credential: bool,
    pub has_body: bool,
}

impl Verdict {
    pub fn is_executable(&self) -> bool {
        self.has_url && self.has_method && self.has_headers && self.has_credential && self.has_body
    }
}

/// Whether the document describes a runnable request.
///
/// Any panic inside the extraction pipeline counts as "not executable".
pub fn is_executable(document: &str) -> bool {
    if document.trim().is_empty() {
        return false;
    }

    match panic::catch_unwind(AssertUnwindSafe(|| assess(document))) {
        Ok(verdict) => {
            tracing::debug!(?verdict, "classified assistant message");
            verdict.is_executable()
        }
        Err(_) => {
            tracing::warn!("extraction panicked, treating message as not executable");
            false
        }
    }
}

/// Run the synthesizer and evaluate each requirement
pub fn assess(document: &str) -> Verdict {
    let draft = synthesize(document);
    assess_draft(document, &draft)
}

pub fn assess_draft(document: &str, draft: &RequestDraft) -> Verdict {
    Verdict {
        has_url: HTTP_URL_RE.is_match(&draft.url),
        // Always one of the seven verbs once parsed into `HttpMethod`
        has_method: true,
        has_headers: draft.headers.iter().any(|h| !h.key.trim().is_empty()),
        has_credential: draft.headers.iter().any(is_credential),
        has_body: has_body(document, draft),
    }
}

fn is_credential(header: &KeyValue) -> bool {
    let key = header.key.to_lowercase();
    CREDENTIAL_HEADERS.contains(&key.as_str()) || BEARER_RE.is_match(&header.value)
}

/// Permissive: a labeled brace block, or any `{…}` at all, also counts.
/// The last check over-triggers on documents carrying unrelated JSON examples.
fn has_body(document: &str, draft: &RequestDraft) -> bool {
    if !draft.body.trim().is_empty() || LABELED_JSON_BODY_RE.is_match(document) {
        return true;
    }
    document
        .find('{')
        .is_some_and(|open| document[open..].contains('}'))
}
