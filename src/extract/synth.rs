//! Request synthesizer - composes the field extractors into a `RequestDraft`

use crate::extract::decode::normalize_value;
use crate::extract::fields::{
    extract_body, extract_headers, extract_method, extract_params, extract_url, Scopes,
};
use crate::extract::sections::{find_headings, find_section, is_prerequisite_title};
use crate::models::{HttpMethod, KeyValue, RequestDraft};

/// Synthesize a request from a whole document.
///
/// The first section whose heading mentions "create" is the primary scope;
/// without one the whole document is. The first prerequisites/requirements
/// section, if any, is returned as `prerequisites`.
pub fn synthesize(document: &str) -> RequestDraft {
    let headings = find_headings(document);

    let primary = find_section(document, &headings, |title| {
        title.to_lowercase().contains("create")
    })
    .map(|section| section.text)
    .unwrap_or(document);

    let prerequisites = find_section(document, &headings, is_prerequisite_title)
        .map(|section| section.text.trim())
        .unwrap_or_default();

    synthesize_scoped(primary, document, prerequisites)
}

/// Synthesize from an already-isolated primary scope, falling back to `full`
pub fn synthesize_scoped(primary: &str, full: &str, prerequisites: &str) -> RequestDraft {
    let scopes = Scopes::new(primary, full);

    let labeled_method = extract_method(&scopes);
    let url_hit = extract_url(&scopes);

    let method = labeled_method
        .or_else(|| url_hit.as_ref().and_then(|hit| hit.method))
        .unwrap_or(HttpMethod::GET);
    let raw_url = url_hit.map(|hit| hit.url).unwrap_or_default();

    let query_params = extract_params(&scopes, &raw_url);
    let headers = extract_headers(&scopes, &query_params);
    let body = extract_body(&scopes, method).unwrap_or_default();

    RequestDraft {
        method,
        url: normalize_value(&raw_url),
        headers: normalize_rows(headers),
        query_params: normalize_rows(query_params),
        body: normalize_value(&body),
        prerequisites: prerequisites.to_string(),
    }
}

/// Synthesize for the section whose heading contains `title` (case-insensitive).
///
/// Used for linked documents, where the user picks a heading. Falls back to the
/// first heading when none matches, and to the whole document when there are
/// no headings at all.
pub fn synthesize_for_section(document: &str, title: &str) -> RequestDraft {
    let headings = find_headings(document);
    if headings.is_empty() {
        return synthesize_scoped(document, document, "");
    }

    let wanted = title.to_lowercase();
    let primary = find_section(document, &headings, |t| t.to_lowercase().contains(&wanted))
        .or_else(|| find_section(document, &headings, |_| true))
        .map(|section| section.text)
        .unwrap_or(document);

    synthesize_scoped(primary, document, "")
}

fn normalize_rows(rows: Vec<KeyValue>) -> Vec<KeyValue> {
    rows.into_iter()
        .map(|row| KeyValue {
            key: normalize_value(&row.key),
            value: normalize_value(&row.value),
            enabled: row.enabled,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELED: &str = "Method: POST\nURL: https://api.x.com/items\nHeaders:\nAuthorization: Bearer abc123\nBody:\n```json\n{\"name\":\"a\"}\n```";

    #[test]
    fn test_labeled_request() {
        let draft = synthesize(LABELED);
        assert_eq!(draft.method, HttpMethod::POST);
        assert_eq!(draft.url, "https://api.x.com/items");
        assert_eq!(draft.headers, vec![KeyValue::new("Authorization", "Bearer abc123")]);
        assert_eq!(draft.query_params, vec![KeyValue::empty()]);
        assert_eq!(draft.body, "{\"name\":\"a\"}");
    }

    #[test]
    fn test_prerequisite_urls_are_masked() {
        let doc = "## Prerequisites\nYou need an account at https://example.com\n\n## Create Widget\nSend a request to https://api.real.com/widgets\n";
        let draft = synthesize(doc);
        assert_eq!(draft.url, "https://api.real.com/widgets");
        assert!(draft.prerequisites.starts_with("Prerequisites"));
        assert!(draft.prerequisites.contains("https://example.com"));
    }

    #[test]
    fn test_prerequisite_masking_without_create_section() {
        let doc = "## Prerequisites\nGet a key at https://example.com/keys\n\n## Usage\nGET https://api.real.com/things\n";
        assert_eq!(synthesize(doc).url, "https://api.real.com/things");
    }

    #[test]
    fn test_plain_prose_gives_defaults() {
        let draft = synthesize("Just some friendly prose about nothing.");
        assert_eq!(draft, RequestDraft::default());
    }

    #[test]
    fn test_method_inferred_from_verb_url() {
        let draft = synthesize("Run DELETE https://api.x.com/items/3 to remove it.");
        assert_eq!(draft.method, HttpMethod::DELETE);
        assert_eq!(draft.url, "https://api.x.com/items/3");
    }

    #[test]
    fn test_values_are_decoded() {
        let draft = synthesize("URL: https://api.x.com/items?q=a&amp;b\\u003cc\\u003e");
        assert_eq!(draft.url, "https://api.x.com/items?q=a&b<c>");
    }

    #[test]
    fn test_section_scoped_synthesis() {
        let doc = "# Guide\n## List items\nGET https://api.x.com/items\n## Delete item\nDELETE https://api.x.com/items/1\n";
        let draft = synthesize_for_section(doc, "delete");
        assert_eq!(draft.method, HttpMethod::DELETE);
        assert_eq!(draft.url, "https://api.x.com/items/1");
        assert!(draft.prerequisites.is_empty());

        let fallback = synthesize_for_section(doc, "nonexistent");
        assert_eq!(fallback.url, "https://api.x.com/items");
    }

    #[test]
    fn test_section_scoped_without_headings_uses_document() {
        let draft = synthesize_for_section("PUT https://api.x.com/a", "anything");
        assert_eq!(draft.method, HttpMethod::PUT);
    }

    #[test]
    fn test_empty_primary_fence_falls_through_to_document_body() {
        let doc = "## Overview\nRequest Body:\n```json\n{\"a\":1}\n```\n## Create item\nPOST https://a.com/items\nBody:\n```json\n```\n";
        let draft = synthesize(doc);
        assert_eq!(draft.method, HttpMethod::POST);
        assert_eq!(draft.body, "{\"a\":1}");
    }

    #[test]
    fn test_url_entities_outside_the_basic_set_are_decoded() {
        let draft = synthesize("URL: https://api.x.com/items?sep=&sect;&amp;q=&times;");
        assert_eq!(draft.url, "https://api.x.com/items?sep=§&q=×");
    }
}
