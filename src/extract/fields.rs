//! Field extractors - method, URL, query parameters, headers and body
//!
//! Each field is recovered by an ordered list of small heuristics, each a pure
//! function over one text scope. The first heuristic that yields a value wins.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::sections::mask_prerequisites;
use crate::models::{HttpMethod, KeyValue};

static LABELED_METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Method|HTTP\s*Method)\s*[:=]\s*(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS)\b")
        .expect("labeled method regex")
});

static LABELED_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:URL|Endpoint|Request\s*URL|API\s*URL)\s*[:=]\s*(https?://\S+)")
        .expect("labeled url regex")
});

static VERB_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS)\b\s+(https?://[^\s"'()`<>]+)"#)
        .expect("verb url regex")
});

static BARE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s)"']+"#).expect("bare url regex"));

static PARAMS_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Query\s*Params?|Parameters?)[:\n]+").expect("params label regex")
});

static PARAMS_CUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n(?:Headers?|Body|Request|Response)\b|\n\n").expect("params cut regex")
});

static PARAM_EQ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_.-]+)\s*=\s*(.+)$").expect("param = regex"));

static PARAM_COLON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_.-]+)\s*:\s*(.+)$").expect("param : regex"));

static HEADERS_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Headers?|Request Headers?)[:\n]+").expect("headers label regex")
});

static HEADERS_CUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n(?:Query\s*Params?|Parameters?|Body|Request|Response)\b|\n\n")
        .expect("headers cut regex")
});

static HEADER_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:-\s*)?([A-Za-z0-9-]+)\s*[:=]\s*(.+)$").expect("header line regex")
});

static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(?:json)?\n(.*?)```").expect("fence regex"));

static BODY_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Body|Request\s*Body|Payload|Request\s*Payload|Data|JSON\s*Body)\b")
        .expect("body keyword regex")
});

static BODY_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Body|Request\s*Body|Payload|Request\s*Payload|Data|JSON\s*Body)[:\s]*\n")
        .expect("body label regex")
});

static RESPONSE_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\n(?:Response|Sample\s*Response|\w+\s*Response)\b")
        .expect("response heading regex")
});

/// How far past a params/headers label the row block may reach
const LABELED_BLOCK_CHARS: usize = 400;
/// How far past a body label the body may reach
const BODY_SECTION_CHARS: usize = 4000;
/// How much text before a fence is searched for a body keyword
const BODY_CONTEXT_CHARS: usize = 220;
/// Upper bound for a brace-delimited inline body
const MAX_INLINE_BODY_CHARS: usize = 10_000;

/// The text views extraction runs over
#[derive(Clone, Debug)]
pub struct Scopes<'a> {
    /// Preferred scope: a single section, or the whole document
    pub primary: &'a str,
    /// The whole document with prerequisite blocks elided
    pub masked: Cow<'a, str>,
    /// The whole document, untouched
    pub full: &'a str,
}

impl<'a> Scopes<'a> {
    pub fn new(primary: &'a str, full: &'a str) -> Self {
        Scopes {
            primary,
            masked: mask_prerequisites(full),
            full,
        }
    }

    /// Primary, then masked, then full
    fn ordered(&self) -> [&str; 3] {
        [self.primary, self.masked.as_ref(), self.full]
    }
}

/// A URL together with the verb it was written next to, if any
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlHit {
    pub url: String,
    pub method: Option<HttpMethod>,
}

/// Run heuristics in order, returning the first value produced
fn first_hit<T>(field: &str, steps: &[(&str, &dyn Fn() -> Option<T>)]) -> Option<T> {
    for (name, step) in steps {
        if let Some(value) = step() {
            tracing::trace!(field, step = name, "extractor hit");
            return Some(value);
        }
    }
    tracing::trace!(field, "no extractor hit");
    None
}

// ========================
// Method
// ========================

/// `Method: POST`, `HTTP Method = get`, or the verb on the line after the label
pub fn labeled_method(scope: &str) -> Option<HttpMethod> {
    LABELED_METHOD_RE
        .captures(scope)
        .and_then(|caps| caps.get(1))
        .and_then(|m| HttpMethod::parse(m.as_str()))
}

/// Explicitly labeled method, primary scope first
pub fn extract_method(scopes: &Scopes<'_>) -> Option<HttpMethod> {
    first_hit(
        "method",
        &[
            ("labeled/primary", &|| labeled_method(scopes.primary)),
            ("labeled/full", &|| labeled_method(scopes.full)),
        ],
    )
}

// ========================
// URL
// ========================

/// `URL: https://…` (also Endpoint / Request URL / API URL), same or next line
pub fn labeled_url(scope: &str) -> Option<String> {
    LABELED_URL_RE
        .captures(scope)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `POST https://…`
pub fn verb_url(scope: &str) -> Option<(HttpMethod, String)> {
    let caps = VERB_URL_RE.captures(scope)?;
    let method = HttpMethod::parse(caps.get(1)?.as_str())?;
    Some((method, caps.get(2)?.as_str().to_string()))
}

/// First bare `http(s)://` token
pub fn bare_url(scope: &str) -> Option<String> {
    BARE_URL_RE.find(scope).map(|m| m.as_str().to_string())
}

fn url_steps<'s>(scope: &'s str) -> [Box<dyn Fn() -> Option<UrlHit> + 's>; 3] {
    [
        Box::new(move || labeled_url(scope).map(|url| UrlHit { url, method: None })),
        Box::new(move || {
            verb_url(scope).map(|(method, url)| UrlHit {
                url,
                method: Some(method),
            })
        }),
        Box::new(move || bare_url(scope).map(|url| UrlHit { url, method: None })),
    ]
}

/// Labeled URL, then verb + URL, then any URL.
///
/// Within each strategy the primary scope is searched before the masked
/// document. The unmasked document is only consulted once every strategy has
/// failed on both.
pub fn extract_url(scopes: &Scopes<'_>) -> Option<UrlHit> {
    let primary = url_steps(scopes.primary);
    let masked = url_steps(scopes.masked.as_ref());
    let full = url_steps(scopes.full);

    first_hit(
        "url",
        &[
            ("labeled/primary", &*primary[0]),
            ("labeled/masked", &*masked[0]),
            ("verb/primary", &*primary[1]),
            ("verb/masked", &*masked[1]),
            ("bare/primary", &*primary[2]),
            ("bare/masked", &*masked[2]),
            ("labeled/full", &*full[0]),
            ("verb/full", &*full[1]),
            ("bare/full", &*full[2]),
        ],
    )
}

// ========================
// Query parameters & headers
// ========================

/// Text following a label, bounded in length and cut at the next label or blank line
fn labeled_block<'s>(scope: &'s str, label: &Regex, cut: &Regex) -> Option<&'s str> {
    let start = label.find(scope)?.end();
    let block = take_chars(&scope[start..], LABELED_BLOCK_CHARS);
    Some(match cut.find(block) {
        Some(m) => &block[..m.start()],
        None => block,
    })
}

fn param_rows(block: &str) -> Vec<KeyValue> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            PARAM_EQ_RE
                .captures(line)
                .or_else(|| PARAM_COLON_RE.captures(line))
        })
        .filter_map(|caps| {
            Some(KeyValue::new(
                caps.get(1)?.as_str().trim(),
                caps.get(2)?.as_str().trim(),
            ))
        })
        .collect()
}

/// Rows under a `Query Params` / `Parameters` label
pub fn labeled_params(scope: &str) -> Option<Vec<KeyValue>> {
    labeled_block(scope, &PARAMS_LABEL_RE, &PARAMS_CUT_RE).map(param_rows)
}

/// `?key=value` pairs of a URL, percent-decoded
pub fn url_query_pairs(url: &str) -> Vec<KeyValue> {
    let Some(query) = url.split('?').nth(1) else {
        return Vec::new();
    };
    let query = query.split('#').next().unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| KeyValue::new(k.into_owned(), v.into_owned()))
        .collect()
}

/// Labeled rows (primary scope first), supplemented by the URL's own query.
/// Always returns at least one row.
pub fn extract_params(scopes: &Scopes<'_>, url: &str) -> Vec<KeyValue> {
    let mut params = first_hit::<Vec<KeyValue>>(
        "params",
        &[
            ("labeled/primary", &|| labeled_params(scopes.primary)),
            ("labeled/full", &|| labeled_params(scopes.full)),
        ],
    )
    .unwrap_or_default();

    for pair in url_query_pairs(url) {
        if !params.iter().any(|p| p.key == pair.key) {
            params.push(pair);
        }
    }

    if params.is_empty() {
        params.push(KeyValue::empty());
    }
    params
}

/// Rows under a `Headers` / `Request Headers` label
pub fn labeled_headers(scope: &str) -> Option<Vec<KeyValue>> {
    let block = labeled_block(scope, &HEADERS_LABEL_RE, &HEADERS_CUT_RE)?;
    Some(
        block
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| HEADER_LINE_RE.captures(line))
            .filter_map(|caps| {
                Some(KeyValue::new(
                    caps.get(1)?.as_str().trim(),
                    caps.get(2)?.as_str().trim(),
                ))
            })
            .collect(),
    )
}

/// Labeled header rows, skipping keys already claimed by a query parameter.
/// Always returns at least one row.
pub fn extract_headers(scopes: &Scopes<'_>, params: &[KeyValue]) -> Vec<KeyValue> {
    let mut headers: Vec<KeyValue> = first_hit::<Vec<KeyValue>>(
        "headers",
        &[
            ("labeled/primary", &|| labeled_headers(scopes.primary)),
            ("labeled/full", &|| labeled_headers(scopes.full)),
        ],
    )
    .unwrap_or_default()
    .into_iter()
    .filter(|h| !params.iter().any(|p| p.key == h.key))
    .collect();

    if headers.is_empty() {
        headers.push(KeyValue::empty());
    }
    headers
}

// ========================
// Body
// ========================

/// Everything before the first `Response` heading
pub fn before_response(scope: &str) -> &str {
    match RESPONSE_HEADING_RE.find(scope) {
        Some(m) if m.start() > 0 => &scope[..m.start()],
        _ => scope,
    }
}

/// A fenced block whose preceding text mentions a body keyword
pub fn keyword_fence(scope: &str) -> Option<String> {
    FENCE_RE.captures_iter(scope).find_map(|caps| {
        let fence = caps.get(0)?;
        let context = last_chars(&scope[..fence.start()], BODY_CONTEXT_CHARS);
        if BODY_KEYWORD_RE.is_match(context) {
            caps.get(1).map(|inner| inner.as_str().trim().to_string())
        } else {
            None
        }
    })
}

/// The block under a body label: its first fence, else its outermost `{…}` run
pub fn labeled_body(scope: &str) -> Option<String> {
    let start = BODY_LABEL_RE.find(scope)?.end();
    let section = take_chars(&scope[start..], BODY_SECTION_CHARS);

    if let Some(inner) = first_fence(section) {
        return Some(inner);
    }

    let open = section.find('{')?;
    let close = section.rfind('}')?;
    if close < open {
        return None;
    }
    let inline = &section[open..=close];
    (inline.chars().count() < MAX_INLINE_BODY_CHARS).then(|| inline.to_string())
}

/// Contents of the first fenced block, trimmed
pub fn first_fence(scope: &str) -> Option<String> {
    FENCE_RE
        .captures(scope)
        .and_then(|caps| caps.get(1))
        .map(|inner| inner.as_str().trim().to_string())
}

/// Keyword-adjacent fence, then labeled body section, each over the primary
/// scope before the document; mutating verbs finally accept any fence.
pub fn extract_body(scopes: &Scopes<'_>, method: HttpMethod) -> Option<String> {
    let [primary, masked, full] = scopes.ordered().map(before_response);

    let found = first_hit(
        "body",
        &[
            ("fence/primary", &|| non_empty(keyword_fence(primary))),
            ("label/primary", &|| non_empty(labeled_body(primary))),
            ("fence/masked", &|| non_empty(keyword_fence(masked))),
            ("label/masked", &|| non_empty(labeled_body(masked))),
            ("fence/full", &|| non_empty(keyword_fence(full))),
            ("label/full", &|| non_empty(labeled_body(full))),
        ],
    );

    if found.is_some() || !method.has_body() {
        return found;
    }

    first_hit(
        "body-fallback",
        &[
            ("any-fence/primary", &|| non_empty(first_fence(primary))),
            ("any-fence/masked", &|| non_empty(first_fence(masked))),
            ("any-fence/full", &|| non_empty(first_fence(full))),
        ],
    )
}

/// An empty match counts as no match, so the next step still runs
fn non_empty(body: Option<String>) -> Option<String> {
    body.filter(|body| !body.is_empty())
}

// ========================
// char-boundary helpers
// ========================

/// At most `n` leading characters
fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// At most `n` trailing characters
fn last_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
