//! Section segmenter - splits a document into heading-delimited sections
//!
//! A heading is a line starting (after optional whitespace) with 1-6 `#`
//! markers or a numbered-list leader such as `3. `. A section runs from its
//! heading's title to the line holding the next heading, or to the end of the
//! document.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\n)\s*(?:#{1,6}\s*|\d+\.\s+)([^\n]+)").expect("heading regex")
});

static PREREQ_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:prerequisites|requirements)\b").expect("prerequisite title regex")
});

/// Start of a prerequisites block, with or without a heading marker
static PREREQ_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|\n)\s*(?:#{1,6}\s*|\d+\.\s+)?(?:prerequisites|requirements)\b[^\n]*\n")
        .expect("prerequisite block regex")
});

/// A heading line that closes a masked prerequisites block
static NEXT_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\s*(?:#{1,6}\s*|\d+\.\s+)[^\n]+\n").expect("next heading regex")
});

/// A heading found in a document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    /// Remainder of the heading line, trimmed
    pub title: String,
    /// Byte offset where the title text begins (after the marker)
    pub start: usize,
    /// Byte offset of the line holding the heading; closes the previous section
    pub line_start: usize,
}

/// A heading together with the slice of the document it governs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Section<'a> {
    pub title: &'a str,
    pub text: &'a str,
}

/// Scan for headings in document order. Empty when nothing matches.
pub fn find_headings(document: &str) -> Vec<Heading> {
    HEADING_RE
        .captures_iter(document)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let title = caps.get(1)?;
            let line_start = if whole.as_str().starts_with('\n') {
                whole.start() + 1
            } else {
                whole.start()
            };
            Some(Heading {
                title: title.as_str().trim().to_string(),
                start: title.start(),
                line_start,
            })
        })
        .collect()
}

/// Pair each heading with its text: from the title (marker excluded) up to the
/// start of the next heading's line, so no section carries the next marker
pub fn sections<'a>(document: &'a str, headings: &'a [Heading]) -> Vec<Section<'a>> {
    headings
        .iter()
        .enumerate()
        .map(|(i, heading)| {
            let end = headings
                .get(i + 1)
                .map(|next| next.line_start)
                .unwrap_or(document.len());
            Section {
                title: &heading.title,
                text: &document[heading.start..end],
            }
        })
        .collect()
}

/// First section whose title satisfies `pred`
pub fn find_section<'a>(
    document: &'a str,
    headings: &'a [Heading],
    pred: impl Fn(&str) -> bool,
) -> Option<Section<'a>> {
    sections(document, headings)
        .into_iter()
        .find(|section| pred(section.title))
}

/// Whether a heading title names a prerequisites/requirements section
pub fn is_prerequisite_title(title: &str) -> bool {
    PREREQ_TITLE_RE.is_match(title)
}

/// Elide every prerequisites block from the document.
///
/// Example URLs inside prerequisites must never be taken for the target
/// endpoint, so URL and body searches run on this view first. A block starts
/// at a line naming prerequisites/requirements and ends right before the next
/// heading line (or at the end of the document).
pub fn mask_prerequisites(document: &str) -> Cow<'_, str> {
    let mut masked = String::new();
    let mut copied_up_to = 0;
    let mut search_from = 0;

    while search_from <= document.len() {
        let Some(caps) = PREREQ_BLOCK_RE.captures_at(document, search_from) else {
            break;
        };
        let (Some(whole), Some(lead)) = (caps.get(0), caps.get(1)) else {
            break;
        };

        let body_start = whole.end();
        let block_end = NEXT_HEADING_RE
            .find_at(document, body_start)
            .map(|m| m.start())
            .unwrap_or(document.len());

        masked.push_str(&document[copied_up_to..whole.start()]);
        masked.push_str(lead.as_str());
        copied_up_to = block_end;
        search_from = block_end.max(whole.end());
    }

    if copied_up_to == 0 {
        return Cow::Borrowed(document);
    }
    masked.push_str(&document[copied_up_to..]);
    Cow::Owned(masked)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "Intro text\n## Prerequisites\n- account at https://example.com\n\n## Create Widget\nPOST https://api.real.com/widgets\n1. Verify\nDone";

    #[test]
    fn test_no_headings_in_plain_prose() {
        assert!(find_headings("Just some prose.\nAnd more prose.").is_empty());
    }

    #[test]
    fn test_headings_and_numbered_leaders() {
        let headings = find_headings(DOC);
        let titles: Vec<&str> = headings.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Prerequisites", "Create Widget", "Verify"]);
        assert!(DOC[headings[1].start..].starts_with("Create Widget"));
    }

    #[test]
    fn test_sections_cover_until_next_heading() {
        let headings = find_headings(DOC);
        let secs = sections(DOC, &headings);
        assert_eq!(secs.len(), 3);
        assert!(secs[1].text.starts_with("Create Widget\n"));
        assert!(secs[1].text.contains("https://api.real.com/widgets"));
        assert!(!secs[1].text.contains("Verify"));
        assert_eq!(secs[2].text, "Verify\nDone");
    }

    #[test]
    fn test_section_bounds_exclude_both_markers() {
        let doc = "## Alpha\nbody a\n### Beta\nbody b";
        let headings = find_headings(doc);
        let secs = sections(doc, &headings);
        assert_eq!(secs[0].text, "Alpha\nbody a\n");
        assert_eq!(secs[1].text, "Beta\nbody b");
    }

    #[test]
    fn test_mask_prerequisites_elides_block() {
        let masked = mask_prerequisites(DOC);
        assert!(!masked.contains("example.com"));
        assert!(masked.contains("https://api.real.com/widgets"));
        assert!(masked.starts_with("Intro text\n"));
    }

    #[test]
    fn test_mask_without_prerequisites_borrows() {
        let doc = "## Create\nGET https://a.com";
        assert!(matches!(mask_prerequisites(doc), Cow::Borrowed(_)));
    }

    #[test]
    fn test_mask_runs_to_end_without_following_heading() {
        let doc = "Call https://api.a.com/x\nRequirements:\nsee https://example.com";
        let masked = mask_prerequisites(doc);
        assert_eq!(masked, "Call https://api.a.com/x\n");
    }

    #[test]
    fn test_prerequisite_titles() {
        assert!(is_prerequisite_title("Prerequisites"));
        assert!(is_prerequisite_title("System Requirements"));
        assert!(!is_prerequisite_title("Requirement"));
    }
}
