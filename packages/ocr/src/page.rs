//! Page splitting.
//!
//! OCR output wraps every page in a pair of delimiter lines such as
//! `==Start of OCR for page 3==` / `==End of OCR for page 3==`. The page
//! number inside the marker is informational only; pages are emitted in
//! the order they appear.

use regex::Regex;

use crate::OcrError;

/// Placeholder for the page number inside a marker template.
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// One page of OCR text with its markers stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// 1-based position of the page in the source text.
    pub index: u32,
    /// Page number printed inside the start marker, if it parsed.
    pub printed_number: Option<u32>,
    pub text: String,
}

/// Splits an OCR stream into pages using start/end marker templates.
#[derive(Debug, Clone)]
pub struct PageSplitter {
    start: Regex,
    end: Regex,
}

impl PageSplitter {
    /// Compiles the two marker templates.
    ///
    /// Each template must contain [`PAGE_PLACEHOLDER`] exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`OcrError::MarkerTemplate`] if a template lacks the
    /// placeholder, or [`OcrError::Regex`] if it fails to compile.
    pub fn new(start_template: &str, end_template: &str) -> Result<Self, OcrError> {
        Ok(Self {
            start: compile_marker(start_template)?,
            end: compile_marker(end_template)?,
        })
    }

    /// Splits `text` into pages.
    ///
    /// A page body ends at the first end marker after its start marker. A
    /// missing end marker is tolerated: the body then runs to the next start
    /// marker or to the end of the text. Text with no start marker at all
    /// yields no pages.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<RawPage> {
        let starts: Vec<_> = self.start.captures_iter(text).collect();
        let mut pages = Vec::with_capacity(starts.len());

        for (i, caps) in starts.iter().enumerate() {
            let Some(marker) = caps.get(0) else {
                continue;
            };
            let body_start = marker.end();
            let next_start = starts
                .get(i + 1)
                .and_then(|c| c.get(0))
                .map_or(text.len(), |m| m.start());

            let body_end = self
                .end
                .find_at(text, body_start)
                .map_or(next_start, |m| m.start().min(next_start));

            let printed_number = caps.get(1).and_then(|m| m.as_str().parse().ok());

            pages.push(RawPage {
                index: u32::try_from(i + 1).unwrap_or(u32::MAX),
                printed_number,
                text: text[body_start..body_end].to_owned(),
            });
        }

        log::debug!("Split OCR text into {} page(s)", pages.len());

        pages
    }
}

fn compile_marker(template: &str) -> Result<Regex, OcrError> {
    let Some((before, after)) = template.split_once(PAGE_PLACEHOLDER) else {
        return Err(OcrError::MarkerTemplate(format!(
            "marker {template:?} does not contain {PAGE_PLACEHOLDER}"
        )));
    };
    if after.contains(PAGE_PLACEHOLDER) {
        return Err(OcrError::MarkerTemplate(format!(
            "marker {template:?} contains {PAGE_PLACEHOLDER} more than once"
        )));
    }

    let pattern = format!(
        r"{}\s*(\d+)\s*{}",
        regex::escape(before.trim_end()),
        regex::escape(after.trim_start())
    );
    Ok(Regex::new(&pattern)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter() -> PageSplitter {
        PageSplitter::new(
            "==Start of OCR for page {page}==",
            "==End of OCR for page {page}==",
        )
        .unwrap()
    }

    #[test]
    fn splits_pages_and_strips_markers() {
        let text = "==Start of OCR for page 1==\nfirst\n==End of OCR for page 1==\n\
                    ==Start of OCR for page 2==\nsecond\n==End of OCR for page 2==\n";
        let pages = splitter().split(text);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].index, 1);
        assert_eq!(pages[0].text.trim(), "first");
        assert_eq!(pages[1].index, 2);
        assert_eq!(pages[1].text.trim(), "second");
        assert!(!pages[1].text.contains("=="));
    }

    #[test]
    fn no_markers_means_no_pages() {
        assert!(splitter().split("Manufacturer: Genie\nModel: GS-3246\n").is_empty());
        assert!(splitter().split("").is_empty());
    }

    #[test]
    fn order_follows_appearance_not_printed_number() {
        let text = "==Start of OCR for page 7==\nseven\n==End of OCR for page 7==\n\
                    ==Start of OCR for page 2==\ntwo\n==End of OCR for page 2==\n";
        let pages = splitter().split(text);

        assert_eq!(pages[0].index, 1);
        assert_eq!(pages[0].printed_number, Some(7));
        assert_eq!(pages[0].text.trim(), "seven");
        assert_eq!(pages[1].index, 2);
        assert_eq!(pages[1].printed_number, Some(2));
    }

    #[test]
    fn missing_end_marker_runs_to_next_start() {
        let text = "==Start of OCR for page 1==\nfirst\n\
                    ==Start of OCR for page 2==\nsecond\n";
        let pages = splitter().split(text);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].text.trim(), "first");
        assert_eq!(pages[1].text.trim(), "second");
    }

    #[test]
    fn tolerates_spacing_around_page_number() {
        let text = "==Start of OCR for page  12 ==\nbody\n==End of OCR for page 12==";
        let pages = splitter().split(text);

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].printed_number, Some(12));
        assert_eq!(pages[0].text.trim(), "body");
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let err = PageSplitter::new("==Start==", "==End of OCR for page {page}==").unwrap_err();
        assert!(matches!(err, OcrError::MarkerTemplate(_)));
    }
}
