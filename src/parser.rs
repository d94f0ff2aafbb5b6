// Classifier for the HTML document the package manager returns from
// `?cmd=install`. The body is a progress log: one span per touched node,
// error entries marked with class "E", and a closing status sentence.

use regex::Regex;
use std::sync::OnceLock;

const WITH_ERRORS_MARKERS: [&str; 2] = [
    "Package imported (with errors",
    "Package installed with errors",
];
const SUCCESS_MARKER: &str = "Package installed";

/// Outcome of an install command as reported by the package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    Success,
    SuccessWithErrors,
    Fail,
}

/// Status plus the error entries found in the response, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub status: InstallStatus,
    pub errors: Vec<String>,
}

fn error_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<span class="E"><b>E</b>&nbsp;(.*?)</span>"#)
            .expect("error span pattern is valid")
    })
}

/// Classify an install response body.
pub fn classify(html: &str) -> ParsedResponse {
    let errors = error_span()
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str()).trim().to_string())
        .filter(|msg| !msg.is_empty())
        .collect();

    ParsedResponse {
        status: status_of(html),
        errors,
    }
}

fn status_of(html: &str) -> InstallStatus {
    if WITH_ERRORS_MARKERS.iter().any(|m| html.contains(m)) {
        InstallStatus::SuccessWithErrors
    } else if html.contains(SUCCESS_MARKER) {
        InstallStatus::Success
    } else {
        InstallStatus::Fail
    }
}

// `&amp;` goes last so that an escaped entity such as `&amp;lt;` stays literal.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
