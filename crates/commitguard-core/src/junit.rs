//! JUnit XML persistence for reports.
//!
//! The layout is one `<testsuites>` root holding a single `<testsuite>`, one
//! `<testcase>` per check and one `<error>`, `<skipped>` or `<failure>` child
//! per recorded result. Statistics attributes are recomputed on every write and
//! ignored on read.

use std::borrow::Cow;

use commitguard_types::{CASE_CLASSNAME, Case, CaseResult, Report, ResultKind, Statistics};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::report::{statistics, upsert_case};

#[derive(Debug, thiserror::Error)]
pub enum JunitError {
    #[error("malformed JUnit XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("no <testsuite> element found")]
    NoSuite,
    #[error("<{element}> is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
}

/// Renders a report as a JUnit XML document.
pub fn render_junit(report: &Report) -> String {
    let stats = statistics(report);
    let mut out = String::new();

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<testsuites{}>\n", stats_attributes(&stats)));

    out.push_str(&format!(
        "  <testsuite name=\"{}\"{}",
        escape_attr(&report.name),
        stats_attributes(&stats)
    ));
    if let Some(ts) = &report.timestamp {
        out.push_str(&format!(" timestamp=\"{}\"", escape_attr(ts)));
    }
    out.push_str(">\n");

    for case in &report.cases {
        out.push_str(&format!(
            "    <testcase classname=\"{}\" name=\"{}\" time=\"{}\"",
            escape_attr(&case.classname),
            escape_attr(&case.name),
            format_seconds(case.duration_ms)
        ));
        if case.results.is_empty() {
            out.push_str("/>\n");
            continue;
        }
        out.push_str(">\n");

        for result in &case.results {
            let element = result.kind.as_str();
            out.push_str(&format!(
                "      <{element} message=\"{}\" type=\"{}\"",
                escape_attr(&result.message),
                escape_attr(&result.category)
            ));
            if result.text.is_empty() {
                out.push_str("/>\n");
            } else {
                out.push_str(&format!(">{}</{element}>\n", escape_text(&result.text)));
            }
        }

        out.push_str("    </testcase>\n");
    }

    out.push_str("  </testsuite>\n");
    out.push_str("</testsuites>\n");
    out
}

/// Parses the first test suite of a JUnit XML document.
///
/// Accepts either a `<testsuites>` root or a bare `<testsuite>` root. Case
/// names are kept unique; a later duplicate replaces an earlier one.
pub fn parse_junit(xml: &str) -> Result<Report, JunitError> {
    let mut reader = Reader::from_str(xml);

    let mut report: Option<Report> = None;
    let mut case: Option<Case> = None;
    let mut result: Option<CaseResult> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"testsuite" if report.is_none() => report = Some(start_suite(&e)?),
                b"testcase" if report.is_some() => case = Some(start_case(&e)?),
                name if case.is_some() => {
                    if let Some(kind) = element_kind(name) {
                        result = Some(start_result(&e, kind)?);
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"testsuite" if report.is_none() => {
                    report = Some(start_suite(&e)?);
                    break;
                }
                b"testcase" => {
                    if let Some(report) = report.as_mut() {
                        upsert_case(report, start_case(&e)?);
                    }
                }
                name => {
                    if let (Some(case), Some(kind)) = (case.as_mut(), element_kind(name)) {
                        case.results.push(start_result(&e, kind)?);
                    }
                }
            },
            Event::Text(t) => {
                if let Some(result) = result.as_mut() {
                    result.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(result) = result.as_mut() {
                    result
                        .text
                        .push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"testsuite" if report.is_some() => break,
                b"testcase" => {
                    if let (Some(report), Some(done)) = (report.as_mut(), case.take()) {
                        upsert_case(report, done);
                    }
                }
                name if element_kind(name).is_some() => {
                    if let (Some(case), Some(done)) = (case.as_mut(), result.take()) {
                        case.results.push(done);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    report.ok_or(JunitError::NoSuite)
}

fn element_kind(name: &[u8]) -> Option<ResultKind> {
    std::str::from_utf8(name)
        .ok()
        .and_then(ResultKind::from_element)
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, JunitError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn start_suite(e: &BytesStart<'_>) -> Result<Report, JunitError> {
    Ok(Report {
        name: attribute(e, "name")?.unwrap_or_default(),
        timestamp: attribute(e, "timestamp")?,
        cases: Vec::new(),
    })
}

fn start_case(e: &BytesStart<'_>) -> Result<Case, JunitError> {
    let name = attribute(e, "name")?.ok_or(JunitError::MissingAttribute {
        element: "testcase",
        attribute: "name",
    })?;
    let mut case = Case::new(name);
    case.classname = attribute(e, "classname")?.unwrap_or_else(|| CASE_CLASSNAME.to_string());
    case.duration_ms = attribute(e, "time")?
        .as_deref()
        .map(parse_seconds)
        .unwrap_or(0);
    Ok(case)
}

fn start_result(e: &BytesStart<'_>, kind: ResultKind) -> Result<CaseResult, JunitError> {
    Ok(CaseResult {
        kind,
        message: attribute(e, "message")?.unwrap_or_default(),
        category: attribute(e, "type")?.unwrap_or_default(),
        text: String::new(),
    })
}

fn stats_attributes(stats: &Statistics) -> String {
    format!(
        " tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"{}\" time=\"{}\"",
        stats.tests,
        stats.failures,
        stats.errors,
        stats.skipped,
        format_seconds(stats.time_ms)
    )
}

fn format_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

fn parse_seconds(s: &str) -> u64 {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| (v * 1000.0).round() as u64)
        .unwrap_or(0)
}

/// Escapes character data.
fn escape_text(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escapes attribute values. Line breaks and tabs are written as character
/// references so they survive attribute-value normalization.
fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    out
}
