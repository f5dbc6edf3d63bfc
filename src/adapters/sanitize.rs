//! Log sanitization for patient identifiers and clinical values.
//!
//! Applied to every formatted log line through [`SanitizingMakeWriter`]:
//! - Patient/record identifiers (UUIDs, MRNs)
//! - Contact details (emails, phone numbers)
//! - Raw feature vectors (`features=[...]`)
//! - Clinical record dumps (`record={...}`)
//!
//! The primary rule is still that clinical values never reach a logging
//! call; this is the fallback when one slips through.
//!
//! # Performance
//!
//! Each line is capped at a byte limit (16 KiB by default, configured via
//! `AppConfig::sanitize_max_bytes`) and cut output is marked `[TRUNCATED]`.
//! A cut line keeps its trailing newline.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

/// Per-line cap used when no limit is configured.
pub const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Pattern {
    regex: Regex,
    replacement: &'static str,
}

struct Patterns {
    set: RegexSet,
    rules: Vec<Pattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn get_patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Feature vectors and record dumps first: they may contain digits
            // the narrower patterns below would otherwise chew on.
            (r"(?i)\bfeatures\s*[:=]\s*\[[^\]]*\]", "features=[REDACTED-FEATURES]"),
            (r"(?i)\brecord\s*[:=]\s*\{[^}]*\}", "record={REDACTED-RECORD}"),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (r"(?i)\bMRN[:\s#]?\s?\d{6,10}\b", "[REDACTED-MRN]"),
            (
                concat!(
                    r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?",
                    r"@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                ),
                "[REDACTED-EMAIL]",
            ),
            (
                r"\b(?:\+?\d{1,3}[-.\s]?)?\(?[0-9]{3}\)?[-.\s][0-9]{3}[-.\s][0-9]{4}\b",
                "[REDACTED-PHONE]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| Pattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        Patterns { set, rules }
    })
}

/// Sanitize a string by replacing identifiers and clinical values,
/// keeping at most `max_bytes` of it.
#[must_use]
pub fn sanitize(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (body, newline) = match input.strip_suffix('\n') {
        Some(body) => (body, true),
        None => (input, false),
    };
    let (prefix, truncated) = truncate_to_char_boundary(body, max_bytes);

    let mut result = prefix.to_string();
    // Single scan to find which rules apply, then rewrite in rule order.
    for idx in patterns.set.matches(prefix).into_iter() {
        let pattern = &patterns.rules[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    if newline {
        result.push('\n');
    }
    result
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log output
/// before it reaches the underlying sink.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
    max_bytes: usize,
}

impl<M> SanitizingMakeWriter<M> {
    /// Wrap `inner`, capping each sanitized line at `max_bytes`.
    #[must_use]
    pub fn new(inner: M, max_bytes: usize) -> Self {
        Self {
            inner,
            max_bytes: max_bytes.max(1),
        }
    }
}

impl<M> Clone for SanitizingMakeWriter<M>
where
    M: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            max_bytes: self.max_bytes,
        }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W, max_bytes: usize) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            max_bytes,
        }
    }

    fn sanitize_bytes(&self, bytes: &[u8]) -> String {
        sanitize(&String::from_utf8_lossy(bytes), self.max_bytes)
    }
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let sanitized = self.sanitize_bytes(&line);
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.flush_lines()?;

        // An unterminated line longer than twice the cap is flushed early (truncated).
        if self.buffer.len() > self.max_bytes.saturating_mul(2) {
            let sanitized = self.sanitize_bytes(&self.buffer);
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n")?;
            self.buffer.clear();
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let sanitized = self.sanitize_bytes(&self.buffer);
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }

        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer(), self.max_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scrub(input: &str) -> String {
        sanitize(input, DEFAULT_SANITIZE_MAX_BYTES)
    }

    #[test]
    fn test_sanitize_feature_vector() {
        let input = "encoded features=[45.0, 0.0, 3.0, 12.5] for submission";
        let sanitized = scrub(input);
        assert!(sanitized.contains("features=[REDACTED-FEATURES]"));
        assert!(!sanitized.contains("12.5"));
        assert!(sanitized.ends_with("for submission"));
    }

    #[test]
    fn test_sanitize_record_dump() {
        let input = r#"record={"age":45,"gender":0} assembled"#;
        let sanitized = scrub(input);
        assert!(sanitized.contains("record={REDACTED-RECORD}"));
        assert!(!sanitized.contains("\"age\""));
    }

    #[test]
    fn test_sanitize_uuid() {
        let input = "Submission 550e8400-e29b-41d4-a716-446655440000 processed";
        let sanitized = scrub(input);
        assert!(sanitized.contains("[REDACTED-UUID]"));
        assert!(!sanitized.contains("550e8400"));
    }

    #[test]
    fn test_sanitize_mrn_and_email() {
        let sanitized = scrub("MRN:12345678 contact patient@hospital.com");
        assert!(sanitized.contains("[REDACTED-MRN]"));
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
    }

    #[test]
    fn test_sanitize_phone() {
        let sanitized = scrub("call 555-123-4567 back");
        assert!(sanitized.contains("[REDACTED-PHONE]"));
    }

    #[test]
    fn test_plain_text_untouched() {
        let input = "Loaded random forest model from \"models/model.json\"";
        assert_eq!(scrub(input), input);
        assert_eq!(scrub("done\n"), "done\n");
    }

    #[test]
    fn test_sanitize_truncates_large_inputs() {
        let sanitized = sanitize("prefix features=[1.0, 2.0] suffix", 10);
        assert!(sanitized.ends_with("[TRUNCATED]"));
        assert!(sanitized.starts_with("prefix fea"));
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut writer = SanitizingWriter::new(Vec::new(), DEFAULT_SANITIZE_MAX_BYTES);
        writer.write_all(b"a features=[1.0]\nb ok\n").unwrap();
        writer.flush().unwrap();
        let out = String::from_utf8(writer.inner).unwrap();
        assert_eq!(out, "a features=[REDACTED-FEATURES]\nb ok\n");
    }

    #[test]
    fn test_writer_truncated_line_keeps_newline() {
        let mut writer = SanitizingWriter::new(Vec::new(), 16);
        writer.write_all(b"first line that is long\nsecond\n").unwrap();
        writer.flush().unwrap();
        let out = String::from_utf8(writer.inner).unwrap();
        assert_eq!(out, "first line that  [TRUNCATED]\nsecond\n");
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_writer_flushes_oversized_partial_line() {
        let mut writer = SanitizingWriter::new(Vec::new(), 4);
        writer.write_all(b"ok\nabcdefghij").unwrap();
        let out = String::from_utf8(writer.inner.clone()).unwrap();
        assert_eq!(out, "ok\nabcd [TRUNCATED]\n");
        assert!(writer.buffer.is_empty());
    }

    #[test]
    fn test_make_writer_carries_limit() {
        let make = SanitizingMakeWriter::new(Vec::<u8>::new, 32);
        assert_eq!(make.clone().make_writer().max_bytes, 32);
        assert_eq!(SanitizingMakeWriter::new(Vec::<u8>::new, 0).max_bytes, 1);
    }
}
