//! Rendering of the key-status body for stdout.
//!
//! The default view re-serializes the response with 2-space indentation and
//! keeps the key order the server sent. Anything outside printable ASCII
//! is written as `\uXXXX` (surrogate pairs above the BMP), so the bytes on
//! stdout are plain ASCII. `render_summary` is the compact human view behind
//! `--summary`.

use crate::types::KeyStatus;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::Value;
use std::fmt::Write as _;
use std::io::{self, Write};

/// Two-space pretty printer that escapes every char above `~`.
struct AsciiPretty<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiPretty<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.begin_array(w)
    }

    fn end_array<W: ?Sized + Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.end_array(w)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, w: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_array_value(w, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.end_array_value(w)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.begin_object(w)
    }

    fn end_object<W: ?Sized + Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.end_object(w)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, w: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_object_key(w, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.begin_object_value(w)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.end_object_value(w)
    }

    // Quotes, backslashes and control chars never reach here; serde_json
    // escapes them through `write_char_escape`.
    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        w: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch <= '~' {
                continue;
            }
            w.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(w, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        w.write_all(fragment[start..].as_bytes())
    }
}

pub fn render_json(value: &Value) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = AsciiPretty(PrettyFormatter::with_indent(b"  "));
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf)
        .map_err(|e| serde_json::Error::io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

pub fn write_json<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    let text = render_json(value)?;
    writeln!(out, "{}", text)?;
    out.flush()
}

pub fn write_summary<W: Write>(out: &mut W, status: &KeyStatus) -> io::Result<()> {
    out.write_all(render_summary(status).as_bytes())?;
    out.flush()
}

pub fn render_summary(status: &KeyStatus) -> String {
    let info = &status.data;
    let mut s = String::new();
    let _ = writeln!(s, "label: {}", info.label.as_deref().unwrap_or("-"));
    let _ = writeln!(s, "usage: {}", fmt_amount(info.usage.or(Some(0.0))));
    let _ = writeln!(s, "limit: {}", fmt_amount(info.limit));
    let _ = writeln!(s, "remaining: {}", fmt_amount(info.remaining()));
    let free = match info.is_free_tier {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unknown",
    };
    let _ = writeln!(s, "free tier: {}", free);
    if let Some(rl) = &info.rate_limit {
        let requests = rl
            .requests
            .map(|r| r.to_string())
            .unwrap_or_else(|| "?".into());
        let interval = rl.interval.as_deref().unwrap_or("?");
        let _ = writeln!(s, "rate limit: {} requests / {}", requests, interval);
    }
    s
}

fn fmt_amount(v: Option<f64>) -> String {
    match v {
        // Six decimals hides subtraction noise like 0.09999999999999998.
        Some(x) => ((x * 1e6).round() / 1e6).to_string(),
        None => "unlimited".to_string(),
    }
}
