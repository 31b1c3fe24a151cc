//! Regular-expression driven strings.
//!
//! Patterns are validated with `regex-syntax`; anything it rejects (including
//! JavaScript-only lookarounds and backreferences) is reported as invalid and
//! the caller falls back to plain words. So is a pattern whose shortest match
//! is longer than [`STRING_LENGTH_LIMIT`].

use super::expr::STRING_LENGTH_LIMIT;
use rand::Rng;
use regex_syntax::hir::{Class, Hir, HirKind};

/// Extra repetitions allowed past the minimum of an unbounded quantifier
const UNBOUNDED_EXTRA: u32 = 8;

const JS_FLAGS: &str = "dgimsuyv";

/// Strip a JavaScript literal wrapper (`/abc/i`) if present
fn strip_js_literal(raw: &str) -> &str {
    let Some(body) = raw.strip_prefix('/') else {
        return raw;
    };
    match body.rfind('/') {
        Some(end) if body[end + 1..].chars().all(|c| JS_FLAGS.contains(c)) => &body[..end],
        _ => raw,
    }
}

/// Validate a schema `pattern` and return the source to generate from
pub fn parse_pattern(raw: &str) -> Option<String> {
    let source = strip_js_literal(raw.trim());
    if source.is_empty() {
        return None;
    }
    match regex_syntax::parse(source) {
        Ok(hir) => match hir.properties().minimum_len() {
            Some(len) if len <= STRING_LENGTH_LIMIT => Some(source.to_string()),
            _ => {
                tracing::warn!(pattern = %raw, "pattern cannot match a short enough string; falling back");
                None
            }
        },
        Err(err) => {
            tracing::warn!(pattern = %raw, error = %err, "invalid pattern; falling back to words");
            None
        }
    }
}

/// Produce one string matching `source`.
///
/// Returns `None` if the pattern does not parse or the string would grow past
/// [`STRING_LENGTH_LIMIT`].
pub fn generate_matching<R: Rng + ?Sized>(source: &str, rng: &mut R) -> Option<String> {
    let hir = regex_syntax::parse(source).ok()?;
    let mut out = String::new();
    write_hir(&hir, rng, &mut out);
    (out.len() <= STRING_LENGTH_LIMIT).then_some(out)
}

fn write_hir<R: Rng + ?Sized>(hir: &Hir, rng: &mut R, out: &mut String) {
    if out.len() > STRING_LENGTH_LIMIT {
        return;
    }
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => {}
        HirKind::Literal(lit) => out.push_str(&String::from_utf8_lossy(&lit.0)),
        HirKind::Class(class) => {
            if let Some(c) = pick_from_class(class, rng) {
                out.push(c);
            }
        }
        HirKind::Repetition(rep) => {
            let max = rep.max.unwrap_or(rep.min.saturating_add(UNBOUNDED_EXTRA));
            let count = rng.gen_range(rep.min..=max.max(rep.min));
            for _ in 0..count {
                if out.len() > STRING_LENGTH_LIMIT {
                    break;
                }
                write_hir(&rep.sub, rng, out);
            }
        }
        HirKind::Capture(cap) => write_hir(&cap.sub, rng, out),
        HirKind::Concat(parts) => {
            for part in parts {
                write_hir(part, rng, out);
            }
        }
        HirKind::Alternation(branches) => {
            if !branches.is_empty() {
                let idx = rng.gen_range(0..branches.len());
                write_hir(&branches[idx], rng, out);
            }
        }
    }
}

/// Printable ASCII members of the class are preferred so that `.` and negated
/// classes stay readable.
fn pick_from_class<R: Rng + ?Sized>(class: &Class, rng: &mut R) -> Option<char> {
    let mut ranges: Vec<(u32, u32)> = match class {
        Class::Unicode(u) => u.ranges().iter().map(|r| (r.start() as u32, r.end() as u32)).collect(),
        Class::Bytes(b) => b.ranges().iter().map(|r| (u32::from(r.start()), u32::from(r.end()))).collect(),
    };
    let printable: Vec<(u32, u32)> = ranges
        .iter()
        .filter_map(|&(lo, hi)| {
            let lo = lo.max(0x20);
            let hi = hi.min(0x7e);
            (lo <= hi).then_some((lo, hi))
        })
        .collect();
    if !printable.is_empty() {
        ranges = printable;
    }
    if ranges.is_empty() {
        return None;
    }
    let (lo, hi) = ranges[rng.gen_range(0..ranges.len())];
    (0..4).find_map(|_| char::from_u32(rng.gen_range(lo..=hi))).or_else(|| char::from_u32(lo))
}
