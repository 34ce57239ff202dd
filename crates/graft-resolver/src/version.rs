//! Version ordering and version range syntax.
//!
//! Versions are ordered Maven-style rather than by semver:
//! - Segments are split on `.`, `-` and `_`
//! - Numeric segments compare as numbers
//! - Well-known qualifiers have a fixed order:
//!   `alpha` < `beta` < `milestone` < `rc` < `snapshot` < `""` (release) < `sp`
//! - Unknown text sorts below a release and above nothing else numeric

use std::cmp::Ordering;
use std::fmt;

/// A parsed version with comparable segments.
#[derive(Debug, Clone)]
pub struct Version {
    original: String,
    segments: Vec<Segment>,
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Numeric(u64),
    Qualifier(QualifierKind),
    Text(String),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum QualifierKind {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl Version {
    pub fn parse(version: &str) -> Self {
        Self {
            original: version.to_string(),
            segments: parse_segments(version),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let max_len = self.segments.len().max(other.segments.len());
        (0..max_len)
            .map(|i| compare_segments(self.segments.get(i), other.segments.get(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    Version::parse(a).cmp(&Version::parse(b))
}

fn compare_segments(a: Option<&Segment>, b: Option<&Segment>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(s), None) => compare_to_missing(s),
        (None, Some(s)) => compare_to_missing(s).reverse(),
        (Some(a), Some(b)) => compare_present(a, b),
    }
}

// A missing segment behaves like `0` or a plain release.
fn compare_to_missing(seg: &Segment) -> Ordering {
    match seg {
        Segment::Numeric(n) => n.cmp(&0),
        Segment::Qualifier(q) => q.cmp(&QualifierKind::Release),
        Segment::Text(_) => Ordering::Less,
    }
}

fn compare_present(a: &Segment, b: &Segment) -> Ordering {
    use Segment::*;
    match (a, b) {
        (Numeric(a), Numeric(b)) => a.cmp(b),
        (Qualifier(a), Qualifier(b)) => a.cmp(b),
        (Text(a), Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Numeric(_), _) => Ordering::Greater,
        (_, Numeric(_)) => Ordering::Less,
        (Qualifier(q), Text(_)) => {
            if *q >= QualifierKind::Release {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Text(_), Qualifier(q)) => {
            if *q >= QualifierKind::Release {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
    }
}

fn parse_segments(version: &str) -> Vec<Segment> {
    version
        .split(['.', '-', '_'])
        .filter(|token| !token.is_empty())
        .map(classify)
        .collect()
}

fn classify(token: &str) -> Segment {
    if let Ok(n) = token.parse::<u64>() {
        return Segment::Numeric(n);
    }
    match token.to_lowercase().as_str() {
        "alpha" | "a" => Segment::Qualifier(QualifierKind::Alpha),
        "beta" | "b" => Segment::Qualifier(QualifierKind::Beta),
        "milestone" | "m" => Segment::Qualifier(QualifierKind::Milestone),
        "rc" | "cr" => Segment::Qualifier(QualifierKind::Rc),
        "snapshot" => Segment::Qualifier(QualifierKind::Snapshot),
        "ga" | "final" | "release" => Segment::Qualifier(QualifierKind::Release),
        "sp" => Segment::Qualifier(QualifierKind::Sp),
        _ => Segment::Text(token.to_string()),
    }
}

/// A version range expression.
///
/// Supports `[1.0,2.0)`, `[1.0,)`, `(,2.0]`, `[1.0]` (exact), and the
/// reversed-bracket exclusive spelling `]1.0,2.0[`.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

impl VersionRange {
    /// Whether `spec` uses range syntax at all (it may still be malformed).
    pub fn is_range_syntax(spec: &str) -> bool {
        spec.trim_start().starts_with(['[', '(', ']'])
    }

    /// Parse a range expression, describing what is wrong when it is malformed.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let s = spec.trim();
        let mut chars = s.chars();
        let open = chars.next().ok_or("empty range")?;
        let close = chars.next_back().ok_or("missing closing bracket")?;

        let lower_inclusive = match open {
            '[' => true,
            '(' | ']' => false,
            other => return Err(format!("unexpected opening '{other}'")),
        };
        let upper_inclusive = match close {
            ']' => true,
            ')' | '[' => false,
            _ => return Err("missing closing bracket".to_string()),
        };
        let inner = chars.as_str();

        let Some((lower, upper)) = inner.split_once(',') else {
            let version = inner.trim();
            if version.is_empty() || !lower_inclusive || !upper_inclusive {
                return Err("a single-version range must look like [1.0]".to_string());
            }
            let bound = Bound {
                version: Version::parse(version),
                inclusive: true,
            };
            return Ok(Self {
                lower: Some(bound.clone()),
                upper: Some(bound),
            });
        };

        if upper.contains(',') {
            return Err("too many commas".to_string());
        }
        let bound = |v: &str, inclusive| {
            let v = v.trim();
            (!v.is_empty()).then(|| Bound {
                version: Version::parse(v),
                inclusive,
            })
        };
        let range = Self {
            lower: bound(lower, lower_inclusive),
            upper: bound(upper, upper_inclusive),
        };
        if range.lower.is_none() && range.upper.is_none() {
            return Err("a range needs at least one bound".to_string());
        }
        if let (Some(lo), Some(hi)) = (&range.lower, &range.upper) {
            if lo.version > hi.version {
                return Err("lower bound is greater than upper bound".to_string());
            }
        }
        Ok(range)
    }

    /// Check if a version satisfies this range.
    pub fn contains(&self, version: &Version) -> bool {
        if let Some(ref lower) = self.lower {
            match version.cmp(&lower.version) {
                Ordering::Less => return false,
                Ordering::Equal if !lower.inclusive => return false,
                _ => {}
            }
        }
        if let Some(ref upper) = self.upper {
            match version.cmp(&upper.version) {
                Ordering::Greater => return false,
                Ordering::Equal if !upper.inclusive => return false,
                _ => {}
            }
        }
        true
    }
}
