//! Requirement matching.
//!
//! A requirement is a set of alternatives separated by `||`; each
//! alternative is a list of comparators separated by `,` or whitespace, all
//! of which must hold. Every comparator is lowered to plain bounds on a fully
//! specified [`Version`] when parsed, so matching never has to think about
//! partial versions or wildcards.

use crate::error::{ErrorKind, Result};
use crate::version::precedence;
use semver::{BuildMetadata, Prerelease, Version};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const OPERATOR_CHARS: &[char] = &['=', '!', '>', '<', '~', '^'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Exact,
    NotEqual,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Tilde,
    Caret,
}

impl Op {
    fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "" | "=" | "==" => Self::Exact,
            "!=" => Self::NotEqual,
            ">" => Self::Greater,
            ">=" => Self::GreaterEq,
            "<" => Self::Less,
            "<=" => Self::LessEq,
            "~" | "~>" => Self::Tilde,
            "^" => Self::Caret,
            _ => return None,
        })
    }
}

/// A comparator version as written: components may be missing (`1.2`) or
/// wildcards (`1.2.x`).
#[derive(Debug, Default)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
    /// At least one component was an explicit `x`, `X` or `*`.
    wildcard: bool,
}

impl Partial {
    fn parse(text: &str) -> Option<Self> {
        let text = text.strip_prefix(['v', 'V']).unwrap_or(text);
        let (text, _build) = text.split_once('+').unwrap_or((text, ""));
        let (core, pre) = text.split_once('-').unwrap_or((text, ""));
        let pre = Prerelease::new(pre).ok()?;
        let mut partial = Partial { pre, ..Self::default() };
        let mut parts = core.split('.');
        let mut components = [None; 3];
        let mut seen_wildcard = false;
        for slot in components.iter_mut() {
            let Some(part) = parts.next() else { break };
            if matches!(part, "x" | "X" | "*") {
                partial.wildcard = true;
                seen_wildcard = true;
                continue;
            }
            if seen_wildcard || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            *slot = Some(part.parse().ok()?);
        }
        if parts.next().is_some() {
            return None;
        }
        [partial.major, partial.minor, partial.patch] = components;
        Some(partial)
    }

    /// Missing and wildcard components become zero.
    fn floor(&self) -> Version {
        Version {
            major: self.major.unwrap_or(0),
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            pre: self.pre.clone(),
            build: BuildMetadata::EMPTY,
        }
    }

    /// First version past everything the specified components cover. `None`
    /// when nothing is specified, or when there is no such version because a
    /// component is already `u64::MAX`.
    fn ceiling(&self) -> Option<Version> {
        match (self.major?, self.minor, self.patch) {
            (major, None, _) => Some(Version::new(major.checked_add(1)?, 0, 0)),
            (major, Some(minor), None) => Some(Version::new(major, minor.checked_add(1)?, 0)),
            (major, Some(minor), Some(patch)) => Some(Version::new(major, minor, patch.checked_add(1)?)),
        }
    }

    fn is_complete(&self) -> bool {
        self.patch.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Bound {
    Eq(Version),
    Ne(Version),
    Gt(Version),
    Ge(Version),
    Lt(Version),
    Le(Version),
    Outside(Version, Version),
}

impl Bound {
    fn matches(&self, v: &Version) -> bool {
        let cmp = |other: &Version| precedence(v, other);
        match self {
            Self::Eq(b) => cmp(b) == Ordering::Equal,
            Self::Ne(b) => cmp(b) != Ordering::Equal,
            Self::Gt(b) => cmp(b) == Ordering::Greater,
            Self::Ge(b) => cmp(b) != Ordering::Less,
            Self::Lt(b) => cmp(b) == Ordering::Less,
            Self::Le(b) => cmp(b) != Ordering::Greater,
            Self::Outside(lo, hi) => cmp(lo) == Ordering::Less || cmp(hi) != Ordering::Less,
        }
    }

    fn versions(&self) -> impl Iterator<Item = &Version> {
        let (a, b) = match self {
            Self::Eq(v) | Self::Ne(v) | Self::Gt(v) | Self::Ge(v) | Self::Lt(v) | Self::Le(v) => (v, None),
            Self::Outside(lo, hi) => (lo, Some(hi)),
        };
        std::iter::once(a).chain(b)
    }
}

/// `>= floor`, and `< upper` unless the range is open above.
fn bounded(floor: Version, upper: Option<Version>) -> Vec<Bound> {
    let mut bounds = vec![Bound::Ge(floor)];
    bounds.extend(upper.map(Bound::Lt));
    bounds
}

/// Lower one comparator into bounds. An empty list matches everything.
fn lower(op: Op, partial: &Partial) -> Vec<Bound> {
    if partial.major.is_none() {
        // `*`, `x`: anything, except for operators that cannot be satisfied
        // relative to "any version", which are treated the same way.
        return Vec::new();
    }
    let floor = partial.floor();
    let exact = partial.is_complete() && !partial.wildcard;
    match op {
        Op::Exact if exact => vec![Bound::Eq(floor)],
        Op::Exact => bounded(floor, partial.ceiling()),
        Op::NotEqual if exact => vec![Bound::Ne(floor)],
        Op::NotEqual => match partial.ceiling() {
            Some(ceiling) => vec![Bound::Outside(floor, ceiling)],
            None => vec![Bound::Lt(floor)],
        },
        // Explicit wildcards cover the whole range; missing components pad.
        Op::Greater if partial.wildcard => match partial.ceiling() {
            Some(ceiling) => vec![Bound::Ge(ceiling)],
            None => vec![Bound::Gt(Version::new(u64::MAX, u64::MAX, u64::MAX))],
        },
        Op::Greater => vec![Bound::Gt(floor)],
        Op::GreaterEq => vec![Bound::Ge(floor)],
        Op::Less => vec![Bound::Lt(floor)],
        Op::LessEq if partial.wildcard => partial.ceiling().map(Bound::Lt).into_iter().collect(),
        Op::LessEq => vec![Bound::Le(floor)],
        Op::Tilde => {
            let upper = match partial.minor {
                Some(minor) => minor.checked_add(1).map(|minor| Version::new(floor.major, minor, 0)),
                None => floor.major.checked_add(1).map(|major| Version::new(major, 0, 0)),
            };
            bounded(floor, upper)
        },
        Op::Caret => {
            let upper = match (partial.minor, partial.patch) {
                _ if floor.major > 0 => floor.major.checked_add(1).map(|major| Version::new(major, 0, 0)),
                (None, _) => Some(Version::new(1, 0, 0)),
                (Some(minor), _) if minor > 0 => minor.checked_add(1).map(|minor| Version::new(0, minor, 0)),
                (Some(_), None) => Some(Version::new(0, 1, 0)),
                (Some(_), Some(patch)) => patch.checked_add(1).map(|patch| Version::new(0, 0, patch)),
            };
            bounded(floor, upper)
        },
    }
}

/// Split an alternative into `(operator, version)` pairs. Whitespace between
/// an operator and its version is allowed (`>= 1.2.3`).
fn comparators(alternative: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    let mut rest = alternative.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
    while !rest.is_empty() {
        let op_len = rest.find(|c: char| !OPERATOR_CHARS.contains(&c)).unwrap_or(rest.len());
        let (op, tail) = rest.split_at(op_len);
        let tail = tail.trim_start();
        let version_len = tail.find(|c: char| c == ',' || c.is_whitespace()).unwrap_or(tail.len());
        let (version, tail) = tail.split_at(version_len);
        pairs.push((op, version));
        rest = tail.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
    }
    pairs
}

/// A parsed version requirement.
///
/// ```
/// use algoscope_resolve::Requirement;
/// use semver::Version;
///
/// let requirement: Requirement = ">v5.3, <5.4".parse().unwrap();
/// assert!(requirement.matches(&Version::new(5, 3, 1)));
/// assert!(!requirement.matches(&Version::new(5, 4, 0)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    raw: String,
    alternatives: Vec<Vec<Bound>>,
}

impl Requirement {
    pub fn parse(requirement: &str) -> Result<Self> {
        let invalid = || ErrorKind::InvalidRequirement(requirement.to_string());
        if requirement.trim().is_empty() {
            exn::bail!(invalid());
        }
        let mut alternatives = Vec::new();
        for alternative in requirement.split("||") {
            let pairs = comparators(alternative);
            if pairs.is_empty() {
                exn::bail!(invalid());
            }
            let mut bounds = Vec::new();
            for (op, version) in pairs {
                let (Some(op), Some(partial)) = (Op::parse(op), Partial::parse(version)) else {
                    exn::bail!(invalid());
                };
                bounds.extend(lower(op, &partial));
            }
            alternatives.push(bounds);
        }
        Ok(Self { raw: requirement.trim().to_string(), alternatives })
    }

    /// Whether `version` satisfies any alternative.
    ///
    /// A pre-release version only satisfies an alternative in which some
    /// comparator names a pre-release of the same `major.minor.patch`.
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|bounds| {
            bounds.iter().all(|b| b.matches(version)) && (version.pre.is_empty() || allows_pre(bounds, version))
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn allows_pre(bounds: &[Bound], version: &Version) -> bool {
    bounds.iter().flat_map(Bound::versions).any(|b| {
        !b.pre.is_empty() && (b.major, b.minor, b.patch) == (version.major, version.minor, version.patch)
    })
}

impl FromStr for Requirement {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
