use crate::DepsError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A lenient Maven-style version: up to three numeric components plus an
/// optional qualifier after the first `-` (`2.0-SNAPSHOT`, `1.2.3-RC1`).
///
/// Ordering is numeric on the components, with missing components
/// treated as zero. A qualified version sorts below its unqualified
/// counterpart, so `2.0-SNAPSHOT < 2.0`. Range matching deliberately
/// ignores the qualifier: a snapshot of `2.0` satisfies the same
/// constraints `2.0` does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    components: Vec<u64>,
    qualifier: Option<String>,
}

impl Version {
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn is_snapshot(&self) -> bool {
        self.qualifier
            .as_deref()
            .is_some_and(|q| q.to_ascii_uppercase().contains("SNAPSHOT"))
    }

    fn component(&self, idx: usize) -> u64 {
        self.components.get(idx).copied().unwrap_or(0)
    }

    /// Compare on numeric components only, ignoring qualifiers.
    fn cmp_components(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            match self.component(i).cmp(&other.component(i)) {
                Ordering::Equal => {}
                non_eq => return non_eq,
            }
        }
        Ordering::Equal
    }
}

impl FromStr for Version {
    type Err = DepsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DepsError::InvalidVersion(s.to_owned()));
        }
        // Split numeric part from qualifier on the first '-' or '+'.
        let (numeric, qualifier) = match s.find(['-', '+']) {
            Some(pos) => (&s[..pos], Some(s[pos + 1..].to_owned())),
            None => (s, None),
        };
        if numeric.is_empty() {
            return Err(DepsError::InvalidVersion(s.to_owned()));
        }
        let mut components = Vec::new();
        for part in numeric.split('.') {
            let n: u64 = part
                .parse()
                .map_err(|_| DepsError::InvalidVersion(s.to_owned()))?;
            components.push(n);
        }
        if components.is_empty() || components.len() > 3 {
            return Err(DepsError::InvalidVersion(s.to_owned()));
        }
        Ok(Self {
            components,
            qualifier,
        })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.cmp_components(other) {
            Ordering::Equal => match (&self.qualifier, &other.qualifier) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            },
            non_eq => non_eq,
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nums: Vec<String> = self.components.iter().map(ToString::to_string).collect();
        write!(f, "{}", nums.join("."))?;
        if let Some(ref q) = self.qualifier {
            write!(f, "-{q}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
}

/// A conjunction of comparison predicates against a version, parsed
/// from a manifest rule key such as `">= 3.1.0 < 6.0.0"`, `"<2.0"`,
/// `"3.1.0"` (exact), or `"*"` (match all).
///
/// Operators may be glued to their operand or separated by whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    predicates: Vec<(Op, Version)>,
}

impl Constraint {
    /// Whether `version` satisfies every predicate. Qualifiers are
    /// ignored: `2.0-SNAPSHOT` matches exactly what `2.0` matches.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.predicates.iter().all(|(op, target)| {
            let ord = version.cmp_components(target);
            match op {
                Op::Ge => ord != Ordering::Less,
                Op::Le => ord != Ordering::Greater,
                Op::Gt => ord == Ordering::Greater,
                Op::Lt => ord == Ordering::Less,
                Op::Eq => ord == Ordering::Equal,
            }
        })
    }
}

impl FromStr for Constraint {
    type Err = DepsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "*" || s.is_empty() {
            return Ok(Self {
                predicates: Vec::new(),
            });
        }
        let mut predicates = Vec::new();
        let mut parts = s.split_whitespace().peekable();
        while let Some(part) = parts.next() {
            let (op, rest) = if let Some(rest) = part.strip_prefix(">=") {
                (Op::Ge, rest)
            } else if let Some(rest) = part.strip_prefix("<=") {
                (Op::Le, rest)
            } else if let Some(rest) = part.strip_prefix("==") {
                (Op::Eq, rest)
            } else if let Some(rest) = part.strip_prefix('>') {
                (Op::Gt, rest)
            } else if let Some(rest) = part.strip_prefix('<') {
                (Op::Lt, rest)
            } else if let Some(rest) = part.strip_prefix('=') {
                (Op::Eq, rest)
            } else {
                // A bare version is an exact match.
                (Op::Eq, part)
            };
            let target = if rest.is_empty() {
                parts
                    .next()
                    .ok_or_else(|| DepsError::InvalidVersion(s.to_owned()))?
            } else {
                rest
            };
            predicates.push((op, target.parse()?));
        }
        Ok(Self { predicates })
    }
}
