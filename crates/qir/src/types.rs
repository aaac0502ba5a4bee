//! Value types, attributes, locations, and path interning.

use std::collections::HashMap;
use std::fmt;

use cranelift_entity::PrimaryMap;
use derive_more::Display;

use crate::refs::PathRef;

// ============================================================================
// Location
// ============================================================================

/// A span of source text, represented as byte offsets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Source location attached to every operation. Copy-able, no lifetime parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub path: PathRef,
    pub span: Span,
}

impl Location {
    pub const fn new(path: PathRef, span: Span) -> Self {
        Self { path, span }
    }
}

// ============================================================================
// Type
// ============================================================================

/// Type of an SSA value.
///
/// The type system is intentionally closed: the rewrite engine only needs to
/// tell qubit-carrying values apart from classical ones.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    /// Linear handle to a single qubit.
    #[display("qubit")]
    Qubit,
    /// Rotation angle in radians.
    #[display("f64")]
    F64,
    /// Classical measurement outcome.
    #[display("i1")]
    I1,
}

// ============================================================================
// Attribute
// ============================================================================

/// Rotation axis of a `quantum.rotate` gate.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    #[display("x")]
    X,
    #[display("y")]
    Y,
    #[display("z")]
    Z,
}

/// Operation attribute values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Float constant stored as raw bits.
    FloatBits(u64),
    String(String),
    Axis(Axis),
}

impl Attribute {
    pub fn float(value: f64) -> Self {
        Attribute::FloatBits(value.to_bits())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Attribute::FloatBits(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    pub fn as_axis(&self) -> Option<Axis> {
        match self {
            Attribute::Axis(axis) => Some(*axis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attribute::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Attribute {
    fn from(value: f64) -> Self {
        Attribute::float(value)
    }
}

impl From<Axis> for Attribute {
    fn from(value: Axis) -> Self {
        Attribute::Axis(value)
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Attribute::String(value.to_string())
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::FloatBits(bits) => {
                let v = f64::from_bits(*bits);
                let s = format!("{v}");
                f.write_str(&s)?;
                // Keep a decimal point on finite whole numbers (not on inf/NaN)
                if v.is_finite() && !s.contains('.') && !s.contains('e') && !s.contains('E') {
                    f.write_str(".0")?;
                }
                Ok(())
            }
            Attribute::String(s) => write!(f, "{s:?}"),
            Attribute::Axis(axis) => write!(f, "{axis}"),
        }
    }
}

// ============================================================================
// PathInterner
// ============================================================================

/// Deduplicating path (URI string) interner.
#[derive(Clone)]
pub struct PathInterner {
    paths: PrimaryMap<PathRef, String>,
    dedup: HashMap<String, PathRef>,
}

impl PathInterner {
    pub fn new() -> Self {
        Self {
            paths: PrimaryMap::new(),
            dedup: HashMap::default(),
        }
    }

    /// Intern a path string, returning an existing ref if the string matches.
    pub fn intern(&mut self, path: impl Into<String>) -> PathRef {
        let path = path.into();
        if let Some(&existing) = self.dedup.get(&path) {
            return existing;
        }
        let r = self.paths.push(path.clone());
        self.dedup.insert(path, r);
        r
    }

    /// Look up path string by reference.
    pub fn get(&self, r: PathRef) -> &str {
        &self.paths[r]
    }
}

impl Default for PathInterner {
    fn default() -> Self {
        Self::new()
    }
}
