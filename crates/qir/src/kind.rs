//! Closed set of operation kinds understood by the IR.

use std::fmt;

/// Operation kind tag.
///
/// Dispatch in the rewrite driver is keyed on this enum, so adding a kind
/// means adding a variant here and to [`OpKind::ALL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    /// `func.func`: owns a single-block body region; arguments are block args.
    Func,
    /// `func.return`
    Return,
    /// `scf.if`: control boundary owning a nested region.
    If,
    /// `scf.yield`
    Yield,
    /// `quantum.alloc`: produces a fresh qubit.
    Alloc,
    /// `quantum.rotate(angle, qubit) -> qubit`, parametrized rotation about `axis`.
    Rotate,
    /// `quantum.h`
    Hadamard,
    /// `quantum.x`
    PauliX,
    /// `quantum.z`
    PauliZ,
    /// `quantum.measure(qubit) -> i1`
    Measure,
    /// `arith.constf {value}`
    ConstF,
    /// `arith.addf(lhs, rhs)`
    AddF,
}

impl OpKind {
    pub const ALL: [OpKind; 12] = [
        OpKind::Func,
        OpKind::Return,
        OpKind::If,
        OpKind::Yield,
        OpKind::Alloc,
        OpKind::Rotate,
        OpKind::Hadamard,
        OpKind::PauliX,
        OpKind::PauliZ,
        OpKind::Measure,
        OpKind::ConstF,
        OpKind::AddF,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Dense index usable for per-kind tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn dialect(self) -> &'static str {
        match self {
            OpKind::Func | OpKind::Return => "func",
            OpKind::If | OpKind::Yield => "scf",
            OpKind::Alloc
            | OpKind::Rotate
            | OpKind::Hadamard
            | OpKind::PauliX
            | OpKind::PauliZ
            | OpKind::Measure => "quantum",
            OpKind::ConstF | OpKind::AddF => "arith",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            OpKind::Func => "func",
            OpKind::Return => "return",
            OpKind::If => "if",
            OpKind::Yield => "yield",
            OpKind::Alloc => "alloc",
            OpKind::Rotate => "rotate",
            OpKind::Hadamard => "h",
            OpKind::PauliX => "x",
            OpKind::PauliZ => "z",
            OpKind::Measure => "measure",
            OpKind::ConstF => "constf",
            OpKind::AddF => "addf",
        }
    }

    /// Side-effect free: an unused result makes the operation removable.
    ///
    /// Gates are not pure. Discarding a gate changes the state of the qubit
    /// even when nobody reads its result.
    pub const fn is_pure(self) -> bool {
        matches!(self, OpKind::ConstF | OpKind::AddF)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dialect(), self.name())
    }
}
