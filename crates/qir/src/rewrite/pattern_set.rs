//! Pattern collections.
//!
//! [`RewritePatternSet`] is the mutable registration list; freezing it
//! resolves per-kind dispatch order once, before the driver runs.

use super::pattern::RewritePattern;
use crate::kind::OpKind;

/// Patterns in declaration order.
#[derive(Default)]
pub struct RewritePatternSet {
    patterns: Vec<Box<dyn RewritePattern>>,
}

impl RewritePatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rewrite pattern.
    pub fn add(mut self, pattern: impl RewritePattern + 'static) -> Self {
        self.patterns.push(Box::new(pattern));
        self
    }

    pub fn push(&mut self, pattern: Box<dyn RewritePattern>) {
        self.patterns.push(pattern);
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Build the per-kind dispatch tables.
    ///
    /// Within one kind, patterns are ordered by descending benefit; equal
    /// benefits keep declaration order.
    pub fn freeze(self) -> FrozenPatternSet {
        let mut by_kind: [Vec<usize>; OpKind::COUNT] = std::array::from_fn(|_| Vec::new());
        for (idx, pattern) in self.patterns.iter().enumerate() {
            by_kind[pattern.root_kind().index()].push(idx);
        }
        for table in &mut by_kind {
            // Stable sort keeps declaration order among equal benefits.
            table.sort_by_key(|&idx| std::cmp::Reverse(self.patterns[idx].benefit()));
        }
        FrozenPatternSet {
            patterns: self.patterns,
            by_kind,
        }
    }
}

/// Immutable, dispatch-ready pattern set.
pub struct FrozenPatternSet {
    patterns: Vec<Box<dyn RewritePattern>>,
    by_kind: [Vec<usize>; OpKind::COUNT],
}

impl FrozenPatternSet {
    /// Candidate patterns for `kind`, in the order the driver tries them.
    pub fn patterns_for(&self, kind: OpKind) -> impl Iterator<Item = &dyn RewritePattern> + '_ {
        self.by_kind[kind.index()]
            .iter()
            .map(|&idx| self.patterns[idx].as_ref())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
