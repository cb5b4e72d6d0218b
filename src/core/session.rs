// This module provides arena-based resolution session management using the bumpalo crate.
// ResolveSession owns a reference to the caller's arena and ties every resolved sequence and
// interned primitive symbol to that arena's lifetime, so the sequences handed to the emitter
// are plain borrowed slices with no reference counting. The session also interns symbol names
// (each catalogue symbol is copied into the arena once) and tracks resolution statistics:
// requests seen, sequences produced, primitive calls emitted, a per-strategy breakdown, scratch
// spills and failures. ResolveStats renders a human-readable summary for the CLI.

//! Arena-based resolution session.
//!
//! All resolved sequences are allocated in the session arena and share its
//! lifetime.

use bumpalo::Bump;
use hashbrown::HashMap;
use std::cell::RefCell;
use std::fmt;

/// Arena-based resolution session.
pub struct ResolveSession<'arena> {
    /// Arena allocator for sequences and symbols.
    arena: &'arena Bump,

    /// Session statistics.
    stats: RefCell<ResolveStats>,

    /// Interned primitive symbols.
    interned: RefCell<HashMap<String, &'arena str>>,
}

impl<'arena> ResolveSession<'arena> {
    /// Create a new session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: RefCell::new(ResolveStats::default()),
            interned: RefCell::new(HashMap::new()),
        }
    }

    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    /// Allocate a slice in the session arena.
    pub fn alloc_slice<T>(&self, slice: &[T]) -> &'arena [T]
    where
        T: Clone,
    {
        self.arena.alloc_slice_clone(slice)
    }

    /// Intern a symbol in the arena.
    pub fn intern_str(&self, s: &str) -> &'arena str {
        let mut strings = self.interned.borrow_mut();
        if let Some(&interned) = strings.get(s) {
            return interned;
        }

        let interned = self.arena.alloc_str(s);
        strings.insert(s.to_string(), interned);
        interned
    }

    /// Record an incoming request.
    pub fn record_request(&self) {
        self.stats.borrow_mut().requests += 1;
    }

    /// Record a finished sequence.
    pub fn record_sequence(&self, strategy: &str, calls: usize, scratch_spills: usize) {
        let mut stats = self.stats.borrow_mut();
        stats.sequences += 1;
        stats.calls_emitted += calls;
        stats.scratch_spills += scratch_spills;
        *stats
            .strategy_counts
            .entry(strategy.to_string())
            .or_insert(0) += 1;
    }

    /// Record a failed resolution.
    pub fn record_failure(&self) {
        self.stats.borrow_mut().failures += 1;
    }

    pub fn stats(&self) -> ResolveStats {
        self.stats.borrow().clone()
    }
}

/// Resolution statistics.
#[derive(Debug, Default, Clone)]
pub struct ResolveStats {
    /// Requests received.
    pub requests: usize,

    /// Sequences produced.
    pub sequences: usize,

    /// Primitive calls across all sequences.
    pub calls_emitted: usize,

    /// Sequences per strategy.
    pub strategy_counts: std::collections::HashMap<String, usize>,

    /// Values staged through a scratch slot.
    pub scratch_spills: usize,

    /// Failed requests.
    pub failures: usize,
}

impl fmt::Display for ResolveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resolution Session Statistics:")?;
        writeln!(f, "  Requests: {}", self.requests)?;
        writeln!(f, "  Sequences produced: {}", self.sequences)?;
        writeln!(f, "  Primitive calls emitted: {}", self.calls_emitted)?;
        writeln!(f, "  Scratch spills: {}", self.scratch_spills)?;
        writeln!(f, "  Failures: {}", self.failures)?;

        if !self.strategy_counts.is_empty() {
            writeln!(f, "  Strategy breakdown:")?;
            let mut sorted: Vec<_> = self.strategy_counts.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

            for (strategy, count) in sorted {
                writeln!(f, "    {}: {}", strategy, count)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let arena = Bump::new();
        let session = ResolveSession::new(&arena);

        let stats = session.stats();
        assert_eq!(stats.requests, 0);
        assert_eq!(stats.sequences, 0);
        assert_eq!(stats.failures, 0);
    }

    #[test]
    fn test_string_interning() {
        let arena = Bump::new();
        let session = ResolveSession::new(&arena);

        let s1 = session.intern_str("x128_div_f32");
        let s2 = session.intern_str("x128_div_f32");
        let s3 = session.intern_str("x256_div_f32");

        assert_eq!(s1.as_ptr(), s2.as_ptr());
        assert_ne!(s1.as_ptr(), s3.as_ptr());
    }

    #[test]
    fn test_statistics_display() {
        let arena = Bump::new();
        let session = ResolveSession::new(&arena);

        session.record_request();
        session.record_request();
        session.record_sequence("native", 1, 0);
        session.record_sequence("alias-spill", 4, 1);
        session.record_failure();

        let stats = session.stats();
        assert_eq!(stats.calls_emitted, 5);
        assert_eq!(stats.strategy_counts["native"], 1);

        let output = format!("{}", stats);
        assert!(output.contains("Requests: 2"));
        assert!(output.contains("Scratch spills: 1"));
        assert!(output.contains("alias-spill: 1"));
    }
}
