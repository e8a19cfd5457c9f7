//! Literal and class prefilters.
//!
//! A prefilter scans the subject for something cheap (one byte, a
//! substring, an alternation of literals, a byte class) and hands candidate
//! positions to the backtracker for verification. The scanner ladder mirrors
//! the shape of the extracted literals: the cheapest machine that covers the
//! set wins.

use aho_corasick::{AhoCorasick, MatchKind};
use strata_scan::bitmap::ClassScanner;
use strata_scan::nibble::NibbleLut;
use strata_scan::teddy::Teddy;
use strata_scan::twoway::Finder;
use strata_scan::ByteSet;

/// The scanning machine behind a prefilter.
pub(crate) enum Scanner {
    /// A single byte; `memchr` does the work.
    Byte(u8),
    /// A single literal of two or more bytes; Two-Way search.
    Substring(Finder),
    /// Up to sixteen literals, first-byte fan-out.
    Multi(Teddy),
    /// Too many literals for the fan-out table; a full automaton.
    Automaton(AhoCorasick),
    /// A byte class, via nibble LUT when it fits and bitmap otherwise.
    Class(ClassKind),
}

pub(crate) enum ClassKind {
    Nibble(NibbleLut),
    Table(ClassScanner),
}

impl Scanner {
    /// Scanner for a single literal.
    pub fn literal(bytes: &[u8]) -> Scanner {
        match bytes {
            [b] => Scanner::Byte(*b),
            _ => Scanner::Substring(Finder::new(bytes)),
        }
    }

    /// Position of the first hit at or after `at`.
    pub fn find(&self, haystack: &[u8], at: usize) -> Option<usize> {
        if at > haystack.len() {
            return None;
        }
        match self {
            Scanner::Byte(b) => memchr::memchr(*b, &haystack[at..]).map(|i| at + i),
            Scanner::Substring(finder) => finder.find(haystack, at),
            Scanner::Multi(teddy) => teddy.find(haystack, at).map(|hit| hit.at),
            Scanner::Automaton(ac) => ac.find(&haystack[at..]).map(|m| at + m.start()),
            Scanner::Class(ClassKind::Nibble(lut)) => lut.find(haystack, at),
            Scanner::Class(ClassKind::Table(scanner)) => scanner.find(haystack, at),
        }
    }
}

/// A compiled prefilter: a scanner plus the fixed byte offset the scanned
/// item occupies within every match.
pub(crate) struct Prefilter {
    scanner: Scanner,
    offset: usize,
}

impl Prefilter {
    /// Prefilter on a required literal at a fixed offset from the match
    /// start.
    pub fn literal(bytes: &[u8], offset: usize) -> Prefilter {
        Prefilter { scanner: Scanner::literal(bytes), offset }
    }

    /// Prefilter on a whole-pattern literal alternation. Returns `None`
    /// when a branch is empty (a match might then contain no literal at
    /// all) or when no automaton can be built.
    pub fn alternation(branches: &[Vec<u8>]) -> Option<Prefilter> {
        if branches.is_empty() || branches.iter().any(|b| b.is_empty()) {
            return None;
        }
        let scanner = match Teddy::new(branches.to_vec()) {
            Some(teddy) => Scanner::Multi(teddy),
            None => Scanner::Automaton(
                AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostFirst)
                    .build(branches)
                    .ok()?,
            ),
        };
        Some(Prefilter { scanner, offset: 0 })
    }

    /// Prefilter on a mandatory leading byte class. A negated class scans
    /// with the complemented membership table; the nibble tables only pay
    /// off for the small positive sets.
    pub fn class(set: &ByteSet, positive: bool) -> Prefilter {
        let scanner = if !positive {
            Scanner::Class(ClassKind::Table(ClassScanner::negated(set)))
        } else {
            match NibbleLut::try_new(set) {
                Some(lut) => Scanner::Class(ClassKind::Nibble(lut)),
                None => Scanner::Class(ClassKind::Table(ClassScanner::new(set))),
            }
        };
        Prefilter { scanner, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Position of the next literal/class hit at or after `at`. The
    /// candidate match start is `hit - offset()`.
    pub fn find(&self, haystack: &[u8], at: usize) -> Option<usize> {
        self.scanner.find(haystack, at)
    }
}
