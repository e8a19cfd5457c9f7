use std::fmt;
use std::ops::{Index, Range};

/// A single match: a zero-copy span over the subject.
///
/// `group()` is 0 for the whole match; capturing groups are numbered from 1
/// in open-paren order.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Match<'h> {
    haystack: &'h [u8],
    group: u32,
    start: usize,
    end: usize,
}

impl<'h> Match<'h> {
    #[inline]
    pub(crate) fn new(haystack: &'h [u8], group: u32, start: usize, end: usize) -> Match<'h> {
        debug_assert!(start <= end && end <= haystack.len());
        Match { haystack, group, start, end }
    }

    #[inline]
    pub fn group(&self) -> u32 {
        self.group
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether this is a zero-width match.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The matched bytes, `subject[start..end)`.
    #[inline]
    pub fn text(&self) -> &'h [u8] {
        &self.haystack[self.start..self.end]
    }
}

impl fmt::Debug for Match<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Match({}, {}..{})", self.group, self.start, self.end)
    }
}

/// An append-only, ordered list of matches.
///
/// Allocates lazily: an empty list holds no heap memory, and the first
/// append reserves room for eight entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchList<'h> {
    matches: Option<Vec<Match<'h>>>,
}

impl<'h> MatchList<'h> {
    pub fn new() -> MatchList<'h> {
        MatchList { matches: None }
    }

    pub(crate) fn push(&mut self, m: Match<'h>) {
        self.matches
            .get_or_insert_with(|| Vec::with_capacity(8))
            .push(m);
    }

    pub fn len(&self) -> usize {
        self.matches.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Option<&Match<'h>> {
        self.as_slice().get(i)
    }

    pub fn first(&self) -> Option<&Match<'h>> {
        self.as_slice().first()
    }

    pub fn last(&self) -> Option<&Match<'h>> {
        self.as_slice().last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match<'h>> {
        self.as_slice().iter()
    }

    pub fn as_slice(&self) -> &[Match<'h>] {
        self.matches.as_deref().unwrap_or(&[])
    }
}

impl<'h> Index<usize> for MatchList<'h> {
    type Output = Match<'h>;

    fn index(&self, i: usize) -> &Match<'h> {
        &self.as_slice()[i]
    }
}

impl<'h> IntoIterator for MatchList<'h> {
    type Item = Match<'h>;
    type IntoIter = std::vec::IntoIter<Match<'h>>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.unwrap_or_default().into_iter()
    }
}

impl<'l, 'h> IntoIterator for &'l MatchList<'h> {
    type Item = &'l Match<'h>;
    type IntoIter = std::slice::Iter<'l, Match<'h>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
