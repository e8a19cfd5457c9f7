//! Compiled patterns and the tier dispatcher.
//!
//! Compilation parses and analyzes the pattern once, then routes it to the
//! cheapest execution strategy that produces answers indistinguishable from
//! the backtracker: a verbatim literal scan, a scan-and-verify prefilter, or
//! the backtracker itself.

use bon::bon;

use crate::analyze::{Analysis, Complexity, PatternAnalyzer};
use crate::error::{CompileError, MatchError};
use crate::matches::{Match, MatchList};
use crate::nfa::Backtracker;
use crate::prefilter::{Prefilter, Scanner};
use crate::syntax::{parse, Ast};

/// Compiles a pattern with the default configuration.
pub fn compile(pattern: &[u8]) -> Result<Pattern, CompileError> {
    Pattern::new(pattern)
}

/// A preference for matching-engine selection.
///
/// `Auto` picks the cheapest correct tier from the pattern analysis. The
/// other values force a tier where possible and fall back to `Auto`'s
/// choice where not; `Backtrack` always holds. Exposed mainly for tests
/// and benchmarks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Engine {
    #[default]
    Auto,
    /// The verbatim literal scan, when the pattern is an exact literal.
    Literal,
    /// A prefilter tier, skipping the exact-literal bypass.
    Prefilter,
    /// The backtracker alone.
    Backtrack,
}

/// The execution tier a pattern compiled to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    /// The pattern is an exact literal; scanner hits are returned verbatim.
    Literal,
    /// A literal prefix scan anchors a verification at every hit.
    PrefixVerify,
    /// A required literal, literal alternation or leading class narrows the
    /// candidate starts for the backtracker.
    PrefilterNfa,
    /// The backtracker alone.
    Nfa,
}

enum Strategy {
    Literal { scanner: Scanner, len: usize },
    Prefilter(Prefilter),
    Backtrack,
}

/// A compiled pattern.
///
/// Immutable after compilation and safe to share across threads; every
/// search owns its own scratch state.
///
/// # Example
///
/// ```
/// use strata_regex::Pattern;
///
/// let re = Pattern::new("a[0-9]+").unwrap();
/// let m = re.first_match(b"xa42y", 0).unwrap();
/// assert_eq!((m.start(), m.end()), (1, 4));
/// assert_eq!(m.text(), b"a42");
/// ```
pub struct Pattern {
    ast: Ast,
    analysis: Analysis,
    strategy: Strategy,
    tier: Tier,
    step_limit: Option<usize>,
}

#[bon]
impl Pattern {
    /// Compiles a pattern with the default configuration.
    pub fn new(pattern: impl AsRef<[u8]>) -> Result<Pattern, CompileError> {
        Pattern::builder(pattern.as_ref()).build()
    }

    #[builder(builder_type = PatternBuilder, finish_fn = build)]
    pub fn builder(
        #[builder(start_fn)] pattern: &[u8],
        /// Matching-engine preference; see [`Engine`].
        #[builder(default)]
        engine: Engine,
        /// Upper bound on backtracking steps per match attempt. When set,
        /// the panicking search methods may panic on pathological inputs;
        /// use the `try_` variants to observe
        /// [`MatchError::StepLimitExceeded`] instead.
        step_limit: Option<usize>,
    ) -> Result<Pattern, CompileError> {
        let ast = parse(pattern)?;
        let analysis = PatternAnalyzer::new(&ast).analyze();
        let (strategy, tier) = select(&analysis, engine);
        log::debug!(
            "pattern {:?} routed to {:?} tier ({:?})",
            String::from_utf8_lossy(pattern),
            tier,
            analysis.complexity,
        );
        Ok(Pattern { ast, analysis, strategy, tier, step_limit })
    }
}

fn select(analysis: &Analysis, engine: Engine) -> (Strategy, Tier) {
    match engine {
        Engine::Backtrack => (Strategy::Backtrack, Tier::Nfa),
        Engine::Auto | Engine::Literal => auto(analysis, true),
        Engine::Prefilter => auto(analysis, false),
    }
}

fn auto(analysis: &Analysis, allow_exact: bool) -> (Strategy, Tier) {
    let lits = &analysis.literals;

    // 1. An exact literal bypasses the regex engine entirely.
    if allow_exact {
        if let Some(exact) = &lits.exact {
            let strategy = Strategy::Literal {
                scanner: Scanner::literal(exact),
                len: exact.len(),
            };
            return (strategy, Tier::Literal);
        }
    }

    // An anchored pattern makes exactly one attempt per search; there is
    // nothing for a prefilter to skip.
    if analysis.anchored_start {
        return (Strategy::Backtrack, Tier::Nfa);
    }
    if analysis.complexity == Complexity::Complex {
        return (Strategy::Backtrack, Tier::Nfa);
    }

    // 2. A long literal prefix pins the match start to its hits.
    if analysis.complexity == Complexity::Simple {
        if let Some(prefix) = &lits.prefix {
            if prefix.len() > 3 {
                return (
                    Strategy::Prefilter(Prefilter::literal(prefix, 0)),
                    Tier::PrefixVerify,
                );
            }
        }
    }

    // 3. Required literal, literal alternation or leading class.
    if let Some(alternates) = &lits.alternates {
        if let Some(pre) = Prefilter::alternation(alternates) {
            return (Strategy::Prefilter(pre), Tier::PrefilterNfa);
        }
    }
    if let Some(best) = lits.best() {
        if best.bytes.len() >= 2 {
            if let Some(offset) = best.offset {
                return (
                    Strategy::Prefilter(Prefilter::literal(&best.bytes, offset)),
                    Tier::PrefilterNfa,
                );
            }
        }
    }
    if let Some((set, positive)) = &analysis.leading_class {
        return (
            Strategy::Prefilter(Prefilter::class(set, *positive)),
            Tier::PrefilterNfa,
        );
    }

    // 4. Everything else.
    (Strategy::Backtrack, Tier::Nfa)
}

impl Pattern {
    /// The execution tier this pattern compiled to.
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// No subject shorter than this can match.
    pub fn min_match_len(&self) -> usize {
        self.analysis.min_match_len
    }

    /// Number of capturing groups, excluding the implicit whole-match
    /// group 0.
    pub fn group_count(&self) -> u32 {
        self.ast.group_count()
    }

    /// The parsed pattern.
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    fn backtracker(&self) -> Backtracker<'_> {
        Backtracker::new(&self.ast, self.step_limit)
    }

    /// Finds the leftmost match starting at or after `start`.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_regex::Pattern;
    ///
    /// let re = Pattern::new("o+").unwrap();
    /// let hay = b"footloose";
    /// assert_eq!(re.first_match(hay, 0).unwrap().range(), 1..3);
    /// assert_eq!(re.first_match(hay, 3).unwrap().range(), 5..7);
    /// assert!(re.first_match(hay, 8).is_none());
    /// ```
    ///
    /// # Panics
    ///
    /// If a step limit is configured and exceeded; the limit makes the
    /// search fallible, so use [`Pattern::try_first_match`] then.
    pub fn first_match<'h>(&self, haystack: &'h [u8], start: usize) -> Option<Match<'h>> {
        self.try_first_match(haystack, start).unwrap()
    }

    /// Fallible form of [`Pattern::first_match`].
    pub fn try_first_match<'h>(
        &self,
        haystack: &'h [u8],
        start: usize,
    ) -> Result<Option<Match<'h>>, MatchError> {
        if start > haystack.len() || haystack.len() - start < self.analysis.min_match_len {
            return Ok(None);
        }
        match &self.strategy {
            Strategy::Literal { scanner, len } => Ok(scanner
                .find(haystack, start)
                .map(|at| Match::new(haystack, 0, at, at + len))),
            Strategy::Prefilter(pre) => {
                let nfa = self.backtracker();
                let mut at = start;
                loop {
                    let Some(hit) = pre.find(haystack, at + pre.offset()) else {
                        return Ok(None);
                    };
                    let candidate = hit - pre.offset();
                    if let Some(end) = nfa.match_at(haystack, candidate)? {
                        return Ok(Some(Match::new(haystack, 0, candidate, end)));
                    }
                    at = candidate + 1;
                }
            }
            Strategy::Backtrack => {
                let nfa = self.backtracker();
                let mut at = start;
                loop {
                    if let Some(end) = nfa.match_at(haystack, at)? {
                        return Ok(Some(Match::new(haystack, 0, at, end)));
                    }
                    // An anchored pattern gets exactly one attempt.
                    if self.analysis.anchored_start {
                        return Ok(None);
                    }
                    at += 1;
                    if at > haystack.len()
                        || haystack.len() - at < self.analysis.min_match_len
                    {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Whether the pattern matches anywhere in the haystack.
    ///
    /// # Panics
    ///
    /// As [`Pattern::first_match`].
    pub fn is_match(&self, haystack: &[u8]) -> bool {
        self.first_match(haystack, 0).is_some()
    }

    /// Collects every non-overlapping match, leftmost-first, in ascending
    /// position order. A zero-width match advances the scan by one byte.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_regex::Pattern;
    ///
    /// let re = Pattern::new("a*").unwrap();
    /// let spans: Vec<_> = re.all_matches(b"baa").iter().map(|m| m.range()).collect();
    /// assert_eq!(spans, vec![0..0, 1..3, 3..3]);
    /// ```
    ///
    /// # Panics
    ///
    /// As [`Pattern::first_match`].
    pub fn all_matches<'h>(&self, haystack: &'h [u8]) -> MatchList<'h> {
        self.try_all_matches(haystack).unwrap()
    }

    /// Fallible form of [`Pattern::all_matches`].
    pub fn try_all_matches<'h>(
        &self,
        haystack: &'h [u8],
    ) -> Result<MatchList<'h>, MatchError> {
        let mut list = MatchList::new();
        let mut at = 0;
        while at <= haystack.len() {
            let Some(m) = self.try_first_match(haystack, at)? else {
                break;
            };
            at = if m.is_empty() { m.end() + 1 } else { m.end() };
            list.push(m);
        }
        Ok(list)
    }

    /// Iterates over the matches [`Pattern::all_matches`] would collect.
    ///
    /// # Panics
    ///
    /// As [`Pattern::first_match`], per iteration step.
    pub fn find_iter<'p, 'h>(&'p self, haystack: &'h [u8]) -> Matches<'p, 'h> {
        Matches { pattern: self, haystack, at: 0 }
    }

    /// Finds the leftmost match and resolves capturing-group spans: the
    /// group-0 span first, then each capturing group's spans in group
    /// order, one per repetition for quantified groups.
    ///
    /// # Panics
    ///
    /// As [`Pattern::first_match`].
    pub fn captures<'h>(&self, haystack: &'h [u8]) -> Option<MatchList<'h>> {
        self.try_captures(haystack).unwrap()
    }

    /// Fallible form of [`Pattern::captures`].
    pub fn try_captures<'h>(
        &self,
        haystack: &'h [u8],
    ) -> Result<Option<MatchList<'h>>, MatchError> {
        let Some(m) = self.try_first_match(haystack, 0)? else {
            return Ok(None);
        };
        let mut list = MatchList::new();
        list.push(m);
        if self.ast.group_count() > 0 {
            // Rerun the backtracker at the match start; the fast tiers do
            // not track group spans.
            if let Some((_, mut caps)) = self.backtracker().captures_at(haystack, m.start())? {
                caps.sort_by_key(|c| (c.group, c.start));
                for cap in caps {
                    list.push(Match::new(haystack, cap.group, cap.start, cap.end));
                }
            }
        }
        Ok(Some(list))
    }
}

/// Iterator over non-overlapping matches; see [`Pattern::find_iter`].
pub struct Matches<'p, 'h> {
    pattern: &'p Pattern,
    haystack: &'h [u8],
    at: usize,
}

impl<'p, 'h> Iterator for Matches<'p, 'h> {
    type Item = Match<'h>;

    fn next(&mut self) -> Option<Match<'h>> {
        if self.at > self.haystack.len() {
            return None;
        }
        let m = self.pattern.first_match(self.haystack, self.at)?;
        self.at = if m.is_empty() { m.end() + 1 } else { m.end() };
        Some(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(list: &MatchList<'_>) -> Vec<(usize, usize)> {
        list.iter().map(|m| (m.start(), m.end())).collect()
    }

    fn all(pattern: &str, haystack: &str) -> Vec<(usize, usize)> {
        let re = Pattern::new(pattern).unwrap();
        spans(&re.all_matches(haystack.as_bytes()))
    }

    fn first(pattern: &str, haystack: &str) -> Option<(usize, usize)> {
        Pattern::new(pattern)
            .unwrap()
            .first_match(haystack.as_bytes(), 0)
            .map(|m| (m.start(), m.end()))
    }

    #[test]
    fn scenario_plain_literal() {
        assert_eq!(first("hello", "say hello world"), Some((4, 9)));
        assert_eq!(all("hello", "say hello world"), vec![(4, 9)]);
    }

    #[test]
    fn scenario_plus() {
        assert_eq!(all("a+", "caaab"), vec![(1, 4)]);
    }

    #[test]
    fn scenario_email() {
        assert_eq!(
            all(r"[a-z]+@[a-z]+\.[a-z]+", "mail me at x@y.co please"),
            vec![(11, 17)]
        );
    }

    #[test]
    fn scenario_anchored_alternation() {
        assert_eq!(first("^(cat|dog)s?$", "dogs"), Some((0, 4)));
        assert_eq!(first("^(cat|dog)s?$", "dogson"), None);
    }

    #[test]
    fn scenario_leftmost_first() {
        assert_eq!(first("a|ab", "ab"), Some((0, 1)));
    }

    #[test]
    fn scenario_zero_width_advance() {
        assert_eq!(first("(ab)*", "ababx"), Some((0, 4)));
        assert_eq!(all("(ab)*", "ababx"), vec![(0, 4), (4, 4), (5, 5)]);
    }

    #[test]
    fn boundary_empty_pattern() {
        assert_eq!(all("", "ab"), vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(all("", ""), vec![(0, 0)]);
    }

    #[test]
    fn boundary_anchors_on_empty() {
        assert_eq!(all("^$", ""), vec![(0, 0)]);
        assert_eq!(all("^$", "x"), vec![]);
    }

    #[test]
    fn boundary_star_on_empty() {
        assert_eq!(all("a*", ""), vec![(0, 0)]);
    }

    #[test]
    fn boundary_newline() {
        assert_eq!(first(".", "\n"), None);
        assert_eq!(first(".", "\na"), Some((1, 2)));
        assert_eq!(first(r"\s", "\n"), Some((0, 1)));
    }

    #[test]
    fn tier_routing() {
        let tier = |p: &str| Pattern::new(p).unwrap().tier();
        assert_eq!(tier("hello"), Tier::Literal);
        assert_eq!(tier(""), Tier::Literal);
        assert_eq!(tier("hello[0-9]{2}"), Tier::PrefixVerify);
        assert_eq!(tier("cat|dog"), Tier::PrefilterNfa);
        assert_eq!(tier("ab+c"), Tier::PrefilterNfa);
        assert_eq!(tier(r"[a-z]+@[a-z]+\.[a-z]+"), Tier::PrefilterNfa);
        assert_eq!(tier("a+"), Tier::Nfa);
        assert_eq!(tier("^(cat|dog)s?$"), Tier::Nfa);
        assert_eq!(tier("a{3,}"), Tier::Nfa);
    }

    #[test]
    fn engine_preference() {
        let re = Pattern::builder(b"hello").engine(Engine::Backtrack).build().unwrap();
        assert_eq!(re.tier(), Tier::Nfa);
        let re = Pattern::builder(b"hello").engine(Engine::Prefilter).build().unwrap();
        assert_eq!(re.tier(), Tier::PrefixVerify);
        // Forcing an ineligible tier falls back to the automatic choice.
        let re = Pattern::builder(b"a+").engine(Engine::Literal).build().unwrap();
        assert_eq!(re.tier(), Tier::Nfa);
    }

    #[test]
    fn start_parameter() {
        assert_eq!(
            Pattern::new("ab").unwrap().first_match(b"ab ab", 1).map(|m| m.start()),
            Some(3)
        );
        // An anchored pattern tries only `start` itself.
        assert_eq!(Pattern::new("^ab").unwrap().first_match(b"ab ab", 1), None);
        assert_eq!(
            Pattern::new("^ab").unwrap().first_match(b"ab ab", 0).map(|m| m.range()),
            Some(0..2)
        );
    }

    #[test]
    fn mid_pattern_literal_candidates() {
        // The best literal sits three bytes into the match; hits that are
        // not part of a match must be rejected and not shift later ones.
        let re = Pattern::new("ab[xy]cd").unwrap();
        assert_eq!(re.tier(), Tier::PrefilterNfa);
        assert_eq!(
            spans(&re.all_matches(b"cd ab_cd abxcd")),
            vec![(9, 14)]
        );
        assert_eq!(spans(&re.all_matches(b"cdcdcd")), vec![]);
    }

    #[test]
    fn match_text_is_zero_copy() {
        let re = Pattern::new("l+").unwrap();
        let hay = b"hello".to_vec();
        let m = re.first_match(&hay, 0).unwrap();
        assert_eq!(m.text(), b"ll");
        assert_eq!(m.group(), 0);
    }

    #[test]
    fn first_match_agrees_with_all_matches() {
        for (pattern, haystack) in [
            ("a+", "caaab"),
            ("(ab)*", "ababx"),
            ("x", "no hits"),
            ("", "ab"),
        ] {
            let re = Pattern::new(pattern).unwrap();
            let list = re.all_matches(haystack.as_bytes());
            assert_eq!(
                list.first().map(|m| m.range()),
                re.first_match(haystack.as_bytes(), 0).map(|m| m.range()),
                "{pattern} on {haystack}"
            );
        }
    }

    #[test]
    fn all_matches_is_idempotent() {
        let re = Pattern::new("[ab]+").unwrap();
        let hay = b"xx abba yy ab";
        assert_eq!(spans(&re.all_matches(hay)), spans(&re.all_matches(hay)));
    }

    #[test]
    fn find_iter_matches_all_matches() {
        let re = Pattern::new("a*b").unwrap();
        let hay = b"aab b ab";
        let via_iter: Vec<_> = re.find_iter(hay).map(|m| m.range()).collect();
        let via_list: Vec<_> = re.all_matches(hay).iter().map(|m| m.range()).collect();
        assert_eq!(via_iter, via_list);
    }

    #[test]
    fn captures_api() {
        let re = Pattern::new("(a+)(b)").unwrap();
        let caps = re.captures(b"xxaab").unwrap();
        let got: Vec<(u32, usize, usize)> =
            caps.iter().map(|m| (m.group(), m.start(), m.end())).collect();
        assert_eq!(got, vec![(0, 2, 5), (1, 2, 4), (2, 4, 5)]);

        let re = Pattern::new("(ab)*").unwrap();
        let caps = re.captures(b"abab").unwrap();
        let got: Vec<(u32, usize, usize)> =
            caps.iter().map(|m| (m.group(), m.start(), m.end())).collect();
        assert_eq!(got, vec![(0, 0, 4), (1, 0, 2), (1, 2, 4)]);

        assert!(Pattern::new("z").unwrap().captures(b"abc").is_none());
    }

    #[test]
    fn step_limit_is_reported() {
        let re = Pattern::builder(b"(a|aa)(a|aa)(a|aa)b")
            .engine(Engine::Backtrack)
            .step_limit(4)
            .build()
            .unwrap();
        assert_eq!(
            re.try_first_match(b"aaaa", 0),
            Err(MatchError::StepLimitExceeded(4))
        );
        let relaxed = Pattern::builder(b"(a|aa)(a|aa)(a|aa)b").build().unwrap();
        assert_eq!(relaxed.try_first_match(b"aaaa", 0), Ok(None));
    }

    #[test]
    fn compiled_pattern_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pattern>();

        let re = Pattern::new("[ab]+c").unwrap();
        let hay = b"xx abc ba bac";
        let sequential = spans(&re.all_matches(hay));
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| scope.spawn(|| spans(&re.all_matches(hay))))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), sequential);
            }
        });
    }

    // Every tier must be indistinguishable from the backtracker.

    const PATTERNS: &[&str] = &[
        "a",
        "ab",
        "abba",
        "a+",
        "a*b",
        "ab+c",
        "(ab)*",
        "(ab)+",
        "a|ab",
        "ab|a",
        "cat|dog",
        "a{2,3}",
        "ab{2}a",
        "[ab]+0",
        "[^a]b",
        "(a|b)*0",
        "a.b",
        "ab[xy]cd",
        r"\d+",
        r"\s",
        "^ab",
        "b$",
        "a?b?0",
        "abcd0",
        "",
    ];

    fn assert_engines_agree(pattern: &str, haystack: &[u8]) {
        let reference = Pattern::builder(pattern.as_bytes())
            .engine(Engine::Backtrack)
            .build()
            .unwrap();
        let expected = spans(&reference.all_matches(haystack));
        // Ordered by start and non-overlapping.
        for pair in expected.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "{pattern}: {expected:?}");
        }
        for engine in [Engine::Auto, Engine::Prefilter, Engine::Literal] {
            let re = Pattern::builder(pattern.as_bytes()).engine(engine).build().unwrap();
            assert_eq!(
                spans(&re.all_matches(haystack)),
                expected,
                "pattern {pattern:?} under {engine:?} (tier {:?}) on {:?}",
                re.tier(),
                String::from_utf8_lossy(haystack),
            );
        }
    }

    #[test]
    fn engines_agree_on_fixed_corpus() {
        let haystacks: &[&str] = &[
            "",
            "a",
            "b",
            "ab",
            "abba",
            "aaab",
            "caaab",
            "ab ab ab",
            "xx abcd0 yy",
            "ababab",
            "a\nb",
            " cat dogs ",
            "0a0b0",
            "no hits here",
            "cd abxcd abycd cd",
        ];
        for pattern in PATTERNS {
            for haystack in haystacks {
                assert_engines_agree(pattern, haystack.as_bytes());
            }
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn engines_agree(haystack in "[ab01 .@\n]{0,40}") {
                for pattern in PATTERNS {
                    assert_engines_agree(pattern, haystack.as_bytes());
                }
            }

            #[test]
            fn all_matches_are_valid_spans(haystack in "[abc]{0,32}") {
                let re = Pattern::new("(a|b)+c?").unwrap();
                for m in re.find_iter(haystack.as_bytes()) {
                    prop_assert!(m.start() <= m.end());
                    prop_assert!(m.end() <= haystack.len());
                }
            }
        }
    }
}
