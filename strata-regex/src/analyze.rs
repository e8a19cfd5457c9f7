//! Pattern analysis.
//!
//! [`PatternAnalyzer`] walks a parsed pattern once at compile time and
//! produces everything the tier dispatcher needs: a complexity class, the
//! literals a match is guaranteed to contain, anchor flags and the minimum
//! match length. Nothing here runs during a search.

use std::mem;

use itertools::Itertools;
use strata_scan::ByteSet;

use crate::syntax::{Ast, GroupKind, Node, NodeId, NodeKind};

/// Nesting depth beyond which classification gives up and reports
/// [`Complexity::Complex`].
const MAX_DEPTH: usize = 16;

/// How expensive a pattern is to match, coarsely.
///
/// `Simple` and `Medium` patterns are candidates for the prefilter tiers;
/// `Complex` ones go straight to the backtracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

/// A substring guaranteed to appear in every match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequiredLiteral {
    pub bytes: Vec<u8>,
    /// Byte offset from the match start, when it is the same for every
    /// match; `None` when variable-width parts precede the literal.
    pub offset: Option<usize>,
    /// Whether the literal sits at the very start of every match.
    pub is_prefix: bool,
    /// Whether the literal ends every match.
    pub is_suffix: bool,
}

impl RequiredLiteral {
    fn score(&self) -> usize {
        1000
            + 10 * self.bytes.len()
            + if self.is_prefix { 100 } else { 0 }
            + if self.is_suffix { 100 } else { 0 }
            + self.offset.unwrap_or(0)
    }
}

/// The literals extracted from a pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiteralSet {
    /// Substrings appearing in every match, in pattern order.
    pub required: Vec<RequiredLiteral>,
    /// Literal prefix shared by every match.
    pub prefix: Option<Vec<u8>>,
    /// Literal suffix shared by every match.
    pub suffix: Option<Vec<u8>>,
    /// When the whole pattern is an alternation of literal strings, the
    /// branch strings in leftmost-first order.
    pub alternates: Option<Vec<Vec<u8>>>,
    /// When the whole pattern is a single literal with no metacharacters,
    /// that literal.
    pub exact: Option<Vec<u8>>,
}

impl LiteralSet {
    /// The literal worth scanning for, by score: required literals weigh
    /// 1000, each byte 10, prefix and suffix position 100 each, plus the
    /// fixed offset.
    pub fn best(&self) -> Option<&RequiredLiteral> {
        self.required.iter().max_by_key(|lit| lit.score())
    }
}

/// Everything the analyzer learned about a pattern.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub complexity: Complexity,
    pub literals: LiteralSet,
    /// The pattern can only match at position 0.
    pub anchored_start: bool,
    /// The pattern can only match ending at the end of the subject.
    pub anchored_end: bool,
    /// No subject shorter than this can match.
    pub min_match_len: usize,
    /// A mandatory leading class atom, as its byte set plus polarity
    /// (`false` for `[^...]`): the analyzer's scan hint for patterns where
    /// no literal is available.
    pub leading_class: Option<(ByteSet, bool)>,
}

/// Compile-time pattern analysis.
///
/// # Example
///
/// ```
/// use strata_regex::analyze::{Complexity, PatternAnalyzer};
/// use strata_regex::syntax::parse;
///
/// let ast = parse(b"ab+c").unwrap();
/// let analysis = PatternAnalyzer::new(&ast).analyze();
/// assert_eq!(analysis.complexity, Complexity::Simple);
/// assert_eq!(analysis.min_match_len, 3);
/// // Every match starts with "ab" and ends with "c".
/// assert_eq!(analysis.literals.prefix.as_deref(), Some(b"ab".as_slice()));
/// assert_eq!(analysis.literals.suffix.as_deref(), Some(b"c".as_slice()));
/// ```
pub struct PatternAnalyzer<'a> {
    ast: &'a Ast,
}

impl<'a> PatternAnalyzer<'a> {
    pub fn new(ast: &'a Ast) -> PatternAnalyzer<'a> {
        PatternAnalyzer { ast }
    }

    pub fn analyze(&self) -> Analysis {
        let complexity = self.classify(self.ast.root_id(), 0);
        let literals = self.extract_literals();
        let analysis = Analysis {
            complexity,
            anchored_start: self.leads_with_start(self.ast.root_id()),
            anchored_end: self.ends_with_end(self.ast.root_id()),
            min_match_len: self.min_len(self.ast.root_id()),
            leading_class: self.leading_class(),
            literals,
        };
        log::trace!(
            "analysis: {:?}, anchors ({}, {}), min len {}, best literal {:?}",
            analysis.complexity,
            analysis.anchored_start,
            analysis.anchored_end,
            analysis.min_match_len,
            analysis.literals.best().map(|l| l.bytes.as_slice()),
        );
        analysis
    }

    // ---------- complexity ----------

    fn classify(&self, id: NodeId, depth: usize) -> Complexity {
        if depth > MAX_DEPTH {
            return Complexity::Complex;
        }
        let node = self.ast.node(id);
        match &node.kind {
            NodeKind::Re => self.classify(node.children[0], depth),
            NodeKind::Element(_)
            | NodeKind::Wildcard
            | NodeKind::Space
            | NodeKind::Digit
            | NodeKind::Range { .. }
            | NodeKind::Start
            | NodeKind::End => quantifier_class(node),
            NodeKind::Or => {
                let branches = self.flatten_or(id);
                // An alternation of literal strings sharing a prefix of two
                // or more bytes stays cheap at any depth: it reduces to a
                // prefix scan plus short verification.
                if let Some(strings) = branches
                    .iter()
                    .map(|&b| self.literal_string(b))
                    .collect::<Option<Vec<_>>>()
                {
                    if common_prefix_len(&strings) >= 2 {
                        return Complexity::Simple;
                    }
                }
                if depth > 2 {
                    return Complexity::Complex;
                }
                let classes = branches
                    .iter()
                    .map(|&b| self.classify(b, depth + 1))
                    .collect_vec();
                let worst = classes.iter().copied().max().unwrap_or(Complexity::Simple);
                if branches.len() <= 5 && worst == Complexity::Simple {
                    Complexity::Simple
                } else if branches.len() > 5 {
                    worst.max(Complexity::Medium)
                } else {
                    worst
                }
            }
            NodeKind::Group(kind) => {
                let depth = match kind {
                    GroupKind::Concat => depth,
                    _ if depth > 3 => return Complexity::Complex,
                    _ => depth + 1,
                };
                if node.is_quantified() {
                    // A repeated run of literals, or a repeated literal
                    // alternation like `(a|b)*`, backtracks cheaply.
                    if self.literal_children(node).is_some() {
                        return Complexity::Simple;
                    }
                    if let [only] = node.children[..] {
                        if let NodeKind::Or = self.ast.node(only).kind {
                            let all_literal = self
                                .flatten_or(only)
                                .iter()
                                .all(|&b| self.literal_string(b).is_some());
                            if all_literal {
                                return Complexity::Simple;
                            }
                        }
                    }
                }
                let worst = node
                    .children
                    .iter()
                    .map(|&c| self.classify(c, depth))
                    .max()
                    .unwrap_or(Complexity::Simple);
                worst.max(quantifier_class(node))
            }
        }
    }

    /// Flattens a right-associative OR chain into its branches.
    fn flatten_or(&self, id: NodeId) -> Vec<NodeId> {
        let node = self.ast.node(id);
        let mut branches = vec![node.children[0]];
        let mut rest = node.children[1];
        while let NodeKind::Or = self.ast.node(rest).kind {
            branches.push(self.ast.node(rest).children[0]);
            rest = self.ast.node(rest).children[1];
        }
        branches.push(rest);
        branches
    }

    /// The byte string a node matches, if it is a plain unquantified
    /// literal run (an element, or a group of elements).
    fn literal_string(&self, id: NodeId) -> Option<Vec<u8>> {
        let node = self.ast.node(id);
        match &node.kind {
            NodeKind::Element(b) if !node.is_quantified() => Some(vec![*b]),
            NodeKind::Group(_) if !node.is_quantified() => self.literal_children(node),
            _ => None,
        }
    }

    /// The byte string of a group's children, if all of them are plain
    /// elements. Ignores the group's own quantifier.
    fn literal_children(&self, node: &Node) -> Option<Vec<u8>> {
        let mut bytes = Vec::with_capacity(node.children.len());
        for &child in &node.children {
            match self.ast.node(child) {
                Node { kind: NodeKind::Element(b), min: 1, max: Some(1), .. } => bytes.push(*b),
                _ => return None,
            }
        }
        Some(bytes)
    }

    // ---------- literals ----------

    fn extract_literals(&self) -> LiteralSet {
        let outer = self.ast.outer();
        let mut extract = Extract {
            ast: self.ast,
            runs: Vec::new(),
            run: Vec::new(),
            run_offset: Some(0),
            offset: Some(0),
            exact: true,
        };
        extract.walk(&outer.children);
        extract.flush(true);

        let exact = extract.exact.then(|| {
            extract.runs.first().map(|r| r.bytes.clone()).unwrap_or_default()
        });
        let mut set = LiteralSet {
            prefix: extract
                .runs
                .iter()
                .find(|r| r.is_prefix)
                .map(|r| r.bytes.clone()),
            suffix: extract
                .runs
                .iter()
                .rev()
                .find(|r| r.is_suffix)
                .map(|r| r.bytes.clone()),
            required: extract.runs,
            alternates: self.extract_alternates(outer),
            exact,
        };
        // An alternation contributes its shared prefix, which is required
        // in every match even though no single concat run covers it.
        if set.required.is_empty() {
            if let Some(alternates) = &set.alternates {
                let len = common_prefix_len(alternates);
                if len > 0 {
                    let bytes = alternates[0][..len].to_vec();
                    set.prefix = Some(bytes.clone());
                    set.required.push(RequiredLiteral {
                        bytes,
                        offset: Some(0),
                        is_prefix: true,
                        is_suffix: false,
                    });
                }
            }
        }
        set
    }

    /// Branch strings when the whole pattern is an alternation of literal
    /// strings.
    fn extract_alternates(&self, outer: &Node) -> Option<Vec<Vec<u8>>> {
        if outer.children.len() != 1 {
            return None;
        }
        let mut id = outer.children[0];
        loop {
            let node = self.ast.node(id);
            match &node.kind {
                NodeKind::Group(_) if !node.is_quantified() && node.children.len() == 1 => {
                    id = node.children[0];
                }
                NodeKind::Or => break,
                _ => return None,
            }
        }
        self.flatten_or(id)
            .iter()
            .map(|&b| self.literal_string(b))
            .collect()
    }

    // ---------- shape ----------

    /// Total match width of a node when it is the same for every match.
    fn fixed_width(&self, id: NodeId) -> Option<usize> {
        let node = self.ast.node(id);
        let per: usize = match &node.kind {
            NodeKind::Element(_)
            | NodeKind::Wildcard
            | NodeKind::Space
            | NodeKind::Digit
            | NodeKind::Range { .. } => 1,
            NodeKind::Start | NodeKind::End => 0,
            NodeKind::Or => {
                let left = self.fixed_width(node.children[0])?;
                let right = self.fixed_width(node.children[1])?;
                if left == right {
                    left
                } else {
                    return None;
                }
            }
            NodeKind::Group(_) | NodeKind::Re => {
                let mut total = 0;
                for &child in &node.children {
                    total += self.fixed_width(child)?;
                }
                total
            }
        };
        if per == 0 {
            return Some(0);
        }
        match (node.min, node.max) {
            (n, Some(m)) if n == m => Some(per * n as usize),
            _ => None,
        }
    }

    fn min_len(&self, id: NodeId) -> usize {
        let node = self.ast.node(id);
        let per: usize = match &node.kind {
            NodeKind::Element(_)
            | NodeKind::Wildcard
            | NodeKind::Space
            | NodeKind::Digit
            | NodeKind::Range { .. } => 1,
            NodeKind::Start | NodeKind::End => 0,
            NodeKind::Or => node
                .children
                .iter()
                .map(|&c| self.min_len(c))
                .min()
                .unwrap_or(0),
            NodeKind::Group(_) | NodeKind::Re => {
                node.children.iter().map(|&c| self.min_len(c)).sum()
            }
        };
        per * node.min as usize
    }

    fn leads_with_start(&self, id: NodeId) -> bool {
        let node = self.ast.node(id);
        match &node.kind {
            NodeKind::Start => true,
            NodeKind::Re => self.leads_with_start(node.children[0]),
            NodeKind::Group(_) if node.min >= 1 => node
                .children
                .first()
                .is_some_and(|&c| self.leads_with_start(c)),
            NodeKind::Or => {
                self.leads_with_start(node.children[0])
                    && self.leads_with_start(node.children[1])
            }
            _ => false,
        }
    }

    fn ends_with_end(&self, id: NodeId) -> bool {
        let node = self.ast.node(id);
        match &node.kind {
            NodeKind::End => true,
            NodeKind::Re => self.ends_with_end(node.children[0]),
            NodeKind::Group(_) if node.min >= 1 => node
                .children
                .last()
                .is_some_and(|&c| self.ends_with_end(c)),
            NodeKind::Or => {
                self.ends_with_end(node.children[0]) && self.ends_with_end(node.children[1])
            }
            _ => false,
        }
    }

    fn leading_class(&self) -> Option<(ByteSet, bool)> {
        let &first = self.ast.outer().children.first()?;
        let node = self.ast.node(first);
        if node.min == 0 {
            return None;
        }
        match &node.kind {
            NodeKind::Range { set, positive } => Some((*set, *positive)),
            NodeKind::Digit => Some((digit_set(), true)),
            NodeKind::Space => Some((space_set(), true)),
            _ => None,
        }
    }
}

pub(crate) fn digit_set() -> ByteSet {
    let mut set = ByteSet::new();
    set.insert_range(b'0', b'9');
    set
}

pub(crate) fn space_set() -> ByteSet {
    ByteSet::from_bytes(b" \t\n\r\x0C")
}

fn quantifier_class(node: &Node) -> Complexity {
    match (node.min, node.max) {
        (0 | 1, None) => Complexity::Simple,
        (_, None) => Complexity::Complex,
        (n, Some(m)) => {
            let spread = (m - n) as usize;
            if spread <= 10 {
                Complexity::Simple
            } else if spread <= 100 {
                Complexity::Medium
            } else {
                Complexity::Complex
            }
        }
    }
}

fn common_prefix_len(strings: &[Vec<u8>]) -> usize {
    let Some(first) = strings.first() else { return 0 };
    let mut len = first.len();
    for s in &strings[1..] {
        len = len
            .min(s.len())
            .min(first.iter().zip(s.iter()).take_while(|(a, b)| a == b).count());
    }
    len
}

/// Walks a concatenation collecting maximal mandatory literal runs.
struct Extract<'a> {
    ast: &'a Ast,
    runs: Vec<RequiredLiteral>,
    run: Vec<u8>,
    run_offset: Option<usize>,
    offset: Option<usize>,
    exact: bool,
}

impl Extract<'_> {
    fn walk(&mut self, children: &[NodeId]) {
        for &child in children {
            let node = self.ast.node(child);
            match &node.kind {
                NodeKind::Element(b) => self.element(*b, node),
                // Anchors are zero-width; they neither break a run nor
                // move the offset.
                NodeKind::Start | NodeKind::End => self.exact = false,
                NodeKind::Group(_) if !node.is_quantified() => {
                    self.exact = false;
                    self.walk(&node.children);
                }
                NodeKind::Group(_) if node.min >= 1 => {
                    self.exact = false;
                    match (PatternAnalyzer { ast: self.ast }).literal_children(node) {
                        Some(bytes) => {
                            self.push_bytes(&bytes, node.min as usize);
                            if node.max != Some(node.min) {
                                self.flush(false);
                                self.offset = None;
                            }
                        }
                        None => self.opaque(child),
                    }
                }
                _ => self.opaque(child),
            }
        }
    }

    fn element(&mut self, b: u8, node: &Node) {
        match (node.min, node.max) {
            (1, Some(1)) => self.push_bytes(&[b], 1),
            (n, Some(m)) if n == m => {
                self.exact = false;
                self.push_bytes(&[b], n as usize);
            }
            (n, _) => {
                self.exact = false;
                if n >= 1 {
                    self.push_bytes(&[b], n as usize);
                }
                self.flush(false);
                self.offset = None;
            }
        }
    }

    fn push_bytes(&mut self, bytes: &[u8], count: usize) {
        if count == 0 || bytes.is_empty() {
            return;
        }
        if self.run.is_empty() {
            self.run_offset = self.offset;
        }
        for _ in 0..count {
            self.run.extend_from_slice(bytes);
        }
        self.offset = self.offset.map(|o| o + bytes.len() * count);
    }

    /// A node no literal can be pulled from: seal the current run and move
    /// the offset past it.
    fn opaque(&mut self, id: NodeId) {
        self.exact = false;
        self.flush(false);
        let width = PatternAnalyzer { ast: self.ast }.fixed_width(id);
        self.offset = match (self.offset, width) {
            (Some(o), Some(w)) => Some(o + w),
            _ => None,
        };
    }

    fn flush(&mut self, at_end: bool) {
        if !self.run.is_empty() {
            let bytes = mem::take(&mut self.run);
            self.runs.push(RequiredLiteral {
                is_prefix: self.run_offset == Some(0),
                is_suffix: at_end,
                offset: self.run_offset,
                bytes,
            });
        }
        self.run_offset = None;
    }
}
