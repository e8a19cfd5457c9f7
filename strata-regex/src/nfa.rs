//! The reference matcher: a recursive backtracking walk of the syntax tree.
//!
//! Quantifiers are greedy with backtracking over repetition counts; an
//! alternation commits to its first matching branch. Every other execution
//! tier must be indistinguishable from this walker.

use crate::error::MatchError;
use crate::syntax::{Ast, GroupKind, NodeId, NodeKind};

/// A capturing-group span recorded during a search. Quantified groups
/// record one span per repetition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CapSpan {
    pub group: u32,
    pub start: usize,
    pub end: usize,
}

pub(crate) struct Backtracker<'a> {
    ast: &'a Ast,
    step_limit: Option<usize>,
}

impl<'a> Backtracker<'a> {
    pub fn new(ast: &'a Ast, step_limit: Option<usize>) -> Backtracker<'a> {
        Backtracker { ast, step_limit }
    }

    /// Attempts an anchored match at `at`, returning the end offset.
    pub fn match_at(&self, text: &[u8], at: usize) -> Result<Option<usize>, MatchError> {
        self.run(text, at).map(|r| r.map(|(end, _)| end))
    }

    /// Like [`Backtracker::match_at`], but also returns the capturing-group
    /// spans the winning path recorded.
    pub fn captures_at(
        &self,
        text: &[u8],
        at: usize,
    ) -> Result<Option<(usize, Vec<CapSpan>)>, MatchError> {
        self.run(text, at)
    }

    fn run(
        &self,
        text: &[u8],
        at: usize,
    ) -> Result<Option<(usize, Vec<CapSpan>)>, MatchError> {
        let mut search = Search {
            ast: self.ast,
            text,
            steps: 0,
            step_limit: self.step_limit,
            caps: Vec::new(),
        };
        let end = search.match_one(self.ast.root_id(), at)?;
        Ok(end.map(|end| (end, search.caps)))
    }
}

struct Search<'a, 'h> {
    ast: &'a Ast,
    text: &'h [u8],
    steps: usize,
    step_limit: Option<usize>,
    caps: Vec<CapSpan>,
}

impl Search<'_, '_> {
    fn step(&mut self) -> Result<(), MatchError> {
        self.steps += 1;
        match self.step_limit {
            Some(limit) if self.steps > limit => Err(MatchError::StepLimitExceeded(limit)),
            _ => Ok(()),
        }
    }

    /// Matches a sibling sequence from position `at`.
    fn match_seq(&mut self, children: &[NodeId], at: usize) -> Result<Option<usize>, MatchError> {
        let Some((&head, rest)) = children.split_first() else {
            return Ok(Some(at));
        };
        let node = self.ast.node(head);
        if !node.is_quantified() {
            let mark = self.caps.len();
            if let Some(end) = self.match_one(head, at)? {
                if let Some(end) = self.match_seq(rest, end)? {
                    return Ok(Some(end));
                }
            }
            self.caps.truncate(mark);
            return Ok(None);
        }

        // Greedy with backtracking: consume as many repetitions as the
        // bounds allow, then give them back one at a time until the rest of
        // the sequence fits.
        let min = node.min as usize;
        let max = node.max.map(|m| m as usize);
        let mut ends = vec![at];
        let mut marks = vec![self.caps.len()];
        let mut zero_width = false;
        loop {
            if max.is_some_and(|m| ends.len() - 1 >= m) {
                break;
            }
            let last = *ends.last().unwrap();
            match self.match_one(head, last)? {
                Some(end) if end > last => {
                    ends.push(end);
                    marks.push(self.caps.len());
                }
                Some(_) => {
                    // A zero-width repetition would repeat forever; it also
                    // satisfies any repetitions still owed.
                    zero_width = true;
                    break;
                }
                None => break,
            }
        }
        let reps = ends.len() - 1;
        if reps < min && !zero_width {
            self.caps.truncate(marks[0]);
            return Ok(None);
        }
        for k in (min.min(reps)..=reps).rev() {
            self.caps.truncate(marks[k]);
            if let Some(end) = self.match_seq(rest, ends[k])? {
                return Ok(Some(end));
            }
        }
        self.caps.truncate(marks[0]);
        Ok(None)
    }

    /// Matches a single occurrence of a node, ignoring its quantifier.
    fn match_one(&mut self, id: NodeId, at: usize) -> Result<Option<usize>, MatchError> {
        self.step()?;
        let node = self.ast.node(id);
        let byte = self.text.get(at).copied();
        Ok(match &node.kind {
            NodeKind::Element(b) => (byte == Some(*b)).then(|| at + 1),
            NodeKind::Wildcard => {
                (byte.is_some() && byte != Some(b'\n')).then(|| at + 1)
            }
            NodeKind::Space => {
                matches!(byte, Some(b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')).then(|| at + 1)
            }
            NodeKind::Digit => byte.is_some_and(|b| b.is_ascii_digit()).then(|| at + 1),
            NodeKind::Range { set, positive } => byte
                .is_some_and(|b| set.contains(b) == *positive)
                .then(|| at + 1),
            NodeKind::Start => (at == 0).then_some(at),
            NodeKind::End => (at == self.text.len()).then_some(at),
            NodeKind::Or => {
                // Leftmost-first: commit to the first branch that matches.
                let mark = self.caps.len();
                match self.match_one(node.children[0], at)? {
                    Some(end) => Some(end),
                    None => {
                        self.caps.truncate(mark);
                        self.match_one(node.children[1], at)?
                    }
                }
            }
            NodeKind::Group(kind) => match self.match_seq(&node.children, at)? {
                Some(end) => {
                    if let GroupKind::Capturing(index) = kind {
                        self.caps.push(CapSpan { group: *index, start: at, end });
                    }
                    Some(end)
                }
                None => None,
            },
            NodeKind::Re => self.match_seq(&node.children, at)?,
        })
    }
}
