//! Recursive-descent pattern parser.
//!
//! Precedence, lowest to highest: alternation, concatenation, postfix
//! quantification. Every concatenation sequence is wrapped in a synthetic
//! concat group; explicit `(...)` groups reuse that node rather than adding
//! a second layer.

use strata_scan::ByteSet;

use crate::error::CompileError;
use crate::syntax::ast::{Ast, AstBuilder, GroupKind, Node, NodeKind, NodeId};
use crate::syntax::lexer::{lex, Spanned, Token};

/// Parses a pattern into its syntax tree.
///
/// # Example
///
/// ```
/// use strata_regex::syntax::{parse, NodeKind};
///
/// let ast = parse(b"ab+").unwrap();
/// let outer = ast.outer();
/// assert_eq!(outer.children.len(), 2);
/// let plus = ast.node(outer.children[1]);
/// assert_eq!(plus.kind, NodeKind::Element(b'b'));
/// assert_eq!((plus.min, plus.max), (1, None));
///
/// assert!(parse(b"a{3,1}").is_err());
/// ```
pub fn parse(pattern: &[u8]) -> Result<Ast, CompileError> {
    let tokens = lex(pattern)?;
    Parser { tokens: &tokens, pos: 0, builder: Ast::builder() }.run()
}

struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    builder: AstBuilder,
}

impl Parser<'_> {
    fn run(mut self) -> Result<Ast, CompileError> {
        let top = self.parse_alternation()?;
        if self.pos < self.tokens.len() {
            // Only a stray `)` stops the descent early.
            return Err(CompileError::UnterminatedGroup);
        }
        let outer = if matches!(self.builder.node(top).kind, NodeKind::Group(_)) {
            top
        } else {
            // A top-level alternation still gets a single outermost group.
            self.builder
                .push(Node::with_children(NodeKind::Group(GroupKind::Concat), vec![top]))
        };
        let root = self.builder.push(Node::with_children(NodeKind::Re, vec![outer]));
        Ok(self.builder.finish(root))
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|s| s.token)
    }

    fn peek_at(&self, ahead: usize) -> Option<Token> {
        self.tokens.get(self.pos + ahead).map(|s| s.token)
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn parse_alternation(&mut self) -> Result<NodeId, CompileError> {
        let first = self.parse_concat()?;
        if self.peek() == Some(Token::Bar) {
            self.pos += 1;
            let rest = self.parse_alternation()?;
            return Ok(self
                .builder
                .push(Node::with_children(NodeKind::Or, vec![first, rest])));
        }
        Ok(first)
    }

    fn parse_concat(&mut self) -> Result<NodeId, CompileError> {
        let mut children = Vec::new();
        loop {
            match self.peek() {
                None | Some(Token::Bar) | Some(Token::CloseGroup) => break,
                Some(_) => {}
            }
            let atom = self.parse_atom()?;
            let atom = self.apply_quantifier(atom)?;
            children.push(atom);
        }
        Ok(self
            .builder
            .push(Node::with_children(NodeKind::Group(GroupKind::Concat), children)))
    }

    fn parse_atom(&mut self) -> Result<NodeId, CompileError> {
        let token = self.next_token().expect("caller checked for a token");
        let node = match token {
            Token::Element(b) => Node::new(NodeKind::Element(b)),
            Token::Wildcard => Node::new(NodeKind::Wildcard),
            Token::Space => Node::new(NodeKind::Space),
            Token::Digit => Node::new(NodeKind::Digit),
            Token::Start => Node::new(NodeKind::Start),
            Token::Dollar => Node::new(NodeKind::End),
            // Structural bytes with no construct to belong to read as
            // themselves.
            Token::Circumflex => Node::new(NodeKind::Element(b'^')),
            Token::CloseClass => Node::new(NodeKind::Element(b']')),
            Token::CloseBrace => Node::new(NodeKind::Element(b'}')),
            Token::Comma => Node::new(NodeKind::Element(b',')),
            Token::Dash => Node::new(NodeKind::Element(b'-')),
            Token::OpenClass => return self.parse_class(),
            Token::OpenGroup => return self.parse_group(),
            Token::Star | Token::Plus | Token::Question | Token::OpenBrace => {
                return Err(CompileError::BadQuantifier)
            }
            Token::Bar | Token::CloseGroup => unreachable!("handled by parse_concat"),
        };
        Ok(self.builder.push(node))
    }

    /// Parses a class body; the `[` is already consumed.
    fn parse_class(&mut self) -> Result<NodeId, CompileError> {
        let mut positive = true;
        if self.peek() == Some(Token::Circumflex) {
            self.pos += 1;
            positive = false;
        }
        let mut set = ByteSet::new();
        loop {
            let Some(&Spanned { token, at }) = self.tokens.get(self.pos) else {
                return Err(CompileError::UnterminatedClass);
            };
            self.pos += 1;
            match token {
                Token::CloseClass => break,
                Token::Space => {
                    for &b in b" \t\n\r\x0C" {
                        set.insert(b);
                    }
                }
                Token::Digit => set.insert_range(b'0', b'9'),
                token => {
                    let lo = class_byte(token).ok_or(CompileError::BadToken(at))?;
                    // A dash counts as a range only with a right endpoint.
                    if self.peek() == Some(Token::Dash)
                        && !matches!(self.peek_at(1), None | Some(Token::CloseClass))
                    {
                        let dash_at = self.tokens[self.pos].at;
                        self.pos += 1;
                        let Spanned { token: hi_token, at: hi_at } = self.tokens[self.pos];
                        self.pos += 1;
                        let hi = class_byte(hi_token).ok_or(CompileError::BadToken(hi_at))?;
                        if lo > hi {
                            return Err(CompileError::BadToken(dash_at));
                        }
                        set.insert_range(lo, hi);
                    } else {
                        set.insert(lo);
                    }
                }
            }
        }
        Ok(self.builder.push(Node::new(NodeKind::Range { set, positive })))
    }

    /// Parses a group body; the `(` is already consumed.
    fn parse_group(&mut self) -> Result<NodeId, CompileError> {
        let kind = if self.peek() == Some(Token::Question) {
            let question_at = self.tokens[self.pos].at;
            self.pos += 1;
            match self.peek() {
                Some(Token::Element(b':')) => {
                    self.pos += 1;
                    GroupKind::NonCapturing
                }
                _ => return Err(CompileError::BadToken(question_at)),
            }
        } else {
            GroupKind::Capturing(self.builder.next_group())
        };
        let inner = self.parse_alternation()?;
        match self.peek() {
            Some(Token::CloseGroup) => self.pos += 1,
            _ => return Err(CompileError::UnterminatedGroup),
        }
        if matches!(self.builder.node(inner).kind, NodeKind::Group(GroupKind::Concat)) {
            self.builder.node_mut(inner).kind = NodeKind::Group(kind);
            Ok(inner)
        } else {
            Ok(self
                .builder
                .push(Node::with_children(NodeKind::Group(kind), vec![inner])))
        }
    }

    fn apply_quantifier(&mut self, atom: NodeId) -> Result<NodeId, CompileError> {
        let (min, max) = match self.peek() {
            Some(Token::Star) => {
                self.pos += 1;
                (0, None)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                (1, None)
            }
            Some(Token::Question) => {
                self.pos += 1;
                (0, Some(1))
            }
            Some(Token::OpenBrace) => {
                self.pos += 1;
                self.parse_bounds()?
            }
            _ => return Ok(atom),
        };
        let node = self.builder.node_mut(atom);
        if matches!(node.kind, NodeKind::Start | NodeKind::End) {
            // Nothing to repeat.
            return Err(CompileError::BadQuantifier);
        }
        node.min = min;
        node.max = max;
        Ok(atom)
    }

    /// Parses `n}`, `n,}` or `n,m}`; the `{` is already consumed. The lexer
    /// guarantees the interior holds only digits and commas and that the
    /// closing brace exists.
    fn parse_bounds(&mut self) -> Result<(u32, Option<u32>), CompileError> {
        let min = self.parse_number()?.ok_or(CompileError::BadQuantifier)?;
        match self.next_token() {
            Some(Token::CloseBrace) => Ok((min, Some(min))),
            Some(Token::Comma) => {
                let max = self.parse_number()?;
                match self.next_token() {
                    Some(Token::CloseBrace) => {
                        if max.is_some_and(|m| min > m) {
                            return Err(CompileError::BadQuantifier);
                        }
                        Ok((min, max))
                    }
                    _ => Err(CompileError::BadQuantifier),
                }
            }
            _ => unreachable!("lexer constrains brace interiors"),
        }
    }

    fn parse_number(&mut self) -> Result<Option<u32>, CompileError> {
        let mut value: Option<u32> = None;
        while let Some(Token::Element(b)) = self.peek() {
            debug_assert!(b.is_ascii_digit());
            self.pos += 1;
            let next = value
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add((b - b'0') as u32))
                .ok_or(CompileError::BadQuantifier)?;
            value = Some(next);
        }
        Ok(value)
    }
}

/// The literal byte a token denotes when it appears inside a class.
fn class_byte(token: Token) -> Option<u8> {
    match token {
        Token::Element(b) => Some(b),
        Token::Wildcard => Some(b'.'),
        Token::Dollar => Some(b'$'),
        Token::Circumflex | Token::Start => Some(b'^'),
        Token::OpenGroup => Some(b'('),
        Token::CloseGroup => Some(b')'),
        Token::OpenClass => Some(b'['),
        Token::OpenBrace => Some(b'{'),
        Token::CloseBrace => Some(b'}'),
        Token::Comma => Some(b','),
        Token::Dash => Some(b'-'),
        Token::Star => Some(b'*'),
        Token::Plus => Some(b'+'),
        Token::Question => Some(b'?'),
        Token::Bar => Some(b'|'),
        Token::Space | Token::Digit | Token::CloseClass => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(pattern: &str) -> Ast {
        parse(pattern.as_bytes()).unwrap()
    }

    fn parse_err(pattern: &str) -> CompileError {
        parse(pattern.as_bytes()).unwrap_err()
    }

    #[test]
    fn structure_invariants() {
        let ast = parse_str("a(b|c)*d");
        // RE has exactly one child, the outermost group.
        assert_eq!(ast.root().children.len(), 1);
        assert!(matches!(ast.outer().kind, NodeKind::Group(_)));
        // Every OR node has exactly two children.
        for node in ast.nodes() {
            if matches!(node.kind, NodeKind::Or) {
                assert_eq!(node.children.len(), 2);
            }
            if let Some(max) = node.max {
                assert!(node.min <= max);
            }
        }
    }

    #[test]
    fn concat_of_leaves() {
        let ast = parse_str("ab.");
        let outer = ast.outer();
        assert_eq!(outer.children.len(), 3);
        assert_eq!(ast.node(outer.children[0]).kind, NodeKind::Element(b'a'));
        assert_eq!(ast.node(outer.children[1]).kind, NodeKind::Element(b'b'));
        assert_eq!(ast.node(outer.children[2]).kind, NodeKind::Wildcard);
    }

    #[test]
    fn alternation_is_right_associative() {
        let ast = parse_str("a|b|c");
        let or = ast.node(ast.outer().children[0]);
        assert_eq!(or.kind, NodeKind::Or);
        let right = ast.node(or.children[1]);
        assert_eq!(right.kind, NodeKind::Or);
    }

    #[test]
    fn quantifiers() {
        let ast = parse_str("a*b+c?d{3}e{2,}f{1,4}");
        let outer = ast.outer();
        let bounds: Vec<(u32, Option<u32>)> = outer
            .children
            .iter()
            .map(|&id| (ast.node(id).min, ast.node(id).max))
            .collect();
        assert_eq!(
            bounds,
            vec![
                (0, None),
                (1, None),
                (0, Some(1)),
                (3, Some(3)),
                (2, None),
                (1, Some(4)),
            ]
        );
    }

    #[test]
    fn classes() {
        let ast = parse_str("[a-c]");
        let node = ast.node(ast.outer().children[0]);
        match &node.kind {
            NodeKind::Range { set, positive } => {
                assert!(*positive);
                assert_eq!(set.iter().collect::<Vec<_>>(), b"abc");
            }
            kind => panic!("unexpected {kind:?}"),
        }

        let ast = parse_str("[^ab]");
        match &ast.node(ast.outer().children[0]).kind {
            NodeKind::Range { set, positive } => {
                assert!(!*positive);
                assert_eq!(set.len(), 2);
            }
            kind => panic!("unexpected {kind:?}"),
        }
    }

    #[test]
    fn class_oddities() {
        // Leading and trailing dashes are literal.
        let ast = parse_str("[-a]");
        match &ast.node(ast.outer().children[0]).kind {
            NodeKind::Range { set, .. } => {
                assert_eq!(set.iter().collect::<Vec<_>>(), b"-a")
            }
            kind => panic!("unexpected {kind:?}"),
        }
        let ast = parse_str("[a-]");
        match &ast.node(ast.outer().children[0]).kind {
            NodeKind::Range { set, .. } => {
                assert_eq!(set.iter().collect::<Vec<_>>(), b"-a")
            }
            kind => panic!("unexpected {kind:?}"),
        }
        // `\d` expands inside a class.
        let ast = parse_str(r"[\dx]");
        match &ast.node(ast.outer().children[0]).kind {
            NodeKind::Range { set, .. } => {
                assert_eq!(set.iter().collect::<Vec<_>>(), b"0123456789x")
            }
            kind => panic!("unexpected {kind:?}"),
        }
        // Structural bytes are plain members.
        let ast = parse_str("[.$(]");
        match &ast.node(ast.outer().children[0]).kind {
            NodeKind::Range { set, .. } => {
                assert_eq!(set.iter().collect::<Vec<_>>(), b"$(.")
            }
            kind => panic!("unexpected {kind:?}"),
        }
    }

    #[test]
    fn groups_and_numbering() {
        let ast = parse_str("(a)(?:b)((c))");
        assert_eq!(ast.group_count(), 3);
        let outer = ast.outer();
        assert_eq!(
            ast.node(outer.children[0]).kind,
            NodeKind::Group(GroupKind::Capturing(1))
        );
        assert_eq!(
            ast.node(outer.children[1]).kind,
            NodeKind::Group(GroupKind::NonCapturing)
        );
        let second = ast.node(outer.children[2]);
        assert_eq!(second.kind, NodeKind::Group(GroupKind::Capturing(2)));
        assert_eq!(
            ast.node(second.children[0]).kind,
            NodeKind::Group(GroupKind::Capturing(3))
        );
    }

    #[test]
    fn quantified_group() {
        let ast = parse_str("(ab)*");
        let group = ast.node(ast.outer().children[0]);
        assert_eq!(group.kind, NodeKind::Group(GroupKind::Capturing(1)));
        assert_eq!((group.min, group.max), (0, None));
        assert_eq!(group.children.len(), 2);
    }

    #[test]
    fn stray_bytes_are_literal() {
        let ast = parse_str("a,b-c]}");
        let outer = ast.outer();
        let bytes: Vec<u8> = outer
            .children
            .iter()
            .map(|&id| match ast.node(id).kind {
                NodeKind::Element(b) => b,
                ref kind => panic!("unexpected {kind:?}"),
            })
            .collect();
        assert_eq!(bytes, b"a,b-c]}");
    }

    #[test]
    fn errors() {
        assert_eq!(parse_err("(a"), CompileError::UnterminatedGroup);
        assert_eq!(parse_err("a)"), CompileError::UnterminatedGroup);
        assert_eq!(parse_err("[ab"), CompileError::UnterminatedClass);
        assert_eq!(parse_err("*a"), CompileError::BadQuantifier);
        assert_eq!(parse_err("{2}a"), CompileError::BadQuantifier);
        assert_eq!(parse_err("a|*"), CompileError::BadQuantifier);
        assert_eq!(parse_err("a**"), CompileError::BadQuantifier);
        assert_eq!(parse_err("a{}"), CompileError::BadQuantifier);
        assert_eq!(parse_err("a{,3}"), CompileError::BadQuantifier);
        assert_eq!(parse_err("a{3,1}"), CompileError::BadQuantifier);
        assert_eq!(parse_err("a{1,2,3}"), CompileError::BadQuantifier);
        assert_eq!(parse_err("^*"), CompileError::BadQuantifier);
        assert_eq!(parse_err("a{99999999999}"), CompileError::BadQuantifier);
        assert_eq!(parse_err("[z-a]"), CompileError::BadToken(2));
        assert_eq!(parse_err("(?<x>a)"), CompileError::BadToken(1));
        assert_eq!(parse_err(r"[a-\d]"), CompileError::BadToken(3));
    }

    #[test]
    fn empty_pattern() {
        let ast = parse_str("");
        assert_eq!(ast.outer().children.len(), 0);
    }

    #[test]
    fn literal_round_trip() {
        for pattern in ["hello", "a,b-c]}", "tabs\tand spaces", "12345"] {
            let ast = parse_str(pattern);
            assert_eq!(ast.to_pattern(), pattern.as_bytes(), "{pattern}");
        }
    }

    #[test]
    fn unparse_structures() {
        for pattern in [
            "a+b*c?",
            "x{3}y{2,}z{1,4}",
            "(cat|dog)s?",
            "(?:ab)+",
            "^a.b$",
            r"\s\d",
            r"\.\*",
        ] {
            let ast = parse_str(pattern);
            assert_eq!(
                String::from_utf8(ast.to_pattern()).unwrap(),
                pattern,
                "{pattern}"
            );
        }
    }
}
