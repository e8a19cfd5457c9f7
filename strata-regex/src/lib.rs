/*!
A tiered regular expression engine.

A pattern is parsed into a syntax tree, classified by the
[analyzer](analyze), and routed to the cheapest matcher that produces
answers indistinguishable from the reference backtracker:

- an **exact literal** skips the regex engine entirely and returns
  substring-scan hits verbatim;
- a pattern with a **literal prefix**, a **required literal**, a **literal
  alternation** or a **mandatory leading class** scans for candidates with
  the [`strata-scan`](strata_scan) primitives and verifies each candidate
  with the backtracker;
- everything else runs on the backtracker alone.

Subjects and patterns are byte sequences; positions are byte offsets and
invalid UTF-8 is not an error.

## Usage
```
use strata_regex::Pattern;

let re = Pattern::new(r"[a-z]+@[a-z]+\.[a-z]+").unwrap();
let hay = b"mail me at x@y.co please";
let m = re.first_match(hay, 0).unwrap();
assert_eq!(m.text(), b"x@y.co");
assert_eq!(re.all_matches(hay).len(), 1);
```

Compilation is configurable through the builder:
```
use strata_regex::{Engine, Pattern};

let re = Pattern::builder(b"(a+)+b")
    .engine(Engine::Backtrack)
    .step_limit(1_000_000)
    .build()
    .unwrap();
assert!(matches!(re.try_first_match(b"aab", 0), Ok(Some(_))));
```

## Supported syntax

See [`syntax`]. Not supported: Unicode property classes, lookaround,
backreferences and POSIX leftmost-longest semantics. Alternation is
leftmost-first throughout, like Perl-style backtracking engines.
*/
pub mod analyze;
mod error;
mod matches;
mod nfa;
mod prefilter;
mod pattern;
pub mod syntax;

pub use error::{CompileError, MatchError};
pub use matches::{Match, MatchList};
pub use pattern::{compile, Engine, Matches, Pattern, Tier};
