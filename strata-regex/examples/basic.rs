use strata_regex::{Engine, Pattern, Tier};

fn main() {
    let re = Pattern::new("hello").unwrap();
    assert_eq!(re.tier(), Tier::Literal);
    assert!(re.is_match(b"say hello world"));

    let re = Pattern::new(r"[a-z]+@[a-z]+\.[a-z]+").unwrap();
    let hay = b"mail me at x@y.co please";
    for m in re.find_iter(hay) {
        println!(
            "{:?} at {}..{}",
            String::from_utf8_lossy(m.text()),
            m.start(),
            m.end()
        );
    }

    let re = Pattern::new(r"\d{4}-\d{2}-\d{2}").unwrap();
    let hay = b"1865-04-14, 1881-07-02 and 1963-11-22";
    assert_eq!(re.all_matches(hay).len(), 3);

    // The engine preference exists for comparisons; results never differ.
    let reference = Pattern::builder(br"\d{4}-\d{2}-\d{2}")
        .engine(Engine::Backtrack)
        .build()
        .unwrap();
    assert_eq!(reference.all_matches(hay).len(), 3);
}
