//! Quantified invariants over the tokenizer and detokenizer.

use unitok_core::{Config, Detokenizer, Tokenizer};

const SAMPLES: &[&str] = &[
    "Capt. O'Connor's car can't've cost $100,000.",
    "Mr. Miller (Mary's ex-brother-in-law) can't afford $15,000.00.",
    r#"("Hello,world!")"#,
    "peace-loving T-shirt",
    "Visit https://www.youtube.com/watch?v=AaZ_RSt0KP8 now.",
    "A line with\u{00A0}odd\u{2000}spaces and a soft\u{00AD}hyphen.",
    "Numbers: 1,234.56 and -7 and 3:45.",
    "",
    "   ",
    "!!!",
];

fn english() -> Tokenizer {
    Tokenizer::with_language("eng").expect("bundled resources load")
}

/// Coverage: every non-whitespace, non-deleted character of the original
/// line is covered by exactly one primary token, and re-projecting each
/// token through its offsets yields the chart's record of the substring.
#[test]
fn coverage_and_projection() {
    let tok = english();
    for sample in SAMPLES {
        let chart = tok.tokenize_line(sample, "1");
        let orig: Vec<char> = sample.chars().collect();
        let mut token_cov = vec![0usize; orig.len()];
        for t in chart.tokens() {
            assert!(t.start < t.end, "empty span in {sample:?}");
            for c in token_cov[t.start..t.end].iter_mut() {
                *c += 1;
            }
        }
        let deleted: Vec<usize> = chart.deleted_offsets().to_vec();
        for (i, &n) in token_cov.iter().enumerate() {
            assert!(n <= 1, "offset {i} covered {n} times in {sample:?}");
            if orig[i].is_whitespace() || deleted.contains(&i) {
                // deleted characters may fall inside a surrounding span
                // (the deletion map records them separately)
                continue;
            }
            assert_eq!(n, 1, "offset {i} ({:?}) uncovered in {sample:?}", orig[i]);
        }
    }
}

/// Monotone spans: tokens never overlap and appear in source order.
#[test]
fn monotone_spans() {
    let tok = english();
    for sample in SAMPLES {
        let chart = tok.tokenize_line(sample, "1");
        for pair in chart.tokens().windows(2) {
            assert!(
                pair[0].end <= pair[1].start,
                "overlap between {:?} and {:?} in {sample:?}",
                pair[0].surface,
                pair[1].surface
            );
        }
    }
}

/// Simple mode equals full mode with the attach tags stripped.
#[test]
fn simple_mode_strips_markup_only() {
    let full = english();
    let simple_config = Config::builder().language("eng").simple(true).build().unwrap();
    let simple = Tokenizer::with_config(simple_config).unwrap();
    for sample in SAMPLES {
        if sample.contains('@') {
            continue;
        }
        let with_markup = full.tokenize_string(sample);
        let without = simple.tokenize_string(sample);
        assert_eq!(with_markup.replace('@', ""), without, "for {sample:?}");
    }
}

/// Tokenize-then-detokenize restores clean inputs.
#[test]
fn round_trip_on_clean_input() {
    let tok = english();
    let detok = Detokenizer::with_language("eng").unwrap();
    let clean = [
        "Hello, world!",
        "Mr. Miller can't afford it.",
        "She's a peace-loving person.",
        "They'll see the U.S. team.",
        "Don't stop!",
    ];
    for sample in clean {
        let tokenized = tok.tokenize_string(sample);
        assert_eq!(detok.detokenize_string(&tokenized), *sample, "via {tokenized:?}");
    }
}

/// Universal rules behave identically with and without a language code
/// when the input has no language-specific constructs.
#[test]
fn universal_rules_are_language_independent() {
    let eng = english();
    let uni = Tokenizer::new().unwrap();
    let neutral = [
        "alpha beta gamma.",
        "(1,234.56)",
        "vogel, baum; haus!",
        "\u{05E9}\u{05DC}\u{05D5}\u{05DD} \u{05E2}\u{05D5}\u{05DC}\u{05DD}.",
    ];
    for sample in neutral {
        assert_eq!(
            eng.tokenize_string(sample),
            uni.tokenize_string(sample),
            "for {sample:?}"
        );
    }
}

/// Tokenizing already-tokenized text preserves the markup tokens.
#[test]
fn retokenization_preserves_markup() {
    let tok = english();
    let once = tok.tokenize_string("peace-loving T-shirt");
    assert_eq!(once, "peace @-@ loving T-shirt");
    assert_eq!(tok.tokenize_string(&once), once);
}
