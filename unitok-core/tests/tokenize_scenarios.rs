//! End-to-end tokenization scenarios against the bundled resource files.

use unitok_core::{to_double_colon, Config, Tokenizer};

fn english() -> Tokenizer {
    Tokenizer::with_language("eng").expect("bundled resources load")
}

fn universal() -> Tokenizer {
    Tokenizer::new().expect("bundled resources load")
}

#[test]
fn abbreviations_contractions_currency() {
    let tok = english();
    assert_eq!(
        tok.tokenize_string("Capt. O'Connor's car can't've cost $100,000."),
        "Capt. O'Connor 's car can n't 've cost $ 100,000 ."
    );
}

#[test]
fn parens_hyphenated_lexicals_decimals() {
    let tok = english();
    assert_eq!(
        tok.tokenize_string("Mr. Miller (Mary's ex-brother-in-law) can't afford $15,000.00."),
        "Mr. Miller ( Mary 's ex - brother-in-law ) can n't afford $ 15,000.00 ."
    );
}

#[test]
fn mt_style_quote_markup() {
    let tok = english();
    assert_eq!(
        tok.tokenize_string(r#"("Hello,world!")"#),
        r#"( "@ Hello , world ! @" )"#
    );
}

#[test]
fn line_id_mode_preserves_first_token() {
    let config = Config::builder()
        .language("eng")
        .first_token_is_line_id(true)
        .build()
        .unwrap();
    let tok = Tokenizer::with_config(config).unwrap();
    assert_eq!(
        tok.tokenize_string("GEN:1:1\tIn the beginning, God created the heavens."),
        "GEN:1:1 In the beginning , God created the heavens ."
    );
}

#[test]
fn urls_and_emails_keep_their_shape() {
    let tok = english();
    assert_eq!(
        tok.tokenize_string(
            "Visit https://www.youtube.com/watch?v=AaZ_RSt0KP8 or email a.almukhanov@energo.gov.kz."
        ),
        "Visit https://www.youtube.com/watch?v=AaZ_RSt0KP8 or email a.almukhanov@energo.gov.kz ."
    );
}

#[test]
fn dash_markup_vs_preserved_lexicals() {
    let tok = english();
    assert_eq!(
        tok.tokenize_string("peace-loving T-shirt"),
        "peace @-@ loving T-shirt"
    );
}

#[test]
fn annotation_double_colon_exact() {
    let tok = english();
    let chart = tok.tokenize_line("Capt. O'Connor's car can't've cost $100,000.", "1");
    assert_eq!(
        to_double_colon(&chart),
        "::line 1 ::s Capt. O'Connor's car can't've cost $100,000.\n\
         ::span 0-5 ::type ABBREV ::sem-class military-rank ::surf Capt.\n\
         ::span 6-14 ::type WORD-B ::surf O'Connor\n\
         ::span 14-16 ::type DECONTRACTION ::surf 's\n\
         ::span 17-20 ::type WORD-B ::surf car\n\
         ::span 21-24 ::type DECONTRACTION ::surf can\n\
         ::span 24-26 ::type DECONTRACTION ::surf n't\n\
         ::span 26-29 ::type DECONTRACTION ::surf 've\n\
         ::span 30-34 ::type WORD-B ::surf cost\n\
         ::span 35-36 ::type ABBREV ::sem-class currency-unit ::surf $\n\
         ::span 36-43 ::type NUMBER ::surf 100,000\n\
         ::span 43-44 ::type PUNCT-E ::surf .\n"
    );
}

#[test]
fn xml_tags_and_hashtags() {
    let tok = english();
    assert_eq!(
        tok.tokenize_string(r#"See <a href="http://x.com">this</a> #now @you"#),
        r#"See <a href="http://x.com"> this </a> #now @you"#
    );
}

#[test]
fn number_grouping_shapes() {
    let tok = english();
    // European decimal comma
    assert_eq!(tok.tokenize_string("12,34 items"), "12,34 items");
    // Indian-style grouping
    assert_eq!(tok.tokenize_string("1,23,45,678.90 rupees"), "1,23,45,678.90 rupees");
    // a trailing period is a sentence terminator, not part of the number
    assert_eq!(tok.tokenize_string("It cost 42."), "It cost 42 .");
}

#[test]
fn repairs_rewrite_surfaces() {
    let tok = english();
    let chart = tok.tokenize_line("He said wo n't again.", "1");
    let surfaces: Vec<&str> = chart.tokens().iter().map(|t| t.surface.as_str()).collect();
    assert!(surfaces.contains(&"will"));
    // the original substring stays recoverable
    let will = chart.tokens().iter().find(|t| t.surface == "will").unwrap();
    assert_eq!(will.orig_surface, "wo");
    assert_eq!(&chart.orig[..], "He said wo n't again.");
}

#[test]
fn misspellings_rewrite_when_language_matches() {
    let eng = english();
    let chart = eng.tokenize_line("I recieved teh letter.", "1");
    let surfaces: Vec<&str> = chart.tokens().iter().map(|t| t.surface.as_str()).collect();
    assert!(surfaces.contains(&"received"));
    assert!(surfaces.contains(&"the"));

    // without the language, misspelling entries stay inert
    let uni = universal();
    assert_eq!(uni.tokenize_string("teh letter"), "teh letter");
}

#[test]
fn filenames_are_single_tokens() {
    let tok = english();
    assert_eq!(
        tok.tokenize_string("Open presentation.pptx now"),
        "Open presentation.pptx now"
    );
    let chart = tok.tokenize_line("Open presentation.pptx now", "1");
    assert!(chart
        .tokens()
        .iter()
        .any(|t| t.surface == "presentation.pptx" && t.ttype.as_str() == "FILENAME"));
}

#[test]
fn period_acronyms_hold_together() {
    let tok = english();
    assert_eq!(tok.tokenize_string("The U.S. economy"), "The U.S. economy");
    assert_eq!(tok.tokenize_string("B.A.T. shares rose"), "B.A.T. shares rose");
}

#[test]
fn dash_acronym_patterns() {
    let tok = english();
    assert_eq!(tok.tokenize_string("An F-15B flew by."), "An F-15B flew by .");
}

#[test]
fn emoji_sequences_split_off() {
    let tok = universal();
    assert_eq!(tok.tokenize_string("good 😀😀 night"), "good 😀😀 night");
    let chart = tok.tokenize_line("good😀night", "1");
    let types: Vec<&str> = chart.tokens().iter().map(|t| t.ttype.as_str()).collect();
    assert!(types.contains(&"EMOJI-SEQ"));
    assert_eq!(chart.surface(true, '@'), "good 😀 night");
}

#[test]
fn number_sign_ordinals_and_handles() {
    let tok = english();
    assert_eq!(tok.tokenize_string("see #2 and @user."), "see #2 and @user .");
}
