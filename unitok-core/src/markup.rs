//! Attach-tag markup placement: decides whether a punctuation token carries
//! `@` on its left, right, or both sides so the detokenizer can restore the
//! original spacing. Driven by `markup-attach` resource entries; contexts
//! are the span the tokenization step actually examined.

use crate::resource::{fold_lower, DetokResource};
use regex::Regex;

pub(crate) struct MarkupDecider {
    re_ends_letter_digit: Regex,
    re_ends_letter_digit_in_token: Regex,
    re_starts_letter_digit: Regex,
    re_starts_letter_digit_in_token: Regex,
    re_ends_non_ws: Regex,
    re_starts_non_ws: Regex,
}

impl MarkupDecider {
    pub fn new() -> Self {
        Self {
            re_ends_letter_digit: Regex::new(r"(?:\p{L}\p{M}*|\d)$").unwrap(),
            re_ends_letter_digit_in_token: Regex::new(r"(?:\p{L}\p{M}*|\d)\S*$").unwrap(),
            re_starts_letter_digit: Regex::new(r"^(?:\p{L}|\d)").unwrap(),
            re_starts_letter_digit_in_token: Regex::new(r"^\S*(?:\p{L}|\d)").unwrap(),
            re_ends_non_ws: Regex::new(r"\S$").unwrap(),
            re_starts_non_ws: Regex::new(r"^\S").unwrap(),
        }
    }

    /// Returns `(markup_left, markup_right)` for a token surface.
    ///
    /// Entry conditions are judged against the span the step actually
    /// examined (`span_*`); the open/close scoring and the adjacency test
    /// look at the whole line (`line_*`), where already-split neighbors
    /// are still visible.
    pub fn decide(
        &self,
        detok: &DetokResource,
        surface: &str,
        span_left: &str,
        span_right: &str,
        line_left: &str,
        line_right: &str,
        lang: Option<&str>,
    ) -> (bool, bool) {
        let lc = fold_lower(surface);
        // a run of one repeated character falls back to its base entry
        let mut shortened = lc.clone();
        if lc.chars().count() >= 2 {
            let first = lc.chars().next().unwrap();
            if lc.chars().all(|c| c == first) {
                while shortened.chars().count() >= 2 && detok.markup_entries(&shortened).is_empty()
                {
                    shortened.pop();
                }
            }
        }
        let group_necessary = lc != shortened;
        let mut valid = None;
        let mut paired = false;
        for entry in detok.markup_entries(&shortened) {
            if entry
                .base
                .fulfills_conditions(&lc, span_left, span_right, lang, group_necessary)
            {
                valid = Some(entry);
                if entry.paired_delimiter {
                    paired = true;
                    break;
                }
            }
        }
        let Some(entry) = valid else {
            return (false, false);
        };

        let (mut ml, mut mr) = (false, false);
        let mut decided = false;
        if paired {
            match self.open_or_close(line_left, line_right) {
                Some(PairedRole::Open) => {
                    mr = true;
                    decided = true;
                }
                Some(PairedRole::Close) => {
                    ml = true;
                    decided = true;
                }
                None => {}
            }
        }
        if !decided {
            ml = self.re_ends_non_ws.is_match(line_left);
            mr = self.re_starts_non_ws.is_match(line_right);
        }
        if ml || mr {
            let mut marked = String::new();
            if ml {
                marked.push(detok.attach_tag);
            }
            marked.push_str(surface);
            if mr {
                marked.push(detok.attach_tag);
            }
            if entry.exceptions.iter().any(|e| *e == marked) {
                return (false, false);
            }
        }
        (ml, mr)
    }

    /// Is a non-directional paired delimiter opening or closing here?
    /// Adjacent letters and digits vote; a tie stays undecided.
    fn open_or_close(&self, left_context: &str, right_context: &str) -> Option<PairedRole> {
        let close_score = if self.re_ends_letter_digit.is_match(left_context) {
            10
        } else if self.re_ends_letter_digit_in_token.is_match(left_context) {
            5
        } else {
            0
        };
        let open_score = if self.re_starts_letter_digit.is_match(right_context) {
            10
        } else if self.re_starts_letter_digit_in_token.is_match(right_context) {
            5
        } else {
            0
        };
        if open_score > close_score {
            Some(PairedRole::Open)
        } else if close_score > open_score {
            Some(PairedRole::Close)
        } else {
            None
        }
    }
}

enum PairedRole {
    Open,
    Close,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    fn write_data(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    fn detok() -> (tempfile::TempDir, DetokResource) {
        let dir = tempfile::tempdir().unwrap();
        write_data(
            dir.path(),
            "detok-resource.txt",
            "::attach-tag @\n\
             ::markup-attach - ::group ::left-context \\p{L} ::right-context \\p{L}\n\
             ::markup-attach \" ::paired-delimiter\n",
        );
        write_data(dir.path(), "tok-resource.txt", "");
        let res = DetokResource::load(dir.path(), &[]).unwrap();
        (dir, res)
    }

    #[test]
    fn dash_between_letters_marks_both_sides() {
        let (_dir, res) = detok();
        let d = MarkupDecider::new();
        assert_eq!(
            d.decide(&res, "-", "peace", "loving", "peace", "loving T-shirt", None),
            (true, true)
        );
    }

    #[test]
    fn dash_at_span_edge_stays_bare() {
        let (_dir, res) = detok();
        let d = MarkupDecider::new();
        // entry context requires a letter on the right; the span ends here
        // even though the line continues
        assert_eq!(
            d.decide(&res, "-", "ex", "", "Mary 's ex", "brother-in-law", None),
            (false, false)
        );
    }

    #[test]
    fn paired_quote_opens_and_closes() {
        let (_dir, res) = detok();
        let d = MarkupDecider::new();
        // opening: letters follow, only punctuation precedes
        assert_eq!(
            d.decide(&res, "\"", "", "Hello,world!\")", "(", "Hello,world!\")", None),
            (false, true)
        );
        // closing: letters precede
        assert_eq!(
            d.decide(&res, "\"", "", ")", "(\"Hello,world!", ")", None),
            (true, false)
        );
    }

    #[test]
    fn unlisted_punctuation_is_never_marked() {
        let (_dir, res) = detok();
        let d = MarkupDecider::new();
        assert_eq!(
            d.decide(&res, ",", "Hello", "world", "Hello", "world", None),
            (false, false)
        );
    }
}
