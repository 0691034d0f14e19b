//! Resource store: data-file driven tokenization and detokenization rules.
//!
//! Most linguistic knowledge lives in data files (`tok-resource*.txt`,
//! `detok-resource.txt`, `top-level-domain-codes.txt`); this module parses
//! them into typed, indexed, immutable tables.

mod detok;
mod entry;
mod loader;

pub use detok::{ContractionJoin, DetokEntry, DetokResource, MarkupEntry};
pub use entry::{Contexts, RuleEntry, RuleKind, Side};
pub use loader::{fold_lower, PrefixFamily, Reliability, ResourceStore, TldTable};

/// Adjusts the capitalization of a normalized surface to mirror the
/// original: `will`/`Wo` → `Will`, `n't`/`N'T` → `N'T`.
pub fn adjust_capitalization(s: &str, orig: &str) -> String {
    if s == orig {
        return s.to_string();
    }
    let s_letters: String = s.chars().filter(|c| c.is_alphabetic()).collect();
    let orig_letters: String = orig.chars().filter(|c| c.is_alphabetic()).collect();
    if s_letters == orig_letters {
        return s.to_string();
    }
    let mut orig_iter = orig_letters.chars();
    match orig_iter.next() {
        Some(first) if first.is_uppercase() => {
            if orig_iter.next().map(|c| c.is_uppercase()).unwrap_or(false) {
                s.to_uppercase()
            } else {
                // capitalize the first letter, leaving any leading
                // non-letters (apostrophes) in place
                let mut out = String::with_capacity(s.len());
                let mut done = false;
                for ch in s.chars() {
                    if !done && ch.is_alphabetic() {
                        out.extend(ch.to_uppercase());
                        done = true;
                    } else {
                        out.push(ch);
                    }
                }
                out
            }
        }
        _ => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_capitalization_cases() {
        assert_eq!(adjust_capitalization("will", "Wo"), "Will");
        assert_eq!(adjust_capitalization("will", "WO"), "WILL");
        assert_eq!(adjust_capitalization("will", "wo"), "will");
        assert_eq!(adjust_capitalization("n't", "n't"), "n't");
        assert_eq!(adjust_capitalization("'s", "'S"), "'S");
        assert_eq!(adjust_capitalization("can't", "Can't"), "Can't");
    }
}
