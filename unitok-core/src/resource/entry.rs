//! Typed resource rule entries.
//!
//! Data-file rules are heterogeneous records keyed by slot names; here each
//! kind gets a fixed schema, with unknown slots preserved in a side map.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Rule kind, one per `::<kind>` head slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Abbrev,
    Contraction,
    Repair,
    Misspelling,
    Lexical,
    /// Lexical entries applied in the early resource pass (`::priority`,
    /// `::sem-class url`, or digit-bearing keys)
    LexicalPriority,
    PunctSplit,
    /// Symbol-step exceptions
    NonSymbol,
    /// Engine parameters such as the filename extension list
    ResourceRule,
}

/// Which side of a punctuation character splits off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Start,
    End,
    Both,
}

impl Side {
    pub fn parse(s: &str) -> Option<Side> {
        match s {
            "start" => Some(Side::Start),
            "end" => Some(Side::End),
            "both" => Some(Side::Both),
            _ => None,
        }
    }
}

/// Compiled left/right context conditions.
///
/// Left patterns are compiled as `.*(?:pat)$` against the text before the
/// candidate; right patterns as `^(?:pat)` against the text after it. The
/// negated slots compile the same way and fail the entry when they match,
/// which restates the original look-around wrappers without look-around.
#[derive(Debug, Clone, Default)]
pub struct Contexts {
    pub left: Option<Regex>,
    pub left_not: Option<Regex>,
    pub right: Option<Regex>,
    pub right_not: Option<Regex>,
}

impl Contexts {
    pub fn matches(&self, left_context: &str, right_context: &str) -> bool {
        if let Some(re) = &self.left {
            if !re.is_match(left_context) {
                return false;
            }
        }
        if let Some(re) = &self.left_not {
            if re.is_match(left_context) {
                return false;
            }
        }
        if let Some(re) = &self.right {
            if !re.is_match(right_context) {
                return false;
            }
        }
        if let Some(re) = &self.right_not {
            if re.is_match(right_context) {
                return false;
            }
        }
        true
    }

    pub fn is_trivial(&self) -> bool {
        self.left.is_none()
            && self.left_not.is_none()
            && self.right.is_none()
            && self.right_not.is_none()
    }
}

pub(crate) fn compile_left(
    pattern: &str,
    file: &Path,
    line: usize,
    slot: &str,
) -> Result<Regex> {
    Regex::new(&format!(".*(?:{pattern})$")).map_err(|source| Error::ContextRegex {
        file: file.to_path_buf(),
        line,
        slot: slot.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

pub(crate) fn compile_right(
    pattern: &str,
    file: &Path,
    line: usize,
    slot: &str,
) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})")).map_err(|source| Error::ContextRegex {
        file: file.to_path_buf(),
        line,
        slot: slot.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

/// One tokenization rule from a resource file
#[derive(Debug, Clone)]
pub struct RuleEntry {
    /// Key surface with original casing, e.g. `Gen.`
    pub surface: String,
    pub kind: RuleKind,
    /// Language code this entry is restricted to (slot or file default);
    /// `None` means universal
    pub lcode: Option<String>,
    pub lcodes_not: Vec<String>,
    pub sem_class: Option<String>,
    pub tag: Option<String>,
    pub case_sensitive: bool,
    pub contexts: Contexts,
    /// Replacement surface for contraction/repair/misspelling
    pub target: Option<String>,
    /// Per-piece original character counts for contraction targets
    pub char_splits: Option<Vec<usize>>,
    /// Punct-split side
    pub side: Option<Side>,
    /// Consecutive runs of the same character stay together
    pub group: bool,
    /// Unrecognized slots, preserved as auxiliary attributes
    pub aux: HashMap<String, String>,
}

impl RuleEntry {
    pub fn new(surface: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            surface: surface.into(),
            kind,
            lcode: None,
            lcodes_not: Vec::new(),
            sem_class: None,
            tag: None,
            case_sensitive: false,
            contexts: Contexts::default(),
            target: None,
            char_splits: None,
            side: None,
            group: false,
            aux: HashMap::new(),
        }
    }

    /// Checks case, language and context conditions for a candidate match.
    pub fn fulfills_conditions(
        &self,
        token_surf: &str,
        left_context: &str,
        right_context: &str,
        lang_code: Option<&str>,
    ) -> bool {
        if self.case_sensitive && self.surface != token_surf {
            return false;
        }
        if let Some(lc) = lang_code {
            if self.lcodes_not.iter().any(|not| not == lc) {
                return false;
            }
        }
        if let Some(entry_lc) = &self.lcode {
            // eng-global entries are a shared fallback for every language
            if entry_lc != "eng-global" && lang_code != Some(entry_lc.as_str()) {
                return false;
            }
        }
        self.contexts.matches(left_context, right_context)
    }

    /// Specificity for tie-breaking: language-specific beats eng-global
    /// beats universal.
    pub fn specificity(&self) -> u8 {
        match self.lcode.as_deref() {
            None => 0,
            Some("eng-global") => 1,
            Some(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn context_compile_and_match() {
        let file = PathBuf::from("test.txt");
        let mut ctx = Contexts::default();
        ctx.left = Some(compile_left(r"\d", &file, 1, "left-context").unwrap());
        ctx.right = Some(compile_right(r"\s", &file, 1, "right-context").unwrap());
        assert!(ctx.matches("No. 4", " follows"));
        assert!(!ctx.matches("No. x", " follows"));
        assert!(!ctx.matches("No. 4", "follows"));
    }

    #[test]
    fn negated_contexts_invert() {
        let file = PathBuf::from("test.txt");
        let mut ctx = Contexts::default();
        ctx.left_not = Some(compile_left(r"\p{L}", &file, 1, "left-context-not").unwrap());
        assert!(ctx.matches("12 ", "rest"));
        assert!(!ctx.matches("word", "rest"));
    }

    #[test]
    fn case_sensitive_entries_compare_exact() {
        let mut entry = RuleEntry::new("US", RuleKind::Abbrev);
        entry.case_sensitive = true;
        assert!(entry.fulfills_conditions("US", "", "", None));
        assert!(!entry.fulfills_conditions("us", "", "", None));
    }

    #[test]
    fn lcode_gating() {
        let mut entry = RuleEntry::new("teh", RuleKind::Misspelling);
        entry.lcode = Some("eng".to_string());
        assert!(entry.fulfills_conditions("teh", "", "", Some("eng")));
        assert!(!entry.fulfills_conditions("teh", "", "", Some("deu")));
        assert!(!entry.fulfills_conditions("teh", "", "", None));

        let mut global = RuleEntry::new("St.", RuleKind::Abbrev);
        global.lcode = Some("eng-global".to_string());
        assert!(global.fulfills_conditions("St.", "", "", Some("deu")));
    }
}
