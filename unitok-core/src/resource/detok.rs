//! Detokenization resource tables: auto-attach, markup-attach, contraction
//! re-joins, and the attach tag. Loaded both by the detokenizer and by the
//! tokenizer (which consults them to place `@` markers).

use crate::error::{Error, Result};
use crate::resource::entry::{compile_left, compile_right, Contexts};
use crate::resource::loader::{fold_lower, LineParser, ParsedRule};
use log::warn;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// One detokenization rule (auto-attach or the shared base of markup-attach)
#[derive(Debug, Clone)]
pub struct DetokEntry {
    pub surface: String,
    /// Entry also covers runs of its (single) character, e.g. `---`
    pub group: bool,
    pub lcodes: Vec<String>,
    pub lcodes_not: Vec<String>,
    pub case_sensitive: bool,
    pub contexts: Contexts,
}

impl DetokEntry {
    fn new(surface: &str) -> Self {
        Self {
            surface: surface.to_string(),
            group: false,
            lcodes: Vec::new(),
            lcodes_not: Vec::new(),
            case_sensitive: false,
            contexts: Contexts::default(),
        }
    }

    /// Language, case, group and context conditions for one candidate.
    pub fn fulfills_conditions(
        &self,
        token: &str,
        left_context: &str,
        right_context: &str,
        lang_code: Option<&str>,
        group_necessary: bool,
    ) -> bool {
        if let Some(lc) = lang_code {
            if !self.lcodes.is_empty() && !self.lcodes.iter().any(|c| c == lc) {
                return false;
            }
            if self.lcodes_not.iter().any(|c| c == lc) {
                return false;
            }
        }
        if self.case_sensitive && token != self.surface {
            return false;
        }
        if group_necessary && !self.group {
            return false;
        }
        self.contexts.matches(left_context, right_context)
    }
}

/// Markup-attach rule: which punctuation carries `@` markers and how
#[derive(Debug, Clone)]
pub struct MarkupEntry {
    pub base: DetokEntry,
    /// Non-directional paired delimiter (quote, apostrophe): decide
    /// open vs close from the adjacent text instead of both sides
    pub paired_delimiter: bool,
    /// Marked-up forms that must not be produced, e.g. `@/@`
    pub exceptions: Vec<String>,
}

/// Contraction re-join: detokenized target → contracted surface
#[derive(Debug, Clone)]
pub struct ContractionJoin {
    pub entry: DetokEntry,
    pub contraction: String,
}

const DETOK_VALID_SLOTS: &[&str] = &[
    "alt-spelling",
    "attach-tag",
    "auto-attach",
    "case-sensitive",
    "char-split",
    "comment",
    "contraction",
    "country",
    "eng",
    "etym-lcode",
    "example",
    "except",
    "exp",
    "group",
    "lcode",
    "lcode-not",
    "left-context",
    "left-context-not",
    "lexical",
    "markup-attach",
    "misspelling",
    "nonstandard",
    "paired-delimiter",
    "plural",
    "priority",
    "right-context",
    "right-context-not",
    "sem-class",
    "side",
    "substandard",
    "tag",
    "target",
    "token-category",
];

/// Tables steering detokenization and `@`-markup placement
#[derive(Debug)]
pub struct DetokResource {
    pub attach_tag: char,
    auto_attach_left: HashMap<String, Vec<DetokEntry>>,
    auto_attach_right: HashMap<String, Vec<DetokEntry>>,
    markup_attach: HashMap<String, Vec<MarkupEntry>>,
    contractions: HashMap<String, Vec<ContractionJoin>>,
    markup_re_elements: HashSet<String>,
    markup_re: Option<Regex>,
}

impl Default for DetokResource {
    fn default() -> Self {
        Self {
            attach_tag: '@',
            auto_attach_left: HashMap::new(),
            auto_attach_right: HashMap::new(),
            markup_attach: HashMap::new(),
            contractions: HashMap::new(),
            markup_re_elements: HashSet::new(),
            markup_re: None,
        }
    }
}

impl DetokResource {
    /// Loads `detok-resource.txt` plus the `::contraction` entries of the
    /// tokenization resource files (needed for re-joining), then compiles
    /// the markup-attach recognizer.
    pub fn load(data_dir: &Path, lang_codes: &[String]) -> Result<Self> {
        let parser = LineParser::new();
        let mut res = DetokResource::default();
        res.load_file(&parser, &data_dir.join("detok-resource.txt"), lang_codes, true)?;
        for lcode in lang_codes {
            let file = data_dir.join(format!("tok-resource-{lcode}.txt"));
            if file.is_file() {
                res.load_file(&parser, &file, lang_codes, false)?;
            }
        }
        res.load_file(&parser, &data_dir.join("tok-resource.txt"), lang_codes, false)?;
        if !lang_codes.iter().any(|c| c == "eng-global") {
            let file = data_dir.join("tok-resource-eng-global.txt");
            if file.is_file() {
                res.load_file(&parser, &file, lang_codes, false)?;
            }
        }
        res.build_markup_re();
        Ok(res)
    }

    fn load_file(
        &mut self,
        parser: &LineParser,
        file: &Path,
        doc_lang_codes: &[String],
        strict: bool,
    ) -> Result<()> {
        let content = std::fs::read_to_string(file).map_err(|source| Error::ResourceIo {
            file: file.to_path_buf(),
            source,
        })?;
        let mut required: HashMap<&str, &[&str]> = HashMap::new();
        required.insert("attach-tag", &[]);
        required.insert("auto-attach", &["side"]);
        required.insert("contraction", &["target"]);
        required.insert("lexical", &[]);
        required.insert("markup-attach", &[]);
        for (lineno0, raw) in content.lines().enumerate() {
            let lineno = lineno0 + 1;
            let line = parser.without_comment(raw);
            if line.trim().is_empty() {
                continue;
            }
            let parsed = parser.parse_slots(&line, file, lineno)?;
            if strict {
                parser.validate(&parsed, DETOK_VALID_SLOTS, &required, file, lineno)?;
            }
            // In tok-resource files only contractions and tagged lexicals matter here
            if !matches!(
                parsed.head(),
                "attach-tag" | "auto-attach" | "contraction" | "lexical" | "markup-attach"
            ) {
                continue;
            }
            // Skip entries restricted to languages this run does not use
            if let Some(lcode_s) = parsed.get("lcode") {
                let line_codes: Vec<&str> = lcode_s
                    .split([',', ';'])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                if !doc_lang_codes.is_empty()
                    && !line_codes.is_empty()
                    && !line_codes.iter().any(|c| doc_lang_codes.iter().any(|d| d == c))
                {
                    continue;
                }
            }
            for rule in parser.expand(parsed) {
                self.add_rule(&rule, file, lineno)?;
            }
        }
        Ok(())
    }

    fn add_rule(&mut self, rule: &ParsedRule, file: &Path, lineno: usize) -> Result<()> {
        let key = rule.key().to_string();
        let key_lc = fold_lower(&key);
        match rule.head() {
            "attach-tag" => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(tag), None) => self.attach_tag = tag,
                    _ => {
                        return Err(Error::Resource {
                            file: file.to_path_buf(),
                            line: lineno,
                            message: format!("::attach-tag must be a single character, got '{key}'"),
                        })
                    }
                }
            }
            "auto-attach" => {
                let side = rule.get("side").unwrap_or_default();
                if !matches!(side, "left" | "right" | "both") {
                    return Err(Error::Resource {
                        file: file.to_path_buf(),
                        line: lineno,
                        message: format!("invalid ::side {side} (should be left/right/both)"),
                    });
                }
                let entry = self.fill_entry(DetokEntry::new(&key), rule, file, lineno)?;
                if side == "left" || side == "both" {
                    self.push_auto_left(&key_lc, entry.clone());
                }
                if side == "right" || side == "both" {
                    self.push_auto_right(&key_lc, entry);
                }
            }
            "markup-attach" => {
                let base = self.fill_entry(DetokEntry::new(&key), rule, file, lineno)?;
                let group = base.group;
                let exceptions = rule
                    .get("except")
                    .map(|s| s.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default();
                let entry = MarkupEntry {
                    base,
                    paired_delimiter: rule.has("paired-delimiter"),
                    exceptions,
                };
                self.markup_attach.entry(key_lc.clone()).or_default().push(entry);
                self.markup_re_elements
                    .insert(format!("{}{}", regex::escape(&key_lc), if group { "+" } else { "" }));
            }
            "contraction" => {
                // nonstandard/substandard variants are tokenized but never re-joined
                if rule.has("nonstandard") || rule.has("substandard") {
                    return Ok(());
                }
                let Some(target) = rule.get("target") else {
                    return Ok(());
                };
                let entry = self.fill_entry(DetokEntry::new(target), rule, file, lineno)?;
                let join = ContractionJoin {
                    entry,
                    contraction: key,
                };
                self.contractions
                    .entry(fold_lower(target))
                    .or_default()
                    .push(join);
            }
            "lexical" => {
                // decontraction pieces auto-attach according to their tag
                let tag = rule.get("tag").unwrap_or_default();
                if matches!(tag, "DECONTRACTION-L" | "DECONTRACTION-R" | "DECONTRACTION-B") {
                    let entry = self.fill_entry(DetokEntry::new(&key), rule, file, lineno)?;
                    if matches!(tag, "DECONTRACTION-L" | "DECONTRACTION-B") {
                        self.push_auto_right(&key_lc, entry.clone());
                    }
                    if matches!(tag, "DECONTRACTION-R" | "DECONTRACTION-B") {
                        self.push_auto_left(&key_lc, entry);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn push_auto_left(&mut self, key_lc: &str, entry: DetokEntry) {
        let list = self.auto_attach_left.entry(key_lc.to_string()).or_default();
        if list.iter().any(|e| e.lcodes == entry.lcodes && e.contexts.is_trivial() && entry.contexts.is_trivial()) {
            warn!("Duplicate ::auto-attach {key_lc} ::side left");
        }
        list.push(entry);
    }

    fn push_auto_right(&mut self, key_lc: &str, entry: DetokEntry) {
        let list = self.auto_attach_right.entry(key_lc.to_string()).or_default();
        if list.iter().any(|e| e.lcodes == entry.lcodes && e.contexts.is_trivial() && entry.contexts.is_trivial()) {
            warn!("Duplicate ::auto-attach {key_lc} ::side right");
        }
        list.push(entry);
    }

    fn fill_entry(
        &self,
        mut entry: DetokEntry,
        rule: &ParsedRule,
        file: &Path,
        lineno: usize,
    ) -> Result<DetokEntry> {
        entry.group = rule.has("group");
        entry.case_sensitive = rule.has("case-sensitive");
        if let Some(lcode_s) = rule.get("lcode") {
            entry.lcodes = lcode_s
                .split([',', ';'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(not_s) = rule.get("lcode-not") {
            entry.lcodes_not = not_s
                .split([',', ';'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(p) = rule.get("left-context") {
            entry.contexts.left = Some(compile_left(p, file, lineno, "left-context")?);
        }
        if let Some(p) = rule.get("left-context-not") {
            entry.contexts.left_not = Some(compile_left(p, file, lineno, "left-context-not")?);
        }
        if let Some(p) = rule.get("right-context") {
            entry.contexts.right = Some(compile_right(p, file, lineno, "right-context")?);
        }
        if let Some(p) = rule.get("right-context-not") {
            entry.contexts.right_not = Some(compile_right(p, file, lineno, "right-context-not")?);
        }
        Ok(entry)
    }

    /// Compiles the recognizer for marked-up attachment tokens
    /// (`@-@`, `"@`, `@@`, ...) from all registered markup-attach surfaces.
    fn build_markup_re(&mut self) {
        let tag = regex::escape(&self.attach_tag.to_string());
        let mut elements: Vec<String> = self.markup_re_elements.iter().cloned().collect();
        elements.push("/".to_string()); // robustness
        elements.sort();
        let core = format!("{tag}?(?:{}){tag}?", elements.join("|"));
        let pattern = format!("(?i)^(?:{core}|{tag}{tag})$");
        self.markup_re = Some(Regex::new(&pattern).expect("markup regex from escaped elements"));
    }

    /// Does this token consist of a marked-up attachment surface?
    pub fn is_markup_token(&self, token: &str) -> bool {
        self.markup_re
            .as_ref()
            .map(|re| re.is_match(token))
            .unwrap_or(false)
    }

    pub fn markup_entries(&self, key_lc: &str) -> &[MarkupEntry] {
        self.markup_attach.get(key_lc).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn auto_left_entries(&self, key_lc: &str) -> &[DetokEntry] {
        self.auto_attach_left.get(key_lc).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn auto_right_entries(&self, key_lc: &str) -> &[DetokEntry] {
        self.auto_attach_right.get(key_lc).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contraction_joins(&self, target_lc: &str) -> &[ContractionJoin] {
        self.contractions.get(target_lc).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_data(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    fn sample_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_data(
            dir.path(),
            "detok-resource.txt",
            "::attach-tag @\n\
             ::markup-attach - ::group\n\
             ::markup-attach \" ::paired-delimiter\n\
             ::auto-attach , ::side left\n\
             ::auto-attach ( ::side right\n\
             ::auto-attach 's ::side left\n",
        );
        write_data(
            dir.path(),
            "tok-resource.txt",
            "::contraction can't ::target can n't ::char-split 3,2\n",
        );
        dir
    }

    #[test]
    fn loads_and_indexes() {
        let dir = sample_dir();
        let res = DetokResource::load(dir.path(), &[]).unwrap();
        assert_eq!(res.attach_tag, '@');
        assert_eq!(res.auto_left_entries(",").len(), 1);
        assert_eq!(res.auto_right_entries("(").len(), 1);
        assert_eq!(res.markup_entries("-").len(), 1);
        assert_eq!(res.contraction_joins("can n't").len(), 1);
        // apostrophe expansion registered the curly variant too
        assert_eq!(res.contraction_joins("can n’t").len(), 1);
    }

    #[test]
    fn markup_token_recognizer() {
        let dir = sample_dir();
        let res = DetokResource::load(dir.path(), &[]).unwrap();
        assert!(res.is_markup_token("@-@"));
        assert!(res.is_markup_token("-@"));
        assert!(res.is_markup_token("---"));
        assert!(res.is_markup_token("\"@"));
        assert!(res.is_markup_token("@@"));
        assert!(!res.is_markup_token("word"));
        assert!(!res.is_markup_token("@word@"));
    }

    #[test]
    fn group_fallback_condition() {
        let dir = sample_dir();
        let res = DetokResource::load(dir.path(), &[]).unwrap();
        let dash = &res.markup_entries("-")[0];
        assert!(dash.base.fulfills_conditions("---", "a", "b", None, true));
        let quote = &res.markup_entries("\"")[0];
        assert!(!quote.base.fulfills_conditions("\"\"", "a", "b", None, true));
    }
}
