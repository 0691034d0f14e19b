//! Resource file loading: the double-colon line grammar, slot validation,
//! load-time expansions, and the indexed store.

use crate::error::{Error, Result};
use crate::resource::entry::{compile_left, compile_right, RuleEntry, RuleKind, Side};
use log::warn;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Sentinel replacing the `\:\:` escape while a line is being split into slots
const ESCAPED_COLONS: char = '\u{E000}';

/// A parsed resource line: the head slot first, then the remaining slots in
/// file order. Values keep their original casing.
#[derive(Debug, Clone)]
pub(crate) struct ParsedRule {
    pub slots: Vec<(String, String)>,
}

impl ParsedRule {
    pub fn head(&self) -> &str {
        &self.slots[0].0
    }

    pub fn key(&self) -> &str {
        &self.slots[0].1
    }

    pub fn get(&self, slot: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|(name, _)| name == slot)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, slot: &str) -> bool {
        self.get(slot).is_some()
    }

    fn with_key(&self, key: String) -> ParsedRule {
        let mut slots = self.slots.clone();
        slots[0].1 = key;
        ParsedRule { slots }
    }

    fn without(&self, slot: &str) -> ParsedRule {
        ParsedRule {
            slots: self
                .slots
                .iter()
                .filter(|(name, _)| name != slot)
                .cloned()
                .collect(),
        }
    }
}

/// Line-level parsing shared by the tokenization and detokenization loaders.
pub(crate) struct LineParser {
    re_slot: Regex,
    re_comment_head: Regex,
    re_comment_tail: Regex,
    re_abbrev_elem: Regex,
    re_suffix_variation: Regex,
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            re_slot: Regex::new(r"::([A-Za-z][-A-Za-z0-9_]*)").unwrap(),
            re_comment_head: Regex::new(r"^(.*::\S+(?:\s+\S+)?)(.*)$").unwrap(),
            re_comment_tail: Regex::new(r"^(.*?)\s+#").unwrap(),
            re_abbrev_elem: Regex::new(r"^((?:\p{L}\p{M}*|\d|[-_])+) ?([.·]) ?((?:\p{L}|\d).*)$")
                .unwrap(),
            re_suffix_variation: Regex::new(r"^((?:\p{L}\p{M}*)+)/(.*)$").unwrap(),
        }
    }

    /// Strips full-line and trailing comments. A trailing `#` only counts as
    /// a comment when at least one slot with a value precedes it.
    pub fn without_comment(&self, line: &str) -> String {
        let line = line.trim_end_matches(['\n', '\r']);
        let line = line.strip_prefix('\u{FEFF}').unwrap_or(line);
        if line.trim_start().starts_with('#') {
            return String::new();
        }
        if line.contains('#') {
            if let Some(m1) = self.re_comment_head.captures(line) {
                if let Some(m2) = self.re_comment_tail.captures(&m1[2]) {
                    return format!("{}{}", &m1[1], &m2[1]);
                }
            }
        }
        line.to_string()
    }

    /// Splits a line into `(slot, value)` pairs; values run to the next
    /// `::slot` or end of line, with `\:\:` unescaping applied.
    pub fn parse_slots(&self, line: &str, file: &Path, lineno: usize) -> Result<ParsedRule> {
        let escaped = line.replace(r"\:\:", &ESCAPED_COLONS.to_string());
        let mut slots: Vec<(String, String)> = Vec::new();
        let matches: Vec<_> = self.re_slot.find_iter(&escaped).collect();
        if matches.is_empty() || matches[0].start() != escaped.find("::").unwrap_or(usize::MAX) {
            return Err(Error::Resource {
                file: file.to_path_buf(),
                line: lineno,
                message: format!("no ::slot structure found in '{}'", line.trim()),
            });
        }
        for (i, m) in matches.iter().enumerate() {
            let name = escaped[m.start() + 2..m.end()].to_string();
            let value_end = matches
                .get(i + 1)
                .map(|next| next.start())
                .unwrap_or(escaped.len());
            let value = escaped[m.end()..value_end]
                .trim()
                .replace(ESCAPED_COLONS, "::");
            slots.push((name, value));
        }
        Ok(ParsedRule { slots })
    }

    /// Validates slot names against the allowed set and required-slot schema.
    pub fn validate(
        &self,
        rule: &ParsedRule,
        valid_slots: &[&str],
        required: &HashMap<&str, &[&str]>,
        file: &Path,
        lineno: usize,
    ) -> Result<()> {
        let head = rule.head();
        let Some(required_slots) = required.get(head) else {
            return Err(Error::Resource {
                file: file.to_path_buf(),
                line: lineno,
                message: format!("invalid head slot ::{head}"),
            });
        };
        let mut seen: HashSet<&str> = HashSet::new();
        for (name, _) in &rule.slots {
            if !valid_slots.contains(&name.as_str()) {
                return Err(Error::Resource {
                    file: file.to_path_buf(),
                    line: lineno,
                    message: format!("unexpected slot ::{name}"),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::Resource {
                    file: file.to_path_buf(),
                    line: lineno,
                    message: format!("duplicate slot ::{name}"),
                });
            }
        }
        for req in *required_slots {
            if !seen.contains(req) {
                return Err(Error::Resource {
                    file: file.to_path_buf(),
                    line: lineno,
                    message: format!("missing required slot ::{req} for ::{head}"),
                });
            }
        }
        Ok(())
    }

    /// `'e.g.'` → `['e.g.', 'e. g.']` and friends
    fn abbrev_space_expansions(&self, abbrev: &str) -> Vec<String> {
        if let Some(m) = self.re_abbrev_elem.captures(abbrev) {
            let first = &m[1];
            let punct = &m[2];
            let mut out = Vec::new();
            for sub in self.abbrev_space_expansions(&m[3]) {
                out.push(format!("{first}{punct}{sub}"));
                out.push(format!("{first}{punct} {sub}"));
            }
            out
        } else {
            vec![abbrev.to_string()]
        }
    }

    /// Applies the load-time expansions: apostrophe/hyphen character
    /// variants, `::plural`, `::inflections`, `::alt-spelling`,
    /// `::misspelling` side entries, spaced abbreviation repairs, and
    /// `::suffix-variations` on misspellings.
    pub fn expand(&self, rule: ParsedRule) -> Vec<ParsedRule> {
        let mut rules = vec![rule];

        // apostrophe variants with closely related characters
        let snapshot = rules.clone();
        for r in &snapshot {
            if r.head() != "punct-split" && r.key().contains('\'') {
                for repl in ['’', '‘'] {
                    let mut v = r.with_key(r.key().replace('\'', &repl.to_string()));
                    if let Some(target) = r.get("target") {
                        for slot in v.slots.iter_mut() {
                            if slot.0 == "target" {
                                slot.1 = target.replace('\'', &repl.to_string());
                            }
                        }
                    }
                    rules.push(v);
                }
            }
        }

        // hyphen variants (en dash, Armenian hyphen)
        let snapshot = rules.clone();
        for r in &snapshot {
            if r.key().contains('-') {
                for repl in ['–', '֊'] {
                    rules.push(r.with_key(r.key().replace('-', &repl.to_string())));
                }
            }
        }

        // ::plural
        let snapshot = rules.clone();
        for r in &snapshot {
            if let Some(plural_s) = r.get("plural") {
                for plural in plural_s.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                    let key = if plural == "+s" {
                        format!("{}s", r.key())
                    } else {
                        plural.to_string()
                    };
                    rules.push(r.with_key(key).without("plural"));
                }
            }
        }

        // ::inflections
        let snapshot = rules.clone();
        for r in &snapshot {
            if let Some(infl_s) = r.get("inflections") {
                for infl in infl_s.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                    rules.push(r.with_key(infl.to_string()).without("inflections"));
                }
            }
        }

        // ::alt-spelling
        let snapshot = rules.clone();
        for r in &snapshot {
            if let Some(alt_s) = r.get("alt-spelling") {
                for alt in alt_s.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                    let key = if alt == "+hyphen" {
                        r.key().replace(' ', "-")
                    } else {
                        alt.to_string()
                    };
                    rules.push(r.with_key(key).without("alt-spelling"));
                }
            }
        }

        // spaced abbreviation variants become repairs: `e. g.` → `e.g.`
        let snapshot = rules.clone();
        for r in &snapshot {
            if matches!(r.head(), "abbrev" | "lexical")
                && r.get("sem-class") != Some("url")
                && self.re_abbrev_elem.is_match(r.key())
            {
                for expanded in self.abbrev_space_expansions(r.key()) {
                    if expanded != r.key() {
                        let mut slots =
                            vec![("repair".to_string(), expanded), ("target".to_string(), r.key().to_string())];
                        slots.extend(r.slots.iter().skip(1).cloned());
                        rules.push(ParsedRule { slots });
                    }
                }
            }
        }

        // ::misspelling side slot on abbrev/lexical entries
        let snapshot = rules.clone();
        for r in &snapshot {
            if matches!(r.head(), "abbrev" | "lexical") {
                if let Some(missp_s) = r.get("misspelling") {
                    for missp in missp_s.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                        let mut slots = vec![
                            ("repair".to_string(), missp.to_string()),
                            ("target".to_string(), r.key().to_string()),
                        ];
                        slots.extend(
                            r.slots
                                .iter()
                                .skip(1)
                                .filter(|(name, _)| name != "misspelling")
                                .cloned(),
                        );
                        rules.push(ParsedRule { slots });
                    }
                }
            }
        }

        // ::suffix-variations on misspelling heads
        let snapshot = rules.clone();
        for r in &snapshot {
            if r.head() == "misspelling" {
                let (Some(raw), Some(target)) = (r.get("suffix-variations"), r.get("target"))
                else {
                    continue;
                };
                let (lemma_suffix, variations) =
                    if let Some(m) = self.re_suffix_variation.captures(raw) {
                        (m[1].to_string(), m[2].to_string())
                    } else {
                        (String::new(), raw.to_string())
                    };
                let base_key = r
                    .key()
                    .strip_suffix(&lemma_suffix)
                    .unwrap_or(r.key())
                    .to_string();
                let base_target = target
                    .strip_suffix(&lemma_suffix)
                    .unwrap_or(target)
                    .to_string();
                for var in variations.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                    let mut v = r
                        .with_key(format!("{base_key}{var}"))
                        .without("suffix-variations");
                    for slot in v.slots.iter_mut() {
                        if slot.0 == "target" {
                            slot.1 = format!("{base_target}{var}");
                        }
                    }
                    rules.push(v);
                }
                // the base entry keeps its own key; just drop the handled slot
                let idx = rules
                    .iter()
                    .position(|x| x.slots == r.slots)
                    .expect("snapshot entry present");
                rules[idx] = r.without("suffix-variations");
            }
        }

        rules
    }
}

const TOK_VALID_SLOTS: &[&str] = &[
    "abbrev",
    "alt-spelling",
    "case-sensitive",
    "char-split",
    "comment",
    "contraction",
    "country",
    "eng",
    "etym-lcode",
    "example",
    "exp",
    "group",
    "inflections",
    "lcode",
    "lcode-not",
    "left-context",
    "left-context-not",
    "lexical",
    "misspelling",
    "non-symbol",
    "nonstandard",
    "plural",
    "problem",
    "priority",
    "punct-split",
    "repair",
    "resource-rule",
    "right-context",
    "right-context-not",
    "sem-class",
    "side",
    "substandard",
    "suffix-variations",
    "tag",
    "target",
    "token-category",
    "value",
];

fn tok_required_slots() -> HashMap<&'static str, &'static [&'static str]> {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    m.insert("abbrev", &[]);
    m.insert("contraction", &["target"]);
    m.insert("lexical", &[]);
    m.insert("misspelling", &["target"]);
    m.insert("non-symbol", &[]);
    m.insert("punct-split", &["side"]);
    m.insert("repair", &["target"]);
    m.insert("resource-rule", &["value"]);
    m
}

/// TLD reliability tier: unreliable codes double as ordinary words
/// (`in`, `so`, `it`) and need stronger evidence in URL recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reliability {
    Low,
    Normal,
    High,
}

/// Top-level-domain table for URL/email validation
#[derive(Debug, Default)]
pub struct TldTable {
    codes: HashMap<String, Reliability>,
}

impl TldTable {
    pub fn reliability(&self, code: &str) -> Option<Reliability> {
        self.codes.get(&code.to_lowercase()).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains_key(&code.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Immutable, indexed rule store built once at startup
#[derive(Debug, Default)]
pub struct ResourceStore {
    /// Primary index: case-folded key surface → entries (file order)
    entries: HashMap<String, Vec<RuleEntry>>,
    /// Prefixes of keys, used to bound the longest-match scans
    prefix_general: HashSet<String>,
    prefix_lexical: HashSet<String>,
    prefix_punct: HashSet<String>,
    max_key_len: usize,
    filename_extensions: Vec<String>,
    pub tld: TldTable,
}

impl ResourceStore {
    /// Loads all resource files for the given language codes from `data_dir`.
    ///
    /// `tok-resource.txt` and `top-level-domain-codes.txt` are required;
    /// a missing per-language file only produces a warning (the caller falls
    /// back to universal plus eng-global rules).
    pub fn load(data_dir: &Path, lang_codes: &[String]) -> Result<Self> {
        let parser = LineParser::new();
        let mut store = ResourceStore::default();
        for lcode in lang_codes {
            let file = data_dir.join(format!("tok-resource-{lcode}.txt"));
            if file.is_file() {
                store.load_tok_file(&parser, &file, Some(lcode))?;
            } else {
                warn!("No resource file available for language '{lcode}' ({})", file.display());
            }
        }
        if !lang_codes.iter().any(|c| c == "eng-global") {
            let file = data_dir.join("tok-resource-eng-global.txt");
            if file.is_file() {
                store.load_tok_file(&parser, &file, Some("eng-global"))?;
            }
        }
        store.load_tok_file(&parser, &data_dir.join("tok-resource.txt"), None)?;
        store.load_tld_file(&parser, &data_dir.join("top-level-domain-codes.txt"))?;
        Ok(store)
    }

    pub fn lookup(&self, key_lc: &str) -> &[RuleEntry] {
        self.entries.get(key_lc).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn filename_extensions(&self) -> &[String] {
        &self.filename_extensions
    }

    pub fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    /// Prefix test used by the scans: is `prefix` a prefix of any key in the
    /// given family?
    pub fn is_prefix(&self, family: PrefixFamily, prefix: &str) -> bool {
        match family {
            PrefixFamily::General => self.prefix_general.contains(prefix),
            PrefixFamily::Lexical => self.prefix_lexical.contains(prefix),
            PrefixFamily::Punct => self.prefix_punct.contains(prefix),
        }
    }

    fn load_tok_file(
        &mut self,
        parser: &LineParser,
        file: &Path,
        file_lcode: Option<&str>,
    ) -> Result<()> {
        let content = std::fs::read_to_string(file).map_err(|source| Error::ResourceIo {
            file: file.to_path_buf(),
            source,
        })?;
        let required = tok_required_slots();
        let mut n_entries = 0usize;
        for (lineno0, raw) in content.lines().enumerate() {
            let lineno = lineno0 + 1;
            let line = parser.without_comment(raw);
            if line.trim().is_empty() {
                continue;
            }
            let parsed = parser.parse_slots(&line, file, lineno)?;
            parser.validate(&parsed, TOK_VALID_SLOTS, &required, file, lineno)?;
            for rule in parser.expand(parsed) {
                if let Some(entry) = self.build_entry(&rule, file, lineno, file_lcode)? {
                    self.register(entry);
                    n_entries += 1;
                }
            }
        }
        log::info!("Loaded {n_entries} entries from {}", file.display());
        Ok(())
    }

    fn build_entry(
        &mut self,
        rule: &ParsedRule,
        file: &Path,
        lineno: usize,
        file_lcode: Option<&str>,
    ) -> Result<Option<RuleEntry>> {
        let key = rule.key().to_string();
        let kind = match rule.head() {
            "abbrev" => RuleKind::Abbrev,
            "contraction" => RuleKind::Contraction,
            "repair" => RuleKind::Repair,
            "misspelling" => RuleKind::Misspelling,
            "punct-split" => RuleKind::PunctSplit,
            "non-symbol" => RuleKind::NonSymbol,
            "lexical" => {
                let priority = rule.has("priority")
                    || rule.get("sem-class") == Some("url")
                    || key.chars().any(|c| c.is_ascii_digit());
                if priority {
                    RuleKind::LexicalPriority
                } else {
                    RuleKind::Lexical
                }
            }
            "resource-rule" => {
                // engine parameters, not token rules
                if key == "filename-extension" {
                    if let Some(value) = rule.get("value") {
                        self.filename_extensions.extend(
                            value
                                .split(';')
                                .map(str::trim)
                                .filter(|s| !s.is_empty())
                                .map(str::to_lowercase),
                        );
                    }
                }
                return Ok(None);
            }
            other => {
                return Err(Error::Resource {
                    file: file.to_path_buf(),
                    line: lineno,
                    message: format!("unknown rule kind ::{other}"),
                })
            }
        };
        if key.is_empty() {
            return Err(Error::Resource {
                file: file.to_path_buf(),
                line: lineno,
                message: format!("empty key surface for ::{}", rule.head()),
            });
        }

        let mut entry = RuleEntry::new(key, kind);
        entry.lcode = rule
            .get("lcode")
            .map(str::to_string)
            .or_else(|| file_lcode.map(str::to_string));
        if let Some(not_s) = rule.get("lcode-not") {
            entry.lcodes_not = not_s
                .split([',', ';'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        entry.sem_class = rule.get("sem-class").map(str::to_string);
        entry.tag = rule.get("tag").map(str::to_string);
        entry.case_sensitive = rule.has("case-sensitive");
        entry.target = rule.get("target").map(str::to_string);
        entry.group = rule.has("group");
        if let Some(side_s) = rule.get("side") {
            entry.side = Some(Side::parse(side_s).ok_or_else(|| Error::Resource {
                file: file.to_path_buf(),
                line: lineno,
                message: format!("invalid ::side {side_s} (should be start/end/both)"),
            })?);
        }
        if let Some(split_s) = rule.get("char-split") {
            let splits: Vec<usize> = split_s
                .split(',')
                .map(|p| p.trim().parse::<usize>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| Error::Resource {
                    file: file.to_path_buf(),
                    line: lineno,
                    message: format!("ill-formed ::char-split {split_s}"),
                })?;
            let target_pieces = entry
                .target
                .as_deref()
                .map(|t| t.split_whitespace().count())
                .unwrap_or(0);
            let key_len = entry.surface.chars().count();
            if splits.len() != target_pieces || splits.iter().sum::<usize>() != key_len {
                return Err(Error::Resource {
                    file: file.to_path_buf(),
                    line: lineno,
                    message: format!(
                        "::char-split {split_s} does not partition '{}' into the target pieces",
                        entry.surface
                    ),
                });
            }
            entry.char_splits = Some(splits);
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
        const KNOWN: &[&str] = &[
            "lcode",
            "lcode-not",
            "sem-class",
            "tag",
            "case-sensitive",
            "target",
            "group",
            "side",
            "char-split",
            "left-context",
            "left-context-not",
            "right-context",
            "right-context-not",
            "priority",
        ];
        for (name, value) in rule.slots.iter().skip(1) {
            if !KNOWN.contains(&name.as_str()) {
                entry.aux.insert(name.clone(), value.clone());
            }
        }
        Ok(Some(entry))
    }

    fn register(&mut self, entry: RuleEntry) {
        let key_lc = fold_lower(&entry.surface);
        let family = match entry.kind {
            RuleKind::PunctSplit => PrefixFamily::Punct,
            RuleKind::Lexical => PrefixFamily::Lexical,
            _ => PrefixFamily::General,
        };
        let mut prefix = String::new();
        for ch in key_lc.chars() {
            prefix.push(ch);
            match family {
                PrefixFamily::General => self.prefix_general.insert(prefix.clone()),
                PrefixFamily::Lexical => self.prefix_lexical.insert(prefix.clone()),
                PrefixFamily::Punct => self.prefix_punct.insert(prefix.clone()),
            };
        }
        self.max_key_len = self.max_key_len.max(key_lc.chars().count());
        let list = self.entries.entry(key_lc).or_default();
        if let Some(existing) = list.iter_mut().find(|e| {
            e.kind == entry.kind
                && e.surface == entry.surface
                && e.lcode == entry.lcode
                && e.side == entry.side
        }) {
            warn!(
                "Duplicate {:?} rule for '{}' (lcode {:?}): last one wins",
                entry.kind, entry.surface, entry.lcode
            );
            *existing = entry;
        } else {
            list.push(entry);
        }
    }

    fn load_tld_file(&mut self, parser: &LineParser, file: &Path) -> Result<()> {
        let content = std::fs::read_to_string(file).map_err(|source| Error::ResourceIo {
            file: file.to_path_buf(),
            source,
        })?;
        let mut required: HashMap<&str, &[&str]> = HashMap::new();
        required.insert("code", &[]);
        let valid = ["code", "comment", "country-name", "example", "reliability"];
        for (lineno0, raw) in content.lines().enumerate() {
            let lineno = lineno0 + 1;
            let line = parser.without_comment(raw);
            if line.trim().is_empty() {
                continue;
            }
            let parsed = parser.parse_slots(&line, file, lineno)?;
            parser.validate(&parsed, &valid, &required, file, lineno)?;
            let code = parsed.key().to_lowercase();
            if code.is_empty() {
                return Err(Error::Resource {
                    file: file.to_path_buf(),
                    line: lineno,
                    message: "empty ::code".to_string(),
                });
            }
            let reliability = match parsed.get("reliability") {
                Some("low") => Reliability::Low,
                Some("high") => Reliability::High,
                _ => Reliability::Normal,
            };
            self.tld.codes.insert(code, reliability);
        }
        Ok(())
    }
}

/// Which prefix index a scan consults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixFamily {
    General,
    Lexical,
    Punct,
}

/// Length-preserving lowercase: `İ` maps to a single `i` instead of the
/// two-character canonical lowering.
pub fn fold_lower(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c == 'İ' {
                'i'
            } else {
                c.to_lowercase().next().unwrap_or(c)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parser() -> LineParser {
        LineParser::new()
    }

    #[test]
    fn comment_stripping() {
        let p = parser();
        assert_eq!(p.without_comment("# full comment"), "");
        assert_eq!(
            p.without_comment("::abbrev Mr. ::exp Mister  # honorific"),
            "::abbrev Mr. ::exp Mister"
        );
        // '#' as a key surface survives
        assert_eq!(
            p.without_comment("::punct-split # ::side both"),
            "::punct-split # ::side both"
        );
    }

    #[test]
    fn slot_parsing_and_escapes() {
        let p = parser();
        let file = PathBuf::from("t.txt");
        let r = p
            .parse_slots(r"::abbrev No. ::right-context \d ::exp number", &file, 1)
            .unwrap();
        assert_eq!(r.head(), "abbrev");
        assert_eq!(r.key(), "No.");
        assert_eq!(r.get("right-context"), Some(r"\d"));
        assert_eq!(r.get("exp"), Some("number"));

        let r = p
            .parse_slots(r"::lexical a\:\:b ::sem-class odd", &file, 2)
            .unwrap();
        assert_eq!(r.key(), "a::b");
    }

    #[test]
    fn validation_rejects_unknown_head() {
        let p = parser();
        let file = PathBuf::from("t.txt");
        let r = p.parse_slots("::bogus x ::target y", &file, 3).unwrap();
        assert!(p
            .validate(&r, TOK_VALID_SLOTS, &tok_required_slots(), &file, 3)
            .is_err());
    }

    #[test]
    fn validation_requires_target_for_contraction() {
        let p = parser();
        let file = PathBuf::from("t.txt");
        let r = p.parse_slots("::contraction can't", &file, 4).unwrap();
        assert!(p
            .validate(&r, TOK_VALID_SLOTS, &tok_required_slots(), &file, 4)
            .is_err());
    }

    #[test]
    fn apostrophe_expansion_covers_curly_quotes() {
        let p = parser();
        let file = PathBuf::from("t.txt");
        let r = p
            .parse_slots("::contraction can't ::target can n't", &file, 1)
            .unwrap();
        let expanded = p.expand(r);
        let keys: Vec<&str> = expanded.iter().map(|r| r.key()).collect();
        assert!(keys.contains(&"can't"));
        assert!(keys.contains(&"can’t"));
        let curly = expanded.iter().find(|r| r.key() == "can’t").unwrap();
        assert_eq!(curly.get("target"), Some("can n’t"));
    }

    #[test]
    fn plural_expansion() {
        let p = parser();
        let file = PathBuf::from("t.txt");
        let r = p
            .parse_slots(
                "::lexical brother-in-law ::plural brothers-in-law; +s",
                &file,
                1,
            )
            .unwrap();
        let keys: Vec<String> = p.expand(r).iter().map(|r| r.key().to_string()).collect();
        assert!(keys.contains(&"brothers-in-law".to_string()));
        assert!(keys.contains(&"brother-in-laws".to_string()));
    }

    #[test]
    fn spaced_abbrev_becomes_repair() {
        let p = parser();
        let file = PathBuf::from("t.txt");
        let r = p.parse_slots("::abbrev e.g. ::exp for example", &file, 1).unwrap();
        let expanded = p.expand(r);
        let repair = expanded
            .iter()
            .find(|r| r.head() == "repair" && r.key() == "e. g.")
            .expect("spaced repair generated");
        assert_eq!(repair.get("target"), Some("e.g."));
    }

    #[test]
    fn suffix_variations_on_misspelling() {
        let p = parser();
        let file = PathBuf::from("t.txt");
        let r = p
            .parse_slots(
                "::misspelling recieve ::target receive ::suffix-variations e/es;ed;ing",
                &file,
                1,
            )
            .unwrap();
        let expanded = p.expand(r);
        let pairs: Vec<(String, String)> = expanded
            .iter()
            .filter(|r| r.head() == "misspelling")
            .map(|r| (r.key().to_string(), r.get("target").unwrap().to_string()))
            .collect();
        assert!(pairs.contains(&("recieves".into(), "receives".into())));
        assert!(pairs.contains(&("recieved".into(), "received".into())));
        assert!(pairs.contains(&("recieving".into(), "receiving".into())));
    }

    #[test]
    fn fold_lower_preserves_length() {
        assert_eq!(fold_lower("İstanbul").chars().count(), "İstanbul".chars().count());
        assert_eq!(fold_lower("CAN'T"), "can't");
    }
}
