//! The detokenizer: re-joins a token stream into surface text, steered by
//! attach-tag markup, auto-attach rules, and contraction re-joins.

use crate::config::Config;
use crate::error::Result;
use crate::resource::{adjust_capitalization, fold_lower, DetokResource};
use crate::tokenizer::Tokenizer;
use regex::Regex;

/// The dual of [`Tokenizer`]: consumes tokenized lines and emits joined text.
pub struct Detokenizer {
    resource: DetokResource,
    config: Config,
    re_open_xml_end: Regex,
    re_close_xml_start: Regex,
}

impl Detokenizer {
    /// Create a detokenizer with default (universal) configuration
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create a detokenizer for a specific language code
    pub fn with_language(code: impl Into<String>) -> Result<Self> {
        Self::with_config(Config::builder().language(code).build()?)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let data_dir = config
            .data_dir
            .clone()
            .unwrap_or_else(Tokenizer::default_data_dir);
        let resource = DetokResource::load(&data_dir, &config.lang_codes)?;
        Ok(Self {
            resource,
            config,
            re_open_xml_end: Regex::new(
                r#"(?i)<[a-z][-_:a-z0-9]*(?:\s+[a-z][-_:a-z0-9]*="[^"]*")*\s*>$"#,
            )
            .unwrap(),
            re_close_xml_start: Regex::new(r"(?i)^</[a-z][-_a-z0-9]*>").unwrap(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Detokenize one line of space-separated tokens.
    pub fn detokenize_string(&self, line: &str) -> String {
        let line = line.trim();
        if line.is_empty() {
            return String::new();
        }
        if self.config.first_token_is_line_id {
            let mut parts = line.splitn(2, char::is_whitespace);
            let id = parts.next().unwrap_or_default();
            let rest = parts.next().unwrap_or_default();
            let joined = self.detokenize_core(rest);
            return if joined.is_empty() {
                id.to_string()
            } else {
                format!("{id} {joined}")
            };
        }
        self.detokenize_core(line)
    }

    fn detokenize_core(&self, line: &str) -> String {
        let lang = self.config.lang_code();
        let tag = self.resource.attach_tag;
        let mut tokens = self.split_tokens(line);
        let mut result = String::new();
        // no space before the first token
        let mut attach_after_previous = true;
        let mut i = 0;
        while i < tokens.len() {
            // try 3-token, then 2-token contraction re-joins
            let mut rejoined = false;
            for width in [3usize, 2] {
                if i + width <= tokens.len() {
                    let window = tokens[i..i + width].join(" ");
                    if let Some(contraction) = self.contraction_for(&window, lang) {
                        tokens.splice(i..i + width, [contraction]);
                        rejoined = true;
                        break;
                    }
                }
            }
            if rejoined {
                continue;
            }
            let token = tokens[i].clone();
            let next_token = tokens.get(i + 1).cloned().unwrap_or_default();
            let prev_token = if i > 0 { tokens[i - 1].clone() } else { String::new() };
            let right_context = tokens[i + 1..].join(" ");
            let marked_up = self.resource.is_markup_token(&token);

            let no_space = attach_after_previous
                || (marked_up && token.starts_with(tag))
                || self.auto_attaches_left(&token, &result, &right_context, lang)
                || self.re_close_xml_start.is_match(&token)
                || self.re_open_xml_end.is_match(&result);
            if !no_space && !result.is_empty() {
                result.push(' ');
            }
            if marked_up {
                result.push_str(token.trim_matches(tag));
            } else {
                result.push_str(&token);
            }
            attach_after_previous = (marked_up && token.ends_with(tag))
                || self.auto_attaches_right(&token, &prev_token, &next_token, lang);
            i += 1;
        }
        result
    }

    /// Splits a tokenized line into tokens; an XML tag with internal spaces
    /// (optionally attach-tagged) counts as one token.
    fn split_tokens(&self, line: &str) -> Vec<String> {
        let tag = self.resource.attach_tag;
        let chars: Vec<char> = line.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;
        let may_contain_xml = line.contains('<');
        while i < chars.len() {
            if chars[i].is_whitespace() {
                i += 1;
                continue;
            }
            if may_contain_xml {
                if let Some(end) = xml_token_end(&chars, i, tag) {
                    tokens.push(chars[i..end].iter().collect());
                    i = end;
                    continue;
                }
            }
            let start = i;
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            tokens.push(chars[start..i].iter().collect());
        }
        tokens
    }

    fn contraction_for(&self, target: &str, lang: Option<&str>) -> Option<String> {
        for join in self.resource.contraction_joins(&fold_lower(target)) {
            if join.entry.fulfills_conditions(target, "", "", lang, false) {
                return Some(adjust_capitalization(&join.contraction, target));
            }
        }
        None
    }

    fn auto_attaches_left(
        &self,
        token: &str,
        left_context: &str,
        right_context: &str,
        lang: Option<&str>,
    ) -> bool {
        let lc = fold_lower(token);
        for entry in self.resource.auto_left_entries(&lc) {
            if entry.fulfills_conditions(token, left_context, right_context, lang, false) {
                return true;
            }
        }
        // a run of one repeated character attaches like its base entry
        if let Some(first) = lc.chars().next() {
            if lc.chars().count() > 1 && lc.chars().all(|c| c == first) {
                for entry in self.resource.auto_left_entries(&first.to_string()) {
                    if entry.fulfills_conditions(token, left_context, right_context, lang, true) {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn auto_attaches_right(
        &self,
        token: &str,
        left_context: &str,
        right_context: &str,
        lang: Option<&str>,
    ) -> bool {
        let lc = fold_lower(token);
        for entry in self.resource.auto_right_entries(&lc) {
            if entry.fulfills_conditions(token, left_context, right_context, lang, false) {
                return true;
            }
        }
        if let Some(first) = lc.chars().next() {
            if lc.chars().count() > 1 && lc.chars().all(|c| c == first) {
                for entry in self.resource.auto_right_entries(&first.to_string()) {
                    if entry.fulfills_conditions(token, left_context, right_context, lang, true) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

/// Detects a whitespace-delimited XML-tag token starting at `i`:
/// optional attach tag, `<...>` without nested angle brackets, optional
/// attach tag, then whitespace or end of line.
fn xml_token_end(chars: &[char], i: usize, tag: char) -> Option<usize> {
    let mut j = i;
    if chars.get(j) == Some(&tag) {
        j += 1;
    }
    if chars.get(j) != Some(&'<') {
        return None;
    }
    j += 1;
    if chars.get(j) == Some(&'/') {
        j += 1;
    }
    if !chars.get(j).map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
        return None;
    }
    while j < chars.len() && chars[j] != '>' && chars[j] != '<' {
        j += 1;
    }
    if chars.get(j) != Some(&'>') {
        return None;
    }
    j += 1;
    if chars.get(j) == Some(&tag) {
        j += 1;
    }
    match chars.get(j) {
        None => Some(j),
        Some(c) if c.is_whitespace() => Some(j),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detok() -> Detokenizer {
        Detokenizer::new().expect("bundled data loads")
    }

    fn detok_eng() -> Detokenizer {
        Detokenizer::with_language("eng").expect("bundled data loads")
    }

    #[test]
    fn splits_xml_tokens_whole() {
        let d = detok();
        let tokens = d.split_tokens(r#"a <a href="http://x.com/q w">@ b"#);
        assert_eq!(tokens, vec!["a", r#"<a href="http://x.com/q w">@"#, "b"]);
    }

    #[test]
    fn basic_punctuation_attaches() {
        let d = detok();
        assert_eq!(d.detokenize_string("Hello , world !"), "Hello, world!");
        assert_eq!(d.detokenize_string("( a b )"), "(a b)");
    }

    #[test]
    fn markup_tokens_steer_attachment() {
        let d = detok();
        assert_eq!(d.detokenize_string("peace @-@ loving"), "peace-loving");
        assert_eq!(d.detokenize_string(r#"( "@ Hello , world ! @" )"#), r#"("Hello, world!")"#);
    }

    #[test]
    fn contractions_rejoin() {
        let d = detok_eng();
        assert_eq!(d.detokenize_string("can n't 've"), "can't've");
        // Penn-style splits re-join via the detok-only table
        assert_eq!(d.detokenize_string("Ca n't stop"), "Can't stop");
    }

    #[test]
    fn decontraction_pieces_attach() {
        let d = detok();
        assert_eq!(d.detokenize_string("O'Connor 's car"), "O'Connor's car");
    }

    #[test]
    fn line_id_passes_through() {
        let config = Config::builder().first_token_is_line_id(true).build().unwrap();
        let d = Detokenizer::with_config(config).unwrap();
        assert_eq!(
            d.detokenize_string("GEN:1:1 In the beginning ."),
            "GEN:1:1 In the beginning."
        );
    }
}
