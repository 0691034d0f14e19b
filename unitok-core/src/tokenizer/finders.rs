//! Greedy-isolating finders: XML tags, URLs, email addresses, hashtags and
//! handles, filenames, and symbol groups. Each returns the leftmost match in
//! the span; boundary conditions that the original expressed as look-arounds
//! are explicit character checks here.

use super::{FoundMatch, LineCtx, TokenPiece, Tokenizer};
use crate::chart::TokenType;
use crate::charclass::BitVector;
use crate::resource::{fold_lower, Reliability, RuleKind};

const MAX_XML_TAG_LEN: usize = 256;

const BBCODE_PARAM_TAGS: &[&str] = &["quote", "url", "color", "size"];
const BBCODE_PLAIN_TAGS: &[&str] = &[
    "quote", "img", "indent", "url", "b", "i", "color", "center", "size",
];

const URL_SCHEMES: &[&str] = &["https://", "http://", "ftps://", "ftp://", "mailto:"];

/// Characters allowed inside a URL body besides letters and digits
const URL_PUNCT: &[char] = &[
    '-', '_', ',', '.', '/', ':', ';', '=', '?', '@', '\'', '`', '~', '#', '%', '&', '*', '+',
    '(', ')',
];

const ABS_PATH_HEADS: &[&str] = &["bin", "etc", "home", "opt", "tmp", "usr", "var", "wp-content"];

impl Tokenizer {
    /// Cheap relevance test shared by URL and filename finders: a period
    /// followed by two letters occurs somewhere in the span.
    fn has_dot_letter_letter(&self, ctx: &LineCtx, start: usize, end: usize) -> bool {
        (start..end.saturating_sub(2)).any(|i| {
            ctx.chars[i] == '.'
                && ctx.chars[i + 1].is_alphabetic()
                && ctx.chars[i + 2].is_alphabetic()
        })
    }

    pub(crate) fn find_xml(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        if ctx.lv.intersects(BitVector::LESS_THAN) {
            for i in start..end {
                if ctx.chars[i] != '<' {
                    continue;
                }
                if let Some(tag_end) = self.parse_xml_tag(ctx, i, end) {
                    return Some(FoundMatch::single(TokenPiece::new(
                        i,
                        tag_end,
                        TokenType::XmlTag,
                    )));
                }
            }
        }
        if ctx.lv.intersects(BitVector::LEFT_SQUARE_BRACKET) {
            for i in start..end {
                if ctx.chars[i] != '[' {
                    continue;
                }
                if let Some(tag_end) = parse_bbcode_tag(&ctx.chars, i, end) {
                    return Some(FoundMatch::single(TokenPiece::new(
                        i,
                        tag_end,
                        TokenType::Markup,
                    )));
                }
            }
        }
        None
    }

    /// `<tag attr="v">`, `</tag>`, `<tag/>`, `<!--...-->`, `<$Template$>`
    fn parse_xml_tag(&self, ctx: &LineCtx, i: usize, end: usize) -> Option<usize> {
        let chars = &ctx.chars;
        let limit = end.min(i + MAX_XML_TAG_LEN);
        // comment tag
        if matches(chars, i, "<!--") {
            let mut j = i + 4;
            while j + 2 < limit {
                if chars[j] == '-' && chars[j + 1] == '-' && chars[j + 2] == '>' {
                    return Some(j + 3);
                }
                j += 1;
            }
            return None;
        }
        // template placeholder, e.g. <$BlogBacklinkAuthor$>
        if i + 1 < limit && chars[i + 1] == '$' {
            let mut j = i + 2;
            while j < limit && (chars[j].is_ascii_alphanumeric() || chars[j] == '-' || chars[j] == '_') {
                j += 1;
            }
            if j > i + 2 && j + 1 < limit && chars[j] == '$' && chars[j + 1] == '>' {
                return Some(j + 2);
            }
            return None;
        }
        let mut j = i + 1;
        if j < limit && chars[j] == '/' {
            j += 1;
        }
        if j >= limit || !chars[j].is_ascii_alphabetic() {
            return None;
        }
        while j < limit && (chars[j].is_ascii_alphanumeric() || matches!(chars[j], '-' | '_' | ':')) {
            j += 1;
        }
        // attributes with balanced quotes
        loop {
            let attr_start = j;
            while j < limit && chars[j] == ' ' {
                j += 1;
            }
            if j < limit && chars[j].is_ascii_alphabetic() && j > attr_start {
                while j < limit
                    && (chars[j].is_ascii_alphanumeric() || matches!(chars[j], '-' | '_' | ':'))
                {
                    j += 1;
                }
                if j >= limit || chars[j] != '=' {
                    return None;
                }
                j += 1;
                if j >= limit || (chars[j] != '"' && chars[j] != '\'') {
                    return None;
                }
                let quote = chars[j];
                j += 1;
                while j < limit && chars[j] != quote {
                    j += 1;
                }
                if j >= limit {
                    return None;
                }
                j += 1;
            } else {
                j = attr_start;
                break;
            }
        }
        while j < limit && chars[j] == ' ' {
            j += 1;
        }
        if j < limit && chars[j] == '/' {
            j += 1;
        }
        (j < limit && chars[j] == '>').then_some(j + 1)
    }

    pub(crate) fn find_url(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        if !self.has_dot_letter_letter(ctx, start, end) {
            return None;
        }
        for i in start..end {
            if let Some(url_end) = self.parse_scheme_url(ctx, i, end) {
                return Some(FoundMatch::single(TokenPiece::new(i, url_end, TokenType::Url)));
            }
            if let Some(url_end) = self.parse_domain_url(ctx, i, start, end) {
                return Some(FoundMatch::single(TokenPiece::new(i, url_end, TokenType::Url)));
            }
        }
        None
    }

    fn parse_scheme_url(&self, ctx: &LineCtx, i: usize, end: usize) -> Option<usize> {
        let chars = &ctx.chars;
        let scheme = URL_SCHEMES
            .iter()
            .find(|s| matches_nocase(chars, i, s))?;
        let body_start = i + scheme.chars().count();
        let mut j = body_start;
        while j < end && is_url_char(chars[j]) {
            j += 1;
        }
        // the last character must be a letter, digit or slash
        while j > body_start {
            let last = chars[j - 1];
            if last.is_alphanumeric() || last == '/' {
                break;
            }
            j -= 1;
        }
        (j > body_start).then_some(j)
    }

    /// TLD-suffixed URLs: `www.` chains and bare domains, with the
    /// reliability tiers deciding how much label evidence is needed.
    fn parse_domain_url(
        &self,
        ctx: &LineCtx,
        i: usize,
        span_start: usize,
        end: usize,
    ) -> Option<usize> {
        let chars = &ctx.chars;
        if !is_label_char(chars[i]) {
            return None;
        }
        // no Latin letter, Latin letter + '.', or '@' directly before
        if i > span_start {
            let prev = chars[i - 1];
            if prev == '@' || is_latin_letter(prev) {
                return None;
            }
            if prev == '.' && i >= 2 && is_latin_letter(chars[i - 2]) {
                return None;
            }
        }
        // collect dot-separated labels
        let mut labels: Vec<(usize, usize)> = Vec::new();
        let mut j = i;
        loop {
            let label_start = j;
            while j < end && is_label_char(chars[j]) {
                j += 1;
            }
            if j == label_start {
                break;
            }
            labels.push((label_start, j));
            if j < end && chars[j] == '.' && j + 1 < end && is_label_char(chars[j + 1]) {
                j += 1;
            } else {
                break;
            }
        }
        if labels.len() < 2 {
            return None;
        }
        let (tld_start, tld_end) = *labels.last().unwrap();
        let tld: String = chars[tld_start..tld_end].iter().collect();
        if !tld.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let n_pre = labels.len() - 1;
        let label_len = |&(s, e): &(usize, usize)| e - s;
        let first: String = chars[labels[0].0..labels[0].1].iter().collect();
        let credible = if first.eq_ignore_ascii_case("www") {
            n_pre >= 2 && (2..=4).contains(&tld.len())
        } else {
            match self.store.tld.reliability(&tld) {
                Some(Reliability::High) => n_pre >= 1,
                Some(Reliability::Normal) => labels[..n_pre].iter().any(|l| label_len(l) >= 3),
                Some(Reliability::Low) => {
                    n_pre >= 2 || labels[..n_pre].iter().any(|l| label_len(l) >= 5)
                }
                None => false,
            }
        };
        if !credible {
            return None;
        }
        let mut url_end = tld_end;
        // optional path, query, fragment
        if url_end < end && chars[url_end] == '/' {
            let mut k = url_end + 1;
            while k < end && is_url_char(chars[k]) {
                k += 1;
            }
            while k > url_end + 1 && !(chars[k - 1].is_alphanumeric() || chars[k - 1] == '/') {
                k -= 1;
            }
            url_end = k;
        }
        // no letters directly after (a sentence-final period is fine)
        if let Some(&next) = chars.get(url_end) {
            if next.is_alphabetic() {
                return None;
            }
            if next == '.' {
                if let Some(&after) = chars.get(url_end + 1) {
                    if after.is_alphabetic() {
                        return None;
                    }
                }
            }
        }
        Some(url_end)
    }

    pub(crate) fn find_email(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        for at in start..end {
            if chars[at] != '@' {
                continue;
            }
            // local part: starts with a letter, ends with a letter or digit
            let mut local_start = at;
            while local_start > start && is_local_char(chars[local_start - 1]) {
                local_start -= 1;
            }
            while local_start < at && !chars[local_start].is_alphabetic() {
                local_start += 1;
            }
            if at - local_start < 2 || !chars[at - 1].is_alphanumeric() {
                continue;
            }
            if local_start > start {
                let prev = chars[local_start - 1];
                if prev.is_alphanumeric() || prev == '.' {
                    continue;
                }
            }
            // domain: letters/digits/[-_.], ends letter/digit, valid TLD
            let mut dom_end = at + 1;
            while dom_end < end && is_local_char(chars[dom_end]) {
                dom_end += 1;
            }
            while dom_end > at + 1 && !chars[dom_end - 1].is_alphanumeric() {
                dom_end -= 1;
            }
            if dom_end <= at + 1 || !chars[at + 1].is_alphanumeric() {
                continue;
            }
            let domain: String = chars[at + 1..dom_end].iter().collect();
            let Some(tld) = domain.rsplit('.').next().filter(|t| *t != domain) else {
                continue;
            };
            if tld.len() < 2 || !self.store.tld.contains(tld) {
                continue;
            }
            // boundary: nothing word-like may follow
            if let Some(&next) = chars.get(dom_end) {
                if next.is_alphanumeric() {
                    continue;
                }
                if next == '.' {
                    if let Some(&after) = chars.get(dom_end + 1) {
                        if after.is_alphanumeric() {
                            continue;
                        }
                    }
                }
            }
            return Some(FoundMatch::single(TokenPiece::new(
                local_start,
                dom_end,
                TokenType::Email,
            )));
        }
        None
    }

    pub(crate) fn find_hashtag_or_handle(
        &self,
        ctx: &LineCtx,
        start: usize,
        end: usize,
    ) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        for i in start..end {
            let marker = chars[i];
            if marker != '#' && marker != '@' {
                continue;
            }
            if i > start && !" .,;()[]{}'".contains(chars[i - 1]) {
                continue;
            }
            let mut j = i + 1;
            while j < end && (chars[j].is_alphanumeric() || chars[j] == '_' || chars[j] == '\u{200C}')
            {
                j += 1;
            }
            if j == i + 1 {
                continue;
            }
            // not followed by an (optionally dotted) letter or digit
            let k = if chars.get(j) == Some(&'.') { j + 1 } else { j };
            if chars.get(k).map(|c| c.is_alphanumeric()).unwrap_or(false) {
                continue;
            }
            let ttype = if marker == '#' {
                TokenType::Hashtag
            } else {
                TokenType::Handle
            };
            return Some(FoundMatch::single(TokenPiece::new(i, j, ttype)));
        }
        None
    }

    pub(crate) fn find_filename(
        &self,
        ctx: &LineCtx,
        start: usize,
        end: usize,
    ) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        let extensions = self.store.filename_extensions();
        if !extensions.is_empty() && self.has_dot_letter_letter(ctx, start, end) {
            for dot in start + 1..end {
                if chars[dot] != '.' {
                    continue;
                }
                let mut ext_end = dot + 1;
                while ext_end < end && chars[ext_end].is_ascii_alphanumeric() {
                    ext_end += 1;
                }
                let ext: String = chars[dot + 1..ext_end].iter().collect::<String>().to_lowercase();
                if !extensions.iter().any(|e| *e == ext) {
                    continue;
                }
                if chars.get(ext_end).map(|c| c.is_alphanumeric()).unwrap_or(false) {
                    continue;
                }
                // filename body before the dot
                if !chars[dot - 1].is_alphanumeric() {
                    continue;
                }
                let mut body_start = dot;
                while body_start > start && is_filename_char(chars[body_start - 1]) {
                    body_start -= 1;
                }
                while body_start < dot && !(chars[body_start].is_alphanumeric() || chars[body_start] == '/') {
                    body_start += 1;
                }
                if body_start == dot {
                    continue;
                }
                if body_start > start {
                    let prev = chars[body_start - 1];
                    if prev.is_alphanumeric() || matches!(prev, '-' | '_' | '.' | '@') {
                        continue;
                    }
                }
                return Some(FoundMatch::single(TokenPiece::new(
                    body_start,
                    ext_end,
                    TokenType::Filename,
                )));
            }
        }
        if ctx.lv.intersects(BitVector::SLASH) {
            if let Some(found) = self.find_abs_path(ctx, start, end) {
                return Some(found);
            }
        }
        None
    }

    /// Absolute paths under well-known roots, e.g. `/usr/share/dict/words`
    fn find_abs_path(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        for i in start..end {
            if chars[i] != '/' {
                continue;
            }
            if i > start {
                let prev = chars[i - 1];
                if prev.is_alphanumeric() || matches!(prev, '-' | '_' | '.' | '@') {
                    continue;
                }
            }
            let mut seg_end = i + 1;
            while seg_end < end && (chars[seg_end].is_ascii_alphanumeric() || chars[seg_end] == '-')
            {
                seg_end += 1;
            }
            let seg: String = chars[i + 1..seg_end].iter().collect::<String>().to_lowercase();
            let head_ok = ABS_PATH_HEADS
                .iter()
                .any(|h| seg == *h || (*h == "home" && seg.starts_with("home")));
            if !head_ok || chars.get(seg_end) != Some(&'/') {
                continue;
            }
            let mut j = seg_end + 1;
            while j < end && is_filename_char(chars[j]) {
                j += 1;
            }
            while j > seg_end + 1 && !chars[j - 1].is_alphanumeric() {
                j -= 1;
            }
            if chars.get(j).map(|c| c.is_alphanumeric()).unwrap_or(false) {
                continue;
            }
            return Some(FoundMatch::single(TokenPiece::new(i, j, TokenType::Filename)));
        }
        None
    }

    /// Maximal runs of miscellaneous symbols (emoji, dingbats, arrows);
    /// variation selectors ride along; `non-symbol` resource entries veto.
    pub(crate) fn find_symbol_group(
        &self,
        ctx: &LineCtx,
        start: usize,
        end: usize,
    ) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        let mut i = start;
        while i < end {
            if !self.classifier.has(chars[i], BitVector::MISC_SYMBOL) {
                i += 1;
                continue;
            }
            let run_start = i;
            while i < end
                && self.classifier.has(
                    chars[i],
                    BitVector::MISC_SYMBOL | BitVector::VARIATION_SELECTOR,
                )
            {
                i += 1;
            }
            let candidate: String = chars[run_start..i].iter().collect();
            if self.symbol_run_is_vetoed(ctx, &candidate, run_start, i) {
                continue;
            }
            let mut found = FoundMatch::single(TokenPiece::new(run_start, i, TokenType::EmojiSeq));
            found.left_done = true;
            return Some(found);
        }
        None
    }

    fn symbol_run_is_vetoed(
        &self,
        ctx: &LineCtx,
        candidate: &str,
        start: usize,
        end: usize,
    ) -> bool {
        let left: String = ctx.chars[..start].iter().collect();
        let right: String = ctx.chars[end..].iter().collect();
        self.store
            .lookup(&fold_lower(candidate))
            .iter()
            .filter(|e| e.kind == RuleKind::NonSymbol)
            .any(|e| e.fulfills_conditions(candidate, &left, &right, ctx.lang))
    }
}

fn matches(chars: &[char], i: usize, pat: &str) -> bool {
    let pat_chars: Vec<char> = pat.chars().collect();
    chars.len() >= i + pat_chars.len() && chars[i..i + pat_chars.len()] == pat_chars[..]
}

fn matches_nocase(chars: &[char], i: usize, pat: &str) -> bool {
    let pat_chars: Vec<char> = pat.chars().collect();
    if chars.len() < i + pat_chars.len() {
        return false;
    }
    chars[i..i + pat_chars.len()]
        .iter()
        .zip(&pat_chars)
        .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

fn parse_bbcode_tag(chars: &[char], i: usize, end: usize) -> Option<usize> {
    let mut j = i + 1;
    let close_tag = chars.get(j) == Some(&'/');
    if close_tag {
        j += 1;
    }
    let name_start = j;
    while j < end && chars[j].is_ascii_alphabetic() {
        j += 1;
    }
    let name: String = chars[name_start..j].iter().collect::<String>().to_lowercase();
    if name.is_empty() {
        return None;
    }
    if !close_tag && chars.get(j) == Some(&'=') {
        if !BBCODE_PARAM_TAGS.contains(&name.as_str()) {
            return None;
        }
        j += 1;
        let value_start = j;
        while j < end && !matches!(chars[j], ']' | '[' | '\t' | '\n') {
            j += 1;
        }
        if j == value_start || chars.get(j) != Some(&']') {
            return None;
        }
        return Some(j + 1);
    }
    if !BBCODE_PLAIN_TAGS.contains(&name.as_str()) {
        return None;
    }
    (chars.get(j) == Some(&']')).then_some(j + 1)
}

fn is_url_char(c: char) -> bool {
    c.is_alphanumeric() || URL_PUNCT.contains(&c)
}

fn is_label_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn is_local_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '+')
}

fn is_filename_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')
}

fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || (c.is_alphabetic() && ('\u{00C0}'..='\u{024F}').contains(&c))
}
