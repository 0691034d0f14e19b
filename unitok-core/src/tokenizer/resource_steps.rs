//! Resource-table driven steps: lexical preservation, abbreviations,
//! contractions, repairs, misspellings, punctuation splitting, and the
//! MT-markup dash handling. All of them share one longest-match scan over
//! the span, bounded by the store's key-prefix index.

use super::{FoundMatch, LineCtx, TokenPiece, Tokenizer};
use crate::chart::TokenType;
use crate::charclass::BitVector;
use crate::resource::{adjust_capitalization, fold_lower, PrefixFamily, RuleEntry, RuleKind, Side};
use regex::Regex;
use smallvec::SmallVec;

/// Regexes compiled once at tokenizer construction
pub(crate) struct StepRegexes {
    /// Right context that licenses a name initial: more initials and then a
    /// capitalized name, e.g. the `F. Kennedy` after `J.`
    initials_right: Regex,
}

impl StepRegexes {
    pub fn new() -> Self {
        Self {
            initials_right: Regex::new(
                r"^\s?(?:\s?\p{Lu}\.)*\s?(?:\p{Lu}\p{Ll}{2}|(?:Mc|O['’])\p{Lu})",
            )
            .unwrap(),
        }
    }
}

/// English suffix contractions split off by the fallback rule
const ENG_SUFFIXES: &[&str] = &["d", "em", "ll", "m", "re", "s", "ve"];

const APOSTROPHES: &[char] = &['\'', '‘', '’', '`', '‛'];
const DASHES: &[char] = &['-', '−', '–'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanKind {
    LexicalPriority,
    Lexical,
    Abbrev,
    Contraction,
    Repair,
    Misspelling,
}

impl ScanKind {
    fn family(self) -> PrefixFamily {
        match self {
            ScanKind::Lexical => PrefixFamily::Lexical,
            _ => PrefixFamily::General,
        }
    }

    fn rule_kind(self) -> RuleKind {
        match self {
            ScanKind::LexicalPriority => RuleKind::LexicalPriority,
            ScanKind::Lexical => RuleKind::Lexical,
            ScanKind::Abbrev => RuleKind::Abbrev,
            ScanKind::Contraction => RuleKind::Contraction,
            ScanKind::Repair => RuleKind::Repair,
            ScanKind::Misspelling => RuleKind::Misspelling,
        }
    }
}

impl Tokenizer {
    pub(crate) fn find_lexical(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        if let Some(found) = self.scan_for(ctx, start, end, ScanKind::LexicalPriority) {
            return Some(found);
        }
        self.scan_for(ctx, start, end, ScanKind::Lexical)
    }

    pub(crate) fn find_abbrev(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        if let Some(found) = self.scan_for(ctx, start, end, ScanKind::Abbrev) {
            return Some(found);
        }
        if ctx.lv.intersects(BitVector::DASH) {
            if let Some(found) = self.find_dash_acronym(ctx, start, end) {
                return Some(found);
            }
        }
        if let Some(found) = self.find_initials(ctx, start, end) {
            return Some(found);
        }
        self.find_period_acronym(ctx, start, end)
    }

    pub(crate) fn find_contraction(
        &self,
        ctx: &LineCtx,
        start: usize,
        end: usize,
    ) -> Option<FoundMatch> {
        if ctx.lv.intersects(BitVector::APOSTROPHE) {
            if let Some(found) = self.scan_for(ctx, start, end, ScanKind::Contraction) {
                return Some(found);
            }
            return self.find_suffix_contraction(ctx, start, end);
        }
        None
    }

    pub(crate) fn find_repair(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        self.scan_for(ctx, start, end, ScanKind::Repair)
    }

    pub(crate) fn find_misspelling(
        &self,
        ctx: &LineCtx,
        start: usize,
        end: usize,
    ) -> Option<FoundMatch> {
        self.scan_for(ctx, start, end, ScanKind::Misspelling)
    }

    /// The shared longest-match scan. Walks candidate start positions left
    /// to right, extends candidates along the key-prefix index, and tries
    /// ends from longest to shortest; the first entry that satisfies all
    /// conditions wins (most specific language code on ties).
    fn scan_for(
        &self,
        ctx: &LineCtx,
        start: usize,
        end: usize,
        scan: ScanKind,
    ) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        let family = scan.family();
        let mut last_primary = BitVector::EMPTY;
        for cand_start in start..end {
            let v = self.classifier.vector(chars[cand_start]);
            if v.intersects(BitVector::COMBINING_MARK) {
                continue;
            }
            // a token starting with a letter cannot follow a letter,
            // nor a digit-starting token a digit
            let blocked = (last_primary.intersects(BitVector::ALPHA)
                && v.intersects(BitVector::ALPHA))
                || (last_primary.intersects(BitVector::DIGIT) && v.intersects(BitVector::DIGIT));
            last_primary = v;
            if blocked {
                continue;
            }
            // longest extension the prefix index allows
            let mut key = String::new();
            let mut max_end = cand_start;
            for pos in cand_start..end {
                key.push(fold_char(chars[pos]));
                if self.store.is_prefix(family, &key) {
                    max_end = pos + 1;
                } else {
                    break;
                }
            }
            for cand_end in (cand_start + 1..=max_end).rev() {
                let candidate: String = chars[cand_start..cand_end].iter().collect();
                let candidate_lc: String =
                    chars[cand_start..cand_end].iter().map(|&c| fold_char(c)).collect();
                if !self.general_context_ok(ctx, start, end, cand_start, cand_end, &candidate) {
                    continue;
                }
                let mut best: Option<&RuleEntry> = None;
                for entry in self.store.lookup(&candidate_lc) {
                    if entry.kind != scan.rule_kind() {
                        continue;
                    }
                    if !self.entry_conditions_ok(ctx, entry, &candidate, cand_start, cand_end) {
                        continue;
                    }
                    let extra_ok = match scan {
                        ScanKind::Abbrev => self.abbrev_context_ok(
                            ctx, start, end, cand_start, cand_end, &candidate, entry,
                        ),
                        ScanKind::Lexical | ScanKind::LexicalPriority => self.lexical_context_ok(
                            ctx, start, end, cand_start, cand_end, &candidate, entry,
                        ),
                        _ => true,
                    };
                    if !extra_ok {
                        continue;
                    }
                    if best.map(|b| entry.specificity() > b.specificity()).unwrap_or(true) {
                        best = Some(entry);
                    }
                }
                if let Some(entry) = best {
                    return Some(self.entry_to_match(ctx, entry, scan, cand_start, cand_end));
                }
            }
        }
        None
    }

    /// Entry-level regex conditions use the full current line as context.
    fn entry_conditions_ok(
        &self,
        ctx: &LineCtx,
        entry: &RuleEntry,
        candidate: &str,
        cand_start: usize,
        cand_end: usize,
    ) -> bool {
        if entry.case_sensitive && entry.surface != candidate {
            return false;
        }
        if entry.contexts.is_trivial()
            && entry.lcode.is_none()
            && entry.lcodes_not.is_empty()
        {
            return true;
        }
        let left: String = ctx.chars[..cand_start].iter().collect();
        let right: String = ctx.chars[cand_end..].iter().collect();
        entry.fulfills_conditions(candidate, &left, &right, ctx.lang)
    }

    fn entry_to_match(
        &self,
        ctx: &LineCtx,
        entry: &RuleEntry,
        scan: ScanKind,
        cand_start: usize,
        cand_end: usize,
    ) -> FoundMatch {
        match scan {
            ScanKind::Contraction | ScanKind::Repair | ScanKind::Misspelling => {
                let orig: String = ctx.chars[cand_start..cand_end].iter().collect();
                let target = entry.target.as_deref().unwrap_or(&entry.surface);
                let mapped = map_contraction(
                    &orig,
                    &entry.surface,
                    target,
                    cand_start,
                    entry.char_splits.as_deref(),
                );
                let mut pieces: SmallVec<[TokenPiece; 2]> = SmallVec::new();
                for (surface, orig_piece, piece_start) in mapped {
                    let piece_end = piece_start + orig_piece.chars().count();
                    let ttype = match scan {
                        ScanKind::Contraction => {
                            if surface.chars().last().map(is_apostrophe).unwrap_or(false) {
                                TokenType::DecontractionR
                            } else {
                                TokenType::Decontraction
                            }
                        }
                        _ => TokenType::Repair,
                    };
                    let mut piece = TokenPiece::new(piece_start, piece_end, ttype);
                    if surface != orig_piece {
                        piece.surface = Some(surface);
                    }
                    piece.sem_class = entry.sem_class.clone();
                    pieces.push(piece);
                }
                // the left residue must re-enter this step: the suffix
                // contraction fallback has not seen it yet
                FoundMatch {
                    pieces,
                    left_done: matches!(scan, ScanKind::Repair | ScanKind::Misspelling),
                }
            }
            _ => {
                let ttype = match scan {
                    ScanKind::Abbrev => TokenType::Abbrev,
                    _ => {
                        if entry.sem_class.as_deref() == Some("url") {
                            TokenType::Url
                        } else {
                            TokenType::Lexical
                        }
                    }
                };
                let mut piece = TokenPiece::new(cand_start, cand_end, ttype);
                piece.sem_class = entry.sem_class.clone();
                // left_done stays false: the pattern sub-recognizers of the
                // abbreviation and lexical steps still get the left residue
                FoundMatch::single(piece)
            }
        }
    }

    /// Restrictions that hold for any resource candidate, independent of the
    /// matching entry. Contexts are span-local.
    fn general_context_ok(
        &self,
        ctx: &LineCtx,
        span_start: usize,
        span_end: usize,
        cand_start: usize,
        cand_end: usize,
        candidate: &str,
    ) -> bool {
        let chars = &ctx.chars;
        let lc_last = (cand_start > span_start).then(|| chars[cand_start - 1]);
        let rc_first = (cand_end < span_end).then(|| chars[cand_end]);
        let rc0 = rc_first.map(|c| self.classifier.vector(c)).unwrap_or_default();
        let lc0 = lc_last.map(|c| self.classifier.vector(c)).unwrap_or_default();

        // a token ending in a letter cannot be followed by a letter
        if rc0.intersects(BitVector::ALPHA) && ends_with_letter(candidate) {
            return false;
        }
        // nor by an orphaned combining mark
        if rc0.intersects(BitVector::COMBINING_MARK) && !ends_with_punct(candidate) {
            return false;
        }
        if ctx.lv.intersects(BitVector::QUOTE) {
            // don't split `c'` out of `'c'`
            if starts_with_letter(candidate)
                && candidate.chars().last().map(is_apostrophe).unwrap_or(false)
                && lc_last.map(is_apostrophe).unwrap_or(false)
            {
                return false;
            }
            // don't split `'d` out of `'d'`
            if candidate.chars().next().map(is_apostrophe).unwrap_or(false)
                && ends_with_letter(candidate)
                && rc_first.map(is_apostrophe).unwrap_or(false)
            {
                return false;
            }
        }
        if ctx.lv.intersects(BitVector::AMPERSAND) {
            // don't split AD out of IA&AD
            let short_letters = candidate.chars().count() <= 2 && candidate.chars().all(|c| c.is_alphabetic());
            if short_letters && (lc_last == Some('&') || rc_first == Some('&')) {
                return false;
            }
        }
        if ctx.lv.intersects(BitVector::ATTACH_TAG) && self.detok.is_markup_token(candidate) {
            // don't dismantle an attach-tag-decorated token
            let tag_adjacent_space = |idx: Option<char>, beyond: Option<char>| {
                idx.map(|c| self.classifier.has(c, BitVector::ATTACH_TAG)).unwrap_or(false)
                    && beyond.map(|c| c.is_whitespace()).unwrap_or(true)
            };
            let beyond_r = (cand_end + 1 < span_end).then(|| chars[cand_end + 1]);
            let beyond_l = (cand_start >= span_start + 2).then(|| chars[cand_start - 2]);
            if tag_adjacent_space(rc_first, beyond_r) || tag_adjacent_space(lc_last, beyond_l) {
                return false;
            }
        }
        if ctx.lv.intersects(BitVector::HEBREW) {
            // `"` between Hebrew letters stands for gershayim (acronym mark)
            if candidate == "\""
                && lc0.intersects(BitVector::HEBREW)
                && rc0.intersects(BitVector::HEBREW)
                && self.single_letter_follows(chars, cand_end, span_end)
            {
                return false;
            }
            // an apostrophe after a Hebrew letter stands for geresh
            if candidate == "'" && lc0.intersects(BitVector::HEBREW) {
                return false;
            }
        }
        true
    }

    /// Extra conditions for abbreviation candidates.
    fn abbrev_context_ok(
        &self,
        ctx: &LineCtx,
        span_start: usize,
        span_end: usize,
        cand_start: usize,
        cand_end: usize,
        candidate: &str,
        entry: &RuleEntry,
    ) -> bool {
        if entry.sem_class.as_deref() == Some("currency-unit") {
            return true;
        }
        let chars = &ctx.chars;
        let right: &[char] = &chars[cand_end..span_end];
        if ends_with_letter_or_digit(candidate) && starts_with_dashed_digit(right) {
            // only licensed by an explicit right-context clause
            let right_s: String = chars[cand_end..].iter().collect();
            let licensed = ends_with_letter(candidate)
                && entry
                    .contexts
                    .right
                    .as_ref()
                    .map(|re| re.is_match(&right_s))
                    .unwrap_or(false);
            if !licensed {
                return false;
            }
        }
        if candidate.ends_with('.') && self.single_letter_follows(chars, cand_end, span_end) {
            let rc0 = chars
                .get(cand_end)
                .map(|&c| self.classifier.vector(c))
                .unwrap_or_default();
            if !rc0.intersects(BitVector::HANGUL | BitVector::INDIC) {
                return false;
            }
        }
        // inside a period sequence: X. before this candidate
        if candidate.contains('.') && cand_start > span_start {
            let left: &[char] = &chars[span_start..cand_start];
            if left.last() == Some(&'.') && left.len() >= 2 && left[left.len() - 2].is_alphabetic() {
                return false;
            }
        }
        true
    }

    /// Extra conditions for lexical candidates.
    fn lexical_context_ok(
        &self,
        ctx: &LineCtx,
        span_start: usize,
        span_end: usize,
        cand_start: usize,
        cand_end: usize,
        candidate: &str,
        entry: &RuleEntry,
    ) -> bool {
        let chars = &ctx.chars;
        let left: &[char] = &chars[span_start..cand_start];
        let right: &[char] = &chars[cand_end..span_end];
        let sem_class = entry.sem_class.as_deref();

        let right_matches = |re: &Option<Regex>| {
            let right_s: String = chars[cand_end..].iter().collect();
            re.as_ref().map(|r| r.is_match(&right_s)).unwrap_or(false)
        };
        let left_matches = |re: &Option<Regex>| {
            let left_s: String = chars[..cand_start].iter().collect();
            re.as_ref().map(|r| r.is_match(&left_s)).unwrap_or(false)
        };

        // candidate-end letter/digit may not touch a following letter/digit
        if ends_with_letter_or_digit(candidate)
            && right.first().map(|c| c.is_alphanumeric()).unwrap_or(false)
        {
            let licensed = (ends_with_letter(candidate)
                && starts_with_dashed_digit(right)
                && right_matches(&entry.contexts.right))
                || (candidate.chars().last().map(|c| c.is_numeric()).unwrap_or(false)
                    && right.first().map(|c| c.is_alphabetic()).unwrap_or(false)
                    && right_matches(&entry.contexts.right));
            if !licensed {
                return false;
            }
        }
        // candidate-start letter/digit may not touch a preceding letter/digit
        if left.last().map(|c| c.is_alphanumeric()).unwrap_or(false)
            && candidate.chars().next().map(|c| c.is_alphanumeric()).unwrap_or(false)
        {
            let left_ends_digit = left.last().map(|c| c.is_numeric()).unwrap_or(false);
            let unit_after_number = left_ends_digit && sem_class == Some("unit-of-measurement");
            let licensed = unit_after_number
                || (left.last().map(|c| c.is_alphabetic()).unwrap_or(false)
                    && starts_with_dashed_digit(&candidate.chars().collect::<Vec<_>>())
                    && left_matches(&entry.contexts.left))
                || (left_ends_digit
                    && candidate.chars().next().map(|c| c.is_alphabetic()).unwrap_or(false)
                    && left_matches(&entry.contexts.left))
                || (ctx.lv.intersects(BitVector::INDIC | BitVector::HANGUL)
                    && left.last().map(|c| c.is_ascii_alphabetic()).unwrap_or(false)
                    && candidate
                        .chars()
                        .next()
                        .map(|c| {
                            self.classifier
                                .has(c, BitVector::INDIC | BitVector::HANGUL)
                        })
                        .unwrap_or(false));
            if !licensed {
                return false;
            }
        }
        // don't split `d'` off `d's`
        if candidate.chars().last().map(is_apostrophe).unwrap_or(false) {
            let mut rest = right.iter();
            if rest.next().map(|c| c.eq_ignore_ascii_case(&'s')).unwrap_or(false)
                && !rest.next().map(|c| c.is_alphanumeric()).unwrap_or(false)
            {
                return false;
            }
        }
        true
    }

    /// A single letter (plus combining marks) followed by a non-letter
    fn single_letter_follows(&self, chars: &[char], from: usize, end: usize) -> bool {
        let Some(&first) = chars.get(from) else {
            return false;
        };
        if !first.is_alphabetic() {
            return false;
        }
        let mut i = from + 1;
        while i < end && self.classifier.has(chars[i], BitVector::COMBINING_MARK) {
            i += 1;
        }
        !(i < end && chars[i].is_alphabetic())
    }

    /// Pattern abbreviations like `F-15B`, `SU-27s`
    fn find_dash_acronym(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        for i in start..end {
            if !chars[i].is_uppercase() {
                continue;
            }
            if i > start {
                let prev = chars[i - 1];
                if prev.is_alphanumeric() || DASHES.contains(&prev) {
                    continue;
                }
            }
            let mut j = i;
            while j < end && chars[j].is_uppercase() {
                j += 1;
            }
            if j >= end || !DASHES.contains(&chars[j]) {
                continue;
            }
            j += 1;
            let tail_start = j;
            while j < end && j - tail_start < 3 && (chars[j].is_uppercase() || chars[j].is_numeric())
            {
                j += 1;
            }
            if j == tail_start {
                continue;
            }
            if j < end && chars[j] == 's' {
                j += 1;
            }
            if j < end && (chars[j].is_alphanumeric() || DASHES.contains(&chars[j])) {
                continue;
            }
            return Some(FoundMatch::single(TokenPiece::new(i, j, TokenType::Abbrev)));
        }
        None
    }

    /// Name initials: `J.F.Kennedy` → `J.` `F.` `Kennedy`
    fn find_initials(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        for i in start..end.saturating_sub(1) {
            if !(chars[i].is_alphabetic() && chars[i].is_uppercase() && chars[i + 1] == '.') {
                continue;
            }
            if i > start && chars[i - 1].is_alphabetic() {
                continue;
            }
            let right: String = chars[i + 2..end].iter().collect();
            if self.step_regexes.initials_right.is_match(&right) {
                return Some(FoundMatch::single(TokenPiece::new(
                    i,
                    i + 2,
                    TokenType::Abbrev,
                )));
            }
        }
        None
    }

    /// Period acronyms such as `B.A.T.` and `e.V.`: two or more groups of
    /// one or two letters, each followed by a period
    fn find_period_acronym(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        for i in start..end {
            if !chars[i].is_alphabetic() {
                continue;
            }
            if i > start {
                let prev = chars[i - 1];
                if prev.is_alphanumeric() || prev == '.' || DASHES.contains(&prev) {
                    continue;
                }
            }
            let mut j = i;
            let mut groups = 0;
            loop {
                let mut letters = 0;
                while j < end && chars[j].is_alphabetic() && letters < 2 {
                    j += 1;
                    letters += 1;
                }
                if letters == 0 || j >= end || chars[j] != '.' {
                    break;
                }
                j += 1;
                groups += 1;
                if j < end && chars[j].is_alphabetic() && j + 1 < end && chars[j + 1].is_alphabetic()
                {
                    // more than two letters would follow: not an acronym group
                    let mut k = j;
                    let mut run = 0;
                    while k < end && chars[k].is_alphabetic() {
                        k += 1;
                        run += 1;
                    }
                    if run > 2 {
                        break;
                    }
                }
            }
            if groups < 2 {
                continue;
            }
            // nothing letter-, digit- or period-like may follow
            if chars.get(j).map(|c| c.is_alphanumeric() || *c == '.').unwrap_or(false) {
                continue;
            }
            return Some(FoundMatch::single(TokenPiece::new(i, j, TokenType::Abbrev)));
        }
        None
    }

    /// English suffix contractions: `John's` → `John` `'s`, `they've` →
    /// `they` `'ve`
    fn find_suffix_contraction(
        &self,
        ctx: &LineCtx,
        start: usize,
        end: usize,
    ) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        for i in start + 1..end {
            if !is_apostrophe(chars[i]) || !chars[i - 1].is_ascii_alphabetic() {
                continue;
            }
            for suffix in ENG_SUFFIXES {
                let suffix_len = suffix.len();
                if i + 1 + suffix_len > end {
                    continue;
                }
                let cand: String = chars[i + 1..i + 1 + suffix_len].iter().collect();
                if !cand.eq_ignore_ascii_case(suffix) {
                    continue;
                }
                let next = chars.get(i + 1 + suffix_len);
                if next.map(|c| c.is_alphanumeric() || *c == '_').unwrap_or(false) {
                    continue;
                }
                return Some(FoundMatch::single(TokenPiece::new(
                    i,
                    i + 1 + suffix_len,
                    TokenType::Decontraction,
                )));
            }
        }
        None
    }

    /// Preserves tokens that already carry attach-tag markup (`@-@`) and
    /// splits dash runs flanked by word material (`peace-loving`).
    pub(crate) fn find_mt_punct(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        if ctx.lv.intersects(BitVector::ATTACH_TAG) {
            let mut i = start;
            while i < end {
                if chars[i].is_whitespace() {
                    i += 1;
                    continue;
                }
                let tok_start = i;
                while i < end && !chars[i].is_whitespace() {
                    i += 1;
                }
                let token: String = chars[tok_start..i].iter().collect();
                if token.chars().count() > 1 && self.detok.is_markup_token(&token) {
                    return Some(FoundMatch::single(TokenPiece::new(
                        tok_start,
                        i,
                        TokenType::PunctMt,
                    )));
                }
            }
        }
        if ctx.lv.intersects(BitVector::DASH) {
            return self.find_mt_dash(ctx, start, end);
        }
        None
    }

    /// A dash run between two-letter-plus words (or digits) splits off so
    /// the detokenizer can re-attach it: `peace-loving` → `peace @-@ loving`.
    fn find_mt_dash(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        for i in start..end {
            if !DASHES.contains(&chars[i]) {
                continue;
            }
            // left: two letters, a digit, or !, ?, ’
            let left_ok = if i >= start + 1 {
                let p1 = chars[i - 1];
                if p1.is_numeric() || matches!(p1, '!' | '?' | '’') {
                    true
                } else {
                    p1.is_alphabetic()
                        && i >= start + 2
                        && chars[i - 2].is_alphabetic()
                }
            } else {
                false
            };
            if !left_ok {
                continue;
            }
            let mut j = i;
            while j < end && DASHES.contains(&chars[j]) {
                j += 1;
            }
            // right: two letters or a digit
            let right_ok = chars
                .get(j)
                .map(|&c| {
                    c.is_numeric()
                        || (c.is_alphabetic()
                            && chars.get(j + 1).map(|c2| c2.is_alphabetic()).unwrap_or(false))
                })
                .unwrap_or(false);
            if !right_ok {
                continue;
            }
            return Some(FoundMatch::single(TokenPiece::new(i, j, TokenType::Dash)));
        }
        None
    }

    /// Table-driven punctuation splitting with side conditions and
    /// same-character grouping.
    pub(crate) fn find_punct_split(
        &self,
        ctx: &LineCtx,
        start: usize,
        end: usize,
    ) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        for cand_start in start..end {
            let mut key = String::new();
            let mut max_end = cand_start;
            for pos in cand_start..end {
                key.push(fold_char(chars[pos]));
                if self.store.is_prefix(PrefixFamily::Punct, &key) {
                    max_end = pos + 1;
                } else {
                    break;
                }
            }
            for cand_end in (cand_start + 1..=max_end).rev() {
                let candidate: String = chars[cand_start..cand_end].iter().collect();
                let candidate_lc: String =
                    chars[cand_start..cand_end].iter().map(|&c| fold_char(c)).collect();
                if !self.general_context_ok(ctx, start, end, cand_start, cand_end, &candidate) {
                    continue;
                }
                for entry in self.store.lookup(&candidate_lc) {
                    if entry.kind != RuleKind::PunctSplit {
                        continue;
                    }
                    // same-character runs stay together
                    let mut group_end = cand_end;
                    if entry.group {
                        while group_end < end && chars[group_end] == chars[group_end - 1] {
                            group_end += 1;
                        }
                    }
                    let token: String = chars[cand_start..group_end].iter().collect();
                    if !self.entry_conditions_ok(ctx, entry, &token, cand_start, group_end) {
                        continue;
                    }
                    let at_span_start = cand_start == start
                        || chars[cand_start - 1].is_whitespace();
                    let at_span_end =
                        group_end == end || chars.get(group_end).map(|c| c.is_whitespace()).unwrap_or(true);
                    let ttype = match entry.side {
                        Some(Side::Both) => Some(TokenType::Punct),
                        Some(Side::Start) if at_span_start => Some(TokenType::PunctS),
                        Some(Side::End) if at_span_end => Some(TokenType::PunctE),
                        _ => None,
                    };
                    if let Some(ttype) = ttype {
                        let mut piece = TokenPiece::new(cand_start, group_end, ttype);
                        piece.sem_class = entry.sem_class.clone();
                        return Some(FoundMatch::single(piece));
                    }
                }
            }
        }
        None
    }
}

/// Splits a contraction (or repair) surface into target pieces, mapping each
/// piece back to its original characters and start position.
///
/// Returns `(surface, orig_surface, start_position)` triples.
pub(crate) fn map_contraction(
    orig_token: &str,
    source: &str,
    target: &str,
    orig_start: usize,
    char_splits: Option<&[usize]>,
) -> Vec<(String, String, usize)> {
    if let Some(splits) = char_splits {
        let target_tokens: Vec<&str> = target.split_whitespace().collect();
        let orig_chars: Vec<char> = orig_token.chars().collect();
        let mut out = Vec::with_capacity(splits.len());
        let mut pos = 0usize;
        let mut start = orig_start;
        for (i, &n) in splits.iter().enumerate() {
            let orig_piece: String = orig_chars[pos..(pos + n).min(orig_chars.len())].iter().collect();
            let surface = adjust_capitalization(target_tokens.get(i).copied().unwrap_or(""), &orig_piece);
            out.push((surface, orig_piece, start));
            pos += n;
            start += n;
        }
        return out;
    }
    if !source.contains(' ') && !target.contains(' ') {
        return vec![(
            adjust_capitalization(target, orig_token),
            orig_token.to_string(),
            orig_start,
        )];
    }
    // greedy alignment: peel matching target pieces off both ends
    let mut front: Vec<(String, String, usize)> = Vec::new();
    let mut back: Vec<(String, String, usize)> = Vec::new();
    let mut token: Vec<char> = orig_token.chars().collect();
    let mut start = orig_start;
    let mut end = orig_start + token.len();
    let mut source: Vec<char> = source.chars().collect();
    let mut target: Vec<char> = target.chars().collect();
    while !token.is_empty() {
        let target_s: String = target.iter().collect();
        let elements: Vec<String> = target_s.split_whitespace().map(str::to_string).collect();
        let source_s: String = source.iter().collect();
        if let Some(last) = elements.last().filter(|e| source_s.ends_with(*e)) {
            let n = last.chars().count();
            let orig_piece: String = token[token.len() - n..].iter().collect();
            back.insert(
                0,
                (adjust_capitalization(last, &orig_piece), orig_piece, end - n),
            );
            end -= n;
            token.truncate(token.len() - n);
            source.truncate(source.len() - n);
            target.truncate(target.len() - n);
            while target.last() == Some(&' ') {
                target.pop();
            }
            while token.last() == Some(&' ') {
                token.pop();
                end -= 1;
                if source.last() == Some(&' ') {
                    source.pop();
                }
            }
        } else if let Some(first) = elements.first().filter(|e| source_s.starts_with(*e)) {
            let n = first.chars().count();
            let orig_piece: String = token[..n].iter().collect();
            front.push((adjust_capitalization(first, &orig_piece), orig_piece, start));
            start += n;
            token.drain(..n);
            source.drain(..n);
            target.drain(..n);
            while target.first() == Some(&' ') {
                target.remove(0);
            }
            while token.first() == Some(&' ') {
                token.remove(0);
                start += 1;
                if source.first() == Some(&' ') {
                    source.remove(0);
                }
            }
        } else if !elements.is_empty() {
            let orig_piece: String = token.iter().collect();
            let surface: String = elements.join(" ");
            front.push((adjust_capitalization(&surface, &orig_piece), orig_piece, start));
            break;
        } else {
            break;
        }
    }
    front.extend(back);
    front
}

fn fold_char(c: char) -> char {
    if c == 'İ' {
        'i'
    } else {
        c.to_lowercase().next().unwrap_or(c)
    }
}

fn is_apostrophe(c: char) -> bool {
    APOSTROPHES.contains(&c)
}

fn ends_with_letter(s: &str) -> bool {
    s.chars().last().map(|c| c.is_alphabetic()).unwrap_or(false)
}

fn starts_with_letter(s: &str) -> bool {
    s.chars().next().map(|c| c.is_alphabetic()).unwrap_or(false)
}

fn ends_with_letter_or_digit(s: &str) -> bool {
    s.chars().last().map(|c| c.is_alphanumeric()).unwrap_or(false)
}

fn ends_with_punct(s: &str) -> bool {
    s.chars()
        .last()
        .map(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .unwrap_or(false)
}

fn starts_with_dashed_digit(right: &[char]) -> bool {
    match right.first() {
        Some(c) if c.is_numeric() => true,
        Some(c) if DASHES.contains(c) => right.get(1).map(|c| c.is_numeric()).unwrap_or(false),
        _ => false,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_contraction_with_char_splits() {
        let pieces = map_contraction("Can't", "can't", "can n't", 10, Some(&[3, 2]));
        assert_eq!(
            pieces,
            vec![
                ("Can".to_string(), "Can".to_string(), 10),
                ("n't".to_string(), "'t".to_string(), 13),
            ]
        );
    }

    #[test]
    fn map_contraction_single_replacement() {
        let pieces = map_contraction("Wo", "wo", "will", 4, None);
        assert_eq!(pieces, vec![("Will".to_string(), "Wo".to_string(), 4)]);
    }

    #[test]
    fn map_repair_spanning_space() {
        // "wo n't" → "will n't": the n't piece aligns at the end, the rest
        // maps onto "will"
        let pieces = map_contraction("wo n't", "wo n't", "will n't", 0, None);
        assert_eq!(
            pieces,
            vec![
                ("will".to_string(), "wo".to_string(), 0),
                ("n't".to_string(), "n't".to_string(), 3),
            ]
        );
    }

    #[test]
    fn map_contraction_aligned_prefix_suffix() {
        // "cannot" → "can not": both pieces align with the source
        let pieces = map_contraction("cannot", "cannot", "can not", 0, None);
        assert_eq!(
            pieces,
            vec![
                ("can".to_string(), "can".to_string(), 0),
                ("not".to_string(), "not".to_string(), 3),
            ]
        );
    }
}
