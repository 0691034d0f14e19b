//! Character normalization: the first pipeline step. Deletes undecodable
//! residue and control characters, repairs common mis-encodings, and
//! normalizes non-standard whitespace, all while keeping the offset map
//! aligned with the original line.

use super::{LineCtx, Tokenizer};
use crate::charclass::BitVector;

/// Irregular Windows-1252 → UTF-8 mappings for the C1 control range
const WINDOWS_1252: &[(char, char)] = &[
    ('\u{0080}', '\u{20AC}'), // Euro sign
    ('\u{0082}', '\u{201A}'),
    ('\u{0083}', '\u{0192}'),
    ('\u{0084}', '\u{201E}'),
    ('\u{0085}', '\u{2026}'),
    ('\u{0086}', '\u{2020}'),
    ('\u{0087}', '\u{2021}'),
    ('\u{0088}', '\u{02C6}'),
    ('\u{0089}', '\u{2030}'),
    ('\u{008A}', '\u{0160}'),
    ('\u{008B}', '\u{2039}'),
    ('\u{008C}', '\u{0152}'),
    ('\u{008E}', '\u{017D}'),
    ('\u{0091}', '\u{2018}'),
    ('\u{0092}', '\u{2019}'),
    ('\u{0093}', '\u{201C}'),
    ('\u{0094}', '\u{201D}'),
    ('\u{0095}', '\u{2022}'),
    ('\u{0096}', '\u{2013}'),
    ('\u{0097}', '\u{2014}'),
    ('\u{0098}', '\u{02DC}'),
    ('\u{0099}', '\u{2122}'),
    ('\u{009A}', '\u{0161}'),
    ('\u{009B}', '\u{203A}'),
    ('\u{009C}', '\u{0153}'),
    ('\u{009E}', '\u{017E}'),
    ('\u{009F}', '\u{0178}'),
];

/// Two-character mis-encoding fragments and their intended characters
const MISCODINGS: &[(&str, char)] = &[
    ("¡¦", '’'),
    ("¡§", '“'),
    ("¡¨", '”'),
    ("Âº", 'º'),
    ("Ã±", 'ñ'),
    ("Ãº", 'ú'),
    ("Ä±", 'ı'),
];

impl Tokenizer {
    pub(crate) fn normalize(&self, ctx: &mut LineCtx) {
        if ctx.lv.intersects(BitVector::REPLACEMENT) {
            self.delete_undecodable(ctx);
        }
        if ctx.lv.intersects(BitVector::AMPERSAND) {
            self.normalize_space_entities(ctx);
        }
        if ctx.lv.intersects(BitVector::MICRO_SIGN) {
            replace_all(ctx, 'µ', 'μ');
        }
        if ctx.lv.intersects(BitVector::NON_STANDARD_PUNCT) {
            replace_all(ctx, '\u{2024}', '.');
        }
        if ctx.lv.intersects(BitVector::MISCODE_ELEM) {
            self.repair_miscodings(ctx);
        }
        if ctx.lv.intersects(BitVector::DELETABLE_CONTROL) {
            self.repair_windows_1252(ctx);
            self.delete_where(ctx, BitVector::DELETABLE_CONTROL);
        }
        if ctx.lv.intersects(BitVector::NON_STANDARD_SPACE) {
            self.normalize_spaces(ctx);
        }
        if ctx.lv.intersects(BitVector::ZWSP) {
            self.tidy_zwsp(ctx);
        }
        if ctx.lv.intersects(BitVector::ZWNJ | BitVector::ZWJ) {
            self.tidy_joiners(ctx);
        }
        if ctx.lv.intersects(BitVector::VARIATION_SELECTOR) {
            self.tidy_variation_selectors(ctx);
        }
    }

    fn delete_at(&self, ctx: &mut LineCtx, pos: usize, n: usize) {
        for k in 0..n {
            let orig = ctx.map.map_start(pos + k);
            ctx.chart.record_deletion(orig);
        }
        ctx.chars.drain(pos..pos + n);
        ctx.map.delete(pos, n);
    }

    fn delete_where(&self, ctx: &mut LineCtx, mask: BitVector) {
        let mut i = ctx.chars.len();
        while i > 0 {
            i -= 1;
            if self.classifier.has(ctx.chars[i], mask) {
                self.delete_at(ctx, i, 1);
            }
        }
    }

    /// Deletes the residue of undecodable input bytes (U+FFFD) and reports
    /// the deleted positions, as required for invalid input encoding.
    fn delete_undecodable(&self, ctx: &mut LineCtx) {
        let mut positions: Vec<usize> = Vec::new();
        let mut i = ctx.chars.len();
        while i > 0 {
            i -= 1;
            if self.classifier.has(ctx.chars[i], BitVector::REPLACEMENT) {
                positions.push(ctx.map.map_start(i));
                self.delete_at(ctx, i, 1);
            }
        }
        if !positions.is_empty() {
            positions.reverse();
            log::warn!(
                "Line {}: deleted {} undecodable character(s) from position(s) {}",
                ctx.chart.line_id,
                positions.len(),
                positions
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }

    /// `&nbsp;` / `&#160;` / `&#xA0;` → U+00A0. The first character becomes
    /// the space, the rest are recorded as deletions, so offsets keep
    /// pointing into the true original line.
    fn normalize_space_entities(&self, ctx: &mut LineCtx) {
        const ENTITIES: &[&str] = &["&nbsp;", "&#160;", "&#xa0;"];
        let mut i = 0;
        while i < ctx.chars.len() {
            if ctx.chars[i] != '&' {
                i += 1;
                continue;
            }
            let tail: String = ctx.chars[i..ctx.chars.len().min(i + 6)]
                .iter()
                .collect::<String>()
                .to_lowercase();
            if let Some(entity) = ENTITIES.iter().find(|e| tail.starts_with(**e)) {
                ctx.chars[i] = '\u{00A0}';
                let orig = ctx.map.map_start(i);
                ctx.chart.record_space(orig);
                self.delete_at(ctx, i + 1, entity.len() - 1);
            }
            i += 1;
        }
        ctx.lv |= BitVector::NON_STANDARD_SPACE;
    }

    fn repair_miscodings(&self, ctx: &mut LineCtx) {
        let mut i = 0;
        while i + 1 < ctx.chars.len() {
            let pair: String = ctx.chars[i..i + 2].iter().collect();
            if let Some((_, repl)) = MISCODINGS.iter().find(|(bad, _)| **bad == pair) {
                ctx.chars[i] = *repl;
                self.delete_at(ctx, i + 1, 1);
            }
            i += 1;
        }
    }

    fn repair_windows_1252(&self, ctx: &mut LineCtx) {
        for ch in ctx.chars.iter_mut() {
            if let Some((_, repl)) = WINDOWS_1252.iter().find(|(bad, _)| bad == ch) {
                *ch = *repl;
            }
        }
    }

    fn normalize_spaces(&self, ctx: &mut LineCtx) {
        let len = ctx.chars.len();
        for i in 0..len {
            let ch = ctx.chars[i];
            if ch == '፡' {
                // Ethiopic wordspace: leave '፡፡' and '፡-' for later repair
                let prev = i.checked_sub(1).map(|p| ctx.chars[p]);
                let next = ctx.chars.get(i + 1).copied();
                if prev != Some('፡') && next != Some('፡') && next != Some('-') {
                    ctx.chars[i] = ' ';
                    let orig = ctx.map.map_start(i);
                    ctx.chart.record_space(orig);
                }
            } else if self.classifier.has(ch, BitVector::NON_STANDARD_SPACE) {
                ctx.chars[i] = ' ';
                let orig = ctx.map.map_start(i);
                ctx.chart.record_space(orig);
            }
        }
    }

    /// Zero width spaces: spurious next to whitespace, punctuation, line
    /// edges, and between letters of the same script; kept only on real
    /// mixed-script or letter-digit joints.
    fn tidy_zwsp(&self, ctx: &mut LineCtx) {
        let mut i = ctx.chars.len();
        while i > 0 {
            i -= 1;
            if ctx.chars[i] != '\u{200B}' {
                continue;
            }
            let prev = i.checked_sub(1).map(|p| ctx.chars[p]);
            let next = ctx.chars.get(i + 1).copied();
            let spurious = match (prev, next) {
                (None, _) | (_, None) => true,
                (_, Some('\u{200B}')) => true,
                (Some(p), Some(n)) => {
                    let edge = |c: char| c.is_whitespace() || (!c.is_alphanumeric() && c != '\u{200B}');
                    edge(p)
                        || edge(n)
                        || (p.is_alphabetic()
                            && n.is_alphabetic()
                            && (self.classifier.vector(p) & BitVector::ANY_SCRIPT)
                                == (self.classifier.vector(n) & BitVector::ANY_SCRIPT))
                }
            };
            if spurious {
                self.delete_at(ctx, i, 1);
            }
        }
    }

    /// Zero width joiner/non-joiner: collapse runs, drop mixed runs, strip
    /// at word edges; word-internal occurrences stay.
    fn tidy_joiners(&self, ctx: &mut LineCtx) {
        let is_joiner = |c: char| c == '\u{200C}' || c == '\u{200D}';
        let mut i = 0;
        while i < ctx.chars.len() {
            if !is_joiner(ctx.chars[i]) {
                i += 1;
                continue;
            }
            let run_start = i;
            let mut run_end = i;
            while run_end < ctx.chars.len() && is_joiner(ctx.chars[run_end]) {
                run_end += 1;
            }
            let mixed = ctx.chars[run_start..run_end]
                .iter()
                .any(|&c| c != ctx.chars[run_start]);
            let prev = run_start.checked_sub(1).map(|p| ctx.chars[p]);
            let next = ctx.chars.get(run_end).copied();
            let at_edge = |c: Option<char>| match c {
                None => true,
                Some(c) => c.is_whitespace() || !c.is_alphanumeric(),
            };
            if mixed || at_edge(prev) || at_edge(next) {
                self.delete_at(ctx, run_start, run_end - run_start);
            } else if run_end - run_start > 1 {
                self.delete_at(ctx, run_start + 1, run_end - run_start - 1);
                i = run_start + 1;
            } else {
                i = run_end;
            }
        }
    }

    /// Variation selectors survive only after emoji-range characters.
    fn tidy_variation_selectors(&self, ctx: &mut LineCtx) {
        let mut i = ctx.chars.len();
        while i > 0 {
            i -= 1;
            if self.classifier.has(ctx.chars[i], BitVector::VARIATION_SELECTOR) {
                let keep = i > 0 && (ctx.chars[i - 1] as u32) > 0x218F;
                if !keep {
                    self.delete_at(ctx, i, 1);
                }
            }
        }
    }
}

fn replace_all(ctx: &mut LineCtx, from: char, to: char) {
    for ch in ctx.chars.iter_mut() {
        if *ch == from {
            *ch = to;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::chart::Chart;
    use crate::chart::OffsetMap;
    use crate::charclass::CharClassifier;
    use crate::tokenizer::{LineCtx, Tokenizer};

    fn normalize(tok: &Tokenizer, line: &str) -> (String, Vec<usize>) {
        let mut chart = Chart::new(line, "1");
        let chars: Vec<char> = line.chars().collect();
        let len = chars.len();
        let classifier = CharClassifier::new();
        let mut ctx = LineCtx {
            lv: classifier.span_vector(&chars),
            chars,
            map: OffsetMap::new(len),
            chart: &mut chart,
            lang: None,
            depth: 0,
        };
        tok.normalize(&mut ctx);
        let s: String = ctx.chars.iter().collect();
        drop(ctx);
        (s, chart.deleted_offsets().to_vec())
    }

    fn tokenizer() -> Tokenizer {
        Tokenizer::new().expect("bundled data loads")
    }

    #[test]
    fn deletes_control_characters() {
        let tok = tokenizer();
        let (s, deleted) = normalize(&tok, "a\u{0001}b\u{00AD}c");
        assert_eq!(s, "abc");
        assert_eq!(deleted, vec![3, 1]);
    }

    #[test]
    fn deletes_undecodable_replacement_chars() {
        let tok = tokenizer();
        let (s, deleted) = normalize(&tok, "ab\u{FFFD}cd");
        assert_eq!(s, "abcd");
        assert_eq!(deleted, vec![2]);
    }

    #[test]
    fn normalizes_entities_and_spaces() {
        let tok = tokenizer();
        let (s, _) = normalize(&tok, "a&nbsp;b\u{3000}c");
        assert_eq!(s, "a b c");
    }

    #[test]
    fn repairs_windows_1252_strays() {
        let tok = tokenizer();
        let (s, _) = normalize(&tok, "caf\u{0092}");
        assert_eq!(s, "caf’");
    }

    #[test]
    fn strips_edge_joiners_keeps_internal() {
        let tok = tokenizer();
        let (s, _) = normalize(&tok, "\u{200C}कार\u{200C}खाना\u{200C}");
        assert_eq!(s, "कार\u{200C}खाना");
    }

    #[test]
    fn normalization_is_idempotent() {
        let tok = tokenizer();
        let samples = ["a\u{0001}b&nbsp;c\u{200B} d", "x\u{00A0}y", "héllo ፡ world"];
        for sample in samples {
            let (once, _) = normalize(&tok, sample);
            let (twice, _) = normalize(&tok, &once);
            assert_eq!(once, twice);
        }
    }
}
