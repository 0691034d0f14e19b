//! Number recognition: grouped numbers (Western and Indian style, comma or
//! period grouping), decimals, signed values, plain integers, and Ethiopic
//! numerals. A trailing period is never part of the number unless another
//! digit follows it.

use super::{FoundMatch, LineCtx, TokenPiece, Tokenizer};
use crate::chart::TokenType;
use crate::charclass::BitVector;

/// Languages whose scripts use comma-grouping exclusively; period-grouped
/// parses are disabled for them.
const NO_PERIOD_GROUPING: &[&str] = &["asm", "ben", "hin", "kan", "mal", "tam", "tel"];

const SIGNS: &[char] = &['-', '−', '–', '+'];
const HEBREW_PREFIXES: &[char] = &['כ', 'ב', 'ה', 'ל', 'ש', 'ו', 'מ'];

impl Tokenizer {
    pub(crate) fn find_number(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        if ctx.lv.intersects(BitVector::ETHIOPIC_NUMBER) {
            if let Some(found) = self.find_ethiopic_number(ctx, start, end) {
                return Some(found);
            }
        }
        if !ctx.lv.intersects(BitVector::DIGIT) {
            return None;
        }
        // grouped/decimal with comma grouping, then with period grouping,
        // then plain integers; each pass takes its leftmost match
        if let Some(m) = self.scan_grouped(ctx, start, end, ',', '.') {
            return Some(m);
        }
        let period_grouping_ok = !ctx
            .lang
            .map(|lc| NO_PERIOD_GROUPING.contains(&lc))
            .unwrap_or(false);
        if period_grouping_ok {
            if let Some(m) = self.scan_grouped(ctx, start, end, '.', ',') {
                return Some(m);
            }
        }
        self.scan_integer(ctx, start, end)
    }

    fn find_ethiopic_number(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        for i in start..end {
            if !('\u{1369}'..='\u{137C}').contains(&chars[i]) {
                continue;
            }
            let mut j = i;
            while j < end && ('\u{1369}'..='\u{137C}').contains(&chars[j]) {
                j += 1;
            }
            return Some(FoundMatch::single(TokenPiece::new(i, j, TokenType::Number)));
        }
        None
    }

    fn scan_grouped(
        &self,
        ctx: &LineCtx,
        start: usize,
        end: usize,
        group_sep: char,
        dec_sep: char,
    ) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        let mut i = start;
        while i < end {
            let (digits_at, has_sign) = match self.number_start(chars, start, i, end) {
                Some(v) => v,
                None => {
                    i += 1;
                    continue;
                }
            };
            if let Some(num_end) = parse_grouped(chars, digits_at, end, group_sep, dec_sep) {
                if self.trailing_ok(chars, num_end, end) {
                    let tok_start = self.adjust_sign(ctx, start, i, has_sign);
                    return Some(FoundMatch::single(TokenPiece::new(
                        tok_start,
                        num_end,
                        TokenType::Number,
                    )));
                }
            }
            i += 1;
        }
        None
    }

    fn scan_integer(&self, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        let chars = &ctx.chars;
        let mut i = start;
        while i < end {
            let (digits_at, has_sign) = match self.number_start(chars, start, i, end) {
                Some(v) => v,
                None => {
                    i += 1;
                    continue;
                }
            };
            // integers additionally refuse a letter directly before
            if i > start {
                let prev = chars[i - 1];
                if prev.is_alphabetic()
                    || self.classifier.has(prev, BitVector::COMBINING_MARK)
                {
                    i += 1;
                    continue;
                }
            }
            let mut j = digits_at;
            while j < end && chars[j].is_numeric() {
                j += 1;
            }
            // not followed by a separator-plus-digit (irregular grouping)
            let next = chars.get(j).copied();
            let next2 = chars.get(j + 1).copied();
            let blocked = match next {
                Some(c) if c.is_numeric() => true,
                Some('.') | Some(',') | Some('-') | Some('−') | Some('–') => {
                    next2.map(|c| c.is_numeric()).unwrap_or(false)
                }
                _ => false,
            };
            if blocked {
                i = j;
                continue;
            }
            let tok_start = self.adjust_sign(ctx, start, i, has_sign);
            return Some(FoundMatch::single(TokenPiece::new(tok_start, j, TokenType::Number)));
        }
        None
    }

    /// Checks the left boundary at `i` and returns the digit start position
    /// plus whether a sign was consumed.
    fn number_start(
        &self,
        chars: &[char],
        span_start: usize,
        i: usize,
        end: usize,
    ) -> Option<(usize, bool)> {
        let (digits_at, has_sign) = if SIGNS.contains(&chars[i]) {
            if i + 1 >= end || !chars[i + 1].is_numeric() {
                return None;
            }
            (i + 1, true)
        } else if chars[i].is_numeric() {
            (i, false)
        } else {
            return None;
        };
        if i > span_start {
            let prev = chars[i - 1];
            if prev.is_numeric()
                || SIGNS.contains(&prev)
                || prev == ','
                || HEBREW_PREFIXES.contains(&prev)
            {
                return None;
            }
            // decimal tail of a preceding number: "3.14" must not yield "14"
            if prev == '.' && i >= 2 && !chars[i - 2].is_alphabetic() {
                return None;
            }
            // percent or prime directly after a digit: "3%4" ranges
            if matches!(prev, '%' | '\'') && i >= 2 && chars[i - 2].is_numeric() {
                return None;
            }
        }
        Some((digits_at, has_sign))
    }

    /// A grouped number may not be followed by a separator-plus-digit.
    fn trailing_ok(&self, chars: &[char], num_end: usize, _end: usize) -> bool {
        let next = chars.get(num_end).copied();
        let next2 = chars.get(num_end + 1).copied();
        match next {
            Some(c) if c.is_numeric() => false,
            Some('.') | Some(',') => !next2.map(|c| c.is_numeric()).unwrap_or(false),
            _ => true,
        }
    }

    /// A sign after a letter, digit, percent or period is a range dash or
    /// operator, not part of the number: `3.5%-5.5%`, `4+5`. Judged against
    /// the full line, since the operand usually sits in an already-split
    /// neighboring span.
    fn adjust_sign(&self, ctx: &LineCtx, _span_start: usize, i: usize, has_sign: bool) -> usize {
        if !has_sign {
            return i;
        }
        if i > 0 {
            let prev = ctx.chars[i - 1];
            let prev2 = i.checked_sub(2).map(|p| ctx.chars[p]);
            let attached = prev.is_alphabetic()
                || prev.is_numeric()
                || prev == '.'
                || (matches!(prev, '%' | '\'')
                    && prev2.map(|c| c.is_numeric()).unwrap_or(false));
            if attached {
                return i + 1;
            }
        }
        i
    }
}

/// `12,345,678.90` (Western), `1,23,45,678.90` (Indian), `12345678.90`
/// (plain decimal) with the given separators. Returns the end position.
fn parse_grouped(
    chars: &[char],
    digits_at: usize,
    end: usize,
    group_sep: char,
    dec_sep: char,
) -> Option<usize> {
    let run = digit_run(chars, digits_at, end);
    let arabic_comma = group_sep == ',';
    let is_group_sep =
        |c: char| c == group_sep || (arabic_comma && c == '\u{060C}');

    // collect separator groups
    let mut j = digits_at + run;
    let mut groups: Vec<usize> = Vec::new();
    loop {
        let Some(&sep) = chars.get(j) else { break };
        if !is_group_sep(sep) {
            break;
        }
        let glen = digit_run(chars, j + 1, end);
        if glen == 0 {
            break;
        }
        // a group is only a group if nothing digit-like follows it directly
        groups.push(glen);
        j += 1 + glen;
    }

    let grouped_end = if !groups.is_empty() {
        let western = run <= 3 && groups.iter().all(|&g| g == 3);
        let indian = run <= 2
            && groups.len() >= 1
            && groups[..groups.len() - 1].iter().all(|&g| g == 2)
            && *groups.last().unwrap() == 3;
        if western || indian {
            Some(j)
        } else {
            None
        }
    } else {
        None
    };

    match grouped_end {
        Some(mut e) => {
            // optional decimal part
            if chars.get(e) == Some(&dec_sep) {
                let dlen = digit_run(chars, e + 1, end);
                if dlen > 0 {
                    e += 1 + dlen;
                }
            }
            Some(e)
        }
        None => {
            // plain decimal: digits sep digits
            let e = digits_at + run;
            if chars.get(e) == Some(&dec_sep) {
                let dlen = digit_run(chars, e + 1, end);
                if dlen > 0 {
                    return Some(e + 1 + dlen);
                }
            }
            None
        }
    }
}

fn digit_run(chars: &[char], i: usize, end: usize) -> usize {
    let mut j = i;
    while j < end && chars[j].is_numeric() {
        j += 1;
    }
    j - i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_shapes() {
        let chars: Vec<char> = "12,345,678.90".chars().collect();
        assert_eq!(parse_grouped(&chars, 0, chars.len(), ',', '.'), Some(13));

        let chars: Vec<char> = "1,23,45,678.90".chars().collect();
        assert_eq!(parse_grouped(&chars, 0, chars.len(), ',', '.'), Some(14));

        let chars: Vec<char> = "12345678.90".chars().collect();
        assert_eq!(parse_grouped(&chars, 0, chars.len(), ',', '.'), Some(11));

        // irregular grouping is not a number
        let chars: Vec<char> = "12,34".chars().collect();
        assert_eq!(parse_grouped(&chars, 0, chars.len(), ',', '.'), None);
    }

    #[test]
    fn period_grouping() {
        let chars: Vec<char> = "12.345.678,90".chars().collect();
        assert_eq!(parse_grouped(&chars, 0, chars.len(), '.', ','), Some(13));
    }

    #[test]
    fn plain_integer_has_no_decimal() {
        let chars: Vec<char> = "15000".chars().collect();
        assert_eq!(parse_grouped(&chars, 0, chars.len(), ',', '.'), None);
    }
}
