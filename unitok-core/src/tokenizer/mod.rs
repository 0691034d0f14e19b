//! The tokenization pipeline: an ordered chain of step recognizers, each of
//! which either finds a token in the current span and recurses on the
//! residues, or delegates to the next step. The final whitespace step always
//! consumes whatever is left.

mod finders;
mod normalize;
mod number;
mod resource_steps;

use crate::chart::{Chart, OffsetMap, Token, TokenType};
use crate::charclass::{BitVector, CharClassifier};
use crate::config::Config;
use crate::error::Result;
use crate::markup::MarkupDecider;
use crate::resource::{DetokResource, ResourceStore};
use smallvec::SmallVec;
use std::path::PathBuf;

/// Recursion bound: beyond this depth the rest of the span falls through to
/// the whitespace step, so pathological inputs degrade instead of overflow.
const MAX_RECURSION_DEPTH: usize = 250;

/// The ordered tokenization steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Xml,
    Url,
    Email,
    HashtagHandle,
    Filename,
    Lexical,
    Abbrev,
    Number,
    Contraction,
    Repair,
    Misspelling,
    MtPunct,
    PunctSplit,
    Symbol,
    Whitespace,
}

const STEPS: &[Step] = &[
    Step::Xml,
    Step::Url,
    Step::Email,
    Step::HashtagHandle,
    Step::Filename,
    Step::Lexical,
    Step::Abbrev,
    Step::Number,
    Step::Contraction,
    Step::Repair,
    Step::Misspelling,
    Step::MtPunct,
    Step::PunctSplit,
    Step::Symbol,
    Step::Whitespace,
];

/// One token piece produced by a step. `surface` is set when the step
/// normalized the text (repair, decontraction); otherwise the current-line
/// slice is the surface.
#[derive(Debug, Clone)]
pub(crate) struct TokenPiece {
    pub start: usize,
    pub end: usize,
    pub surface: Option<String>,
    pub ttype: TokenType,
    pub sem_class: Option<String>,
}

impl TokenPiece {
    pub fn new(start: usize, end: usize, ttype: TokenType) -> Self {
        Self {
            start,
            end,
            surface: None,
            ttype,
            sem_class: None,
        }
    }
}

/// A successful step match: one or more non-overlapping pieces in span order
#[derive(Debug)]
pub(crate) struct FoundMatch {
    pub pieces: SmallVec<[TokenPiece; 2]>,
    /// The step swept the span left-to-right, so the left residue needs only
    /// the remaining steps
    pub left_done: bool,
}

impl FoundMatch {
    pub fn single(piece: TokenPiece) -> Self {
        let mut pieces = SmallVec::new();
        pieces.push(piece);
        Self {
            pieces,
            left_done: false,
        }
    }
}

/// Per-line working state
pub(crate) struct LineCtx<'a> {
    /// Current working line (after normalization mutations)
    pub chars: Vec<char>,
    /// OR-aggregate feature vector over the current line
    pub lv: BitVector,
    /// Maps current positions to original offsets
    pub map: OffsetMap,
    pub chart: &'a mut Chart,
    pub lang: Option<&'a str>,
    pub depth: usize,
}

impl LineCtx<'_> {
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }
}

/// The universal tokenizer. Immutable once constructed; safely shareable
/// across threads by reference.
pub struct Tokenizer {
    pub(crate) classifier: CharClassifier,
    pub(crate) store: ResourceStore,
    pub(crate) detok: DetokResource,
    pub(crate) markup: MarkupDecider,
    pub(crate) step_regexes: resource_steps::StepRegexes,
    config: Config,
}

impl Tokenizer {
    /// Create a tokenizer with default (universal) configuration
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create a tokenizer for a specific language code
    pub fn with_language(code: impl Into<String>) -> Result<Self> {
        Self::with_config(Config::builder().language(code).build()?)
    }

    /// Create a tokenizer with custom configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let data_dir = config
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir);
        let store = ResourceStore::load(&data_dir, &config.lang_codes)?;
        let detok = DetokResource::load(&data_dir, &config.lang_codes)?;
        let mut classifier = CharClassifier::new();
        classifier.mark_attach_tag(detok.attach_tag);
        let markup = MarkupDecider::new();
        Ok(Self {
            classifier,
            store,
            detok,
            markup,
            step_regexes: resource_steps::StepRegexes::new(),
            config,
        })
    }

    /// The crate's bundled resource directory
    pub fn default_data_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The attach tag configured in the detokenization resources
    pub fn attach_tag(&self) -> char {
        self.detok.attach_tag
    }

    /// Tokenize one line and return the surface token stream
    pub fn tokenize_string(&self, line: &str) -> String {
        self.tokenize_line(line, "1")
            .surface(self.config.simple, self.detok.attach_tag)
    }

    /// Tokenize one line and return the full chart
    pub fn tokenize_with_chart(&self, line: &str) -> Chart {
        self.tokenize_line(line, "1")
    }

    /// Tokenize one line with an explicit line id (used in annotations)
    pub fn tokenize_line(&self, line: &str, line_id: &str) -> Chart {
        let mut chart = Chart::new(line, line_id);
        let chars: Vec<char> = line.chars().collect();
        let len = chars.len();
        let lang = self.config.lang_code();
        let mut ctx = LineCtx {
            lv: self.classifier.span_vector(&chars),
            chars,
            map: OffsetMap::new(len),
            chart: &mut chart,
            lang,
            depth: 0,
        };
        self.normalize(&mut ctx);
        ctx.lv = self.classifier.span_vector(&ctx.chars);

        let mut start = 0;
        if self.config.first_token_is_line_id {
            start = self.split_line_id(&mut ctx);
        }
        let len = ctx.chars.len();
        self.run_span(&mut ctx, start, len, 0);
        drop(ctx);

        if !chart.finalize() {
            log::warn!("Chart for line {line_id} violates span ordering; output kept as-is");
        }
        if self.config.verbose && self.config.chart {
            log::info!(
                "Chart {line_id}: {}",
                chart
                    .tokens()
                    .iter()
                    .map(|t| format!("{}-{}:{} {}", t.start, t.end, t.ttype, t.surface))
                    .collect::<Vec<_>>()
                    .join(" ")
            );
        }
        chart
    }

    /// Emits the first whitespace-delimited token as a LINE-ID and returns
    /// the position where regular tokenization resumes.
    fn split_line_id(&self, ctx: &mut LineCtx) -> usize {
        let len = ctx.chars.len();
        let mut i = 0;
        while i < len && ctx.chars[i].is_whitespace() {
            i += 1;
        }
        let id_start = i;
        while i < len && !ctx.chars[i].is_whitespace() {
            i += 1;
        }
        if i > id_start {
            let piece = TokenPiece::new(id_start, i, TokenType::LineId);
            self.emit_piece(ctx, &piece, id_start, i);
        }
        i
    }

    /// The control skeleton: try steps from `from` onward on `[start, end)`.
    pub(crate) fn run_span(&self, ctx: &mut LineCtx, start: usize, end: usize, from: usize) {
        if start >= end {
            return;
        }
        ctx.depth += 1;
        if ctx.depth > MAX_RECURSION_DEPTH {
            log::warn!(
                "Exceeded tokenization recursion depth {MAX_RECURSION_DEPTH} in line {}; \
                 falling through to whitespace splitting",
                ctx.chart.line_id
            );
            self.whitespace_step(ctx, start, end);
            ctx.depth -= 1;
            return;
        }
        for (k, &step) in STEPS.iter().enumerate().skip(from) {
            if step == Step::Whitespace {
                self.whitespace_step(ctx, start, end);
                break;
            }
            if !self.step_guard(step, ctx.lv) {
                continue;
            }
            if let Some(found) = self.step_find(step, ctx, start, end) {
                self.emit_found(ctx, start, end, k, found);
                break;
            }
        }
        ctx.depth -= 1;
    }

    /// Recurse on residues and emit the matched pieces in span order.
    fn emit_found(&self, ctx: &mut LineCtx, start: usize, end: usize, k: usize, found: FoundMatch) {
        debug_assert!(!found.pieces.is_empty());
        let left_from = if found.left_done { k + 1 } else { 0 };
        let mut pos = start;
        for (i, piece) in found.pieces.iter().enumerate() {
            debug_assert!(pos <= piece.start && piece.start < piece.end && piece.end <= end);
            if piece.start > pos {
                let from = if i == 0 { left_from } else { 0 };
                self.run_span(ctx, pos, piece.start, from);
            }
            self.emit_piece(ctx, piece, start, end);
            pos = piece.end;
        }
        if pos < end {
            self.run_span(ctx, pos, end, 0);
        }
    }

    /// Creates the token for one piece, deciding `@`-markup from the span
    /// the step actually saw.
    pub(crate) fn emit_piece(
        &self,
        ctx: &mut LineCtx,
        piece: &TokenPiece,
        span_start: usize,
        span_end: usize,
    ) {
        let orig_surface = ctx.slice(piece.start, piece.end);
        let surface = piece.surface.clone().unwrap_or_else(|| orig_surface.clone());
        let mut token = Token::new(
            surface,
            ctx.map.map_start(piece.start),
            ctx.map.map_end(piece.end),
            piece.ttype,
        );
        token.orig_surface = orig_surface;
        token.sem_class = piece.sem_class.clone();
        if self.detok.is_markup_token(&token.surface) {
            let span_left: String = ctx.chars[span_start..piece.start].iter().collect();
            let span_right: String = ctx.chars[piece.end..span_end].iter().collect();
            let line_left: String = ctx.chars[..piece.start].iter().collect();
            let line_right: String = ctx.chars[piece.end..].iter().collect();
            let (ml, mr) = self.markup.decide(
                &self.detok,
                &token.surface,
                &span_left,
                &span_right,
                &line_left,
                &line_right,
                ctx.lang,
            );
            token.markup_left = ml;
            token.markup_right = mr;
        }
        ctx.chart.push(token);
    }

    fn step_guard(&self, step: Step, lv: BitVector) -> bool {
        match step {
            Step::Xml => lv.intersects(BitVector::LESS_THAN | BitVector::LEFT_SQUARE_BRACKET),
            Step::Url | Step::Filename => true, // dot-plus-letters checked inside
            Step::Email => lv.intersects(BitVector::AT_SIGN),
            Step::HashtagHandle => {
                lv.intersects(BitVector::NUMBER_SIGN | BitVector::AT_SIGN)
            }
            Step::Lexical | Step::Abbrev | Step::Repair | Step::Misspelling => true,
            Step::Number => {
                lv.intersects(BitVector::DIGIT | BitVector::ETHIOPIC_NUMBER)
            }
            Step::Contraction => true,
            Step::MtPunct => lv.intersects(BitVector::ATTACH_TAG | BitVector::DASH),
            Step::PunctSplit => true,
            Step::Symbol => lv.intersects(BitVector::MISC_SYMBOL),
            Step::Whitespace => true,
        }
    }

    fn step_find(&self, step: Step, ctx: &LineCtx, start: usize, end: usize) -> Option<FoundMatch> {
        match step {
            Step::Xml => self.find_xml(ctx, start, end),
            Step::Url => self.find_url(ctx, start, end),
            Step::Email => self.find_email(ctx, start, end),
            Step::HashtagHandle => self.find_hashtag_or_handle(ctx, start, end),
            Step::Filename => self.find_filename(ctx, start, end),
            Step::Lexical => self.find_lexical(ctx, start, end),
            Step::Abbrev => self.find_abbrev(ctx, start, end),
            Step::Number => self.find_number(ctx, start, end),
            Step::Contraction => self.find_contraction(ctx, start, end),
            Step::Repair => self.find_repair(ctx, start, end),
            Step::Misspelling => self.find_misspelling(ctx, start, end),
            Step::MtPunct => self.find_mt_punct(ctx, start, end),
            Step::PunctSplit => self.find_punct_split(ctx, start, end),
            Step::Symbol => self.find_symbol_group(ctx, start, end),
            Step::Whitespace => None,
        }
    }

    /// Final fallthrough: split the span on Unicode whitespace.
    fn whitespace_step(&self, ctx: &mut LineCtx, start: usize, end: usize) {
        let mut i = start;
        while i < end {
            if ctx.chars[i].is_whitespace() {
                i += 1;
                continue;
            }
            let tok_start = i;
            while i < end && !ctx.chars[i].is_whitespace() {
                i += 1;
            }
            let ttype = self.basic_token_type(ctx, tok_start, i);
            let piece = TokenPiece::new(tok_start, i, ttype);
            self.emit_piece(ctx, &piece, start, end);
        }
    }

    /// Content-class typing for whitespace-step tokens.
    fn basic_token_type(&self, ctx: &LineCtx, start: usize, end: usize) -> TokenType {
        let chars = &ctx.chars[start..end];
        if chars.iter().any(|c| c.is_alphabetic()) {
            // an interior piece: directly follows a dash or attach-tag split
            let interior = start > 0
                && self.classifier.has(
                    ctx.chars[start - 1],
                    BitVector::DASH | BitVector::ATTACH_TAG,
                );
            if interior {
                return TokenType::WordI;
            }
            return TokenType::WordB;
        }
        if chars.iter().any(|c| c.is_numeric()) {
            return TokenType::NumberB;
        }
        if chars.iter().any(|&c| {
            self.classifier
                .has(c, BitVector::MISC_SYMBOL | BitVector::CURRENCY)
        }) {
            return TokenType::SymbolB;
        }
        if chars
            .iter()
            .any(|&c| c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace()))
        {
            return TokenType::PunctB;
        }
        TokenType::Misc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_last_step() {
        assert_eq!(*STEPS.last().unwrap(), Step::Whitespace);
    }

    #[test]
    fn steps_follow_spec_order() {
        let xml = STEPS.iter().position(|&s| s == Step::Xml).unwrap();
        let url = STEPS.iter().position(|&s| s == Step::Url).unwrap();
        let lexical = STEPS.iter().position(|&s| s == Step::Lexical).unwrap();
        let abbrev = STEPS.iter().position(|&s| s == Step::Abbrev).unwrap();
        let number = STEPS.iter().position(|&s| s == Step::Number).unwrap();
        let contraction = STEPS.iter().position(|&s| s == Step::Contraction).unwrap();
        let punct = STEPS.iter().position(|&s| s == Step::PunctSplit).unwrap();
        assert!(xml < url && url < lexical && lexical < abbrev);
        assert!(abbrev < number && number < contraction && contraction < punct);
    }
}
