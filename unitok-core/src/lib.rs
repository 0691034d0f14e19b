//! # unitok-core
//!
//! Core engine of the `unitok` universal multilingual tokenizer: a pipeline
//! of ordered step recognizers over one input line, a span-indexed chart of
//! token decisions, a data-file driven resource store, and the companion
//! detokenizer that inverts the tokenization via attach-tag markup.
//!
//! ```no_run
//! use unitok_core::{Config, Tokenizer};
//!
//! let tok = Tokenizer::with_language("eng")?;
//! assert_eq!(
//!     tok.tokenize_string("Mr. Miller can't pay $15,000.00."),
//!     "Mr. Miller can n't pay $ 15,000.00 ."
//! );
//! # Ok::<(), unitok_core::Error>(())
//! ```
//!
//! Lines are independent units of work: a [`Tokenizer`] is immutable after
//! construction and can be shared across threads by reference.

mod chart;
mod charclass;
mod config;
mod detok;
mod emit;
mod error;
mod markup;
mod resource;
mod tokenizer;

pub use chart::{Chart, OffsetMap, Token, TokenType};
pub use charclass::{BitVector, CharClassifier};
pub use config::{AnnotationFormat, Config, ConfigBuilder};
pub use detok::Detokenizer;
pub use emit::{to_double_colon, to_json, LineAnnotation, TokenAnnotation};
pub use error::{Error, Result};
pub use resource::{DetokResource, Reliability, ResourceStore, RuleEntry, RuleKind, Side};
pub use tokenizer::Tokenizer;
