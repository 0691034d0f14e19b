//! The processing loops behind `utokenize` and `detokenize`.

use crate::args::{DetokenizeArgs, TokenizeArgs};
use crate::io::{open_input, open_output};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::io::{BufRead, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use unitok_core::{to_double_colon, to_json, AnnotationFormat, Config, Detokenizer, Tokenizer};

/// Initializes env_logger from the `-v` count.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
}

fn build_config(
    lang_code: Option<&str>,
    data_dir: Option<&std::path::Path>,
    first_token_is_line_id: bool,
    simple: bool,
    annotation_format: AnnotationFormat,
    chart: bool,
    verbose: bool,
) -> Result<Config> {
    let mut builder = Config::builder()
        .first_token_is_line_id(first_token_is_line_id)
        .simple(simple)
        .annotation_format(annotation_format)
        .chart(chart)
        .verbose(verbose);
    if let Some(code) = lang_code {
        builder = builder.language(code);
    }
    if let Some(dir) = data_dir {
        builder = builder.data_dir(dir);
    }
    builder.build().context("Invalid configuration")
}

pub fn run_tokenize(args: &TokenizeArgs) -> Result<()> {
    init_logging(args.verbose);
    let config = build_config(
        args.lang_code.as_deref(),
        args.data_dir.as_deref(),
        args.first_token_is_line_id,
        args.simple,
        args.annotation_format.into(),
        args.chart || args.annotation.is_some(),
        args.verbose > 0,
    )?;
    let simple = args.simple;
    let tokenizer = Tokenizer::with_config(config).context("Failed to load resources")?;

    // option conflicts are fatal before any processing starts
    let mut annotation_out = args
        .annotation
        .as_deref()
        .map(|p| open_output(Some(p)))
        .transpose()
        .context("Annotation output is not writable")?;

    let input = open_input(args.input.as_deref())?;
    let mut output = open_output(args.output.as_deref())?;
    let start = Instant::now();
    let mut n_lines = 0usize;

    if args.parallel && annotation_out.is_none() {
        // lines are independent; reassemble in input order by index
        let lines: Vec<String> = input.lines().collect::<std::io::Result<_>>()?;
        n_lines = lines.len();
        let surfaces: Vec<String> = lines
            .par_iter()
            .enumerate()
            .map(|(i, line)| tokenize_one(&tokenizer, line, &(i + 1).to_string(), simple))
            .collect();
        for surface in surfaces {
            writeln!(output, "{surface}")?;
        }
    } else {
        let mut json_lines: Vec<serde_json::Value> = Vec::new();
        for (i, line) in input.lines().enumerate() {
            let line = line?;
            n_lines = i + 1;
            let line_id = line_id_for(&line, args.first_token_is_line_id, n_lines);
            let result = catch_unwind(AssertUnwindSafe(|| {
                let chart = tokenizer.tokenize_line(&line, &line_id);
                let surface = chart.surface(simple, tokenizer.attach_tag());
                let annotation = annotation_out.as_ref().map(|_| match args.annotation_format {
                    crate::args::AnnotationFormatArg::Json => AnnotationText::Json(to_json(&chart)),
                    crate::args::AnnotationFormatArg::DoubleColon => {
                        AnnotationText::Text(to_double_colon(&chart))
                    }
                });
                (surface, annotation)
            }));
            match result {
                Ok((surface, annotation)) => {
                    writeln!(output, "{surface}")?;
                    match annotation {
                        Some(AnnotationText::Json(v)) => json_lines.push(v),
                        Some(AnnotationText::Text(t)) => {
                            annotation_out.as_mut().unwrap().write_all(t.as_bytes())?
                        }
                        None => {}
                    }
                }
                Err(_) => {
                    // a single bad line never kills the batch
                    eprintln!("Warning: tokenization failed in line {n_lines}; emitted verbatim");
                    writeln!(output, "{line}")?;
                }
            }
        }
        if let Some(out) = annotation_out.as_mut() {
            if matches!(args.annotation_format, crate::args::AnnotationFormatArg::Json) {
                serde_json::to_writer(&mut *out, &json_lines)?;
                writeln!(out)?;
            }
            out.flush()?;
        }
    }
    output.flush()?;
    let elapsed = start.elapsed();
    if elapsed.as_secs() >= 10 || args.verbose > 0 {
        log::info!("Processed {n_lines} lines in {elapsed:.2?}");
    }
    Ok(())
}

enum AnnotationText {
    Json(serde_json::Value),
    Text(String),
}

fn tokenize_one(tokenizer: &Tokenizer, line: &str, line_id: &str, simple: bool) -> String {
    catch_unwind(AssertUnwindSafe(|| {
        tokenizer
            .tokenize_line(line, line_id)
            .surface(simple, tokenizer.attach_tag())
    }))
    .unwrap_or_else(|_| {
        eprintln!("Warning: tokenization failed in line {line_id}; emitted verbatim");
        line.to_string()
    })
}

/// In line-id mode the annotation line id is the line's own first token.
fn line_id_for(line: &str, first_token_is_line_id: bool, line_number: usize) -> String {
    if first_token_is_line_id {
        line.split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string()
    } else {
        line_number.to_string()
    }
}

pub fn run_detokenize(args: &DetokenizeArgs) -> Result<()> {
    init_logging(args.verbose);
    let config = build_config(
        args.lang_code.as_deref(),
        args.data_dir.as_deref(),
        args.first_token_is_line_id,
        false,
        AnnotationFormat::default(),
        false,
        args.verbose > 0,
    )?;
    let detokenizer = Detokenizer::with_config(config).context("Failed to load resources")?;
    let input = open_input(args.input.as_deref())?;
    let mut output = open_output(args.output.as_deref())?;
    for (i, line) in input.lines().enumerate() {
        let line = line?;
        let result = catch_unwind(AssertUnwindSafe(|| detokenizer.detokenize_string(&line)));
        match result {
            Ok(joined) => writeln!(output, "{joined}")?,
            Err(_) => {
                eprintln!("Warning: detokenization failed in line {}; emitted verbatim", i + 1);
                writeln!(output, "{line}")?;
            }
        }
    }
    output.flush()?;
    Ok(())
}
