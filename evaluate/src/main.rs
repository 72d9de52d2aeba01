use std::error::Error;
use std::io::{prelude::*, stdin};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use dksplit::{Sentence, Splitter, Tag, DEFAULT_BATCH_SIZE, MAX_LEN};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EvaluationMetric {
    /// Evaluates each character boundary.
    Char,

    /// Evaluates each word using Nagata's method.
    Word,

    /// Evaluates whole inputs by exact match.
    Line,
}

#[derive(Parser, Debug)]
#[command(
    name = "evaluate",
    about = "A program to evaluate the accuracy of dksplit. Each input line contains reference words separated by whitespaces."
)]
struct Args {
    /// The model directory containing the ONNX graph and the transition scores
    #[arg(long)]
    model_dir: PathBuf,

    /// Number of threads. 0 decodes on the main thread.
    #[arg(long, default_value = "0")]
    n_threads: usize,

    /// Maximum number of inputs scored at once
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Inputs are truncated to this number of characters
    #[arg(long, default_value_t = MAX_LEN)]
    max_len: usize,

    /// Evaluation metric
    #[arg(long, value_enum, default_value = "char")]
    metric: EvaluationMetric,

    /// Prints each input whose prediction differs from the reference
    #[arg(long)]
    show_errors: bool,

    /// Increases logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

/// Boundaries between characters. The tag of the first character is not a boundary.
fn inner_boundaries(tags: &[Tag]) -> Vec<Tag> {
    tags.iter().skip(1).copied().collect()
}

fn eval_char(results: &[(Vec<Tag>, Vec<Tag>)]) {
    let mut n_tp = 0;
    let mut n_tn = 0;
    let mut n_fp = 0;
    let mut n_fn = 0;
    for (rs, hs) in results {
        for (r, h) in rs.iter().zip(hs) {
            if r == h {
                if *h == Tag::Boundary {
                    n_tp += 1;
                } else {
                    n_tn += 1;
                }
            } else if *h == Tag::Boundary {
                n_fp += 1;
            } else {
                n_fn += 1;
            }
        }
    }
    let precision = n_tp as f64 / (n_tp + n_fp) as f64;
    let recall = n_tp as f64 / (n_tp + n_fn) as f64;
    let f1 = 2. * precision * recall / (precision + recall);
    println!("Precision: {}", precision);
    println!("Recall: {}", recall);
    println!("F1: {}", f1);
    println!("TP: {}, TN: {}, FP: {}, FN: {}", n_tp, n_tn, n_fp, n_fn);
}

fn eval_word(results: &[(Vec<Tag>, Vec<Tag>)]) {
    // Reference:
    // Masaaki Nagata. 1994. A stochastic Japanese morphological analyzer using a forward-DP
    // backward-A* n-best search algorithm. In COLING 1994 Volume 1: The 15th International
    // Conference on Computational Linguistics.
    let mut n_sys = 0;
    let mut n_ref = 0;
    let mut n_cor = 0;
    for (rs, hs) in results {
        let mut matched = true;
        for (r, h) in rs.iter().zip(hs) {
            if r == h {
                if *h == Tag::Boundary {
                    if matched {
                        n_cor += 1;
                    }
                    matched = true;
                    n_ref += 1;
                    n_sys += 1;
                }
            } else {
                if *h == Tag::Boundary {
                    n_sys += 1;
                } else {
                    n_ref += 1;
                }
                matched = false;
            }
        }
        if matched {
            n_cor += 1;
        }
        n_sys += 1;
        n_ref += 1;
    }
    let precision = n_cor as f64 / n_sys as f64;
    let recall = n_cor as f64 / n_ref as f64;
    let f1 = 2. * precision * recall / (precision + recall);
    println!("Precision: {}", precision);
    println!("Recall: {}", recall);
    println!("F1: {}", f1);
}

fn eval_line(results: &[(Vec<Tag>, Vec<Tag>)]) {
    let n_cor = results.iter().filter(|(rs, hs)| rs == hs).count();
    println!(
        "Accuracy: {} ({} / {})",
        n_cor as f64 / results.len() as f64,
        n_cor,
        results.len()
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    log::info!("Loading model directory {}", args.model_dir.display());
    let splitter = Splitter::from_dir(&args.model_dir)?
        .max_len(args.max_len)
        .batch_size(args.batch_size);

    let mut sentences = vec![];
    let mut references = vec![];
    for line in stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (s, tags) = Sentence::from_tokenized(&line, args.max_len)?;
        sentences.push(s);
        references.push(tags);
    }
    let inputs: Vec<&str> = sentences.iter().map(|s| s.as_str()).collect();

    log::info!("Start splitting {} inputs", inputs.len());
    let predictions = if args.n_threads == 0 {
        splitter.split_batch(&inputs, 0)?
    } else {
        splitter
            .multithreading(args.n_threads)?
            .split_batch(&inputs, 0)?
    };

    let mut results = Vec::with_capacity(inputs.len());
    for ((s, reference), words) in sentences.iter().zip(references).zip(predictions) {
        let (_, hypothesis) = Sentence::from_tokenized(words.join(" "), args.max_len)?;
        if args.show_errors && reference != hypothesis {
            eprintln!(
                "{}\t{}\t{}",
                s.as_str(),
                s.to_tokenized_string(&reference)?,
                words.join(" ")
            );
        }
        results.push((inner_boundaries(&reference), inner_boundaries(&hypothesis)));
    }

    match args.metric {
        EvaluationMetric::Char => eval_char(&results),
        EvaluationMetric::Word => eval_word(&results),
        EvaluationMetric::Line => eval_line(&results),
    }

    Ok(())
}
