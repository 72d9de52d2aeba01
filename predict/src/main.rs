use std::error::Error;
use std::io::{prelude::*, stdin, stdout, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use dksplit::{Splitter, DEFAULT_BATCH_SIZE, MAX_LEN};

#[derive(Parser, Debug)]
#[command(name = "predict", about = "A program to split concatenated words.")]
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

    /// Number of input lines read before splitting
    #[arg(long, default_value = "10000")]
    block_size: usize,

    /// Inputs are truncated to this number of characters
    #[arg(long, default_value_t = MAX_LEN)]
    max_len: usize,

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

fn run<F>(split_block: F, block_size: usize) -> Result<(), Box<dyn Error>>
where
    F: Fn(&[String]) -> dksplit::errors::Result<Vec<Vec<String>>>,
{
    let block_size = std::cmp::max(block_size, 1);
    let mut out = BufWriter::new(stdout().lock());
    let mut n_lines = 0;
    let mut block = Vec::with_capacity(block_size);
    let mut lines = stdin().lock().lines();

    log::info!("Start splitting");
    let start = Instant::now();
    loop {
        block.clear();
        for line in lines.by_ref().take(block_size) {
            block.push(line?);
        }
        if block.is_empty() {
            break;
        }
        for words in split_block(&block)? {
            writeln!(out, "{}", words.join(" "))?;
        }
        n_lines += block.len();
    }
    out.flush()?;
    let duration = start.elapsed();

    eprintln!("Elapsed: {} [sec]", duration.as_secs_f64());
    eprintln!(
        "Speed: {} [lines/sec]",
        n_lines as f64 / duration.as_secs_f64()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    log::info!("Loading model directory {}", args.model_dir.display());
    let splitter = Splitter::from_dir(&args.model_dir)?
        .max_len(args.max_len)
        .batch_size(args.batch_size);

    if args.n_threads == 0 {
        run(|block| splitter.split_batch(block, 0), args.block_size)
    } else {
        let splitter = splitter.multithreading(args.n_threads)?;
        run(|block| splitter.split_batch(block, 0), args.block_size)
    }
}
