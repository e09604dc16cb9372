use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use utrie::{Builder, Statistics};

#[derive(Parser, Debug)]
#[clap(name = "write", about = "A program to write a trie from a UCD property file.")]
struct Args {
    #[clap(short = 'i', long)]
    input_path: PathBuf,

    #[clap(short = 'o', long)]
    trie_path: PathBuf,

    /// Value of code points not listed in the input.
    #[clap(long, default_value = "XX")]
    initial: String,

    /// Value of out-of-range inputs.
    #[clap(long, default_value = "XX")]
    error: String,

    /// Writes base64 text instead of binary.
    #[clap(long)]
    base64: bool,
}

/// Parses lines of the form `XXXX[..YYYY] ; Value # comment`.
fn load_properties(path: &PathBuf) -> Result<Vec<(u32, u32, String)>, Box<dyn Error>> {
    let mut records = vec![];
    for (i, line) in BufReader::new(File::open(path)?).lines().enumerate() {
        let line = line?;
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(';').map(str::trim);
        let range = fields.next().unwrap_or("");
        let value = fields
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| format!("line {}: missing value", i + 1))?;
        let (start, end) = match range.split_once("..") {
            Some((start, end)) => (start, end),
            None => (range, range),
        };
        records.push((
            u32::from_str_radix(start, 16)?,
            u32::from_str_radix(end, 16)?,
            value.to_string(),
        ));
    }
    Ok(records)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let records = load_properties(&args.input_path)?;
    info!(path = %args.input_path.display(), records = records.len(), "loaded properties");

    let mut builder = Builder::new(args.initial.as_str(), args.error.as_str());
    for (start, end, value) in &records {
        builder.set_range(*start, *end, value, true)?;
    }
    let trie = builder.freeze()?;
    info!(
        high_start = format_args!("{:#x}", trie.high_start()),
        values = trie.values().len(),
        heap_bytes = trie.heap_bytes(),
        "built trie"
    );

    let bytes = if args.base64 {
        trie.to_base64()?.into_bytes()
    } else {
        trie.serialize_to_vec()?
    };
    let mut writer = File::create(&args.trie_path)?;
    writer.write_all(&bytes)?;
    info!(path = %args.trie_path.display(), bytes = bytes.len(), "wrote trie");

    Ok(())
}
