use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use tracing::debug;
use utrie::{Trie, Value};

#[derive(Parser, Debug)]
#[clap(name = "lookup", about = "A program to look up code points in a trie.")]
struct Args {
    #[clap(short = 'i', long)]
    trie_path: PathBuf,

    /// Reads base64 text instead of binary.
    #[clap(long)]
    base64: bool,

    /// Looks up every character of this text.
    #[clap(short = 't', long)]
    text: Option<String>,

    /// Code points in hex, with or without a `U+` prefix.
    code_points: Vec<String>,
}

fn parse_code_point(s: &str) -> Result<u32, Box<dyn Error>> {
    let hex = s
        .strip_prefix("U+")
        .or_else(|| s.strip_prefix("u+"))
        .unwrap_or(s);
    Ok(u32::from_str_radix(hex, 16)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut bytes = vec![];
    {
        let mut reader = File::open(&args.trie_path)?;
        reader.read_to_end(&mut bytes)?;
    }
    let trie = if args.base64 {
        Trie::from_base64(std::str::from_utf8(&bytes)?)?
    } else {
        Trie::deserialize_from_slice(&bytes)?
    };
    debug!(bytes = bytes.len(), entries = trie.data().len(), "loaded trie");

    let mut code_points = vec![];
    for s in &args.code_points {
        code_points.push(parse_code_point(s)?);
    }
    if let Some(text) = args.text.as_ref() {
        code_points.extend(text.chars().map(u32::from));
    }

    for c in code_points {
        match trie.get_value(c) {
            Value::Label(label) => println!("U+{:04X}\t{}", c, label),
            Value::Int(v) => println!("U+{:04X}\t{}", c, v),
        }
    }

    Ok(())
}
