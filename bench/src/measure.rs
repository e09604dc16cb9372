use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use clap::Parser;
use rand::Rng;
use utrie::{Builder, Statistics};

const TRIALS: usize = 10;
const QUERIES: usize = 100000;

#[derive(Parser, Debug)]
#[clap(name = "measure", about = "A program to measure the performance.")]
struct Args {
    /// UCD property file with `XXXX[..YYYY] ; Value` lines.
    /// Random ranges are used if not given.
    #[clap(short = 'i', long)]
    input_filename: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let records = match args.input_filename.as_ref() {
        Some(filename) => {
            println!("input_filename: {}", filename);
            load_properties(filename)?
        }
        None => random_records(),
    };
    let queries = random_queries();

    println!("#ranges: {}", records.len());

    {
        println!("[utrie/builder]");
        let start = Instant::now();
        let mut builder = Builder::new("XX", "XX");
        for (first, last, value) in &records {
            builder.set_range(*first, *last, value, true)?;
        }
        let duration = start.elapsed();
        println!("construction: {:.3} [sec]", duration.as_secs_f64());
        println!("#values: {}", builder.values().len());

        {
            let mut dummy = 0;
            let elapsed_sec = measure(TRIALS, || {
                for &q in &queries {
                    dummy += builder.get(q) as usize;
                }
            });
            println!(
                "get: {:.3} [ns/query]",
                to_ns(elapsed_sec) / queries.len() as f64
            );
            println!("dummy: {}", dummy);
        }

        println!("[utrie/trie]");
        let start = Instant::now();
        let trie = builder.freeze()?;
        let duration = start.elapsed();
        print_heap_bytes(trie.heap_bytes());
        println!("num_elems: {}", trie.num_elems());
        println!("high_start: {:#x}", trie.high_start());
        println!("freeze: {:.3} [sec]", duration.as_secs_f64());

        let bytes = trie.serialize_to_vec()?;
        println!("serialized: {} bytes", bytes.len());

        {
            let mut dummy = 0;
            let elapsed_sec = measure(TRIALS, || {
                for &q in &queries {
                    dummy += trie.get(q) as usize;
                }
            });
            println!(
                "get: {:.3} [ns/query]",
                to_ns(elapsed_sec) / queries.len() as f64
            );
            println!("dummy: {}", dummy);
        }

        println!("[std/Vec]");
        let table: Vec<u32> = (0..0x110000).map(|c| trie.get(c)).collect();
        print_heap_bytes(table.len() * std::mem::size_of::<u32>());
        {
            let mut dummy = 0;
            let elapsed_sec = measure(TRIALS, || {
                for &q in &queries {
                    dummy += table[q as usize] as usize;
                }
            });
            println!(
                "get: {:.3} [ns/query]",
                to_ns(elapsed_sec) / queries.len() as f64
            );
            println!("dummy: {}", dummy);
        }

        println!("[std/BTreeMap]");
        let mut map = BTreeMap::new();
        for (first, last, value) in &records {
            map.insert(*first, (*last, trie.value_id(value).unwrap_or(0)));
        }
        {
            let mut dummy = 0;
            let elapsed_sec = measure(TRIALS, || {
                for &q in &queries {
                    if let Some((_, &(end, value))) = map.range(..=q).next_back() {
                        if q <= end {
                            dummy += value as usize;
                        }
                    }
                }
            });
            println!(
                "get: {:.3} [ns/query]",
                to_ns(elapsed_sec) / queries.len() as f64
            );
            println!("dummy: {}", dummy);
        }
    }

    Ok(())
}

fn print_heap_bytes(bytes: usize) {
    println!(
        "heap_bytes: {} bytes, {:.3} KiB",
        bytes,
        bytes as f64 / 1024.0
    );
}

/// Parses lines of the form `XXXX[..YYYY] ; Value # comment`.
fn load_properties<P>(path: P) -> Result<Vec<(u32, u32, String)>, Box<dyn Error>>
where
    P: AsRef<Path>,
{
    let mut records = vec![];
    for line in BufReader::new(File::open(path)?).lines() {
        let line = line?;
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(';').map(str::trim);
        let range = fields.next().unwrap_or("");
        let value = fields.next().unwrap_or("");
        let (start, end) = range.split_once("..").unwrap_or((range, range));
        records.push((
            u32::from_str_radix(start, 16)?,
            u32::from_str_radix(end, 16)?,
            value.to_string(),
        ));
    }
    Ok(records)
}

fn random_records() -> Vec<(u32, u32, String)> {
    let mut rng = rand::thread_rng();
    let mut records = vec![];
    let mut c = 0;
    while c < 0x110000 {
        let len = rng.gen_range(1, 0x400);
        let end = (c + len - 1).min(0x10ffff);
        if rng.gen_range(0, 3) == 0 {
            records.push((c, end, format!("V{}", rng.gen_range(0, 40))));
        }
        c = end + 1;
    }
    records
}

fn random_queries() -> Vec<u32> {
    let mut rng = rand::thread_rng();
    (0..QUERIES).map(|_| rng.gen_range(0, 0x110000)).collect()
}

fn measure<F>(num_trials: usize, mut func: F) -> f64
where
    F: FnMut(),
{
    // Warmup
    func();
    // Measure
    let start = Instant::now();
    for _ in 0..num_trials {
        func();
    }
    let duration = start.elapsed();
    duration.as_secs_f64() / num_trials as f64
}

fn to_ns(sec: f64) -> f64 {
    sec * 1_000_000_000.
}
