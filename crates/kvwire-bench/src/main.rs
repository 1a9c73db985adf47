//! Throughput benchmark for kvwire record batches.
//!
//! Loads rows from a JSON file (or generates synthetic ones), packs them into
//! record-list batches and measures encode, lazy decode, full traversal and
//! strict validation.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use kvwire::{
    content_hash, decode_value, decode_value_with_options, DecodeOptions, Key, Record, Scheme,
    Signature, Value, ValueView,
};
use serde::Deserialize;

/// Records per record-list batch. Keeps batch content under the 64 KiB
/// content limit for typical rows.
const BATCH_SIZE: usize = 128;

const DECODE_ITERS: u32 = 10;

// =============================================================================
// JSON DATA STRUCTURES
// =============================================================================

#[derive(Debug, Deserialize)]
struct Row {
    table: String,
    id: u64,
    name: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    region: Option<String>,
    /// Nanoseconds since the Unix epoch.
    #[serde(default)]
    updated_at: Option<i64>,
}

fn synthetic_rows(count: usize) -> Vec<Row> {
    const TABLES: [&str; 4] = ["users", "orders", "products", "sessions"];
    const REGIONS: [&str; 3] = ["eu-west", "us-east", "ap-south"];

    (0..count)
        .map(|i| Row {
            table: TABLES[i % TABLES.len()].to_string(),
            id: i as u64,
            name: format!("row-{:08}", i),
            tags: (0..i % 5).map(|t| format!("tag{}", t)).collect(),
            region: (i % 7 != 0).then(|| REGIONS[i % REGIONS.len()].to_string()),
            updated_at: Some(1_700_000_000_000_000_000 + i as i64 * 1_000),
        })
        .collect()
}

// =============================================================================
// CONVERSION
// =============================================================================

fn build_record(row: &Row) -> Result<Record, Box<dyn std::error::Error>> {
    let key = Key::from_sub_keys([row.table.as_bytes(), row.id.to_be_bytes().as_slice()])?;

    let tags = Value::array_from(row.tags.iter().map(|t| Value::scalar(t.as_bytes())));
    let value = Value::array_from([Value::scalar(row.name.as_bytes()), tags]);

    let mut record = Record::new().with_key(&key).with_value(&value)?;
    if let Some(region) = &row.region {
        let scheme = Scheme::new()
            .with_domain(region.as_bytes())
            .with_tablet(row.table.as_bytes());
        record = record.with_scheme(&scheme);
    }
    if let Some(ts) = row.updated_at {
        // Stand-in signature over the stamped record so rows can share a list.
        record = record.with_timestamp(ts);
        let digest = record.content_hash()?;
        let seal = content_hash(&digest);
        record = record.with_signature(Signature::new(digest, seal));
    }
    Ok(record)
}

fn build_batches(rows: &[Row]) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    let mut batches = Vec::with_capacity(rows.len().div_ceil(BATCH_SIZE));
    for chunk in rows.chunks(BATCH_SIZE) {
        let mut records = Vec::with_capacity(chunk.len());
        for row in chunk {
            records.push(build_record(row)?);
        }
        batches.push(Value::record_list_from(records));
    }
    Ok(batches)
}

fn throughput(bytes: usize, time: Duration) -> f64 {
    (bytes as f64 / 1_000_000.0) / time.as_secs_f64()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let rows = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading rows from: {}", path);
            let json = fs::read_to_string(&path)?;
            let parse_start = Instant::now();
            let rows: Vec<Row> = serde_json::from_str(&json)?;
            println!("Parsed {} rows in {:?}", rows.len(), parse_start.elapsed());
            rows
        }
        None => {
            let rows = synthetic_rows(100_000);
            println!("Generated {} synthetic rows", rows.len());
            rows
        }
    };

    // Build constructed batches
    let convert_start = Instant::now();
    let mut batches = build_batches(&rows)?;
    let convert_time = convert_start.elapsed();
    println!(
        "Built {} batches of up to {} records in {:?}",
        batches.len(),
        BATCH_SIZE,
        convert_time
    );

    // Benchmark encoding
    let encode_start = Instant::now();
    let mut encoded = Vec::with_capacity(batches.len());
    for batch in &batches {
        encoded.push(batch.to_bytes()?);
    }
    let encode_time = encode_start.elapsed();
    let total_bytes: usize = encoded.iter().map(Vec::len).sum();

    println!("\nEncode: {} bytes in {:?}", total_bytes, encode_time);
    println!("  Throughput: {:.2} MB/s", throughput(total_bytes, encode_time));

    // Re-encoding through the cache must reproduce the same bytes
    for (batch, bytes) in batches.iter_mut().zip(&encoded) {
        if batch.encode()? != bytes.as_slice() {
            return Err("re-encoded batch differs".into());
        }
    }

    // Benchmark lazy decode (header only)
    let lazy_start = Instant::now();
    let mut headers = 0usize;
    for _ in 0..DECODE_ITERS {
        for bytes in &encoded {
            headers += decode_value(bytes)?.count();
        }
    }
    let lazy_time = lazy_start.elapsed() / DECODE_ITERS;
    println!("\nLazy decode: {:?} (avg of {} iterations)", lazy_time, DECODE_ITERS);
    println!("  Throughput: {:.2} MB/s", throughput(total_bytes, lazy_time));
    log::debug!("lazy decode saw {} declared records", headers);

    // Benchmark full traversal: every record, key and value
    let traverse_start = Instant::now();
    let mut sub_keys = 0usize;
    for _ in 0..DECODE_ITERS {
        for bytes in &encoded {
            let batch = decode_value(bytes)?;
            for record in batch.records() {
                let record = record?;
                if let Some(key) = record.key_as_key()? {
                    sub_keys += key.len();
                }
                if let Some(value) = record.value_as_value()? {
                    value.value_at(0)?;
                }
            }
        }
    }
    let traverse_time = traverse_start.elapsed() / DECODE_ITERS;
    println!(
        "\nFull traversal: {:?} (avg of {} iterations)",
        traverse_time, DECODE_ITERS
    );
    println!("  Throughput: {:.2} MB/s", throughput(total_bytes, traverse_time));
    log::debug!("traversal read {} sub-keys", sub_keys);

    // Benchmark strict validation
    let strict_start = Instant::now();
    for _ in 0..DECODE_ITERS {
        for bytes in &encoded {
            decode_value_with_options(bytes, DecodeOptions::strict())?;
        }
    }
    let strict_time = strict_start.elapsed() / DECODE_ITERS;
    println!("\nStrict decode: {:?} (avg of {} iterations)", strict_time, DECODE_ITERS);
    println!("  Throughput: {:.2} MB/s", throughput(total_bytes, strict_time));

    // Benchmark copy-construct
    let copy_start = Instant::now();
    let mut copied = 0usize;
    for bytes in &encoded {
        copied += decode_value(bytes)?.to_value()?.count();
    }
    let copy_time = copy_start.elapsed();
    println!("\nCopy-construct: {} records in {:?}", copied, copy_time);

    // Hash every record
    let hash_start = Instant::now();
    let mut hashed = 0usize;
    for bytes in &encoded {
        for record in decode_value(bytes)?.records() {
            let _ = record?.content_hash();
            hashed += 1;
        }
    }
    println!("Hashed {} records in {:?}", hashed, hash_start.elapsed());

    // Write first batch for inspection
    if let Some(first) = encoded.first() {
        let output = Path::new("batch-0.kvw");
        fs::write(output, first)?;
        println!("\nWrote first batch to {}", output.display());
    }

    // Summary
    let json_estimate: usize = rows
        .iter()
        .map(|r| r.table.len() + r.name.len() + r.tags.iter().map(String::len).sum::<usize>() + 64)
        .sum();
    println!("\n=== Summary ===");
    println!("Rows: {}", rows.len());
    println!("Batches: {}", batches.len());
    println!(
        "Encoded: {} bytes ({:.1} MB), {:.1} bytes/row",
        total_bytes,
        total_bytes as f64 / 1_000_000.0,
        total_bytes as f64 / rows.len().max(1) as f64
    );
    println!(
        "Size vs JSON estimate: {:.1}%",
        100.0 * total_bytes as f64 / json_estimate.max(1) as f64
    );

    Ok(())
}
