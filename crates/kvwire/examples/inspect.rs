//! Dumps an encoded value tree.
//!
//! Usage: `inspect <file>` or `inspect --hex 4101050103616263`

use std::fs;

use kvwire::{decode_value, format_hash, Kind, MappedRecord, MappedValue, ValueView};

fn parse_hex(s: &str) -> Option<Vec<u8>> {
    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

fn format_bytes(bytes: &[u8]) -> String {
    let preview = &bytes[..bytes.len().min(32)];
    let text = if preview.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        format!("\"{}\"", String::from_utf8_lossy(preview))
    } else {
        preview.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" ")
    };
    if bytes.len() > preview.len() {
        format!("{} ... ({} bytes)", text, bytes.len())
    } else {
        text
    }
}

fn print_value(value: &MappedValue<'_>, indent: usize) {
    let pad = "  ".repeat(indent);
    match value.kind() {
        Kind::Absent => println!("{}absent", pad),
        Kind::Scalar => println!("{}scalar {}", pad, format_bytes(value.scalar().unwrap_or_default())),
        Kind::Array => {
            println!("{}array [{}]", pad, value.count());
            for (i, child) in value.values().enumerate() {
                match child {
                    Ok(child) => print_value(child, indent + 1),
                    Err(e) => println!("{}  [{}] error: {}", pad, i, e),
                }
            }
        }
        Kind::RecordList => {
            println!("{}records [{}]", pad, value.count());
            for (i, record) in value.records().enumerate() {
                match record {
                    Ok(record) => print_record(record, indent + 1),
                    Err(e) => println!("{}  [{}] error: {}", pad, i, e),
                }
            }
        }
    }
}

fn print_record(record: &MappedRecord<'_>, indent: usize) {
    let pad = "  ".repeat(indent);
    println!("{}record {}", pad, &format_hash(&record.content_hash())[..16]);

    match record.key_as_key() {
        Ok(Some(key)) => {
            let parts: Vec<String> = key.sub_keys().map(format_bytes).collect();
            println!("{}  key: [{}]", pad, parts.join(", "));
        }
        Ok(None) => {}
        Err(_) => println!("{}  key (raw): {}", pad, format_bytes(record.key().unwrap_or_default())),
    }

    match record.value_as_value() {
        Ok(Some(value)) => {
            println!("{}  value:", pad);
            print_value(&value, indent + 2);
        }
        Ok(None) => {}
        Err(_) => println!("{}  value (raw): {}", pad, format_bytes(record.value().unwrap_or_default())),
    }

    if let Some(scheme) = record.scheme() {
        match record.scheme_as_scheme() {
            Ok(Some(s)) => println!(
                "{}  scheme: domain={} tablet={} buckets={}",
                pad,
                s.domain().map(format_bytes).unwrap_or_else(|| "-".to_string()),
                s.tablet().map(format_bytes).unwrap_or_else(|| "-".to_string()),
                s.buckets().map(|b| b.len()).unwrap_or(0),
            ),
            _ => println!("{}  scheme (raw): {}", pad, format_bytes(scheme)),
        }
    }

    if let Some(ts) = record.timestamp() {
        println!(
            "{}  timestamp: {} ns{}",
            pad,
            ts,
            if record.is_signed() { " (signed)" } else { "" }
        );
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let data = match (args.next(), args.next()) {
        (Some(flag), Some(hex)) if flag == "--hex" => parse_hex(&hex).expect("Invalid hex"),
        (Some(path), None) => {
            println!("Reading: {}", path);
            fs::read(&path).expect("Failed to read file")
        }
        _ => {
            eprintln!("usage: inspect <file> | inspect --hex <bytes>");
            std::process::exit(2);
        }
    };
    println!("Input size: {} bytes", data.len());

    let value = decode_value(&data).expect("Failed to decode");
    println!("Value size: {} bytes", value.encoded_len());
    if value.encoded_len() < data.len() {
        println!("Trailing: {} bytes", data.len() - value.encoded_len());
    }

    println!();
    print_value(&value, 0);

    if let Err(e) = value.validate(kvwire::limits::DEFAULT_MAX_DEPTH) {
        println!("\nvalidation failed: {}", e);
    }
}
