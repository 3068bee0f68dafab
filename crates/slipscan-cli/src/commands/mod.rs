pub mod features;
pub mod simulate;
pub mod validate;
pub mod variants;

use std::io::Write;

use serde::Serialize;
use slipscan_core::{CancelToken, CorrectionMethod, Draw, FeatureSchema, LotteryConfig, Registry};

/// Builtin variants, merged with a JSON variants file when given.
pub fn load_registry(variants_path: Option<&str>) -> Registry {
    let Some(path) = variants_path else {
        return Registry::builtin();
    };
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to read {path}: {e}");
            std::process::exit(1);
        }
    };
    match Registry::from_json(&text) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{path}: {e}");
            std::process::exit(1);
        }
    }
}

/// Resolve a variant by slug or exit.
pub fn resolve_variant(registry: &Registry, slug: &str) -> LotteryConfig {
    match registry.get(slug) {
        Ok(c) => c.clone(),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

pub fn parse_schema(s: &str) -> FeatureSchema {
    s.parse().unwrap_or_else(|e: String| {
        eprintln!("{e}");
        std::process::exit(1);
    })
}

pub fn parse_correction(s: &str) -> CorrectionMethod {
    s.parse().unwrap_or_else(|e: String| {
        eprintln!("{e}");
        std::process::exit(1);
    })
}

/// Parse draws from CSV text.
///
/// Each record is `contest,n1,...,nk` or just `n1,...,nk` with `k == draw_size`.
/// `#` comments are skipped. Only the first record may be a header, and only
/// when its first field does not start with a digit. Number ranges are not
/// checked here; the grid mapper rejects bad draws.
pub fn parse_draws(text: &str, draw_size: usize) -> Result<Vec<Draw>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut draws = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| e.to_string())?;
        let lineno = record.position().map_or(i as u64 + 1, csv::Position::line);
        let is_header = i == 0
            && record
                .get(0)
                .and_then(|f| f.chars().next())
                .is_some_and(|c| !c.is_ascii_digit());
        if is_header {
            continue;
        }
        let values = record
            .iter()
            .map(str::parse::<u32>)
            .collect::<Result<Vec<u32>, _>>()
            .map_err(|e| format!("line {lineno}: {e}"))?;
        let draw = if values.len() == draw_size + 1 {
            Draw::new(Some(values[0]), values[1..].to_vec())
        } else if values.len() == draw_size {
            Draw::new(None, values)
        } else {
            return Err(format!(
                "line {lineno}: expected {draw_size} numbers (optionally preceded by a contest), got {} fields",
                values.len()
            ));
        };
        draws.push(draw);
    }
    if draws.is_empty() {
        return Err("no draws found".into());
    }
    Ok(draws)
}

/// Load draws for `config` from a CSV file or exit.
pub fn load_draws(path: &str, config: &LotteryConfig) -> Vec<Draw> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to read {path}: {e}");
            std::process::exit(1);
        }
    };
    match parse_draws(&text, config.draw_size()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{path}: {e}");
            std::process::exit(1);
        }
    }
}

/// Cancellation token tripped by Ctrl+C.
pub fn cancel_on_ctrlc() -> CancelToken {
    let token = CancelToken::new();
    let handle = token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nCancelling after in-flight simulations...");
        handle.cancel();
    }) {
        log::warn!("Ctrl+C handler not installed: {e}");
    }
    token
}

/// Progress line on stderr, redrawn about every percent.
pub fn progress_printer(done: usize, total: usize) {
    let step = (total / 100).max(1);
    if done % step == 0 || done == total {
        eprint!("\r  simulations: {done}/{total}");
        if done == total {
            eprintln!();
        }
        let _ = std::io::stderr().flush();
    }
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    std::fs::write(path, text).map_err(|e| e.to_string())
}

/// Write JSON and report the outcome the way every command does.
pub fn save_json<T: Serialize>(path: &str, value: &T) {
    match write_json(path, value) {
        Ok(()) => println!("\nResults written to {path}"),
        Err(e) => eprintln!("\nFailed to write {path}: {e}"),
    }
}

/// Compact number for tables; infinities and NaN spelled out.
pub fn fmt_num(x: f64) -> String {
    if x.is_finite() {
        format!("{x:.4}")
    } else {
        format!("{x}")
    }
}
