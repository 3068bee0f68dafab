//! Per-draw feature extraction for an observed draws file.

use slipscan_core::{FeatureSchema, LotteryConfig, extract_observed};
use slipscan_tests::{finite, mean, population_std};

pub fn run(config: &LotteryConfig, input: &str, schema: FeatureSchema, output: Option<&str>) {
    let draws = super::load_draws(input, config);
    let table = match extract_observed(config, schema, &draws) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    println!(
        "{} draws of {}, {} features ({} set)\n",
        table.len(),
        config,
        table.names().len(),
        schema.as_str()
    );
    println!("  {:<26} {:>10} {:>10} {:>8}", "Feature", "Mean", "Std", "Dropped");
    println!("  {}", "─".repeat(58));
    for name in table.names() {
        let column = table.column(name).unwrap_or_default();
        let values = finite(&column);
        println!(
            "  {:<26} {:>10} {:>10} {:>8}",
            name,
            super::fmt_num(mean(&values)),
            super::fmt_num(population_std(&values)),
            column.len() - values.len()
        );
    }

    if let Some(path) = output {
        super::save_json(path, &table);
    }
}
