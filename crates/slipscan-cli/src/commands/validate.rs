//! Full pipeline: observed features against the Monte Carlo null model.

use slipscan_core::{
    AnalysisSettings, LotteryConfig, SpatialReport, analyze_with_progress,
};

pub fn run(config: &LotteryConfig, input: &str, settings: AnalysisSettings, output: Option<&str>) {
    let draws = super::load_draws(input, config);
    println!(
        "Validating {} draws of {} against {} simulations ({}, alpha {})\n",
        draws.len(),
        config,
        settings.n_simulations,
        settings.correction,
        settings.alpha
    );

    let cancel = super::cancel_on_ctrlc();
    let report = match analyze_with_progress(
        config,
        &draws,
        &settings,
        &cancel,
        Some(&super::progress_printer),
    ) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("\n{e}");
            std::process::exit(1);
        }
    };

    print_report(&report);

    if let Some(path) = output {
        super::save_json(path, &report);
    }
}

fn print_report(report: &SpatialReport) {
    let s = &report.summary;
    println!();
    println!("{}", "═".repeat(80));
    println!("SPATIAL VALIDATION REPORT");
    println!("{}", "═".repeat(80));
    println!("\nFeatures tested:     {}", s.features_tested);
    println!(
        "Significant:         {} ({:.1}%)",
        s.significant_count,
        s.significant_pct()
    );
    println!("Correction:          {}", s.correction_method);
    println!("\nEffect size:");
    println!("  - large  (>=0.5):  {}", s.large_effect_count);
    println!("  - medium (0.2-0.5): {}", s.medium_effect_count);

    println!(
        "\n  {:<24} {:>10} {:>10} {:>8} {:>8} {:>10} {:>4}",
        "Feature", "Observed", "Simulated", "z", "Effect", "Adj. p", "Sig"
    );
    println!("  {}", "─".repeat(80));
    for r in &report.results {
        println!(
            "  {:<24} {:>10} {:>10} {:>8.3} {:>8} {:>10.4} {:>4}",
            r.feature,
            super::fmt_num(r.observed_mean),
            super::fmt_num(r.simulated_mean),
            r.z_score,
            r.effect_interpretation.to_string(),
            r.adjusted_p_value,
            if r.significant { "✓" } else { "✗" }
        );
    }

    if s.significant_count == 0 {
        println!("\n⚠ No feature is significant after correction.");
    } else {
        println!("\nTop features by effect size:");
        for t in &s.top_by_effect {
            println!(
                "  {:<24} effect {:.3}  adj. p {:.4}  {}",
                t.feature,
                t.effect_size,
                t.adjusted_p_value,
                if t.significant { "✓" } else { "✗" }
            );
        }
    }
    println!("\n{}", "═".repeat(80));
}
