//! Monte Carlo null model and its baseline table.

use slipscan_core::{
    FeatureSchema, LotteryConfig, MonteCarloSimulator, RawRetention, SimulationSettings, summarize,
};

pub struct SimulateCommandConfig<'a> {
    pub schema: FeatureSchema,
    pub n_simulations: usize,
    pub n_draws: usize,
    pub seed: u64,
    pub parallel: bool,
    pub output_path: Option<&'a str>,
}

pub fn run(config: &LotteryConfig, cmd: SimulateCommandConfig<'_>) {
    let settings = SimulationSettings {
        n_simulations: cmd.n_simulations,
        n_draws_per_sim: cmd.n_draws,
        seed: cmd.seed,
        parallel: cmd.parallel,
        retention: RawRetention::None,
    };
    println!(
        "Simulating {} datasets of {} draws for {} (seed {})\n",
        cmd.n_simulations, cmd.n_draws, config, cmd.seed
    );

    let cancel = super::cancel_on_ctrlc();
    let simulator = MonteCarloSimulator::new(config, cmd.schema);
    let runs = match simulator.run_with(&settings, &cancel, Some(&super::progress_printer)) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("\n{e}");
            std::process::exit(1);
        }
    };
    let baseline = match summarize(&runs) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    println!();
    println!(
        "  {:<26} {:>10} {:>10} {:>10} {:>10} {:>6}",
        "Feature", "Mean", "Std", "P2.5", "P97.5", "Runs"
    );
    println!("  {}", "─".repeat(78));
    for stat in baseline.iter() {
        println!(
            "  {:<26} {:>10} {:>10} {:>10} {:>10} {:>6}",
            stat.feature,
            super::fmt_num(stat.mean),
            super::fmt_num(stat.std),
            super::fmt_num(stat.p2_5),
            super::fmt_num(stat.p97_5),
            stat.runs
        );
    }

    if let Some(path) = cmd.output_path {
        let json = serde_json::json!({
            "config": config,
            "settings": &settings,
            "baseline": &baseline,
        });
        super::save_json(path, &json);
    }
}
