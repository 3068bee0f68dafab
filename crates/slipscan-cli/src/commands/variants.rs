use slipscan_core::Registry;

pub fn run(registry: &Registry) {
    println!("{} lottery variant(s):\n", registry.len());
    println!(
        "  {:<14} {:<18} {:>6} {:>8} {:>6}",
        "Slug", "Name", "Grid", "Numbers", "Drawn"
    );
    println!("  {}", "─".repeat(56));
    for config in registry.iter() {
        println!(
            "  {:<14} {:<18} {:>6} {:>8} {:>6}",
            config.slug(),
            config.name(),
            format!("{}x{}", config.rows(), config.cols()),
            format!("{}-{}", config.min_number(), config.max_number()),
            config.draw_size()
        );
    }
}
