//! `idstorm scenarios`

use colored::Colorize;
use idstorm_config::HarnessConfig;
use idstorm_core::ImpairmentScenario;
use std::fmt::Write as _;

/// Catalog table, built-ins first then custom scenarios
pub fn render_catalog(config: &HarnessConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<22} {:>8} {:>7} {:>8}",
        "index", "name", "delay", "loss", "timeout"
    );
    for (index, scenario) in ImpairmentScenario::catalog(&config.network.custom_scenarios)
        .iter()
        .enumerate()
    {
        let _ = writeln!(
            out,
            "{:>5}  {:<22} {:>6}ms {:>6}% {:>7}s",
            index,
            scenario.name,
            scenario.delay_ms,
            scenario.loss_pct,
            config.run.effective_timeout(scenario).as_secs_f64()
        );
    }
    out
}

/// Handle `idstorm scenarios`
pub fn scenarios_command(config: &HarnessConfig) {
    println!("{}", "Impairment scenarios".bold());
    print!("{}", render_catalog(config));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_custom_after_builtins() {
        let mut config = HarnessConfig::default();
        config
            .network
            .custom_scenarios
            .push(ImpairmentScenario::new("lab-wifi", 30, 0.5));

        let table = render_catalog(&config);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[1].contains("baseline"));
        assert!(lines[7].contains("total-degradation"));
        assert!(lines[7].trim_end().ends_with("3s"));
        assert!(lines[8].contains("lab-wifi"));
        assert!(lines[8].contains("0.5%"));
    }
}
