//! Impairment scope around a run

use idstorm_core::{ImpairmentController, ImpairmentScenario};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Where and how to degrade the link for the duration of a run
#[derive(Debug, Clone)]
pub struct ImpairmentPlan {
    pub interface: String,
    pub scenario: ImpairmentScenario,
    /// Pause after the rule is installed
    pub settle_delay: Duration,
}

/// Apply the plan, run `body`, then clear the rule.
///
/// Shaping failures are logged and the run goes ahead without it. The clear
/// runs whenever `body` returns, whatever its result; callers that may drop
/// this future early should also hold a synchronous guard.
pub async fn with_impairment<F, Fut, T>(
    controller: &dyn ImpairmentController,
    plan: &ImpairmentPlan,
    body: F,
) -> T
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let interface = plan.interface.as_str();

    match controller.apply(interface, &plan.scenario).await {
        Ok(()) => {
            info!(interface, scenario = %plan.scenario, "Impairment applied");
            match controller.query(interface).await {
                Ok(rule) => info!(interface, rule = rule.trim(), "Active traffic rule"),
                Err(e) => warn!(interface, "Could not read back traffic rule: {}", e),
            }
            if !plan.scenario.is_baseline() && !plan.settle_delay.is_zero() {
                tokio::time::sleep(plan.settle_delay).await;
            }
        }
        Err(e) => warn!(
            interface,
            scenario = %plan.scenario,
            "Failed to apply impairment, running without shaping: {}",
            e
        ),
    }

    let output = body().await;

    match controller.clear(interface).await {
        Ok(()) => info!(interface, "Impairment cleared"),
        Err(e) => warn!(interface, "Failed to clear impairment: {}", e),
    }

    output
}
