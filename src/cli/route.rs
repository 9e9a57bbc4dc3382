//! Route command implementation
//!
//! Builds a decision engine from configuration with every circuit closed
//! and ranks the configured paths for a request described on the command
//! line. Nothing is executed.

use std::sync::Arc;

use crate::circuit::CircuitBreaker;
use crate::cli::output::{format_decision_json, format_decision_table};
use crate::cli::RouteArgs;
use crate::config::DualrouteConfig;
use crate::registry::{PathRegistry, ProviderKind};
use crate::routing::{DecisionEngine, OperationRequest, Priority, RequiredCapabilities};

/// Build the request described by `args`.
pub fn request_from_args(args: &RouteArgs) -> Result<OperationRequest, Box<dyn std::error::Error>> {
    let priority: Priority = args.priority.parse()?;
    let mut request = OperationRequest::new(args.operation.as_str())
        .with_priority(priority)
        .with_domain(args.domain.as_str())
        .with_requirements(RequiredCapabilities {
            tools: args.tools,
            streaming: args.streaming,
            min_tokens: args.min_tokens.unwrap_or(0),
        });

    if let Some(budget) = args.latency_budget_ms {
        request = request.with_latency_budget_ms(budget);
    }
    if let Some(ceiling) = args.cost_ceiling {
        request = request.with_cost_ceiling(ceiling);
    }
    if let Some(tier) = &args.cost_tier {
        request = request.with_cost_tier(tier.parse()?);
    }
    Ok(request)
}

/// Handle `dualroute route` command
pub fn handle_route(
    args: &RouteArgs,
    config: &DualrouteConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let registry = PathRegistry::from_config(&config.paths)?;
    let circuits = Arc::new(CircuitBreaker::new(config.circuit_breaker.clone()));
    let engine = DecisionEngine::new(&config.routing, circuits);

    let request = request_from_args(args)?;
    let prefer = args
        .prefer
        .iter()
        .map(|s| s.parse::<ProviderKind>())
        .collect::<Result<Vec<_>, _>>()?;
    let priority_order = (!prefer.is_empty()).then_some(prefer.as_slice());

    let decision = engine.decide(&request, &registry.all_paths(), priority_order)?;

    if args.json {
        Ok(format_decision_json(&decision)?)
    } else {
        Ok(format_decision_table(&decision))
    }
}
