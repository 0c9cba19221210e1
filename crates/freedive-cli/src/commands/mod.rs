pub mod config;
pub mod session;
pub mod table;

use clap::Args;
use freedive_core::format::parse_assignment;
use freedive_core::{Parameter, SessionController, TableKind, TableParams};
use tracing::warn;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Table selection shared by `table show` and `session run`.
#[derive(Args, Debug)]
pub struct TableArgs {
    /// Table kind: co2, o2 or one-breath
    pub kind: TableKind,
    /// Round count (6 or more; one-breath stops at 12)
    #[arg(long)]
    pub rounds: Option<usize>,
    /// Parameter override such as `hold=1:30` (repeatable)
    #[arg(long = "param", value_name = "NAME=TIME", value_parser = parse_assignment)]
    pub params: Vec<(Parameter, u64)>,
}

/// Apply `--param` and `--rounds` on top of the configured defaults.
pub fn apply_overrides<P: TableParams>(
    controller: &mut SessionController<P>,
    args: &TableArgs,
) -> CommandResult {
    for &(parameter, value_ms) in &args.params {
        if !controller.set_parameter(parameter, value_ms) {
            return Err(format!("{parameter} does not apply to the {} table", P::KIND).into());
        }
        if controller.parameter(parameter) != Some(value_ms) {
            warn!(
                %parameter,
                requested_ms = value_ms,
                applied_ms = controller.parameter(parameter),
                "value clamped"
            );
        }
    }

    if let Some(target) = args.rounds {
        while controller.round_count() < target && controller.add_round() {}
        while controller.round_count() > target
            && controller.remove_round(controller.round_count() - 1)
        {}
        if controller.round_count() != target {
            warn!(
                requested = target,
                applied = controller.round_count(),
                "round count clamped"
            );
        }
    }
    Ok(())
}
