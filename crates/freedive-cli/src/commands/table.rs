use clap::Subcommand;
use freedive_core::format::format_mmss;
use freedive_core::timer::phase_order;
use freedive_core::{Config, Round, SessionController, SessionPhase, TableKind, TableParams};
use serde::Serialize;

use super::{apply_overrides, CommandResult, TableArgs};

#[derive(Subcommand)]
pub enum TableAction {
    /// Print the generated table
    Show {
        #[command(flatten)]
        table: TableArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct TableView<'a, P> {
    kind: TableKind,
    params: &'a P,
    rounds: &'a [Round],
    total_ms: u64,
}

pub fn run(action: TableAction) -> CommandResult {
    match action {
        TableAction::Show { table, json } => {
            let config = Config::load()?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let handle = runtime.handle().clone();
            match table.kind {
                TableKind::Co2 => show(config.co2_controller(handle), &table, json),
                TableKind::O2 => show(config.o2_controller(handle), &table, json),
                TableKind::OneBreath => show(config.one_breath_controller(handle), &table, json),
            }
        }
    }
}

fn show<P: TableParams>(
    mut controller: SessionController<P>,
    args: &TableArgs,
    json: bool,
) -> CommandResult {
    apply_overrides(&mut controller, args)?;
    let state = controller.state();

    if json {
        let view = TableView {
            kind: P::KIND,
            params: &state.params,
            rounds: &state.rounds,
            total_ms: state.total_ms(),
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!(
        "{} table: {} rounds, total {}",
        P::KIND,
        state.round_count(),
        format_mmss(state.total_ms())
    );
    let params: Vec<String> = P::parameters()
        .iter()
        .filter_map(|&p| state.params.get(p).map(|ms| format!("{p} {}", format_mmss(ms))))
        .collect();
    println!("{}", params.join(", "));
    println!();

    let order = phase_order(P::KIND);
    println!(
        "{:>3}  {:<8} {:<8}",
        "#",
        column_name(order[0]),
        column_name(order[1])
    );
    for (i, round) in state.rounds.iter().enumerate() {
        println!(
            "{:>3}  {:<8} {:<8}",
            i + 1,
            format_mmss(round.duration_of(order[0])),
            format_mmss(round.duration_of(order[1]))
        );
    }
    Ok(())
}

fn column_name(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Recovery => "breathe",
        SessionPhase::Hold => "hold",
    }
}
