use std::sync::Arc;

use clap::Subcommand;
use freedive_core::format::format_mmss;
use freedive_core::{
    Config, MutedSpeaker, SessionController, SessionPhase, SessionSnapshot, Speaker, TableKind,
    TableParams,
};
use tracing::info;

use super::{apply_overrides, CommandResult, TableArgs};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a session to completion; Ctrl-C stops it
    Run {
        #[command(flatten)]
        table: TableArgs,
        /// Do not print speech cues
        #[arg(long)]
        quiet: bool,
    },
}

pub fn run(action: SessionAction) -> CommandResult {
    match action {
        SessionAction::Run { table, quiet } => {
            let config = Config::load()?;
            let speaker: Arc<dyn Speaker> = if quiet || !config.speech.enabled {
                Arc::new(MutedSpeaker)
            } else {
                Arc::new(|text: &str| println!(">> {text}"))
            };

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let handle = runtime.handle().clone();
            match table.kind {
                TableKind::Co2 => {
                    runtime.block_on(session(config.co2_controller(handle), &table, speaker))
                }
                TableKind::O2 => {
                    runtime.block_on(session(config.o2_controller(handle), &table, speaker))
                }
                TableKind::OneBreath => runtime.block_on(session(
                    config.one_breath_controller(handle),
                    &table,
                    speaker,
                )),
            }
        }
    }
}

async fn session<P: TableParams>(
    mut controller: SessionController<P>,
    args: &TableArgs,
    speaker: Arc<dyn Speaker>,
) -> CommandResult {
    apply_overrides(&mut controller, args)?;
    let state = controller.state();
    println!(
        "{} session: {} rounds, {}",
        P::KIND,
        state.round_count(),
        format_mmss(state.total_ms())
    );

    let mut rx = controller.subscribe();
    controller.start_session(speaker);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                if let Some(snapshot) = &state.latest_snapshot {
                    println!("{}", status_line(snapshot));
                }
                if !state.is_running {
                    println!("done");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                controller.stop_session();
                info!(kind = %P::KIND, "interrupted");
                println!("Session stopped");
                break;
            }
        }
    }
    Ok(())
}

fn status_line(snapshot: &SessionSnapshot) -> String {
    let phase = match snapshot.phase {
        SessionPhase::Recovery => "breathe",
        SessionPhase::Hold => "hold",
    };
    format!(
        "[{}/{}] {:<7} {}",
        snapshot.round_index + 1,
        snapshot.total_rounds,
        phase,
        format_mmss(snapshot.remaining_ms)
    )
}
