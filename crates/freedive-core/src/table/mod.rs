mod generator;
mod round;

pub use generator::{
    generate_co2_table, generate_o2_table, generate_one_breath_table, o2_percentages,
    CO2_RECOVERY_STEP_MS,
};
pub use round::{table_duration_ms, Round, SessionPhase, TableKind};
