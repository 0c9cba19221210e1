mod params;
mod session;

pub use params::{
    Bounds, Co2Params, O2Params, OneBreathParams, Parameter, TableParams, DEFAULT_ROUNDS,
    MIN_ROUNDS, ONE_BREATH_MAX_ROUNDS,
};
pub use session::{
    Co2Controller, ControllerState, O2Controller, OneBreathController, SessionController,
};
