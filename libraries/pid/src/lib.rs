mod pid;

pub use pid::{ControllerState, Gains, PIDError, PID};
