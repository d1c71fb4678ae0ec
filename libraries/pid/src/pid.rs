// Single-loop PID controller with derivative on measurement
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PIDError {
    #[error("Invalid gain configuration: {name} value {value} is not a finite number")]
    InvalidGain { name: &'static str, value: f32 },

    #[error("Non-finite input: {name} value {value} is not a finite number")]
    NonFiniteInput { name: &'static str, value: f32 },

    #[error("Invalid limit: {name} value {value} must be finite and positive")]
    InvalidLimit { name: &'static str, value: f32 },

    #[error("Numeric overflow: integral {integral}, output {output}")]
    Overflow { integral: f32, output: f32 },
}

fn finite_gain(name: &'static str, value: f32) -> Result<f32, PIDError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PIDError::InvalidGain { name, value })
    }
}

fn finite_input(name: &'static str, value: f32) -> Result<f32, PIDError> {
    if value.is_finite() {
        Ok(value)
    } else {
        log::warn!("rejecting {name} {value}: not a finite number");
        Err(PIDError::NonFiniteInput { name, value })
    }
}

fn positive_limit(name: &'static str, value: f32) -> Result<f32, PIDError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PIDError::InvalidLimit { name, value })
    }
}

/// Proportional, integral and derivative gains.
///
/// Gains are applied per sample: the controller takes no elapsed time, so a caller
/// running at a variable rate scales the gains itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    kp: f32,
    ki: f32,
    kd: f32,
}

impl Gains {
    /// Validates and bundles a set of gains.
    ///
    /// Negative gains are accepted; only NaN and infinite values are rejected.
    pub fn new(kp: f32, ki: f32, kd: f32) -> Result<Self, PIDError> {
        Ok(Self {
            kp: finite_gain("kp", kp)?,
            ki: finite_gain("ki", ki)?,
            kd: finite_gain("kd", kd)?,
        })
    }

    pub fn kp(&self) -> f32 {
        self.kp
    }

    pub fn ki(&self) -> f32 {
        self.ki
    }

    pub fn kd(&self) -> f32 {
        self.kd
    }
}

/// Whether the controller has seen a measurement yet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ControllerState {
    /// No measurement recorded; the next step emits the proportional term only.
    #[default]
    Uninitialized,
    Running { last_measurement: f32 },
}

#[derive(Debug, Clone)]
pub struct PID {
    gains: Gains,
    state: ControllerState,
    // Accumulated in f64 so that zero gains never meet an overflowed term.
    integral: f64,
    // None means unclamped
    max_integral: Option<f32>,
    max_output: Option<f32>,
}

impl PID {
    /// Create a new PID controller with the specified gain parameters.
    ///
    /// There are no limits on the integral or the output by default.
    /// Use `with_integral_limit()` and `with_output_limit()` to add them.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain
    /// * `ki` - Integral gain
    /// * `kd` - Derivative gain
    pub fn new(kp: f32, ki: f32, kd: f32) -> Result<Self, PIDError> {
        Gains::new(kp, ki, kd).map(Self::from_gains)
    }

    pub fn from_gains(gains: Gains) -> Self {
        Self {
            gains,
            state: ControllerState::Uninitialized,
            integral: 0.0,
            max_integral: None,
            max_output: None,
        }
    }

    /// Clamp the accumulated integral to `[-max_integral, max_integral]`.
    pub fn with_integral_limit(mut self, max_integral: f32) -> Result<Self, PIDError> {
        self.max_integral = Some(positive_limit("max_integral", max_integral)?);
        Ok(self)
    }

    /// Clamp every returned output to `[-max_output, max_output]`.
    pub fn with_output_limit(mut self, max_output: f32) -> Result<Self, PIDError> {
        self.max_output = Some(positive_limit("max_output", max_output)?);
        Ok(self)
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    pub fn kp(&self) -> f32 {
        self.gains.kp
    }

    pub fn ki(&self) -> f32 {
        self.gains.ki
    }

    pub fn kd(&self) -> f32 {
        self.gains.kd
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ControllerState::Running { .. })
    }

    pub fn last_measurement(&self) -> Option<f32> {
        match self.state {
            ControllerState::Uninitialized => None,
            ControllerState::Running { last_measurement } => Some(last_measurement),
        }
    }

    pub fn integral(&self) -> f32 {
        self.integral as f32
    }

    pub fn integral_limit(&self) -> Option<f32> {
        self.max_integral
    }

    pub fn output_limit(&self) -> Option<f32> {
        self.max_output
    }

    /// Advance the controller by one sample and return the control output.
    ///
    /// The first step after construction or `reset()` only records `measurement`
    /// and returns `kp * (setpoint - measurement)`. Later steps return
    /// `kp * error + integral - kd * (measurement - last_measurement)`.
    ///
    /// Nothing is mutated when an error is returned.
    pub fn step(&mut self, setpoint: f32, measurement: f32) -> Result<f32, PIDError> {
        let setpoint = finite_input("setpoint", setpoint)?;
        let measurement = finite_input("measurement", measurement)?;

        let error = f64::from(setpoint) - f64::from(measurement);
        let p = f64::from(self.gains.kp) * error;

        let (integral, output) = match self.state {
            ControllerState::Uninitialized => (self.integral, p),
            ControllerState::Running { last_measurement } => {
                let mut integral = self.integral + f64::from(self.gains.ki) * error;
                if let Some(max) = self.max_integral {
                    integral = integral.clamp(-f64::from(max), f64::from(max));
                }
                let derivative = f64::from(measurement) - f64::from(last_measurement);
                (integral, p + integral - f64::from(self.gains.kd) * derivative)
            }
        };
        let output = match self.max_output {
            Some(max) => output.clamp(-f64::from(max), f64::from(max)),
            None => output,
        };

        let (narrow_integral, narrow_output) = (integral as f32, output as f32);
        if !narrow_integral.is_finite() || !narrow_output.is_finite() {
            log::warn!("step overflowed: integral {integral}, output {output}");
            return Err(PIDError::Overflow {
                integral: narrow_integral,
                output: narrow_output,
            });
        }

        if self.state == ControllerState::Uninitialized {
            log::debug!("initialized at measurement {measurement}");
        }
        self.integral = integral;
        self.state = ControllerState::Running {
            last_measurement: measurement,
        };

        Ok(narrow_output)
    }

    /// Forget the integral and the last measurement. Gains and limits are kept.
    pub fn reset(&mut self) {
        log::debug!("reset");
        self.state = ControllerState::Uninitialized;
        self.integral = 0.0;
    }
}
