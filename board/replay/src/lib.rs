use pid::{PIDError, PID};

/// One recorded measurement and the output it is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub measurement: f32,
    pub expected: f32,
}

impl Sample {
    pub const fn new(measurement: f32, expected: f32) -> Self {
        Sample {
            measurement,
            expected,
        }
    }
}

/// Replay configuration
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Target held constant for the whole replay
    pub setpoint: f32,
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Samples in the order they are fed to the controller
    pub samples: Vec<Sample>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            setpoint: 0.34,
            kp: 850.0,
            ki: 0.5,
            kd: 2.0,
            samples: vec![
                Sample::new(0.4, 49.0),
                Sample::new(0.33, 58.0),
                Sample::new(0.3, 66.0),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayRecord {
    pub index: usize,
    pub measurement: f32,
    pub output: f32,
    pub expected: f32,
}

impl ReplayRecord {
    pub fn deviation(&self) -> f32 {
        self.output - self.expected
    }
}

/// Feed every sample through a fresh controller, one record per sample.
///
/// The first record carries the proportional-only output of the initializing step.
pub fn run(config: &ReplayConfig) -> Result<Vec<ReplayRecord>, PIDError> {
    let mut pid = PID::new(config.kp, config.ki, config.kd)?;
    log::info!(
        "replaying {} samples, setpoint {}, kp {}, ki {}, kd {}",
        config.samples.len(),
        config.setpoint,
        pid.kp(),
        pid.ki(),
        pid.kd()
    );

    config
        .samples
        .iter()
        .enumerate()
        .map(|(index, sample)| -> Result<ReplayRecord, PIDError> {
            let output = pid.step(config.setpoint, sample.measurement)?;
            log::debug!("sample {index}: integral {}", pid.integral());
            Ok(ReplayRecord {
                index,
                measurement: sample.measurement,
                output,
                expected: sample.expected,
            })
        })
        .collect()
}
