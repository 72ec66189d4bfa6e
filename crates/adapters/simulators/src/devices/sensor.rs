//! Simulated temperature sensor — publishes a random reading every period.

use rand::Rng;
use statehub_domain::id::DeviceId;

use crate::error::SimulatorError;

/// A temperature sensor drawing readings uniformly from `[min, max]`.
pub struct TemperatureSensor {
    device_id: DeviceId,
    min: f64,
    max: f64,
    last: Option<String>,
}

impl TemperatureSensor {
    /// # Errors
    ///
    /// Returns [`SimulatorError::EmptyRange`] when `min > max` or either
    /// bound is not finite.
    pub fn new(device_id: DeviceId, min: f64, max: f64) -> Result<Self, SimulatorError> {
        if !(min.is_finite() && max.is_finite() && min <= max) {
            return Err(SimulatorError::EmptyRange { min, max });
        }
        Ok(Self {
            device_id,
            min,
            max,
            last: None,
        })
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Take a new reading, formatted with one decimal.
    pub fn read<R: Rng>(&mut self, rng: &mut R) -> String {
        let value = rng.gen_range(self.min..=self.max);
        let reading = format!("{value:.1}");
        self.last = Some(reading.clone());
        reading
    }

    /// The last reading, taking one if none was published yet.
    pub fn current<R: Rng>(&mut self, rng: &mut R) -> String {
        match &self.last {
            Some(reading) => reading.clone(),
            None => self.read(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sensor(min: f64, max: f64) -> TemperatureSensor {
        TemperatureSensor::new(DeviceId::new("temp01").unwrap(), min, max).unwrap()
    }

    #[test]
    fn should_stay_within_range() {
        let mut sensor = sensor(19.0, 23.0);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let value: f64 = sensor.read(&mut rng).parse().unwrap();
            assert!((19.0..=23.0).contains(&value), "{value}");
        }
    }

    #[test]
    fn should_format_with_one_decimal() {
        let mut sensor = sensor(25.0, 25.0);
        assert_eq!(sensor.read(&mut StdRng::seed_from_u64(1)), "25.0");
    }

    #[test]
    fn should_answer_with_last_reading() {
        let mut sensor = sensor(10.0, 30.0);
        let mut rng = StdRng::seed_from_u64(3);
        let reading = sensor.read(&mut rng);

        assert_eq!(sensor.current(&mut rng), reading);
    }

    #[test]
    fn should_reject_inverted_range() {
        let result = TemperatureSensor::new(DeviceId::new("t").unwrap(), 5.0, 1.0);
        assert_eq!(
            result.err(),
            Some(SimulatorError::EmptyRange { min: 5.0, max: 1.0 })
        );
    }
}
