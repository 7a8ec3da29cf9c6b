//! Oxygen-toxicity exposure tracking.
//!
//! CNS loading follows the NOAA single-exposure limits, linearised per ppO2
//! band; pulmonary load uses the standard OTU power formula. Both integrate
//! over recorded segment time and are suppressed on simulated forks.

use crate::units::Time;

/// ppO2 below which no CNS or pulmonary load accrues (bar).
const PPO2_FLOOR: f64 = 0.5;

/// One ppO2 band of the NOAA CNS limit line: limit minutes = slope*ppO2 + intercept.
#[derive(Debug, Clone, Copy)]
pub struct CnsCoeffRow {
    pub ppo2_max: f64,
    pub slope: f64,
    pub intercept: f64,
}

/// NOAA CNS limit bands for ppO2 from 0.5 bar upwards. Exposures above the
/// last band reuse its coefficients.
pub const CNS_COEFFICIENTS: [CnsCoeffRow; 7] = [
    CnsCoeffRow { ppo2_max: 0.6, slope: -1800.0, intercept: 1800.0 },
    CnsCoeffRow { ppo2_max: 0.7, slope: -1500.0, intercept: 1620.0 },
    CnsCoeffRow { ppo2_max: 0.8, slope: -1200.0, intercept: 1410.0 },
    CnsCoeffRow { ppo2_max: 0.9, slope: -900.0, intercept: 1170.0 },
    CnsCoeffRow { ppo2_max: 1.1, slope: -600.0, intercept: 900.0 },
    CnsCoeffRow { ppo2_max: 1.5, slope: -300.0, intercept: 570.0 },
    CnsCoeffRow { ppo2_max: 1.65, slope: -750.0, intercept: 1245.0 },
];

/// Accumulated CNS and pulmonary oxygen-toxicity exposure.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OxTox {
    cns: f64,
    otu: f64,
}

impl OxTox {
    /// CNS loading as a percentage of the NOAA exposure clock.
    pub fn cns(&self) -> f64 {
        self.cns * 100.0
    }

    /// Accumulated oxygen tolerance units.
    pub fn otu(&self) -> f64 {
        self.otu
    }

    /// Integrate a segment breathed at `ppo2` for `time`.
    pub fn add_exposure(&mut self, ppo2: f64, time: Time) {
        let minutes = time.as_minutes();
        if ppo2 >= PPO2_FLOOR {
            let row = cns_row(ppo2);
            let limit = row.slope * ppo2 + row.intercept;
            // The limit line crosses zero just above 1.65 bar; there is no
            // finite clock to charge against beyond that point.
            if limit > 0.0 {
                self.cns += minutes / limit;
            }
        }
        if ppo2 > PPO2_FLOOR {
            self.otu += ((ppo2 - PPO2_FLOOR) / 0.5).powf(0.83) * minutes;
        }
    }
}

fn cns_row(ppo2: f64) -> &'static CnsCoeffRow {
    for row in &CNS_COEFFICIENTS {
        if ppo2 <= row.ppo2_max {
            return row;
        }
    }
    &CNS_COEFFICIENTS[CNS_COEFFICIENTS.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_load_below_floor() {
        let mut ox_tox = OxTox::default();
        ox_tox.add_exposure(0.21, Time::from_minutes(120.0));
        assert_eq!(ox_tox.cns(), 0.0);
        assert_eq!(ox_tox.otu(), 0.0);
    }

    #[test]
    fn test_cns_at_unit_ppo2() {
        // The NOAA limit at 1.0 bar is 300 minutes; 150 minutes spends half
        // the clock.
        let mut ox_tox = OxTox::default();
        ox_tox.add_exposure(1.0, Time::from_minutes(150.0));
        assert!(
            (ox_tox.cns() - 50.0).abs() < 1e-9,
            "expected 50% CNS, got {}",
            ox_tox.cns()
        );
    }

    #[test]
    fn test_cns_at_deco_ppo2() {
        // 45-minute limit at 1.6 bar.
        let mut ox_tox = OxTox::default();
        ox_tox.add_exposure(1.6, Time::from_minutes(45.0));
        assert!(
            (ox_tox.cns() - 100.0).abs() < 1e-9,
            "expected a spent clock, got {}",
            ox_tox.cns()
        );
    }

    #[test]
    fn test_extreme_ppo2_uses_last_band() {
        let row = cns_row(1.8);
        assert_eq!(row.slope, -750.0);
        assert_eq!(row.intercept, 1245.0);
    }

    #[test]
    fn test_otu_accumulation() {
        // At ppO2 = 1.0 the OTU rate is exactly 1 per minute.
        let mut ox_tox = OxTox::default();
        ox_tox.add_exposure(1.0, Time::from_minutes(30.0));
        assert!(
            (ox_tox.otu() - 30.0).abs() < 1e-9,
            "expected 30 OTU, got {}",
            ox_tox.otu()
        );
    }

    #[test]
    fn test_exposure_accumulates_across_segments() {
        let mut a = OxTox::default();
        a.add_exposure(1.2, Time::from_minutes(20.0));
        a.add_exposure(1.2, Time::from_minutes(20.0));

        let mut b = OxTox::default();
        b.add_exposure(1.2, Time::from_minutes(40.0));

        assert!((a.cns() - b.cns()).abs() < 1e-12);
        assert!((a.otu() - b.otu()).abs() < 1e-12);
    }
}
