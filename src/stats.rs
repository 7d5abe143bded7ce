//! Statistical comparison of target frequencies against the random ensemble.

use crate::types::Label;
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;

/// Scores every label found in the target graph against its
/// relative-frequency samples across the random ensemble. Ensemble series are
/// expected to be zero-padded to `trials` entries.
pub struct MotifStats<'a> {
    target: &'a HashMap<Label, f64>,
    ensemble: &'a HashMap<Label, Vec<f64>>,
    trials: usize,
}

impl<'a> MotifStats<'a> {
    pub fn new(
        target: &'a HashMap<Label, f64>,
        ensemble: &'a HashMap<Label, Vec<f64>>,
        trials: usize,
    ) -> Self {
        MotifStats {
            target,
            ensemble,
            trials,
        }
    }

    /// Arithmetic mean of the label's random relative frequencies.
    pub fn mean(&self, label: &str) -> f64 {
        match self.ensemble.get(label) {
            Some(series) if self.trials > 0 => {
                series.iter().sum::<f64>() / self.trials as f64
            }
            _ => 0.0,
        }
    }

    /// Sample standard deviation (Bessel-corrected) of the label's random
    /// relative frequencies.
    pub fn std_dev(&self, label: &str) -> f64 {
        let series = match self.ensemble.get(label) {
            Some(series) if self.trials > 1 => series,
            _ => return 0.0,
        };
        let mean = self.mean(label);
        let variance = series
            .iter()
            .map(|freq| (freq - mean).powi(2))
            .sum::<f64>()
            / (self.trials - 1) as f64;
        variance.sqrt()
    }

    /// Standard score of the target frequency against the ensemble, 0 when
    /// the ensemble shows no variance.
    pub fn z_score(&self, label: &str) -> f64 {
        let std_dev = self.std_dev(label);
        if std_dev == 0.0 {
            return 0.0;
        }
        let target = self.target.get(label).copied().unwrap_or(0.0);
        (target - self.mean(label)) / std_dev
    }

    /// Fraction of random trials whose relative frequency strictly exceeds
    /// the target's. A label no random trial ever produced scores 0.0 (the
    /// strongest motif signal); a label absent from the target scores 1.0.
    pub fn p_value(&self, label: &str) -> f64 {
        let series = match self.ensemble.get(label) {
            Some(series) => series,
            None => return 0.0,
        };
        let target = match self.target.get(label) {
            Some(&freq) => freq,
            None => return 1.0,
        };
        if self.trials == 0 {
            return 0.0;
        }
        let above = series.iter().filter(|&&freq| freq > target).count();
        above as f64 / self.trials as f64
    }

    pub fn z_scores(&self) -> HashMap<Label, f64> {
        self.all_labels()
            .into_par_iter()
            .map(|label| (label.clone(), self.z_score(label)))
            .collect()
    }

    pub fn p_values(&self) -> HashMap<Label, f64> {
        self.all_labels()
            .into_par_iter()
            .map(|label| (label.clone(), self.p_value(label)))
            .collect()
    }

    fn all_labels(&self) -> Vec<&Label> {
        let mut labels: Vec<&Label> = self.ensemble.keys().collect();
        labels.extend(
            self.target
                .keys()
                .filter(|label| !self.ensemble.contains_key(*label)),
        );
        labels
    }
}

impl fmt::Display for MotifStats<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Label\tRelFreq%\tMean%\tStdDev\tZ-Score\tP-Value")?;
        for label in self.target.keys().sorted() {
            writeln!(
                f,
                "{}\t{:.4}\t{:.4}\t{:.6}\t{:.4}\t{:.4}",
                label,
                self.target[label] * 100.0,
                self.mean(label) * 100.0,
                self.std_dev(label),
                self.z_score(label),
                self.p_value(label)
            )?;
        }
        Ok(())
    }
}
