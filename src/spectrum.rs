//! K-mer spectrum: how many distinct canonical k-mers were seen at each count.
//!
//! Following KmerGenie, a spectrum is modelled as a Pareto law of erroneous
//! k-mers plus Gaussians of true and repeated ones; [`ThresholdMethod`] picks
//! a count that removes most of the former and keeps most of the latter.

use std::collections::BTreeMap;
use std::io::Write;
use std::str::FromStr;

use crate::counter::{Count, Counter};
use crate::encode::canonical_values;
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThresholdMethod {
    /// First local minimum, taken as the Pareto/Gaussian intersection.
    FirstMinimum,
    /// First count whose share of the cumulative k-mer mass falls below `param`.
    Rarefaction,
    /// Remove at most `param` (0..1) of the k-mer mass.
    PercentAtMost,
    /// Remove at least `param` (0..1) of the k-mer mass.
    PercentAtLeast,
}

impl FromStr for ThresholdMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first-minimum" | "first_minimum" => Ok(ThresholdMethod::FirstMinimum),
            "rarefaction" => Ok(ThresholdMethod::Rarefaction),
            "percent-at-most" | "percent_at_most" => Ok(ThresholdMethod::PercentAtMost),
            "percent-at-least" | "percent_at_least" => Ok(ThresholdMethod::PercentAtLeast),
            other => Err(Error::Parse(format!("unknown threshold method {other:?}"))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Spectrum {
    data: BTreeMap<Count, u64>,
}

impl Spectrum {
    /// Histogram of the nonzero counts of `counter`.
    pub fn from_counter(counter: &Counter) -> Self {
        let mut data = BTreeMap::new();
        for value in canonical_values(counter.k()) {
            let count = counter.get(value);
            if count != 0 {
                *data.entry(count).or_insert(0u64) += 1;
            }
        }
        Self { data }
    }

    /// Number of distinct k-mers seen exactly `count` times.
    pub fn frequency(&self, count: Count) -> u64 {
        self.data.get(&count).copied().unwrap_or(0)
    }

    /// Number of distinct observed counts.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Observed `(count, frequency)` pairs, ascending.
    pub fn iter(&self) -> impl Iterator<Item = (Count, u64)> + '_ {
        self.data.iter().map(|(&c, &f)| (c, f))
    }

    /// Every count from 1 to the largest observed one, gaps included.
    fn dense(&self) -> impl Iterator<Item = (Count, u64)> + '_ {
        let max = self.data.keys().next_back().copied().unwrap_or(0);
        (1..=max).map(|c| (c, self.frequency(c)))
    }

    pub fn get_threshold(&self, method: ThresholdMethod, param: f64) -> Option<Count> {
        match method {
            ThresholdMethod::FirstMinimum => self.first_minimum(),
            ThresholdMethod::Rarefaction => self.rarefaction(param),
            ThresholdMethod::PercentAtMost => self.percent_at_most(param),
            ThresholdMethod::PercentAtLeast => self.percent_at_least(param),
        }
    }

    fn first_minimum(&self) -> Option<Count> {
        let mut prev: Option<(Count, u64)> = None;
        for (c, f) in self.dense() {
            if let Some((pc, pf)) = prev {
                if f > pf {
                    return Some(pc);
                }
            }
            prev = Some((c, f));
        }
        None
    }

    fn rarefaction(&self, limit: f64) -> Option<Count> {
        let mut cumulative = 0u64;
        for (c, f) in self.dense() {
            cumulative += c as u64 * f;
            if cumulative != 0 && (f as f64 / cumulative as f64) < limit {
                return Some(c);
            }
        }
        None
    }

    fn percent_at_most(&self, percent: f64) -> Option<Count> {
        self.percent_at_least(percent).map(|c| c.saturating_sub(1))
    }

    fn percent_at_least(&self, percent: f64) -> Option<Count> {
        let total: u64 = self.iter().map(|(c, f)| c as u64 * f).sum();
        if total == 0 {
            return None;
        }
        let mut cumulative = 0u64;
        for (c, f) in self.iter() {
            cumulative += c as u64 * f;
            if (cumulative as f64 / total as f64) > percent {
                return Some(c);
            }
        }
        None
    }

    /// `count,frequency` rows for every observed count, ascending.
    pub fn write_csv<W: Write>(&self, w: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(w);
        for (count, freq) in self.iter() {
            writer.write_record([count.to_string(), freq.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }
}
