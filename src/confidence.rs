//! Evidence accumulation over candidate bearings.
//!
//! One vote counter per configured candidate. Each tick with a fixation
//! bearing votes for every candidate within the angular tolerance, so
//! closely spaced candidates can share a vote. When the window closes the
//! counts become proportions and the maximal candidates are reported
//! together.

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::fmt;

use crate::angle::Angle;

/// One of the known object locations the subject may be thinking of.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
    pub bearing: Angle,
    /// Elevation to look at when presenting the candidate.
    pub pitch: Option<Angle>,
    pub label: Option<String>,
}

impl Candidate {
    pub fn new(bearing: Angle) -> Self {
        Self {
            bearing,
            pitch: None,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_pitch(mut self, pitch: Angle) -> Self {
        self.pitch = Some(pitch);
        self
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} at {}", label, self.bearing),
            None => write!(f, "object at {}", self.bearing),
        }
    }
}

#[derive(Clone, Debug)]
struct Entry {
    candidate: Candidate,
    votes: u64,
}

/// Vote counts for a fixed candidate set. Entries keep configuration order.
#[derive(Clone, Debug)]
pub struct ConfidenceTable {
    entries: Vec<Entry>,
    tolerance: Angle,
    ticks: u64,
    fixations: u64,
}

impl ConfidenceTable {
    /// Fails on an empty candidate set, duplicate bearings, or a tolerance
    /// that is not a positive finite angle.
    pub fn new(candidates: Vec<Candidate>, tolerance: Angle) -> Result<Self> {
        if candidates.is_empty() {
            return Err(anyhow!("at least one candidate is required"));
        }
        if !tolerance.is_finite() || tolerance <= Angle::ZERO {
            return Err(anyhow!("angle tolerance must be > 0, got {}", tolerance));
        }
        for (i, candidate) in candidates.iter().enumerate() {
            if !candidate.bearing.is_finite() {
                return Err(anyhow!("candidate {} has a non-finite bearing", i));
            }
            if let Some(other) = candidates[..i]
                .iter()
                .find(|other| other.bearing.distance_to(candidate.bearing) == Angle::ZERO)
            {
                return Err(anyhow!(
                    "duplicate candidate bearing {} ({} / {})",
                    candidate.bearing,
                    other,
                    candidate
                ));
            }
        }
        Ok(Self {
            entries: candidates
                .into_iter()
                .map(|candidate| Entry { candidate, votes: 0 })
                .collect(),
            tolerance,
            ticks: 0,
            fixations: 0,
        })
    }

    pub fn tolerance(&self) -> Angle {
        self.tolerance
    }

    /// Record one sampling tick. `None` (no fixation) only counts the tick.
    /// Returns how many candidates received a vote.
    pub fn record_tick(&mut self, bearing: Option<Angle>) -> usize {
        self.ticks += 1;
        let Some(bearing) = bearing else {
            return 0;
        };
        self.fixations += 1;
        let mut voted = 0;
        for entry in &mut self.entries {
            if entry.candidate.bearing.distance_to(bearing) <= self.tolerance {
                entry.votes += 1;
                voted += 1;
            }
        }
        voted
    }

    pub fn votes(&self) -> impl Iterator<Item = (&Candidate, u64)> + '_ {
        self.entries.iter().map(|entry| (&entry.candidate, entry.votes))
    }

    pub fn total_votes(&self) -> u64 {
        self.entries.iter().map(|entry| entry.votes).sum()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks that produced a fixation bearing.
    pub fn fixations(&self) -> u64 {
        self.fixations
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close the window. Counts become proportions summing to 1; with no
    /// votes at all they are left as they are.
    pub fn normalize(self) -> NormalizedTable {
        let total = self.total_votes();
        let entries = self
            .entries
            .into_iter()
            .map(|entry| {
                let value = if total == 0 {
                    entry.votes as f64
                } else {
                    entry.votes as f64 / total as f64
                };
                NormalizedEntry {
                    candidate: entry.candidate,
                    votes: entry.votes,
                    value,
                }
            })
            .collect();
        NormalizedTable {
            entries,
            total,
            ticks: self.ticks,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct NormalizedEntry {
    candidate: Candidate,
    votes: u64,
    value: f64,
}

/// Final table of a session.
#[derive(Clone, Debug, Serialize)]
pub struct NormalizedTable {
    entries: Vec<NormalizedEntry>,
    total: u64,
    ticks: u64,
}

impl NormalizedTable {
    /// `(candidate, value)` in configuration order.
    pub fn values(&self) -> impl Iterator<Item = (&Candidate, f64)> + '_ {
        self.entries
            .iter()
            .map(|entry| (&entry.candidate, entry.value))
    }

    /// Raw counts the proportions were computed from.
    pub fn votes(&self) -> impl Iterator<Item = (&Candidate, u64)> + '_ {
        self.entries
            .iter()
            .map(|entry| (&entry.candidate, entry.votes))
    }

    pub fn total_votes(&self) -> u64 {
        self.total
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn has_evidence(&self) -> bool {
        self.total > 0
    }

    /// Every candidate whose value equals the table maximum, in
    /// configuration order. Ties are all reported.
    pub fn winners(&self) -> Vec<&Candidate> {
        let max = self.entries.iter().map(|entry| entry.votes).max().unwrap_or(0);
        self.entries
            .iter()
            .filter(|entry| entry.votes == max)
            .map(|entry| &entry.candidate)
            .collect()
    }

    pub fn verdict(&self) -> Verdict {
        if !self.has_evidence() {
            return Verdict::NoEvidence;
        }
        let max = self.entries.iter().map(|entry| entry.votes).max().unwrap_or(0);
        Verdict::Guess(
            self.entries
                .iter()
                .filter(|entry| entry.votes == max)
                .map(|entry| Winner {
                    candidate: entry.candidate.clone(),
                    confidence: entry.value,
                    votes: entry.votes,
                })
                .collect(),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Winner {
    pub candidate: Candidate,
    /// Share of all votes, in `(0, 1]`.
    pub confidence: f64,
    pub votes: u64,
}

/// Outcome of an observation window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Verdict {
    /// Not a single vote was cast.
    NoEvidence,
    /// The maximal candidates, tied ones included.
    Guess(Vec<Winner>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(bearings_deg: &[f64], tolerance_deg: f64) -> ConfidenceTable {
        let candidates = bearings_deg
            .iter()
            .map(|&d| Candidate::new(Angle::from_degrees(d)))
            .collect();
        ConfidenceTable::new(candidates, Angle::from_degrees(tolerance_deg)).expect("table")
    }

    fn tick_deg(table: &mut ConfidenceTable, bearing_deg: f64) -> usize {
        table.record_tick(Some(Angle::from_degrees(bearing_deg)))
    }

    fn counts(table: &ConfidenceTable) -> Vec<u64> {
        table.votes().map(|(_, votes)| votes).collect()
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let mut t = table(&[0.0, 30.0], 15.0);
        assert_eq!(tick_deg(&mut t, 15.0), 2);
        assert_eq!(counts(&t), vec![1, 1]);
    }

    #[test]
    fn just_past_tolerance_does_not_vote() {
        let mut t = table(&[0.0, 30.0], 15.0);
        // 15.0001 is outside 0 +/- 15 but still 14.9999 from 30
        assert_eq!(tick_deg(&mut t, 15.0001), 1);
        assert_eq!(counts(&t), vec![0, 1]);

        let mut t = table(&[0.0], 15.0);
        assert_eq!(tick_deg(&mut t, 15.0001), 0);
        assert_eq!(tick_deg(&mut t, -15.0001), 0);
    }

    #[test]
    fn no_fixation_is_a_noop() {
        let mut t = table(&[0.0, 10.0], 15.0);
        assert_eq!(t.record_tick(None), 0);
        assert_eq!(t.total_votes(), 0);
        assert_eq!(t.ticks(), 1);
        assert_eq!(t.fixations(), 0);
    }

    #[test]
    fn tolerance_wraps_around_the_back() {
        let mut t = table(&[175.0], 15.0);
        assert_eq!(tick_deg(&mut t, -178.0), 1);
    }

    #[test]
    fn normalized_values_sum_to_one() {
        let mut t = table(&[-20.0, 0.0, 25.0], 10.0);
        for bearing in [-18.0, 2.0, 3.0, 24.0, 4.0, -5.0] {
            tick_deg(&mut t, bearing);
        }
        let n = t.normalize();
        let sum: f64 = n.values().map(|(_, value)| value).sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(n.values().all(|(_, value)| (0.0..=1.0).contains(&value)));
    }

    #[test]
    fn zero_votes_leave_table_unchanged() {
        let mut t = table(&[-20.0, 0.0, 25.0], 10.0);
        tick_deg(&mut t, 90.0);
        let n = t.normalize();
        assert!(!n.has_evidence());
        assert!(n.values().all(|(_, value)| value == 0.0));
        assert_eq!(n.verdict(), Verdict::NoEvidence);
    }

    #[test]
    fn ties_are_reported_together() {
        let mut t = table(&[-40.0, 0.0, 40.0], 5.0);
        tick_deg(&mut t, -40.0);
        tick_deg(&mut t, 40.0);
        let n = t.normalize();
        let winners: Vec<f64> = n.winners().iter().map(|c| c.bearing.degrees()).collect();
        assert_eq!(winners.len(), 2);
        assert!((winners[0] + 40.0).abs() < 1e-9);
        assert!((winners[1] - 40.0).abs() < 1e-9);
    }

    #[test]
    fn overlapping_candidates_scenario() {
        let mut t = table(&[-30.0, -10.0, -9.0, 15.0, 40.0], 15.0);
        for bearing in [-9.0, -8.0, -9.0, 16.0, 16.0] {
            tick_deg(&mut t, bearing);
        }
        assert_eq!(counts(&t), vec![0, 3, 3, 2, 0]);

        let n = t.normalize();
        let values: Vec<f64> = n.values().map(|(_, value)| value).collect();
        assert!((values[1] - 0.375).abs() < 1e-12);
        assert!((values[3] - 0.25).abs() < 1e-12);
        assert!((values.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        let Verdict::Guess(winners) = n.verdict() else {
            panic!("expected a guess");
        };
        let bearings: Vec<f64> = winners
            .iter()
            .map(|w| w.candidate.bearing.degrees().round())
            .collect();
        assert_eq!(bearings, vec![-10.0, -9.0]);
        assert!(winners.iter().all(|w| w.votes == 3));
    }

    #[test]
    fn rejects_bad_candidate_sets() {
        assert!(ConfidenceTable::new(vec![], Angle::from_degrees(15.0)).is_err());
        let dup = vec![
            Candidate::new(Angle::from_degrees(10.0)),
            Candidate::new(Angle::from_degrees(10.0)).with_label("mug"),
        ];
        assert!(ConfidenceTable::new(dup, Angle::from_degrees(15.0)).is_err());
        let one = vec![Candidate::new(Angle::ZERO)];
        assert!(ConfidenceTable::new(one, Angle::ZERO).is_err());
    }

    #[test]
    fn candidate_display_prefers_label() {
        let c = Candidate::new(Angle::from_degrees(20.0)).with_label("green mug");
        assert_eq!(c.to_string(), "green mug at 20.0°");
        assert_eq!(Candidate::new(Angle::ZERO).to_string(), "object at 0.0°");
    }
}
