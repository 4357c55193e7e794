use serde::Serialize;

use crate::emotion::normalize_label;

/// Per-label sample counts, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmotionTally {
    counts: Vec<(String, usize)>,
}

impl EmotionTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples<S: AsRef<str>>(samples: &[S]) -> Self {
        let mut tally = Self::new();
        for sample in samples {
            tally.record(sample.as_ref());
        }
        tally
    }

    pub fn record(&mut self, label: &str) {
        let label = normalize_label(label);
        match self.counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((label, 1)),
        }
    }

    pub fn count(&self, label: &str) -> usize {
        let label = normalize_label(label);
        self.counts
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn entries(&self) -> &[(String, usize)] {
        &self.counts
    }

    /// Most frequent label. Ties go to the label seen first.
    pub fn leader(&self) -> Option<&str> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.counts {
            // strict > keeps the earliest label on ties
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(label, _)| label.as_str())
    }
}

/// Majority vote over a session's emotion samples.
///
/// Returns `None` when no face was classified during the session.
pub fn dominant_emotion<S: AsRef<str>>(samples: &[S]) -> Option<String> {
    EmotionTally::from_samples(samples).leader().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sequence_has_no_dominant() {
        let samples: Vec<String> = Vec::new();
        assert_eq!(dominant_emotion(&samples), None);
    }

    #[test]
    fn test_single_sample() {
        assert_eq!(dominant_emotion(&["sad"]), Some("sad".to_string()));
    }

    #[test]
    fn test_most_frequent_wins() {
        let samples = ["happy", "sad", "happy", "neutral", "happy", "sad"];
        assert_eq!(dominant_emotion(&samples), Some("happy".to_string()));
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let samples = ["neutral", "fear", "fear", "neutral"];
        assert_eq!(dominant_emotion(&samples), Some("neutral".to_string()));
    }

    #[test]
    fn test_labels_are_normalized() {
        let samples = ["Happy", "happy ", "sad"];
        assert_eq!(dominant_emotion(&samples), Some("happy".to_string()));
    }

    #[test]
    fn test_winner_is_present_and_maximal() {
        let sequences: Vec<Vec<&str>> = vec![
            vec!["angry"],
            vec!["fear", "sad", "sad", "fear", "fear"],
            vec!["disgust", "happy", "neutral", "surprise"],
            vec!["contempt", "contempt", "happy"],
            vec!["sad", "happy", "sad", "happy", "angry", "angry", "angry"],
        ];

        for samples in sequences {
            let tally = EmotionTally::from_samples(&samples);
            let winner = dominant_emotion(&samples).expect("non-empty sequence");
            assert!(samples.contains(&winner.as_str()));
            for (label, count) in tally.entries() {
                assert!(
                    tally.count(&winner) >= *count,
                    "{} beat the winner {} in {:?}",
                    label,
                    winner,
                    samples
                );
            }
        }
    }

    #[test]
    fn test_tally_counts() {
        let tally = EmotionTally::from_samples(&["sad", "happy", "sad"]);
        assert_eq!(tally.count("sad"), 2);
        assert_eq!(tally.count("happy"), 1);
        assert_eq!(tally.count("fear"), 0);
        assert_eq!(tally.entries().len(), 2);
        assert_eq!(tally.entries()[0].0, "sad");
    }
}
