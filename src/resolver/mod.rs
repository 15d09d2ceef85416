mod normalize;
mod tfidf;

pub use normalize::{char_ngrams, normalize, tokens};
pub use tfidf::TfIdfIndex;

use log::debug;
use serde::Serialize;
use std::cmp::Ordering;

use crate::config::VenueRegistry;

/// A candidate venue for a piece of free text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueMatch {
    pub venue_id: String,
    pub name: String,
    pub score: f64,
}

/// Maps free-text venue names to registry ids by character n-gram similarity.
///
/// Every display name and alias is a separate document; a venue scores as
/// its best-matching document.
#[derive(Debug, Clone)]
pub struct VenueResolver {
    names: Vec<(String, String)>,
    index: TfIdfIndex,
}

impl VenueResolver {
    /// `names` holds (venue id, name) pairs
    pub fn new(names: Vec<(String, String)>) -> Self {
        let documents: Vec<String> = names.iter().map(|(_, name)| name.clone()).collect();
        let index = TfIdfIndex::build(&documents);
        Self { names, index }
    }

    pub fn from_registry(registry: &VenueRegistry) -> Self {
        Self::new(registry.name_table())
    }

    /// Best venue scoring at least `threshold`
    pub fn resolve(&self, text: &str, threshold: f64) -> Option<VenueMatch> {
        let best = self.rank(text, 1).into_iter().next()?;
        if best.score >= threshold {
            Some(best)
        } else {
            debug!("No venue for {:?}: best was {} at {:.3}", text, best.venue_id, best.score);
            None
        }
    }

    /// Up to `top` venues by descending score, one entry per venue
    pub fn rank(&self, text: &str, top: usize) -> Vec<VenueMatch> {
        let scores = self.index.scores(text);
        let mut matches: Vec<VenueMatch> = self
            .names
            .iter()
            .zip(scores.iter())
            .map(|((venue_id, name), &score)| VenueMatch {
                venue_id: venue_id.clone(),
                name: name.clone(),
                score,
            })
            .collect();
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let mut ranked: Vec<VenueMatch> = Vec::new();
        for candidate in matches {
            if ranked.len() == top {
                break;
            }
            if !ranked.iter().any(|seen| seen.venue_id == candidate.venue_id) {
                ranked.push(candidate);
            }
        }
        ranked
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
