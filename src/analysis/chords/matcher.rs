//! Weighted cosine matching of chroma vectors against chord templates

use super::templates::ChordTemplateSet;
use crate::types::{PitchClass, NO_CHORD};
use std::sync::Arc;

/// Added to vector norms so an all-zero input normalizes to zero
const NORM_EPSILON: f64 = 1e-8;

/// Best (root, quality) pair for one chroma vector
#[derive(Debug, Clone, PartialEq)]
pub struct ChordMatch {
    /// "C", "Am", "G7", ... or "N"
    pub label: String,
    /// Weighted score clamped into [0, 1]
    pub confidence: f64,
    /// Unclamped weighted score used for ranking
    pub score: f64,
    pub root: Option<PitchClass>,
    pub quality: Option<&'static str>,
}

impl ChordMatch {
    fn no_chord() -> Self {
        Self {
            label: NO_CHORD.to_string(),
            confidence: 0.0,
            score: 0.0,
            root: None,
            quality: None,
        }
    }
}

/// Scores chroma vectors against every rotation of every template
#[derive(Debug, Clone)]
pub struct ChordTemplateMatcher {
    templates: Arc<ChordTemplateSet>,
    /// Unit-norm rotated masks, indexed `[root][template]`
    rotated: Vec<Vec<[f64; 12]>>,
}

impl ChordTemplateMatcher {
    pub fn new(templates: Arc<ChordTemplateSet>) -> Self {
        let rotated = (0..12)
            .map(|root| {
                templates
                    .iter()
                    .map(|t| normalize(&t.rotated(root)))
                    .collect()
            })
            .collect();
        Self { templates, rotated }
    }

    pub fn templates(&self) -> &ChordTemplateSet {
        &self.templates
    }

    /// Find the best chord for a 12-bin chroma vector of arbitrary scale.
    ///
    /// Roots are scanned C..B and templates in declaration order; a candidate
    /// replaces the current best only if it scores strictly higher, so ties
    /// keep the earliest candidate. Returns "N" when nothing scores above 0.
    pub fn match_vector(&self, chroma: &[f32; 12]) -> ChordMatch {
        let input = normalize(chroma);
        let mut best = ChordMatch::no_chord();

        for (root, masks) in self.rotated.iter().enumerate() {
            for (template, mask) in self.templates.iter().zip(masks.iter()) {
                let similarity: f64 = input.iter().zip(mask.iter()).map(|(a, b)| a * b).sum();
                let score = similarity * template.weight;

                if score > best.score {
                    let pitch = PitchClass::from_index(root);
                    best = ChordMatch {
                        label: template.label(pitch.to_standard_notation()),
                        confidence: score.clamp(0.0, 1.0),
                        score,
                        root: Some(pitch),
                        quality: Some(template.quality),
                    };
                }
            }
        }

        best
    }
}

impl Default for ChordTemplateMatcher {
    fn default() -> Self {
        Self::new(Arc::new(ChordTemplateSet::standard()))
    }
}

fn normalize(vector: &[f32; 12]) -> [f64; 12] {
    let norm = vector
        .iter()
        .map(|&v| (v as f64) * (v as f64))
        .sum::<f64>()
        .sqrt()
        + NORM_EPSILON;
    let mut out = [0.0f64; 12];
    for (o, &v) in out.iter_mut().zip(vector.iter()) {
        *o = v as f64 / norm;
    }
    out
}
