//! Chord quality templates
//!
//! A [`ChordTemplateSet`] is built once and shared immutably. Declaration
//! order is significant: when two (root, quality) candidates score exactly
//! the same, the one reached first wins, so the common qualities come first
//! and carry the highest weights.

/// A chord quality as a binary pitch-class mask rooted at C
#[derive(Debug, Clone, PartialEq)]
pub struct ChordTemplate {
    /// Quality key, e.g. "maj", "min", "7", "sus4"
    pub quality: &'static str,
    /// Pitch classes present when the root is C
    pub mask: [f32; 12],
    /// Multiplier applied to the cosine similarity
    pub weight: f64,
}

impl ChordTemplate {
    pub fn new(quality: &'static str, intervals: &[usize], weight: f64) -> Self {
        let mut mask = [0.0f32; 12];
        for &interval in intervals {
            mask[interval % 12] = 1.0;
        }
        Self {
            quality,
            mask,
            weight,
        }
    }

    /// Mask cyclically rotated so that bit 0 lands on `root`
    pub fn rotated(&self, root: usize) -> [f32; 12] {
        let mut out = [0.0f32; 12];
        for (i, &bit) in self.mask.iter().enumerate() {
            out[(i + root) % 12] = bit;
        }
        out
    }

    /// Format a chord label for this quality at `root_name`
    pub fn label(&self, root_name: &str) -> String {
        match self.quality {
            "maj" => root_name.to_string(),
            "min" => format!("{}m", root_name),
            other => format!("{}{}", root_name, other),
        }
    }
}

/// Ordered, immutable registry of chord templates
#[derive(Debug, Clone, PartialEq)]
pub struct ChordTemplateSet {
    templates: Vec<ChordTemplate>,
}

impl ChordTemplateSet {
    pub fn new(templates: Vec<ChordTemplate>) -> Self {
        Self { templates }
    }

    /// Triads and sevenths weighted toward major/minor
    pub fn standard() -> Self {
        Self::new(vec![
            ChordTemplate::new("maj", &[0, 4, 7], 1.15),
            ChordTemplate::new("min", &[0, 3, 7], 1.10),
            ChordTemplate::new("7", &[0, 4, 7, 10], 1.00),
            ChordTemplate::new("m7", &[0, 3, 7, 10], 0.95),
            ChordTemplate::new("maj7", &[0, 4, 7, 11], 0.90),
            ChordTemplate::new("sus4", &[0, 5, 7], 0.75),
            ChordTemplate::new("sus2", &[0, 2, 7], 0.75),
            ChordTemplate::new("dim", &[0, 3, 6], 0.70),
            ChordTemplate::new("aug", &[0, 4, 8], 0.70),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChordTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for ChordTemplateSet {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order_and_weights() {
        let set = ChordTemplateSet::standard();
        let qualities: Vec<&str> = set.iter().map(|t| t.quality).collect();
        assert_eq!(
            qualities,
            vec!["maj", "min", "7", "m7", "maj7", "sus4", "sus2", "dim", "aug"]
        );
        let weights: Vec<f64> = set.iter().map(|t| t.weight).collect();
        assert_eq!(weights[0], 1.15);
        assert_eq!(weights[8], 0.70);
    }

    #[test]
    fn test_rotation_moves_root() {
        let minor = ChordTemplate::new("min", &[0, 3, 7], 1.1);
        // A minor: A C E
        let a_minor = minor.rotated(9);
        let active: Vec<usize> = (0..12).filter(|&i| a_minor[i] > 0.0).collect();
        assert_eq!(active, vec![0, 4, 9]);
    }

    #[test]
    fn test_labels() {
        let set = ChordTemplateSet::standard();
        let labels: Vec<String> = set.iter().map(|t| t.label("F#")).collect();
        assert_eq!(labels[0], "F#");
        assert_eq!(labels[1], "F#m");
        assert_eq!(labels[2], "F#7");
        assert_eq!(labels[4], "F#maj7");
        assert_eq!(labels[7], "F#dim");
    }
}
