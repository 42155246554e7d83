//! Structured field extraction for catalog entries.

use crate::patterns;
use serde::{Deserialize, Serialize};

/// A unit text shorter than this halves the quality score.
const SHORT_TEXT_LEN: usize = 100;
/// Minimum prose length for the "description present" quality component.
const DESCRIPTION_LEN: usize = 120;
/// Standalone all-caps lines longer than this are headers, not names.
const MAX_NAME_LINE_LEN: usize = 20;

/// Structured fields extracted from a catalog-entry text span.
///
/// Immutable after extraction; the association engine reads the name and
/// the classifier's quality score, nothing mutates these afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntryFields {
    /// Product name (a run of uppercase tokens).
    pub name: Option<String>,
    /// All dimension expressions, normalized to `N×M` / `N×M×K unit` form.
    pub dimensions: Vec<String>,
    /// Designer or studio attribution.
    pub attribution: Option<String>,
    /// Colors from the fixed vocabulary, lowercased, document order.
    pub colors: Vec<String>,
    /// Materials from the fixed vocabulary, lowercased, document order.
    pub materials: Vec<String>,
}

impl CatalogEntryFields {
    /// Extract all structured fields from a catalog-entry text.
    #[must_use]
    pub fn extract(text: &str) -> Self {
        Self {
            name: extract_name(text),
            dimensions: extract_dimensions(text),
            attribution: extract_attribution(text),
            colors: extract_vocab(&patterns::COLORS, text),
            materials: extract_vocab(&patterns::MATERIALS, text),
        }
    }

    /// Weighted quality score in [0, 1].
    ///
    /// Field weights: name 0.3, dimensions 0.25, attribution 0.2,
    /// description 0.15, colors 0.05, materials 0.05. Texts under 100
    /// characters are halved. Adding a field never lowers the score.
    #[must_use]
    pub fn quality_score(&self, text: &str) -> f32 {
        let mut score = 0.0;
        if self.name.is_some() {
            score += 0.3;
        }
        if !self.dimensions.is_empty() {
            score += 0.25;
        }
        if self.attribution.is_some() {
            score += 0.2;
        }
        if text.chars().count() >= DESCRIPTION_LEN {
            score += 0.15;
        }
        if !self.colors.is_empty() {
            score += 0.05;
        }
        if !self.materials.is_empty() {
            score += 0.05;
        }
        if text.chars().count() < SHORT_TEXT_LEN {
            score *= 0.5;
        }
        score
    }
}

/// Product name: a standalone short all-caps line, or the first uppercase
/// run whose surrounding lines carry product context (dimensions or
/// attribution), or failing that the first uppercase run anywhere.
fn extract_name(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();

    for (i, line) in lines.iter().take(10).enumerate() {
        let trimmed = line.trim();
        if trimmed.len() <= MAX_NAME_LINE_LEN && patterns::CAPS_LINE.is_match(trimmed) {
            return Some(trimmed.to_string());
        }

        if let Some(m) = patterns::UPPERCASE_RUN.find(trimmed) {
            let context_end = (i + 3).min(lines.len());
            let context = lines[i..context_end].join("\n");
            if patterns::DIMENSION.is_match(&context)
                || patterns::SINGLE_DIMENSION.is_match(&context)
                || patterns::ATTRIBUTION.is_match(&context)
                || patterns::STUDIOS.is_match(&context)
            {
                return Some(m.as_str().to_string());
            }
        }
    }

    patterns::UPPERCASE_RUN
        .find(text)
        .map(|m| m.as_str().to_string())
}

fn extract_dimensions(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    // Spans already claimed by multi-axis matches; single measurements
    // inside them ("75 cm" in "180×90×75 cm") are not separate dimensions.
    let mut claimed: Vec<(usize, usize)> = Vec::new();

    for caps in patterns::DIMENSION.captures_iter(text) {
        let whole = caps.get(0).map(|m| (m.start(), m.end()));
        if let Some(span) = whole {
            claimed.push(span);
        }

        let a = &caps[1];
        let b = &caps[2];
        let mut dim = format!("{a}×{b}");
        if let Some(c) = caps.get(3) {
            dim.push('×');
            dim.push_str(c.as_str());
        }
        if let Some(unit) = caps.get(4) {
            dim.push(' ');
            dim.push_str(&unit.as_str().to_lowercase());
        }
        if !out.contains(&dim) {
            out.push(dim);
        }
    }

    for m in patterns::SINGLE_DIMENSION.find_iter(text) {
        let overlaps = claimed
            .iter()
            .any(|&(start, end)| m.start() < end && m.end() > start);
        if overlaps {
            continue;
        }
        let dim = m.as_str().to_lowercase();
        if !out.contains(&dim) {
            out.push(dim);
        }
    }

    out
}

fn extract_attribution(text: &str) -> Option<String> {
    if let Some(caps) = patterns::ATTRIBUTION.captures(text) {
        let name = caps[1].trim_end_matches(['.', ',', ' ']).to_string();
        return Some(name);
    }
    patterns::STUDIOS
        .find(text)
        .map(|m| m.as_str().to_string())
}

/// Matches against a fixed vocabulary, deduplicated, document order.
fn extract_vocab(vocab: &regex::Regex, text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for m in vocab.find_iter(text) {
        let token = m.as_str().to_lowercase();
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALENOVA: &str = "VALENOVA is a sophisticated modular seating system available in \
        multiple configurations. Features premium leather upholstery in black, brown, and \
        natural finishes. Dimensions: 180×90×75 cm. Designed by Maria Santos.";

    #[test]
    fn test_extract_name_from_context() {
        let fields = CatalogEntryFields::extract(VALENOVA);
        assert_eq!(fields.name.as_deref(), Some("VALENOVA"));
    }

    #[test]
    fn test_extract_name_standalone_line() {
        let text = "ONA\nElegant chair with solid wood construction.\n45×52 cm";
        let fields = CatalogEntryFields::extract(text);
        assert_eq!(fields.name.as_deref(), Some("ONA"));
    }

    #[test]
    fn test_extract_dimensions() {
        let fields = CatalogEntryFields::extract(VALENOVA);
        assert_eq!(fields.dimensions, vec!["180×90×75 cm"]);

        let fields = CatalogEntryFields::extract("Panels in 15x38 and 20x40, height 12 cm");
        assert_eq!(fields.dimensions, vec!["15×38", "20×40", "12 cm"]);
    }

    #[test]
    fn test_extract_attribution() {
        let fields = CatalogEntryFields::extract(VALENOVA);
        assert_eq!(fields.attribution.as_deref(), Some("Maria Santos"));

        let fields = CatalogEntryFields::extract("PIQUE collection\nESTUDI{H}AC, 2024. 20×40 cm");
        assert_eq!(fields.attribution.as_deref(), Some("ESTUDI{H}AC"));
    }

    #[test]
    fn test_extract_colors_and_materials() {
        let fields = CatalogEntryFields::extract(VALENOVA);
        assert_eq!(fields.colors, vec!["black", "brown", "natural"]);
        assert_eq!(fields.materials, vec!["leather"]);
    }

    #[test]
    fn test_quality_score_full_entry() {
        let fields = CatalogEntryFields::extract(VALENOVA);
        let q = fields.quality_score(VALENOVA);
        // name + dimensions + attribution + description + colors + materials
        assert!((q - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_quality_score_short_text_halved() {
        let text = "BEAT 12×45 cm";
        let fields = CatalogEntryFields::extract(text);
        let q = fields.quality_score(text);
        // (name 0.3 + dimensions 0.25) * 0.5
        assert!((q - 0.275).abs() < 1e-6);
    }

    #[test]
    fn test_quality_score_is_monotonic_in_fields() {
        let text = "A".repeat(150);
        let base = CatalogEntryFields::default();
        let base_q = base.quality_score(&text);

        let mut with_name = base.clone();
        with_name.name = Some("FOLD".to_string());
        assert!(with_name.quality_score(&text) > base_q);

        let mut with_dims = with_name.clone();
        with_dims.dimensions.push("30×60".to_string());
        assert!(with_dims.quality_score(&text) > with_name.quality_score(&text));

        let mut with_attr = with_dims.clone();
        with_attr.attribution = Some("SG NY".to_string());
        assert!(with_attr.quality_score(&text) > with_dims.quality_score(&text));
    }
}
