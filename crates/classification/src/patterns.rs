//! Lexical pattern tables for content classification.
//!
//! Compiled once per process. The vocabularies reflect the furniture and
//! surface-material catalogs this pipeline was built for; extending them
//! is a matter of adding entries, the matching logic does not change.

use once_cell::sync::Lazy;
use regex::Regex;

/// Table-of-contents cues.
pub static INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)table of contents|\bindex\b|signature book").unwrap());

/// Dotted leader lines ("Introduction ...... 3") typical of an index page.
pub static DOTTED_LEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{3,}\s*\d+").unwrap());

/// Sustainability and environmental cues.
pub static SUSTAINABILITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)sustainab|environment|recycl|eco-friendly|carbon[- ]neutral|biodegradable|responsible sourcing|sostenibilidad",
    )
    .unwrap()
});

/// Certification and compliance cues (grouped with sustainability unless
/// the text is a spec sheet).
pub static CERTIFICATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcertif|ce marked|iso\s*\d{4,5}|quality assurance").unwrap()
});

/// Technical specification cues.
pub static TECHNICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)technical specification|weight capacity|load capacity|resistance|ip\s?\d{2}\b|\brated\b|tolerances",
    )
    .unwrap()
});

/// Mood / inspiration / visual showcase cues.
pub static MOOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)mood\s?board|inspiration|lifestyle|ambian?ce|visual showcase|image gallery|photography",
    )
    .unwrap()
});

/// A run of consecutive uppercase tokens of three or more letters
/// (candidate product names: "VALENOVA", "ALT DESIGN").
pub static UPPERCASE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\p{Lu}{3,}(?:\s+\p{Lu}{3,})*\b").unwrap());

/// A short standalone all-caps line, also accepted as a product name.
pub static CAPS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{Lu}{2,}(?:\s+\p{Lu}{2,})*$").unwrap());

/// Two- or three-axis dimension expressions ("180×90×75 cm", "15x38").
pub static DIMENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d+(?:[.,]\d+)?)\s*[×x]\s*(\d+(?:[.,]\d+)?)(?:\s*[×x]\s*(\d+(?:[.,]\d+)?))?\s*(cm|mm|m)?\b",
    )
    .unwrap()
});

/// A single measurement with an explicit unit ("75 cm").
pub static SINGLE_DIMENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d+(?:[.,]\d+)?\s*(cm|mm)\b").unwrap());

/// Attribution after "by" / "designed by".
pub static ATTRIBUTION: Lazy<Regex> = Lazy::new(|| {
    // The marker word is case-insensitive but the attributed name itself
    // must start with an uppercase letter, so the flag stays local.
    Regex::new(r"\b(?:[Dd]esigned\s+[Bb]y|[Bb]y|BY)\s+(\p{Lu}[\w{}&.\- ]{2,40})").unwrap()
});

/// Studio names seen across the source catalogs.
pub static STUDIOS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ESTUDI\{H\}AC|DSIGNIO|ALT DESIGN|\bMUT\b|YONOH|Stacy Garcia(?: NY)?").unwrap()
});

/// Color vocabulary, matched case-insensitively on word boundaries.
pub static COLORS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(white|black|grey|gray|beige|sand|taupe|clay|terracotta|navy|mint|bordeaux|green|blue|red|brown|anthracite|cream|ivory|natural)\b",
    )
    .unwrap()
});

/// Material vocabulary, matched case-insensitively on word boundaries.
pub static MATERIALS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(ceramic|porcelain|stoneware|tile|wood|oak|walnut|ash|leather|fabric|linen|wool|velvet|aluminium|aluminum|steel|brass|glass|marble|stone|concrete|rattan)\b",
    )
    .unwrap()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_patterns() {
        assert!(INDEX.is_match("Table of Contents"));
        assert!(DOTTED_LEADER.is_match("Introduction ........... 3"));
        assert!(!INDEX.is_match("indexing performance"));
    }

    #[test]
    fn test_uppercase_run() {
        let m = UPPERCASE_RUN.find("The VALENOVA system").unwrap();
        assert_eq!(m.as_str(), "VALENOVA");
        let m = UPPERCASE_RUN.find("by ALT DESIGN studio").unwrap();
        assert_eq!(m.as_str(), "ALT DESIGN");
        assert!(!UPPERCASE_RUN.is_match("no caps here"));
    }

    #[test]
    fn test_dimension_patterns() {
        assert!(DIMENSION.is_match("Dimensions: 180×90×75 cm"));
        assert!(DIMENSION.is_match("15x38"));
        assert!(SINGLE_DIMENSION.is_match("height 75 cm"));
        assert!(!DIMENSION.is_match("page 12"));
    }

    #[test]
    fn test_attribution_pattern() {
        let caps = ATTRIBUTION.captures("designed by Maria Santos").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "Maria Santos");
        assert!(STUDIOS.is_match("a piece by ESTUDI{H}AC for the fair"));
    }
}
