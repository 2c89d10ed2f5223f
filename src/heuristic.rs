//! Document-size heuristics.
//!
//! A document's total character count places it in one of three
//! [`SizeBand`]s. Each band fixes a recommended model and the passage
//! segmentation parameters used during ingestion.
//!
//! | Band | Characters | Model | Segment | Overlap |
//! |------|-----------|-------|---------|---------|
//! | Small | `< 10_000` | `nomic-embed-text` | 400 | 250 (62.5%) |
//! | Medium | `10_000..50_000` | `gemma2:9b` | 500 | 300 (60%) |
//! | Large | `>= 50_000` | `gemma2:27b` | 600 | 360 (60%) |
//!
//! Passages are short with heavy overlap: recall over the whole source
//! text is favoured over index size and retrieval precision. The small band
//! uses a higher ratio because its absolute segment length is shortest.

/// Upper bound (exclusive) of the small band, in characters.
pub const SMALL_BAND_LIMIT: usize = 10_000;
/// Upper bound (exclusive) of the medium band, in characters.
pub const MEDIUM_BAND_LIMIT: usize = 50_000;

/// Document size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBand {
    Small,
    Medium,
    Large,
}

impl SizeBand {
    pub fn for_chars(total_chars: usize) -> Self {
        if total_chars < SMALL_BAND_LIMIT {
            SizeBand::Small
        } else if total_chars < MEDIUM_BAND_LIMIT {
            SizeBand::Medium
        } else {
            SizeBand::Large
        }
    }

    /// Catalog identifier preferred for documents in this band.
    pub fn recommended_model(self) -> &'static str {
        match self {
            SizeBand::Small => "nomic-embed-text",
            SizeBand::Medium => "gemma2:9b",
            SizeBand::Large => "gemma2:27b",
        }
    }

    /// `(segment_length, overlap_length)` in characters.
    pub fn segment_and_overlap(self) -> (usize, usize) {
        match self {
            SizeBand::Small => (400, 250),
            SizeBand::Medium => (500, 300),
            SizeBand::Large => (600, 360),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizeBand::Small => "small",
            SizeBand::Medium => "medium",
            SizeBand::Large => "large",
        }
    }
}

/// How a document's text is cut into passages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationParameters {
    /// Target maximum passage length in characters.
    pub segment_length: usize,
    /// Characters shared between consecutive passages. Always `< segment_length`.
    pub overlap_length: usize,
    /// Human-readable summary for display.
    pub description: String,
}

impl SegmentationParameters {
    /// Overlap as a fraction of the segment length.
    pub fn overlap_ratio(&self) -> f64 {
        self.overlap_length as f64 / self.segment_length as f64
    }
}

/// Recommended catalog identifier for a document of `total_chars` characters.
pub fn recommend_model(total_chars: usize) -> &'static str {
    SizeBand::for_chars(total_chars).recommended_model()
}

/// Segmentation parameters for a document of the given size.
pub fn segmentation_for(total_chars: usize, page_count: usize) -> SegmentationParameters {
    let band = SizeBand::for_chars(total_chars);
    let (segment_length, overlap_length) = band.segment_and_overlap();
    let percent = overlap_length as f64 * 100.0 / segment_length as f64;
    SegmentationParameters {
        segment_length,
        overlap_length,
        description: format!(
            "{} document ({} {}) - segment: {}, overlap: {} ({}%)",
            band.as_str(),
            page_count,
            if page_count == 1 { "page" } else { "pages" },
            segment_length,
            overlap_length,
            trim_percent(percent)
        ),
    }
}

/// `62.5` stays `62.5`, `60.0` becomes `60`.
fn trim_percent(p: f64) -> String {
    let s = format!("{:.1}", p);
    s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn small_band() {
        for n in [0, 1, 5_000, 9_999] {
            let p = segmentation_for(n, 1);
            assert_eq!((p.segment_length, p.overlap_length), (400, 250), "n={}", n);
        }
        assert!((segmentation_for(0, 0).overlap_ratio() - 0.625).abs() < 1e-9);
    }

    #[test]
    fn medium_band() {
        for n in [10_000, 10_001, 25_000, 49_999] {
            let p = segmentation_for(n, 3);
            assert_eq!((p.segment_length, p.overlap_length), (500, 300), "n={}", n);
            assert!((p.overlap_ratio() - 0.60).abs() < 1e-9);
        }
    }

    #[test]
    fn large_band() {
        for n in [50_000, 50_001, 1_000_000, usize::MAX] {
            let p = segmentation_for(n, 100);
            assert_eq!((p.segment_length, p.overlap_length), (600, 360), "n={}", n);
            assert!((p.overlap_ratio() - 0.60).abs() < 1e-9);
        }
    }

    #[test]
    fn overlap_always_below_segment() {
        for n in [0, 9_999, 10_000, 49_999, 50_000, usize::MAX] {
            let p = segmentation_for(n, 1);
            assert!(p.segment_length > 0);
            assert!(p.overlap_length < p.segment_length);
        }
    }

    #[test]
    fn recommendations_are_catalog_entries() {
        for n in [0, 9_999, 10_000, 49_999, 50_000, 10_000_000] {
            let id = recommend_model(n);
            assert!(catalog::resolve(id).is_ok(), "{} not in catalog", id);
        }
    }

    #[test]
    fn recommendations_differ_per_band() {
        assert_eq!(recommend_model(9_999), "nomic-embed-text");
        assert_eq!(recommend_model(10_000), "gemma2:9b");
        assert_eq!(recommend_model(50_000), "gemma2:27b");
    }

    #[test]
    fn description_mentions_pages_and_ratio() {
        let small = segmentation_for(8_000, 3);
        assert_eq!(
            small.description,
            "small document (3 pages) - segment: 400, overlap: 250 (62.5%)"
        );
        let large = segmentation_for(60_000, 1);
        assert_eq!(
            large.description,
            "large document (1 page) - segment: 600, overlap: 360 (60%)"
        );
    }

    #[test]
    fn deterministic() {
        assert_eq!(segmentation_for(12_345, 7), segmentation_for(12_345, 7));
    }
}
