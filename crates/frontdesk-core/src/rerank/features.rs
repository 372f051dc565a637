//! Rerank feature extraction
//!
//! Pure, deterministic functions of (query, candidate); no I/O. The
//! schema is fixed: the model artifact is trained against exactly these
//! columns in exactly this order.

/// Width of the feature schema
pub const FEATURE_DIM: usize = 7;

/// Fixed-schema reranker input
pub type FeatureVector = [f32; FEATURE_DIM];

/// How much of the document the fuzzy ratio looks at
const FUZZY_PREFIX_CHARS: usize = 500;

/// Query-side words that signal a price question; document side matches
/// the currency marker. The knowledge base is Indonesian/English mixed.
const PRICE_KEYWORDS: [&str; 4] = ["harga", "biaya", "price", "rp"];

/// Extract the feature vector for one candidate
pub fn extract(query: &str, text: &str, title: &str, vector_score: f32) -> FeatureVector {
    let q = query.to_lowercase();
    let d = text.to_lowercase();
    let t = title.to_lowercase();

    [
        vector_score,
        d.chars().count() as f32,
        q.chars().count() as f32,
        word_overlap(&q, &d),
        title_similarity(&q, &t),
        fuzzy_ratio(&q, &d),
        price_relevance(&q, &d),
    ]
}

/// Intersection-over-query-size of word tokens, 0.0..=1.0
fn word_overlap(query: &str, doc: &str) -> f32 {
    let q_tokens: std::collections::BTreeSet<&str> = query.split_whitespace().collect();
    if q_tokens.is_empty() {
        return 0.0;
    }
    let d_tokens: std::collections::BTreeSet<&str> = doc.split_whitespace().collect();
    q_tokens.intersection(&d_tokens).count() as f32 / q_tokens.len() as f32
}

/// Similarity of the query against the document heading, scaled 0..=100
fn title_similarity(query: &str, title: &str) -> f32 {
    if title.is_empty() {
        return 0.0;
    }
    if title.contains(query) {
        return 100.0;
    }
    (strsim::jaro_winkler(query, title) * 100.0) as f32
}

/// Edit-distance similarity over the document's leading text, 0..=100
fn fuzzy_ratio(query: &str, doc: &str) -> f32 {
    let prefix: String = doc.chars().take(FUZZY_PREFIX_CHARS).collect();
    (strsim::normalized_levenshtein(query, &prefix) * 100.0) as f32
}

/// 1.0 when the query asks about prices and the document carries a
/// currency marker, else 0.0
fn price_relevance(query: &str, doc: &str) -> f32 {
    let is_price_query = PRICE_KEYWORDS.iter().any(|w| query.contains(w));
    let has_price_info = doc.contains("rp ") || doc.contains("rp.") || doc.contains("rp,");
    if is_price_query && has_price_info {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_is_deterministic() {
        let a = extract("harga facial", "Facial glow start Rp. 250.000", "Facial", 0.87);
        let b = extract("harga facial", "Facial glow start Rp. 250.000", "Facial", 0.87);
        assert_eq!(a, b);
        assert_eq!(a.len(), FEATURE_DIM);
    }

    #[test]
    fn vector_score_passes_through() {
        let features = extract("q", "doc", "t", 0.42);
        assert_eq!(features[0], 0.42);
    }

    #[test]
    fn word_overlap_counts_query_tokens() {
        assert_eq!(word_overlap("facial price", "our facial menu"), 0.5);
        assert_eq!(word_overlap("", "anything"), 0.0);
        assert_eq!(word_overlap("a b", "a b c"), 1.0);
    }

    #[test]
    fn price_heuristic_needs_both_sides() {
        assert_eq!(price_relevance("harga facial", "mulai rp. 250.000"), 1.0);
        assert_eq!(price_relevance("harga facial", "no numbers here"), 0.0);
        assert_eq!(price_relevance("opening hours", "mulai rp. 250.000"), 0.0);
    }

    #[test]
    fn title_containment_maxes_out() {
        assert_eq!(title_similarity("facial", "facial treatments"), 100.0);
        assert_eq!(title_similarity("facial", ""), 0.0);
    }

    #[test]
    fn fuzzy_ratio_is_bounded() {
        let long_doc = "x".repeat(10_000);
        let ratio = fuzzy_ratio("short query", &long_doc);
        assert!((0.0..=100.0).contains(&ratio));
    }
}
