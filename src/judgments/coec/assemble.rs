use super::score::ScoredDocument;
use crate::model::{DocRating, Judgment};

/// Builds the judgment for one query, most relevant documents first. Equal
/// ratings keep their first-observed order. Returns `None` when nothing was
/// scored so that empty judgments are never emitted.
pub fn assemble_judgment(query: &str, mut scored: Vec<ScoredDocument>) -> Option<Judgment> {
    if scored.is_empty() {
        return None;
    }

    scored.sort_by(|left, right| right.rating.total_cmp(&left.rating));

    Some(Judgment {
        query: query.to_string(),
        ratings: scored
            .into_iter()
            .map(|document| DocRating {
                doc_id: document.document_id,
                rating: format_rating(document.rating),
            })
            .collect(),
    })
}

/// Shortest round-trip decimal text, always with a fractional part.
pub fn format_rating(rating: f64) -> String {
    let text = format!("{rating}");
    if text.contains('.') || !rating.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(document_id: &str, rating: f64) -> ScoredDocument {
        ScoredDocument {
            document_id: document_id.to_string(),
            rating,
        }
    }

    #[test]
    fn orders_by_descending_rating_with_stable_ties() {
        let judgment = assemble_judgment(
            "laptop",
            vec![
                scored("a", 0.5),
                scored("b", 2.0),
                scored("c", 0.5),
                scored("d", 1.25),
            ],
        )
        .expect("judgment should be produced");

        let order: Vec<(&str, &str)> = judgment
            .ratings
            .iter()
            .map(|rating| (rating.doc_id.as_str(), rating.rating.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("b", "2.0"), ("d", "1.25"), ("a", "0.5"), ("c", "0.5")]
        );
    }

    #[test]
    fn queries_without_scored_documents_are_omitted() {
        assert!(assemble_judgment("nothing", Vec::new()).is_none());
    }

    #[test]
    fn format_rating_always_has_a_fraction() {
        assert_eq!(format_rating(2.0), "2.0");
        assert_eq!(format_rating(0.0), "0.0");
        assert_eq!(format_rating(0.333), "0.333");
        assert_eq!(format_rating(12.5), "12.5");
    }
}
