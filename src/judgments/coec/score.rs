use std::collections::BTreeMap;

use super::aggregate::{PairStatistic, RankStatistic};

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document_id: String,
    pub rating: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreSummary {
    pub pairs_scored: u64,
    pub skipped_without_impressions: u64,
    pub skipped_undefined_expectation: u64,
}

/// Clicks over impressions for every rank that has impressions. Ranks with
/// no impressions have no defined expectation and are left out.
pub fn expected_click_rates(ranks: &BTreeMap<u32, RankStatistic>) -> BTreeMap<u32, f64> {
    ranks
        .iter()
        .filter(|(_, stat)| stat.impressions > 0)
        .map(|(&rank, stat)| (rank, stat.clicks as f64 / stat.impressions as f64))
        .collect()
}

/// Scores the pairs of one query, preserving their order.
pub fn score_pairs(
    pairs: &[PairStatistic],
    expected: &BTreeMap<u32, f64>,
    rounding_digits: u32,
    summary: &mut ScoreSummary,
) -> Vec<ScoredDocument> {
    let mut scored = Vec::with_capacity(pairs.len());

    for pair in pairs {
        if pair.impressions == 0 {
            summary.skipped_without_impressions += 1;
            continue;
        }

        let Some(expected_rate) = pair
            .observed_rank()
            .and_then(|rank| expected.get(&rank).copied())
            .filter(|rate| *rate > 0.0)
        else {
            summary.skipped_undefined_expectation += 1;
            continue;
        };

        let observed_rate = pair.clicks as f64 / pair.impressions as f64;
        scored.push(ScoredDocument {
            document_id: pair.document_id.clone(),
            rating: round_half_up(observed_rate / expected_rate, rounding_digits),
        });
        summary.pairs_scored += 1;
    }

    scored
}

/// Half-up rounding on the shortest decimal form of `value`, so values that
/// print as an exact tie (`0.0005`) round away from zero.
pub fn round_half_up(value: f64, digits: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let text = format!("{}", value.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let digits = digits as usize;
    if frac_part.len() <= digits {
        return value;
    }

    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(digits))
        .map(|byte| byte - b'0')
        .collect();

    if frac_part.as_bytes()[digits] >= b'5' {
        let mut carry = true;
        for digit in kept.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, 1);
        }
    }

    let split = kept.len() - digits;
    let mut rounded = String::with_capacity(kept.len() + 1);
    rounded.extend(kept[..split].iter().map(|digit| char::from(b'0' + digit)));
    if digits > 0 {
        rounded.push('.');
        rounded.extend(kept[split..].iter().map(|digit| char::from(b'0' + digit)));
    }

    rounded
        .parse::<f64>()
        .map(|magnitude| magnitude.copysign(value))
        .unwrap_or(value)
}
