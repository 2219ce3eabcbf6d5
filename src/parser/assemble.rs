use std::collections::HashSet;

use tracing::{debug, warn};

use crate::config::{AnchorStyle, NoiseScope, ParseConfig};

use super::anchors::Anchor;
use super::fields;
use super::noise::NoiseFilter;
use super::{DropReason, DroppedAnchor};

/// A listing record before the ranker has produced the final order.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub anchor_index: usize,
    pub name: String,
    pub price: u32,
    pub original_price: Option<u32>,
    pub discount_percent: Option<u8>,
    pub rating: f64,
    pub reviews: u64,
    pub literal_rank: Option<u32>,
}

/// Combine each anchor with its scanned fields, applying the drop policies:
/// ad-tainted windows, priceless anchors, and duplicate names all yield a
/// diagnostic instead of a record.
pub fn assemble(
    lines: &[String],
    anchors: &[Anchor],
    cfg: &ParseConfig,
    noise: &NoiseFilter,
) -> (Vec<Assembled>, Vec<DroppedAnchor>) {
    let mut records = Vec::new();
    let mut dropped = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for (k, anchor) in anchors.iter().enumerate() {
        let end = anchors
            .get(k + 1)
            .map(|next| next.index)
            .unwrap_or(lines.len())
            .min(anchor.index + 1 + cfg.window);

        let fields = fields::scan_window(lines, anchor, end, cfg, noise);

        let name = match anchor.style {
            AnchorStyle::NameFirst => Some(lines[anchor.index].clone()),
            AnchorStyle::RankFirst => fields.name.clone(),
        };
        let Some(name) = name else {
            dropped.push(DroppedAnchor::new(anchor.index, None, DropReason::NoName));
            continue;
        };

        let ad_hit = match cfg.noise.scope {
            NoiseScope::Window => lines[anchor.index..end].iter().any(|l| noise.is_ad(l)),
            NoiseScope::AnchorOnly => noise.is_ad(&name),
        };
        if ad_hit && !noise.allowlisted(&name) {
            debug!(line = anchor.index, %name, "listing rejected: ad keyword in window");
            dropped.push(DroppedAnchor::new(anchor.index, Some(name), DropReason::AdFiltered));
            continue;
        }

        let Some(price) = fields.price else {
            debug!(line = anchor.index, %name, "listing rejected: no price in window");
            dropped.push(DroppedAnchor::new(anchor.index, Some(name), DropReason::NoPrice));
            continue;
        };

        if !seen_names.insert(name.clone()) {
            dropped.push(DroppedAnchor::new(anchor.index, Some(name), DropReason::DuplicateName));
            continue;
        }

        let discount_percent =
            validate_discount(&name, price, fields.original_price, fields.discount_percent);

        records.push(Assembled {
            anchor_index: anchor.index,
            name,
            price,
            original_price: fields.original_price,
            discount_percent,
            rating: fields.rating.unwrap_or(0.0),
            reviews: fields.reviews.unwrap_or(0),
            literal_rank: anchor.literal_rank.or(fields.trailing_rank),
        });
    }

    (records, dropped)
}

/// Cross-check the literal discount token against the two prices. Listing
/// pages truncate the displayed percent, so both the floored and the rounded
/// computed value are accepted; on mismatch the computed percent wins.
fn validate_discount(
    name: &str,
    price: u32,
    original_price: Option<u32>,
    literal: Option<u8>,
) -> Option<u8> {
    let (orig, pct) = match (original_price, literal) {
        (Some(o), Some(p)) if o > 0 => (o, p),
        _ => return literal,
    };
    let computed = (orig as f64 - price as f64) * 100.0 / orig as f64;
    if computed.floor() as i64 == pct as i64 || computed.round() as i64 == pct as i64 {
        return Some(pct);
    }
    let corrected = computed.round().clamp(0.0, 100.0) as u8;
    warn!(
        %name,
        literal = pct,
        computed = corrected,
        "discount percent inconsistent with prices, using computed value"
    );
    Some(corrected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category;
    use crate::config::NoiseScope;
    use crate::parser::anchors::detect_anchors;
    use crate::parser::lines::normalize_lines;

    fn run(text: &str, cfg: &ParseConfig, style: AnchorStyle) -> (Vec<Assembled>, Vec<DroppedAnchor>) {
        let lines = normalize_lines(text);
        let noise = NoiseFilter::new(&cfg.noise);
        let anchors = detect_anchors(&lines, style, cfg, &noise);
        assemble(&lines, &anchors, cfg, &noise)
    }

    fn macaron_cfg() -> ParseConfig {
        ParseConfig {
            category: Some(category::resolve("macaron").unwrap()),
            ..ParseConfig::default()
        }
    }

    const AD_BLOCK: &str = "상품C 마카롱 테스트상품입니다길게\nAD\n9,900원\n4.0\n(10)";

    #[test]
    fn ad_in_window_rejects_listing() {
        let cfg = macaron_cfg();
        let (records, dropped) = run(AD_BLOCK, &cfg, AnchorStyle::NameFirst);
        assert!(records.is_empty());
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].reason, DropReason::AdFiltered);
    }

    #[test]
    fn anchor_only_scope_keeps_listing() {
        let mut cfg = macaron_cfg();
        cfg.noise.scope = NoiseScope::AnchorOnly;
        let (records, dropped) = run(AD_BLOCK, &cfg, AnchorStyle::NameFirst);
        assert_eq!(records.len(), 1);
        assert!(dropped.is_empty());
        // The AD line itself still contributed no fields.
        assert_eq!(records[0].price, 9900);
    }

    #[test]
    fn allowlist_overrides_ad_rejection() {
        let mut cfg = macaron_cfg();
        cfg.noise.allowlist.push("상품C".to_string());
        let (records, dropped) = run(AD_BLOCK, &cfg, AnchorStyle::NameFirst);
        assert_eq!(records.len(), 1);
        assert!(dropped.is_empty());
    }

    #[test]
    fn no_price_no_record() {
        let cfg = macaron_cfg();
        let text = "상품E 마카롱 가격없는상품입니다\n로켓배송\n4.5\n(12)\n상품F 마카롱 가격있는상품입니다\n3,000원";
        let (records, dropped) = run(text, &cfg, AnchorStyle::NameFirst);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "상품F 마카롱 가격있는상품입니다");
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].reason, DropReason::NoPrice);
    }

    #[test]
    fn duplicate_names_first_wins() {
        let cfg = macaron_cfg();
        // Same product far apart in the text: not collapse-adjacent, so the
        // assembler's name dedup has to catch it.
        let text = "상품G 마카롱 중복상품입니다길게\n5,000원\n기타 설명 라인이 길게 들어갑니다\n추가 설명 라인이 또 들어갑니다\n상품G 마카롱 중복상품입니다길게\n7,000원";
        let (records, dropped) = run(text, &cfg, AnchorStyle::NameFirst);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, 5000);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].reason, DropReason::DuplicateName);
    }

    #[test]
    fn discount_consistency_accepts_truncated_percent() {
        // 11,900 -> 9,410 is 20.9% off, displayed as 20%.
        assert_eq!(validate_discount("x", 9410, Some(11900), Some(20)), Some(20));
        // 16,000 -> 11,700 is 26.875%, displayed as 26%.
        assert_eq!(validate_discount("x", 11700, Some(16000), Some(26)), Some(26));
    }

    #[test]
    fn discount_mismatch_recomputed() {
        // Literal 50% but the prices say 10%.
        assert_eq!(validate_discount("x", 900, Some(1000), Some(50)), Some(10));
    }
}
