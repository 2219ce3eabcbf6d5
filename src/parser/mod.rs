pub mod anchors;
pub mod assemble;
pub mod fields;
pub mod lines;
pub mod noise;
pub mod rank;

use std::fmt;

use tracing::info;

use crate::category::{self, Category};
use crate::config::{AnchorStyle, ParseConfig};
use crate::output::Listing;

use noise::NoiseFilter;

/// Why a detected anchor produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    AdFiltered,
    NoName,
    NoPrice,
    DuplicateName,
    MissingRank,
    DuplicateRank,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::AdFiltered => "ad keyword in window",
            DropReason::NoName => "no product name",
            DropReason::NoPrice => "no price in window",
            DropReason::DuplicateName => "duplicate product name",
            DropReason::MissingRank => "no literal rank",
            DropReason::DuplicateRank => "duplicate rank",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct DroppedAnchor {
    pub line: usize,
    pub name: Option<String>,
    pub reason: DropReason,
}

impl DroppedAnchor {
    pub fn new(line: usize, name: Option<String>, reason: DropReason) -> Self {
        DroppedAnchor { line, name, reason }
    }
}

/// Everything one parse call produced: the ranked records plus the anchors
/// that were discarded on the way, so nothing is swallowed silently.
#[derive(Debug)]
pub struct ParseReport {
    pub records: Vec<Listing>,
    pub dropped: Vec<DroppedAnchor>,
    pub anchor_count: usize,
    pub category: Option<Category>,
    pub style: Option<AnchorStyle>,
}

impl ParseReport {
    fn empty() -> Self {
        ParseReport {
            records: Vec::new(),
            dropped: Vec::new(),
            anchor_count: 0,
            category: None,
            style: None,
        }
    }

    pub fn category_key(&self) -> &str {
        self.category.as_ref().map(|c| c.key.as_str()).unwrap_or("unknown")
    }

    pub fn category_name(&self) -> &str {
        self.category
            .as_ref()
            .map(|c| c.display_name.as_str())
            .unwrap_or("상품")
    }
}

/// Single-pass pipeline: raw text → lines → anchors → scan windows →
/// assembled records → final ranks. Pure function of (text, config); empty or
/// unparseable input yields an empty report, never an error.
pub fn parse(text: &str, cfg: &ParseConfig) -> ParseReport {
    let lines = lines::normalize_lines(text);
    if lines.is_empty() {
        return ParseReport::empty();
    }

    let mut cfg = cfg.clone();
    if cfg.category.is_none() {
        cfg.category = category::detect(text);
    }

    let noise = NoiseFilter::new(&cfg.noise);
    let style = cfg
        .style
        .unwrap_or_else(|| anchors::detect_style(&lines, &cfg, &noise));

    let anchor_list = anchors::detect_anchors(&lines, style, &cfg, &noise);
    let anchor_count = anchor_list.len();

    let (assembled, mut dropped) = assemble::assemble(&lines, &anchor_list, &cfg, &noise);
    let (ranked, rank_dropped) = rank::apply(cfg.policy, &cfg.overrides, assembled);
    dropped.extend(rank_dropped);

    let category_key = cfg
        .category
        .as_ref()
        .map(|c| c.key.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let category_name = cfg
        .category
        .as_ref()
        .map(|c| c.display_name.clone())
        .unwrap_or_else(|| "상품".to_string());

    let records: Vec<Listing> = ranked
        .into_iter()
        .map(|(rank, a)| Listing {
            rank,
            name: a.name,
            price: a.price,
            price_numeric: a.price,
            original_price: a.original_price,
            discount: a.discount_percent.map(|p| format!("{}%", p)),
            rating: a.rating,
            reviews: a.reviews,
            category: category_key.clone(),
            category_name: category_name.clone(),
        })
        .collect();

    info!(
        anchors = anchor_count,
        records = records.len(),
        dropped = dropped.len(),
        ?style,
        category = %category_key,
        "parse complete"
    );

    ParseReport {
        records,
        dropped,
        anchor_count,
        category: cfg.category,
        style: Some(style),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category;
    use crate::config::{ParseConfig, RankPolicy};

    fn literal_cfg() -> ParseConfig {
        ParseConfig {
            policy: RankPolicy::Literal,
            ..ParseConfig::default()
        }
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.txt", name)).unwrap()
    }

    #[test]
    fn rank_first_two_listings() {
        let text = "1\n상품A 마카롱 설명입니다아주길게\n9,980원\n4.5\n(6327)\n2\n상품B 마카롱 다른상품입니다길게\n19,360원\n5\n(302)\n";
        let report = parse(text, &ParseConfig::default());
        assert_eq!(report.style, Some(AnchorStyle::RankFirst));
        assert_eq!(report.records.len(), 2);

        let a = &report.records[0];
        assert_eq!(a.rank, 1);
        assert_eq!(a.name, "상품A 마카롱 설명입니다아주길게");
        assert_eq!(a.price, 9980);
        assert_eq!(a.rating, 4.5);
        assert_eq!(a.reviews, 6327);

        let b = &report.records[1];
        assert_eq!(b.rank, 2);
        assert_eq!(b.price, 19360);
        assert_eq!(b.rating, 5.0);
        assert_eq!(b.reviews, 302);
    }

    #[test]
    fn empty_input_is_empty_report() {
        let report = parse("", &ParseConfig::default());
        assert!(report.records.is_empty());
        assert!(report.dropped.is_empty());
        assert_eq!(report.anchor_count, 0);
    }

    #[test]
    fn macaron_fixture_matches_verified_ranking() {
        let report = parse(&fixture("macaron"), &literal_cfg());
        assert_eq!(report.style, Some(AnchorStyle::NameFirst));
        assert_eq!(report.category_key(), "macaron");
        assert_eq!(report.anchor_count, 8);
        assert_eq!(report.records.len(), 6);

        // The manually verified top-6 for this paste.
        let expected: [(u32, &str, u32, u64); 6] = [
            (1, "파스키에 마카롱 6종", 9980, 6327),
            (2, "널담 마카롱 사랑세트", 9410, 6406),
            (3, "[러브빈마카롱]", 11700, 516),
            (4, "파스키에 마카롱 12개입", 19360, 6327),
            (5, "누니 마카롱(뚱카롱)", 16900, 302),
            (6, "코스트코 36 마카롱", 28980, 19),
        ];
        for ((rank, prefix, price, reviews), rec) in expected.iter().zip(&report.records) {
            assert_eq!(rec.rank, *rank);
            assert!(rec.name.starts_with(prefix), "rank {}: got {}", rank, rec.name);
            assert_eq!(rec.price, *price);
            assert_eq!(rec.price_numeric, *price);
            assert_eq!(rec.reviews, *reviews, "rank {}: reviews", rank);
        }

        // Both ad blocks were filtered.
        let ads: Vec<_> = report
            .dropped
            .iter()
            .filter(|d| d.reason == DropReason::AdFiltered)
            .collect();
        assert_eq!(ads.len(), 2);
        assert!(ads.iter().any(|d| d.name.as_deref().unwrap().contains("하겐다즈")));
    }

    #[test]
    fn macaron_fixture_discounts() {
        let report = parse(&fixture("macaron"), &literal_cfg());
        let by_rank = |r: u32| report.records.iter().find(|x| x.rank == r).unwrap();

        let second = by_rank(2);
        assert_eq!(second.discount.as_deref(), Some("20%"));
        assert_eq!(second.original_price, Some(11900));

        let fourth = by_rank(4);
        assert_eq!(fourth.discount.as_deref(), Some("3%"));
        assert_eq!(fourth.original_price, Some(19960));

        let first = by_rank(1);
        assert!(first.discount.is_none());
        assert!(first.original_price.is_none());
    }

    #[test]
    fn snack_fixture_full_top_ten() {
        let report = parse(&fixture("snack"), &literal_cfg());
        assert_eq!(report.category_key(), "snack");
        assert_eq!(report.records.len(), 10);
        let ranks: Vec<u32> = report.records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=10).collect::<Vec<u32>>());

        let tenth = &report.records[9];
        assert!(tenth.name.starts_with("농심 메론킥"));
        assert_eq!(tenth.price, 1200);
        assert_eq!(tenth.discount.as_deref(), Some("52%"));
        assert_eq!(tenth.reviews, 2526);

        // Coupon-labelled discount line.
        let sixth = &report.records[5];
        assert!(sixth.name.starts_with("배스킨라빈스"));
        assert_eq!(sixth.discount.as_deref(), Some("37%"));
        assert_eq!(sixth.original_price, Some(15840));
        assert_eq!(sixth.reviews, 673);

        // Five-digit count without a thousands separator.
        let seventh = &report.records[6];
        assert!(seventh.name.starts_with("롯데웰푸드 칙촉"));
        assert_eq!(seventh.reviews, 43416);
    }

    #[test]
    fn lowsugar_fixture_rank_gap_preserved_under_literal() {
        // This paste has no rank-4 block; literal ranking keeps the gap.
        let report = parse(&fixture("lowsugar"), &literal_cfg());
        assert_eq!(report.category_key(), "icecream");
        let ranks: Vec<u32> = report.records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 5, 6]);
    }

    #[test]
    fn lowsugar_fixture_discovery_renumbers() {
        let report = parse(&fixture("lowsugar"), &ParseConfig::default());
        let ranks: Vec<u32> = report.records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn lowsugar_fixture_price_policy() {
        let cfg = ParseConfig {
            policy: RankPolicy::Price,
            ..ParseConfig::default()
        };
        let report = parse(&fixture("lowsugar"), &cfg);
        let prices: Vec<u32> = report.records.iter().map(|r| r.price).collect();
        let mut sorted = prices.clone();
        sorted.sort_unstable();
        assert_eq!(prices, sorted);
        assert_eq!(report.records[0].price, 4800);
        assert_eq!(report.records[0].rank, 1);
    }

    #[test]
    fn explicit_category_overrides_detection() {
        let cfg = ParseConfig {
            category: Some(category::resolve("lowsugar_icecream").unwrap()),
            policy: RankPolicy::Literal,
            ..ParseConfig::default()
        };
        let report = parse(&fixture("lowsugar"), &cfg);
        assert_eq!(report.category_key(), "lowsugar_icecream");
        assert_eq!(report.records[0].category_name, "저당 아이스크림");
        assert_eq!(report.records.len(), 5);
    }

    #[test]
    fn same_input_same_records() {
        let text = fixture("macaron");
        let cfg = literal_cfg();
        let first = parse(&text, &cfg);
        let second = parse(&text, &cfg);
        assert_eq!(first.records, second.records);
    }

    #[test]
    fn record_count_never_exceeds_anchor_count() {
        for name in ["macaron", "snack", "lowsugar"] {
            let report = parse(&fixture(name), &literal_cfg());
            assert!(report.records.len() <= report.anchor_count);
            assert_eq!(
                report.anchor_count,
                report.records.len() + report.dropped.len(),
                "fixture {}",
                name
            );
        }
    }
}
