use std::sync::LazyLock;

use regex::Regex;

use crate::config::{AnchorStyle, ParseConfig};

use super::anchors::{self, Anchor};
use super::noise::NoiseFilter;

// Field grammar of one listing block, as seen in real Coupang/Naver pastes:
//   할인20%11,900원   discount label + percent + original price
//   3%19,960원        bare percent + original price
//   9,410원           paid price
//   4.5               rating (integer ratings come as a bare "5")
//   (6,406)           review count
static DISCOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:쿠폰할인|할인)?(\d{1,3})%(\d{1,3}(?:,\d{3})*)원$").unwrap());
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3}(?:,\d{3})*)원$").unwrap());
static REVIEW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\((\d{1,3}(?:,\d{3})*|\d+)\)$").unwrap());
static BARE_NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})(\.\d)?$").unwrap());

/// Everything resolvable inside one anchor's scan window.
#[derive(Debug, Default, Clone)]
pub struct ScannedFields {
    /// Resolved product name (rank-first windows only; name-first anchors
    /// carry the name on the anchor line itself).
    pub name: Option<String>,
    pub price: Option<u32>,
    pub original_price: Option<u32>,
    pub discount_percent: Option<u8>,
    pub rating: Option<f64>,
    pub reviews: Option<u64>,
    /// Bare rank token found inside the window (name-first trailing rank).
    pub trailing_rank: Option<u32>,
}

/// True when the line is one of the field patterns and therefore can never be
/// a product name.
pub fn matches_field(line: &str) -> bool {
    DISCOUNT_RE.is_match(line)
        || PRICE_RE.is_match(line)
        || REVIEW_RE.is_match(line)
        || BARE_NUM_RE.is_match(line)
}

/// Scan the lines after `anchor` up to `end` (exclusive), applying the field
/// patterns in priority order. Noise lines are skipped outright, as are
/// repetitions of the product name (scraped DOM duplication).
pub fn scan_window(
    lines: &[String],
    anchor: &Anchor,
    end: usize,
    cfg: &ParseConfig,
    noise: &NoiseFilter,
) -> ScannedFields {
    let mut f = ScannedFields::default();
    let anchor_name = match anchor.style {
        AnchorStyle::NameFirst => Some(lines[anchor.index].clone()),
        AnchorStyle::RankFirst => None,
    };
    let mut review_seen = false;

    for i in anchor.index + 1..end.min(lines.len()) {
        let line = lines[i].as_str();
        if noise.is_noise(line) {
            continue;
        }

        // Rank-first: the name is the first name-pattern line in range.
        if anchor.style == AnchorStyle::RankFirst
            && f.name.is_none()
            && i - anchor.index <= cfg.rank_window
            && anchors::is_name_line(line, cfg, noise)
        {
            f.name = Some(line.to_string());
            continue;
        }

        let known_name = anchor_name.as_deref().or(f.name.as_deref());
        if known_name == Some(line) {
            continue;
        }

        if f.price.is_none() && f.discount_percent.is_none() {
            if let Some(caps) = DISCOUNT_RE.captures(line) {
                f.discount_percent = caps[1].parse::<u8>().ok().filter(|p| *p <= 100);
                f.original_price = parse_amount(&caps[2]);
                // The paid price follows within the next few lines.
                for next in lines[i + 1..(i + 4).min(end).min(lines.len())].iter() {
                    if let Some(pc) = PRICE_RE.captures(next) {
                        f.price = parse_amount(&pc[1]);
                        break;
                    }
                }
                continue;
            }
        }

        if f.price.is_none() {
            if let Some(caps) = PRICE_RE.captures(line) {
                f.price = parse_amount(&caps[1]);
                continue;
            }
        }

        if let Some(caps) = REVIEW_RE.captures(line) {
            if f.reviews.is_none() {
                f.reviews = caps[1].replace(',', "").parse().ok();
            }
            review_seen = true;
            continue;
        }

        if let Some(caps) = BARE_NUM_RE.captures(line) {
            if caps.get(2).is_some() {
                // Decimal form is always a rating candidate.
                if f.rating.is_none() {
                    if let Ok(v) = caps[0].parse::<f64>() {
                        if (0.0..=5.0).contains(&v) {
                            f.rating = Some(v);
                        }
                    }
                }
                continue;
            }
            // Bare integer: rating until the rating/review block has been
            // seen, rank token afterwards.
            let n: u32 = match caps[1].parse() {
                Ok(n) => n,
                Err(_) => continue,
            };
            let past_metadata = review_seen || f.rating.is_some();
            if !past_metadata && n <= 5 && f.rating.is_none() {
                f.rating = Some(n as f64);
            } else if f.trailing_rank.is_none() && (1..=cfg.max_rank).contains(&n) {
                f.trailing_rank = Some(n);
            }
        }
    }

    f
}

fn parse_amount(raw: &str) -> Option<u32> {
    raw.replace(',', "").parse().ok()
}
