use thiserror::Error;

use crate::category::Category;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown category '{0}' (run `shoprank categories` for the list)")]
    UnknownCategory(String),
    #[error("bad rank override '{0}', expected NAME=RANK")]
    BadOverride(String),
}

/// Which line opens a listing block in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorStyle {
    /// A bare rank number precedes the product name (Naver-style pastes).
    RankFirst,
    /// The product name comes first; the rank trails the metadata block
    /// (Coupang-style pastes).
    NameFirst,
}

/// How final ranks are produced. The source material disagreed silently
/// between these three; here the choice is explicit, defaulting to discovery
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankPolicy {
    /// Trust the rank token read from the text; records without one are
    /// dropped.
    Literal,
    /// Number records 1..N in the order their anchors were found.
    #[default]
    Discovery,
    /// Sort ascending by paid price and renumber 1..N.
    Price,
}

/// How far the ad-keyword check reaches when deciding to discard a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseScope {
    /// Reject the listing if any line of its scan window carries an ad
    /// keyword (conservative default).
    #[default]
    Window,
    /// Only the name line itself disqualifies the listing.
    AnchorOnly,
}

#[derive(Debug, Clone)]
pub struct NoiseConfig {
    /// Advertisement markers: any hit in scope rejects the whole listing.
    pub ad_keywords: Vec<String>,
    /// Delivery badges, cashback notices, promo badges: the line is ignored
    /// but the listing survives.
    pub skip_keywords: Vec<String>,
    pub scope: NoiseScope,
    /// Name substrings exempt from ad rejection (manually verified listings).
    pub allowlist: Vec<String>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig {
            ad_keywords: to_strings(&[
                "AD", "광고", "Sponsored", "스폰서", "파워클릭", "쇼핑검색광고",
                "프로모션",
            ]),
            skip_keywords: to_strings(&[
                "로켓배송", "무료배송", "새벽배송", "당일배송", "도착 보장",
                "도착 예정", "배송비", "적립", "쿠팡추천",
            ]),
            scope: NoiseScope::Window,
            allowlist: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Category supplying the name keywords; `None` means auto-detect per
    /// parse call.
    pub category: Option<Category>,
    /// `None` means auto-detect from the text layout.
    pub style: Option<AnchorStyle>,
    pub noise: NoiseConfig,
    /// Max lines scanned after an anchor for one listing's fields.
    pub window: usize,
    /// Max lines searched after a bare rank line for the product name
    /// (rank-first style only).
    pub rank_window: usize,
    /// Minimum character count for a name line.
    pub min_name_len: usize,
    /// Upper bound for a bare integer to count as a rank token.
    pub max_rank: u32,
    pub policy: RankPolicy,
    /// Injected `name-substring -> verified rank` overrides for the ranker.
    pub overrides: Vec<(String, u32)>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            category: None,
            style: None,
            noise: NoiseConfig::default(),
            window: 20,
            rank_window: 10,
            min_name_len: 15,
            max_rank: 20,
            policy: RankPolicy::default(),
            overrides: Vec::new(),
        }
    }
}

/// Parse a `NAME=RANK` override as given on the command line.
pub fn parse_override(raw: &str) -> Result<(String, u32), ConfigError> {
    let (name, rank) = raw
        .rsplit_once('=')
        .ok_or_else(|| ConfigError::BadOverride(raw.to_string()))?;
    let rank: u32 = rank
        .trim()
        .parse()
        .map_err(|_| ConfigError::BadOverride(raw.to_string()))?;
    if name.trim().is_empty() || rank == 0 {
        return Err(ConfigError::BadOverride(raw.to_string()));
    }
    Ok((name.trim().to_string(), rank))
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
