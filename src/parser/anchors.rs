use std::sync::LazyLock;

use regex::Regex;

use crate::config::{AnchorStyle, ParseConfig};

use super::fields;
use super::noise::NoiseFilter;

static BARE_RANK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([1-9]\d?)$").unwrap());

/// Start of one listing block: the line index plus which style matched it.
/// Rank-first anchors already know their literal rank.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub index: usize,
    pub style: AnchorStyle,
    pub literal_rank: Option<u32>,
}

/// A name line contains a category keyword (when a keyword set applies), meets
/// the minimum length, and is neither noise nor one of the field shapes.
pub fn is_name_line(line: &str, cfg: &ParseConfig, noise: &NoiseFilter) -> bool {
    if noise.is_noise(line) || fields::matches_field(line) {
        return false;
    }
    if line.chars().count() < cfg.min_name_len {
        return false;
    }
    match &cfg.category {
        Some(c) if !c.keywords.is_empty() => c.keywords.iter().any(|kw| line.contains(kw.as_str())),
        _ => true,
    }
}

/// Bare rank token: a standalone integer within the valid range.
pub fn bare_rank(line: &str, max_rank: u32) -> Option<u32> {
    let n: u32 = BARE_RANK_RE.captures(line)?[1].parse().ok()?;
    (n <= max_rank).then_some(n)
}

/// Pick the anchor style from the text layout: a rank token before the first
/// name line means leading ranks, otherwise names lead and ranks trail.
pub fn detect_style(lines: &[String], cfg: &ParseConfig, noise: &NoiseFilter) -> AnchorStyle {
    let first_rank = lines
        .iter()
        .position(|l| !noise.is_noise(l) && bare_rank(l, cfg.max_rank).is_some());
    let first_name = lines.iter().position(|l| is_name_line(l, cfg, noise));
    match (first_rank, first_name) {
        (Some(r), Some(n)) if r < n => AnchorStyle::RankFirst,
        (Some(_), None) => AnchorStyle::RankFirst,
        _ => AnchorStyle::NameFirst,
    }
}

pub fn detect_anchors(
    lines: &[String],
    style: AnchorStyle,
    cfg: &ParseConfig,
    noise: &NoiseFilter,
) -> Vec<Anchor> {
    match style {
        AnchorStyle::RankFirst => rank_first_anchors(lines, cfg, noise),
        AnchorStyle::NameFirst => name_first_anchors(lines, cfg, noise),
    }
}

/// Bare integers are anchors only while they continue the running rank
/// sequence; that keeps integer rating lines ("5") from splitting a block.
fn rank_first_anchors(lines: &[String], cfg: &ParseConfig, noise: &NoiseFilter) -> Vec<Anchor> {
    let mut anchors = Vec::new();
    let mut expected: Option<u32> = None;
    for (i, line) in lines.iter().enumerate() {
        if noise.is_noise(line) {
            continue;
        }
        if let Some(n) = bare_rank(line, cfg.max_rank) {
            if expected.map(|e| n == e).unwrap_or(true) {
                anchors.push(Anchor {
                    index: i,
                    style: AnchorStyle::RankFirst,
                    literal_rank: Some(n),
                });
                expected = Some(n + 1);
            }
        }
    }
    anchors
}

/// Name lines are anchors; a repeat of the previous anchor's name within a
/// couple of lines is scraped DOM duplication and collapses into it.
fn name_first_anchors(lines: &[String], cfg: &ParseConfig, noise: &NoiseFilter) -> Vec<Anchor> {
    let mut anchors: Vec<Anchor> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if !is_name_line(line, cfg, noise) {
            continue;
        }
        if let Some(last) = anchors.last() {
            if lines[last.index] == *line && i - last.index <= 3 {
                continue;
            }
        }
        anchors.push(Anchor {
            index: i,
            style: AnchorStyle::NameFirst,
            literal_rank: None,
        });
    }
    anchors
}
