use std::collections::HashSet;

use tracing::debug;

use crate::config::RankPolicy;

use super::assemble::Assembled;
use super::{DropReason, DroppedAnchor};

/// Produce the final (rank, record) list under the configured policy.
/// Override entries pin a verified rank to any record whose name contains the
/// entry's key; they win over both literal tokens and derived numbering.
/// Rank values in the result are pairwise distinct.
pub fn apply(
    policy: RankPolicy,
    overrides: &[(String, u32)],
    records: Vec<Assembled>,
) -> (Vec<(u32, Assembled)>, Vec<DroppedAnchor>) {
    match policy {
        RankPolicy::Literal => literal_ranks(overrides, records),
        RankPolicy::Discovery => derived_ranks(overrides, records),
        RankPolicy::Price => {
            let mut records = records;
            records.sort_by_key(|r| r.price);
            derived_ranks(overrides, records)
        }
    }
}

fn override_for(name: &str, overrides: &[(String, u32)]) -> Option<u32> {
    overrides
        .iter()
        .find(|(key, _)| name.contains(key.as_str()))
        .map(|(_, rank)| *rank)
}

/// Trust the rank read from the text. Overridden records claim their slot
/// first; literal claims that collide with one, or repeat, are dropped.
fn literal_ranks(
    overrides: &[(String, u32)],
    records: Vec<Assembled>,
) -> (Vec<(u32, Assembled)>, Vec<DroppedAnchor>) {
    let mut out = Vec::new();
    let mut dropped = Vec::new();
    let mut used: HashSet<u32> = HashSet::new();
    let mut deferred = Vec::new();

    for rec in records {
        match override_for(&rec.name, overrides) {
            Some(rank) if used.insert(rank) => out.push((rank, rec)),
            Some(_) => drop_rec(&mut dropped, rec, DropReason::DuplicateRank),
            None => deferred.push(rec),
        }
    }
    for rec in deferred {
        match rec.literal_rank {
            None => drop_rec(&mut dropped, rec, DropReason::MissingRank),
            Some(rank) if !used.insert(rank) => {
                drop_rec(&mut dropped, rec, DropReason::DuplicateRank)
            }
            Some(rank) => out.push((rank, rec)),
        }
    }

    out.sort_by_key(|(rank, _)| *rank);
    (out, dropped)
}

/// Discovery/price numbering: overridden records keep their pinned rank, the
/// rest fill the smallest unused numbers in the given order.
fn derived_ranks(
    overrides: &[(String, u32)],
    records: Vec<Assembled>,
) -> (Vec<(u32, Assembled)>, Vec<DroppedAnchor>) {
    let mut out = Vec::new();
    let mut dropped = Vec::new();
    let mut used: HashSet<u32> = HashSet::new();
    let mut plain = Vec::new();

    for rec in records {
        match override_for(&rec.name, overrides) {
            Some(rank) if used.insert(rank) => out.push((rank, rec)),
            Some(_) => drop_rec(&mut dropped, rec, DropReason::DuplicateRank),
            None => plain.push(rec),
        }
    }

    let mut next = 1u32;
    for rec in plain {
        while used.contains(&next) {
            next += 1;
        }
        used.insert(next);
        out.push((next, rec));
    }

    out.sort_by_key(|(rank, _)| *rank);
    (out, dropped)
}

fn drop_rec(dropped: &mut Vec<DroppedAnchor>, rec: Assembled, reason: DropReason) {
    debug!(line = rec.anchor_index, name = %rec.name, ?reason, "record dropped by ranker");
    dropped.push(DroppedAnchor::new(rec.anchor_index, Some(rec.name), reason));
}
