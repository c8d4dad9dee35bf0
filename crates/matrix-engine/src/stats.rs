//! Network statistics and matrix-wide overview.
//!
//! Both reports are computed on demand from the store and never persisted.
//! Counts cover active positions only; inactive positions are still walked
//! through so that active members below them are counted.

use crate::{MatrixPosition, PositionStore, Result, UserId};
use matrix_topology::{level_capacity, TOTAL_NETWORK_CAPACITY, MAX_LEVELS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Fill state of one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelStats {
    /// Absolute matrix level (1 = root)
    pub level: u8,
    /// Active positions on the level
    pub count: u64,
    /// Slots available on the level
    pub capacity: u64,
    /// `count / capacity`, two decimals
    pub fill_percentage: f64,
}

impl LevelStats {
    fn new(level: u8, count: u64, capacity: u64) -> Self {
        Self {
            level,
            count,
            capacity,
            fill_percentage: percentage(count, capacity),
        }
    }
}

/// Downline report for one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Member the report is for
    pub user_id: UserId,
    /// Whether the member holds an active position
    pub has_position: bool,
    /// Member's own level, if placed
    pub level: Option<u8>,
    /// Member's position number within its level, if placed
    pub position: Option<u32>,
    /// Active descendants, the member excluded
    pub total_network_size: u64,
    /// Occupied slots on the member's own position
    pub direct_children: usize,
    /// Descendant counts per absolute level against the fixed capacity table
    pub levels: Vec<LevelStats>,
    /// Size of a complete 7-level matrix
    pub total_network_capacity: u64,
    /// `total_network_size / total_network_capacity`, two decimals
    pub completion_percentage: f64,
}

impl NetworkStats {
    /// Report for a member without an active position.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            has_position: false,
            level: None,
            position: None,
            total_network_size: 0,
            direct_children: 0,
            levels: capacity_table(&[0; MAX_LEVELS as usize]),
            total_network_capacity: TOTAL_NETWORK_CAPACITY,
            completion_percentage: 0.0,
        }
    }

    /// Descendant count on an absolute level.
    pub fn count_at(&self, level: u8) -> u64 {
        self.levels
            .iter()
            .find(|l| l.level == level)
            .map(|l| l.count)
            .unwrap_or(0)
    }
}

/// Compute the downline report rooted at `position`.
pub fn network_stats<S: PositionStore + ?Sized>(
    store: &S,
    position: &MatrixPosition,
) -> Result<NetworkStats> {
    let mut counts = [0u64; MAX_LEVELS as usize];
    let mut seen = HashSet::from([position.user_id]);
    accumulate(store, position, MAX_LEVELS, &mut counts, &mut seen)?;

    let total: u64 = counts.iter().sum();
    Ok(NetworkStats {
        user_id: position.user_id,
        has_position: true,
        level: Some(position.level),
        position: Some(position.position),
        total_network_size: total,
        direct_children: position.child_count(),
        levels: capacity_table(&counts),
        total_network_capacity: TOTAL_NETWORK_CAPACITY,
        completion_percentage: percentage(total, TOTAL_NETWORK_CAPACITY),
    })
}

/// Depth-first tally of active descendants by level.
fn accumulate<S: PositionStore + ?Sized>(
    store: &S,
    position: &MatrixPosition,
    remaining: u8,
    counts: &mut [u64; MAX_LEVELS as usize],
    seen: &mut HashSet<UserId>,
) -> Result<()> {
    if remaining == 0 {
        return Ok(());
    }
    for child_id in position.child_ids() {
        if !seen.insert(child_id) {
            continue;
        }
        let Some(child) = store.get(child_id)? else {
            continue;
        };
        if child.is_active {
            if let Some(slot) = counts.get_mut((child.level as usize).wrapping_sub(1)) {
                *slot += 1;
            }
        }
        accumulate(store, &child, remaining - 1, counts, seen)?;
    }
    Ok(())
}

/// Matrix-wide fill report for admin and reporting collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixOverview {
    /// Every stored position, active or not
    pub total_positions: u64,
    /// Positions currently active
    pub active_positions: u64,
    /// Independent trees (one per root)
    pub trees: u64,
    /// Positions with at least one occupied slot
    pub filled_positions: u64,
    /// Positions with all three slots occupied
    pub full_positions: u64,
    /// Members placed under someone other than their sponsor
    pub spillover_count: u64,
    /// Per-level counts against `trees × level capacity`
    pub levels: Vec<LevelStats>,
}

/// Summarise every position in the store.
pub fn overview<S: PositionStore + ?Sized>(store: &S) -> Result<MatrixOverview> {
    let positions = store.positions()?;
    let mut counts = [0u64; MAX_LEVELS as usize];
    let mut report = MatrixOverview {
        total_positions: positions.len() as u64,
        active_positions: 0,
        trees: 0,
        filled_positions: 0,
        full_positions: 0,
        spillover_count: 0,
        levels: Vec::new(),
    };

    for position in &positions {
        if position.is_root() {
            report.trees += 1;
        }
        if position.child_count() > 0 {
            report.filled_positions += 1;
        }
        if position.is_full() {
            report.full_positions += 1;
        }
        if position.is_spillover() {
            report.spillover_count += 1;
        }
        if position.is_active {
            report.active_positions += 1;
            if let Some(slot) = counts.get_mut((position.level as usize).wrapping_sub(1)) {
                *slot += 1;
            }
        }
    }

    report.levels = (1..=MAX_LEVELS)
        .map(|level| {
            LevelStats::new(
                level,
                counts[level as usize - 1],
                level_capacity(level) * report.trees,
            )
        })
        .collect();
    Ok(report)
}

fn capacity_table(counts: &[u64; MAX_LEVELS as usize]) -> Vec<LevelStats> {
    (1..=MAX_LEVELS)
        .map(|level| LevelStats::new(level, counts[level as usize - 1], level_capacity(level)))
        .collect()
}

/// `part / whole` as a percentage rounded to two decimals.
fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatrixEngine, MemoryStore};

    fn engine_with(count: u64) -> MatrixEngine<MemoryStore> {
        let mut engine = MatrixEngine::new(MemoryStore::new());
        engine.place(UserId(1), None).unwrap();
        for user in 2..=count {
            engine.place(UserId(user), Some(UserId(1))).unwrap();
        }
        engine
    }

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1093, 1093), 100.0);
    }

    #[test]
    fn counts_descendants_per_level() {
        let engine = engine_with(13);
        let root = engine.store().get(UserId(1)).unwrap().unwrap();
        let stats = network_stats(engine.store(), &root).unwrap();

        assert!(stats.has_position);
        assert_eq!(stats.total_network_size, 12);
        assert_eq!(stats.direct_children, 3);
        assert_eq!(stats.count_at(1), 0);
        assert_eq!(stats.count_at(2), 3);
        assert_eq!(stats.count_at(3), 9);
        assert_eq!(stats.total_network_capacity, 1093);
        assert_eq!(stats.completion_percentage, percentage(12, 1093));
    }

    #[test]
    fn subtree_stats_use_absolute_levels() {
        let engine = engine_with(13);
        let child = engine.store().get(UserId(2)).unwrap().unwrap();
        let stats = network_stats(engine.store(), &child).unwrap();
        assert_eq!(stats.level, Some(2));
        assert_eq!(stats.total_network_size, 3);
        assert_eq!(stats.count_at(3), 3);
    }

    #[test]
    fn inactive_members_are_not_counted_but_walked_through() {
        let mut engine = engine_with(7);
        engine.set_active(UserId(2), false).unwrap();
        let root = engine.store().get(UserId(1)).unwrap().unwrap();
        let stats = network_stats(engine.store(), &root).unwrap();
        // 3, 4 on level 2; 5, 6, 7 under the inactive 2
        assert_eq!(stats.count_at(2), 2);
        assert_eq!(stats.count_at(3), 3);
        assert_eq!(stats.total_network_size, 5);
    }

    #[test]
    fn partially_filled_positions_are_not_full() {
        let engine = engine_with(5);
        let report = overview(engine.store()).unwrap();
        // 1 full, 2 holds only 5
        assert_eq!(report.filled_positions, 2);
        assert_eq!(report.full_positions, 1);
    }

    #[test]
    fn empty_report_has_zero_size() {
        let stats = NetworkStats::empty(UserId(9));
        assert!(!stats.has_position);
        assert_eq!(stats.total_network_size, 0);
        assert_eq!(stats.levels.len(), MAX_LEVELS as usize);
        assert_eq!(stats.levels[6].capacity, 729);
    }

    #[test]
    fn overview_counts_spillover_and_full() {
        let mut engine = engine_with(7);
        engine.place(UserId(100), None).unwrap();
        let report = overview(engine.store()).unwrap();

        assert_eq!(report.total_positions, 8);
        assert_eq!(report.active_positions, 8);
        assert_eq!(report.trees, 2);
        // Root 1 and 2 are full; the second root is empty
        assert_eq!(report.filled_positions, 2);
        assert_eq!(report.full_positions, 2);
        // 5, 6, 7 sponsored by 1 but placed under 2
        assert_eq!(report.spillover_count, 3);
        assert_eq!(report.levels[0].count, 2);
        assert_eq!(report.levels[0].capacity, 2);
        assert_eq!(report.levels[0].fill_percentage, 100.0);
        assert_eq!(report.levels[1].capacity, 6);
    }
}
