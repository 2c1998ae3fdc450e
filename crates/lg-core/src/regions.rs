//! Region hierarchy and roll-up.
//!
//! Regions form a forest (country, state, city...). Staying in a region counts
//! as staying in each of its ancestors, so reports roll stayed-in regions up to
//! the root.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::types::RegionKey;

/// One row of the region table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub fid: i64,
    pub iso_3166: RegionKey,
    pub name: String,
    pub parent_fid: Option<i64>,
}

#[derive(Debug, Clone)]
struct Node {
    region: Region,
    parent: Option<usize>,
}

/// Region forest stored as an arena with parent indices.
#[derive(Debug, Clone, Default)]
pub struct RegionTree {
    nodes: Vec<Node>,
    index: HashMap<i64, usize>,
}

impl RegionTree {
    /// Builds the tree. Parents that are not in `regions` are dropped with a
    /// warning, making the child a root.
    pub fn new(regions: impl IntoIterator<Item = Region>) -> Self {
        let regions: Vec<Region> = regions.into_iter().collect();
        let index: HashMap<i64, usize> = regions
            .iter()
            .enumerate()
            .map(|(i, region)| (region.fid, i))
            .collect();

        let nodes = regions
            .into_iter()
            .map(|region| {
                let parent = region.parent_fid.and_then(|fid| {
                    let parent = index.get(&fid).copied();
                    if parent.is_none() {
                        tracing::warn!(
                            region = %region.iso_3166,
                            parent_fid = fid,
                            "region has a dangling parent"
                        );
                    }
                    parent
                });
                Node { region, parent }
            })
            .collect();

        Self { nodes, index }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, fid: i64) -> Option<&Region> {
        self.index.get(&fid).map(|&i| &self.nodes[i].region)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.nodes.iter().map(|node| &node.region)
    }

    /// Returns `seeds` plus every ancestor of each seed.
    ///
    /// Unknown seeds are kept as-is. A parent cycle stops the walk at the
    /// first region visited twice.
    pub fn roll_up(&self, seeds: impl IntoIterator<Item = i64>) -> BTreeSet<i64> {
        let mut rolled = BTreeSet::new();

        for seed in seeds {
            rolled.insert(seed);
            let mut visited = HashSet::new();
            let mut current = self.index.get(&seed).copied();

            while let Some(i) = current {
                if !visited.insert(i) {
                    tracing::warn!(
                        region = %self.nodes[i].region.iso_3166,
                        "region hierarchy contains a cycle"
                    );
                    break;
                }
                rolled.insert(self.nodes[i].region.fid);
                current = self.nodes[i].parent;
            }
        }
        rolled
    }
}

/// A region's line in the regions report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionSummary {
    pub iso_3166: RegionKey,
    pub name: String,
    pub lived_in: bool,
    pub stayed_in: bool,
}

/// Summarizes every region, after rolling both seed sets up the hierarchy.
///
/// Sorted by ISO code.
pub fn summarize(
    tree: &RegionTree,
    lived_seeds: impl IntoIterator<Item = i64>,
    stayed_seeds: impl IntoIterator<Item = i64>,
) -> Vec<RegionSummary> {
    let lived = tree.roll_up(lived_seeds);
    let stayed = tree.roll_up(stayed_seeds);

    let mut summaries: Vec<RegionSummary> = tree
        .iter()
        .map(|region| RegionSummary {
            iso_3166: region.iso_3166.clone(),
            name: region.name.clone(),
            lived_in: lived.contains(&region.fid),
            stayed_in: stayed.contains(&region.fid),
        })
        .collect();
    summaries.sort_by(|a, b| a.iso_3166.cmp(&b.iso_3166));

    tracing::debug!(
        regions = summaries.len(),
        lived = lived.len(),
        stayed = stayed.len(),
        "summarized regions"
    );
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(fid: i64, iso: &str, parent: Option<i64>) -> Region {
        Region {
            fid,
            iso_3166: RegionKey::new(iso).unwrap(),
            name: iso.to_lowercase(),
            parent_fid: parent,
        }
    }

    fn tree() -> RegionTree {
        RegionTree::new(vec![
            region(1, "US", None),
            region(2, "US-CA", Some(1)),
            region(3, "US-NY", Some(1)),
            region(4, "CA", None),
            region(5, "CA-ON", Some(4)),
        ])
    }

    #[test]
    fn roll_up_adds_ancestors() {
        let rolled = tree().roll_up([2, 5]);
        assert_eq!(rolled.into_iter().collect::<Vec<_>>(), vec![1, 2, 4, 5]);
    }

    #[test]
    fn roll_up_keeps_unknown_seeds() {
        let rolled = tree().roll_up([99]);
        assert_eq!(rolled.into_iter().collect::<Vec<_>>(), vec![99]);
    }

    #[test]
    fn cycles_terminate() {
        let tree = RegionTree::new(vec![
            region(1, "AA", Some(2)),
            region(2, "BB", Some(1)),
        ]);
        let rolled = tree.roll_up([1]);
        assert_eq!(rolled.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn dangling_parent_becomes_root() {
        let tree = RegionTree::new(vec![region(1, "AA", Some(42))]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.roll_up([1]).len(), 1);
        assert_eq!(tree.get(1).unwrap().iso_3166.as_str(), "AA");
    }

    #[test]
    fn summary_is_sorted_by_iso_code() {
        let summaries = summarize(&tree(), [3], [2, 5]);
        let rows: Vec<_> = summaries
            .iter()
            .map(|s| (s.iso_3166.as_str(), s.lived_in, s.stayed_in))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("CA", false, true),
                ("CA-ON", false, true),
                ("US", true, true),
                ("US-CA", false, true),
                ("US-NY", true, false),
            ]
        );
    }
}
