//! Fixed-point transitive closure over adjacency maps

use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Extend every set in `adjacency` with everything reachable from it
///
/// Runs in place until a full pass adds nothing. A key is not added to its
/// own set unless it lies on a cycle. Neighbors that are not keys of the map
/// stay in the set but contribute nothing further.
pub fn transitive_closure<K>(adjacency: &mut BTreeMap<K, BTreeSet<K>>)
where
    K: Ord + Clone,
{
    let keys: Vec<K> = adjacency.keys().cloned().collect();
    let mut passes = 0usize;

    loop {
        passes += 1;
        let mut changed = false;

        for key in &keys {
            let additions: Vec<K> = match adjacency.get(key) {
                Some(neighbors) => neighbors
                    .iter()
                    .filter_map(|neighbor| adjacency.get(neighbor))
                    .flatten()
                    .filter(|reached| !neighbors.contains(*reached))
                    .cloned()
                    .collect(),
                None => continue,
            };

            if additions.is_empty() {
                continue;
            }
            if let Some(set) = adjacency.get_mut(key) {
                set.extend(additions);
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    trace!(keys = keys.len(), passes, "closure reached fixed point");
}
