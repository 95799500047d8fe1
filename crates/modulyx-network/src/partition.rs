//! Module partitioning: clustering post-processing into a canonical assignment.

use std::collections::{BTreeMap, HashMap};

use modulyx_common::entities::{ModuleAssignment, PipelineWarning};
use tracing::{debug, info, warn};

use crate::graph::InteractionGraph;
use crate::mcl::Clusterer;

/// Assignment plus any overlap the clustering primitive produced.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub assignment: ModuleAssignment,
    pub warnings: Vec<PipelineWarning>,
}

/// Cluster `graph` and turn the groups into modules `0..K-1`.
///
/// Groups smaller than `min_module_size` are dropped, the rest are ordered by
/// descending size with ties kept in the clusterer's order. A node already
/// claimed by an earlier (larger) group stays there. The size filter is applied
/// again once such overlaps are removed; a group that falls below it releases
/// its nodes and gets no id. An empty graph yields an empty assignment.
pub fn partition(
    graph: &InteractionGraph,
    clusterer: &dyn Clusterer,
    inflation: f64,
    min_module_size: usize,
) -> Partition {
    if graph.is_empty() {
        return Partition::default();
    }

    let groups = clusterer.cluster(&graph.adjacency_matrix(), inflation);
    let total = groups.len();

    let mut kept: Vec<Vec<usize>> = groups
        .into_iter()
        .filter(|g| g.len() >= min_module_size)
        .collect();
    // Stable: equal sizes keep clusterer order
    kept.sort_by(|a, b| b.len().cmp(&a.len()));

    // Claim nodes group by group; index into `accepted` is the provisional id
    let mut accepted: Vec<Vec<String>> = Vec::new();
    let mut claimed: HashMap<String, usize> = HashMap::new();
    let mut overlaps: Vec<(String, usize)> = Vec::new();

    for group in kept {
        let mut members = Vec::with_capacity(group.len());
        let mut shared = Vec::new();
        for node in group {
            let Some(name) = graph.node_name(node) else {
                warn!(node, "Clusterer returned an index outside the graph");
                continue;
            };
            match claimed.get(name) {
                Some(&owner) => shared.push((name.to_string(), owner)),
                None => members.push(name.to_string()),
            }
        }
        if members.is_empty() || members.len() < min_module_size {
            debug!(
                remaining = members.len(),
                "Cluster dropped after removing nodes claimed by larger modules"
            );
            continue;
        }
        let provisional = accepted.len();
        for m in &members {
            claimed.insert(m.clone(), provisional);
        }
        overlaps.extend(shared);
        accepted.push(members);
    }

    // Shrunk groups may now be out of size order
    let mut order: Vec<usize> = (0..accepted.len()).collect();
    order.sort_by(|&a, &b| accepted[b].len().cmp(&accepted[a].len()));
    let mut final_id = vec![0; accepted.len()];
    for (module_id, &provisional) in order.iter().enumerate() {
        final_id[provisional] = module_id;
    }

    let mut modules: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    let mut membership: BTreeMap<String, usize> = BTreeMap::new();
    for (provisional, members) in accepted.into_iter().enumerate() {
        let module_id = final_id[provisional];
        for m in &members {
            membership.insert(m.clone(), module_id);
        }
        modules.insert(module_id, members);
    }

    let warnings: Vec<PipelineWarning> = overlaps
        .into_iter()
        .map(|(protein, owner)| {
            let kept_module = final_id[owner];
            warn!("{protein} appears in several clusters; keeping module {kept_module}");
            PipelineWarning::OverlappingModules { protein, kept_module }
        })
        .collect();

    info!(
        "Partitioned {} nodes into {} modules ({} clusters before size filter)",
        graph.node_count(),
        modules.len(),
        total
    );

    Partition {
        assignment: ModuleAssignment { modules, membership },
        warnings,
    }
}
