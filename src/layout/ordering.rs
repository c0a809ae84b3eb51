use std::collections::HashMap;

use crate::ir::Link;

use super::LayerGroups;

pub fn order_layers(groups: &LayerGroups, links: &[Link], iterations: usize) -> LayerGroups {
    let mut order = groups.clone();
    if order.len() <= 1 {
        return order;
    }
    let keys: Vec<usize> = order.keys().copied().collect();

    let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for link in links {
        outgoing
            .entry(link.source.as_str())
            .or_default()
            .push(link.target.as_str());
        incoming
            .entry(link.target.as_str())
            .or_default()
            .push(link.source.as_str());
    }

    let mut positions: HashMap<String, usize> = HashMap::new();
    for bucket in order.values() {
        index_bucket(bucket, &mut positions);
    }

    for _ in 0..iterations {
        for layer in &keys[1..] {
            if let Some(bucket) = order.get_mut(layer) {
                reorder_bucket(bucket, &incoming, &mut positions);
            }
        }
        for layer in keys[..keys.len() - 1].iter().rev() {
            if let Some(bucket) = order.get_mut(layer) {
                reorder_bucket(bucket, &outgoing, &mut positions);
            }
        }
    }

    order
}

fn index_bucket(bucket: &[String], positions: &mut HashMap<String, usize>) {
    for (idx, id) in bucket.iter().enumerate() {
        positions.insert(id.clone(), idx);
    }
}

/// Sorts one layer by the mean position of each node's neighbours. Nodes
/// without positioned neighbours keep their relative order after the rest.
fn reorder_bucket(
    bucket: &mut Vec<String>,
    neighbors: &HashMap<&str, Vec<&str>>,
    positions: &mut HashMap<String, usize>,
) {
    if bucket.len() <= 1 {
        return;
    }

    let mut weighted: Vec<(String, f32)> = Vec::new();
    let mut unweighted: Vec<String> = Vec::new();
    for id in bucket.drain(..) {
        match barycenter(&id, neighbors, positions) {
            Some(center) => weighted.push((id, center)),
            None => unweighted.push(id),
        }
    }
    weighted.sort_by(|a, b| a.1.total_cmp(&b.1));

    bucket.extend(weighted.into_iter().map(|(id, _)| id));
    bucket.extend(unweighted);
    index_bucket(bucket, positions);
}

fn barycenter(
    id: &str,
    neighbors: &HashMap<&str, Vec<&str>>,
    positions: &HashMap<String, usize>,
) -> Option<f32> {
    let mut sum = 0.0f32;
    let mut count = 0usize;
    for neighbor in neighbors.get(id).into_iter().flatten() {
        if let Some(&pos) = positions.get(*neighbor) {
            sum += pos as f32;
            count += 1;
        }
    }
    (count > 0).then(|| sum / count as f32)
}

/// Number of pairwise crossings between links joining adjacent layers.
pub fn count_crossings(order: &LayerGroups, links: &[Link]) -> usize {
    let mut slot: HashMap<&str, (usize, usize)> = HashMap::new();
    for (&layer, bucket) in order {
        for (idx, id) in bucket.iter().enumerate() {
            slot.insert(id.as_str(), (layer, idx));
        }
    }

    let mut by_layer: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
    for link in links {
        let (Some(&(from_layer, from_idx)), Some(&(to_layer, to_idx))) =
            (slot.get(link.source.as_str()), slot.get(link.target.as_str()))
        else {
            continue;
        };
        if from_layer.checked_add(1) == Some(to_layer) {
            by_layer.entry(from_layer).or_default().push((from_idx, to_idx));
        }
    }

    let mut crossings = 0;
    for pairs in by_layer.values() {
        for (i, a) in pairs.iter().enumerate() {
            for b in &pairs[i + 1..] {
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    crossings += 1;
                }
            }
        }
    }
    crossings
}
