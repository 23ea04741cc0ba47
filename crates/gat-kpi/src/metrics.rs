//! Per-timestep derived scalars and display helpers.

/// Number of topology-vector entries not wired to `reference_bus`.
///
/// Disconnected elements (`0`/negative) and elements on any other bus all
/// count as deviating, so the result is bounded by `topo_vect.len()`.
pub fn topology_distance(topo_vect: &[i32], reference_bus: i32) -> usize {
    topo_vect.iter().filter(|&&bus| bus != reference_bus).count()
}

/// Join impacted element names for display.
///
/// An empty list yields `None`, never an empty string.
pub fn format_elements_impacted<S: AsRef<str>>(elements: &[S], separator: &str) -> Option<String> {
    if elements.is_empty() {
        return None;
    }
    let joined = elements
        .iter()
        .map(|element| element.as_ref())
        .collect::<Vec<&str>>()
        .join(separator);
    Some(joined)
}

/// Drop repeated names, keeping the first occurrence of each.
pub fn dedup_preserving_order(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominal_topology_has_zero_distance() {
        assert_eq!(topology_distance(&[1, 1, 1, 1], 1), 0);
        assert_eq!(topology_distance(&[], 1), 0);
    }

    #[test]
    fn distance_counts_every_deviating_entry() {
        // two on bus 2, one disconnected, one marked -1
        let topo = [1, 2, 2, 0, -1, 1];
        assert_eq!(topology_distance(&topo, 1), 4);
        assert!(topology_distance(&topo, 1) <= topo.len());
    }

    #[test]
    fn distance_honours_reference_bus() {
        assert_eq!(topology_distance(&[2, 2, 1], 2), 1);
    }

    #[test]
    fn empty_list_formats_to_none() {
        let empty: [&str; 0] = [];
        assert_eq!(format_elements_impacted(&empty, " - "), None);
    }

    #[test]
    fn names_are_joined_with_separator() {
        assert_eq!(
            format_elements_impacted(&["sub_1", "sub_4"], " - ").as_deref(),
            Some("sub_1 - sub_4")
        );
        assert_eq!(
            format_elements_impacted(&["only"], " - ").as_deref(),
            Some("only")
        );
    }

    #[test]
    fn dedup_keeps_first_seen_order() {
        let names: Vec<String> = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dedup_preserving_order(&names), vec!["b", "a", "c"]);
    }
}
