//! Property-based tests for vpc-topologies using proptest.
//!
//! Random address plans and declaration orders, checked against the
//! invariants the validator and the graph rely on.

use proptest::prelude::*;
use vpc_topologies::cidr::Cidr;
use vpc_topologies::prelude::*;
use vpc_topologies::resources::{InternetGateway, LogicalId};

// ============================================================================
// Strategies for generating test data
// ============================================================================

/// A canonical block: random address truncated to a random prefix.
fn canonical_cidr() -> impl Strategy<Value = Cidr> {
    (any::<u32>(), 0u8..=32).prop_map(|(addr, prefix)| {
        let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - u32::from(prefix)) };
        let network = std::net::Ipv4Addr::from(addr & mask);
        Cidr::parse(&format!("{}/{}", network, prefix)).unwrap()
    })
}

/// Between 1 and 12 gateway ids.
fn gateway_count() -> impl Strategy<Value = usize> {
    1usize..12
}

// ============================================================================
// CIDR properties
// ============================================================================

proptest! {
    #[test]
    fn prop_cidr_display_parses_back(cidr in canonical_cidr()) {
        let reparsed = Cidr::parse(&cidr.to_string()).unwrap();
        prop_assert_eq!(reparsed, cidr);
    }

    #[test]
    fn prop_containment_implies_overlap(a in canonical_cidr(), b in canonical_cidr()) {
        if a.contains(&b) {
            prop_assert!(a.overlaps(&b));
            prop_assert!(a.prefix_len() <= b.prefix_len());
        }
    }

    #[test]
    fn prop_overlap_is_symmetric(a in canonical_cidr(), b in canonical_cidr()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn prop_any_contains_everything(cidr in canonical_cidr()) {
        prop_assert!(Cidr::any().contains(&cidr));
    }

    #[test]
    fn prop_host_bits_are_rejected(addr in any::<u32>(), prefix in 0u8..32) {
        let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - u32::from(prefix)) };
        prop_assume!(addr & !mask != 0);
        let literal = format!("{}/{}", std::net::Ipv4Addr::from(addr), prefix);
        let rejected = matches!(Cidr::parse(&literal), Err(Error::InvalidCidr { .. }));
        prop_assert!(rejected, "{} was accepted", literal);
    }

    #[test]
    fn prop_garbage_never_panics(input in "\\PC{0,24}") {
        let _ = Cidr::parse(&input);
    }
}

// ============================================================================
// Graph properties
// ============================================================================

fn chain_stack(count: usize, edges: &[(usize, usize)]) -> Stack {
    let mut stack = Stack::new("prop", "us-east-1");
    let ids: Vec<LogicalId> = (0..count)
        .map(|i| stack.add(&format!("Gateway{}", i), InternetGateway::new()).unwrap())
        .collect();
    for &(dependent, dependency) in edges {
        if dependent != dependency {
            stack.add_dependency(&ids[dependent], &ids[dependency]).unwrap();
        }
    }
    stack
}

proptest! {
    #[test]
    fn prop_forward_edges_always_order(
        (count, edges) in gateway_count().prop_flat_map(|n| {
            (Just(n), prop::collection::vec((0..n, 0..n), 0..24))
        })
    ) {
        // Only later ids depend on earlier ones, so the graph is acyclic.
        let edges: Vec<(usize, usize)> = edges
            .into_iter()
            .map(|(a, b)| if a > b { (a, b) } else { (b, a) })
            .collect();
        let stack = chain_stack(count, &edges);
        let graph = stack.graph();

        let order = graph.provisioning_order().unwrap();
        prop_assert_eq!(order.len(), count);
        let position = |i: usize| order.iter().position(|id| *id == format!("Gateway{}", i)).unwrap();
        for (dependent, dependency) in edges {
            if dependent != dependency {
                prop_assert!(position(dependency) < position(dependent));
            }
        }
        prop_assert!(!graph.has_cycles());
    }

    #[test]
    fn prop_back_edge_is_a_cycle(count in 2usize..12) {
        let mut edges: Vec<(usize, usize)> = (1..count).map(|i| (i, i - 1)).collect();
        edges.push((0, count - 1));
        let stack = chain_stack(count, &edges);

        prop_assert!(stack.graph().provisioning_order().is_err());
        prop_assert_eq!(stack.validate().by_rule("V010").len(), 1);
    }
}

// ============================================================================
// Topology properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_topologies_are_region_independent(region in "(us|eu|ap)-(east|west|central)-[1-3]") {
        for topology in Topology::ALL {
            let settings = StackSettings::new(topology, &region);
            let stack = topology.build(&settings).unwrap();
            let template = stack.synthesize().unwrap();
            prop_assert_eq!(template.resources.len(), stack.len());
            prop_assert_eq!(stack.region(), region.as_str());
        }
    }
}
