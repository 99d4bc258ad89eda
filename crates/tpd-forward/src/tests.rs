//! Unit tests for tpd-forward.
//!
//! Contact tests place vehicles explicitly; selector tests pair those
//! placements with a table of metrics or with a scripted encounter oracle.

#[cfg(test)]
mod helpers {
    use rustc_hash::FxHashMap;

    use tpd_core::{NodeId, Point, SimTime, VehicleId};
    use tpd_graph::DeliveryMetrics;
    use tpd_spatial::{RoadNetwork, RoadNetworkBuilder};

    use crate::{ContactIndex, DeliveryEstimator, ForwardResult, VehicleLocation};

    /// ```text
    ///          3
    ///          ↑
    ///   0 ──── 1 ──── 2
    /// ```
    ///
    /// 0–1 and 1–2 are two-way, 1 → 3 is one-way.  Every segment is 100 m.
    pub fn junction() -> (RoadNetwork, [NodeId; 4]) {
        let mut b = RoadNetworkBuilder::new();
        let n0 = b.add_node(Point::new(0.0, 0.0));
        let n1 = b.add_node(Point::new(100.0, 0.0));
        let n2 = b.add_node(Point::new(200.0, 0.0));
        let n3 = b.add_node(Point::new(100.0, 100.0));
        b.add_road(n0, n1, 100.0);
        b.add_road(n1, n2, 100.0);
        b.add_directed_edge(n1, n3, 100.0);
        (b.build(), [n0, n1, n2, n3])
    }

    pub fn seg(net: &RoadNetwork, from: NodeId, to: NodeId, offset: f64) -> VehicleLocation {
        VehicleLocation::Segment { edge: net.edge_between(from, to).unwrap(), offset }
    }

    pub fn index(net: &RoadNetwork, placed: &[(u32, VehicleLocation)]) -> ContactIndex {
        ContactIndex::from_locations(net, placed.iter().map(|&(v, loc)| (VehicleId(v), loc)), SimTime::ZERO)
    }

    pub fn m(edr: f64, edd: f64) -> DeliveryMetrics {
        DeliveryMetrics { edr, edd }
    }

    /// Fixed metrics per vehicle; anything unlisted is unreachable.
    #[derive(Default)]
    pub struct TableEstimator {
        pub table: FxHashMap<VehicleId, DeliveryMetrics>,
        pub calls: usize,
    }

    impl TableEstimator {
        pub fn with(entries: &[(u32, DeliveryMetrics)]) -> Self {
            Self {
                table: entries.iter().map(|&(v, m)| (VehicleId(v), m)).collect(),
                calls: 0,
            }
        }
    }

    impl DeliveryEstimator for TableEstimator {
        fn estimate(&mut self, _now: SimTime, vehicle: VehicleId, destination: VehicleId) -> ForwardResult<DeliveryMetrics> {
            self.calls += 1;
            if vehicle == destination {
                return Ok(DeliveryMetrics::DELIVERED);
            }
            Ok(self.table.get(&vehicle).copied().unwrap_or(DeliveryMetrics::UNREACHABLE))
        }
    }

    pub fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }
}

#[cfg(test)]
mod packet {
    use tpd_core::{PacketId, SimTime, TpdConfig, VehicleId};
    use tpd_encounter::ScriptedOracle;
    use tpd_graph::{GraphWorkspace, TpdEngine};

    use crate::{ForwardError, Packet};

    #[test]
    fn ttl_boundary() {
        let p = Packet::new(PacketId(1), VehicleId(0), VehicleId(5), SimTime(100.0), 60.0);
        assert_eq!(p.expires_at(), SimTime(160.0));
        assert!(!p.is_expired(SimTime(160.0)));
        assert!(p.is_expired(SimTime(160.5)));
        assert!(matches!(
            p.ensure_alive(SimTime(200.0)),
            Err(ForwardError::PacketExpired { expired_at, .. }) if expired_at == SimTime(160.0)
        ));
    }

    #[test]
    fn greedy_hand_off_counts_hops() {
        let mut p = Packet::new(PacketId(1), VehicleId(0), VehicleId(2), SimTime::ZERO, 60.0);
        assert!(!p.is_source_routed());
        p.hand_off(VehicleId(7)).unwrap();
        p.hand_off(VehicleId(2)).unwrap();
        assert_eq!(p.carrier(), VehicleId(2));
        assert_eq!(p.hops(), 2);
        assert!(p.is_delivered());
    }

    #[test]
    fn source_routed_packet_follows_its_graph() {
        let (a, b, c) = (VehicleId(0), VehicleId(1), VehicleId(2));
        let mut o = ScriptedOracle::new();
        o.meet(a, b, 10.0, 0.8).meet(b, c, 25.0, 0.5);
        let config = TpdConfig::default();
        let plan = TpdEngine::new(&o, &o, &config)
            .plan(&mut GraphWorkspace::new(), SimTime(3.0), a, c)
            .unwrap();

        let mut p = Packet::source_routed(PacketId(9), plan, 120.0);
        assert_eq!((p.source, p.destination, p.created_at), (a, c, SimTime(3.0)));
        assert!(p.is_source_routed());
        assert!(p.planned_metrics().unwrap().is_reachable());

        assert!(matches!(p.hand_off(c), Err(ForwardError::NotAChild { carrier, candidate }) if carrier == a && candidate == c));
        assert_eq!(p.carrier(), a);
        p.hand_off(b).unwrap();
        p.hand_off(c).unwrap();
        assert!(p.is_delivered());
        assert_eq!(p.hops(), 2);
    }
}

#[cfg(test)]
mod contact {
    use tpd_core::{ForwardingType, NodeId, Point, SimTime, VehicleId};
    use tpd_spatial::RoadNetworkBuilder;
    use tpd_trajectory::{TravelTimeStats, Trajectory, Vehicle, VehicleFleet};

    use super::helpers::*;
    use crate::{ContactIndex, VehicleLocation};

    fn ids(raw: &[u32]) -> Vec<VehicleId> {
        raw.iter().copied().map(VehicleId).collect()
    }

    #[test]
    fn one_way_segment_searches_one_group() {
        let (net, [n0, n1, _, n3]) = junction();
        let carrier = seg(&net, n1, n3, 50.0);
        let e13 = net.edge_between(n1, n3).unwrap();
        assert_eq!(carrier.search_groups(&net), vec![vec![e13]]);

        let idx = index(&net, &[
            (0, carrier),
            (1, seg(&net, n1, n3, 80.0)),
            (2, VehicleLocation::Intersection(n1)),
            (3, seg(&net, n0, n1, 90.0)), // 51 m away but on another road
        ]);
        let found = idx.candidates(&net, VehicleId(0), &[e13], 200.0, ForwardingType::Vehicle);
        assert_eq!(found, ids(&[1, 2]));
    }

    #[test]
    fn two_way_segment_searches_both_directions() {
        let (net, [n0, n1, ..]) = junction();
        let e01 = net.edge_between(n0, n1).unwrap();
        let e10 = net.edge_between(n1, n0).unwrap();
        let carrier = seg(&net, n0, n1, 50.0);
        assert_eq!(carrier.search_groups(&net), vec![vec![e01], vec![e10]]);

        let idx = index(&net, &[
            (0, carrier),
            (1, seg(&net, n0, n1, 70.0)),
            (2, seg(&net, n1, n0, 20.0)),
            (3, VehicleLocation::Intersection(n1)),
        ]);
        let forward = idx.candidates(&net, VehicleId(0), &[e01], 200.0, ForwardingType::Vehicle);
        let backward = idx.candidates(&net, VehicleId(0), &[e10], 200.0, ForwardingType::Vehicle);
        assert_eq!(forward, ids(&[1, 3]));
        assert_eq!(backward, ids(&[2, 3]));
    }

    #[test]
    fn intersection_searches_every_incident_edge() {
        let (net, [_, n1, _, n3]) = junction();
        let carrier = VehicleLocation::Intersection(n1);
        let groups = carrier.search_groups(&net);
        // out: 1→0, 1→2, 1→3; in: 0→1, 2→1
        assert_eq!(groups.len(), 5);
        assert!(groups.iter().all(|g| g.len() == 1));
        let e13 = net.edge_between(n1, n3).unwrap();
        assert!(groups.contains(&vec![e13]));

        let idx = index(&net, &[(0, carrier), (1, seg(&net, n1, n3, 30.0))]);
        for g in &groups {
            let found = idx.candidates(&net, VehicleId(0), g, 200.0, ForwardingType::Vehicle);
            assert_eq!(found.is_empty(), g[0] != e13);
        }
    }

    #[test]
    fn range_is_respected() {
        let (net, [n0, n1, ..]) = junction();
        let e01 = net.edge_between(n0, n1).unwrap();
        let idx = index(&net, &[
            (0, seg(&net, n0, n1, 50.0)),
            (1, seg(&net, n0, n1, 70.0)),
            (2, seg(&net, n0, n1, 85.0)),
        ]);
        let found = idx.candidates(&net, VehicleId(0), &[e01], 30.0, ForwardingType::Vehicle);
        assert_eq!(found, ids(&[1]));
        assert_eq!(idx.within(Point::new(50.0, 0.0), 30.0), ids(&[0, 1]));
    }

    #[test]
    fn convoy_reaches_through_relays() {
        let mut b = RoadNetworkBuilder::new();
        let n0 = b.add_node(Point::new(0.0, 0.0));
        let n1 = b.add_node(Point::new(1000.0, 0.0));
        b.add_road(n0, n1, 1000.0);
        let net = b.build();
        let e01 = net.edge_between(n0, n1).unwrap();

        let idx = index(&net, &[
            (0, seg(&net, n0, n1, 0.0)),
            (1, seg(&net, n0, n1, 150.0)),
            (2, seg(&net, n0, n1, 300.0)),
            (3, seg(&net, n0, n1, 450.0)),
            (4, seg(&net, n0, n1, 800.0)), // 350 m gap
        ]);
        let direct = idx.candidates(&net, VehicleId(0), &[e01], 200.0, ForwardingType::Vehicle);
        let convoy = idx.candidates(&net, VehicleId(0), &[e01], 200.0, ForwardingType::Convoy);
        assert_eq!(direct, ids(&[1]));
        assert_eq!(convoy, ids(&[1, 2, 3]));
    }

    #[test]
    fn build_from_fleet() {
        let (net, [n0, n1, n2, _]) = junction();
        let stats = TravelTimeStats::exact(10.0);
        let mut fleet = VehicleFleet::new();
        let moving = Trajectory::from_vertices(VehicleId(0), &net, &[n0, n1, n2], SimTime::ZERO, &stats).unwrap();
        fleet.insert(Vehicle::new(VehicleId(0), 10.0, moving, stats));
        fleet.insert(Vehicle::new(VehicleId(1), 10.0, Trajectory::stationary(n1, SimTime::ZERO), stats));
        fleet.insert(Vehicle::new(VehicleId(2), 10.0, Trajectory::stationary(NodeId(42), SimTime::ZERO), stats));

        let idx = ContactIndex::build(&net, &fleet, SimTime(5.0));
        assert_eq!(idx.time(), SimTime(5.0));
        assert_eq!(idx.len(), 2, "off-network vehicle is left out");
        match idx.location(VehicleId(0)) {
            Some(VehicleLocation::Segment { edge, offset }) => {
                assert_eq!(Some(edge), net.edge_between(n0, n1));
                assert!(close(offset, 50.0));
            }
            other => panic!("unexpected location {other:?}"),
        }
        assert_eq!(idx.location(VehicleId(1)), Some(VehicleLocation::Intersection(n1)));
        assert!(idx.location(VehicleId(2)).is_none());
    }
}

#[cfg(test)]
mod selector {
    use tpd_core::{NodeId, PacketId, SimTime, TpdConfig, VehicleId};
    use tpd_encounter::ScriptedOracle;
    use tpd_graph::{GraphWorkspace, TpdEngine};
    use tpd_spatial::RoadNetwork;

    use super::helpers::*;
    use crate::{
        ContactIndex, EngineEstimator, ForwardError, MetricsBoard, NextCarrierSelector, Packet,
        VehicleLocation,
    };

    const DEST: VehicleId = VehicleId(9);

    fn greedy_packet() -> Packet {
        Packet::new(PacketId(1), VehicleId(0), DEST, SimTime::ZERO, 600.0)
    }

    /// Carrier 0 mid-way along 0 → 1, three candidates around it.
    fn greedy_scene() -> (RoadNetwork, ContactIndex) {
        let (net, [n0, n1, ..]) = junction();
        let idx = index(&net, &[
            (0, seg(&net, n0, n1, 50.0)),
            (1, seg(&net, n0, n1, 80.0)),
            (2, seg(&net, n1, n0, 10.0)),
            (3, seg(&net, n0, n1, 60.0)),
        ]);
        (net, idx)
    }

    fn greedy_table() -> TableEstimator {
        TableEstimator::with(&[
            (0, m(0.6, 50.0)),
            (1, m(0.9, 30.0)),
            (2, m(0.8, 20.0)),
            (3, m(0.4, 5.0)),
        ])
    }

    #[test]
    fn greedy_picks_smallest_qualifying_edd() {
        let (net, idx) = greedy_scene();
        let config = TpdConfig::default();
        let board = MetricsBoard::new();
        let selector = NextCarrierSelector::new(&net, &idx, &config).with_board(&board);
        let mut packet = greedy_packet();

        let h = selector.select(&mut greedy_table(), &mut packet, SimTime::ZERO).unwrap().unwrap();
        assert_eq!(h.from, VehicleId(0));
        assert_eq!(h.to, VehicleId(2), "3 has the best EDD but misses the EDR threshold");
        assert_eq!(Some(h.edge), net.edge_between(NodeId(1), NodeId(0)));
        assert_eq!(packet.carrier(), VehicleId(2));
        assert_eq!(packet.hops(), 1);

        assert_eq!(board.len(), 4);
        let entry = board.get(VehicleId(3)).unwrap();
        assert_eq!(entry.destination, DEST);
        assert!(close(entry.metrics.edd, 5.0));
    }

    #[test]
    fn lower_threshold_admits_weaker_candidate() {
        let (net, idx) = greedy_scene();
        let config = TpdConfig { delivery_probability_threshold: 0.3, ..TpdConfig::default() };
        let selector = NextCarrierSelector::new(&net, &idx, &config);
        let mut packet = greedy_packet();
        let h = selector.greedy(&mut greedy_table(), &mut packet, SimTime::ZERO).unwrap().unwrap();
        assert_eq!(h.to, VehicleId(3));
    }

    #[test]
    fn equal_edd_does_not_move_packet() {
        let (net, [n0, n1, ..]) = junction();
        let idx = index(&net, &[(0, seg(&net, n0, n1, 50.0)), (1, seg(&net, n0, n1, 60.0))]);
        let config = TpdConfig::default();
        let selector = NextCarrierSelector::new(&net, &idx, &config);
        let mut table = TableEstimator::with(&[(0, m(0.6, 20.0)), (1, m(0.99, 20.0))]);
        let mut packet = greedy_packet();
        assert_eq!(selector.greedy(&mut table, &mut packet, SimTime::ZERO).unwrap(), None);
        assert_eq!(packet.carrier(), VehicleId(0));
        assert_eq!(packet.hops(), 0);
    }

    #[test]
    fn ties_break_on_edr_then_id() {
        let (net, [n0, n1, ..]) = junction();
        let idx = index(&net, &[
            (0, seg(&net, n0, n1, 50.0)),
            (4, seg(&net, n0, n1, 55.0)),
            (5, seg(&net, n0, n1, 60.0)),
            (6, seg(&net, n0, n1, 65.0)),
        ]);
        let config = TpdConfig::default();
        let selector = NextCarrierSelector::new(&net, &idx, &config);

        let mut table = TableEstimator::with(&[(0, m(0.5, 90.0)), (4, m(0.7, 10.0)), (5, m(0.9, 10.0)), (6, m(0.9, 10.0))]);
        let h = selector.greedy(&mut table, &mut greedy_packet(), SimTime::ZERO).unwrap().unwrap();
        assert_eq!(h.to, VehicleId(5));
    }

    #[test]
    fn estimates_are_cached_across_groups() {
        let (net, [n0, n1, ..]) = junction();
        // Vehicle 1 waits at intersection 0 and so touches both 0 → 1 and 1 → 0.
        let idx = index(&net, &[(0, VehicleLocation::Intersection(n1)), (1, VehicleLocation::Intersection(n0))]);
        let config = TpdConfig::default();
        let selector = NextCarrierSelector::new(&net, &idx, &config);
        let mut table = TableEstimator::with(&[(0, m(0.6, 40.0)), (1, m(0.8, 10.0))]);
        let h = selector.greedy(&mut table, &mut greedy_packet(), SimTime::ZERO).unwrap().unwrap();
        assert_eq!(h.to, VehicleId(1));
        assert_eq!(table.calls, 2);
    }

    #[test]
    fn destination_in_range_takes_packet() {
        let (net, [n0, n1, ..]) = junction();
        let idx = index(&net, &[(0, seg(&net, n0, n1, 50.0)), (DEST.0, seg(&net, n0, n1, 90.0))]);
        let config = TpdConfig::default();
        let selector = NextCarrierSelector::new(&net, &idx, &config);
        let mut table = TableEstimator::with(&[(0, m(0.7, 30.0))]);
        let mut packet = greedy_packet();

        let h = selector.select(&mut table, &mut packet, SimTime(1.0)).unwrap().unwrap();
        assert_eq!(h.to, DEST);
        assert!(packet.is_delivered());
        assert_eq!(selector.select(&mut table, &mut packet, SimTime(2.0)).unwrap(), None);
    }

    #[test]
    fn expired_and_unlocated_packets_fail() {
        let (net, [n0, n1, ..]) = junction();
        let idx = index(&net, &[(1, seg(&net, n0, n1, 50.0))]);
        let config = TpdConfig::default();
        let selector = NextCarrierSelector::new(&net, &idx, &config);
        let mut table = TableEstimator::default();

        let mut packet = Packet::new(PacketId(2), VehicleId(0), DEST, SimTime::ZERO, 10.0);
        assert!(matches!(
            selector.select(&mut table, &mut packet, SimTime(11.0)),
            Err(ForwardError::PacketExpired { .. })
        ));
        assert!(matches!(
            selector.select(&mut table, &mut packet, SimTime(5.0)),
            Err(ForwardError::CarrierNotLocated(v)) if v == VehicleId(0)
        ));
    }

    #[test]
    fn engine_estimator_drives_greedy_choice() {
        let (a, b, d, e) = (VehicleId(0), VehicleId(1), VehicleId(3), VehicleId(4));
        let mut o = ScriptedOracle::new();
        o.meet(a, e, 5.0, 0.5)
            .meet(e, d, 200.0, 1.0)
            .meet(a, b, 10.0, 0.9)
            .meet(b, d, 20.0, 1.0);
        let config = TpdConfig::default();

        let (net, [n0, n1, ..]) = junction();
        let idx = index(&net, &[(0, seg(&net, n0, n1, 10.0)), (1, seg(&net, n0, n1, 40.0))]);
        let selector = NextCarrierSelector::new(&net, &idx, &config);
        let mut estimator = EngineEstimator::new(TpdEngine::new(&o, &o, &config));
        let mut packet = Packet::new(PacketId(3), a, d, SimTime::ZERO, 600.0);

        let h = selector.select(&mut estimator, &mut packet, SimTime::ZERO).unwrap().unwrap();
        assert_eq!(h.to, b);
        assert!(close(h.metrics.edr, 1.0));
        assert!(close(h.metrics.edd, 20.0));
    }

    // ── Source routing ────────────────────────────────────────────────────

    const A: VehicleId = VehicleId(0);
    const B: VehicleId = VehicleId(1);
    const C: VehicleId = VehicleId(2);
    const D: VehicleId = VehicleId(3);

    /// B reaches D late and unreliably; C reaches D soon and for certain.
    fn source_oracle() -> ScriptedOracle {
        let mut o = ScriptedOracle::new();
        o.meet(A, B, 10.0, 0.9)
            .meet(B, D, 50.0, 0.5)
            .meet(A, C, 20.0, 0.9)
            .meet(C, D, 30.0, 1.0);
        o
    }

    fn source_config(optimized: bool) -> TpdConfig {
        TpdConfig {
            encounter_graph_source_routing: true,
            encounter_graph_optimization: optimized,
            ..TpdConfig::default()
        }
    }

    fn source_packet(config: &TpdConfig) -> Packet {
        let o = source_oracle();
        let plan = TpdEngine::new(&o, &o, config)
            .plan(&mut GraphWorkspace::new(), SimTime::ZERO, A, D)
            .unwrap();
        Packet::source_routed(PacketId(7), plan, 600.0)
    }

    #[test]
    fn source_routing_prefers_best_child_and_ignores_strangers() {
        let config = source_config(false);
        let mut packet = source_packet(&config);
        let (net, [n0, n1, ..]) = junction();
        let idx = index(&net, &[
            (0, seg(&net, n0, n1, 10.0)),
            (1, seg(&net, n0, n1, 30.0)),
            (2, seg(&net, n0, n1, 50.0)),
            (8, seg(&net, n0, n1, 60.0)), // not in the graph
        ]);
        let mut unused = TableEstimator::default();
        let selector = NextCarrierSelector::new(&net, &idx, &config);

        let h = selector.select(&mut unused, &mut packet, SimTime(20.0)).unwrap().unwrap();
        assert_eq!(h.to, C);
        assert!(close(h.metrics.edd, 10.0));
        assert_eq!(unused.calls, 0, "source routing never re-estimates");

        let idx = index(&net, &[(2, seg(&net, n0, n1, 50.0)), (3, seg(&net, n0, n1, 70.0))]);
        let selector = NextCarrierSelector::new(&net, &idx, &config);
        let h = selector.select(&mut unused, &mut packet, SimTime(30.0)).unwrap().unwrap();
        assert_eq!(h.to, D);
        assert!(packet.is_delivered());
        assert_eq!(packet.hops(), 2);
    }

    #[test]
    fn optimal_subsequence_restricts_source_children() {
        let (net, [n0, n1, ..]) = junction();
        let idx = index(&net, &[(0, seg(&net, n0, n1, 10.0)), (1, seg(&net, n0, n1, 30.0))]);

        let full = source_config(false);
        let mut packet = source_packet(&full);
        let h = NextCarrierSelector::new(&net, &idx, &full).source(&mut packet, SimTime(10.0)).unwrap();
        assert_eq!(h.map(|h| h.to), Some(B));

        let optimized = source_config(true);
        let mut packet = source_packet(&optimized);
        let h = NextCarrierSelector::new(&net, &idx, &optimized).source(&mut packet, SimTime(10.0)).unwrap();
        assert_eq!(h, None, "B is outside A's forwarding set");
        assert_eq!(packet.carrier(), A);
    }

    #[test]
    fn source_mode_needs_a_frozen_graph() {
        let (net, [n0, n1, ..]) = junction();
        let idx = index(&net, &[(0, seg(&net, n0, n1, 10.0))]);
        let config = source_config(false);
        let selector = NextCarrierSelector::new(&net, &idx, &config);
        let mut packet = Packet::new(PacketId(5), A, D, SimTime::ZERO, 60.0);
        assert!(matches!(
            selector.select(&mut TableEstimator::default(), &mut packet, SimTime::ZERO),
            Err(ForwardError::NotSourceRouted(id)) if id == PacketId(5)
        ));
    }
}

#[cfg(test)]
mod metrics {
    use tpd_core::{SimTime, VehicleId};
    use tpd_graph::DeliveryMetrics;

    use crate::MetricsBoard;

    #[test]
    fn record_overwrites() {
        let board = MetricsBoard::new();
        assert!(board.is_empty());
        board.record(VehicleId(1), VehicleId(9), DeliveryMetrics::UNREACHABLE, SimTime(1.0));
        board.record(VehicleId(1), VehicleId(9), DeliveryMetrics { edr: 0.7, edd: 12.0 }, SimTime(2.0));
        let entry = board.get(VehicleId(1)).unwrap();
        assert_eq!(entry.computed_at, SimTime(2.0));
        assert_eq!(entry.metrics.edr, 0.7);
        assert_eq!(board.len(), 1);
        board.clear();
        assert!(board.get(VehicleId(1)).is_none());
    }

    #[test]
    fn concurrent_writers() {
        let board = MetricsBoard::new();
        std::thread::scope(|s| {
            for t in 0..4u32 {
                let board = &board;
                s.spawn(move || {
                    for i in 0..50u32 {
                        let v = VehicleId(t * 50 + i);
                        board.record(v, VehicleId(999), DeliveryMetrics::DELIVERED, SimTime(i as f64));
                    }
                });
            }
        });
        assert_eq!(board.len(), 200);
    }
}
