use proptest::prelude::*;
use vantage_graph::ViewArea;
use vantage_level::SectionCoord;
use vantage_section::SectionOccupancy;

fn arb_center() -> impl Strategy<Value = SectionCoord> {
    (-20i32..20, -20i32..20, -20i32..20).prop_map(|(x, y, z)| SectionCoord::new(x, y, z))
}

proptest! {
    #[test]
    fn every_slot_resolves_after_any_walk(
        start in arb_center(),
        walk in prop::collection::vec(arb_center(), 1..8),
        radius in 1i32..4,
    ) {
        let mut area = ViewArea::new(radius, start);
        for center in walk {
            area.recenter(center);
            for coord in area.coords().collect::<Vec<_>>() {
                prop_assert_eq!(area.get(coord).map(|rs| rs.coord), Some(coord));
            }
        }
    }

    #[test]
    fn recenter_preserves_surviving_slots_and_resets_the_rest(
        start in arb_center(),
        step in (-3i32..=3, -3i32..=3, -3i32..=3),
        radius in 1i32..4,
    ) {
        let mut area = ViewArea::new(radius, start);
        for coord in area.coords().collect::<Vec<_>>() {
            let rs = area.get_mut(coord).unwrap();
            rs.occupancy = Some(SectionOccupancy::Empty);
            rs.dirty = false;
        }
        let before: Vec<SectionCoord> = area.coords().collect();
        let next = start.offset(step.0, step.1, step.2);
        let fresh = area.recenter(next);
        for coord in area.coords().collect::<Vec<_>>() {
            let rs = area.get(coord).unwrap();
            if before.contains(&coord) {
                prop_assert!(!rs.dirty, "surviving slot lost its state");
            } else {
                prop_assert!(fresh.contains(&coord));
                prop_assert!(rs.dirty && rs.occupancy.is_none());
            }
        }
        // Everything fresh really is new ground.
        prop_assert!(fresh.iter().all(|c| !before.contains(c)));
    }
}
