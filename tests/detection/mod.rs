use crate::CircularLink;
use approx::assert_abs_diff_eq;
use radiocc::md::{OccultationEvent, OccultationLocator};
use radiocc::pipeline::{read_events, write_events};
use radiocc::time::{Duration, Epoch, Unit};
use rstest::*;

#[fixture]
fn start() -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2023, 3, 1)
}

#[fixture]
fn link(start: Epoch) -> CircularLink {
    CircularLink::new(start)
}

fn locator(workers: usize) -> OccultationLocator {
    OccultationLocator::builder()
        .workers(workers)
        .chunk_samples(3_600)
        .build()
}

#[rstest]
fn analytic_crossings(start: Epoch, link: CircularLink) {
    let _ = pretty_env_logger::try_init();
    let end = start + Unit::Day * 1;
    let events = locator(4).find_events(&link, start, end).unwrap();
    let expected = link.analytic_events(end);

    // One occultation per revolution
    assert_eq!(expected.len(), 12);
    assert_eq!(events.len(), 12);

    for (event, (ingress, egress)) in events.iter().zip(expected) {
        assert!(
            (event.ingress.epoch - ingress).abs() <= Unit::Millisecond * 2,
            "ingress {} vs {ingress}",
            event.ingress.epoch
        );
        assert!(
            (event.egress.epoch - egress).abs() <= Unit::Millisecond * 2,
            "egress {} vs {egress}",
            event.egress.epoch
        );
    }
}

#[rstest]
#[case(Unit::Second * 1)]
#[case(Unit::Second * 30)]
#[case(Unit::Minute * 5)]
#[case(Unit::Minute * 15)]
fn step_convergence(start: Epoch, link: CircularLink, #[case] step: Duration) {
    let end = start + Unit::Day * 1;
    let locator = OccultationLocator::builder()
        .step(step)
        .workers(2)
        .chunk_samples(60)
        .build();
    let events = locator.find_events(&link, start, end).unwrap();
    let expected = link.analytic_events(end);
    assert_eq!(events.len(), expected.len(), "step of {step}");

    for (event, (ingress, egress)) in events.iter().zip(expected) {
        assert!((event.ingress.epoch - ingress).abs() <= Unit::Millisecond * 2);
        assert!((event.egress.epoch - egress).abs() <= Unit::Millisecond * 2);
    }
}

#[rstest]
fn coarse_step_misses_occultations(start: Epoch, link: CircularLink) {
    let end = start + Unit::Day * 1;
    // Every sample falls at the same orbit phase, outside of the occultation
    let locator = OccultationLocator::builder()
        .step(link.period)
        .workers(1)
        .build();
    let events = locator.find_events(&link, start, end).unwrap();
    assert!(events.is_empty());
    assert_eq!(link.analytic_events(end).len(), 12);
}

#[rstest]
fn tangent_points(start: Epoch, link: CircularLink) {
    let end = start + Unit::Hour * 6;
    let events = locator(2).find_events(&link, start, end).unwrap();
    assert!(!events.is_empty());

    for event in &events {
        // The ray grazes the planet at the crossings
        assert_abs_diff_eq!(event.ingress.tangent_altitude_km, 0.0, epsilon = 1e-2);
        assert_abs_diff_eq!(event.egress.tangent_altitude_km, 0.0, epsilon = 1e-2);

        assert_abs_diff_eq!(event.ingress.latitude_deg, 30.0, epsilon = 1e-3);
        assert_abs_diff_eq!(event.ingress.longitude_deg, 90.0, epsilon = 1e-3);
        assert_abs_diff_eq!(event.egress.latitude_deg, -30.0, epsilon = 1e-3);
        assert_abs_diff_eq!(event.egress.longitude_deg, -90.0, epsilon = 1e-3);

        // The Sun is along +Y
        assert_abs_diff_eq!(event.ingress.sza_deg, 30.0, epsilon = 1e-3);
        assert_abs_diff_eq!(event.egress.sza_deg, 150.0, epsilon = 1e-3);

        let elapsed_days = (event.ingress.epoch - start).to_unit(Unit::Day);
        assert_abs_diff_eq!(event.solar_longitude_deg(), elapsed_days * 0.5, epsilon = 1e-9);
    }
}

#[rstest]
fn ordered_and_disjoint(start: Epoch, link: CircularLink) {
    let end = start + Unit::Day * 1;
    let events = locator(3).find_events(&link, start, end).unwrap();

    for (id, event) in events.iter().enumerate() {
        assert_eq!(event.id, id);
        assert!(event.ingress.epoch < event.egress.epoch);
        assert!(event.ingress.epoch > start && event.egress.epoch < end);
    }
    for pair in events.windows(2) {
        assert!(pair[0].egress.epoch <= pair[1].ingress.epoch);
        assert!(!pair[0].overlaps(&pair[1]));
    }
}

#[rstest]
fn independent_of_workers(start: Epoch, link: CircularLink) {
    let end = start + Unit::Day * 1;
    let single = locator(1).find_events(&link, start, end).unwrap();
    for workers in [2, 5, 8] {
        let many = locator(workers).find_events(&link, start, end).unwrap();
        assert_eq!(single, many, "{workers} workers");
    }

    // A single chunk must find the crossings located on the chunk boundaries of the other runs
    let whole = OccultationLocator::builder()
        .workers(1)
        .chunk_samples(1_000_000)
        .build()
        .find_events(&link, start, end)
        .unwrap();
    assert_eq!(single, whole);
}

#[rstest]
fn truncated_occultations(start: Epoch, link: CircularLink) {
    let (first_ingress, first_egress) = link.analytic_events(start + Unit::Day * 1)[0];

    // Starting within the first occultation drops its egress
    let events = locator(2)
        .find_events(&link, first_ingress + Unit::Minute * 1, start + Unit::Hour * 6)
        .unwrap();
    assert_eq!(events.len(), 2);
    assert!(events[0].ingress.epoch > first_egress);

    // Ending within an occultation drops its ingress
    let events = locator(2)
        .find_events(&link, start, first_egress - Unit::Minute * 1)
        .unwrap();
    assert!(events.is_empty());
}

#[rstest]
fn skipped_samples(start: Epoch) {
    let end = start + Unit::Day * 1;
    let baseline = locator(2)
        .find_events(&CircularLink::new(start), start, end)
        .unwrap();

    // The spacecraft is in view from the start of the search for close to an hour
    let clear_gap = CircularLink::new(start).with_gap(
        start + Unit::Minute * 10,
        start + Unit::Minute * 20 + Unit::Millisecond * 500,
    );
    let events = locator(2).find_events(&clear_gap, start, end).unwrap();
    assert_eq!(events, baseline);

    // A gap over an ingress prevents its refinement: only that occultation is lost
    let ingress = baseline[3].ingress.epoch;
    let ingress_gap = CircularLink::new(start)
        .with_gap(ingress - Unit::Second * 30, ingress + Unit::Second * 30);
    let events = locator(2).find_events(&ingress_gap, start, end).unwrap();
    assert_eq!(events.len(), baseline.len() - 1);

    let kept: Vec<Epoch> = events.iter().map(|e| e.ingress.epoch).collect();
    let expected: Vec<Epoch> = baseline
        .iter()
        .filter(|e| e.ingress.epoch != ingress)
        .map(|e| e.ingress.epoch)
        .collect();
    assert_eq!(kept, expected);
}

#[rstest]
fn invalid_settings(start: Epoch, link: CircularLink) {
    assert!(locator(1).find_events(&link, start, start).is_err());
    let no_iterations = OccultationLocator::builder().max_iterations(0).build();
    assert!(no_iterations
        .find_events(&link, start, start + Unit::Hour * 1)
        .is_err());
}

#[rstest]
fn events_table_round_trip(start: Epoch, link: CircularLink) {
    let events = locator(2)
        .find_events(&link, start, start + Unit::Hour * 8)
        .unwrap();
    assert!(!events.is_empty());

    let path = crate::scratch_path("events.csv");
    write_events(&path, &events).unwrap();
    let reloaded: Vec<OccultationEvent> = read_events(&path).unwrap();
    assert_eq!(reloaded, events);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("# occultation events -- created on "));
}
