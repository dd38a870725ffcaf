use crate::CircularLink;
use radiocc::analysis::{render_plots, CoverageMatcher, CoverageStatus, MatchError};
use radiocc::md::{OccultationEvent, OccultationLocator};
use radiocc::od::{Coverage, CoverageRecord};
use radiocc::time::{Epoch, Unit};
use rstest::*;

#[fixture]
fn events() -> Vec<OccultationEvent> {
    let start = Epoch::from_gregorian_utc_at_midnight(2022, 12, 31) + Unit::Hour * 16;
    OccultationLocator::builder()
        .workers(2)
        .build()
        .find_events(&CircularLink::new(start), start, start + Unit::Hour * 16)
        .unwrap()
}

/// Coverage record offset from the detected ingress, as a tracking service would predict it.
fn record(id: usize, event: &OccultationEvent, offset_s: f64, coverage: Coverage) -> CoverageRecord {
    CoverageRecord {
        id,
        ingress: event.ingress.epoch + Unit::Second * offset_s,
        egress: event.egress.epoch + Unit::Second * offset_s,
        coverage,
    }
}

#[rstest]
fn statuses_and_summary(events: Vec<OccultationEvent>) {
    // Occultations every two hours from 16:38 on the last day of 2022
    assert_eq!(events.len(), 8);
    let first_defined = events
        .iter()
        .position(|e| e.ingress.epoch >= Epoch::from_gregorian_utc_at_midnight(2023, 1, 1))
        .unwrap();
    assert_eq!(first_defined, 4);

    let records = vec![
        record(0, &events[0], 12.0, Coverage::Undefined),
        record(1, &events[4], -45.0, Coverage::Covered),
        record(2, &events[5], 30.0, Coverage::NotCovered),
        record(3, &events[7], 0.5, Coverage::Covered),
    ];

    let matched = CoverageMatcher::default()
        .match_events(&events, &records)
        .unwrap();
    let statuses: Vec<CoverageStatus> = matched.all().map(|m| m.status).collect();
    assert_eq!(
        statuses,
        vec![
            CoverageStatus::Undefined,
            CoverageStatus::Undefined,
            CoverageStatus::Undefined,
            CoverageStatus::Undefined,
            CoverageStatus::Covered,
            CoverageStatus::NotCovered,
            CoverageStatus::Unknown,
            CoverageStatus::Covered,
        ]
    );
    assert_eq!(matched.events[0].record_id, Some(0));
    assert_eq!(matched.events[6].record_id, None);

    let summary = matched.summary;
    assert_eq!(summary.total, 8);
    assert_eq!(summary.undefined, 4);
    assert_eq!(summary.defined, 4);
    assert_eq!(summary.covered, 2);
    assert_eq!(summary.not_covered, 1);
    assert_eq!(summary.unknown, 1);
    assert_eq!(summary.coverage_percent(), Some(50.0));

    let covered: Vec<usize> = matched.covered().map(|m| m.event.id).collect();
    assert_eq!(covered, vec![4, 7]);
}

#[rstest]
fn unmatched_record_fails(events: Vec<OccultationEvent>) {
    let records = vec![
        record(0, &events[5], 0.0, Coverage::Covered),
        record(1, &events[6], 90.0, Coverage::Covered),
    ];
    let err = CoverageMatcher::default()
        .match_events(&events, &records)
        .unwrap_err();
    assert_eq!(
        err,
        MatchError::UnmatchedRecord {
            record_id: 1,
            ingress: events[6].ingress.epoch + Unit::Second * 90.0
        }
    );

    // A wider tolerance accepts it
    let lenient = CoverageMatcher::builder().tolerance(Unit::Minute * 2).build();
    let matched = lenient.match_events(&events, &records).unwrap();
    assert_eq!(matched.events[6].status, CoverageStatus::Covered);
}

#[rstest]
fn window_excludes_records(events: Vec<OccultationEvent>) {
    let records = vec![
        record(0, &events[1], 0.0, Coverage::Undefined),
        record(1, &events[6], 0.0, Coverage::Covered),
    ];
    let matcher = CoverageMatcher::builder()
        .window_start(events[4].ingress.epoch - Unit::Minute * 1)
        .window_end(events[7].egress.epoch)
        .build();
    let matched = matcher.match_events(&events, &records).unwrap();
    assert_eq!(matched.events.len(), 4);
    assert_eq!(matched.records_outside, 1);
    assert_eq!(matched.summary.undefined, 0);
    assert_eq!(matched.summary.unknown, 3);

    let inverted = CoverageMatcher::builder()
        .window_start(events[7].egress.epoch)
        .window_end(events[4].ingress.epoch)
        .build();
    assert!(matches!(
        inverted.match_events(&events, &records),
        Err(MatchError::InvalidWindow { .. })
    ));
}

#[rstest]
fn plots_hold_partitions(events: Vec<OccultationEvent>) {
    let records = vec![record(0, &events[4], 0.0, Coverage::Covered)];
    let matched = CoverageMatcher::default()
        .match_events(&events, &records)
        .unwrap();

    let dir = crate::scratch_path("plots");
    let written = render_plots(&matched, &dir).unwrap();
    assert_eq!(written.len(), 6);
    for path in &written {
        let html = std::fs::read_to_string(path).unwrap();
        if path.to_string_lossy().ends_with("_covered.html") {
            assert!(html.contains("Ingress (N = 1)"));
            assert!(html.contains("Egress (N = 1)"));
        } else {
            assert!(html.contains("Ingress (N = 8)"));
        }
    }
}
