use crate::{pass, StaticTracking};
use radiocc::io::read_table;
use radiocc::od::{
    Coverage, CoverageCriteria, CoverageFetcher, CoverageMode, CoverageRecord,
    OccultationPrediction, PassFilter, PassRow, TrackingError,
};
use radiocc::time::{Epoch, Unit};
use rstest::*;

fn at(hour: i64, minute: i64) -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2023, 5, 10) + Unit::Hour * hour + Unit::Minute * minute
}

#[fixture]
fn day() -> (Epoch, Epoch) {
    (
        Epoch::from_gregorian_utc_at_midnight(2023, 5, 10),
        Epoch::from_gregorian_utc_at_midnight(2023, 5, 11),
    )
}

#[rstest]
#[case::margins_inside(at(10, 0), at(11, 0), Coverage::Covered)]
#[case::late_start(at(10, 6), at(11, 0), Coverage::NotCovered)]
#[case::early_end(at(10, 0), at(10, 59), Coverage::NotCovered)]
#[case::wide(at(8, 0), at(12, 0), Coverage::Covered)]
fn single_pass_containment(
    day: (Epoch, Epoch),
    #[case] pass_start: Epoch,
    #[case] pass_end: Epoch,
    #[case] expected: Coverage,
) {
    let source = StaticTracking {
        occultations: vec![OccultationPrediction {
            ingress: at(10, 10),
            egress: at(10, 50),
        }],
        passes: vec![pass("NNO", pass_start, pass_end)],
        ..Default::default()
    };
    let report = CoverageFetcher::default()
        .fetch(&source, day.0, day.1)
        .unwrap();
    assert_eq!(report.occultations.len(), 1);
    assert_eq!(report.occultations[0].coverage, expected);
}

#[rstest]
fn excluded_passes_do_not_cover(day: (Epoch, Epoch)) {
    let mut shared = pass("CEB", at(9, 0), at(12, 0));
    shared.mspa = Some(true);
    let source = StaticTracking {
        occultations: vec![OccultationPrediction {
            ingress: at(10, 10),
            egress: at(10, 50),
        }],
        passes: vec![pass("KLZ", at(9, 0), at(12, 0)), shared],
        ..Default::default()
    };
    let report = CoverageFetcher::default()
        .fetch(&source, day.0, day.1)
        .unwrap();
    assert!(report.passes.is_empty());
    assert_eq!(report.occultations[0].coverage, Coverage::NotCovered);

    let permissive = CoverageFetcher::builder()
        .filter(
            PassFilter::builder()
                .excluded_stations(vec![])
                .exclude_mspa(false)
                .build(),
        )
        .build();
    let report = permissive.fetch(&source, day.0, day.1).unwrap();
    assert_eq!(report.passes.len(), 2);
    assert_eq!(report.covered().count(), 1);
}

#[rstest]
#[case(CoverageMode::SinglePass)]
#[case(CoverageMode::IndependentEdges)]
fn monotone_in_passes(day: (Epoch, Epoch), #[case] mode: CoverageMode) {
    let occultations: Vec<OccultationPrediction> = (0..20)
        .map(|i| OccultationPrediction {
            ingress: at(0, 30 + 70 * i),
            egress: at(0, 65 + 70 * i),
        })
        .collect();
    let candidates = vec![
        pass("NNO", at(0, 0), at(3, 0)),
        pass("CEB", at(2, 50), at(6, 0)),
        pass("MLG", at(5, 40), at(9, 0)),
        pass("NNO", at(9, 30), at(10, 20)),
        pass("CEB", at(12, 0), at(23, 0)),
        pass("MLG", at(0, 0), at(24, 0)),
    ];
    let fetcher = CoverageFetcher::builder()
        .criteria(CoverageCriteria::builder().mode(mode).build())
        .build();

    let mut previous: Vec<Coverage> = vec![Coverage::NotCovered; occultations.len()];
    for count in 0..=candidates.len() {
        let source = StaticTracking {
            occultations: occultations.clone(),
            passes: candidates[..count].to_vec(),
            ..Default::default()
        };
        let report = fetcher.fetch(&source, day.0, day.1).unwrap();
        let current: Vec<Coverage> = report.occultations.iter().map(|r| r.coverage).collect();
        for (before, after) in previous.iter().zip(&current) {
            assert!(
                !(*before == Coverage::Covered && *after == Coverage::NotCovered),
                "{mode:?} lost coverage with {count} passes"
            );
        }
        previous = current;
    }
    assert!(previous.iter().all(|c| *c == Coverage::Covered));
}

#[rstest]
fn undefined_before_2023() {
    let start = Epoch::from_gregorian_utc_at_midnight(2022, 12, 31);
    let end = Epoch::from_gregorian_utc_at_midnight(2023, 1, 2);
    let before = Epoch::from_gregorian_utc_hms(2022, 12, 31, 20, 0, 0);
    let after = Epoch::from_gregorian_utc_hms(2023, 1, 1, 4, 0, 0);
    // Passes before 2023 have no MSPA flag
    let mut undefined_mspa = pass("NNO", start, end);
    undefined_mspa.mspa = None;
    let source = StaticTracking {
        occultations: vec![
            OccultationPrediction {
                ingress: before,
                egress: before + Unit::Minute * 30,
            },
            OccultationPrediction {
                ingress: after,
                egress: after + Unit::Minute * 30,
            },
        ],
        passes: vec![undefined_mspa],
        ..Default::default()
    };
    let report = CoverageFetcher::default().fetch(&source, start, end).unwrap();
    assert_eq!(report.occultations[0].coverage, Coverage::Undefined);
    assert_eq!(report.occultations[1].coverage, Coverage::Covered);
}

#[rstest]
fn failure_aborts_fetch(day: (Epoch, Epoch)) {
    let source = StaticTracking {
        occultations: vec![OccultationPrediction {
            ingress: at(10, 10),
            egress: at(10, 50),
        }],
        failing_passes: true,
        ..Default::default()
    };
    let err = CoverageFetcher::default()
        .fetch(&source, day.0, day.1)
        .unwrap_err();
    match err {
        TrackingError::Status { start, end, status, .. } => {
            assert_eq!((start, end), day);
            assert_eq!(status, 503);
        }
        other => panic!("unexpected {other}"),
    }
}

#[rstest]
fn sorted_outputs_round_trip(day: (Epoch, Epoch)) {
    let mut late = pass("NNO", at(14, 0), at(18, 0));
    late.owlt = Unit::Minute * 12 + Unit::Second * 7;
    let source = StaticTracking {
        occultations: vec![
            OccultationPrediction {
                ingress: at(15, 0),
                egress: at(15, 40),
            },
            OccultationPrediction {
                ingress: at(10, 10),
                egress: at(10, 50),
            },
        ],
        passes: vec![late, pass("CEB", at(10, 0), at(11, 0))],
        ..Default::default()
    };
    let report = CoverageFetcher::default()
        .fetch(&source, day.0, day.1)
        .unwrap();

    assert_eq!(report.occultations[0].ingress, at(10, 10));
    assert_eq!(report.occultations[0].id, 0);
    assert_eq!(report.passes[0].station, "CEB");

    let occultations = crate::scratch_path("occultations.csv");
    report.write_occultations(&occultations).unwrap();
    let (title, records): (String, Vec<CoverageRecord>) = read_table(&occultations).unwrap();
    assert!(title.starts_with("occultations"));
    assert_eq!(records, report.occultations);

    let covered = crate::scratch_path("covered.csv");
    report.write_covered(&covered).unwrap();
    let (_, records): (String, Vec<CoverageRecord>) = read_table(&covered).unwrap();
    assert_eq!(records.len(), report.covered().count());

    let passes = crate::scratch_path("passes.csv");
    report.write_passes(&passes).unwrap();
    let (_, rows): (String, Vec<PassRow>) = read_table(&passes).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].start_corrected, at(13, 47) + Unit::Second * 53);
    assert_eq!(rows[1].mspa, Some(false));
}
