use crate::{pass, CircularLink, StaticTracking};
use radiocc::analysis::CoverageStatus;
use radiocc::io::ConfigRepr;
use radiocc::od::OccultationPrediction;
use radiocc::pipeline::{Pipeline, PipelineConfig};
use radiocc::time::{Epoch, Unit};
use radiocc::PipelineError;
use rstest::*;

#[fixture]
fn start() -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2023, 8, 1)
}

fn config(start: Epoch, outputs: &str) -> PipelineConfig {
    let yaml = format!(
        r#"
start: {start}
end: {}
detector:
  step: 1 s
  workers: 2
coverage:
  criteria:
    margin: 10 min
matcher:
  tolerance: 1 min
output:
{outputs}
"#,
        start + Unit::Hour * 12
    );
    PipelineConfig::loads(&yaml).unwrap()
}

/// Tracking records matching the first four occultations of the circular link, with a pass over the first two.
fn tracking(link: &CircularLink, start: Epoch) -> StaticTracking {
    let occultations = link
        .analytic_events(start + Unit::Hour * 12)
        .into_iter()
        .take(4)
        .map(|(ingress, egress)| OccultationPrediction {
            ingress: ingress + Unit::Second * 5,
            egress: egress + Unit::Second * 5,
        })
        .collect();
    StaticTracking {
        occultations,
        passes: vec![pass("NNO", start, start + Unit::Hour * 3)],
        ..Default::default()
    }
}

#[rstest]
fn in_memory_run(start: Epoch) {
    let _ = pretty_env_logger::try_init();
    let link = CircularLink::new(start);
    let pipeline = Pipeline::new(config(start, "  plots: ~"));
    let matched = pipeline.run(&link, &tracking(&link, start)).unwrap();

    let statuses: Vec<CoverageStatus> = matched.all().map(|m| m.status).collect();
    assert_eq!(
        statuses,
        vec![
            CoverageStatus::Covered,
            CoverageStatus::NotCovered,
            CoverageStatus::NotCovered,
            CoverageStatus::NotCovered,
            CoverageStatus::Unknown,
            CoverageStatus::Unknown,
        ]
    );
    assert_eq!(matched.summary.defined, 6);
}

#[rstest]
fn staged_through_files(start: Epoch) {
    let link = CircularLink::new(start);
    let outputs = format!(
        "  events: {}\n  occultations: {}\n  covered: {}\n  passes: {}",
        crate::scratch_path("staged-events.csv").display(),
        crate::scratch_path("staged-occultations.csv").display(),
        crate::scratch_path("staged-covered.csv").display(),
        crate::scratch_path("staged-passes.csv").display(),
    );
    let pipeline = Pipeline::new(config(start, &outputs));

    let events = pipeline.detect(&link).unwrap();
    let report = pipeline.fetch(&tracking(&link, start)).unwrap();
    let in_memory = pipeline.match_events(&events, &report.occultations).unwrap();

    let from_files = pipeline.match_files().unwrap();
    assert_eq!(from_files, in_memory);
}

#[rstest]
fn missing_inputs(start: Epoch) {
    let pipeline = Pipeline::new(config(start, "  plots: ~"));
    assert!(matches!(
        pipeline.match_files(),
        Err(PipelineError::MissingSetting { .. })
    ));
    assert!(matches!(
        pipeline.ephemeris(),
        Err(PipelineError::MissingSetting { .. })
    ));
    assert!(matches!(
        pipeline.tracking_client(),
        Err(PipelineError::Tracking { .. })
    ));
}

#[rstest]
fn occultation_truncated_by_range(start: Epoch) {
    let link = CircularLink::new(start);
    let occultations = link.analytic_events(start + Unit::Hour * 12);
    // The range starts during the first occultation, which the service predicts slightly late
    let range_start = occultations[0].0 + Unit::Second * 5;
    let tracking = StaticTracking {
        occultations: occultations
            .iter()
            .take(4)
            .map(|(ingress, egress)| OccultationPrediction {
                ingress: *ingress + Unit::Second * 30,
                egress: *egress + Unit::Second * 30,
            })
            .collect(),
        passes: vec![pass("NNO", range_start, range_start + Unit::Hour * 3)],
        ..Default::default()
    };

    let pipeline = Pipeline::new(config(range_start, "  plots: ~"));
    let matched = pipeline.run(&link, &tracking).unwrap();

    assert_eq!(matched.records_outside, 1);
    assert_eq!(matched.summary.total, 5);
    let record_ids: Vec<Option<usize>> = matched.all().map(|m| m.record_id).collect();
    assert_eq!(record_ids, vec![Some(1), Some(2), Some(3), None, None]);
}
