mod common;
use cluedo::io::{load_recording, write_analysis, write_recording};
use cluedo::{
    analyze, baseline_epochs, mean_per_marker, report, stack_categories, timestamps, AnalysisConfig,
    AnalysisError, Category, EmptyBaselinePolicy, Method, Recording,
};
use common::{all_channels, read_header, session, tmp_path, SFREQ};
use ndarray::{Array2, Axis};
use std::collections::BTreeSet;

// Plum (code 18), Rope (28), Study (39).
const TARGETS: [i32; 3] = [18, 28, 39];

#[test]
fn recovers_targets_on_default_channel() {
    let s = session(&TARGETS, 4, 5, 10.0);
    let analysis = analyze(&s.rec, &AnalysisConfig::default()).unwrap();

    assert_eq!(analysis.channel_names, vec!["Fz"]);
    assert_eq!(analysis.n_epochs, 27 * 5);
    assert_eq!(analysis.epoch_samples, 100);
    assert_eq!(analysis.verdict(Method::MeanPeak), vec!["Plum", "Rope", "Study"]);
    assert_eq!(analysis.verdict(Method::ElectrodeVote), vec!["Plum", "Rope", "Study"]);
}

#[test]
fn recovers_targets_on_all_channels() {
    let s = session(&TARGETS, 6, 3, 10.0);
    let analysis = analyze(&s.rec, &all_channels()).unwrap();

    for stack in &analysis.stacks {
        assert_eq!(stack.data.dim(), (9, 6, 100));
    }
    assert_eq!(analysis.votes[1].scores[7], 6.0, "all six channels vote for Rope");
    assert_eq!(analysis.verdict(Method::MeanPeak), vec!["Plum", "Rope", "Study"]);
}

#[test]
fn report_renders_both_methods() {
    let s = session(&TARGETS, 2, 2, 10.0);
    let text = report::render(&analyze(&s.rec, &all_channels()).unwrap());
    assert!(text.contains("Method: mean peak over electrodes:\nPlum killed with the Rope in the Study"), "{text}");
    assert!(text.contains("Method: peak-based voting over electrodes:\nPlum killed with the Rope in the Study"), "{text}");
}

#[test]
fn marker_mean_is_order_invariant() {
    let s = session(&TARGETS, 3, 4, 10.0);
    let ts = timestamps(&s.rec.markers, SFREQ, 1.0, 0.1);
    let epochs = baseline_epochs(&s.rec.signal, &ts, 100, EmptyBaselinePolicy::Nan).unwrap();
    let markers: Vec<i32> = ts.iter().map(|t| t.marker).collect();
    let set: BTreeSet<i32> = markers.iter().copied().collect();
    let forward = mean_per_marker(&epochs, &markers, &set).unwrap();

    let rev: Vec<usize> = (0..markers.len()).rev().collect();
    let epochs_rev = epochs.select(Axis(0), &rev);
    let markers_rev: Vec<i32> = rev.iter().map(|&i| markers[i]).collect();
    let backward = mean_per_marker(&epochs_rev, &markers_rev, &set).unwrap();

    assert_eq!(forward.len(), 27);
    for (code, m) in &forward {
        for (a, b) in m.iter().zip(backward[code].iter()) {
            approx::assert_abs_diff_eq!(*a, *b, epsilon = 1e-5_f32);
        }
    }

    // Explicit mean for one code.
    let idx: Vec<usize> = (0..markers.len()).filter(|&i| markers[i] == 28).collect();
    let manual = epochs.select(Axis(0), &idx).mean_axis(Axis(0)).unwrap();
    for (a, b) in manual.iter().zip(forward[&28].iter()) {
        approx::assert_abs_diff_eq!(*a, *b, epsilon = 1e-5_f32);
    }
}

#[test]
fn stack_index_matches_label_index() {
    let s = session(&TARGETS, 2, 2, 10.0);
    let cfg = all_channels();
    let ts = timestamps(&s.rec.markers, SFREQ, 1.0, 0.1);
    let epochs = baseline_epochs(&s.rec.signal, &ts, 100, EmptyBaselinePolicy::Nan).unwrap();
    let markers: Vec<i32> = ts.iter().map(|t| t.marker).collect();
    let means = mean_per_marker(&epochs, &markers, &s.rec.marker_set()).unwrap();
    let stacks = stack_categories(&means, &cfg.categories).unwrap();

    for (stack, cat) in stacks.iter().zip(&cfg.categories) {
        assert_eq!(stack.labels, cat.labels);
        for (i, code) in cat.codes().enumerate() {
            let item = stack.data.index_axis(Axis(0), i);
            assert_eq!(item, means[&code].view(), "{} item {i}", cat.name);
        }
    }
}

#[test]
fn missing_category_code_fails_with_name() {
    let s = session(&TARGETS, 2, 2, 10.0);
    let mut rec = s.rec.clone();
    for m in rec.markers.iter_mut() {
        if *m == 25 {
            *m = 0;
        }
    }
    let err = analyze(&rec, &all_channels()).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::MissingMarker { category: "weapons".into(), code: 25, label: "Lead Pipe".into() }
    );
}

#[test]
fn unknown_channel_is_fatal() {
    let s = session(&TARGETS, 2, 1, 10.0);
    let cfg = AnalysisConfig { channels: vec!["Oz".into()], ..AnalysisConfig::default() };
    assert_eq!(analyze(&s.rec, &cfg).unwrap_err(), AnalysisError::UnknownChannel { name: "Oz".into() });
}

#[test]
fn recording_without_events_fails() {
    let rec = Recording::new(Array2::zeros((1, 50)), vec![0; 50], vec!["Fz".into()], 100.0).unwrap();
    assert_eq!(analyze(&rec, &AnalysisConfig::default()).unwrap_err(), AnalysisError::NoEvents);
}

#[test]
fn sub_sample_epoch_is_rejected() {
    let s = session(&TARGETS, 1, 1, 10.0);
    // 0.004 s × 100 Hz rounds to zero samples.
    let cfg = AnalysisConfig { epoch_time: 0.004, ..AnalysisConfig::default() };
    let err = analyze(&s.rec, &cfg).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidConfig(_)), "{err:?}");
}

#[test]
fn custom_categories() {
    let s = session(&[12, 33], 2, 3, 10.0);
    let cfg = AnalysisConfig {
        channels: vec![],
        categories: vec![
            Category::new("first three", 11, &["a", "b", "c"]),
            Category::new("rooms", 31, &["x", "y", "z", "w"]),
        ],
        ..AnalysisConfig::default()
    };
    let analysis = analyze(&s.rec, &cfg).unwrap();
    assert_eq!(analysis.verdict(Method::MeanPeak), vec!["b", "z"]);
    assert_eq!(report::sentence(&analysis.verdict(Method::ElectrodeVote)), "b, z");
}

#[test]
fn file_round_trip_and_dump() {
    let s = session(&TARGETS, 3, 2, 10.0);
    let rec_path = tmp_path("recording");
    write_recording(&s.rec, &rec_path).unwrap();
    let loaded = load_recording(&rec_path).unwrap();
    std::fs::remove_file(&rec_path).ok();

    assert_eq!(loaded.signal, s.rec.signal);
    assert_eq!(loaded.markers, s.rec.markers);
    assert_eq!(loaded.channel_names, s.rec.channel_names);

    let analysis = analyze(&loaded, &all_channels()).unwrap();
    let dump_path = tmp_path("dump");
    write_analysis(&analysis, &dump_path).unwrap();
    let header = read_header(&dump_path);
    std::fs::remove_file(&dump_path).ok();

    assert_eq!(header["stack_suspects"]["shape"], serde_json::json!([9, 3, 100]));
    assert_eq!(header["peaks_weapons"]["shape"], serde_json::json!([9, 3]));
    assert_eq!(header["votes_locations"]["dtype"], "F32");
    let labels: Vec<String> =
        serde_json::from_str(header["__metadata__"]["labels_weapons"].as_str().unwrap()).unwrap();
    assert_eq!(labels[7], "Rope");
}
