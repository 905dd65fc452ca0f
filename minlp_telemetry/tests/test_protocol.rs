mod common;

use std::collections::BTreeMap;

use common::{options, sample_descriptor, writer};
use minlp_telemetry::{
    BabNodeDescriptor, BabNodeTracker, Coordinate, Message, MessageReader, Monitor, NodeState, Payload, ProtocolError,
    TelemetryError, TelemetryOptions, TelemetryWriter, WireError, encode_frame,
};
use proptest::prelude::*;

fn add(path: &[u32]) -> BabNodeDescriptor {
    BabNodeDescriptor::new(path, 0.0, 10.0)
}

#[test]
fn prune_semantics() {
    let mut t = BabNodeTracker::new();
    let c = Coordinate::new([0, 1, 0]);
    assert_eq!(t.prune(&c), Err(ProtocolError::UnknownNode(c.clone())));

    for path in [vec![], vec![0], vec![0, 1], vec![0, 1, 0]] {
        t.add(&Coordinate::from(path)).unwrap();
    }
    assert_eq!(t.prune(&c), Ok(()));
    assert_eq!(t.prune(&c), Err(ProtocolError::AlreadyPruned(c.clone())));
}

#[test]
fn solver_stream_replays_into_the_monitor() {
    let mut w = writer("run-1");
    w.solve_start("bab").unwrap();
    w.add_bab_node(add(&[])).unwrap();
    w.add_bab_node(add(&[0])).unwrap();
    w.add_bab_node(add(&[1])).unwrap();
    w.update_variable("upper_bound", vec![0, 3], 12.5).unwrap();
    w.prune_bab_node(Coordinate::root()).unwrap();
    w.prune_bab_node(vec![0]).unwrap();
    w.node_tensor("nodes.h5", &Coordinate::new([1]), "solution", vec![3]).unwrap();
    w.solve_end("bab").unwrap();
    assert_eq!(w.written(), 9);
    let bytes = w.into_inner();

    let mut monitor = Monitor::new();
    assert_eq!(monitor.replay(MessageReader::new(bytes.as_slice())), 9);
    assert!(monitor.violations().is_empty());
    assert_eq!(monitor.malformed(), 0);

    let run = monitor.run("run-1").unwrap();
    assert_eq!(run.solver.as_deref(), Some("bab"));
    assert!(run.finished);
    assert_eq!(run.messages, 9);
    assert_eq!(run.last_timestamp, 1_000);
    assert_eq!(run.variables.get("upper_bound"), Some(&12.5));
    assert_eq!(run.tracker.state(&Coordinate::new([1])), Some(NodeState::Open));
    assert_eq!((run.tracker.num_open(), run.tracker.num_pruned()), (1, 2));
}

#[test]
fn tensor_group_is_the_coordinate() {
    let mut w = writer("r");
    w.node_tensor("f.h5", &Coordinate::new([0, 1, 0]), "x", vec![2, 2]).unwrap();
    let msg = MessageReader::new(w.into_inner().as_slice()).next().unwrap().unwrap();
    let Payload::Tensor(t) = msg.payload else {
        panic!("expected a tensor message");
    };
    assert_eq!(t.group, "0_1_0");
}

#[test]
fn unvalidated_writer_lets_the_monitor_catch_violations() {
    let opts = TelemetryOptions {
        validate_protocol: false,
        ..options("loose")
    };
    let mut w = TelemetryWriter::new(Vec::new(), opts);
    w.add_bab_node(sample_descriptor()).unwrap();
    w.prune_bab_node(vec![4]).unwrap();
    let bytes = w.into_inner();

    let mut monitor = Monitor::new();
    monitor.replay(MessageReader::new(bytes.as_slice()));
    let errors: Vec<_> = monitor.violations().iter().map(|v| v.error.clone()).collect();
    assert_eq!(
        errors,
        vec![
            ProtocolError::OrphanNode(Coordinate::new([0, 1, 0])),
            ProtocolError::UnknownNode(Coordinate::new([4])),
        ]
    );
}

#[test]
fn validating_writer_reports_violations_and_still_forwards_them() {
    let mut w = writer("strict");
    let err = w.add_bab_node(sample_descriptor()).unwrap_err();
    assert!(matches!(err, TelemetryError::Protocol(ProtocolError::OrphanNode(_))));
    let err = w.prune_bab_node(vec![7]).unwrap_err();
    assert!(matches!(err, TelemetryError::Protocol(ProtocolError::UnknownNode(_))));
    assert_eq!(w.written(), 2);
    assert!(w.tracker().is_empty());

    let bytes = w.into_inner();
    let mut monitor = Monitor::new();
    assert_eq!(monitor.replay(MessageReader::new(bytes.as_slice())), 2);
    let errors: Vec<_> = monitor.violations().iter().map(|v| v.error.clone()).collect();
    assert_eq!(
        errors,
        vec![
            ProtocolError::OrphanNode(Coordinate::new([0, 1, 0])),
            ProtocolError::UnknownNode(Coordinate::new([7])),
        ]
    );
}

#[test]
fn truncated_stream_ends_the_replay() {
    let mut w = writer("t");
    w.add_bab_node(add(&[])).unwrap();
    w.prune_bab_node(Coordinate::root()).unwrap();
    let mut bytes = w.into_inner();
    bytes.truncate(bytes.len() - 2);

    let mut reader = MessageReader::new(bytes.as_slice());
    assert!(reader.next().unwrap().is_ok());
    assert!(matches!(reader.next(), Some(Err(WireError::Truncated(_)))));
    assert!(reader.next().is_none());

    let mut monitor = Monitor::new();
    assert_eq!(monitor.replay(MessageReader::new(bytes.as_slice())), 1);
    assert_eq!(monitor.malformed(), 1);
}

#[test]
fn malformed_frame_mid_stream_does_not_hide_later_events() {
    let mut w = writer("m");
    w.add_bab_node(add(&[])).unwrap();
    let mut bytes = w.into_inner();
    bytes.extend_from_slice(&[0x01, 0x80]);

    let prune = Message {
        name: "test".into(),
        run_id: "m".into(),
        timestamp: 2_000,
        payload: Payload::prune(Coordinate::root()),
    };
    encode_frame(&prune, &mut bytes);

    let mut monitor = Monitor::new();
    assert_eq!(monitor.replay(MessageReader::new(bytes.as_slice())), 2);
    assert_eq!(monitor.malformed(), 1);
    assert!(monitor.violations().is_empty());
    assert_eq!(monitor.run("m").unwrap().tracker.num_pruned(), 1);
}

#[derive(Clone, Debug)]
enum Event {
    Add(Vec<u32>),
    Prune(Vec<u32>),
}

fn event_strategy() -> impl Strategy<Value = Event> {
    let path = prop::collection::vec(0u32..2, 0..4);
    prop_oneof![path.clone().prop_map(Event::Add), path.prop_map(Event::Prune)]
}

proptest! {
    #[test]
    fn tracker_matches_a_reference_model(events in prop::collection::vec(event_strategy(), 0..60)) {
        let mut tracker = BabNodeTracker::new();
        let mut model: BTreeMap<Vec<u32>, bool> = BTreeMap::new();

        for event in events {
            match event {
                Event::Add(path) => {
                    let known = model.contains_key(&path);
                    let parent_known = path.is_empty() || model.contains_key(&path[..path.len() - 1]);
                    let res = tracker.add(&Coordinate::from(path.clone()));
                    if known {
                        prop_assert_eq!(res, Err(ProtocolError::DuplicateNode(Coordinate::from(path))));
                    } else if !parent_known {
                        prop_assert_eq!(res, Err(ProtocolError::OrphanNode(Coordinate::from(path))));
                    } else {
                        prop_assert_eq!(res, Ok(()));
                        model.insert(path, false);
                    }
                }
                Event::Prune(path) => {
                    let res = tracker.prune(&Coordinate::from(path.clone()));
                    match model.get_mut(&path) {
                        None => prop_assert_eq!(res, Err(ProtocolError::UnknownNode(Coordinate::from(path)))),
                        Some(true) => prop_assert_eq!(res, Err(ProtocolError::AlreadyPruned(Coordinate::from(path)))),
                        Some(pruned) => {
                            prop_assert_eq!(res, Ok(()));
                            *pruned = true;
                        }
                    }
                }
            }
        }
        prop_assert_eq!(tracker.len(), model.len());
        prop_assert_eq!(tracker.num_pruned(), model.values().filter(|&&p| p).count());
    }
}
