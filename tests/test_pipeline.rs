//! End-to-end tests: document in, frames out.
//!
//! Drives the [`Visualizer`] the way a host would: select a document,
//! start, advance time, watch frames and completion.

use std::cell::RefCell;
use std::rc::Rc;
use weightscope::{
    AssetDirectory, Completion, InMemorySource, ResultSource, SceneBuffer, SceneRenderer,
    Topology, TrainingResult, Viewport, VizError, VizOptions, Visualizer, VisualizerConfig,
};

const TWO_EPOCHS: &str = r#"{
    "epoch_0": {
        "input": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]],
        "output": [[0.0, 0.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.0],
                   [0.0, 0.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.0]]
    },
    "epoch_1": {
        "input": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]],
        "output": [[1.0, 0.0], [0.0, 0.0], [0.0, 0.7], [0.0, 0.0], [0.0, 0.0],
                   [0.0, 0.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.2], [0.0, 0.0]]
    }
}"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn visualizer() -> Visualizer<InMemorySource, SceneBuffer> {
    let mut source = InMemorySource::new();
    source.insert_json("MLP[2].json", TWO_EPOCHS).unwrap();
    Visualizer::new(VisualizerConfig::default(), source, SceneBuffer::default()).unwrap()
}

fn completions<S, R>(viz: &mut Visualizer<S, R>) -> Rc<RefCell<Vec<Completion>>>
where
    S: ResultSource,
    R: SceneRenderer,
{
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    viz.on_complete(move |c| sink.borrow_mut().push(c));
    seen
}

#[test]
fn test_two_epoch_run() {
    init_logging();
    let mut viz = visualizer();
    let seen = completions(&mut viz);

    let topology = viz.set_topology_source("MLP[2].json").unwrap();
    assert_eq!(topology.layers(), &[2, 10]);

    viz.start().unwrap();
    assert!(viz.is_running());

    // first frame is due immediately
    assert_eq!(viz.advance(0.0).unwrap(), 1);
    let first = viz.renderer_mut().take_drawn();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].epoch, 0);
    assert_eq!(first[0].edges.len(), 20);
    assert!(first[0].edges.iter().all(|e| e.diff.is_none()));
    assert!(seen.borrow().is_empty());

    assert_eq!(viz.advance(1.5).unwrap(), 1);
    let second = viz.renderer_mut().take_drawn();
    assert_eq!(second[0].epoch, 1);
    assert!(second[0].edges.iter().all(|e| e.diff.is_some()));

    // source 0 -> target 0 moved by 1.0, the layer maximum
    let hot = second[0]
        .edges
        .iter()
        .find(|e| e.source == 0 && e.target == 0)
        .unwrap();
    assert_eq!(hot.color, weightscope::activity::EDGE_HIGH);
    // 0.7 of the range
    let warm = second[0]
        .edges
        .iter()
        .find(|e| e.source == 1 && e.target == 2)
        .unwrap();
    assert_eq!(warm.color, weightscope::activity::EDGE_MEDIUM);

    assert!(!viz.is_running());
    assert_eq!(
        *seen.borrow(),
        vec![Completion::EndOfVisualization { frames: 2 }]
    );

    assert_eq!(viz.advance(100.0).unwrap(), 0);
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_reset_after_start_draws_nothing() {
    init_logging();
    let mut viz = visualizer();
    let seen = completions(&mut viz);
    viz.set_topology_source("MLP[2].json").unwrap();
    viz.start().unwrap();
    viz.reset();

    assert_eq!(viz.scheduler().pending(), 0);
    assert_eq!(viz.advance(100.0).unwrap(), 0);
    assert!(viz.renderer().drawn_epochs().is_empty());
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_failed_start_leaves_frames() {
    init_logging();
    let mut viz = visualizer();
    viz.set_topology_source("MLP[2].json").unwrap();
    viz.start().unwrap();
    viz.run_to_completion().unwrap();

    // swap in a document that changes shape between epochs
    let broken = r#"{
        "epoch_0": {"output": [[0.0, 0.0]]},
        "epoch_1": {"output": [[0.0, 0.0, 0.0]]}
    }"#;
    viz.source_mut().insert_json("MLP[2].json", broken).unwrap();

    let err = viz.start().unwrap_err();
    assert!(matches!(err, VizError::Computation { epoch: 1, .. }));
    assert_eq!(viz.renderer().drawn_epochs(), vec![0, 1]);
    assert!(!viz.is_running());
}

#[test]
fn test_asset_directory_run() {
    init_logging();
    let topology = Topology::parse("MLP[10,10].json").unwrap();
    let doc = TrainingResult::synthetic(&topology, 8, 4, 2024).unwrap();

    let dir = std::env::temp_dir().join(format!("weightscope-pipeline-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(topology.filename()), doc.to_json().unwrap()).unwrap();

    let config = VisualizerConfig::from_json(&format!(
        r#"{{"frame_interval": 0.5, "transition_duration": 0.25,
            "viewport": {{"width": 480, "height": 300}}, "asset_base_path": {:?}}}"#,
        dir.display().to_string()
    ))
    .unwrap();
    let renderer = SceneBuffer::new(config.viewport);
    let source = AssetDirectory::from_config(&config);
    assert_eq!(source.base(), dir.as_path());
    let mut viz = Visualizer::new(config, source, renderer).unwrap();

    viz.apply_options(&VizOptions {
        selected_file: Some(topology.filename()),
        is_running: true,
    })
    .unwrap();
    assert_eq!(viz.advance(1.0).unwrap(), 3);
    assert_eq!(viz.advance(0.5).unwrap(), 1);
    assert_eq!(viz.renderer().drawn_epochs(), vec![0, 1, 2, 3]);
    assert!(viz.renderer().deltas().iter().all(|d| d.transition == 0.25));
    assert!(viz.renderer().nodes().all(|n| n.x < 480.0 && n.y < 300.0));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_resize_between_frames() {
    init_logging();
    let mut viz = visualizer();
    viz.set_topology_source("MLP[2].json").unwrap();
    viz.start().unwrap();
    viz.advance(0.0).unwrap();

    viz.renderer_mut().resize(Viewport::new(200.0, 100.0).unwrap());
    viz.advance(1.5).unwrap();

    let frames = viz.renderer_mut().take_drawn();
    let last = frames.last().unwrap();
    assert!(last.nodes.iter().all(|n| n.x < 200.0 && n.y < 100.0));
    assert!(last.edges.iter().all(|e| e.x2 < 200.0 && e.y2 < 100.0));
}
