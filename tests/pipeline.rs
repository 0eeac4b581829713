//! Graph-level pipeline scenarios.
//!
//! These tests exercise whole graphs the way the interactive surface
//! does: assemble nodes, connect them, run passes, and observe how
//! outputs travel along connections one pass behind processing.

use chitra::prelude::*;

fn checker_image() -> ImageBuffer {
    let data: Vec<u8> = (0..16 * 16)
        .flat_map(|i| {
            let (x, y) = (i % 16, i / 16);
            let level = if (x / 4 + y / 4) % 2 == 0 { 40u8 } else { 220 };
            [level, level, level]
        })
        .collect();
    ImageBuffer::from_raw_u8(16, 16, 3, data).unwrap()
}

fn seeded_input(name: &str) -> ImageInputNode {
    let mut node = ImageInputNode::new(name, "unused.png");
    node.set_output(checker_image());
    node
}

#[test]
fn edge_effect_is_one_pass_behind() {
    let mut graph = NodeGraph::new();
    graph.add(Box::new(seeded_input("photo")));
    graph.add(Box::new(BlurNode::new("soften")));
    graph.connect("image_input_photo", "blur_soften").unwrap();

    // Pass 1: blur processes before the edge carries the image.
    graph.run();
    assert!(graph.find("blur_soften").unwrap().output().is_empty());

    // Pass 2: the propagated input is now visible.
    graph.run();
    let out = graph.find("blur_soften").unwrap().output();
    assert_eq!((out.width(), out.height(), out.channels()), (16, 16, 3));
}

#[test]
fn connecting_unknown_node_reports_and_drops() {
    let mut graph = NodeGraph::new();
    graph.add(Box::new(BlurNode::new("a")));

    let result = graph.connect("blur_a", "never_added");
    assert!(matches!(result, Err(GraphError::InvalidConnection(_))));
    assert_eq!(graph.connection_count(), 0);

    // The other direction fails identically.
    let result = graph.connect("ghost", "blur_a");
    assert!(matches!(result, Err(GraphError::InvalidConnection(_))));
    assert_eq!(graph.connection_count(), 0);
}

#[test]
fn three_stage_chain_settles_over_passes() {
    let mut graph = NodeGraph::new();
    graph.add(Box::new(seeded_input("photo")));
    graph.add(Box::new(BrightnessContrastNode::with_params("boost", 1.2, 10.0)));
    graph.add(Box::new(ThresholdNode::new("cut")));
    graph
        .connect("image_input_photo", "brightness_contrast_boost")
        .unwrap();
    graph
        .connect("brightness_contrast_boost", "threshold_cut")
        .unwrap();

    // Each pass pushes the image one stage further.
    graph.run();
    assert!(graph.find("threshold_cut").unwrap().output().is_empty());
    graph.run();
    assert!(graph.find("threshold_cut").unwrap().output().is_empty());
    graph.run();

    let out = graph.find("threshold_cut").unwrap().output();
    assert_eq!(out.channels(), 1);
    // Binary threshold leaves only the two extremes.
    assert!(out.as_u8().unwrap().iter().all(|&s| s == 0 || s == 255));
}

#[test]
fn blend_second_input_via_dedicated_setter() {
    // Connections feed the canonical slot (input A); input B must be
    // supplied through the node's own setter before assembly.
    let mut blend = BlendNode::new("mix");
    blend.set_input_b(ImageBuffer::from_raw_u8(16, 16, 3, vec![128; 768]).unwrap());
    blend.set_mode(BlendMode::Multiply).unwrap();

    let mut graph = NodeGraph::new();
    graph.add(Box::new(seeded_input("photo")));
    graph.add(Box::new(blend));
    graph.connect("image_input_photo", "blend_mix").unwrap();

    graph.run();
    graph.run();

    let out = graph.find("blend_mix").unwrap().output();
    assert_eq!(out.channels(), 3);
    // Multiply by mid-gray darkens the bright squares.
    let bright_square = out.sample(4, 0, 0);
    assert!(bright_square < 220.0, "got {}", bright_square);
}

#[test]
fn rerunning_with_fixed_parameters_is_deterministic() {
    let mut graph = NodeGraph::new();
    graph.add(Box::new(seeded_input("photo")));
    graph.add(Box::new(NoiseNode::new("grain")));
    graph.connect("image_input_photo", "noise_grain").unwrap();

    graph.run();
    graph.run();
    let first = graph.find("noise_grain").unwrap().output().clone();
    graph.run();
    let second = graph.find("noise_grain").unwrap().output().clone();
    assert_eq!(first, second);
}

#[test]
fn render_hook_drives_eager_reevaluation() {
    let mut graph = NodeGraph::new();
    graph.add(Box::new(seeded_input("photo")));
    graph.add(Box::new(BlurNode::new("soften")));
    graph.connect("image_input_photo", "blur_soften").unwrap();

    // Prime the blur node's input.
    graph.run();
    graph.run();
    let narrow = graph.find("blur_soften").unwrap().output().clone();

    // A presentation hook that widens the blur: the parameter setter
    // reprocesses immediately, so the new output is visible as soon as
    // the hook returns.
    graph.set_render_hook(Box::new(|node| {
        if node.kind() == NodeKind::Blur {
            node.set_parameter("radius", Value::Integer(8)).unwrap();
        }
    }));
    graph.run();

    let wide = graph.find("blur_soften").unwrap().output().clone();
    assert!(!wide.is_empty());
    assert_ne!(narrow, wide);
}

#[test]
fn registry_assembled_graph_runs() {
    let registry = NodeRegistry::with_builtins();

    let mut graph = NodeGraph::new();
    let mut source = seeded_input("photo");
    source.set_output(checker_image());
    graph.add(Box::new(source));

    let mut edge = registry.create("edge_detection", "outline").unwrap();
    edge.set_parameter("detector", Value::from("canny")).unwrap();
    graph.add(edge);
    graph
        .connect("image_input_photo", "edge_detection_outline")
        .unwrap();

    graph.run();
    graph.run();

    let out = graph.find("edge_detection_outline").unwrap().output();
    assert_eq!(out.channels(), 1);
    let edge_pixels: u32 = out.as_u8().unwrap().iter().map(|&s| u32::from(s > 0)).sum();
    assert!(edge_pixels > 0, "checkerboard should produce edges");
}

#[test]
fn full_pipeline_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("final");

    let mut graph = NodeGraph::new();
    graph.add(Box::new(seeded_input("photo")));
    graph.add(Box::new(BlurNode::new("soften")));
    graph.add(Box::new(OutputNode::new(
        "sink",
        &base,
        SaveFormat::Png,
        90,
    )));
    graph.connect("image_input_photo", "blur_soften").unwrap();
    graph.connect("blur_soften", "output_sink").unwrap();

    // Three passes: load -> blur -> save.
    graph.run();
    graph.run();
    graph.run();

    let saved = load_image(dir.path().join("final.png")).unwrap();
    assert_eq!((saved.width(), saved.height()), (16, 16));
}

#[test]
fn split_then_merge_round_trips_through_graph() {
    let original = checker_image();

    let mut splitter = ChannelSplitterNode::new("rgb", false);
    splitter.set_input(original.clone());
    splitter.process().unwrap();

    assert_eq!(splitter.merge_channels(), original);
    // Without the grayscale flag the canonical output is a passthrough.
    assert_eq!(splitter.output(), &original);
}

#[test]
fn cleared_graph_accepts_reassembly() {
    let mut graph = NodeGraph::new();
    graph.add(Box::new(BlurNode::new("a")));
    graph.add(Box::new(BlurNode::new("b")));
    graph.connect("blur_a", "blur_b").unwrap();
    graph.clear();

    assert_eq!(graph.node_count(), 0);
    // Old ids are gone: connecting against them is invalid again.
    assert!(graph.connect("blur_a", "blur_b").is_err());

    graph.add(Box::new(BlurNode::new("a")));
    graph.add(Box::new(BlurNode::new("b")));
    assert!(graph.connect("blur_a", "blur_b").is_ok());
}
