//! Chitra CLI - interactive node-based image processing.
//!
//! A textual menu drives the transform nodes one operation at a time.
//! Session state (the current working image and the previous one for a
//! single-level undo) lives in an explicit [`Session`] struct passed
//! into each command handler, entirely outside the graph/node core.

use anyhow::{bail, Context, Result};
use chitra::prelude::*;
use std::io::{self, Write};

/// Mutable session state threaded through the command handlers.
#[derive(Default)]
struct Session {
    /// The image operations act on.
    current: ImageBuffer,
    /// Snapshot before the last mutating operation (one-level undo).
    previous: ImageBuffer,
}

impl Session {
    fn has_image(&self) -> bool {
        !self.current.is_empty()
    }

    /// Snapshot the current image, then replace it.
    fn apply(&mut self, result: ImageBuffer) {
        self.previous = std::mem::replace(&mut self.current, result);
    }

    /// Swap back to the previous image (single level).
    fn undo(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
    }
}

fn main() {
    env_logger::init();
    println!("Chitra - Node-based Image Processing v{}", chitra::VERSION);

    let mut session = Session::default();
    loop {
        show_menu();
        let choice = prompt("> ");
        let result = match choice.trim() {
            "1" => load_image_command(&mut session),
            "2" => split_channels_command(&mut session),
            "3" => grayscale_command(&mut session),
            "4" => brightness_contrast_command(&mut session),
            "5" => save_command(&session),
            "6" => merge_channels_command(&mut session),
            "7" => blur_command(&mut session),
            "8" => threshold_command(&mut session),
            "9" => edge_command(&mut session),
            "10" => blend_command(&mut session),
            "11" => noise_command(&mut session),
            "12" => convolution_command(&mut session),
            "13" => show_current_command(&session),
            "14" => {
                session.undo();
                println!("Reverted to the previous image.");
                Ok(())
            }
            "15" => list_nodes_command(),
            "16" | "q" | "quit" | "exit" => {
                println!("Goodbye.");
                return;
            }
            other => {
                println!("Unknown choice: {}", other);
                Ok(())
            }
        };
        if let Err(err) = result {
            eprintln!("Error: {:#}", err);
        }
    }
}

fn show_menu() {
    println!();
    println!("Choose an action:");
    println!("  1. Load image");
    println!("  2. Split color channels");
    println!("  3. Convert to grayscale");
    println!("  4. Adjust brightness/contrast");
    println!("  5. Save current image");
    println!("  6. Merge channels");
    println!("  7. Apply blur");
    println!("  8. Apply thresholding");
    println!("  9. Edge detection");
    println!(" 10. Blend with another image");
    println!(" 11. Generate noise");
    println!(" 12. Apply convolution filter");
    println!(" 13. Show current image info");
    println!(" 14. Undo (one step)");
    println!(" 15. List available nodes");
    println!(" 16. Exit");
}

fn prompt(message: &str) -> String {
    print!("{}", message);
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);
    line.trim().to_string()
}

fn prompt_parse<T: std::str::FromStr>(message: &str, default: T) -> T {
    let text = prompt(message);
    if text.is_empty() {
        return default;
    }
    text.parse().unwrap_or(default)
}

fn require_image(session: &Session) -> Result<()> {
    if !session.has_image() {
        bail!("no image loaded - load an image first");
    }
    Ok(())
}

/// Run a single transform node over the session image and store its
/// output as the new current image.
fn run_transform(session: &mut Session, node: &mut dyn TransformNode) -> Result<()> {
    node.set_input(session.current.clone());
    node.process()
        .with_context(|| format!("processing '{}' failed", node.name()))?;
    let output = node.output().clone();
    if output.is_empty() {
        bail!("'{}' produced no output", node.name());
    }
    session.apply(output);
    Ok(())
}

fn load_image_command(session: &mut Session) -> Result<()> {
    let path = prompt("Image file path: ");
    let mut node = ImageInputNode::new("session", &path);
    node.process().ok();
    if node.output().is_empty() {
        bail!("could not load '{}'", path);
    }
    session.apply(node.output().clone());
    println!(
        "Loaded {}x{} image with {} channels.",
        session.current.width(),
        session.current.height(),
        session.current.channels()
    );
    Ok(())
}

fn split_channels_command(session: &mut Session) -> Result<()> {
    require_image(session)?;
    let mut node = ChannelSplitterNode::new("session", false);
    node.set_input(session.current.clone());
    node.process()?;
    for (label, channel) in [
        ("red", node.red()),
        ("green", node.green()),
        ("blue", node.blue()),
        ("alpha", node.alpha()),
    ] {
        if !channel.is_empty() {
            let path = format!("{}_channel.png", label);
            save_image(&path, channel, SaveFormat::Png, 90)
                .with_context(|| format!("saving {} channel", label))?;
            println!("Wrote {}", path);
        }
    }
    Ok(())
}

fn grayscale_command(session: &mut Session) -> Result<()> {
    require_image(session)?;
    let mut node = ChannelSplitterNode::new("session", true);
    run_transform(session, &mut node)?;
    println!("Converted to grayscale.");
    Ok(())
}

fn brightness_contrast_command(session: &mut Session) -> Result<()> {
    require_image(session)?;
    let alpha = prompt_parse("Contrast alpha [1.0]: ", 1.0f64);
    let beta = prompt_parse("Brightness beta [0]: ", 0.0f64);
    let mut node = BrightnessContrastNode::with_params("session", alpha, beta);
    run_transform(session, &mut node)?;
    println!("Applied alpha={}, beta={}.", alpha, beta);
    Ok(())
}

fn save_command(session: &Session) -> Result<()> {
    require_image(session)?;
    let path = prompt("Save path (without extension) [output]: ");
    let path = if path.is_empty() { "output".to_string() } else { path };
    let format_name = prompt("Format (png/jpg) [png]: ");
    let format = if format_name.is_empty() {
        SaveFormat::Png
    } else {
        SaveFormat::parse(&format_name)?
    };
    let quality = prompt_parse("Quality 1-100 [90]: ", 90u8);

    let mut node = OutputNode::new("session", &path, format, quality);
    node.set_input(session.current.clone());
    node.process()?;
    if !node.last_save_ok() {
        bail!("saving to '{}' failed", node.full_path().display());
    }
    println!("Saved {}.", node.full_path().display());
    Ok(())
}

fn merge_channels_command(session: &mut Session) -> Result<()> {
    require_image(session)?;
    let mut node = ChannelSplitterNode::new("session", false);
    node.set_input(session.current.clone());
    node.process()?;
    let merged = node.merge_channels();
    if merged.is_empty() {
        bail!("merge failed - the current image has no color channels to merge");
    }
    session.apply(merged);
    println!("Channels merged back into a color image.");
    Ok(())
}

fn blur_command(session: &mut Session) -> Result<()> {
    require_image(session)?;
    let radius = prompt_parse("Radius [3]: ", 3u32);
    let directional = prompt("Directional blur? (y/N): ").eq_ignore_ascii_case("y");

    let mut node = BlurNode::new("session");
    node.set_radius(radius)?;
    if directional {
        let angle = prompt_parse("Angle in degrees [0]: ", 0.0f32);
        node.set_directional(true)?;
        node.set_angle(angle)?;
    }
    run_transform(session, &mut node)?;
    println!(
        "Applied {} blur with radius {}.",
        if directional { "directional" } else { "gaussian" },
        radius
    );
    Ok(())
}

fn threshold_command(session: &mut Session) -> Result<()> {
    require_image(session)?;
    let mut node = ThresholdNode::new("session");
    match prompt("Method (binary/adaptive/otsu) [binary]: ").as_str() {
        "" | "binary" => {
            let value = prompt_parse("Threshold 0-255 [128]: ", 128i64);
            node.set_parameter("value", Value::Integer(value))?;
        }
        "adaptive" => {
            node.set_method(ThresholdMethod::Adaptive)?;
            let block = prompt_parse("Block size (odd) [11]: ", 11u32);
            node.set_block_size(block)?;
            let c = prompt_parse("Constant C [2]: ", 2i32);
            node.set_c(c)?;
        }
        "otsu" => node.set_method(ThresholdMethod::Otsu)?,
        other => bail!("unknown threshold method '{}'", other),
    }
    run_transform(session, &mut node)?;
    println!("Thresholding applied.");
    Ok(())
}

fn edge_command(session: &mut Session) -> Result<()> {
    require_image(session)?;
    let mut node = EdgeDetectionNode::new("session");
    match prompt("Detector (sobel/canny) [sobel]: ").as_str() {
        "" | "sobel" => {
            let size = prompt_parse("Kernel size (3/5/7) [3]: ", 3u32);
            node.set_sobel_kernel_size(size)?;
        }
        "canny" => {
            node.set_detector(EdgeDetector::Canny)?;
            let low = prompt_parse("Low threshold [50]: ", 50.0f32);
            let high = prompt_parse("High threshold [150]: ", 150.0f32);
            node.set_canny_thresholds(low, high)?;
        }
        other => bail!("unknown detector '{}'", other),
    }
    if prompt("Overlay edges on original? (y/N): ").eq_ignore_ascii_case("y") {
        node.set_overlay(true)?;
    }
    run_transform(session, &mut node)?;
    println!("Edge detection applied.");
    Ok(())
}

fn blend_command(session: &mut Session) -> Result<()> {
    require_image(session)?;
    let other_path = prompt("Second image path: ");
    let layer = load_image(&other_path).context("loading the blend layer")?;

    let mode_name = prompt("Mode (normal/multiply/screen/overlay/difference) [normal]: ");
    let opacity = prompt_parse("Opacity 0-1 [1.0]: ", 1.0f64);

    let mut node = BlendNode::new("session");
    if !mode_name.is_empty() {
        node.set_parameter("mode", Value::Text(mode_name))?;
    }
    node.set_opacity(opacity as f32)?;
    node.set_input_b(layer);
    run_transform(session, &mut node)?;
    println!("Images blended.");
    Ok(())
}

fn noise_command(session: &mut Session) -> Result<()> {
    require_image(session)?;
    let mut node = NoiseNode::new("session");
    let kind = prompt("Noise (gradient/simplex/cellular) [gradient]: ");
    if !kind.is_empty() {
        node.set_parameter("kind", Value::Text(kind))?;
    }
    node.set_scale(prompt_parse("Scale [0.05]: ", 0.05f32))?;
    node.set_octaves(prompt_parse("Octaves 1-10 [3]: ", 3u32))?;
    node.set_persistence(prompt_parse("Persistence 0-1 [0.5]: ", 0.5f32))?;
    if prompt("Use as displacement? (y/N): ").eq_ignore_ascii_case("y") {
        node.set_usage(NoiseUsage::Displacement)?;
    }
    run_transform(session, &mut node)?;
    println!("Noise applied.");
    Ok(())
}

fn convolution_command(session: &mut Session) -> Result<()> {
    require_image(session)?;
    let mut node = ConvolutionNode::new("session");
    match prompt("Preset (sharpen/emboss/edge_enhance/custom) [sharpen]: ").as_str() {
        "" | "sharpen" => {}
        "emboss" => node.set_preset(KernelPreset::Emboss)?,
        "edge_enhance" => node.set_preset(KernelPreset::EdgeEnhance)?,
        "custom" => {
            let size = prompt_parse("Kernel size (3/5) [3]: ", 3usize);
            node.set_kernel_size(size)?;
            let line = prompt(&format!(
                "Enter {} weights separated by spaces: ",
                size * size
            ));
            let weights: Vec<f32> = line
                .split_whitespace()
                .filter_map(|w| w.parse().ok())
                .collect();
            node.set_custom_kernel(weights)?;
        }
        other => bail!("unknown preset '{}'", other),
    }
    run_transform(session, &mut node)?;
    println!("Convolution applied.");
    Ok(())
}

fn show_current_command(session: &Session) -> Result<()> {
    if !session.has_image() {
        println!("No image loaded.");
        return Ok(());
    }
    println!(
        "Current image: {}x{}, {} channel(s), {:?} samples.",
        session.current.width(),
        session.current.height(),
        session.current.channels(),
        session.current.sample_type()
    );
    Ok(())
}

fn list_nodes_command() -> Result<()> {
    let registry = NodeRegistry::with_builtins();
    println!("Available nodes ({} total):", registry.len());
    for info in registry.infos() {
        println!("  {:<20} {}", info.id, info.description);
    }
    Ok(())
}
