//! Node registry: create transform nodes by kind id.
//!
//! The registry maps stable kind ids to node factories plus the
//! metadata listings and search the interactive surface displays. It is
//! insertion-ordered so listings come out in a stable, curated order.

use crate::core::node::{NodeInfo, TransformNode};
use crate::io::SaveFormat;
use crate::nodes::{
    BlendNode, BlurNode, BrightnessContrastNode, ChannelSplitterNode, ConvolutionNode,
    EdgeDetectionNode, ImageInputNode, NoiseNode, OutputNode, ThresholdNode,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// Factory producing a node with the given instance name.
pub type NodeFactory = Arc<dyn Fn(&str) -> Box<dyn TransformNode>>;

/// Registry entry: metadata plus the factory.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Listing metadata for this kind.
    pub info: NodeInfo,
    /// Factory creating instances of this kind.
    pub factory: NodeFactory,
}

/// Registry of all available node kinds.
pub struct NodeRegistry {
    entries: IndexMap<&'static str, RegistryEntry>,
}

impl NodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with every built-in node kind.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(
            NodeInfo {
                id: "image_input",
                name: "Image Input",
                description: "Load an image file as the pipeline source",
            },
            |name| Box::new(ImageInputNode::new(name, "")),
        );
        registry.register(
            NodeInfo {
                id: "output",
                name: "Output",
                description: "Save the incoming image to disk (png/jpg)",
            },
            |name| Box::new(OutputNode::new(name, "output", SaveFormat::Png, 90)),
        );
        registry.register(
            NodeInfo {
                id: "blur",
                name: "Blur",
                description: "Gaussian or directional blur",
            },
            |name| Box::new(BlurNode::new(name)),
        );
        registry.register(
            NodeInfo {
                id: "brightness_contrast",
                name: "Brightness/Contrast",
                description: "Linear brightness and contrast adjustment",
            },
            |name| Box::new(BrightnessContrastNode::new(name)),
        );
        registry.register(
            NodeInfo {
                id: "channel_splitter",
                name: "Channel Splitter",
                description: "Split into R/G/B/A channels, optionally grayscale",
            },
            |name| Box::new(ChannelSplitterNode::new(name, false)),
        );
        registry.register(
            NodeInfo {
                id: "threshold",
                name: "Threshold",
                description: "Binary, adaptive, or Otsu thresholding",
            },
            |name| Box::new(ThresholdNode::new(name)),
        );
        registry.register(
            NodeInfo {
                id: "edge_detection",
                name: "Edge Detection",
                description: "Sobel gradient magnitude or Canny edges",
            },
            |name| Box::new(EdgeDetectionNode::new(name)),
        );
        registry.register(
            NodeInfo {
                id: "blend",
                name: "Blend",
                description: "Composite two images with a blend mode",
            },
            |name| Box::new(BlendNode::new(name)),
        );
        registry.register(
            NodeInfo {
                id: "noise",
                name: "Noise",
                description: "Procedural noise as color grain or displacement",
            },
            |name| Box::new(NoiseNode::new(name)),
        );
        registry.register(
            NodeInfo {
                id: "convolution",
                name: "Convolution",
                description: "Preset or custom kernel convolution",
            },
            |name| Box::new(ConvolutionNode::new(name)),
        );

        registry
    }

    /// Register a node kind.
    pub fn register<F>(&mut self, info: NodeInfo, factory: F)
    where
        F: Fn(&str) -> Box<dyn TransformNode> + 'static,
    {
        self.entries.insert(
            info.id,
            RegistryEntry {
                info,
                factory: Arc::new(factory),
            },
        );
    }

    /// Create a node of the given kind with an instance name.
    pub fn create(&self, kind_id: &str, name: &str) -> Option<Box<dyn TransformNode>> {
        self.entries.get(kind_id).map(|e| (e.factory)(name))
    }

    /// Whether a kind id is registered.
    pub fn contains(&self, kind_id: &str) -> bool {
        self.entries.contains_key(kind_id)
    }

    /// Metadata for a kind id.
    pub fn info(&self, kind_id: &str) -> Option<&NodeInfo> {
        self.entries.get(kind_id).map(|e| &e.info)
    }

    /// All registered kinds, in registration order.
    pub fn infos(&self) -> impl Iterator<Item = &NodeInfo> {
        self.entries.values().map(|e| &e.info)
    }

    /// Case-insensitive search over ids, names, and descriptions.
    pub fn search(&self, query: &str) -> Vec<&NodeInfo> {
        let query = query.to_lowercase();
        self.entries
            .values()
            .map(|e| &e.info)
            .filter(|info| {
                info.id.contains(&query)
                    || info.name.to_lowercase().contains(&query)
                    || info.description.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::NodeKind;

    #[test]
    fn test_builtins_cover_every_kind() {
        let registry = NodeRegistry::with_builtins();
        for kind in NodeKind::all() {
            assert!(
                registry.contains(kind.id()),
                "kind '{}' missing from registry",
                kind.id()
            );
        }
        assert_eq!(registry.len(), NodeKind::all().len());
    }

    #[test]
    fn test_create_by_id() {
        let registry = NodeRegistry::with_builtins();
        let node = registry.create("blur", "soft").unwrap();
        assert_eq!(node.id(), "blur_soft");
        assert_eq!(node.kind(), NodeKind::Blur);
    }

    #[test]
    fn test_create_unknown_kind() {
        let registry = NodeRegistry::with_builtins();
        assert!(registry.create("warp", "w").is_none());
    }

    #[test]
    fn test_search() {
        let registry = NodeRegistry::with_builtins();
        let hits = registry.search("otsu");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "threshold");
        assert!(registry.search("nothing-matches-this").is_empty());
    }

    #[test]
    fn test_info_lookup() {
        let registry = NodeRegistry::with_builtins();
        let info = registry.info("blend").unwrap();
        assert_eq!(info.name, "Blend");
    }
}
