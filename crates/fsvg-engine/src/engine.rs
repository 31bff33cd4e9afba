//! Engine
//!
//! Loads SVG documents into a tree and writes them back out.

use std::path::Path;

use fsvg_dom::{DomError, NodeId, Rect, SvgTree};
use fsvg_xml::{read_svg, write_svg, XmlError};
use thiserror::Error;

use crate::Config;

/// Errors raised while loading or saving documents
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// A loaded document
pub struct Loaded {
    pub tree: SvgTree,
    pub root: NodeId,
}

impl Loaded {
    /// Bounds of the whole document in canvas space
    pub fn bounds(&self) -> Rect {
        self.tree.bounds(self.root)
    }

    /// Live nodes in the tree
    pub fn node_count(&self) -> usize {
        self.tree.len()
    }
}

/// The fSVG engine
pub struct Engine {
    config: Config,
}

impl Engine {
    /// Create a new engine with the given configuration
    pub fn new(config: Config) -> Self {
        tracing::info!("fSVG Engine v{} initialized", crate::VERSION);
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load a document from disk
    pub fn load_file(&self, path: impl AsRef<Path>) -> EngineResult<Loaded> {
        let path = path.as_ref();
        tracing::info!("Loading {}", path.display());

        let text = std::fs::read_to_string(path).map_err(|e| {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            e
        })?;
        self.load_str(&text)
    }

    /// Load a document from markup
    pub fn load_str(&self, text: &str) -> EngineResult<Loaded> {
        let (tree, root) = read_svg(text, &self.config.read_options())?;
        tracing::debug!("Loaded document with {} nodes", tree.len());
        Ok(Loaded { tree, root })
    }

    /// Serialize the document rooted at `root`
    pub fn to_svg_string(&self, tree: &SvgTree, root: NodeId) -> String {
        write_svg(tree, root, &self.config.write_options())
    }

    /// Write a loaded document to disk
    pub fn save_file(&self, doc: &Loaded, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        let text = self.to_svg_string(&doc.tree, doc.root);
        std::fs::write(path, text)?;
        tracing::info!("Saved {}", path.display());
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
