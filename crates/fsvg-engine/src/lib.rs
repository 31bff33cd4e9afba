//! fSVG Engine
//!
//! A retained-mode SVG document model with CSS styling.
//!
//! # Features
//!
//! - `mimalloc`: use mimalloc as the global allocator
//!
//! # Example
//! ```rust,ignore
//! use fsvg_engine::{Engine, Config};
//!
//! let engine = Engine::new(Config::default());
//! let mut doc = engine.load_file("icon.svg")?;
//! let bounds = doc.tree.bounds(doc.root);
//! engine.save_file(&doc, "out.svg")?;
//! ```

mod config;
mod engine;

pub use config::Config;
pub use engine::{Engine, EngineError, Loaded};

pub use fsvg_css as css;
pub use fsvg_dom as dom;
pub use fsvg_xml as xml;

pub use fsvg_dom::{NodeId, NodeKind, Rect, SvgTree};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "mimalloc")]
use mimalloc::MiMalloc;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
