//! # Recipe Card Renderer
//!
//! Static export for card documents. Documents are reduced to paint-ready
//! composites by `card-core` and rendered through an SVG intermediate, so
//! the exported file matches what the editor displayed.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   compose   ┌───────────┐   build    ┌─────┐
//! │ Document ├────────────►│ Composite ├───────────►│ SVG │
//! └──────────┘             └───────────┘            └──┬──┘
//!                                          resvg       │
//!                          ┌───────────┐◄──────────────┘
//!                          │  Pixmap   ├──► PNG / JPEG
//!                          └───────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;

pub use error::{RenderError, RenderResult};
pub use export::{CardExporter, ExportConfig, ExportFormat};
