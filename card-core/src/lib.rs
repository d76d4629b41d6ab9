//! # Recipe Card Core
//!
//! Canvas document model for recipe-card designs: a fixed-size page of
//! positioned, typed, layered elements, with a pure mutation engine and a
//! deterministic compositing pass shared by interactive display and static
//! export.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 card-core                   │
//! ├─────────────────────────────────────────────┤
//! │  Document        │  Mutation Engine         │
//! │  - Dimensions    │  - Add / validate        │
//! │  - Background    │  - Move (clamped)        │
//! │  - Elements      │  - Update (merged)       │
//! │                  │  - Delete                │
//! ├─────────────────────────────────────────────┤
//! │  Compositor      │  Serialization           │
//! │  - Paint order   │  - Structural precheck   │
//! │  - Fallbacks     │  - Invariant validation  │
//! │  - Icon safety   │  - Size guard            │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod compose;
pub mod document;
pub mod element;
pub mod engine;
pub mod error;
pub mod sanitize;
pub mod session;

pub use codec::enforce_size_limit;
pub use compose::{compose, Composite, Frame, Layer, LayerContent};
pub use document::{Background, Dimensions, Document};
pub use element::{
    Element, ElementContent, ElementDraft, ElementId, ElementPatch, Position, Size,
};
pub use error::{CardError, CardResult, ValidationError};
pub use session::EditorSession;

/// Card core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
