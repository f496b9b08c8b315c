//! Content model types for extracted DOCX documents.
//!
//! This module defines the intermediate representation (IR) that bridges
//! DOCX extraction and DocBook generation. Blocks are kept in source
//! reading order; images live in a separate id-keyed map so that block
//! references stay cheap to clone and check.

mod block;
mod document;
mod grid;
mod image;
mod span;

pub use block::Block;
pub use document::{ContentModel, Metadata};
pub use grid::{GridCell, OwnerCell, TableGrid};
pub use image::{ImageAsset, ImageFormat};
pub use span::{coalesce_spans, spans_text, StyleSpan, TextFormat};
