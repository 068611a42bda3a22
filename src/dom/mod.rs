//! In-memory HTML document model.
//!
//! The live page and every document fetched during navigation are parsed by
//! html5ever into an arena tree, queried with CSS selectors, and mutated in
//! place by the engine.

mod arena;
mod select;
mod tree_sink;

pub use arena::{Attribute, Document, Node, NodeData, NodeId};
pub use select::Selector;
pub use tree_sink::DocumentSink;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use crate::util::decode_text;

/// Parse an HTML string into a [`Document`].
pub fn parse_html(html: &str) -> Document {
    let sink = DocumentSink::new();
    let result = parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes());
    result.into_document()
}

/// Parse raw fetched bytes into a [`Document`], detecting the text encoding
/// first (UTF-8 with a Windows-1252 fallback).
pub fn parse_bytes(bytes: &[u8]) -> Document {
    parse_html(&decode_text(bytes))
}
