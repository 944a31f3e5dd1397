//! HTML document tree: parsing, navigation, mutation and serialization.

mod arena;
mod serialize;
mod sink;

pub use arena::{Attribute, Children, Document, Node, NodeData, NodeId};
pub use serialize::SerializableNode;
pub use sink::{ArenaSink, NodeHandle};

use html5ever::driver::ParseOpts;
use html5ever::tendril::TendrilSink;

/// Deepest element nesting accepted from the parser.
pub const MAX_DEPTH: usize = 512;

/// Errors that can occur when parsing rendered HTML.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Input is not valid UTF-8 (first invalid byte at offset {offset})")]
    InvalidUtf8 { offset: usize },

    #[error("Elements nested {depth} levels deep, the limit is {limit}")]
    TooDeep { depth: usize, limit: usize },
}

/// Parse an HTML byte stream into a [`Document`].
///
/// Parsing follows the HTML5 tree-construction rules, so fragments gain the
/// implied `html`, `head` and `body` elements. Unlike a browser, the input is
/// rejected rather than repaired when it is not UTF-8 or nests deeper than
/// [`MAX_DEPTH`].
pub fn parse_document(input: &[u8]) -> Result<Document, ParseError> {
    let text = std::str::from_utf8(input).map_err(|e| ParseError::InvalidUtf8 {
        offset: e.valid_up_to(),
    })?;

    let sink = html5ever::parse_document(ArenaSink::new(), ParseOpts::default()).one(text);
    let doc = sink.into_document();

    let depth = doc.max_depth();
    if depth > MAX_DEPTH {
        return Err(ParseError::TooDeep {
            depth,
            limit: MAX_DEPTH,
        });
    }

    Ok(doc)
}
