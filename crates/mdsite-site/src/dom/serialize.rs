//! HTML serialization of a [`Document`] through html5ever's serializer.

use std::io::{self, Write};

use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};

use super::arena::{Document, NodeData, NodeId};

/// A node of a [`Document`] that html5ever can serialize.
pub struct SerializableNode<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> SerializableNode<'a> {
    pub fn new(doc: &'a Document, id: NodeId) -> Self {
        Self { doc, id }
    }
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match traversal_scope {
            TraversalScope::IncludeNode => serialize_node(self.doc, self.id, serializer),
            TraversalScope::ChildrenOnly(_) => serialize_children(self.doc, self.id, serializer),
        }
    }
}

fn serialize_children<S: Serializer>(doc: &Document, id: NodeId, serializer: &mut S) -> io::Result<()> {
    for child in doc.children(id) {
        serialize_node(doc, child, serializer)?;
    }
    Ok(())
}

fn serialize_node<S: Serializer>(doc: &Document, id: NodeId, serializer: &mut S) -> io::Result<()> {
    match &doc.node(id).data {
        NodeData::Document => serialize_children(doc, id, serializer),
        NodeData::Doctype { name, .. } => serializer.write_doctype(name),
        NodeData::Text(text) => serializer.write_text(text),
        NodeData::Comment(text) => serializer.write_comment(text),
        NodeData::Element { name, attrs } => {
            serializer.start_elem(
                name.clone(),
                attrs.iter().map(|a| (&a.name, a.value.as_str())),
            )?;
            serialize_children(doc, id, serializer)?;
            serializer.end_elem(name.clone())
        }
    }
}

impl Document {
    /// Write the whole document as HTML.
    pub fn write_html<W: Write>(&self, writer: W) -> io::Result<()> {
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        };
        serialize(writer, &SerializableNode::new(self, self.root()), opts)
    }

    /// Serialize the whole document to UTF-8 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        if let Err(e) = self.write_html(&mut bytes) {
            tracing::error!("HTML serialization failed: {}", e);
        }
        bytes
    }

    /// Serialize the whole document to an HTML string.
    pub fn to_html(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }
}
