//! Reusable named fragments.
//!
//! Fragments are not part of the executable type graph; they materialize
//! into named pieces of query text callers can splice into documents.

use std::fmt;

use arcstr::ArcStr;
use itertools::Itertools as _;

use crate::declare::{FragmentDecl, SelectionNode};

/// A materialized fragment.
///
/// `Display` renders the full definition:
///
/// ```text
/// fragment TeamSummary on Team { id name members { id } }
/// ```
#[derive(Clone, Debug)]
pub struct Fragment {
    name: ArcStr,
    on: ArcStr,
    selection: Vec<SelectionNode>,
}

impl Fragment {
    pub(crate) fn new(decl: &FragmentDecl) -> Self {
        Self {
            name: decl.name.clone(),
            on: decl.on.clone(),
            selection: decl.selection.clone(),
        }
    }

    /// The fragment name.
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The type the fragment targets.
    pub fn on(&self) -> &ArcStr {
        &self.on
    }

    /// The spread form, for splicing into a selection set.
    pub fn spread(&self) -> String {
        format!("... {}", self.name)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fragment {} on {} {{ {} }}",
            self.name,
            self.on,
            render_selection(&self.selection),
        )
    }
}

fn render_selection(nodes: &[SelectionNode]) -> String {
    nodes.iter().map(render_node).join(" ")
}

fn render_node(node: &SelectionNode) -> String {
    match node {
        SelectionNode::Field(name) => name.to_string(),
        SelectionNode::Nested(field) => {
            let mut out = String::new();
            if let Some(alias) = &field.alias {
                out.push_str(alias);
                out.push_str(": ");
            }
            out.push_str(&field.name);
            if !field.args.is_empty() {
                let args = field
                    .args
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .join(", ");
                out.push_str(&format!("({args})"));
            }
            if !field.fields.is_empty() {
                out.push_str(&format!(" {{ {} }}", render_selection(&field.fields)));
            }
            out
        }
    }
}
