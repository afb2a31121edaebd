use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::hierarchy::{Hierarchy, NodeIndex, TreeNode};

/// What to do when the payload has more than one top-level record.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExtraRoots {
    /// Use the first record, log and drop the rest.
    #[default]
    Ignore,
    /// Fail with [`Error::ExtraRoots`].
    Reject,
}

/// Turns a raw JSON payload into a [`Hierarchy`].
///
/// The payload is a sequence of records (a single record is accepted too).
/// Every record has an identity field and optionally a field holding its child records.
///
/// # Example
///
/// ```
/// # use tui_tree_diagram::HierarchyBuilder;
/// let raw = serde_json::json!([
///     { "valor": "Homo Ludens", "subnodos": [{ "valor": "Juego" }] }
/// ]);
/// let hierarchy = HierarchyBuilder::default().build(&raw)?;
/// assert_eq!(hierarchy.len(), 2);
/// # Ok::<(), tui_tree_diagram::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct HierarchyBuilder {
    identity_field: String,
    children_field: String,
    extra_roots: ExtraRoots,
    unique_identities: bool,
}

impl Default for HierarchyBuilder {
    fn default() -> Self {
        Self {
            identity_field: "valor".to_owned(),
            children_field: "subnodos".to_owned(),
            extra_roots: ExtraRoots::Ignore,
            unique_identities: true,
        }
    }
}

impl HierarchyBuilder {
    #[must_use]
    pub fn identity_field(mut self, field: impl Into<String>) -> Self {
        self.identity_field = field.into();
        self
    }

    #[must_use]
    pub fn children_field(mut self, field: impl Into<String>) -> Self {
        self.children_field = field.into();
        self
    }

    #[must_use]
    pub const fn extra_roots(mut self, policy: ExtraRoots) -> Self {
        self.extra_roots = policy;
        self
    }

    /// Check the identity keys of the whole tree for duplicates while building.
    ///
    /// Turned on by default. When turned off, duplicates are still rejected as soon as they are visible at the same time.
    #[must_use]
    pub const fn unique_identities(mut self, enabled: bool) -> Self {
        self.unique_identities = enabled;
        self
    }

    /// Build the full tree. Nothing is collapsed yet.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedInput`] when there is no top-level record, a record is not an object,
    ///   lacks the identity field or has a children field which is not a sequence of records.
    /// - [`Error::ExtraRoots`] when there is more than one top-level record and [`ExtraRoots::Reject`] is set.
    /// - [`Error::DuplicateIdentity`] when two nodes share an identity key and the check is enabled.
    pub fn build(&self, raw: &Value) -> Result<Hierarchy> {
        let root = match raw {
            Value::Array(records) => {
                let first = records
                    .first()
                    .ok_or_else(|| Error::malformed("", "expected at least one top-level record"))?;
                if records.len() > 1 {
                    match self.extra_roots {
                        ExtraRoots::Ignore => log::warn!(
                            "ignoring {} top-level records after the first",
                            records.len() - 1
                        ),
                        ExtraRoots::Reject => {
                            return Err(Error::ExtraRoots {
                                count: records.len(),
                            })
                        }
                    }
                }
                first
            }
            Value::Object(_) => raw,
            _ => {
                return Err(Error::malformed(
                    "",
                    "expected a sequence of records or a single record",
                ))
            }
        };

        let mut hierarchy = Hierarchy { nodes: Vec::new() };
        let record = as_record(root, "[0]")?;
        self.materialize(&mut hierarchy, record, None, "[0]")?;

        if self.unique_identities {
            ensure_unique(&hierarchy)?;
        }
        log::debug!("built hierarchy with {} nodes", hierarchy.len());
        Ok(hierarchy)
    }

    fn materialize(
        &self,
        hierarchy: &mut Hierarchy,
        record: &Map<String, Value>,
        parent: Option<NodeIndex>,
        path: &str,
    ) -> Result<NodeIndex> {
        let id = self.identity(record, path)?;
        let depth = parent.map_or(0, |parent| hierarchy.node(parent).depth + 1);
        let index = NodeIndex(hierarchy.nodes.len());
        hierarchy.nodes.push(TreeNode::new(id, depth, parent));

        let children = match record.get(&self.children_field) {
            None | Some(Value::Null) => return Ok(index),
            Some(Value::Array(children)) => children,
            Some(_) => {
                return Err(Error::malformed(
                    &format!("{path}.{}", self.children_field),
                    "children must be a sequence of records",
                ))
            }
        };

        for (position, child) in children.iter().enumerate() {
            let child_path = format!("{path}.{}[{position}]", self.children_field);
            let child = as_record(child, &child_path)?;
            let child_index = self.materialize(hierarchy, child, Some(index), &child_path)?;
            hierarchy.node_mut(index).visible_children.push(child_index);
        }
        Ok(index)
    }

    fn identity(&self, record: &Map<String, Value>, path: &str) -> Result<String> {
        match record.get(&self.identity_field) {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(number)) => Ok(number.to_string()),
            Some(Value::Bool(value)) => Ok(value.to_string()),
            Some(_) => Err(Error::malformed(
                path,
                format!("identity field {:?} must be a scalar", self.identity_field),
            )),
            None => Err(Error::malformed(
                path,
                format!("missing identity field {:?}", self.identity_field),
            )),
        }
    }
}

fn as_record<'value>(value: &'value Value, path: &str) -> Result<&'value Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::malformed(path, "expected a record"))
}

fn ensure_unique(hierarchy: &Hierarchy) -> Result<()> {
    let mut seen = HashSet::new();
    for (_, node) in hierarchy.iter() {
        if !seen.insert(node.id()) {
            return Err(Error::DuplicateIdentity {
                id: node.id().to_owned(),
            });
        }
    }
    Ok(())
}
