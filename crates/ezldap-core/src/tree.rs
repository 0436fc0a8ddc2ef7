//! OU subtree
//!
//! Owned recursive tree produced by subtree assembly. Children are keyed by
//! label and kept in lexicographic order. Traversals are depth-first
//! pre-order and use an explicit stack so deep trees cannot overflow.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{OuSearchResult, User};

const INDENT_STEP: &str = "     ";

/// One OU with its users and child OUs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct OuTreeNode {
    /// DN of this OU.
    pub distinguished_path: String,
    /// The OU record.
    pub ou: OuSearchResult,
    /// Child OUs by label.
    pub child_nodes: BTreeMap<String, OuTreeNode>,
    /// Users whose object path is this OU.
    pub users: Vec<User>,
}

impl OuTreeNode {
    /// Create a node without children or users.
    pub fn new(distinguished_path: impl Into<String>, ou: OuSearchResult) -> Self {
        Self {
            distinguished_path: distinguished_path.into(),
            ou,
            child_nodes: BTreeMap::new(),
            users: Vec::new(),
        }
    }

    /// Pre-order iterator over this node and all descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Users of the subtree keyed by object id.
    ///
    /// Users without object id are skipped. When the same id occurs twice,
    /// the one visited later wins.
    pub fn flatten_users_by_object_id(&self) -> HashMap<String, User> {
        let mut users = HashMap::new();
        for node in self.iter() {
            for user in &node.users {
                if let Some(id) = &user.base.object_id {
                    users.insert(id.clone(), user.clone());
                }
            }
        }
        users
    }

    /// All users of the subtree in traversal order.
    pub fn flatten_users_list(&self) -> Vec<User> {
        self.iter()
            .flat_map(|node| node.users.iter().cloned())
            .collect()
    }

    /// All OU records of the subtree, this node first.
    pub fn flatten_ou_list(&self) -> Vec<OuSearchResult> {
        self.iter().map(|node| node.ou.clone()).collect()
    }

    /// Human-readable rendering, each line prefixed with `indent`.
    pub fn render(&self, indent: &str) -> String {
        let mut out = String::new();
        let mut stack = vec![(self, indent.to_string())];
        while let Some((node, tab)) = stack.pop() {
            out.push_str(&format!(
                "{tab}***** New LDAP entry : {} {} *****\n",
                node.ou.ou_short_name.as_deref().unwrap_or_default(),
                node.ou.ou_short_code.as_deref().unwrap_or_default(),
            ));
            out.push_str(&format!("{tab}{}\n", node.distinguished_path));
            out.push_str(&format!("{tab}{:?}\n", node.ou));
            for user in &node.users {
                out.push_str(&format!("{tab}{user:?}\n"));
            }
            let child_tab = format!("{tab}{INDENT_STEP}");
            for child in node.child_nodes.values().rev() {
                stack.push((child, child_tab.clone()));
            }
        }
        out
    }

    /// JSON form of the subtree.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for OuTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(""))
    }
}

impl<'a> IntoIterator for &'a OuTreeNode {
    type Item = &'a OuTreeNode;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pre-order iterator returned by [`OuTreeNode::iter`].
pub struct Iter<'a> {
    stack: Vec<&'a OuTreeNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a OuTreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.child_nodes.values().rev());
        Some(node)
    }
}
