use std::cmp::Ordering;

use crate::doc::{Document, NodeId};
use crate::node::{NodeKind, Scalar};

/// One sort criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// The node's own value.
    Value,
    /// For rows that are arrays: the element at this index.
    Column(usize),
    /// For rows that are objects: the member with this name.
    Field(String),
    /// The node's member key inside its object.
    ChildKey,
}

/// An ordered list of criteria; earlier keys dominate, later ones break
/// ties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
    descending: bool,
}

impl SortSpec {
    pub fn by_value() -> Self {
        Self {
            keys: vec![SortKey::Value],
            descending: false,
        }
    }

    pub fn by_child_key() -> Self {
        Self {
            keys: vec![SortKey::ChildKey],
            descending: false,
        }
    }

    pub fn by_columns(columns: impl IntoIterator<Item = usize>) -> Self {
        Self {
            keys: columns.into_iter().map(SortKey::Column).collect(),
            descending: false,
        }
    }

    pub fn by_fields<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            keys: fields
                .into_iter()
                .map(|field| SortKey::Field(field.into()))
                .collect(),
            descending: false,
        }
    }

    pub fn then(mut self, key: SortKey) -> Self {
        self.keys.push(key);
        self
    }

    pub fn reversed(mut self) -> Self {
        self.descending = true;
        self
    }
}

/// Cross-type rank. Anything without a scalar ordering (containers, error
/// nodes, unset slots) shares the top rank and compares equal there.
fn rank(doc: &Document, id: NodeId) -> u8 {
    if doc.is_unset(id) {
        return 4;
    }
    match doc.kind(id) {
        NodeKind::Null => 0,
        NodeKind::Number => 1,
        NodeKind::String => 2,
        NodeKind::Boolean => 3,
        NodeKind::Array | NodeKind::Object | NodeKind::Error => 4,
    }
}

fn compare_strings_ci(a: &str, b: &str) -> Ordering {
    let left = a.bytes().map(|byte| byte.to_ascii_lowercase());
    let right = b.bytes().map(|byte| byte.to_ascii_lowercase());
    left.cmp(right)
}

impl Document {
    /// Heterogeneous value comparison: null < numbers < strings < booleans,
    /// with containers and error nodes lumped together above everything and
    /// mutually equal. Strings compare case-insensitively, numbers by total
    /// order.
    pub fn compare(&self, a: NodeId, b: NodeId) -> Ordering {
        let (ra, rb) = (rank(self, a), rank(self, b));
        if ra != rb {
            return ra.cmp(&rb);
        }
        // the top rank ties without touching payloads, so handles from
        // another document (which rank there) stay safe to pass in
        if ra == 4 {
            return Ordering::Equal;
        }
        match (&self.node(a).scalar, &self.node(b).scalar) {
            (Scalar::Number(x), Scalar::Number(y)) => x.total_cmp(y),
            (Scalar::Str(x), Scalar::Str(y)) => compare_strings_ci(x, y),
            (Scalar::Bool(x), Scalar::Bool(y)) => x.cmp(y),
            _ => Ordering::Equal,
        }
    }

    fn compare_by_key(&self, a: NodeId, b: NodeId, key: &SortKey) -> Ordering {
        match key {
            SortKey::Value => self.compare(a, b),
            SortKey::Column(index) => match (self.at(a, *index), self.at(b, *index)) {
                (Some(x), Some(y)) => self.compare(x, y),
                // a missing column sorts like null, i.e. first
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortKey::Field(name) => match (self.find_member(a, name), self.find_member(b, name)) {
                (Some(x), Some(y)) => self.compare(x, y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortKey::ChildKey => {
                let left = self.key(a).unwrap_or_default();
                let right = self.key(b).unwrap_or_default();
                compare_strings_ci(left, right)
            }
        }
    }

    pub fn compare_with(&self, a: NodeId, b: NodeId, spec: &SortSpec) -> Ordering {
        let mut ordering = Ordering::Equal;
        for key in &spec.keys {
            ordering = self.compare_by_key(a, b, key);
            if ordering != Ordering::Equal {
                break;
            }
        }
        if spec.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }

    /// Stable in-place sort of a container's children. Non-containers and
    /// short containers are left alone; a completed sort invalidates the
    /// container's cached text.
    pub fn sort_children(&mut self, id: NodeId, spec: &SortSpec) -> bool {
        self.tally("sort");
        if !self.kind(id).is_container() || self.len(id) <= 1 {
            return false;
        }
        let mut order: Vec<NodeId> = self.children(id).to_vec();
        order.sort_by(|&x, &y| self.compare_with(x, y, spec));
        if order == self.children(id) {
            return false;
        }
        self.node_mut(id).children = order;
        self.invalidate(id);
        true
    }
}
