// src/specs/area_tree.rs
//
// Area tree payload of `/api.php/v3areas/{id}` and its flattening into
// occupancy rows.
//
// Payload shape:
//   { "data": { "list": <AreaNode | [AreaNode]> } }
//   AreaNode = { id, name, TotalCount?, UnavailableSpace?, childArea?: [AreaNode] }
//
// A node is recorded iff it carries `TotalCount`, whether or not it has
// children. Nodes without it are grouping nodes: skipped, but still walked.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Area identifier as sent by the server (numeric on most deployments, text on some).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AreaId {
    Num(i64),
    Text(String),
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaId::Num(n) => write!(f, "{n}"),
            AreaId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AreaNode {
    pub id: AreaId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "TotalCount", default)]
    pub total_count: Option<i64>,
    #[serde(rename = "UnavailableSpace", default)]
    pub unavailable_count: Option<i64>,
    #[serde(rename = "childArea", default)]
    pub children: Vec<AreaNode>,
}

impl AreaNode {
    #[inline]
    pub fn is_leaf_of_interest(&self) -> bool {
        self.total_count.is_some()
    }
}

/// `data.list` is a single root on the live API; an array of roots is
/// accepted and walked in order.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum AreaList {
    Many(Vec<AreaNode>),
    One(Box<AreaNode>),
}

impl AreaList {
    pub fn roots(&self) -> &[AreaNode] {
        match self {
            AreaList::Many(nodes) => nodes,
            AreaList::One(node) => std::slice::from_ref(node.as_ref()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub data: Option<EnvelopeData>,
}

#[derive(Debug, Deserialize)]
pub struct EnvelopeData {
    pub list: Option<AreaList>,
}

/// One persisted row. Field order is the DaySeries column order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OccupancyRecord {
    pub minute: i64,
    pub id: AreaId,
    pub name: String,
    #[serde(rename = "TotalCount")]
    pub total: i64,
    #[serde(rename = "UnavailableSpace")]
    pub unavailable: i64,
    /// `total - unavailable`; negative when the source is inconsistent.
    #[serde(rename = "AvailableSpace")]
    pub available: i64,
}

impl OccupancyRecord {
    fn from_node(node: &AreaNode, total: i64, minute: i64) -> Self {
        let unavailable = node.unavailable_count.unwrap_or(0);
        Self {
            minute,
            id: node.id.clone(),
            name: node.name.clone(),
            total,
            unavailable,
            available: total - unavailable,
        }
    }
}

/// Records of one successful fetch, all stamped with the same minute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub minute: i64,
    pub records: Vec<OccupancyRecord>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool { self.records.is_empty() }
    pub fn len(&self) -> usize { self.records.len() }

    pub fn total(&self) -> i64 {
        self.records.iter().map(|r| r.total).sum()
    }
    pub fn available(&self) -> i64 {
        self.records.iter().map(|r| r.available).sum()
    }
}

/// Pre-order walk of `roots`, one record per leaf-of-interest.
///
/// Iterative: the work-list receives children in reverse so they pop in
/// source order, and no recursion depth is tied to tree depth.
pub fn flatten(roots: &[AreaNode], minute: i64) -> Snapshot {
    let mut records = Vec::new();
    let mut stack: Vec<&AreaNode> = roots.iter().rev().collect();

    while let Some(node) = stack.pop() {
        if let Some(total) = node.total_count {
            records.push(OccupancyRecord::from_node(node, total, minute));
        }
        stack.extend(node.children.iter().rev());
    }

    Snapshot { minute, records }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(json: &str) -> AreaNode {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn id_accepts_number_or_text() {
        let a = node(r#"{"id": 7, "name": "x"}"#);
        let b = node(r#"{"id": "7F", "name": "y"}"#);
        assert_eq!(a.id, AreaId::Num(7));
        assert_eq!(b.id.to_string(), "7F");
    }

    #[test]
    fn list_can_be_single_or_many() {
        let one: AreaList = serde_json::from_str(r#"{"id": 1, "name": "a"}"#).unwrap();
        let many: AreaList =
            serde_json::from_str(r#"[{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]"#).unwrap();
        assert_eq!(one.roots().len(), 1);
        assert_eq!(many.roots().len(), 2);
    }

    #[test]
    fn missing_unavailable_counts_as_zero() {
        let n = node(r#"{"id": 3, "name": "z", "TotalCount": 4}"#);
        let snap = flatten(std::slice::from_ref(&n), 1);
        assert_eq!(snap.records[0].unavailable, 0);
        assert_eq!(snap.records[0].available, 4);
    }
}
