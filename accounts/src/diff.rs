//! Diffs between consecutive states of an account.
//!
//! The structural diff follows the shape of the `deep-diff` npm package and
//! the text diff the shape of `diffChars` of the `diff` npm package since the
//! inspector renders both as is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use similar::{ChangeTag, TextDiff};

// -----------------
// Structural Diff
// -----------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DiffEntry {
    /// Property or element was added
    #[serde(rename = "N")]
    New {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        path: Vec<PathSegment>,
        rhs: Value,
    },
    /// Property or element was deleted
    #[serde(rename = "D")]
    Deleted {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        path: Vec<PathSegment>,
        lhs: Value,
    },
    /// Property or element was edited
    #[serde(rename = "E")]
    Edited {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        path: Vec<PathSegment>,
        lhs: Value,
        rhs: Value,
    },
    /// Element was added to or removed from the array at `path`
    #[serde(rename = "A")]
    Array {
        path: Vec<PathSegment>,
        index: usize,
        item: Box<DiffEntry>,
    },
}

pub type AccountDiff = Vec<DiffEntry>;

/// Structural diff of two pretty account views, empty if they are equal
pub fn diff_pretty(lhs: &Map<String, Value>, rhs: &Map<String, Value>) -> AccountDiff {
    let mut entries = vec![];
    diff_objects(&mut vec![], lhs, rhs, &mut entries);
    entries
}

fn diff_objects(
    path: &mut Vec<PathSegment>,
    lhs: &Map<String, Value>,
    rhs: &Map<String, Value>,
    entries: &mut AccountDiff,
) {
    for (key, lval) in lhs {
        path.push(PathSegment::Key(key.clone()));
        match rhs.get(key) {
            Some(rval) => diff_values(path, lval, rval, entries),
            None => entries.push(DiffEntry::Deleted {
                path: path.clone(),
                lhs: lval.clone(),
            }),
        }
        path.pop();
    }
    for (key, rval) in rhs {
        if !lhs.contains_key(key) {
            let mut path = path.clone();
            path.push(PathSegment::Key(key.clone()));
            entries.push(DiffEntry::New {
                path,
                rhs: rval.clone(),
            });
        }
    }
}

fn diff_values(
    path: &mut Vec<PathSegment>,
    lhs: &Value,
    rhs: &Value,
    entries: &mut AccountDiff,
) {
    match (lhs, rhs) {
        (Value::Object(lhs), Value::Object(rhs)) => {
            diff_objects(path, lhs, rhs, entries)
        }
        (Value::Array(lhs), Value::Array(rhs)) => {
            let common = lhs.len().min(rhs.len());
            for idx in 0..common {
                path.push(PathSegment::Index(idx));
                diff_values(path, &lhs[idx], &rhs[idx], entries);
                path.pop();
            }
            for idx in (common..lhs.len()).rev() {
                entries.push(DiffEntry::Array {
                    path: path.clone(),
                    index: idx,
                    item: Box::new(DiffEntry::Deleted {
                        path: vec![],
                        lhs: lhs[idx].clone(),
                    }),
                });
            }
            for (idx, rval) in rhs.iter().enumerate().skip(common) {
                entries.push(DiffEntry::Array {
                    path: path.clone(),
                    index: idx,
                    item: Box::new(DiffEntry::New {
                        path: vec![],
                        rhs: rval.clone(),
                    }),
                });
            }
        }
        (lhs, rhs) if lhs == rhs => {}
        (lhs, rhs) => entries.push(DiffEntry::Edited {
            path: path.clone(),
            lhs: lhs.clone(),
            rhs: rhs.clone(),
        }),
    }
}

// -----------------
// Text Diff
// -----------------
/// A run of characters that was kept, added or removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub value: String,
    pub count: usize,
    pub added: bool,
    pub removed: bool,
}

/// Character level diff of two rendered accounts, consecutive characters
/// with the same change kind are merged into one [Change]
pub fn diff_chars(old: &str, new: &str) -> Vec<Change> {
    let diff = TextDiff::from_chars(old, new);
    let mut changes: Vec<Change> = vec![];
    for change in diff.iter_all_changes() {
        let added = change.tag() == ChangeTag::Insert;
        let removed = change.tag() == ChangeTag::Delete;
        match changes.last_mut() {
            Some(last) if last.added == added && last.removed == removed => {
                last.value.push_str(change.value());
                last.count += 1;
            }
            _ => changes.push(Change {
                value: change.value().to_string(),
                count: 1,
                added,
                removed,
            }),
        }
    }
    changes
}
