//! Property catalog
//!
//! The static registry of every field key that may be shown as a column in a
//! plan's run listing. The catalog is process-wide and immutable.

use crate::PropertyType;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertyDef {
    pub key: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
}

const fn def(key: &'static str, name: &'static str, property_type: PropertyType) -> PropertyDef {
    PropertyDef {
        key,
        name,
        property_type,
    }
}

/// All displayable run properties, in catalog order.
pub static PROPERTIES: [PropertyDef; 13] = [
    def("identifier", "Identifier", PropertyType::Text),
    def("title", "Title", PropertyType::Text),
    def("suite", "Suite", PropertyType::Suite),
    def("executor", "Executor", PropertyType::Member),
    def("status", "Status", PropertyType::Status),
    def("priority", "Priority", PropertyType::Priority),
    def("important_level", "Important Level", PropertyType::Select),
    def("type", "Case Type", PropertyType::Select),
    def("precondition", "Precondition", PropertyType::Text),
    def("steps", "Steps", PropertyType::Steps),
    def("estimated_workload", "Estimated Workload", PropertyType::Number),
    def("remark", "Remark", PropertyType::Text),
    def("updated_at", "Updated At", PropertyType::Date),
];

static PROPERTY_INDEX: Lazy<HashMap<&'static str, &'static PropertyDef>> =
    Lazy::new(|| PROPERTIES.iter().map(|p| (p.key, p)).collect());

/// Look up a property by key.
pub fn property(key: &str) -> Option<&'static PropertyDef> {
    PROPERTY_INDEX.get(key).copied()
}

/// Whether `key` names a catalog property.
pub fn is_known_property(key: &str) -> bool {
    PROPERTY_INDEX.contains_key(key)
}

/// A resolved column, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub key: String,
    pub is_locked: bool,
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
}

impl ColumnDescriptor {
    /// Resolve `key` against the catalog. Unknown keys yield `None`.
    pub fn resolve(key: &str, is_locked: bool) -> Option<Self> {
        property(key).map(|p| Self {
            key: p.key.to_string(),
            is_locked,
            name: p.name.to_string(),
            property_type: p.property_type,
        })
    }
}
