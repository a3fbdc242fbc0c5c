//! Find options and page results shared by the repositories.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use testrun_core::SortDirection;

/// Sort on one serialized field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Field projection: only the named fields are returned.
///
/// Typed identity fields are always returned; the projection decides which
/// optional payload (steps, dynamic fields) comes back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Projection {
    fields: BTreeSet<String>,
}

impl Projection {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn includes(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

/// Options accepted by `find`, `find_one_by_id` and `find_by_page_index`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FindOptions {
    pub projection: Option<Projection>,
    pub sort: Option<SortSpec>,
}

impl FindOptions {
    pub fn with_projection(projection: Projection) -> Self {
        Self {
            projection: Some(projection),
            sort: None,
        }
    }

    pub fn with_sort(sort: SortSpec) -> Self {
        Self {
            projection: None,
            sort: Some(sort),
        }
    }
}

/// User directory fields that can be projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    Name,
    DisplayName,
    Desc,
    Avatar,
    Mobile,
    Email,
}

/// Projection over user directory records. `uid` is always returned.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProjection {
    fields: BTreeSet<UserField>,
}

impl UserProjection {
    pub fn new(fields: impl IntoIterator<Item = UserField>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// The fixed field set exposed by the run views.
    pub fn profile() -> Self {
        Self::new([
            UserField::Name,
            UserField::DisplayName,
            UserField::Desc,
            UserField::Avatar,
            UserField::Mobile,
            UserField::Email,
        ])
    }

    pub fn includes(&self, field: UserField) -> bool {
        self.fields.contains(&field)
    }
}

/// One page of a paginated query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub entities: Vec<T>,
    pub page_index: u32,
    pub page_size: u32,
    /// Total matching entities across all pages.
    pub count: u64,
    pub page_count: u64,
}

impl<T> PageResult<T> {
    /// Slice `all` into the requested page. A zero page size yields no pages.
    pub fn from_all(all: Vec<T>, page_index: u32, page_size: u32) -> Self {
        let count = all.len() as u64;
        let page_count = if page_size == 0 {
            0
        } else {
            count.div_ceil(u64::from(page_size))
        };
        let start = (page_index as usize).saturating_mul(page_size as usize);
        let entities = all
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();
        Self {
            entities,
            page_index,
            page_size,
            count,
            page_count,
        }
    }
}
