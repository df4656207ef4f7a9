use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// A stored joke, scheduled for exactly one calendar date.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Joke {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(rename = "joke")]
    pub text: String,
    pub description: Option<String>,
}

/// A joke that has not been stored yet. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJoke {
    pub date: NaiveDate,
    pub text: String,
    pub description: Option<String>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortProperty {
    Id,
    Date,
    Joke,
    Description,
}

impl SortProperty {
    /// Column backing this property in the `jokes` table.
    pub fn column(self) -> &'static str {
        match self {
            SortProperty::Id => "id",
            SortProperty::Date => "date",
            SortProperty::Joke => "joke",
            SortProperty::Description => "description",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub property: SortProperty,
    pub direction: Direction,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.property.column(), self.direction.as_str())
    }
}

/// Parses `property` or `property,direction`, e.g. `date,desc`.
impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let property = match parts.next().unwrap_or_default() {
            "id" => SortProperty::Id,
            "date" => SortProperty::Date,
            "joke" => SortProperty::Joke,
            "description" => SortProperty::Description,
            other => return Err(format!("unknown sort property '{}'", other)),
        };
        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(other) => return Err(format!("unknown sort direction '{}'", other)),
        };
        if parts.next().is_some() {
            return Err(format!("malformed sort expression '{}'", s));
        }
        Ok(SortOrder { property, direction })
    }
}

/// One slice of an ordered collection: page index, page size and sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Vec<SortOrder>,
}

impl PageRequest {
    /// Builds a request, falling back to the default size for zero and
    /// clamping oversized pages.
    pub fn new(page: u32, size: u32, sort: Vec<SortOrder>) -> Self {
        let size = match size {
            0 => DEFAULT_PAGE_SIZE,
            s => s.min(MAX_PAGE_SIZE),
        };
        Self { page, size, sort }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE, Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page,
            size: request.size,
            total_elements,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 1;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages()
    }
}
