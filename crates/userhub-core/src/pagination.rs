//! Paging, sorting and filtering model for user listings.
//!
//! Everything a client may influence is funnelled through closed
//! enumerations: the sort column, the sort direction and the filter
//! predicate each map to literal SQL fragments, and only the filter *value*
//! is ever bound as a parameter.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Page size used when the client supplies none (or zero).
pub const DEFAULT_LIMIT: u32 = 10;
/// Page number used when the client supplies none (or zero).
pub const DEFAULT_PAGE: u32 = 1;
/// Largest page size a client may request.
pub const MAX_LIMIT: u32 = 1000;

/// Columns a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    /// `country` (code `0`).
    #[default]
    Country,
    /// `nickname` (code `1`).
    Nickname,
    /// `email` (code `2`).
    Email,
    /// `created_at` (code `3`).
    CreatedAt,
    /// `first_name` (code `4`).
    FirstName,
    /// `last_name` (code `5`).
    LastName,
}

impl SortColumn {
    /// Parses a numeric code or a column name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for anything outside the enumeration.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "0" | "country" => Ok(Self::Country),
            "1" | "nickname" => Ok(Self::Nickname),
            "2" | "email" => Ok(Self::Email),
            "3" | "created_at" => Ok(Self::CreatedAt),
            "4" | "first_name" => Ok(Self::FirstName),
            "5" | "last_name" => Ok(Self::LastName),
            _ => Err(DomainError::Validation(format!("unsupported sort column: {raw}"))),
        }
    }

    /// The literal column name.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Nickname => "nickname",
            Self::Email => "email",
            Self::CreatedAt => "created_at",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Ascending (code `0`).
    #[default]
    Asc,
    /// Descending (code `1`).
    Desc,
}

impl SortDirection {
    /// Parses a numeric code or `asc`/`desc`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for anything else.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "0" | "asc" => Ok(Self::Asc),
            "1" | "desc" => Ok(Self::Desc),
            _ => Err(DomainError::Validation(format!("unsupported sort type: {raw}"))),
        }
    }

    /// The literal SQL keyword.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Columns a listing may be filtered on with an equality predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    /// `country = ?`
    Country,
    /// `nickname = ?`
    Nickname,
    /// `email = ?`
    Email,
    /// `first_name = ?`
    FirstName,
    /// `last_name = ?`
    LastName,
}

impl FilterField {
    const ALLOWED: [(&'static str, Self); 5] = [
        ("country = ?", Self::Country),
        ("nickname = ?", Self::Nickname),
        ("email = ?", Self::Email),
        ("first_name = ?", Self::FirstName),
        ("last_name = ?", Self::LastName),
    ];

    /// Matches a client-supplied predicate template against the allow-list.
    ///
    /// Comparison ignores case and collapses whitespace, so `"Country=?"`
    /// matches `"country = ?"`; nothing outside the list is accepted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for any other template.
    pub fn from_template(template: &str) -> Result<Self, DomainError> {
        let normalized = normalize_template(template);
        Self::ALLOWED
            .iter()
            .find(|(allowed, _)| normalize_template(allowed) == normalized)
            .map(|(_, field)| *field)
            .ok_or_else(|| DomainError::Validation(format!("unsupported filter query: {template}")))
    }

    /// The literal column name.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Nickname => "nickname",
            Self::Email => "email",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
        }
    }
}

fn normalize_template(template: &str) -> String {
    template
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// An allow-listed equality predicate and its bound value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Column to compare.
    pub field: FilterField,
    /// Value bound as a query parameter.
    pub value: String,
}

/// Raw listing parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Page size.
    pub limit: Option<u32>,
    /// 1-indexed page number.
    pub page: Option<u32>,
    /// Sort column code or name.
    #[serde(rename = "sColumn")]
    pub s_column: Option<String>,
    /// Sort direction code or name.
    #[serde(rename = "sType")]
    pub s_type: Option<String>,
    /// Predicate template, e.g. `country = ?`.
    #[serde(rename = "cQuery")]
    pub c_query: Option<String>,
    /// Value for the predicate template.
    #[serde(rename = "cVal")]
    pub c_val: Option<String>,
}

/// A validated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Page size, `1..=MAX_LIMIT`.
    pub limit: u32,
    /// 1-indexed page number.
    pub page: u32,
    /// Ordering column.
    pub sort_column: SortColumn,
    /// Ordering direction.
    pub sort_direction: SortDirection,
    /// Optional equality filter.
    pub filter: Option<Filter>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: DEFAULT_PAGE,
            sort_column: SortColumn::default(),
            sort_direction: SortDirection::default(),
            filter: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl PageRequest {
    /// Validates raw parameters, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the limit is too large, a sort
    /// value is unknown, the filter template is not allow-listed, or only one
    /// of `cQuery`/`cVal` is supplied.
    pub fn from_params(params: ListParams) -> Result<Self, DomainError> {
        let limit = match params.limit {
            None | Some(0) => DEFAULT_LIMIT,
            Some(limit) if limit > MAX_LIMIT => {
                return Err(DomainError::Validation(format!(
                    "limit must not exceed {MAX_LIMIT}"
                )));
            }
            Some(limit) => limit,
        };
        let page = match params.page {
            None | Some(0) => DEFAULT_PAGE,
            Some(page) => page,
        };
        let sort_column = params
            .s_column
            .as_deref()
            .map_or(Ok(SortColumn::default()), SortColumn::parse)?;
        let sort_direction = params
            .s_type
            .as_deref()
            .map_or(Ok(SortDirection::default()), SortDirection::parse)?;

        let filter = match (non_empty(params.c_query), non_empty(params.c_val)) {
            (Some(template), Some(value)) => Some(Filter {
                field: FilterField::from_template(&template)?,
                value,
            }),
            (None, None) => None,
            _ => {
                return Err(DomainError::Validation(
                    "cQuery and cVal must be supplied together".into(),
                ));
            }
        };

        Ok(Self {
            limit,
            page,
            sort_column,
            sort_direction,
            filter,
        })
    }

    /// Number of rows to skip: `(page - 1) * limit`.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Page size used.
    pub limit: u32,
    /// Page number returned.
    pub page: u32,
    /// Ordering column used.
    pub sort_column: SortColumn,
    /// Ordering direction used.
    pub sort_direction: SortDirection,
    /// Rows matching the filter, before paging.
    pub total_rows: u64,
    /// `ceil(total_rows / limit)`.
    pub total_pages: u64,
    /// The rows of this page.
    pub rows: Vec<T>,
}

impl<T> Page<T> {
    /// Assembles a page from the filtered count and the fetched window.
    #[must_use]
    pub fn new(request: &PageRequest, total_rows: u64, rows: Vec<T>) -> Self {
        Self {
            limit: request.limit,
            page: request.page,
            sort_column: request.sort_column,
            sort_direction: request.sort_direction,
            total_rows,
            total_pages: total_rows.div_ceil(u64::from(request.limit.max(1))),
            rows,
        }
    }

    /// Converts every row, keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            limit: self.limit,
            page: self.page,
            sort_column: self.sort_column,
            sort_direction: self.sort_direction,
            total_rows: self.total_rows,
            total_pages: self.total_pages,
            rows: self.rows.into_iter().map(f).collect(),
        }
    }
}
