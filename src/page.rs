//! Paged results and the locally refined view over one fetched page.
//!
//! A `RefinedView` only ever filters the items of the page it was built from;
//! it never reaches into other pages. Filtering across the whole data set
//! belongs in the repository query (`search` parameters).

use serde::{Deserialize, Serialize};

use crate::limits::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::model::{Doctor, DoctorScheduleEntry, PeriodSummary};

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Clamps the request into `page >= 1` and `1 <= page_size <= MAX_PAGE_SIZE`.
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.max(1) - 1) * self.page_size
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    /// Slice `all` according to `req`.
    pub fn from_slice(all: &[T], req: PageRequest) -> Self
    where
        T: Clone,
    {
        let items = all
            .iter()
            .skip(req.offset())
            .take(req.page_size)
            .cloned()
            .collect();
        Self {
            items,
            page: req.page,
            page_size: req.page_size,
            total_items: all.len(),
        }
    }

    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total_items.div_ceil(self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
        }
    }

    /// Filter this page's items by free text.
    pub fn refine(&self, needle: &str) -> RefinedView<'_, T>
    where
        T: Searchable,
    {
        let needle = needle.trim().to_lowercase();
        let matches = self
            .items
            .iter()
            .filter(|item| needle.is_empty() || item.matches(&needle))
            .collect();
        RefinedView { page: self, matches }
    }
}

/// Items of a single page that matched a free-text filter.
#[derive(Debug)]
pub struct RefinedView<'a, T> {
    page: &'a Page<T>,
    matches: Vec<&'a T>,
}

impl<'a, T> RefinedView<'a, T> {
    pub fn items(&self) -> &[&'a T] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The page this view was cut from.
    pub fn source(&self) -> &'a Page<T> {
        self.page
    }
}

/// Free-text matching. `needle` is already trimmed and lowercased.
pub trait Searchable {
    fn matches(&self, needle: &str) -> bool;
}

impl Searchable for Doctor {
    fn matches(&self, needle: &str) -> bool {
        self.full_name.to_lowercase().contains(needle) || self.specialty.to_lowercase().contains(needle)
    }
}

impl Searchable for PeriodSummary {
    fn matches(&self, needle: &str) -> bool {
        self.shifts.iter().any(|s| {
            s.shift.shift_type.to_lowercase().contains(needle) || s.doctors.iter().any(|d| d.matches(needle))
        })
    }
}

impl Searchable for DoctorScheduleEntry {
    fn matches(&self, needle: &str) -> bool {
        self.doctor.matches(needle) || self.shift.shift_type.to_lowercase().contains(needle)
    }
}
