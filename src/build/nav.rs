//! Section navigation: grouping and ordering.
//!
//! Every section gets a frozen [`SectionNav`] before any of its pages is
//! rendered. Listing pages render from it directly; detail pages embed it as
//! the sidebar.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::MissingDatePolicy;

use super::document::{ContentCategory, ContentItem};

/// Bucket key for chronological items without a usable date.
pub const UNDATED: &str = "Undated";

/// One key of a [`Grouping`] and its items, in encounter order.
#[derive(Debug, Clone, Serialize)]
pub struct GroupEntry {
    pub key: String,
    pub items: Vec<ContentItem>,
}

/// An insertion-ordered mapping from key to items.
///
/// Serialized as a list of `{key, items}` so templates iterate keys in the
/// order they were first encountered, not alphabetically.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Grouping {
    entries: Vec<GroupEntry>,
}

impl Grouping {
    fn push(&mut self, index: &mut HashMap<String, usize>, key: String, item: ContentItem) {
        match index.get(&key) {
            Some(&pos) => self.entries[pos].items.push(item),
            None => {
                index.insert(key.clone(), self.entries.len());
                self.entries.push(GroupEntry {
                    key,
                    items: vec![item],
                });
            }
        }
    }

    /// Build from items, keyed by `key_fn`.
    fn collect<'a>(
        items: impl IntoIterator<Item = &'a ContentItem>,
        key_fn: impl Fn(&ContentItem) -> String,
    ) -> Self {
        let mut grouping = Self::default();
        let mut index = HashMap::new();
        for item in items {
            grouping.push(&mut index, key_fn(item), item.clone());
        }
        grouping
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
impl Grouping {
    pub fn entries(&self) -> &[GroupEntry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&[ContentItem]> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.items.as_slice())
    }
}

/// Group items by their `group` field.
pub fn group_by_field(items: &[ContentItem]) -> Grouping {
    Grouping::collect(items, |item| item.group.clone())
}

/// Bucket items by calendar month, e.g. "March 2024".
///
/// Buckets appear in the order their first member appears, so a date-sorted
/// input gives date-sorted buckets.
pub fn bucket_by_month(items: &[ContentItem]) -> Grouping {
    Grouping::collect(items, |item| match item.date {
        Some(date) => date.format("%B %Y").to_string(),
        None => UNDATED.to_string(),
    })
}

/// Stable ascending sort by `order`; documents without one count as `0`.
pub fn sort_by_order(items: &mut [ContentItem]) {
    items.sort_by(|a, b| a.order.unwrap_or(0.0).total_cmp(&b.order.unwrap_or(0.0)));
}

/// Stable newest-first sort. Undated documents take the date the policy assigns.
pub fn sort_by_date_desc(items: &mut [ContentItem], policy: MissingDatePolicy) {
    items.sort_by_key(|item| std::cmp::Reverse(sort_date(item, policy)));
}

fn sort_date(item: &ContentItem, policy: MissingDatePolicy) -> NaiveDate {
    item.date.unwrap_or(match policy {
        MissingDatePolicy::Earliest => NaiveDate::MIN,
        MissingDatePolicy::Latest => NaiveDate::MAX,
    })
}

/// Grouped and ordered view of one section.
#[derive(Debug, Clone, Serialize)]
pub struct SectionNav {
    pub category: ContentCategory,
    /// Section items in listing order
    pub items: Vec<ContentItem>,
    /// Items keyed by `group`
    pub groups: Grouping,
    /// Items keyed by month; only for the chronological section
    pub by_month: Option<Grouping>,
}

impl SectionNav {
    /// Group and order a section's items (in discovery order).
    ///
    /// Manual sections are sorted by `order` before grouping. The
    /// chronological section is grouped in discovery order, then sorted
    /// newest-first and bucketed by month.
    pub fn build(
        category: ContentCategory,
        mut items: Vec<ContentItem>,
        policy: MissingDatePolicy,
    ) -> Self {
        if !category.is_chronological() {
            sort_by_order(&mut items);
            let groups = group_by_field(&items);
            return Self {
                category,
                items,
                groups,
                by_month: None,
            };
        }

        let groups = group_by_field(&items);
        for item in &items {
            if let Some(raw) = &item.unparsed_date {
                tracing::warn!(
                    path = %item.source_path.display(),
                    date = %raw,
                    ?policy,
                    "unparsable date, sorting with the missing-date policy"
                );
            }
        }
        sort_by_date_desc(&mut items, policy);
        let by_month = bucket_by_month(&items);

        Self {
            category,
            items,
            groups,
            by_month: Some(by_month),
        }
    }

    /// Insert this section's navigation data into a template context.
    pub fn insert_into(&self, context: &mut tera::Context) {
        context.insert(self.category.items_key(), &self.items);
        context.insert(self.category.groups_key(), &self.groups);
        if let (Some(key), Some(by_month)) = (self.category.buckets_key(), &self.by_month) {
            context.insert(key, by_month);
        }
    }
}
