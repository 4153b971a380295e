use std::collections::HashSet;

use crate::error::CoreError;

/// Identifies a category within a puzzle. Categories are referenced by id
/// everywhere else in the crate, never by index or pointer, so that clues
/// stay plain data and a `CategorySet` can be cloned freely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(pub String);

impl From<&str> for CategoryId {
    fn from(s: &str) -> Self {
        CategoryId(s.to_string())
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Nominal,
    Ordinal,
}

/// A single value within a category. Ordinal categories carry an explicit
/// numeric `rank` distinct from their position in `Category::values` -- two
/// ordinal categories may use non-contiguous ranks (e.g. gold medal counts
/// `{10, 20, 30}`).
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryValue {
    pub label: String,
    pub rank: Option<i64>,
}

impl CategoryValue {
    pub fn nominal(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            rank: None,
        }
    }

    pub fn ordinal(label: impl Into<String>, rank: i64) -> Self {
        Self {
            label: label.into(),
            rank: Some(rank),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub kind: CategoryKind,
    pub values: Vec<CategoryValue>,
}

impl Category {
    pub fn arity(&self) -> usize {
        self.values.len()
    }

    pub fn value_index(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v.label == value)
    }

    /// Position of `value` in this category's ordinal order (0-based). Only
    /// meaningful for `CategoryKind::Ordinal`; ranks are sorted ascending.
    pub fn rank_of(&self, value_index: usize) -> Option<i64> {
        self.values.get(value_index).and_then(|v| v.rank)
    }

    /// Index of the value holding a given zero-based position in ordinal
    /// order (the inverse of `rank_order`).
    pub fn ordinal_order(&self) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..self.values.len()).collect();
        idx.sort_by_key(|&i| self.values[i].rank.unwrap_or(i as i64));
        idx
    }
}

/// Validated, normalised collection of categories sharing a common arity.
/// Immutable once constructed -- a `GenerativeSession` holds one for its
/// entire lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySet {
    categories: Vec<Category>,
    arity: usize,
}

impl CategorySet {
    pub fn validate(categories: Vec<Category>) -> Result<Self, CoreError> {
        if categories.len() < 2 {
            return Err(CoreError::TooFewCategories(categories.len()));
        }

        let mut seen_ids = HashSet::new();
        for cat in &categories {
            if !seen_ids.insert(cat.id.clone()) {
                return Err(CoreError::DuplicateCategoryId(cat.id.clone()));
            }

            let mut seen_values = HashSet::new();
            for value in &cat.values {
                if !seen_values.insert(value.label.clone()) {
                    return Err(CoreError::DuplicateValue {
                        category: cat.id.clone(),
                        value: value.label.clone(),
                    });
                }
            }

            if cat.kind == CategoryKind::Ordinal {
                let mut ranks = HashSet::new();
                for value in &cat.values {
                    match value.rank {
                        Some(r) if ranks.insert(r) => {}
                        _ => return Err(CoreError::InvalidOrdinalRanks(cat.id.clone())),
                    }
                }
            }
        }

        let arity = categories[0].arity();
        for cat in &categories[1..] {
            if cat.arity() != arity {
                return Err(CoreError::ArityMismatch {
                    first: categories[0].id.clone(),
                    first_arity: arity,
                    second: cat.id.clone(),
                    second_arity: cat.arity(),
                });
            }
        }

        Ok(Self { categories, arity })
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, id: &CategoryId) -> Result<&Category, CoreError> {
        self.categories
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| CoreError::UnknownCategory(id.clone()))
    }

    pub fn index_of(&self, id: &CategoryId) -> Result<usize, CoreError> {
        self.categories
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| CoreError::UnknownCategory(id.clone()))
    }

    pub fn value_index(&self, category: &CategoryId, value: &str) -> Result<usize, CoreError> {
        let cat = self.get(category)?;
        cat.value_index(value)
            .ok_or_else(|| CoreError::UnknownValue {
                category: category.clone(),
                value: value.to_string(),
            })
    }

    pub fn ordinal_categories(&self) -> impl Iterator<Item = &Category> {
        self.categories
            .iter()
            .filter(|c| c.kind == CategoryKind::Ordinal)
    }

    /// True iff some ordinal category has both odd- and even-ranked values,
    /// required for `ClueType::Unary` to be constructible (spec §4.5).
    pub fn has_mixed_parity_ordinal(&self) -> bool {
        self.ordinal_categories().any(|c| {
            let mut seen_even = false;
            let mut seen_odd = false;
            for v in &c.values {
                if let Some(r) = v.rank {
                    if r.rem_euclid(2) == 0 {
                        seen_even = true;
                    } else {
                        seen_odd = true;
                    }
                }
            }
            seen_even && seen_odd
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: &str, kind: CategoryKind, values: &[&str]) -> Category {
        Category {
            id: CategoryId::from(id),
            kind,
            values: values.iter().map(|v| CategoryValue::nominal(*v)).collect(),
        }
    }

    #[test]
    fn rejects_single_category() {
        let cats = vec![cat("A", CategoryKind::Nominal, &["a1", "a2"])];
        assert!(matches!(
            CategorySet::validate(cats),
            Err(CoreError::TooFewCategories(1))
        ));
    }

    #[test]
    fn rejects_arity_mismatch() {
        let cats = vec![
            cat("A", CategoryKind::Nominal, &["a1", "a2"]),
            cat("B", CategoryKind::Nominal, &["b1", "b2", "b3"]),
        ];
        assert!(matches!(
            CategorySet::validate(cats),
            Err(CoreError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_category_id() {
        let cats = vec![
            cat("A", CategoryKind::Nominal, &["a1", "a2"]),
            cat("A", CategoryKind::Nominal, &["b1", "b2"]),
        ];
        assert!(matches!(
            CategorySet::validate(cats),
            Err(CoreError::DuplicateCategoryId(_))
        ));
    }

    #[test]
    fn rejects_ordinal_without_ranks() {
        let cats = vec![
            cat("A", CategoryKind::Nominal, &["a1", "a2"]),
            cat("B", CategoryKind::Ordinal, &["b1", "b2"]),
        ];
        assert!(matches!(
            CategorySet::validate(cats),
            Err(CoreError::InvalidOrdinalRanks(_))
        ));
    }

    #[test]
    fn accepts_valid_ordinal() {
        let mut gold = cat("Gold", CategoryKind::Ordinal, &[]);
        gold.values = vec![
            CategoryValue::ordinal("10", 10),
            CategoryValue::ordinal("20", 20),
            CategoryValue::ordinal("30", 30),
        ];
        let cats = vec![cat("Person", CategoryKind::Nominal, &["A", "B", "C"]), gold];
        let set = CategorySet::validate(cats).unwrap();
        assert_eq!(set.arity(), 3);
        assert!(set.has_mixed_parity_ordinal());
    }
}
