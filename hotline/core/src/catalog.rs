//! Catalog Filters
//!
//! List-screen helpers: article category chips and directory search.

use crate::api::{Article, Business};

/// Distinct non-empty article categories, in first-seen order
#[must_use]
pub fn article_categories(articles: &[Article]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for category in articles.iter().filter_map(|a| a.category.as_deref()) {
        if !category.is_empty() && !categories.iter().any(|c| c == category) {
            categories.push(category.to_string());
        }
    }
    categories
}

/// Single-select category filter
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    selected: Option<String>,
}

impl CategoryFilter {
    /// Filter with nothing selected
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected category
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Select a category; selecting the selected one clears the filter
    pub fn toggle(&mut self, category: &str) {
        if self.selected.as_deref() == Some(category) {
            self.selected = None;
        } else {
            self.selected = Some(category.to_string());
        }
    }

    /// Clear the selection
    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Articles matching the selection (all of them when nothing is selected)
    #[must_use]
    pub fn apply<'a>(&self, articles: &'a [Article]) -> Vec<&'a Article> {
        match self.selected.as_deref() {
            None => articles.iter().collect(),
            Some(selected) => articles
                .iter()
                .filter(|a| a.category.as_deref() == Some(selected))
                .collect(),
        }
    }
}

/// Case-insensitive substring search on business name or summary
#[must_use]
pub fn search_businesses<'a>(businesses: &'a [Business], query: &str) -> Vec<&'a Business> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return businesses.iter().collect();
    }
    businesses
        .iter()
        .filter(|b| {
            b.name.to_lowercase().contains(&needle) || b.summary.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: u64, category: Option<&str>) -> Article {
        Article {
            id,
            title: format!("Article {id}"),
            summary: String::new(),
            content: String::new(),
            author: "Hal".to_string(),
            image_url: None,
            created_at: "2026-01-01".to_string(),
            category: category.map(str::to_string),
        }
    }

    fn business(name: &str, summary: &str) -> Business {
        Business {
            id: name.to_lowercase(),
            name: name.to_string(),
            category: "Food".to_string(),
            address: String::new(),
            phone: String::new(),
            website: String::new(),
            summary: summary.to_string(),
            description: String::new(),
            image_url: None,
        }
    }

    #[test]
    fn test_categories_distinct_in_order() {
        let articles = vec![
            article(1, Some("News")),
            article(2, None),
            article(3, Some("Sports")),
            article(4, Some("")),
            article(5, Some("News")),
        ];
        assert_eq!(article_categories(&articles), vec!["News", "Sports"]);
    }

    #[test]
    fn test_toggle_same_category_clears() {
        let articles = vec![article(1, Some("News")), article(2, Some("Sports"))];
        let mut filter = CategoryFilter::new();

        filter.toggle("News");
        let shown: Vec<u64> = filter.apply(&articles).iter().map(|a| a.id).collect();
        assert_eq!(shown, vec![1]);

        filter.toggle("News");
        assert_eq!(filter.selected(), None);
        assert_eq!(filter.apply(&articles).len(), 2);
    }

    #[test]
    fn test_toggle_other_category_switches() {
        let mut filter = CategoryFilter::new();
        filter.toggle("News");
        filter.toggle("Sports");
        assert_eq!(filter.selected(), Some("Sports"));
    }

    #[test]
    fn test_search_name_or_summary() {
        let businesses = vec![
            business("Hal's Bakery", "Fresh bread daily"),
            business("Main St Hardware", "Tools and BREAD knives"),
            business("Riverside Cafe", "Coffee"),
        ];

        let hits: Vec<&str> = search_businesses(&businesses, "bread")
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(hits, vec!["Hal's Bakery", "Main St Hardware"]);

        assert_eq!(search_businesses(&businesses, "CAFE").len(), 1);
        assert_eq!(search_businesses(&businesses, "").len(), 3);
        assert!(search_businesses(&businesses, "pharmacy").is_empty());
    }
}
