use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub articles_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

/// Derives a URL slug from a category name: lowercase, keep Latin/Cyrillic
/// letters, digits and whitespace, turn whitespace runs into single hyphens,
/// no leading or trailing hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.to_lowercase().chars() {
        let keep = ch.is_ascii_alphanumeric() || ('а'..='я').contains(&ch) || ch == 'ё';
        if keep {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' {
            pending_hyphen = true;
        }
        // anything else is dropped without breaking the word
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Web Development"), "web-development");
    }

    #[test]
    fn keeps_cyrillic_letters() {
        assert_eq!(slugify("Новости Москвы"), "новости-москвы");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(slugify("C++ & Rust!"), "c-rust");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(slugify("  too   many\tspaces  "), "too-many-spaces");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(slugify("Top 10"), "top-10");
    }
}
