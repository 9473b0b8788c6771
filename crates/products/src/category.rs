use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, DomainError, DomainResult, Entity};

/// A catalog category ("Streaming Services", "AI Tools", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl Category {
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        description: Option<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let slug = slug.into();

        if name.trim().is_empty() {
            return Err(DomainError::field("name", "This field may not be blank."));
        }
        crate::product::validate_slug(&slug)?;

        Ok(Self {
            id: CategoryId::new(),
            name,
            slug,
            description,
        })
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_rejected() {
        let err = Category::new("  ", "streaming", None).unwrap_err();
        assert!(matches!(err, DomainError::InvalidField { ref field, .. } if field == "name"));
    }

    #[test]
    fn valid_category_gets_fresh_id() {
        let a = Category::new("AI Tools", "ai-tools", None).unwrap();
        let b = Category::new("AI Tools", "ai-tools", None).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.slug, "ai-tools");
    }
}
