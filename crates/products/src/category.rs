use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainError, DomainResult, Entity};

/// Storefront group a category is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryGroup {
    #[default]
    Men,
    Women,
    Sports,
    Kids,
    Accessories,
}

impl CategoryGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryGroup::Men => "men",
            CategoryGroup::Women => "women",
            CategoryGroup::Sports => "sports",
            CategoryGroup::Kids => "kids",
            CategoryGroup::Accessories => "accessories",
        }
    }
}

impl core::fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for CategoryGroup {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "men" => Ok(CategoryGroup::Men),
            "women" => Ok(CategoryGroup::Women),
            "sports" => Ok(CategoryGroup::Sports),
            "kids" => Ok(CategoryGroup::Kids),
            "accessories" => Ok(CategoryGroup::Accessories),
            other => Err(DomainError::validation(format!(
                "unknown category group '{other}' (expected one of: men, women, sports, kids, accessories)"
            ))),
        }
    }
}

/// Product category. Names are unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub group: CategoryGroup,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied category fields (create and full update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub group: CategoryGroup,
}

impl Category {
    pub fn create(id: CategoryId, draft: CategoryDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = validate_name(&draft.name)?;
        Ok(Self {
            id,
            name,
            group: draft.group,
            created_at: now,
        })
    }

    pub fn revise(&mut self, draft: CategoryDraft) -> DomainResult<()> {
        self.name = validate_name(&draft.name)?;
        self.group = draft.group;
        Ok(())
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("category name cannot be empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_trims_name_and_keeps_group() {
        let draft = CategoryDraft {
            name: "  Jackets ".to_string(),
            group: CategoryGroup::Women,
        };
        let category = Category::create(CategoryId::new(), draft, Utc::now()).unwrap();
        assert_eq!(category.name, "Jackets");
        assert_eq!(category.group, CategoryGroup::Women);
    }

    #[test]
    fn empty_name_is_rejected() {
        let draft = CategoryDraft {
            name: "   ".to_string(),
            group: CategoryGroup::default(),
        };
        let err = Category::create(CategoryId::new(), draft, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn group_parses_case_insensitively() {
        assert_eq!("Kids".parse::<CategoryGroup>().unwrap(), CategoryGroup::Kids);
        assert!("shoes".parse::<CategoryGroup>().is_err());
    }

    #[test]
    fn group_defaults_to_men_when_omitted() {
        let draft: CategoryDraft = serde_json::from_str(r#"{"name":"Shirts"}"#).unwrap();
        assert_eq!(draft.group, CategoryGroup::Men);
    }
}
