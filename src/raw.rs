use serde_json::Value;

use crate::error::CatalogError;

#[derive(Debug, Clone, Copy)]
pub enum SchemaVariant<'a> {
    Flat(FlatContents<'a>),
    Tree(TreeContents<'a>),
}

#[derive(Debug, Clone, Copy)]
pub struct FlatContents<'a> {
    pub categories: &'a [Value],
    pub items: &'a [Value],
}

#[derive(Debug, Clone, Copy)]
pub struct TreeContents<'a> {
    pub categories: &'a [Value],
}

impl SchemaVariant<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaVariant::Flat(_) => "flat",
            SchemaVariant::Tree(_) => "tree",
        }
    }
}

// Flat: a top-level `projects`/`items` array or any `parent` link. Otherwise tree.
pub fn probe(doc: &Value) -> Result<SchemaVariant<'_>, CatalogError> {
    let categories = doc
        .get("categories")
        .and_then(Value::as_array)
        .ok_or(CatalogError::SchemaMismatch)?;

    let items = ["projects", "items"]
        .iter()
        .find_map(|key| doc.get(*key).and_then(Value::as_array));
    let has_parent_links = categories
        .iter()
        .any(|entry| RawCategory::new(entry).parent().is_some());

    match items {
        Some(items) => Ok(SchemaVariant::Flat(FlatContents {
            categories: categories.as_slice(),
            items: items.as_slice(),
        })),
        None if has_parent_links => Ok(SchemaVariant::Flat(FlatContents {
            categories: categories.as_slice(),
            items: &[],
        })),
        None => Ok(SchemaVariant::Tree(TreeContents {
            categories: categories.as_slice(),
        })),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RawCategory<'a> {
    value: &'a Value,
}

impl<'a> RawCategory<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    pub fn id(&self) -> Option<String> {
        text(self.value, "id")
    }

    pub fn label(&self) -> Option<String> {
        text(self.value, "title").or_else(|| text(self.value, "name"))
    }

    pub fn description(&self) -> Option<String> {
        text(self.value, "description")
    }

    pub fn parent(&self) -> Option<String> {
        text(self.value, "parent")
    }

    pub fn subcategories(&self) -> &'a [Value] {
        array(self.value, &["subcategories", "children"])
    }

    pub fn items(&self) -> &'a [Value] {
        array(self.value, &["items", "projects"])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RawItem<'a> {
    value: &'a Value,
}

impl<'a> RawItem<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    pub fn title(&self) -> Option<String> {
        text(self.value, "title").or_else(|| text(self.value, "name"))
    }

    pub fn url(&self) -> Option<String> {
        text(self.value, "url").or_else(|| text(self.value, "homepage"))
    }

    pub fn description(&self) -> Option<String> {
        text(self.value, "description")
    }

    pub fn tags(&self) -> Vec<String> {
        match self.value.get("tags") {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn category_refs(&self) -> Vec<String> {
        match self.value.get("category") {
            Some(Value::Array(values)) => values.iter().filter_map(scalar_text).collect(),
            Some(value) => scalar_text(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn is_orphan(&self) -> bool {
        self.category_refs().is_empty()
    }
}

fn text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

fn array<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn probe_requires_categories_array() {
        assert_matches!(probe(&json!({})), Err(CatalogError::SchemaMismatch));
        assert_matches!(
            probe(&json!({ "categories": null })),
            Err(CatalogError::SchemaMismatch)
        );
        assert_matches!(
            probe(&json!({ "categories": "nope" })),
            Err(CatalogError::SchemaMismatch)
        );
    }

    #[test]
    fn probe_detects_flat_layouts() {
        let with_projects = json!({ "categories": [], "projects": [] });
        assert_matches!(probe(&with_projects), Ok(SchemaVariant::Flat(_)));

        let with_parents = json!({ "categories": [{ "id": "a" }, { "id": "b", "parent": "a" }] });
        assert_matches!(probe(&with_parents), Ok(SchemaVariant::Flat(_)));
    }

    #[test]
    fn probe_defaults_to_tree() {
        let doc = json!({ "categories": [{ "name": "A", "subcategories": [] }] });
        assert_matches!(probe(&doc), Ok(SchemaVariant::Tree(_)));
    }

    #[test]
    fn category_refs_accept_strings_arrays_and_numbers() {
        let single = json!({ "category": "players" });
        assert_eq!(RawItem::new(&single).category_refs(), vec!["players"]);

        let many = json!({ "category": ["a", "", 7, null] });
        assert_eq!(RawItem::new(&many).category_refs(), vec!["a", "7"]);

        let blank = json!({ "category": "  " });
        assert!(RawItem::new(&blank).is_orphan());
    }

    #[test]
    fn accessors_tolerate_non_objects() {
        let value = json!(42);
        let category = RawCategory::new(&value);
        assert!(category.label().is_none());
        assert!(category.subcategories().is_empty());
        assert!(RawItem::new(&value).tags().is_empty());
    }
}
