use std::cell::RefCell;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::{Category, SlugRegistry, Subcategory, VideoItem, slugify};
use crate::error::CatalogError;
use crate::raw::{FlatContents, RawCategory, RawItem, SchemaVariant, TreeContents, probe};

pub const PLACEHOLDER_IMAGES: [&str; 6] = [
    "/images/category-0.jpg",
    "/images/category-1.jpg",
    "/images/category-2.jpg",
    "/images/category-3.jpg",
    "/images/category-4.jpg",
    "/images/category-5.jpg",
];

const MAX_DEPTH: usize = 8;
const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanPolicy {
    #[default]
    FirstCategory,
    Uncategorized,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    pub orphans: OrphanPolicy,
}

pub fn normalize(doc: &Value) -> Vec<Category> {
    normalize_with(doc, &NormalizeOptions::default())
}

pub fn normalize_with(doc: &Value, options: &NormalizeOptions) -> Vec<Category> {
    try_normalize_with(doc, options).unwrap_or_else(|err| {
        debug!("normalize: {err}");
        Vec::new()
    })
}

pub fn try_normalize_with(
    doc: &Value,
    options: &NormalizeOptions,
) -> Result<Vec<Category>, CatalogError> {
    let variant = probe(doc)?;
    let categories = match variant {
        SchemaVariant::Flat(contents) => FlatResolver::new(contents, options).resolve(),
        SchemaVariant::Tree(contents) => resolve_tree(contents),
    };
    debug!(
        schema = variant.name(),
        categories = categories.len(),
        resources = categories.iter().map(Category::resource_count).sum::<usize>(),
        "normalized contents"
    );
    Ok(categories)
}

struct FlatResolver<'a> {
    contents: FlatContents<'a>,
    options: &'a NormalizeOptions,
    claimed: RefCell<Vec<bool>>,
}

impl<'a> FlatResolver<'a> {
    fn new(contents: FlatContents<'a>, options: &'a NormalizeOptions) -> Self {
        Self {
            claimed: RefCell::new(vec![false; contents.items.len()]),
            contents,
            options,
        }
    }

    fn resolve(&self) -> Vec<Category> {
        let mut slugs = SlugRegistry::new();
        let attach_orphans = self.options.orphans == OrphanPolicy::FirstCategory;
        let mut categories = self
            .contents
            .categories
            .iter()
            .map(RawCategory::new)
            .filter(|raw| raw.parent().is_none())
            .enumerate()
            .map(|(index, raw)| {
                let label = raw.label().unwrap_or_else(|| placeholder("Category", index));
                let prefix = index.to_string();
                let raw_id = raw.id();
                let mut items =
                    self.matching_items(raw_id.as_deref(), &label, attach_orphans && index == 0);
                items.extend(raw.items().iter().map(RawItem::new));
                let id = raw_id
                    .clone()
                    .unwrap_or_else(|| format!("cat-{index}"));
                let mut ancestors = raw_id.iter().cloned().collect::<Vec<_>>();
                let mut subcategories =
                    self.children(raw_id.as_deref(), &id, &prefix, &mut ancestors);
                if subcategories.is_empty() {
                    subcategories = tree_children(raw, &id, &prefix);
                }
                Category {
                    slug: slugs.claim(slug_for(&label, "Category", index)),
                    description: describe(raw.description(), &label),
                    image_url: placeholder_image(index),
                    videos: to_videos(&prefix, &items),
                    subcategories,
                    name: label,
                    id,
                }
            })
            .collect::<Vec<_>>();

        self.log_unreachable();

        if self.options.orphans == OrphanPolicy::Uncategorized {
            let orphans = self.unclaimed();
            if !orphans.is_empty() {
                let index = categories.len();
                let label = UNCATEGORIZED.to_string();
                categories.push(Category {
                    id: "uncategorized".to_string(),
                    slug: slugs.claim(slugify(&label)),
                    description: "Resources that do not name a known category".to_string(),
                    image_url: placeholder_image(index),
                    videos: to_videos(&index.to_string(), &orphans),
                    subcategories: Vec::new(),
                    name: label,
                });
            }
        }

        categories
    }

    fn children(
        &self,
        parent_id: Option<&str>,
        owner_id: &str,
        prefix: &str,
        ancestors: &mut Vec<String>,
    ) -> Vec<Subcategory> {
        let Some(parent_id) = parent_id else {
            return Vec::new();
        };
        if ancestors.len() > MAX_DEPTH {
            debug!(parent = parent_id, "subcategory nesting cut at depth limit");
            return Vec::new();
        }

        let candidates = self
            .contents
            .categories
            .iter()
            .map(RawCategory::new)
            .filter(|raw| raw.parent().as_deref() == Some(parent_id))
            .filter(|raw| raw.id().is_none_or(|id| !ancestors.contains(&id)))
            .collect::<Vec<_>>();

        let mut slugs = SlugRegistry::new();
        let mut subcategories = Vec::with_capacity(candidates.len());
        for (index, raw) in candidates.into_iter().enumerate() {
            let label = raw.label().unwrap_or_else(|| placeholder("Subcategory", index));
            let prefix = format!("{prefix}-{index}");
            let raw_id = raw.id();
            let id = raw_id
                .clone()
                .unwrap_or_else(|| format!("{owner_id}-sub-{index}"));
            let mut items = self.matching_items(raw_id.as_deref(), &label, false);
            items.extend(raw.items().iter().map(RawItem::new));

            let mut nested = match &raw_id {
                Some(raw_id) => {
                    ancestors.push(raw_id.clone());
                    let nested = self.children(Some(raw_id.as_str()), &id, &prefix, ancestors);
                    ancestors.pop();
                    nested
                }
                None => Vec::new(),
            };
            if nested.is_empty() {
                nested = tree_children(raw, &id, &prefix);
            }

            subcategories.push(Subcategory {
                slug: slugs.claim(slug_for(&label, "Subcategory", index)),
                description: describe(raw.description(), &label),
                videos: to_videos(&prefix, &items),
                subcategories: nested,
                name: label,
                id,
            });
        }
        subcategories
    }

    fn matching_items(
        &self,
        id: Option<&str>,
        label: &str,
        include_orphans: bool,
    ) -> Vec<RawItem<'a>> {
        let label = label.to_lowercase();
        let mut claimed = self.claimed.borrow_mut();
        self.contents
            .items
            .iter()
            .enumerate()
            .filter_map(|(index, value)| {
                let item = RawItem::new(value);
                let refs = item.category_refs();
                let matched = if refs.is_empty() {
                    include_orphans
                } else {
                    refs.iter().any(|reference| {
                        Some(reference.as_str()) == id || reference.to_lowercase() == label
                    })
                };
                if matched {
                    claimed[index] = true;
                }
                matched.then_some(item)
            })
            .collect()
    }

    // Items no category claimed: orphans, plus references to unknown ids or labels.
    fn unclaimed(&self) -> Vec<RawItem<'a>> {
        let claimed = self.claimed.borrow();
        self.contents
            .items
            .iter()
            .zip(claimed.iter())
            .filter(|(_, claimed)| !**claimed)
            .map(|(value, _)| RawItem::new(value))
            .collect()
    }

    fn log_unreachable(&self) {
        let known = self
            .contents
            .categories
            .iter()
            .filter_map(|entry| RawCategory::new(entry).id())
            .collect::<Vec<_>>();
        let dangling = self
            .contents
            .categories
            .iter()
            .map(RawCategory::new)
            .filter(|raw| raw.parent().is_some_and(|parent| !known.contains(&parent)))
            .count();
        if dangling > 0 {
            debug!(dangling, "dropped categories whose parent is unknown");
        }
        let unmatched = self
            .unclaimed()
            .iter()
            .filter(|item| !item.is_orphan())
            .count();
        if unmatched > 0 {
            debug!(
                unmatched,
                kept = self.options.orphans == OrphanPolicy::Uncategorized,
                "resources reference no known category"
            );
        }
    }
}

fn resolve_tree(contents: TreeContents<'_>) -> Vec<Category> {
    let mut slugs = SlugRegistry::new();
    contents
        .categories
        .iter()
        .map(RawCategory::new)
        .enumerate()
        .map(|(index, raw)| {
            let label = raw.label().unwrap_or_else(|| placeholder("Category", index));
            let prefix = index.to_string();
            let id = raw.id().unwrap_or_else(|| format!("cat-{index}"));
            let items = raw.items().iter().map(RawItem::new).collect::<Vec<_>>();
            Category {
                slug: slugs.claim(slug_for(&label, "Category", index)),
                description: describe(raw.description(), &label),
                image_url: placeholder_image(index),
                videos: to_videos(&prefix, &items),
                subcategories: tree_children(raw, &id, &prefix),
                name: label,
                id,
            }
        })
        .collect()
}

fn tree_children(parent: RawCategory<'_>, owner_id: &str, prefix: &str) -> Vec<Subcategory> {
    let mut slugs = SlugRegistry::new();
    parent
        .subcategories()
        .iter()
        .map(RawCategory::new)
        .enumerate()
        .map(|(index, raw)| {
            let label = raw.label().unwrap_or_else(|| placeholder("Subcategory", index));
            let prefix = format!("{prefix}-{index}");
            let id = raw.id().unwrap_or_else(|| format!("{owner_id}-sub-{index}"));
            let items = raw.items().iter().map(RawItem::new).collect::<Vec<_>>();
            Subcategory {
                slug: slugs.claim(slug_for(&label, "Subcategory", index)),
                description: describe(raw.description(), &label),
                videos: to_videos(&prefix, &items),
                subcategories: tree_children(raw, &id, &prefix),
                name: label,
                id,
            }
        })
        .collect()
}

fn to_videos(prefix: &str, items: &[RawItem<'_>]) -> Vec<VideoItem> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| VideoItem {
            id: format!("{prefix}-item-{index}"),
            title: item
                .title()
                .unwrap_or_else(|| "Untitled resource".to_string()),
            url: item.url().unwrap_or_default(),
            description: item.description().unwrap_or_default(),
            tags: item.tags(),
        })
        .collect()
}

fn placeholder(kind: &str, index: usize) -> String {
    format!("{kind} {}", index + 1)
}

fn slug_for(label: &str, kind: &str, index: usize) -> String {
    let slug = slugify(label);
    if slug.is_empty() {
        slugify(&placeholder(kind, index))
    } else {
        slug
    }
}

fn describe(description: Option<String>, label: &str) -> String {
    description.unwrap_or_else(|| format!("Resources related to {label}"))
}

fn placeholder_image(index: usize) -> String {
    PLACEHOLDER_IMAGES[index % PLACEHOLDER_IMAGES.len()].to_string()
}
