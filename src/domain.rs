use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s-]+").expect("literal slug pattern"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("literal slug pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub videos: Vec<VideoItem>,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub videos: Vec<VideoItem>,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoResource {
    pub id: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<String>,
    pub date: Option<String>,
}

impl VideoResource {
    pub fn project(item: &VideoItem, category: &str, subcategory: Option<&str>) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            url: item.url.clone(),
            description: item.description.clone(),
            tags: item.tags.clone(),
            category: category.to_string(),
            subcategory: subcategory.map(|name| name.to_string()),
            thumbnail: None,
            duration: None,
            date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

impl Category {
    pub fn resource_count(&self) -> usize {
        self.videos.len()
            + self
                .subcategories
                .iter()
                .map(Subcategory::resource_count)
                .sum::<usize>()
    }

    pub fn find_subcategory(&self, slug: &str) -> Option<&Subcategory> {
        self.subcategories.iter().find(|sub| sub.slug == slug)
    }
}

impl Subcategory {
    pub fn resource_count(&self) -> usize {
        self.videos.len()
            + self
                .subcategories
                .iter()
                .map(Subcategory::resource_count)
                .sum::<usize>()
    }

    pub fn find_subcategory(&self, slug: &str) -> Option<&Subcategory> {
        self.subcategories.iter().find(|sub| sub.slug == slug)
    }
}

pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let cleaned = DISALLOWED.replace_all(&lowered, "");
    SEPARATORS
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string()
}

#[derive(Debug, Default)]
pub struct SlugRegistry {
    seen: HashSet<String>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, base: String) -> String {
        if self.seen.insert(base.clone()) {
            return base;
        }
        let mut suffix = 2usize;
        loop {
            let candidate = format!("{base}-{suffix}");
            if self.seen.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}
