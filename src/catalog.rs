use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::domain::{Category, Subcategory, TagCount, VideoItem, VideoResource};
use crate::error::CatalogError;
use crate::fetcher::{ContentsClient, RemoteFetcher};
use crate::normalize::{NormalizeOptions, try_normalize_with};
use crate::search::{self, SearchQuery};

pub struct Catalog<C: ContentsClient> {
    fetcher: RemoteFetcher<C>,
    cache: CacheStore,
    options: NormalizeOptions,
}

impl<C: ContentsClient> Catalog<C> {
    pub fn new(fetcher: RemoteFetcher<C>, cache: CacheStore) -> Self {
        Self {
            fetcher,
            cache,
            options: NormalizeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let lookup = self.cache.get();
        if let (Some(data), true) = (lookup.data, lookup.is_fresh) {
            debug!(categories = data.len(), "serving cached categories");
            return Ok(data);
        }
        self.refresh()
    }

    pub fn refresh(&self) -> Result<Vec<Category>, CatalogError> {
        let fetched = self.fetcher.fetch()?;
        let categories = try_normalize_with(&fetched.document, &self.options)?;
        if categories.is_empty() {
            warn!(origin = %fetched.origin, "contents normalized to an empty catalog");
            return Err(CatalogError::EmptyCatalog);
        }
        info!(
            origin = %fetched.origin,
            categories = categories.len(),
            "updating cache"
        );
        self.cache.set(categories.clone());
        Ok(categories)
    }

    pub fn get_category(&self, slug: &str) -> Result<Option<Category>, CatalogError> {
        let categories = self.list_categories()?;
        Ok(find_category(&categories, slug).cloned())
    }

    pub fn list_resources(
        &self,
        category_slug: &str,
        subcategory_path: Option<&str>,
    ) -> Result<Vec<VideoResource>, CatalogError> {
        let categories = self.list_categories()?;
        Ok(resources_in(&categories, category_slug, subcategory_path))
    }

    pub fn search(&self, query: &str) -> Result<Vec<VideoResource>, CatalogError> {
        let query = SearchQuery::parse(query);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let categories = self.list_categories()?;
        Ok(search_in(&categories, &query))
    }

    pub fn get_all_tags(&self) -> Result<Vec<TagCount>, CatalogError> {
        let categories = self.list_categories()?;
        Ok(search::tag_counts(&all_resources(&categories)))
    }

    pub fn get_videos_by_tag(&self, tag: &str) -> Result<Vec<VideoResource>, CatalogError> {
        let categories = self.list_categories()?;
        Ok(tagged_in(&categories, tag))
    }
}

pub fn find_category<'a>(categories: &'a [Category], slug: &str) -> Option<&'a Category> {
    categories.iter().find(|category| category.slug == slug)
}

pub fn resources_in(
    categories: &[Category],
    category_slug: &str,
    subcategory_path: Option<&str>,
) -> Vec<VideoResource> {
    let Some(category) = find_category(categories, category_slug) else {
        debug!(slug = category_slug, "no such category");
        return Vec::new();
    };

    let segments = subcategory_path
        .unwrap_or_default()
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();
    let Some((first, rest)) = segments.split_first() else {
        return category_resources(category);
    };

    let mut node = category.find_subcategory(first);
    for segment in rest {
        node = node.and_then(|sub| sub.find_subcategory(segment));
    }
    match node {
        Some(target) => project(&target.videos, &category.name, Some(target.name.as_str())),
        None => {
            debug!(
                slug = category_slug,
                path = %segments.join("/"),
                "subcategory path does not resolve"
            );
            Vec::new()
        }
    }
}

pub fn search_in(categories: &[Category], query: &SearchQuery) -> Vec<VideoResource> {
    search::filter(query, all_resources(categories))
}

pub fn tagged_in(categories: &[Category], tag: &str) -> Vec<VideoResource> {
    all_resources(categories)
        .into_iter()
        .filter(|resource| search::has_tag(resource, tag))
        .collect()
}

pub fn all_resources(categories: &[Category]) -> Vec<VideoResource> {
    categories.iter().flat_map(category_resources).collect()
}

pub fn category_resources(category: &Category) -> Vec<VideoResource> {
    let mut resources = project(&category.videos, &category.name, None);
    for sub in &category.subcategories {
        collect_subcategory(sub, &category.name, &mut resources);
    }
    resources
}

fn collect_subcategory(sub: &Subcategory, category: &str, out: &mut Vec<VideoResource>) {
    out.extend(project(&sub.videos, category, Some(sub.name.as_str())));
    for nested in &sub.subcategories {
        collect_subcategory(nested, category, out);
    }
}

fn project(items: &[VideoItem], category: &str, subcategory: Option<&str>) -> Vec<VideoResource> {
    items
        .iter()
        .map(|item| VideoResource::project(item, category, subcategory))
        .collect()
}
