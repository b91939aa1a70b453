use std::collections::BTreeMap;

use crate::domain::{TagCount, VideoResource};

const TAG_PREFIX: &str = "tag:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Empty,
    Text { lowered: String, compact: String },
    Tag(String),
}

impl SearchQuery {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if let Some(tag) = tag_scope(trimmed) {
            let tag = normalize_tag(tag);
            return if tag.is_empty() {
                SearchQuery::Empty
            } else {
                SearchQuery::Tag(tag)
            };
        }
        if trimmed.is_empty() {
            return SearchQuery::Empty;
        }
        let lowered = trimmed.to_lowercase();
        SearchQuery::Text {
            compact: compact(&lowered),
            lowered,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SearchQuery::Empty)
    }

    pub fn matches(&self, resource: &VideoResource) -> bool {
        match self {
            SearchQuery::Empty => false,
            SearchQuery::Tag(tag) => resource
                .tags
                .iter()
                .any(|candidate| normalize_tag(candidate).contains(tag.as_str())),
            SearchQuery::Text { lowered, compact: wanted } => {
                let haystack = format!(
                    "{} {} {}",
                    resource.title,
                    resource.description,
                    resource.tags.join(" ")
                )
                .to_lowercase();
                haystack.contains(lowered.as_str())
                    || (!wanted.is_empty() && compact(&haystack).contains(wanted.as_str()))
            }
        }
    }
}

fn tag_scope(input: &str) -> Option<&str> {
    if let Some(rest) = input.strip_prefix('#') {
        return Some(rest);
    }
    let head = input.get(..TAG_PREFIX.len())?;
    head.eq_ignore_ascii_case(TAG_PREFIX)
        .then(|| &input[TAG_PREFIX.len()..])
}

pub fn compact(text: &str) -> String {
    text.chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-' && *ch != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn normalize_tag(tag: &str) -> String {
    tag.chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn filter(query: &SearchQuery, resources: Vec<VideoResource>) -> Vec<VideoResource> {
    if query.is_empty() {
        return Vec::new();
    }
    resources
        .into_iter()
        .filter(|resource| query.matches(resource))
        .collect()
}

pub fn has_tag(resource: &VideoResource, tag: &str) -> bool {
    let wanted = normalize_tag(tag);
    !wanted.is_empty()
        && resource
            .tags
            .iter()
            .any(|candidate| normalize_tag(candidate) == wanted)
}

pub fn tag_counts(resources: &[VideoResource]) -> Vec<TagCount> {
    let mut counts = BTreeMap::<String, TagCount>::new();
    for tag in resources.iter().flat_map(|resource| resource.tags.iter()) {
        let key = tag.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        counts
            .entry(key)
            .or_insert_with(|| TagCount {
                tag: tag.trim().to_string(),
                count: 0,
            })
            .count += 1;
    }
    let mut tags = counts.into_values().collect::<Vec<_>>();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    tags
}
