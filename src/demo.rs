use tracing::warn;

use crate::domain::{Category, Subcategory, VideoItem};
use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, Default)]
pub struct DemoFallback {
    pub enabled: bool,
}

impl DemoFallback {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn apply<T>(
        &self,
        live: Result<T, CatalogError>,
        from_demo: impl FnOnce(&[Category]) -> T,
    ) -> Result<T, CatalogError> {
        match live {
            Ok(value) => Ok(value),
            Err(err) if self.enabled && recoverable(&err) => {
                warn!("{err}; serving demo catalog");
                Ok(from_demo(&demo_categories()))
            }
            Err(err) => Err(err),
        }
    }
}

// Config and lookup errors are never masked.
pub fn recoverable(error: &CatalogError) -> bool {
    error.is_transport()
        || matches!(
            error,
            CatalogError::SchemaMismatch | CatalogError::EmptyCatalog
        )
}

pub fn demo_categories() -> Vec<Category> {
    vec![
        Category {
            id: "1".to_string(),
            name: "Web Development".to_string(),
            slug: "web-development".to_string(),
            description: "Learn about web development technologies.".to_string(),
            image_url: "/images/category-web-dev.jpg".to_string(),
            videos: vec![
                video(
                    "101",
                    "React Tutorial",
                    "https://example.com/react-tutorial",
                    "A comprehensive React tutorial for beginners.",
                    &["react", "javascript", "frontend"],
                ),
                video(
                    "102",
                    "Node.js Crash Course",
                    "https://example.com/node-crash-course",
                    "Get started with Node.js in this crash course.",
                    &["node.js", "javascript", "backend"],
                ),
            ],
            subcategories: vec![Subcategory {
                id: "11".to_string(),
                name: "Frontend Frameworks".to_string(),
                slug: "frontend-frameworks".to_string(),
                description: "Explore different frontend frameworks.".to_string(),
                videos: vec![video(
                    "111",
                    "Angular Basics",
                    "https://example.com/angular-basics",
                    "Learn the basics of Angular framework.",
                    &["angular", "typescript", "frontend"],
                )],
                subcategories: Vec::new(),
            }],
        },
        Category {
            id: "2".to_string(),
            name: "Mobile Development".to_string(),
            slug: "mobile-development".to_string(),
            description: "Discover mobile app development techniques.".to_string(),
            image_url: "/images/category-mobile-dev.jpg".to_string(),
            videos: vec![video(
                "201",
                "React Native Guide",
                "https://example.com/react-native-guide",
                "Build native apps with React Native.",
                &["react native", "javascript", "mobile"],
            )],
            subcategories: Vec::new(),
        },
        empty(
            "3",
            "Data Science",
            "Explore data analysis and machine learning.",
            "/images/category-data-science.jpg",
        ),
        empty(
            "4",
            "Game Development",
            "Create your own games with these tutorials.",
            "/images/category-game-dev.jpg",
        ),
        empty(
            "5",
            "Cloud Computing",
            "Learn about cloud platforms and services.",
            "/images/category-cloud.jpg",
        ),
        empty(
            "6",
            "Cybersecurity",
            "Protect systems and networks from cyber threats.",
            "/images/category-cybersecurity.jpg",
        ),
    ]
}

fn video(id: &str, title: &str, url: &str, description: &str, tags: &[&str]) -> VideoItem {
    VideoItem {
        id: id.to_string(),
        title: title.to_string(),
        url: url.to_string(),
        description: description.to_string(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
    }
}

fn empty(id: &str, name: &str, description: &str, image_url: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        slug: crate::domain::slugify(name),
        description: description.to_string(),
        image_url: image_url.to_string(),
        videos: Vec::new(),
        subcategories: Vec::new(),
    }
}
