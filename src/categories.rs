//! Fixed object-shape taxonomy shared by the COCO and YOLO converters.

use std::sync::OnceLock;

use crate::coco::Category;

// (name, supercategory) pairs; the position is the category id
pub const BUILTIN_CATEGORIES: &[(&str, &str)] = &[
    ("box", "primitive"),
    ("sphere", "primitive"),
    ("cylinder", "primitive"),
    ("cone", "primitive"),
    ("torus", "primitive"),
    ("capsule", "primitive"),
    ("tetrahedron", "polyhedron"),
    ("octahedron", "polyhedron"),
    ("dodecahedron", "polyhedron"),
    ("icosahedron", "polyhedron"),
];

/// Id used for any class label that is not registered.
pub const FALLBACK_CATEGORY_ID: u32 = 0;

static BUILTIN_REGISTRY: OnceLock<CategoryRegistry> = OnceLock::new();

/// Ordered, immutable mapping between class names and category ids.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    fallback_id: u32,
}

impl CategoryRegistry {
    /// Build a registry from ordered `(name, supercategory)` pairs.
    ///
    /// `fallback_id` must index one of the pairs; it is clamped to 0 otherwise.
    pub fn from_pairs(pairs: &[(&str, &str)], fallback_id: u32) -> Self {
        let categories: Vec<Category> = pairs
            .iter()
            .enumerate()
            .map(|(id, (name, supercategory))| Category {
                id: id as u32,
                name: name.to_string(),
                supercategory: supercategory.to_string(),
            })
            .collect();
        let fallback_id = if (fallback_id as usize) < categories.len() {
            fallback_id
        } else {
            0
        };
        Self {
            categories,
            fallback_id,
        }
    }

    /// The registry compiled into the crate.
    pub fn builtin() -> &'static CategoryRegistry {
        BUILTIN_REGISTRY
            .get_or_init(|| CategoryRegistry::from_pairs(BUILTIN_CATEGORIES, FALLBACK_CATEGORY_ID))
    }

    /// Exact-match lookup; unknown names map to the fallback id.
    pub fn class_name_to_id(&self, name: &str) -> u32 {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
            .unwrap_or(self.fallback_id)
    }

    pub fn fallback_id(&self) -> u32 {
        self.fallback_id
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
