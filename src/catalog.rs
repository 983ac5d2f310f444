//! The expected category structure, read from `metadata.json` listings.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::scanner;

/// Contents of one `metadata.json`. Unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryMetadata {
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub sub_categories: Vec<SubcategoryListing>,
}

/// A child listing is either a bare name or an object with a name and the
/// page it was scraped from.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubcategoryListing {
    Name(String),
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        link: Option<String>,
    },
}

impl SubcategoryListing {
    pub fn name(&self) -> Option<&str> {
        match self {
            SubcategoryListing::Name(name) => Some(name.as_str()),
            SubcategoryListing::Detailed { name, .. } => name.as_deref(),
        }
        .map(str::trim)
        .filter(|n| !n.is_empty())
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            SubcategoryListing::Name(_) => None,
            SubcategoryListing::Detailed { link, .. } => link.as_deref().filter(|l| !l.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedSubcategory {
    pub category: String,
    pub subcategory: String,
    pub link: Option<String>,
    /// Directory the subcategory's videos are expected in.
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct CategoryTree {
    pub subcategories: Vec<ExpectedSubcategory>,
    /// `metadata.json` files that could not be read or parsed.
    pub errors: Vec<(PathBuf, Error)>,
}

pub fn load_metadata(path: &Path) -> Result<CategoryMetadata> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| Error::parse(path, e))
}

/// Expected subcategories declared by every metadata file under `root`, in
/// walk order. A directory listed by more than one metadata file appears once.
/// A listed directory whose own metadata lists children is a category, not a
/// subcategory, and is left out.
pub fn load_category_tree(root: &Path, config: &AppConfig) -> CategoryTree {
    let ignore = scanner::compile_ignore_patterns(&config.ignore_patterns);
    let metadata_files = scanner::find_files_named(root, &config.metadata_file_name, &ignore);

    let mut tree = CategoryTree::default();
    let mut categories: Vec<(PathBuf, CategoryMetadata)> = Vec::new();
    for metadata_path in metadata_files {
        match load_metadata(&metadata_path) {
            Ok(metadata) => categories.push((metadata_path, metadata)),
            Err(err) => {
                error!("Cannot read {}: {}", metadata_path.display(), err);
                tree.errors.push((metadata_path, err));
            }
        }
    }

    let parents: HashSet<&Path> = categories
        .iter()
        .filter(|(_, metadata)| !metadata.sub_categories.is_empty())
        .filter_map(|(path, _)| path.parent())
        .collect();

    let mut seen: HashSet<PathBuf> = HashSet::new();
    for (metadata_path, metadata) in &categories {
        let category_dir = metadata_path.parent().unwrap_or(root);
        let category = metadata
            .category_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| dir_name(category_dir));
        debug!(
            "Category {} declares {} subcategories",
            category,
            metadata.sub_categories.len()
        );

        for listing in &metadata.sub_categories {
            let Some(name) = listing.name() else {
                warn!("Unnamed subcategory in {}", metadata_path.display());
                continue;
            };
            let path = category_dir.join(name);
            if parents.contains(path.as_path()) {
                debug!("{} has its own listing, treating it as a category", path.display());
                continue;
            }
            if !seen.insert(path.clone()) {
                continue;
            }
            tree.subcategories.push(ExpectedSubcategory {
                category: category.clone(),
                subcategory: name.to_string(),
                link: listing.link().map(str::to_string),
                path,
            });
        }
    }

    tree
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            dir.canonicalize()
                .ok()?
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| ".".to_string())
}
