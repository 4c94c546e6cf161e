//! Package catalog
//!
//! The builtin catalog ships inside the binary as RON and is parsed once by
//! [`Catalog::builtin`]. Callers build it at startup and pass it around; there
//! is no global instance.

use crate::{generate_checklist, Checklist, Error, GamePackage, PackageSummary, Result};
use indexmap::IndexMap;
use serde::Deserialize;

const BUILTIN_PACKAGES: &str = include_str!("../data/packages.ron");

/// Registry of game packages keyed by package id
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    packages: IndexMap<String, GamePackage>,
}

impl Catalog {
    /// Parse the packages compiled into the crate
    pub fn builtin() -> Result<Self> {
        Self::from_ron_str(BUILTIN_PACKAGES)
    }

    /// Parse a catalog document of the form `(packages: [ ... ])`
    pub fn from_ron_str(content: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct CatalogFile {
            packages: Vec<GamePackage>,
        }

        let file: CatalogFile = ron::from_str(content)?;
        let mut catalog = Catalog::default();
        for package in file.packages {
            catalog.insert(package)?;
        }
        Ok(catalog)
    }

    /// Add a package after validating it
    pub fn insert(&mut self, package: GamePackage) -> Result<()> {
        validate(&package)?;
        let id = package.id.as_str().to_string();
        if self.packages.contains_key(&id) {
            return Err(Error::Catalog(format!("duplicate package '{}'", id)));
        }
        self.packages.insert(id, package);
        Ok(())
    }

    /// Look up a package
    pub fn get(&self, id: &str) -> Option<&GamePackage> {
        self.packages.get(id)
    }

    /// Look up a package, failing with `PackageNotFound`
    pub fn require(&self, id: &str) -> Result<&GamePackage> {
        self.get(id)
            .ok_or_else(|| Error::PackageNotFound(id.to_string()))
    }

    /// Packages in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &GamePackage> {
        self.packages.values()
    }

    /// Listing entries in declaration order
    pub fn summaries(&self) -> Vec<PackageSummary> {
        self.iter().map(GamePackage::summary).collect()
    }

    /// Number of packages
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// True when no packages are registered
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Generate the initial checklist for a package id
    pub fn generate_checklist(&self, id: &str) -> Result<Checklist> {
        self.require(id).map(generate_checklist)
    }
}

fn validate(package: &GamePackage) -> Result<()> {
    let invalid = |reason: &str| Err(Error::Catalog(format!("package '{}': {}", package.id, reason)));

    if package.id.as_str().trim().is_empty() {
        return Err(Error::Catalog("package with empty id".to_string()));
    }
    if package.layout.reels == 0 || package.layout.rows == 0 {
        return invalid("empty reel layout");
    }
    if package.paylines == 0 {
        return invalid("no paylines");
    }
    if !package.min_bet.is_finite() || !package.max_bet.is_finite() {
        return invalid("bet limits must be finite");
    }
    if package.min_bet <= 0.0 || package.min_bet > package.max_bet {
        return invalid("invalid bet range");
    }
    if package.symbols.is_empty() {
        return invalid("no symbols");
    }
    Ok(())
}
