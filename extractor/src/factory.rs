//! Strategy registry

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::error::*;
use crate::models::*;
use crate::traits::Strategy;

/// Strategy registry item
#[derive(Clone)]
pub struct RegistryItem {
    /// Report key, unique within a registry
    pub name: &'static str,
    pub family: Family,
    pub applies: fn(platform: &PlatformMatch) -> bool,
    pub creator: fn() -> Box<dyn Strategy>,
}

impl RegistryItem {
    pub fn applies(&self, platform: &PlatformMatch) -> bool {
        (self.applies)(platform)
    }

    pub fn create(&self) -> Box<dyn Strategy> {
        (self.creator)()
    }
}

impl fmt::Debug for RegistryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryItem")
            .field("name", &self.name)
            .field("family", &self.family)
            .finish()
    }
}

/// Ordered, immutable strategy catalogue
///
/// Platform strategies always precede generic ones; order within a family
/// is insertion order. Registry order is both the tie-break and the report order.
#[derive(Debug, Clone)]
pub struct Registry {
    items: Vec<RegistryItem>,
}

impl Registry {
    /// Built-in strategies
    pub fn builtin() -> Self {
        // built-in names are unique
        Self::from_sorted(crate::strategies::registry_items())
    }

    pub fn new(items: Vec<RegistryItem>) -> Result<Self> {
        let mut registry = Self { items: Vec::new() };
        for item in items {
            registry.register(item)?;
        }
        Ok(registry)
    }

    fn from_sorted(mut items: Vec<RegistryItem>) -> Self {
        items.sort_by_key(|item| item.family);
        Self { items }
    }

    /// Add a strategy after the others of its family
    pub fn register(&mut self, item: RegistryItem) -> Result<()> {
        if self.items.iter().any(|i| i.name == item.name) {
            return Err(Error::Config(format!(
                "strategy '{}' is already registered",
                item.name
            )));
        }
        let at = self.items.partition_point(|i| i.family <= item.family);
        self.items.insert(at, item);
        Ok(())
    }

    /// Builder form of [`Registry::register`]
    pub fn with(mut self, item: RegistryItem) -> Result<Self> {
        self.register(item)?;
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.items.iter().map(|i| i.name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RegistryItem> {
        self.items.iter().find(|i| i.name == name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}
