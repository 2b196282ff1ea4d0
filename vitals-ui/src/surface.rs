//! Render targets addressed by surface id.

use std::collections::BTreeMap;

use vitals_core::VitalsError;

use crate::svg::escape;

/// Something that can hold rendered markup under an id.
///
/// Writing to a surface always replaces what was there before.
pub trait Surface {
    fn replace_contents(&mut self, surface_id: &str, markup: &str) -> Result<(), VitalsError>;

    /// Replace the contents with plain text.
    fn replace_text(&mut self, surface_id: &str, text: &str) -> Result<(), VitalsError> {
        self.replace_contents(surface_id, &escape(text))
    }
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn replace_contents(&mut self, surface_id: &str, markup: &str) -> Result<(), VitalsError> {
        (**self).replace_contents(surface_id, markup)
    }
}

/// Surfaces kept in memory, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySurface {
    contents: BTreeMap<String, String>,
    writes: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, surface_id: &str) -> Option<&str> {
        self.contents.get(surface_id).map(String::as_str)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.contents.keys().map(String::as_str)
    }

    /// Total number of writes across all ids.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Surface for MemorySurface {
    fn replace_contents(&mut self, surface_id: &str, markup: &str) -> Result<(), VitalsError> {
        self.contents
            .insert(surface_id.to_string(), markup.to_string());
        self.writes += 1;
        Ok(())
    }
}
