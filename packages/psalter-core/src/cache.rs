//! Per-entry render cache.
//!
//! Two index-aligned slots per playlist entry: the raw notation text, stored
//! once when its retrieval completes, and the active playback control, replaced
//! on every render so old controls are dropped rather than accumulated.
//!
//! Each render of an entry takes a new generation number. A playback control
//! built for an older render is discarded when it arrives, so the stored
//! control always belongs to the most recent render.

use log::debug;

#[derive(Debug)]
pub struct RenderCache<C> {
    notation: Vec<Option<String>>,
    controls: Vec<Option<C>>,
    generations: Vec<u64>,
}

impl<C> RenderCache<C> {
    pub fn new() -> Self {
        RenderCache {
            notation: Vec::new(),
            controls: Vec::new(),
            generations: Vec::new(),
        }
    }

    /// Store the notation fetched for entry `index`.
    ///
    /// Returns `false` and keeps the first text if the entry was already cached.
    pub fn store_notation(&mut self, index: usize, text: String) -> bool {
        grow(&mut self.notation, index);
        if self.notation[index].is_some() {
            debug!("notation for entry {} already cached", index);
            return false;
        }
        self.notation[index] = Some(text);
        true
    }

    pub fn notation(&self, index: usize) -> Option<&str> {
        self.notation.get(index)?.as_deref()
    }

    /// Cached entries in index order.
    pub fn cached(&self) -> impl Iterator<Item = (usize, &str)> {
        self.notation
            .iter()
            .enumerate()
            .filter_map(|(i, text)| Some((i, text.as_deref()?)))
    }

    /// Install a new playback control for entry `index`, returning the one it replaces.
    pub fn replace_control(&mut self, index: usize, control: C) -> Option<C> {
        grow(&mut self.controls, index);
        self.controls[index].replace(control)
    }

    /// Start a new render of entry `index` and return its generation.
    pub fn begin_render(&mut self, index: usize) -> u64 {
        if self.generations.len() <= index {
            self.generations.resize(index + 1, 0);
        }
        self.generations[index] += 1;
        self.generations[index]
    }

    /// Install `control` if it was built for the latest render of entry `index`.
    ///
    /// A control from a superseded render is dropped and `false` returned.
    pub fn install_control(&mut self, index: usize, generation: u64, control: C) -> bool {
        if self.generations.get(index).copied() != Some(generation) {
            debug!("dropping stale playback control for entry {}", index);
            return false;
        }
        self.replace_control(index, control);
        true
    }

    pub fn control(&self, index: usize) -> Option<&C> {
        self.controls.get(index)?.as_ref()
    }

    pub fn control_count(&self) -> usize {
        self.controls.iter().filter(|c| c.is_some()).count()
    }
}

impl<C> Default for RenderCache<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn grow<T>(slots: &mut Vec<Option<T>>, index: usize) {
    if slots.len() <= index {
        slots.resize_with(index + 1, || None);
    }
}
