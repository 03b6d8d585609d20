//! The page address boundary.
//!
//! View-state writes always *replace* the current history entry, so toggling
//! voices or transposing never adds back-navigation steps.

use url::Url;

use crate::error::PsalterError;

pub trait Address {
    /// The address the page currently shows.
    fn current(&self) -> Url;

    /// Replace the current history entry without navigating.
    fn replace(&mut self, url: Url);

    /// Edit the current address in place.
    fn modify<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut Url),
        Self: Sized,
    {
        let mut url = self.current();
        edit(&mut url);
        self.replace(url);
    }
}

/// An in-memory history stack, standing in for the browser location.
#[derive(Debug, Clone)]
pub struct MemoryAddress {
    history: Vec<Url>,
}

impl MemoryAddress {
    pub fn new(url: Url) -> Self {
        MemoryAddress { history: vec![url] }
    }

    pub fn parse(address: &str) -> Result<Self, PsalterError> {
        Ok(Self::new(Url::parse(address)?))
    }

    /// Navigate to a new address, adding a history entry.
    pub fn push(&mut self, url: Url) {
        self.history.push(url);
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The fragment of the current address, without `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.history.last().and_then(Url::fragment)
    }
}

impl Address for MemoryAddress {
    fn current(&self) -> Url {
        // `history` is never empty: constructed with one entry, only grows
        self.history[self.history.len() - 1].clone()
    }

    fn replace(&mut self, url: Url) {
        if let Some(last) = self.history.last_mut() {
            *last = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_state::write_transpose;

    #[test]
    fn test_modify_replaces_history_entry() {
        let mut address = MemoryAddress::parse("https://example.org/").unwrap();
        address.modify(|url| write_transpose(url, 2));
        address.modify(|url| write_transpose(url, 3));
        assert_eq!(address.history_len(), 1);
        assert_eq!(address.current().as_str(), "https://example.org/?t=3");
    }

    #[test]
    fn test_push_adds_history_entry() {
        let mut address = MemoryAddress::parse("https://example.org/").unwrap();
        address.push(Url::parse("https://example.org/#psalm-1").unwrap());
        assert_eq!(address.history_len(), 2);
        assert_eq!(address.fragment(), Some("psalm-1"));
    }

    #[test]
    fn test_parse_rejects_relative_address() {
        assert!(matches!(
            MemoryAddress::parse("/psalter?t=1"),
            Err(PsalterError::Address(_))
        ));
    }
}
