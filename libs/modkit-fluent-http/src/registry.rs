use crate::codec::DecodeFn;
use std::fmt;

/// Decode operations keyed by media type, in registration order.
///
/// Keys are compared case-sensitively. Registering an existing key replaces
/// its operation in place and keeps the original position.
pub struct DecoderRegistry<T> {
    entries: Vec<(String, DecodeFn<T>)>,
}

impl<T> DecoderRegistry<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Bind `decode` to `media_type`. Returns `true` when an existing binding was replaced.
    pub(crate) fn insert(&mut self, media_type: String, decode: DecodeFn<T>) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == media_type) {
            entry.1 = decode;
            return true;
        }
        self.entries.push((media_type, decode));
        false
    }

    pub(crate) fn get(&self, media_type: &str) -> Option<&DecodeFn<T>> {
        self.entries
            .iter()
            .find(|(key, _)| key == media_type)
            .map(|(_, decode)| decode)
    }

    pub(crate) fn media_types(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T> Default for DecoderRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DecoderRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.media_types()).finish()
    }
}
