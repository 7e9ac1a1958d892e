use std::collections::VecDeque;

use tether_core::{ReadStore, Store};
use unicode_segmentation::UnicodeSegmentation;

/// What a sequence waits for.
#[derive(Clone, Debug)]
pub enum Needle {
    Static(String),
    /// Re-read on every key press; `None` disables the sequence.
    Reactive(ReadStore<Option<String>>),
}

impl Needle {
    pub(crate) fn current(&self) -> Option<String> {
        match self {
            Self::Static(needle) => Some(needle.clone()),
            Self::Reactive(store) => store.get(),
        }
    }
}

impl From<&str> for Needle {
    fn from(needle: &str) -> Self {
        Self::Static(needle.to_owned())
    }
}

impl From<String> for Needle {
    fn from(needle: String) -> Self {
        Self::Static(needle)
    }
}

impl From<ReadStore<Option<String>>> for Needle {
    fn from(store: ReadStore<Option<String>>) -> Self {
        Self::Reactive(store)
    }
}

impl From<Store<Option<String>>> for Needle {
    fn from(store: Store<Option<String>>) -> Self {
        Self::Reactive(store.read_only())
    }
}

impl From<ReadStore<String>> for Needle {
    fn from(store: ReadStore<String>) -> Self {
        Self::Reactive(store.map(|needle| Some(needle.clone())))
    }
}

/// Keys that never break a sequence, so `Shift+I` types an `I`.
pub(crate) fn is_modifier_key(key: &str) -> bool {
    matches!(
        key,
        "Shift" | "Control" | "Alt" | "AltGraph" | "Meta" | "OS" | "CapsLock" | "Fn"
    )
}

/// The last few characters typed, compared against a needle.
#[derive(Debug, Default)]
pub(crate) struct SequenceBuffer {
    typed: VecDeque<String>,
}

impl SequenceBuffer {
    /// Records `key` and reports whether the buffer now spells `needle`.
    ///
    /// Named keys (`Enter`, `ArrowUp`, ...) clear the buffer. A match clears it
    /// too, so typing the needle twice matches twice.
    pub(crate) fn push(&mut self, key: &str, needle: &str) -> bool {
        let mut graphemes = key.graphemes(true);
        let (Some(typed), None) = (graphemes.next(), graphemes.next()) else {
            self.clear();
            return false;
        };

        let needle: Vec<&str> = needle.graphemes(true).collect();
        if needle.is_empty() {
            return false;
        }

        self.typed.push_back(typed.to_owned());
        while self.typed.len() > needle.len() {
            self.typed.pop_front();
        }

        if self.typed.iter().map(String::as_str).eq(needle.iter().copied()) {
            self.clear();
            true
        } else {
            false
        }
    }

    pub(crate) fn clear(&mut self) {
        self.typed.clear();
    }
}
