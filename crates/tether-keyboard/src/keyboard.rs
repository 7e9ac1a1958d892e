use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use tether_core::{Event, Lifecycle, ReadStore, Store, Trigger};
use tether_web::host::{Host, HostEvent, KeyPress, Modifiers, Target, browser_host, listen};

use crate::sequence::{Needle, SequenceBuffer, is_modifier_key};

/// When a hotkey fires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyPhase {
    /// As soon as the last key of the chord goes down.
    #[default]
    Down,
    /// When the first key of the chord is released.
    Up,
}

#[derive(Clone)]
pub struct KeyboardTracker {
    host: Rc<dyn Host>,
}

/// Key events of the window plus what is currently held down.
#[derive(Clone)]
pub struct Keyboard {
    pub pressed: Event<KeyPress>,
    pub released: Event<KeyPress>,
    /// Lower-cased `key` values currently held.
    pub held: ReadStore<BTreeSet<String>>,
    pub modifiers: ReadStore<Modifiers>,
    chord_down: Event<BTreeSet<String>>,
    chord_up: Event<BTreeSet<String>>,
}

fn key_event(event: Event<HostEvent>) -> Event<KeyPress> {
    event.filter_map(|ev| match ev {
        HostEvent::Key(press) => Some(press.clone()),
        HostEvent::Signal => None,
    })
}

fn normalize(key: &str) -> String {
    key.to_lowercase()
}

impl KeyboardTracker {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host }
    }

    pub fn track(&self, lifecycle: &Lifecycle) -> Keyboard {
        let pressed = key_event(listen(&self.host, Target::Window, "keydown", lifecycle));
        let released = key_event(listen(&self.host, Target::Window, "keyup", lifecycle));
        // Key-ups are lost while the window is in the background.
        let blurred = listen(&self.host, Target::Window, "blur", lifecycle).unit();

        let held = Store::new(BTreeSet::<String>::new());
        let modifiers = Store::new(Modifiers::empty());
        let chord_down = Event::new();
        let chord_up = Event::new();

        {
            let (held, modifiers, chord_down) = (held.clone(), modifiers.clone(), chord_down.clone());
            let _ = pressed.watch(move |press: &KeyPress| {
                modifiers.set(press.modifiers);
                if press.repeat {
                    return;
                }
                held.update(|keys| {
                    keys.insert(normalize(&press.key));
                });
                chord_down.fire(held.get());
            });
        }
        {
            let (held, modifiers, chord_up) = (held.clone(), modifiers.clone(), chord_up.clone());
            let _ = released.watch(move |press: &KeyPress| {
                modifiers.set(press.modifiers);
                let before = held.get();
                held.update(|keys| {
                    keys.remove(&normalize(&press.key));
                });
                chord_up.fire(before);
            });
        }
        held.on(&blurred, |_, _| BTreeSet::new());
        modifiers.on(&blurred, |_, _| Modifiers::empty());

        Keyboard {
            pressed,
            released,
            held: held.read_only(),
            modifiers: modifiers.read_only(),
            chord_down,
            chord_up,
        }
    }
}

impl Default for KeyboardTracker {
    fn default() -> Self {
        Self::new(browser_host())
    }
}

pub fn track_keyboard(lifecycle: &Lifecycle) -> Keyboard {
    KeyboardTracker::default().track(lifecycle)
}

impl Keyboard {
    /// Fires when the latest key presses spell `needle`.
    ///
    /// Every press that counts must hold at least `modifiers`; a press without
    /// them starts over. Repeats from a held key are ignored. A reactive needle
    /// starts over whenever it changes.
    pub fn sequence(&self, needle: impl Into<Needle>, modifiers: Modifiers) -> Trigger {
        let needle = needle.into();
        let typed = Trigger::new();
        let buffer = Rc::new(RefCell::new(SequenceBuffer::default()));

        if let Needle::Reactive(store) = &needle {
            let buffer = buffer.clone();
            let _ = store.updates().watch(move |_| buffer.borrow_mut().clear());
        }

        let fire = typed.clone();
        let _ = self.pressed.watch(move |press| {
            if press.repeat || is_modifier_key(&press.key) {
                return;
            }
            let Some(current) = needle.current() else {
                return;
            };
            let matched = if press.modifiers.contains(modifiers) {
                buffer.borrow_mut().push(&press.key, &current)
            } else {
                buffer.borrow_mut().clear();
                false
            };
            if matched {
                log::debug!("keyboard: sequence `{current}` typed");
                fire.fire(());
            }
        });

        typed
    }

    /// Fires when exactly `keys` are held together. Key names are
    /// `KeyboardEvent.key` values and compared case-insensitively.
    pub fn hotkey(&self, keys: &[&str], phase: KeyPhase) -> Trigger {
        let chord: BTreeSet<String> = keys.iter().map(|k| normalize(k)).collect();
        let source = match phase {
            KeyPhase::Down => &self.chord_down,
            KeyPhase::Up => &self.chord_up,
        };
        source.filter(move |held| !chord.is_empty() && *held == chord).unit()
    }

    /// Whether all of `modifiers` are currently held.
    pub fn modifier(&self, modifiers: Modifiers) -> ReadStore<bool> {
        self.modifiers.map(move |held| held.contains(modifiers))
    }
}
