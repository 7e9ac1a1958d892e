#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use tether_core::{Lifecycle, Store, Trigger};
    use tether_web::host::fake::FakeHost;
    use tether_web::host::{HostEvent, Target};

    use crate::*;

    struct Rig {
        host: Rc<FakeHost>,
        lifecycle: Lifecycle,
        keyboard: Keyboard,
    }

    fn rig() -> Rig {
        let host = FakeHost::new();
        let lifecycle = Lifecycle::manual();
        let keyboard = KeyboardTracker::new(host.clone()).track(&lifecycle);
        lifecycle.setup.fire(());
        Rig {
            host,
            lifecycle,
            keyboard,
        }
    }

    impl Rig {
        fn down(&self, press: KeyPress) {
            self.host
                .dispatch(&Target::Window, "keydown", HostEvent::Key(press));
        }

        fn up(&self, press: KeyPress) {
            self.host.dispatch(&Target::Window, "keyup", HostEvent::Key(press));
        }

        fn tap(&self, key: &str) {
            self.down(KeyPress::new(key));
            self.up(KeyPress::new(key));
        }

        fn type_text(&self, text: &str) {
            for c in text.chars() {
                self.tap(&c.to_string());
            }
        }

        fn teardown(&self) {
            if let Some(teardown) = &self.lifecycle.teardown {
                teardown.fire(());
            }
        }
    }

    fn count(trigger: &Trigger) -> Store<u32> {
        let n = Store::new(0);
        n.on(trigger, |n, _| n + 1);
        n
    }

    #[test]
    fn test_sequence_fires_after_typing() {
        let _ = env_logger::builder().is_test(true).try_init();
        let rig = rig();
        let typed = count(&rig.keyboard.sequence("iddqd", Modifiers::empty()));

        rig.type_text("iddqd");
        assert_eq!(typed.get(), 1);

        rig.type_text("iddqd");
        assert_eq!(typed.get(), 2);

        rig.teardown();
        rig.type_text("iddqd");
        assert_eq!(typed.get(), 2);
    }

    #[test]
    fn test_sequence_ignores_random_typing() {
        let rig = rig();
        let typed = count(&rig.keyboard.sequence("randomstring", Modifiers::empty()));

        rig.type_text("iddqd");

        assert_eq!(typed.get(), 0);
    }

    #[test]
    fn test_sequence_requires_modifiers_on_every_press() {
        let rig = rig();
        let typed = count(&rig.keyboard.sequence("ab", Modifiers::ALT));
        let alt = |key: &str| KeyPress::new(key).with_modifiers(Modifiers::ALT);

        rig.down(alt("a"));
        rig.down(KeyPress::new("b"));
        assert_eq!(typed.get(), 0);

        rig.down(alt("a"));
        rig.down(alt("b"));
        assert_eq!(typed.get(), 1);
    }

    #[test]
    fn test_reactive_needle() {
        let rig = rig();
        let needle = Store::new(None::<String>);
        let typed = count(&rig.keyboard.sequence(needle.clone(), Modifiers::empty()));

        rig.type_text("idkfa");
        assert_eq!(typed.get(), 0);

        needle.set(Some("idkfa".into()));
        rig.type_text("idkfa");
        assert_eq!(typed.get(), 1);
    }

    #[test]
    fn test_hotkey_down_and_up() {
        let rig = rig();
        let on_down = count(&rig.keyboard.hotkey(&["Control", "s"], KeyPhase::Down));
        let on_up = count(&rig.keyboard.hotkey(&["Control", "S"], KeyPhase::Up));

        rig.down(KeyPress::new("Control").with_modifiers(Modifiers::CTRL));
        assert_eq!(on_down.get(), 0);
        rig.down(KeyPress::new("s").with_modifiers(Modifiers::CTRL));
        assert_eq!(on_down.get(), 1);
        assert_eq!(on_up.get(), 0);

        rig.up(KeyPress::new("s").with_modifiers(Modifiers::CTRL));
        assert_eq!(on_up.get(), 1);
        rig.up(KeyPress::new("Control"));
        assert_eq!(on_up.get(), 1);
        assert!(rig.keyboard.held.get().is_empty());
    }

    #[test]
    fn test_hotkey_needs_exact_chord() {
        let rig = rig();
        let fired = count(&rig.keyboard.hotkey(&["Control", "s"], KeyPhase::Down));

        rig.down(KeyPress::new("Control"));
        rig.down(KeyPress::new("Shift"));
        rig.down(KeyPress::new("s"));

        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn test_modifier_state_and_blur() {
        let rig = rig();
        let shift = rig.keyboard.modifier(Modifiers::SHIFT);
        let shift_ctrl = rig.keyboard.modifier(Modifiers::SHIFT | Modifiers::CTRL);

        rig.down(KeyPress::new("Shift").with_modifiers(Modifiers::SHIFT));
        assert!(shift.get());
        assert!(!shift_ctrl.get());

        rig.host.dispatch(&Target::Window, "blur", HostEvent::Signal);
        assert!(!shift.get());
        assert!(rig.keyboard.held.get().is_empty());
    }
}
