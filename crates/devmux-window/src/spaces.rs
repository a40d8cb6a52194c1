//! Virtual desktops (Spaces).
//!
//! The compositor only exposes desktops through private symbols. A provider
//! that cannot bind them reports itself unavailable, and every
//! [`SpaceCoordinator`] operation then degrades to a no-op.

use std::time::Duration;

use devmux_core::poll::{PollPolicy, Sleeper};

use crate::types::{DisplaySpaces, SpaceInfo};

/// Desktop type the compositor uses for ordinary user desktops.
pub const USER_SPACE_TYPE: i64 = 0;

/// One desktop as reported by the compositor, before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSpace {
    pub id: u64,
    pub kind: i64,
}

/// One display as reported by the compositor, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDisplay {
    pub display_id: String,
    pub current_space_id: u64,
    pub spaces: Vec<RawSpace>,
}

/// Low-level desktop access.
pub trait SpaceProvider: Send + Sync {
    /// Whether the private API could be bound.
    fn available(&self) -> bool;

    /// Every display with its desktops, in compositor order.
    fn managed_displays(&self) -> Vec<RawDisplay>;

    fn active_space(&self) -> Option<u64>;

    /// Desktops `window_id` lives on.
    fn spaces_for_window(&self, window_id: u32) -> Vec<u64>;

    /// Make `space_id` current on display `display_id`.
    fn set_current_space(&self, display_id: &str, space_id: u64) -> bool;
}

/// Provider used when desktop control is unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSpaceProvider;

impl SpaceProvider for NullSpaceProvider {
    fn available(&self) -> bool {
        false
    }

    fn managed_displays(&self) -> Vec<RawDisplay> {
        Vec::new()
    }

    fn active_space(&self) -> Option<u64> {
        None
    }

    fn spaces_for_window(&self, _window_id: u32) -> Vec<u64> {
        Vec::new()
    }

    fn set_current_space(&self, _display_id: &str, _space_id: u64) -> bool {
        false
    }
}

/// Keep user desktops only. Indices stay positional: a fullscreen desktop
/// in slot 2 leaves a gap rather than renumbering the ones after it.
pub fn user_spaces(raw: &[RawDisplay]) -> Vec<DisplaySpaces> {
    raw.iter()
        .enumerate()
        .map(|(display_index, d)| DisplaySpaces {
            display_index,
            display_id: d.display_id.clone(),
            current_space_id: d.current_space_id,
            spaces: d
                .spaces
                .iter()
                .enumerate()
                .filter(|(_, s)| s.kind == USER_SPACE_TYPE)
                .map(|(i, s)| SpaceInfo {
                    id: s.id,
                    index: i + 1,
                    display: display_index,
                    is_current: s.id == d.current_space_id,
                })
                .collect(),
        })
        .collect()
}

pub struct SpaceCoordinator {
    provider: Box<dyn SpaceProvider>,
}

impl SpaceCoordinator {
    pub fn new(provider: Box<dyn SpaceProvider>) -> Self {
        if !provider.available() {
            tracing::info!("desktop navigation unavailable");
        }
        Self { provider }
    }

    pub fn unavailable() -> Self {
        Self {
            provider: Box::new(NullSpaceProvider),
        }
    }

    pub fn available(&self) -> bool {
        self.provider.available()
    }

    pub fn displays(&self) -> Vec<DisplaySpaces> {
        user_spaces(&self.provider.managed_displays())
    }

    pub fn active_space(&self) -> Option<u64> {
        self.provider.active_space().filter(|id| *id != 0)
    }

    /// The first desktop `window_id` is on.
    pub fn space_for_window(&self, window_id: u32) -> Option<u64> {
        self.provider.spaces_for_window(window_id).into_iter().next()
    }

    /// Switch the owning display to `space_id`. `false` when the space is
    /// unknown or desktop control is unavailable.
    pub fn switch_to(&self, space_id: u64) -> bool {
        let displays = self.displays();
        let Some(display) = displays
            .iter()
            .find(|d| d.spaces.iter().any(|s| s.id == space_id))
        else {
            tracing::debug!("space {space_id} not found on any display");
            return false;
        };
        let display_id = &display.display_id;
        tracing::info!("switching {display_id} to space {space_id}");
        self.provider
            .set_current_space(&display.display_id, space_id)
    }

    /// Switch to `space_id` and wait, bounded by `settle`, until the
    /// compositor reports it active. Returns whether the switch was issued.
    pub fn switch_and_settle(&self, space_id: u64, settle: Duration, sleeper: &impl Sleeper) -> bool {
        if !self.switch_to(space_id) {
            return false;
        }
        let policy = PollPolicy::new(settle_interval(settle), settle);
        if !policy.wait_until(sleeper, || self.active_space() == Some(space_id)) {
            tracing::debug!("space {space_id} not reported active after {settle:?}");
        }
        true
    }
}

fn settle_interval(settle: Duration) -> Duration {
    (settle / 4).clamp(Duration::from_millis(10), Duration::from_millis(50))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct FakeSpaces {
        displays: Vec<RawDisplay>,
        active: Mutex<u64>,
        switched: Mutex<Vec<(String, u64)>>,
    }

    impl FakeSpaces {
        fn two_displays() -> Self {
            Self {
                displays: vec![
                    RawDisplay {
                        display_id: "main".into(),
                        current_space_id: 11,
                        spaces: vec![
                            RawSpace { id: 11, kind: 0 },
                            RawSpace { id: 12, kind: 4 },
                            RawSpace { id: 13, kind: 0 },
                        ],
                    },
                    RawDisplay {
                        display_id: "side".into(),
                        current_space_id: 21,
                        spaces: vec![RawSpace { id: 21, kind: 0 }],
                    },
                ],
                active: Mutex::new(11),
                switched: Mutex::default(),
            }
        }
    }

    impl SpaceProvider for FakeSpaces {
        fn available(&self) -> bool {
            true
        }

        fn managed_displays(&self) -> Vec<RawDisplay> {
            self.displays.clone()
        }

        fn active_space(&self) -> Option<u64> {
            Some(*self.active.lock().expect("lock"))
        }

        fn spaces_for_window(&self, window_id: u32) -> Vec<u64> {
            if window_id == 7 { vec![13] } else { Vec::new() }
        }

        fn set_current_space(&self, display_id: &str, space_id: u64) -> bool {
            self.switched
                .lock()
                .expect("lock")
                .push((display_id.to_string(), space_id));
            *self.active.lock().expect("lock") = space_id;
            true
        }
    }

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _: Duration) {}
    }

    #[test]
    fn fullscreen_spaces_skipped_indices_positional() {
        let displays = user_spaces(&FakeSpaces::two_displays().displays);
        assert_eq!(displays.len(), 2);
        let main = &displays[0];
        let ids: Vec<_> = main.spaces.iter().map(|s| (s.id, s.index)).collect();
        assert_eq!(ids, [(11, 1), (13, 3)]);
        assert!(main.spaces[0].is_current);
        assert_eq!(displays[1].spaces[0].display, 1);
    }

    #[test]
    fn switch_resolves_owning_display() {
        let fake = FakeSpaces::two_displays();
        let coord = SpaceCoordinator::new(Box::new(fake));
        assert!(coord.switch_and_settle(21, Duration::from_millis(200), &NoSleep));
        assert_eq!(coord.active_space(), Some(21));
    }

    #[test]
    fn unknown_or_fullscreen_space_is_refused() {
        let coord = SpaceCoordinator::new(Box::new(FakeSpaces::two_displays()));
        assert!(!coord.switch_to(99));
        assert!(!coord.switch_to(12));
        assert_eq!(coord.active_space(), Some(11));
    }

    #[test]
    fn window_space_lookup() {
        let coord = SpaceCoordinator::new(Box::new(FakeSpaces::two_displays()));
        assert_eq!(coord.space_for_window(7), Some(13));
        assert_eq!(coord.space_for_window(8), None);
    }

    #[test]
    fn null_provider_is_inert() {
        let coord = SpaceCoordinator::unavailable();
        assert!(!coord.available());
        assert!(coord.displays().is_empty());
        assert_eq!(coord.active_space(), None);
        assert!(!coord.switch_and_settle(11, Duration::from_millis(200), &NoSleep));
    }
}
