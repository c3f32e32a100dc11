//! # Key Debouncing
//!
//! Turns raw key levels into a debounced [`ButtonState`]. A key may only
//! change state once per debounce window; the first edge is accepted
//! immediately.

/// Debounced flags, one per configured key, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ButtonState {
    pressed: Vec<bool>,
}

impl ButtonState {
    /// Creates a state with `count` released keys.
    #[must_use]
    pub fn released(count: usize) -> Self {
        Self {
            pressed: vec![false; count],
        }
    }

    /// Creates a state from explicit flags.
    #[must_use]
    pub fn from_flags(flags: &[bool]) -> Self {
        Self {
            pressed: flags.to_vec(),
        }
    }

    /// Returns true if key `index` is held. Unknown keys are released.
    #[must_use]
    pub fn is_pressed(&self, index: usize) -> bool {
        self.pressed.get(index).copied().unwrap_or(false)
    }

    /// All flags in key order.
    #[must_use]
    pub fn flags(&self) -> &[bool] {
        &self.pressed
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pressed.len()
    }

    /// True for a device without keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }
}

/// Time-based debouncer for a fixed number of keys.
#[derive(Debug, Clone)]
pub struct KeyDebouncer {
    state: ButtonState,
    last_change_ms: Vec<Option<u32>>,
    debounce_ms: u32,
}

impl KeyDebouncer {
    /// Creates a debouncer for `count` keys.
    #[must_use]
    pub fn new(count: usize, debounce_ms: u32) -> Self {
        Self {
            state: ButtonState::released(count),
            last_change_ms: vec![None; count],
            debounce_ms,
        }
    }

    /// Feeds raw key levels sampled at `now_ms`.
    ///
    /// Extra raw levels beyond the configured count are ignored; missing
    /// ones read as released.
    pub fn update(&mut self, now_ms: u32, raw: &[bool]) -> &ButtonState {
        for i in 0..self.state.pressed.len() {
            let level = raw.get(i).copied().unwrap_or(false);
            if level == self.state.pressed[i] {
                continue;
            }
            let settled = match self.last_change_ms[i] {
                Some(last) => now_ms.wrapping_sub(last) >= self.debounce_ms,
                None => true,
            };
            if settled {
                self.state.pressed[i] = level;
                self.last_change_ms[i] = Some(now_ms);
            }
        }
        &self.state
    }

    /// Current debounced state.
    #[must_use]
    pub fn state(&self) -> &ButtonState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_released_state() {
        let state = ButtonState::released(3);
        assert_eq!(state.len(), 3);
        assert!(!state.is_pressed(0));
        assert!(!state.is_pressed(7), "Out-of-range keys read as released");
    }

    #[test]
    fn test_first_press_is_immediate() {
        let mut keys = KeyDebouncer::new(2, 200);
        let state = keys.update(5, &[true, false]);
        assert!(state.is_pressed(0));
        assert!(!state.is_pressed(1));
    }

    #[test]
    fn test_bounce_within_window_is_ignored() {
        let mut keys = KeyDebouncer::new(1, 200);
        keys.update(0, &[true]);
        assert!(keys.update(50, &[false]).is_pressed(0), "Release inside window ignored");
        assert!(keys.update(199, &[false]).is_pressed(0));
        assert!(!keys.update(200, &[false]).is_pressed(0), "Release accepted at window end");
    }

    #[test]
    fn test_keys_debounce_independently() {
        let mut keys = KeyDebouncer::new(2, 100);
        keys.update(0, &[true, false]);
        let state = keys.update(10, &[true, true]);
        assert!(state.is_pressed(1), "Second key has its own window");
    }

    #[test]
    fn test_debounce_across_clock_wrap() {
        let mut keys = KeyDebouncer::new(1, 100);
        keys.update(u32::MAX - 10, &[true]);
        assert!(keys.update(20, &[false]).is_pressed(0));
        assert!(!keys.update(90, &[false]).is_pressed(0));
    }

    #[test]
    fn test_missing_levels_read_released() {
        let mut keys = KeyDebouncer::new(3, 0);
        let state = keys.update(0, &[true]);
        assert_eq!(state.flags(), &[true, false, false]);
    }
}
