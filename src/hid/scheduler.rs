//! # Report Scheduler
//!
//! Paces translation, rotation and button reports onto a fixed-interval
//! channel. Polled once per control cycle; each poll performs at most one
//! state transition and yields at most one frame.
//!
//! ```text
//! Init ──► Idle ──► EmitTranslation ──► EmitRotation ──► Idle
//!           │  ▲                             │             ▲
//!           │  └───────── EmitButtons ◄──────┘             │
//!           └──────────────► EmitButtons ──────────────────┘
//! ```
//!
//! All-zero translation and rotation frames are repeated `zero_frames` times
//! so the host reliably observes the stop, then suppressed until motion
//! resumes. The pacing clock advances by exactly one interval per frame, so
//! timing does not drift under load.

use tracing::trace;

use super::protocol::ReportFrame;
use crate::motion::VelocityVector;

/// Default pacing interval in milliseconds
pub const DEFAULT_INTERVAL_MS: u32 = 8;

/// Default number of all-zero frames sent before suppression
pub const DEFAULT_ZERO_FRAMES: u8 = 3;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Init,
    Idle,
    EmitTranslation,
    EmitRotation,
    EmitButtons,
}

/// Fixed-cadence report pacing with idle-frame suppression.
#[derive(Debug, Clone)]
pub struct ReportScheduler {
    state: SchedulerState,
    interval_ms: u32,
    zero_frames: u8,
    last_sent_ms: u32,
    zero_translation_frames: u8,
    zero_rotation_frames: u8,
    /// `None` when the device has no keys.
    last_buttons: Option<Vec<u8>>,
}

impl ReportScheduler {
    /// Creates a scheduler in [`SchedulerState::Init`].
    ///
    /// `button_bytes` is the bitmap length, or `None` to never emit button reports.
    #[must_use]
    pub fn new(interval_ms: u32, zero_frames: u8, button_bytes: Option<usize>) -> Self {
        Self {
            state: SchedulerState::Init,
            interval_ms,
            zero_frames,
            last_sent_ms: 0,
            zero_translation_frames: 0,
            zero_rotation_frames: 0,
            last_buttons: button_bytes.map(|len| vec![0; len]),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Advances the state machine by one step.
    ///
    /// `now_ms` is a wrapping millisecond clock. `buttons` is the packed
    /// bitmap of the current cycle and is ignored for devices without keys.
    pub fn poll(
        &mut self,
        now_ms: u32,
        velocity: &VelocityVector,
        buttons: &[u8],
    ) -> Option<ReportFrame> {
        let (next, frame) = match self.state {
            SchedulerState::Init => {
                self.last_sent_ms = now_ms;
                (SchedulerState::Idle, None)
            }
            SchedulerState::Idle => (self.next_from_idle(now_ms, velocity, buttons), None),
            SchedulerState::EmitTranslation => {
                if !self.is_due(now_ms) {
                    return None;
                }
                self.last_sent_ms = self.last_sent_ms.wrapping_add(self.interval_ms);
                self.zero_translation_frames = if velocity.total_translation() == 0 {
                    self.zero_translation_frames.saturating_add(1)
                } else {
                    0
                };
                (
                    SchedulerState::EmitRotation,
                    Some(ReportFrame::translation(velocity)),
                )
            }
            SchedulerState::EmitRotation => {
                if !self.is_due(now_ms) {
                    return None;
                }
                self.last_sent_ms = self.last_sent_ms.wrapping_add(self.interval_ms);
                self.zero_rotation_frames = if velocity.total_rotation() == 0 {
                    self.zero_rotation_frames.saturating_add(1)
                } else {
                    0
                };
                let next = if self.buttons_changed(buttons) {
                    SchedulerState::EmitButtons
                } else {
                    SchedulerState::Idle
                };
                (next, Some(ReportFrame::rotation(velocity)))
            }
            SchedulerState::EmitButtons => {
                if !self.is_due(now_ms) {
                    return None;
                }
                self.last_sent_ms = self.last_sent_ms.wrapping_add(self.interval_ms);
                self.last_buttons = Some(buttons.to_vec());
                (
                    SchedulerState::Idle,
                    Some(ReportFrame::Buttons(buttons.to_vec())),
                )
            }
        };

        if next != self.state {
            trace!(from = ?self.state, to = ?next, now_ms, "Scheduler transition");
        }
        self.state = next;
        frame
    }

    fn next_from_idle(
        &mut self,
        now_ms: u32,
        velocity: &VelocityVector,
        buttons: &[u8],
    ) -> SchedulerState {
        if self.zero_translation_frames < self.zero_frames
            || self.zero_rotation_frames < self.zero_frames
            || !velocity.is_zero()
        {
            return SchedulerState::EmitTranslation;
        }
        if self.buttons_changed(buttons) {
            return SchedulerState::EmitButtons;
        }
        if self.is_due(now_ms) {
            // Keep the clock one interval behind so the next frame is due at once
            self.last_sent_ms = now_ms.wrapping_sub(self.interval_ms);
        }
        SchedulerState::Idle
    }

    fn is_due(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.last_sent_ms) >= self.interval_ms
    }

    fn buttons_changed(&self, buttons: &[u8]) -> bool {
        self.last_buttons
            .as_deref()
            .is_some_and(|last| last != buttons)
    }
}

impl Default for ReportScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_MS, DEFAULT_ZERO_FRAMES, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_BUTTONS: [u8; 2] = [0, 0];

    /// Polls once per millisecond over `[from, to)` and collects emitted frames.
    fn run(
        scheduler: &mut ReportScheduler,
        from: u32,
        to: u32,
        velocity: &VelocityVector,
        buttons: &[u8],
    ) -> Vec<(u32, ReportFrame)> {
        let mut frames = Vec::new();
        let mut now = from;
        while now != to {
            if let Some(frame) = scheduler.poll(now, velocity, buttons) {
                frames.push((now, frame));
            }
            now = now.wrapping_add(1);
        }
        frames
    }

    // ==================== State Machine Tests ====================

    #[test]
    fn test_init_transitions_to_idle() {
        let mut s = ReportScheduler::default();
        assert_eq!(s.state(), SchedulerState::Init);
        assert!(s.poll(0, &VelocityVector::ZERO, &[]).is_none());
        assert_eq!(s.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_first_frame_waits_one_interval() {
        let mut s = ReportScheduler::default();
        let frames = run(&mut s, 100, 120, &VelocityVector::ZERO, &[]);
        assert_eq!(frames[0].0, 108, "Translation is sent one interval after init");
        assert!(matches!(frames[0].1, ReportFrame::Translation(_)));
        assert_eq!(frames[1].0, 116);
        assert!(matches!(frames[1].1, ReportFrame::Rotation(_)));
    }

    // ==================== Zero Suppression Tests ====================

    #[test]
    fn test_idle_sends_three_zero_frames_per_category() {
        let mut s = ReportScheduler::default();
        let frames = run(&mut s, 0, 1000, &VelocityVector::ZERO, &[]);

        let translations = frames
            .iter()
            .filter(|(_, f)| matches!(f, ReportFrame::Translation(_)))
            .count();
        let rotations = frames
            .iter()
            .filter(|(_, f)| matches!(f, ReportFrame::Rotation(_)))
            .count();
        assert_eq!(translations, 3, "Exactly 3 zero translation frames");
        assert_eq!(rotations, 3, "Exactly 3 zero rotation frames");
        assert_eq!(frames.len(), 6);
        assert_eq!(s.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_nonzero_cycle_resets_suppression() {
        let mut s = ReportScheduler::default();
        run(&mut s, 0, 200, &VelocityVector::ZERO, &[]);

        // Single cycle of motion while idle
        let moving = VelocityVector { tx: 5, ..VelocityVector::ZERO };
        assert!(s.poll(200, &moving, &[]).is_none());
        assert_eq!(s.state(), SchedulerState::EmitTranslation);

        let frames = run(&mut s, 201, 400, &VelocityVector::ZERO, &[]);
        assert_eq!(frames[0], (201, ReportFrame::Translation([0, 0, 0])));
        assert!(matches!(frames[1].1, ReportFrame::Rotation(_)));
        // Frames carry the values of the cycle they are sent in, so the
        // zero counters stay saturated
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_motion_reports_values_and_restarts_zero_count() {
        let mut s = ReportScheduler::default();
        run(&mut s, 0, 200, &VelocityVector::ZERO, &[]);

        let moving = VelocityVector::from_array([10, -20, 30, 1, 2, 3]);
        let frames = run(&mut s, 200, 240, &moving, &[]);
        assert_eq!(frames[0].1, ReportFrame::Translation([10, -20, 30]));
        assert_eq!(frames[1].1, ReportFrame::Rotation([1, 2, 3]));

        let frames = run(&mut s, 240, 1000, &VelocityVector::ZERO, &[]);
        let zero_translations = frames
            .iter()
            .filter(|(_, f)| *f == ReportFrame::Translation([0, 0, 0]))
            .count();
        assert_eq!(zero_translations, 3, "Settle frames are resent after motion stops");
    }

    #[test]
    fn test_configurable_zero_frames() {
        let mut s = ReportScheduler::new(8, 1, None);
        let frames = run(&mut s, 0, 500, &VelocityVector::ZERO, &[]);
        assert_eq!(frames.len(), 2);
    }

    // ==================== Pacing Tests ====================

    #[test]
    fn test_at_most_one_frame_per_interval() {
        let mut s = ReportScheduler::default();
        let moving = VelocityVector::from_array([1, 1, 1, 1, 1, 1]);
        let frames = run(&mut s, 0, 1000, &moving, &[]);
        for pair in frames.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= 8, "Frames at {} and {}", pair[0].0, pair[1].0);
        }
        assert!(frames.len() >= 100, "Sustained motion keeps the channel busy");
    }

    #[test]
    fn test_translation_always_precedes_rotation() {
        let mut s = ReportScheduler::default();
        let moving = VelocityVector::from_array([1, 1, 1, 1, 1, 1]);
        let frames = run(&mut s, 0, 500, &moving, &[]);
        for (i, (_, frame)) in frames.iter().enumerate() {
            let expected_translation = i % 2 == 0;
            assert_eq!(matches!(frame, ReportFrame::Translation(_)), expected_translation);
        }
    }

    #[test]
    fn test_late_poll_catches_up_without_drift() {
        let mut s = ReportScheduler::default();
        let moving = VelocityVector::from_array([1, 1, 1, 1, 1, 1]);
        s.poll(0, &moving, &[]);
        s.poll(1, &moving, &[]);
        // Polled late: the frame goes out, the clock advances by one interval only
        assert!(s.poll(30, &moving, &[]).is_some());
        assert!(s.poll(31, &moving, &[]).is_some(), "Clock is still behind, rotation is due");
    }

    #[test]
    fn test_clock_wraparound() {
        let mut s = ReportScheduler::default();
        let moving = VelocityVector::from_array([1, 1, 1, 1, 1, 1]);
        let start = u32::MAX - 20;
        let frames = run(&mut s, start, 40, &moving, &[]);
        assert!(frames.len() >= 6, "Frames continue across the wrap: {:?}", frames);
        for pair in frames.windows(2) {
            assert!(pair[1].0.wrapping_sub(pair[0].0) >= 8);
        }
    }

    // ==================== Button Tests ====================

    #[test]
    fn test_button_change_while_idle() {
        let mut s = ReportScheduler::new(8, 3, Some(2));
        run(&mut s, 0, 200, &VelocityVector::ZERO, &NO_BUTTONS);

        let pressed = [0b0000_0001, 0];
        let frames = run(&mut s, 200, 300, &VelocityVector::ZERO, &pressed);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].1, ReportFrame::Buttons(vec![1, 0]));

        let frames = run(&mut s, 300, 400, &VelocityVector::ZERO, &NO_BUTTONS);
        assert_eq!(frames, vec![(301, ReportFrame::Buttons(vec![0, 0]))]);
    }

    #[test]
    fn test_buttons_follow_rotation_during_motion() {
        let mut s = ReportScheduler::new(8, 3, Some(2));
        let moving = VelocityVector::from_array([1, 1, 1, 1, 1, 1]);
        let frames = run(&mut s, 0, 40, &moving, &[0, 1]);
        let kinds: Vec<u8> = frames.iter().map(|(_, f)| f.report_id()).collect();
        assert_eq!(&kinds[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_no_button_reports_without_keys() {
        let mut s = ReportScheduler::new(8, 3, None);
        let frames = run(&mut s, 0, 500, &VelocityVector::ZERO, &[0xFF]);
        assert!(frames.iter().all(|(_, f)| !matches!(f, ReportFrame::Buttons(_))));
    }
}
