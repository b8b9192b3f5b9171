//! Sequence traversal: five direction modes over one skip-aware lookup.

use crate::dsp::consts::NUM_STEPS;
use crate::dsp::seq::table::{SequenceWindow, StepTable};
use crate::types::Direction;

/// Direction of a single lookup through the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Heading {
    #[default]
    Up,
    Down,
}

impl Heading {
    /// Next window offset, wrapping within `len`.
    pub fn step(self, offset: usize, len: usize) -> usize {
        match self {
            Heading::Up => (offset + 1) % len,
            Heading::Down => (offset + len - 1) % len,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
        }
    }

    /// True if moving from `before` to `after` crossed the window end.
    fn crossed(self, before: usize, after: usize) -> bool {
        match self {
            Heading::Up => after < before,
            Heading::Down => after > before,
        }
    }
}

/// Result of a skip-aware lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    /// Slot index of the next non-skip step, or the plain neighbour when
    /// `all_skip` is set.
    pub slot: usize,
    pub all_skip: bool,
}

/// Scan from `offset` in `heading` for the next non-skip slot.
pub fn find_playable(
    table: &StepTable,
    window: &SequenceWindow,
    offset: usize,
    heading: Heading,
) -> Lookup {
    let len = window.len();
    let mut rel = offset;
    for _ in 0..len {
        rel = heading.step(rel, len);
        let slot = window.slot_at(rel);
        if table.is_playable(slot) {
            return Lookup {
                slot,
                all_skip: false,
            };
        }
    }
    Lookup {
        slot: window.slot_at(heading.step(offset, len)),
        all_skip: true,
    }
}

/// Whether any slot of the window is not Skip.
pub fn any_playable(table: &StepTable, window: &SequenceWindow) -> bool {
    window.slots().any(|slot| table.is_playable(slot))
}

/// Outcome of one step-advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub step: usize,
    /// Traversal crossed the window boundary (end of cycle).
    pub wrapped: bool,
    /// No gate may fire for this step.
    pub muted: bool,
}

#[derive(Debug, Clone)]
pub struct SequenceNavigator {
    current_step: usize,
    ping: Heading,
    drunk: Heading,
    replay_current: bool,
}

impl Default for SequenceNavigator {
    fn default() -> Self {
        Self {
            current_step: 0,
            ping: Heading::Up,
            drunk: Heading::Up,
            replay_current: false,
        }
    }
}

impl SequenceNavigator {
    /// Compute and take the next step.
    ///
    /// With replay armed the current step is re-sounded once instead of
    /// advancing, and the flag is consumed.
    pub fn advance(
        &mut self,
        table: &StepTable,
        window: &SequenceWindow,
        direction: Direction,
        rng: &mut fastrand::Rng,
    ) -> Transition {
        let before = window.offset_of(self.current_step);

        let (step, wrapped, all_skip) = if self.replay_current {
            self.replay_current = false;
            let step = self.current_step;
            (step, false, !table.is_playable(step))
        } else {
            match direction {
                Direction::Forward => Self::linear(table, window, before, Heading::Up),
                Direction::Backward => Self::linear(table, window, before, Heading::Down),
                Direction::PingPong => self.ping_pong(table, window, before),
                Direction::Random => Self::random(table, window, before, rng),
                Direction::Drunk => self.drunk(table, window, before, rng),
            }
        };

        self.current_step = step;

        let muted = match direction {
            Direction::Forward | Direction::Backward => all_skip,
            _ => !any_playable(table, window),
        };

        Transition {
            step,
            wrapped,
            muted,
        }
    }

    fn linear(
        table: &StepTable,
        window: &SequenceWindow,
        before: usize,
        heading: Heading,
    ) -> (usize, bool, bool) {
        let found = find_playable(table, window, before, heading);
        let after = window.offset_of(found.slot);
        (found.slot, heading.crossed(before, after), found.all_skip)
    }

    // The wrap test compares raw offsets, so a candidate reached by skipping
    // across the boundary also counts as a bounce.
    fn ping_pong(
        &mut self,
        table: &StepTable,
        window: &SequenceWindow,
        before: usize,
    ) -> (usize, bool, bool) {
        let first = find_playable(table, window, before, self.ping);
        let would_wrap = self.ping.crossed(before, window.offset_of(first.slot));
        if !first.all_skip && !would_wrap {
            return (first.slot, false, false);
        }

        self.ping = self.ping.reversed();
        let second = find_playable(table, window, before, self.ping);
        (second.slot, true, second.all_skip)
    }

    fn random(
        table: &StepTable,
        window: &SequenceWindow,
        before: usize,
        rng: &mut fastrand::Rng,
    ) -> (usize, bool, bool) {
        let mut pool = [0usize; NUM_STEPS];
        let mut n = 0;
        for slot in window.slots().filter(|&s| table.is_playable(s)) {
            pool[n] = slot;
            n += 1;
        }

        if n > 0 {
            (pool[rng.usize(..n)], false, false)
        } else {
            let found = find_playable(table, window, before, Heading::Up);
            (found.slot, false, true)
        }
    }

    fn drunk(
        &mut self,
        table: &StepTable,
        window: &SequenceWindow,
        before: usize,
        rng: &mut fastrand::Rng,
    ) -> (usize, bool, bool) {
        self.drunk = if rng.bool() { Heading::Down } else { Heading::Up };

        let mut found = find_playable(table, window, before, self.drunk);
        if found.all_skip {
            found = find_playable(table, window, before, self.drunk.reversed());
        }

        let last = window.len() - 1;
        let after = window.offset_of(found.slot);
        let wrapped = (before == 0 && after == last) || (before == last && after == 0);
        (found.slot, wrapped, found.all_skip)
    }

    /// Keep the current step inside a window that may have shrunk.
    pub fn fold_into(&mut self, window: &SequenceWindow) {
        self.current_step = window.fold(self.current_step);
    }

    pub fn set_current(&mut self, step: usize) {
        self.current_step = step & (NUM_STEPS - 1);
    }

    /// Sound the current step again on the next step-advance.
    pub fn arm_replay(&mut self) {
        self.replay_current = true;
    }

    /// Forget ping-pong and drunk-walk headings.
    pub fn reset_auxiliary(&mut self) {
        self.ping = Heading::Up;
        self.drunk = Heading::Up;
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn replay_armed(&self) -> bool {
        self.replay_current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnumParam, StepMode};

    fn table_with(modes: &[(usize, StepMode)]) -> StepTable {
        let mut table = StepTable::default();
        for &(i, mode) in modes {
            table.slot_mut(i).mode = mode;
        }
        table
    }

    fn walk(
        nav: &mut SequenceNavigator,
        table: &StepTable,
        window: &SequenceWindow,
        direction: Direction,
        n: usize,
    ) -> Vec<Transition> {
        let mut rng = fastrand::Rng::with_seed(7);
        (0..n)
            .map(|_| nav.advance(table, window, direction, &mut rng))
            .collect()
    }

    #[test]
    fn forward_skips_and_wraps_once_per_cycle() {
        let table = table_with(&[(3, StepMode::Skip)]);
        let window = SequenceWindow::new(2, 4);
        let mut nav = SequenceNavigator::default();
        nav.set_current(2);
        let t = walk(&mut nav, &table, &window, Direction::Forward, 6);
        let steps: Vec<_> = t.iter().map(|t| t.step).collect();
        assert_eq!(steps, vec![4, 5, 2, 4, 5, 2]);
        let wraps: Vec<_> = t.iter().map(|t| t.wrapped).collect();
        assert_eq!(wraps, vec![false, false, true, false, false, true]);
        assert!(t.iter().all(|t| !t.muted));
    }

    #[test]
    fn backward_wraps_past_start() {
        let table = StepTable::default();
        let window = SequenceWindow::new(0, 3);
        let mut nav = SequenceNavigator::default();
        let t = walk(&mut nav, &table, &window, Direction::Backward, 3);
        let steps: Vec<_> = t.iter().map(|t| t.step).collect();
        assert_eq!(steps, vec![2, 1, 0]);
        assert!(t[0].wrapped);
        assert!(!t[1].wrapped);
    }

    #[test]
    fn all_skip_advances_muted() {
        let modes: Vec<_> = (0..16).map(|i| (i, StepMode::Skip)).collect();
        let table = table_with(&modes);
        let window = SequenceWindow::new(0, 4);
        for direction in Direction::ALL.iter().copied() {
            let mut nav = SequenceNavigator::default();
            let t = walk(&mut nav, &table, &window, direction, 4);
            assert!(t.iter().all(|t| t.muted), "{direction:?}");
            assert!(t.iter().all(|t| window.contains(t.step)));
        }

        let mut nav = SequenceNavigator::default();
        let t = walk(&mut nav, &table, &window, Direction::Forward, 4);
        let steps: Vec<_> = t.iter().map(|t| t.step).collect();
        assert_eq!(steps, vec![1, 2, 3, 0]);
    }

    #[test]
    fn ping_pong_bounces_at_both_ends() {
        let table = StepTable::default();
        let window = SequenceWindow::new(0, 4);
        let mut nav = SequenceNavigator::default();
        let t = walk(&mut nav, &table, &window, Direction::PingPong, 7);
        let steps: Vec<_> = t.iter().map(|t| t.step).collect();
        assert_eq!(steps, vec![1, 2, 3, 2, 1, 0, 1]);
        let wraps: Vec<_> = t.iter().map(|t| t.wrapped).collect();
        assert_eq!(
            wraps,
            vec![false, false, false, true, false, false, true]
        );
    }

    #[test]
    fn ping_pong_single_step_window() {
        let table = StepTable::default();
        let window = SequenceWindow::new(5, 1);
        let mut nav = SequenceNavigator::default();
        nav.set_current(5);
        let t = walk(&mut nav, &table, &window, Direction::PingPong, 3);
        assert!(t.iter().all(|t| t.step == 5));
    }

    #[test]
    fn random_only_picks_playable_slots() {
        let table = table_with(&[(1, StepMode::Skip), (2, StepMode::Skip), (4, StepMode::Mute)]);
        let window = SequenceWindow::new(0, 6);
        let mut nav = SequenceNavigator::default();
        let t = walk(&mut nav, &table, &window, Direction::Random, 500);
        let mut seen = [0usize; 16];
        for tr in &t {
            assert!(!tr.wrapped);
            assert!(!tr.muted);
            seen[tr.step] += 1;
        }
        assert_eq!(seen[1] + seen[2], 0);
        for slot in [0, 3, 4, 5] {
            // 125 expected per slot
            assert!(seen[slot] > 60, "slot {slot} seen {}", seen[slot]);
        }
    }

    #[test]
    fn drunk_moves_to_a_neighbour() {
        let table = StepTable::default();
        let window = SequenceWindow::new(0, 8);
        let mut nav = SequenceNavigator::default();
        let mut prev = nav.current_step();
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..200 {
            let t = nav.advance(&table, &window, Direction::Drunk, &mut rng);
            let before = window.offset_of(prev);
            let after = window.offset_of(t.step);
            let dist = (before as isize - after as isize).rem_euclid(8);
            assert!(dist == 1 || dist == 7);
            let crossed = (before == 0 && after == 7) || (before == 7 && after == 0);
            assert_eq!(t.wrapped, crossed);
            prev = t.step;
        }
    }

    #[test]
    fn replay_sounds_current_step_once() {
        let table = StepTable::default();
        let window = SequenceWindow::default();
        let mut nav = SequenceNavigator::default();
        nav.set_current(0);
        nav.arm_replay();
        let t = walk(&mut nav, &table, &window, Direction::Forward, 3);
        let steps: Vec<_> = t.iter().map(|t| t.step).collect();
        assert_eq!(steps, vec![0, 1, 2]);
        assert!(!nav.replay_armed());
    }

    #[test]
    fn replay_of_skip_slot_is_muted_in_linear_modes() {
        let table = table_with(&[(0, StepMode::Skip)]);
        let window = SequenceWindow::new(0, 4);
        let mut nav = SequenceNavigator::default();
        nav.arm_replay();
        let t = walk(&mut nav, &table, &window, Direction::Forward, 1);
        assert!(t[0].muted);
        assert_eq!(t[0].step, 0);

        let mut nav = SequenceNavigator::default();
        nav.arm_replay();
        let t = walk(&mut nav, &table, &window, Direction::Random, 1);
        assert!(!t[0].muted, "other slots are playable");
    }

    #[test]
    fn fold_into_shrunken_window() {
        let mut nav = SequenceNavigator::default();
        nav.set_current(9);
        nav.fold_into(&SequenceWindow::new(2, 3));
        assert_eq!(nav.current_step(), 3);
    }
}
