use crate::dsp::seq::table::SequenceWindow;
use crate::dsp::utils::SchmittTrigger;

/// Deferred move to the window start, applied at the next tick boundary
/// (or at the end of the sample when no tick fires).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetRequest {
    pub target_step: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ResetController {
    trigger: SchmittTrigger,
    pending: Option<ResetRequest>,
}

impl ResetController {
    /// Feed the reset input. On a rising edge records a request targeting
    /// the current window start and returns true.
    pub fn detect(&mut self, voltage: f32, window: &SequenceWindow) -> bool {
        if !self.trigger.process(voltage) {
            return false;
        }
        self.pending = Some(ResetRequest {
            target_step: window.start(),
        });
        true
    }

    pub fn take(&mut self) -> Option<ResetRequest> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending request.
    pub fn clear(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_targets_window_start() {
        let mut r = ResetController::default();
        let w = SequenceWindow::new(4, 8);
        assert!(!r.detect(0.0, &w));
        assert!(r.detect(5.0, &w));
        assert!(!r.detect(5.0, &w), "held high is one edge");
        assert!(r.is_pending());
        assert_eq!(r.take(), Some(ResetRequest { target_step: 4 }));
        assert_eq!(r.take(), None);
    }

    #[test]
    fn retrigger_retargets() {
        let mut r = ResetController::default();
        r.detect(0.0, &SequenceWindow::new(0, 16));
        r.detect(10.0, &SequenceWindow::new(0, 16));
        r.detect(0.0, &SequenceWindow::new(0, 16));
        r.detect(10.0, &SequenceWindow::new(9, 2));
        assert_eq!(r.take().map(|req| req.target_step), Some(9));
    }
}
