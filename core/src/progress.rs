use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display)]
pub enum Phase {
    #[display(fmt = "generating")]
    Generating,
    #[display(fmt = "placing")]
    Placing,
    #[display(fmt = "validating")]
    Validating,
    #[display(fmt = "complete")]
    Complete,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Progress {
    pub phase: Phase,
    /// In `0..=100`.
    pub percent: u8,
    pub message: String,
}

impl Progress {
    pub fn new(phase: Phase, percent: f64, message: impl Into<String>) -> Self {
        Self {
            phase,
            percent: percent.max(0.0).min(100.0).round() as u8,
            message: message.into(),
        }
    }
}

/// Shared flag aborting a running generation. Clones observe the same flag.
#[derive(Debug, Default, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[test]
fn test_progress_percent_is_clamped() {
    assert_eq!(Progress::new(Phase::Placing, 42.4, "x").percent, 42);
    assert_eq!(Progress::new(Phase::Placing, 180.0, "x").percent, 100);
    assert_eq!(Progress::new(Phase::Placing, -3.0, "x").percent, 0);
}

#[test]
fn test_cancel_token_is_shared() {
    let token = CancelToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());
    token.cancel();
    assert!(clone.is_cancelled());
}
