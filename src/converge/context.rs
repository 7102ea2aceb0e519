//! Per-run state shared by the driver, prober, and validator.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::backends::BackendSet;
use crate::config::settings::Identity;
use crate::logging::Log;
use crate::platform::PlatformContext;

/// Everything the driver, prober and validator need for one run.
#[derive(Debug)]
pub struct Context {
    /// Detected platform.
    pub platform: Arc<PlatformContext>,
    /// Package-manager adapters for this platform.
    pub backends: BackendSet,
    /// Logger for output and the run log.
    pub log: Arc<dyn Log>,
    /// Preview changes without applying them.
    pub dry_run: bool,
    /// Identity used by template targets.
    pub identity: Identity,
    /// Raised by the interrupt handler.
    pub interrupt: Arc<AtomicBool>,
}

impl Context {
    /// Create a context with no identity and a fresh interrupt flag.
    #[must_use]
    pub fn new(platform: Arc<PlatformContext>, backends: BackendSet, log: Arc<dyn Log>) -> Self {
        Self {
            platform,
            backends,
            log,
            dry_run: false,
            identity: Identity::default(),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the identity for template targets.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Share an interrupt flag with the signal handler and executor.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Whether the operator has asked the run to stop.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::SeqCst)
    }
}
