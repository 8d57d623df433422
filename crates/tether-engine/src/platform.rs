//! Process-wide engine bootstrap
//!
//! The first instance created in a process initializes the shared
//! [`Platform`]. The initializer runs under the cell's lock, so it runs
//! exactly once even when several threads create their first instances at
//! the same time. The platform is never torn down.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use once_cell::sync::OnceCell;

static PLATFORM: OnceCell<Platform> = OnceCell::new();
static BOOTSTRAPS: AtomicUsize = AtomicUsize::new(0);

/// Crate version reported across the C surface
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared state behind every instance in the process
#[derive(Debug)]
pub struct Platform {
    next_instance_id: AtomicU64,
}

impl Platform {
    fn bootstrap() -> Self {
        BOOTSTRAPS.fetch_add(1, Ordering::SeqCst);
        log::debug!("[tether] bootstrapping platform v{}", VERSION);
        Self {
            next_instance_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn next_instance_id(&self) -> u64 {
        self.next_instance_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of instances created so far in this process
    pub fn instances_created(&self) -> u64 {
        self.next_instance_id.load(Ordering::Relaxed) - 1
    }
}

/// Returns the platform, bootstrapping it on first use.
pub fn platform() -> &'static Platform {
    PLATFORM.get_or_init(Platform::bootstrap)
}

/// How many times the bootstrap has run (at most once per process)
pub fn bootstrap_count() -> usize {
    BOOTSTRAPS.load(Ordering::SeqCst)
}
