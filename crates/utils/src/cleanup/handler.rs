//! Resource cleanup and error recovery
//!
//! RAII guards make sure workspaces are removed on every exit path. Each
//! live guard is also recorded in a process-wide registry so that a signal
//! or a panic can still clean up resources whose owners never get to drop.

use codeon_core::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Global cleanup registry for tracking resources
static CLEANUP_REGISTRY: Lazy<Arc<Mutex<CleanupRegistry>>> =
    Lazy::new(|| Arc::new(Mutex::new(CleanupRegistry::new())));

/// Registry for tracking resources that need cleanup
pub struct CleanupRegistry {
    resources: HashMap<u64, CleanupResource>,
    next_id: u64,
}

/// A resource that needs cleanup
struct CleanupResource {
    description: String,
    cleanup_fn: Box<dyn FnOnce() + Send>,
}

impl CleanupRegistry {
    fn new() -> Self {
        Self {
            resources: HashMap::with_capacity(16),
            next_id: 0,
        }
    }

    fn register<F>(&mut self, description: String, cleanup_fn: F) -> u64
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        self.resources.insert(
            id,
            CleanupResource {
                description,
                cleanup_fn: Box::new(cleanup_fn),
            },
        );

        id
    }

    fn unregister(&mut self, id: u64) {
        self.resources.remove(&id);
    }

    fn cleanup_all(&mut self) {
        let resources: Vec<_> = self.resources.drain().collect();
        for (_, resource) in resources {
            tracing::debug!(resource = %resource.description, "emergency cleanup");
            (resource.cleanup_fn)();
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.resources.len()
    }
}

/// Record a cleanup action; `None` if the registry lock is poisoned
pub(crate) fn register_cleanup<F>(description: String, cleanup_fn: F) -> Option<u64>
where
    F: FnOnce() + Send + 'static,
{
    match CLEANUP_REGISTRY.lock() {
        Ok(mut registry) => Some(registry.register(description, cleanup_fn)),
        Err(e) => {
            tracing::error!("Failed to lock cleanup registry: {e}");
            None
        }
    }
}

/// Forget a cleanup action whose owner released the resource normally
pub(crate) fn unregister_cleanup(id: u64) {
    if let Ok(mut registry) = CLEANUP_REGISTRY.lock() {
        registry.unregister(id);
    } else {
        tracing::error!("Failed to lock cleanup registry for unregister");
    }
}

/// RAII guard for temporary directories
pub struct TempDirGuard {
    path: PathBuf,
    registry_id: Option<u64>,
}

impl TempDirGuard {
    /// Create the directory and take ownership of it
    ///
    /// Fails if the directory already exists, so two guards never share one.
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::file_system(parent.to_path_buf(), "create workspace root", e)
            })?;
        }
        fs::create_dir(&path)
            .map_err(|e| Error::file_system(path.clone(), "create temporary directory", e))?;

        let path_clone = path.clone();
        let registry_id = register_cleanup(
            format!("temporary directory: {}", path.display()),
            move || {
                let _ = fs::remove_dir_all(&path_clone);
            },
        );

        Ok(Self { path, registry_id })
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if let Some(id) = self.registry_id.take() {
            unregister_cleanup(id);
        }

        if self.path.exists() {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                tracing::warn!(
                    "Failed to remove temporary directory {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// Initialize cleanup handling (called once at startup)
pub fn init_cleanup_handler() {
    #[cfg(unix)]
    {
        use signal_hook::{consts::SIGINT, consts::SIGTERM, iterator::Signals};
        use std::thread;

        let registry = Arc::downgrade(&CLEANUP_REGISTRY);

        thread::spawn(move || {
            let mut signals = match Signals::new([SIGINT, SIGTERM]) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!("Failed to register signal handlers: {e}");
                    return;
                }
            };

            #[allow(clippy::never_loop)]
            for sig in signals.forever() {
                tracing::info!("Received signal {sig}, cleaning up resources...");

                if let Some(registry) = registry.upgrade() {
                    if let Ok(mut reg) = registry.lock() {
                        reg.cleanup_all();
                    } else {
                        tracing::error!("Failed to lock cleanup registry in signal handler");
                    }
                }

                std::process::exit(128 + sig);
            }
        });
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        cleanup_all_resources();
        original_hook(panic_info);
    }));
}

/// Clean up all registered resources (for emergency cleanup)
pub fn cleanup_all_resources() {
    if let Ok(mut registry) = CLEANUP_REGISTRY.lock() {
        registry.cleanup_all();
    } else {
        tracing::error!("Failed to lock cleanup registry for cleanup_all_resources");
    }
}
