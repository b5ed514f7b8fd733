//! Keep-the-screen-awake capability.
//!
//! Hosts without support use [`NoWakeLock`]; its refusal is not an error
//! worth showing anyone.

use crate::error::WakeLockError;

pub trait WakeLock {
    /// Acquire the lock. Acquiring twice is allowed.
    fn request(&mut self) -> Result<(), WakeLockError>;

    /// Release the lock if held. Never fails.
    fn release(&mut self);
}

/// A host with no wake-lock support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWakeLock;

impl WakeLock for NoWakeLock {
    fn request(&mut self) -> Result<(), WakeLockError> {
        Err(WakeLockError::Unsupported)
    }

    fn release(&mut self) {}
}
