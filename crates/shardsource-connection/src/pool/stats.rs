//! Pool statistics types

use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of a connection pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolStats {
    /// Idle connections ready to be borrowed
    idle: usize,
    /// Connections currently borrowed
    active: usize,
    /// Callers waiting for a connection
    waiting: usize,
    /// Configured upper bound on connections
    max_size: usize,
}

impl PoolStats {
    pub fn new(idle: usize, active: usize, waiting: usize, max_size: usize) -> Self {
        Self {
            idle,
            active,
            waiting,
            max_size,
        }
    }

    /// Open connections, idle or borrowed
    pub fn total(&self) -> usize {
        self.idle + self.active
    }

    pub fn idle(&self) -> usize {
        self.idle
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn waiting(&self) -> usize {
        self.waiting
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Borrowed connections as a fraction of the pool's capacity (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            self.active as f64 / self.max_size as f64
        }
    }

    /// True when every permitted connection is borrowed
    pub fn is_exhausted(&self) -> bool {
        self.max_size > 0 && self.active >= self.max_size
    }
}
