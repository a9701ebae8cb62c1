//! Role-aware logging macros.
//!
//! Messages that describe the whole process group are emitted once, by the
//! coordinator. Workers repeat the same work and log it at debug level.

/// Log at info on the coordinator, debug on workers.
macro_rules! group_info {
    ($role:expr, $($arg:tt)+) => {
        if $role.is_coordinator() {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// Log at warn on the coordinator, debug on workers.
macro_rules! group_warn {
    ($role:expr, $($arg:tt)+) => {
        if $role.is_coordinator() {
            tracing::warn!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}
