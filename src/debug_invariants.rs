use crate::extrema_error::ExtremaError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), ExtremaError>;
}

/// Helper macro to run a fallible check and panic on error when invariant
/// checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

/// Assert an access precondition when bounds checking is compiled in.
///
/// Expands to nothing in release builds without `check-invariants`, so the
/// hot scan loops stay branch-free.
#[macro_export]
macro_rules! check_access {
    ($cond:expr, $($arg:tt)+) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        assert!($cond, $($arg)+);
    };
}
