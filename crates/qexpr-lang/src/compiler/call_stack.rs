//! Call depth tracking for compiled callables.
//!
//! Invocations made by compiled code run one level deeper than their caller;
//! an invocation from host code starts at depth 0.

use crate::error::runtime::RuntimeError;

/// Default maximum call depth.
pub const DEFAULT_MAX_CALL_DEPTH: u32 = 512;

/// Fails with [`RuntimeError::RecursionLimit`] once `depth` reaches `max_depth`.
///
/// # Example
///
/// ```rust,ignore
/// assert!(check_call_depth(0, DEFAULT_MAX_CALL_DEPTH).is_ok());
/// assert!(check_call_depth(512, 512).is_err());
/// ```
#[inline]
pub(crate) fn check_call_depth(depth: u32, max_depth: u32) -> Result<(), RuntimeError> {
    if depth < max_depth {
        Ok(())
    } else {
        Err(RuntimeError::RecursionLimit(max_depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1, true)]
    #[case(511, DEFAULT_MAX_CALL_DEPTH, true)]
    #[case(512, DEFAULT_MAX_CALL_DEPTH, false)]
    #[case(0, 0, false)]
    fn test_check_call_depth(#[case] depth: u32, #[case] max_depth: u32, #[case] ok: bool) {
        assert_eq!(check_call_depth(depth, max_depth).is_ok(), ok);
    }
}
