//! Folding of results into the signed status model used on the wire.
//!
//! Transports report every callback outcome as a single signed integer: a non-negative count on
//! success, a negative code on failure.

use crate::error::{IioError, Result, FAILURE};

pub fn from_result(res: Result<usize>) -> isize {
    match res {
        Ok(count) => isize::try_from(count).unwrap_or(FAILURE as isize),
        Err(err) => err.errno() as isize,
    }
}

/// Whether a folded status reports a failure.
pub fn is_failure(status: isize) -> bool {
    status < 0
}

impl From<IioError> for isize {
    fn from(err: IioError) -> Self {
        err.errno() as isize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EINVAL;

    #[test]
    fn success_passes_count_through() {
        assert_eq!(from_result(Ok(0)), 0);
        assert_eq!(from_result(Ok(4096)), 4096);
        assert!(!is_failure(from_result(Ok(1))));
    }

    #[test]
    fn failures_are_negative() {
        let status = from_result(Err(IioError::InvalidArgument("empty channel mask")));
        assert_eq!(status, EINVAL as isize);
        assert!(is_failure(status));
        assert_eq!(isize::from(IioError::RegistryFull { capacity: 0 }), FAILURE as isize);
    }
}
