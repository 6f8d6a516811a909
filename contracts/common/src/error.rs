use soroban_sdk::contracterror;

/// Errors raised by every Saver contract.
///
/// Codes are stable: a venue failing with `InsufficientLiquidity` surfaces in
/// the adapter and then in the vault with the same value.
///
/// | Class          | Variants                                                   |
/// |----------------|------------------------------------------------------------|
/// | Configuration  | 4-9, 17, 18, 19                                            |
/// | Lifecycle      | 1, 2, 10                                                   |
/// | Authorization  | 3                                                          |
/// | Liquidity      | 11, 12                                                     |
/// | Arithmetic     | 13, 14                                                     |
/// | Cross-contract | 15                                                         |
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum SaverError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    LengthMismatch = 4,
    DuplicateAdapter = 5,
    InvalidWeightSum = 6,
    NegativeWeight = 7,
    PairNotFound = 8,
    UnknownAdapter = 9,
    Paused = 10,
    InsufficientLiquidity = 11,
    InsufficientBalance = 12,
    ArithmeticOverflow = 13,
    InvalidAmount = 14,
    ExternalCallFailed = 15,
    RebalancerNotSet = 16,
    EmptyAllocation = 17,
    InvalidRateModel = 18,
    EmptyAdapterSet = 19,
}

/// Flattens the result of a generated `try_*` client call.
///
/// A callee that failed with a `SaverError` keeps its code; a callee that
/// trapped, or returned a value that does not decode, becomes
/// `ExternalCallFailed`.
pub fn settle<T, C, I>(
    result: Result<Result<T, C>, Result<SaverError, I>>,
) -> Result<T, SaverError> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Err(Ok(err)) => Err(err),
        Ok(Err(_)) | Err(Err(_)) => Err(SaverError::ExternalCallFailed),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_settle_keeps_callee_error() {
        let failed: Result<Result<i128, ()>, Result<SaverError, ()>> =
            Err(Ok(SaverError::InsufficientLiquidity));
        assert_eq!(settle(failed), Err(SaverError::InsufficientLiquidity));
    }

    #[test]
    fn test_settle_maps_traps() {
        let trapped: Result<Result<i128, ()>, Result<SaverError, ()>> = Err(Err(()));
        assert_eq!(settle(trapped), Err(SaverError::ExternalCallFailed));

        let undecodable: Result<Result<i128, ()>, Result<SaverError, ()>> = Ok(Err(()));
        assert_eq!(settle(undecodable), Err(SaverError::ExternalCallFailed));
    }

    #[test]
    fn test_settle_passes_value() {
        let ok: Result<Result<i128, ()>, Result<SaverError, ()>> = Ok(Ok(42));
        assert_eq!(settle(ok), Ok(42));
    }
}
