use thiserror::Error;

use crate::gateway::GatewayError;
use crate::keystore::StoreError;

/// Coarse failure classes a caller can branch on without reading messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    KeyFormat,
    CredentialStore,
    TransactionBuild,
    Submission,
    Query,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::KeyFormat => write!(f, "key-format"),
            ErrorKind::CredentialStore => write!(f, "credential-store"),
            ErrorKind::TransactionBuild => write!(f, "transaction-build"),
            ErrorKind::Submission => write!(f, "submission"),
            ErrorKind::Query => write!(f, "query"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("invalid private key: {0}")]
    KeyFormat(String),
    #[error("credential store error: {0}")]
    CredentialStore(#[source] StoreError),
    #[error("failed to build {operation} transaction: {source}")]
    TransactionBuild {
        operation: &'static str,
        #[source]
        source: GatewayError,
    },
    #[error("failed to submit transaction {txid}: {source}")]
    Submission {
        txid: String,
        #[source]
        source: GatewayError,
    },
    #[error("{what} query failed: {source}")]
    Query {
        what: &'static str,
        #[source]
        source: GatewayError,
    },
}

impl ExecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecError::KeyFormat(_) => ErrorKind::KeyFormat,
            ExecError::CredentialStore(_) => ErrorKind::CredentialStore,
            ExecError::TransactionBuild { .. } => ErrorKind::TransactionBuild,
            ExecError::Submission { .. } => ErrorKind::Submission,
            ExecError::Query { .. } => ErrorKind::Query,
        }
    }
}

impl From<StoreError> for ExecError {
    // A bad key handed to the store is still a key problem, not a store problem.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::KeyFormat(msg) => ExecError::KeyFormat(msg),
            other => ExecError::CredentialStore(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable_per_variant() {
        assert_eq!(ExecError::KeyFormat("x".into()).kind(), ErrorKind::KeyFormat);
        assert_eq!(
            ExecError::CredentialStore(StoreError::WrongPassphrase).kind(),
            ErrorKind::CredentialStore
        );
        let build = ExecError::TransactionBuild {
            operation: "approve",
            source: GatewayError::Timeout,
        };
        assert_eq!(build.kind(), ErrorKind::TransactionBuild);
        let submit = ExecError::Submission {
            txid: "ab".into(),
            source: GatewayError::Network("reset".into()),
        };
        assert_eq!(submit.kind(), ErrorKind::Submission);
    }

    #[test]
    fn test_store_key_format_maps_to_key_format() {
        let err: ExecError = StoreError::KeyFormat("bad scalar".into()).into();
        assert_eq!(err.kind(), ErrorKind::KeyFormat);

        let err: ExecError = StoreError::WrongPassphrase.into();
        assert_eq!(err.kind(), ErrorKind::CredentialStore);
    }

    #[test]
    fn test_messages_carry_context() {
        let err = ExecError::TransactionBuild {
            operation: "burn",
            source: GatewayError::Rejected {
                code: "CONTRACT_VALIDATE_ERROR".into(),
                message: "balance is not sufficient".into(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("burn"));
        assert!(text.contains("balance is not sufficient"));
    }
}
