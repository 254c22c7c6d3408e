use ledger_types::MiningError;
use serde::Serialize;
use store::StoreError;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The submitted body could not be turned into a transaction.
    #[error("malformed transaction body: {reason}")]
    MalformedTransaction { reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mining(#[from] MiningError),
}

/// Structured error payload for the request-handling surface: a technical
/// message for developers and a separate message safe to put in front of a
/// user.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub developer_message: String,
    pub user_message: String,
}

impl Failure {
    /// Builds the payload, logging it before it is handed back.
    pub fn new(developer_message: impl Into<String>, user_message: impl Into<String>) -> Self {
        let failure = Self {
            developer_message: developer_message.into(),
            user_message: user_message.into(),
        };
        warn!(developer_message = %failure.developer_message, "request failed");
        failure
    }
}

impl From<&NodeError> for Failure {
    fn from(error: &NodeError) -> Self {
        match error {
            NodeError::MalformedTransaction { reason } => Self::new(
                format!(
                    "Could not parse the body of the request into a transaction. \
                     Check the syntax: {{ \"payload\": \"hello world\" }}. Error: {reason}"
                ),
                "We couldn't process your transaction.",
            ),
            NodeError::Store(error) => Self::new(
                format!("Couldn't access the stored blockchain. Error: {error}"),
                "Something went wrong on our end, please try again later.",
            ),
            NodeError::Mining(error) => Self::new(
                format!("Mining gave up. Error: {error}"),
                "We couldn't mine the block, please try again.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_failure_carries_both_messages() {
        let errors = [
            NodeError::MalformedTransaction {
                reason: "no payload".into(),
            },
            NodeError::Store(std::io::Error::other("disk gone").into()),
            NodeError::Mining(MiningError::NonceExhausted),
        ];
        for error in &errors {
            let failure = Failure::from(error);
            assert!(!failure.developer_message.is_empty());
            assert!(!failure.user_message.is_empty());
            assert_ne!(failure.developer_message, failure.user_message);
        }
    }

    #[test]
    fn malformed_transaction_failure_names_the_expected_syntax() {
        let failure = Failure::from(&NodeError::MalformedTransaction {
            reason: "empty body".into(),
        });
        assert!(failure.developer_message.contains("payload"));
        assert!(failure.developer_message.contains("empty body"));
    }
}
