//! Caller identity as reported by the provider's "who am I" endpoint.

use serde::{Deserialize, Serialize};

/// The identity an AWS session resolves to.
///
/// Field renames match the JSON shape of `sts get-caller-identity`, so this
/// type deserializes the CLI/SDK response directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsIdentity {
    /// 12-digit AWS account number.
    #[serde(rename = "Account")]
    pub account_id: String,
    /// ARN of the calling user or role.
    #[serde(rename = "Arn")]
    pub user_arn: String,
    /// Unique identifier of the calling entity.
    #[serde(rename = "UserId")]
    pub user_id: String,
}
