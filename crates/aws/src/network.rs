//! Network placement resolution for dispatched tasks.
//!
//! Subnets and security groups are resolved per dispatch, never cached:
//! an explicit list from configuration is used verbatim, otherwise the
//! account is queried for resources carrying the renovate allow tags.

use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::Filter;
use aws_sdk_ecs::types::{AssignPublicIp, AwsVpcConfiguration};

use crate::dispatch::DispatchError;

/// Tag filter marking subnets eligible for renovate task placement.
const SUBNET_ALLOW_TAG: &str = "tag:allow-renovate";
/// Tag filter marking security groups for renovate tasks.
const SECURITY_GROUP_TAG: &str = "tag:renovate";

/// Outcome of resolving one network resource kind.
///
/// The variants let callers and tests distinguish "the caller supplied a
/// list" from "discovery ran and found nothing".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The caller supplied the list; used verbatim, no discovery ran.
    Explicit(Vec<String>),
    /// Tag discovery produced the list.
    Discovered(Vec<String>),
    /// Nothing supplied and discovery found nothing.
    Empty,
}

impl Placement {
    /// The resolved resource IDs, empty for [`Placement::Empty`].
    pub fn ids(&self) -> &[String] {
        match self {
            Self::Explicit(ids) | Self::Discovered(ids) => ids,
            Self::Empty => &[],
        }
    }

    fn from_discovered(ids: Vec<String>) -> Self {
        if ids.is_empty() {
            Self::Empty
        } else {
            Self::Discovered(ids)
        }
    }

    /// Short-circuit for an explicitly configured list.
    fn from_explicit(explicit: Option<&[String]>) -> Option<Self> {
        explicit.map(|ids| Self::Explicit(ids.to_vec()))
    }
}

/// Errors from the EC2 resource lookups.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("subnet discovery failed: {0}")]
    DescribeSubnets(String),

    #[error("security group discovery failed: {0}")]
    DescribeSecurityGroups(String),
}

/// Resolve the subnets for a launch.
///
/// An explicit list short-circuits; otherwise every subnet tagged
/// `allow-renovate=true` is eligible.
pub async fn resolve_subnets(
    ec2: &aws_sdk_ec2::Client,
    explicit: Option<&[String]>,
) -> Result<Placement, NetworkError> {
    if let Some(placement) = Placement::from_explicit(explicit) {
        return Ok(placement);
    }

    let output = ec2
        .describe_subnets()
        .filters(
            Filter::builder()
                .name(SUBNET_ALLOW_TAG)
                .values("true")
                .build(),
        )
        .send()
        .await
        .map_err(|e| NetworkError::DescribeSubnets(format!("{}", DisplayErrorContext(&e))))?;

    let ids = output
        .subnets()
        .iter()
        .filter_map(|subnet| subnet.subnet_id().map(str::to_string))
        .collect();
    Ok(Placement::from_discovered(ids))
}

/// Resolve the security groups for a launch.
///
/// An explicit list short-circuits; otherwise every group tagged
/// `renovate=true` is eligible.
pub async fn resolve_security_groups(
    ec2: &aws_sdk_ec2::Client,
    explicit: Option<&[String]>,
) -> Result<Placement, NetworkError> {
    if let Some(placement) = Placement::from_explicit(explicit) {
        return Ok(placement);
    }

    let output = ec2
        .describe_security_groups()
        .filters(
            Filter::builder()
                .name(SECURITY_GROUP_TAG)
                .values("true")
                .build(),
        )
        .send()
        .await
        .map_err(|e| {
            NetworkError::DescribeSecurityGroups(format!("{}", DisplayErrorContext(&e)))
        })?;

    let ids = output
        .security_groups()
        .iter()
        .filter_map(|group| group.group_id().map(str::to_string))
        .collect();
    Ok(Placement::from_discovered(ids))
}

/// Assemble the awsvpc configuration for one launch.
///
/// A task cannot be placed without a subnet, so an empty subnet set is
/// fatal and no launch call is issued. An empty security-group set is
/// tolerated: with a public IP the target group defaults still apply;
/// without one the task may have no egress route, so a warning is
/// emitted and the launch proceeds.
pub fn awsvpc_configuration(
    subnets: &Placement,
    security_groups: &Placement,
    assign_public_ip: bool,
) -> Result<AwsVpcConfiguration, DispatchError> {
    let subnet_ids = subnets.ids();
    if subnet_ids.is_empty() {
        return Err(DispatchError::NoSubnetsAvailable);
    }

    let group_ids = security_groups.ids();
    if group_ids.is_empty() && !assign_public_ip {
        tracing::warn!(
            "No security groups resolved and public IP disabled; task may have no network egress",
        );
    }

    let assign = if assign_public_ip {
        AssignPublicIp::Enabled
    } else {
        AssignPublicIp::Disabled
    };

    AwsVpcConfiguration::builder()
        .set_subnets(Some(subnet_ids.to_vec()))
        .set_security_groups(if group_ids.is_empty() {
            None
        } else {
            Some(group_ids.to_vec())
        })
        .assign_public_ip(assign)
        .build()
        .map_err(|e| DispatchError::Launch(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_explicit_list_short_circuits_discovery() {
        let explicit = ids(&["subnet-a", "subnet-b"]);
        assert_eq!(
            Placement::from_explicit(Some(&explicit)),
            Some(Placement::Explicit(explicit.clone())),
        );
        assert_eq!(Placement::from_explicit(None), None);
    }

    #[test]
    fn test_empty_discovery_is_distinguishable_from_explicit_empty() {
        assert_eq!(Placement::from_discovered(Vec::new()), Placement::Empty);
        assert_eq!(
            Placement::from_explicit(Some(&[])),
            Some(Placement::Explicit(Vec::new())),
        );
    }

    #[test]
    fn test_no_subnets_is_fatal() {
        let result = awsvpc_configuration(&Placement::Empty, &Placement::Empty, true);
        assert_matches!(result, Err(DispatchError::NoSubnetsAvailable));

        // An intentionally empty explicit list still cannot place a task.
        let result = awsvpc_configuration(
            &Placement::Explicit(Vec::new()),
            &Placement::Empty,
            true,
        );
        assert_matches!(result, Err(DispatchError::NoSubnetsAvailable));
    }

    #[test]
    fn test_public_ip_tolerates_missing_security_groups() {
        let config = awsvpc_configuration(
            &Placement::Discovered(ids(&["subnet-a"])),
            &Placement::Empty,
            true,
        )
        .expect("launch must proceed");

        assert_eq!(config.assign_public_ip(), Some(&AssignPublicIp::Enabled));
        assert!(config.security_groups().is_empty());
        assert_eq!(config.subnets(), ids(&["subnet-a"]).as_slice());
    }

    #[test]
    fn test_private_launch_without_security_groups_still_proceeds() {
        let config = awsvpc_configuration(
            &Placement::Explicit(ids(&["subnet-a", "subnet-b"])),
            &Placement::Empty,
            false,
        )
        .expect("launch must proceed despite the warning");

        assert_eq!(config.assign_public_ip(), Some(&AssignPublicIp::Disabled));
        assert!(config.security_groups().is_empty());
    }

    #[test]
    fn test_resolved_security_groups_are_attached() {
        let config = awsvpc_configuration(
            &Placement::Discovered(ids(&["subnet-a"])),
            &Placement::Discovered(ids(&["sg-1", "sg-2"])),
            false,
        )
        .expect("launch must proceed");

        assert_eq!(config.security_groups(), ids(&["sg-1", "sg-2"]).as_slice());
    }
}
