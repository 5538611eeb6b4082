//! Stacks joining the AWS private network and the simulated on-premises
//! network.

use crate::error::Result;
use crate::stack::Stack;

use super::aws_network::aws_private_network;
use super::onprem::onprem_network;
use super::StackSettings;

/// Prefix of logical ids on the AWS side.
pub const AWS_PREFIX: &str = "AWS";

/// Prefix of logical ids on the on-premises side.
pub const ONPREM_PREFIX: &str = "OnPrem";

/// Both networks, with the routers ready to be wired up by hand.
pub fn hybrid_stack(settings: &StackSettings) -> Result<Stack> {
    build(
        settings,
        "Hybrid architecture: AWS private network and simulated on-premises network",
        false,
    )
}

/// Both networks, with a customer gateway declared for each router.
pub fn site_to_site_vpn_stack(settings: &StackSettings) -> Result<Stack> {
    build(
        settings,
        "Site-to-site VPN: AWS private network and simulated on-premises network with customer gateways",
        true,
    )
}

fn build(settings: &StackSettings, description: &str, vpn: bool) -> Result<Stack> {
    let plan = settings.hybrid_cidrs.parse()?;
    let mut stack = settings.empty_stack(description);
    aws_private_network(&mut stack.scope(AWS_PREFIX), &plan)?;
    onprem_network(&mut stack.scope(ONPREM_PREFIX), &plan, vpn)?;
    Ok(stack)
}
