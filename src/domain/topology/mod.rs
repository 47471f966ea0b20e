//! In-memory graph of a deployment: programs, their ranked instances, the
//! nodes they run on, communication groups and the data connections between
//! groups.

pub mod application;
pub mod description;
pub mod entities;
pub mod ids;
pub mod routing;
pub mod snapshot;

pub use application::{
    Application, CommunicationTopology, DeploymentTopology, GroupTopology, ProgramCatalog,
};
pub use description::{TopologyDescription, TopologyError};
pub use entities::{
    CloudNode, DataConnection, Group, GroupMembership, Program, ProgramInstance, TopologyType,
};
pub use ids::{
    ConnectionId, GlobalRank, GroupId, InstanceId, LocalRank, MembershipId, NodeId, ProgramId,
};
pub use snapshot::TopologySnapshot;
