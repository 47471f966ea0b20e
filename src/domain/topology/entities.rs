use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{
    ConnectionId, GlobalRank, GroupId, Identity, InstanceId, LocalRank, MembershipId, NodeId,
    ProgramId,
};

/// A named program of the catalog. Owns its instances.
#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) id: ProgramId,
    pub(crate) name: String,
    pub(crate) instances: BTreeSet<InstanceId>,
    pub(crate) identity: Identity,
}

impl Program {
    #[must_use]
    pub const fn id(&self) -> ProgramId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instances(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances.iter().copied()
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.identity.get()
    }
}

/// One running copy of a program, identified by its global rank.
#[derive(Debug, Clone)]
pub struct ProgramInstance {
    pub(crate) id: InstanceId,
    pub(crate) global_rank: GlobalRank,
    pub(crate) program: ProgramId,
    pub(crate) node: Option<NodeId>,
    pub(crate) memberships: BTreeSet<MembershipId>,
    pub(crate) identity: Identity,
}

impl ProgramInstance {
    #[must_use]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    #[must_use]
    pub const fn global_rank(&self) -> GlobalRank {
        self.global_rank
    }

    #[must_use]
    pub const fn program(&self) -> ProgramId {
        self.program
    }

    /// Node the instance is placed on, if any.
    #[must_use]
    pub const fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn memberships(&self) -> impl Iterator<Item = MembershipId> + '_ {
        self.memberships.iter().copied()
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.identity.get()
    }
}

/// A cloud host, identified by its address.
#[derive(Debug, Clone)]
pub struct CloudNode {
    pub(crate) id: NodeId,
    pub(crate) host: String,
    pub(crate) instances: BTreeSet<InstanceId>,
    pub(crate) identity: Identity,
}

impl CloudNode {
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn instances(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances.iter().copied()
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.identity.get()
    }
}

/// A communication group. Memberships are kept sorted by local rank.
#[derive(Debug, Clone)]
pub struct Group {
    pub(crate) id: GroupId,
    pub(crate) name: String,
    pub(crate) members: Vec<MembershipId>,
    pub(crate) identity: Identity,
}

impl Group {
    #[must_use]
    pub const fn id(&self) -> GroupId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn members(&self) -> &[MembershipId] {
        &self.members
    }

    /// Position of a membership inside this group's ordered list.
    #[must_use]
    pub fn position_of(&self, membership: MembershipId) -> Option<usize> {
        self.members.iter().position(|m| *m == membership)
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.identity.get()
    }
}

/// Participation of one instance in one group.
#[derive(Debug, Clone)]
pub struct GroupMembership {
    pub(crate) id: MembershipId,
    pub(crate) group: GroupId,
    pub(crate) local_rank: LocalRank,
    pub(crate) instance: InstanceId,
    pub(crate) identity: Identity,
}

impl GroupMembership {
    #[must_use]
    pub const fn id(&self) -> MembershipId {
        self.id
    }

    #[must_use]
    pub const fn group(&self) -> GroupId {
        self.group
    }

    #[must_use]
    pub const fn local_rank(&self) -> LocalRank {
        self.local_rank
    }

    #[must_use]
    pub const fn instance(&self) -> InstanceId {
        self.instance
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.identity.get()
    }
}

/// Routing rule of a data connection between two groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyType {
    Symmetric,
    AllToOne,
    OneToAll,
    AllToAll,
}

impl fmt::Display for TopologyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symmetric => write!(f, "symmetric"),
            Self::AllToOne => write!(f, "all_to_one"),
            Self::OneToAll => write!(f, "one_to_all"),
            Self::AllToAll => write!(f, "all_to_all"),
        }
    }
}

impl FromStr for TopologyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "symmetric" => Ok(Self::Symmetric),
            "all_to_one" => Ok(Self::AllToOne),
            "one_to_all" => Ok(Self::OneToAll),
            "all_to_all" => Ok(Self::AllToAll),
            other => Err(format!("unknown topology type '{other}'")),
        }
    }
}

/// Named data flow from a sending group to a receiving group.
#[derive(Debug, Clone)]
pub struct DataConnection {
    pub(crate) id: ConnectionId,
    pub(crate) name: String,
    pub(crate) sender: GroupId,
    pub(crate) receiver: GroupId,
    pub(crate) topology: TopologyType,
    pub(crate) identity: Identity,
}

impl DataConnection {
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn sender(&self) -> GroupId {
        self.sender
    }

    #[must_use]
    pub const fn receiver(&self) -> GroupId {
        self.receiver
    }

    #[must_use]
    pub const fn topology(&self) -> TopologyType {
        self.topology
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.identity.get()
    }
}
