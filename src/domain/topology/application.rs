use std::collections::{BTreeMap, BTreeSet, HashMap};

use uuid::Uuid;

use super::entities::{
    CloudNode, DataConnection, Group, GroupMembership, Program, ProgramInstance, TopologyType,
};
use super::ids::{
    ConnectionId, GlobalRank, GroupId, Identity, InstanceId, LocalRank, MembershipId, NodeId,
    ProgramId,
};

/// Programs and their instances, indexed by name and global rank.
#[derive(Debug, Clone, Default)]
pub struct ProgramCatalog {
    programs: BTreeMap<ProgramId, Program>,
    instances: BTreeMap<InstanceId, ProgramInstance>,
    by_name: HashMap<String, ProgramId>,
    by_rank: HashMap<GlobalRank, InstanceId>,
}

impl ProgramCatalog {
    pub fn programs(&self) -> impl Iterator<Item = &Program> {
        self.programs.values()
    }

    pub fn instances(&self) -> impl Iterator<Item = &ProgramInstance> {
        self.instances.values()
    }
}

/// Cloud nodes indexed by host address.
#[derive(Debug, Clone, Default)]
pub struct DeploymentTopology {
    nodes: BTreeMap<NodeId, CloudNode>,
    by_host: HashMap<String, NodeId>,
}

impl DeploymentTopology {
    pub fn nodes(&self) -> impl Iterator<Item = &CloudNode> {
        self.nodes.values()
    }
}

/// Communication groups and their memberships.
#[derive(Debug, Clone, Default)]
pub struct GroupTopology {
    groups: BTreeMap<GroupId, Group>,
    memberships: BTreeMap<MembershipId, GroupMembership>,
    by_name: HashMap<String, GroupId>,
}

impl GroupTopology {
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn memberships(&self) -> impl Iterator<Item = &GroupMembership> {
        self.memberships.values()
    }
}

/// Data connections between groups.
#[derive(Debug, Clone, Default)]
pub struct CommunicationTopology {
    connections: BTreeMap<ConnectionId, DataConnection>,
    by_name: HashMap<String, ConnectionId>,
}

impl CommunicationTopology {
    pub fn connections(&self) -> impl Iterator<Item = &DataConnection> {
        self.connections.values()
    }
}

/// Root of a deployment graph.
///
/// Entities live in id-keyed arenas; every cross link (placement, membership)
/// is an id index that is only mutated through the methods below, which keep
/// both directions consistent.
#[derive(Debug, Clone)]
pub struct Application {
    name: String,
    identity: Identity,
    catalog: ProgramCatalog,
    deployment: DeploymentTopology,
    groups: GroupTopology,
    communication: CommunicationTopology,
    next_id: u32,
}

impl Application {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity: Identity::default(),
            catalog: ProgramCatalog::default(),
            deployment: DeploymentTopology::default(),
            groups: GroupTopology::default(),
            communication: CommunicationTopology::default(),
            next_id: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.identity.get()
    }

    #[must_use]
    pub const fn catalog(&self) -> &ProgramCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn deployment(&self) -> &DeploymentTopology {
        &self.deployment
    }

    #[must_use]
    pub const fn group_topology(&self) -> &GroupTopology {
        &self.groups
    }

    #[must_use]
    pub const fn communication(&self) -> &CommunicationTopology {
        &self.communication
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // --- Programs and instances ---

    /// Adds a program, or returns the existing one with the same name.
    pub fn add_program(&mut self, name: &str) -> ProgramId {
        if let Some(id) = self.catalog.by_name.get(name) {
            return *id;
        }
        let id = ProgramId(self.allocate());
        self.catalog.programs.insert(
            id,
            Program {
                id,
                name: name.to_string(),
                instances: BTreeSet::new(),
                identity: Identity::default(),
            },
        );
        self.catalog.by_name.insert(name.to_string(), id);
        id
    }

    /// Adds an instance of `program` with the given global rank.
    ///
    /// Returns the existing instance when the rank is already taken, and
    /// `None` when the program does not belong to this application.
    pub fn add_instance(
        &mut self,
        program: ProgramId,
        global_rank: GlobalRank,
    ) -> Option<InstanceId> {
        if let Some(existing) = self.catalog.by_rank.get(&global_rank) {
            return Some(*existing);
        }
        if !self.catalog.programs.contains_key(&program) {
            return None;
        }
        let id = InstanceId(self.allocate());
        self.catalog.instances.insert(
            id,
            ProgramInstance {
                id,
                global_rank,
                program,
                node: None,
                memberships: BTreeSet::new(),
                identity: Identity::default(),
            },
        );
        self.catalog.by_rank.insert(global_rank, id);
        if let Some(p) = self.catalog.programs.get_mut(&program) {
            p.instances.insert(id);
        }
        Some(id)
    }

    /// Removes an instance together with its placement and memberships.
    pub fn remove_instance(&mut self, id: InstanceId) -> Option<ProgramInstance> {
        self.unplace(id);
        let memberships: Vec<MembershipId> = self
            .catalog
            .instances
            .get(&id)?
            .memberships
            .iter()
            .copied()
            .collect();
        for membership in memberships {
            self.remove_membership(membership);
        }
        let instance = self.catalog.instances.remove(&id)?;
        self.catalog.by_rank.remove(&instance.global_rank);
        if let Some(p) = self.catalog.programs.get_mut(&instance.program) {
            p.instances.remove(&id);
        }
        Some(instance)
    }

    #[must_use]
    pub fn program(&self, id: ProgramId) -> Option<&Program> {
        self.catalog.programs.get(&id)
    }

    #[must_use]
    pub fn instance(&self, id: InstanceId) -> Option<&ProgramInstance> {
        self.catalog.instances.get(&id)
    }

    /// Finds the program instance running with `global_rank`.
    #[must_use]
    pub fn resolve_program_instance(&self, global_rank: GlobalRank) -> Option<&ProgramInstance> {
        self.catalog
            .by_rank
            .get(&global_rank)
            .and_then(|id| self.catalog.instances.get(id))
    }

    // --- Nodes and placement ---

    /// Adds a node, or returns the existing one with the same host.
    pub fn add_node(&mut self, host: &str) -> NodeId {
        if let Some(id) = self.deployment.by_host.get(host) {
            return *id;
        }
        let id = NodeId(self.allocate());
        self.deployment.nodes.insert(
            id,
            CloudNode {
                id,
                host: host.to_string(),
                instances: BTreeSet::new(),
                identity: Identity::default(),
            },
        );
        self.deployment.by_host.insert(host.to_string(), id);
        id
    }

    /// Removes a node; instances placed on it become unplaced.
    pub fn remove_node(&mut self, id: NodeId) -> Option<CloudNode> {
        let node = self.deployment.nodes.remove(&id)?;
        self.deployment.by_host.remove(&node.host);
        for instance in &node.instances {
            if let Some(i) = self.catalog.instances.get_mut(instance) {
                i.node = None;
            }
        }
        Some(node)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&CloudNode> {
        self.deployment.nodes.get(&id)
    }

    #[must_use]
    pub fn node_by_host(&self, host: &str) -> Option<&CloudNode> {
        self.deployment
            .by_host
            .get(host)
            .and_then(|id| self.deployment.nodes.get(id))
    }

    /// Places an instance on a node, moving it off its previous node.
    ///
    /// Returns `false` when either side is unknown.
    pub fn place(&mut self, instance: InstanceId, node: NodeId) -> bool {
        if !self.deployment.nodes.contains_key(&node) {
            return false;
        }
        let Some(previous) = self.catalog.instances.get(&instance).map(|i| i.node) else {
            return false;
        };
        if let Some(old) = previous {
            if let Some(n) = self.deployment.nodes.get_mut(&old) {
                n.instances.remove(&instance);
            }
        }
        if let Some(i) = self.catalog.instances.get_mut(&instance) {
            i.node = Some(node);
        }
        if let Some(n) = self.deployment.nodes.get_mut(&node) {
            n.instances.insert(instance);
        }
        true
    }

    /// Clears an instance's placement, returning the node it was on.
    pub fn unplace(&mut self, instance: InstanceId) -> Option<NodeId> {
        let node = self.catalog.instances.get_mut(&instance)?.node.take()?;
        if let Some(n) = self.deployment.nodes.get_mut(&node) {
            n.instances.remove(&instance);
        }
        Some(node)
    }

    // --- Groups and memberships ---

    /// Adds a group, or returns the existing one with the same name.
    pub fn add_group(&mut self, name: &str) -> GroupId {
        if let Some(id) = self.groups.by_name.get(name) {
            return *id;
        }
        let id = GroupId(self.allocate());
        self.groups.groups.insert(
            id,
            Group {
                id,
                name: name.to_string(),
                members: Vec::new(),
                identity: Identity::default(),
            },
        );
        self.groups.by_name.insert(name.to_string(), id);
        id
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.groups.get(&id)
    }

    #[must_use]
    pub fn group_by_name(&self, name: &str) -> Option<&Group> {
        self.groups
            .by_name
            .get(name)
            .and_then(|id| self.groups.groups.get(id))
    }

    /// Adds `instance` to `group` at `local_rank`.
    ///
    /// Returns the existing membership when the local rank is already taken in
    /// that group, and `None` when the group or instance is unknown.
    pub fn add_membership(
        &mut self,
        group: GroupId,
        local_rank: LocalRank,
        instance: InstanceId,
    ) -> Option<MembershipId> {
        let existing = self.groups.groups.get(&group)?.members.iter().copied().find(|m| {
            self.groups
                .memberships
                .get(m)
                .is_some_and(|gm| gm.local_rank == local_rank)
        });
        if existing.is_some() {
            return existing;
        }
        if !self.catalog.instances.contains_key(&instance) {
            return None;
        }

        let id = MembershipId(self.allocate());
        self.groups.memberships.insert(
            id,
            GroupMembership {
                id,
                group,
                local_rank,
                instance,
                identity: Identity::default(),
            },
        );

        let memberships = &self.groups.memberships;
        if let Some(g) = self.groups.groups.get_mut(&group) {
            let at = g.members.partition_point(|m| {
                memberships
                    .get(m)
                    .is_some_and(|gm| gm.local_rank < local_rank)
            });
            g.members.insert(at, id);
        }
        if let Some(i) = self.catalog.instances.get_mut(&instance) {
            i.memberships.insert(id);
        }
        Some(id)
    }

    /// Removes a membership from both its group and its instance.
    pub fn remove_membership(&mut self, id: MembershipId) -> Option<GroupMembership> {
        let membership = self.groups.memberships.remove(&id)?;
        if let Some(g) = self.groups.groups.get_mut(&membership.group) {
            g.members.retain(|m| *m != id);
        }
        if let Some(i) = self.catalog.instances.get_mut(&membership.instance) {
            i.memberships.remove(&id);
        }
        Some(membership)
    }

    #[must_use]
    pub fn membership(&self, id: MembershipId) -> Option<&GroupMembership> {
        self.groups.memberships.get(&id)
    }

    /// Membership of `group` at `local_rank`.
    #[must_use]
    pub fn member_at_rank(&self, group: GroupId, local_rank: LocalRank) -> Option<MembershipId> {
        self.groups
            .groups
            .get(&group)?
            .members
            .iter()
            .copied()
            .find(|m| {
                self.groups
                    .memberships
                    .get(m)
                    .is_some_and(|gm| gm.local_rank == local_rank)
            })
    }

    // --- Connections ---

    /// Adds a connection, or returns the existing one with the same name.
    ///
    /// Returns `None` when either group is unknown.
    pub fn add_connection(
        &mut self,
        name: &str,
        sender: GroupId,
        receiver: GroupId,
        topology: TopologyType,
    ) -> Option<ConnectionId> {
        if let Some(id) = self.communication.by_name.get(name) {
            return Some(*id);
        }
        if !self.groups.groups.contains_key(&sender) || !self.groups.groups.contains_key(&receiver)
        {
            return None;
        }
        let id = ConnectionId(self.allocate());
        self.communication.connections.insert(
            id,
            DataConnection {
                id,
                name: name.to_string(),
                sender,
                receiver,
                topology,
                identity: Identity::default(),
            },
        );
        self.communication.by_name.insert(name.to_string(), id);
        Some(id)
    }

    #[must_use]
    pub fn connection(&self, id: ConnectionId) -> Option<&DataConnection> {
        self.communication.connections.get(&id)
    }

    #[must_use]
    pub fn connection_by_name(&self, name: &str) -> Option<&DataConnection> {
        self.communication
            .by_name
            .get(name)
            .and_then(|id| self.communication.connections.get(id))
    }
}
