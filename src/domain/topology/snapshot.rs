use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::application::Application;
use super::entities::TopologyType;
use super::ids::{GlobalRank, LocalRank};

/// Serializable view of a whole deployment graph, with entity identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub id: Uuid,
    pub name: String,
    pub programs: Vec<ProgramSnapshot>,
    pub nodes: Vec<NodeSnapshot>,
    pub groups: Vec<GroupSnapshot>,
    pub connections: Vec<ConnectionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSnapshot {
    pub id: Uuid,
    pub name: String,
    pub instances: Vec<InstanceSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub id: Uuid,
    pub global_rank: GlobalRank,
    pub host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: Uuid,
    pub host: String,
    pub ranks: Vec<GlobalRank>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub id: Uuid,
    pub name: String,
    pub members: Vec<MemberSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub id: Uuid,
    pub local_rank: LocalRank,
    pub global_rank: GlobalRank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub id: Uuid,
    pub name: String,
    pub sender: String,
    pub receiver: String,
    pub topology: TopologyType,
}

impl From<&Application> for TopologySnapshot {
    fn from(app: &Application) -> Self {
        let rank_of = |id| app.instance(id).map(|i| i.global_rank());
        let host_of = |node| app.node(node).map(|n| n.host().to_string());
        let group_name = |id| {
            app.group(id)
                .map(|g| g.name().to_string())
                .unwrap_or_default()
        };

        let programs = app
            .catalog()
            .programs()
            .map(|p| ProgramSnapshot {
                id: p.uuid(),
                name: p.name().to_string(),
                instances: p
                    .instances()
                    .filter_map(|id| app.instance(id))
                    .map(|i| InstanceSnapshot {
                        id: i.uuid(),
                        global_rank: i.global_rank(),
                        host: i.node().and_then(host_of),
                    })
                    .collect(),
            })
            .collect();

        let nodes = app
            .deployment()
            .nodes()
            .map(|n| NodeSnapshot {
                id: n.uuid(),
                host: n.host().to_string(),
                ranks: n.instances().filter_map(rank_of).collect(),
            })
            .collect();

        let groups = app
            .group_topology()
            .groups()
            .map(|g| GroupSnapshot {
                id: g.uuid(),
                name: g.name().to_string(),
                members: g
                    .members()
                    .iter()
                    .filter_map(|m| app.membership(*m))
                    .filter_map(|m| {
                        rank_of(m.instance()).map(|global_rank| MemberSnapshot {
                            id: m.uuid(),
                            local_rank: m.local_rank(),
                            global_rank,
                        })
                    })
                    .collect(),
            })
            .collect();

        let connections = app
            .communication()
            .connections()
            .map(|c| ConnectionSnapshot {
                id: c.uuid(),
                name: c.name().to_string(),
                sender: group_name(c.sender()),
                receiver: group_name(c.receiver()),
                topology: c.topology(),
            })
            .collect();

        Self {
            id: app.uuid(),
            name: app.name().to_string(),
            programs,
            nodes,
            groups,
            connections,
        }
    }
}
