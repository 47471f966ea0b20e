use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::application::Application;
use super::entities::{Group, ProgramInstance, TopologyType};
use super::ids::GlobalRank;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TopologyError {
    #[error("global rank {0} is declared more than once")]
    DuplicateRank(GlobalRank),
    #[error("group '{group}' references unknown global rank {rank}")]
    UnknownRank { group: String, rank: GlobalRank },
    #[error("connection '{connection}' references unknown group '{group}'")]
    UnknownGroup { connection: String, group: String },
    #[error("group '{0}' is declared more than once")]
    DuplicateGroup(String),
    #[error("connection '{0}' is declared more than once")]
    DuplicateConnection(String),
}

/// Declarative form of a deployment, as read from a topology file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDescription {
    pub name: String,
    #[serde(default)]
    pub programs: Vec<ProgramDescription>,
    #[serde(default)]
    pub groups: Vec<GroupDescription>,
    #[serde(default)]
    pub connections: Vec<ConnectionDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDescription {
    pub name: String,
    #[serde(default)]
    pub instances: Vec<InstanceDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDescription {
    pub rank: GlobalRank,
    #[serde(default)]
    pub host: Option<String>,
}

/// A group; the local rank of each member is its position in `members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDescription {
    pub name: String,
    #[serde(default)]
    pub members: Vec<GlobalRank>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescription {
    pub name: String,
    pub sender: String,
    pub receiver: String,
    pub topology: TopologyType,
}

impl TopologyDescription {
    /// Builds the in-memory graph.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError` when a rank, group or connection is declared
    /// twice, or when a group or connection references something that was
    /// never declared.
    pub fn build(&self) -> Result<Application, TopologyError> {
        let mut app = Application::new(self.name.clone());

        for program in &self.programs {
            let program_id = app.add_program(&program.name);
            for instance in &program.instances {
                if app.resolve_program_instance(instance.rank).is_some() {
                    return Err(TopologyError::DuplicateRank(instance.rank));
                }
                let Some(instance_id) = app.add_instance(program_id, instance.rank) else {
                    continue;
                };
                if let Some(host) = &instance.host {
                    let node = app.add_node(host);
                    app.place(instance_id, node);
                }
            }
        }

        for group in &self.groups {
            if app.group_by_name(&group.name).is_some() {
                return Err(TopologyError::DuplicateGroup(group.name.clone()));
            }
            let group_id = app.add_group(&group.name);
            for (local, rank) in (0..).zip(&group.members) {
                let instance = app
                    .resolve_program_instance(*rank)
                    .map(ProgramInstance::id)
                    .ok_or_else(|| TopologyError::UnknownRank {
                        group: group.name.clone(),
                        rank: *rank,
                    })?;
                app.add_membership(group_id, local, instance);
            }
        }

        for connection in &self.connections {
            if app.connection_by_name(&connection.name).is_some() {
                return Err(TopologyError::DuplicateConnection(connection.name.clone()));
            }
            let lookup = |name: &str| {
                app.group_by_name(name)
                    .map(Group::id)
                    .ok_or_else(|| TopologyError::UnknownGroup {
                        connection: connection.name.clone(),
                        group: name.to_string(),
                    })
            };
            let sender = lookup(&connection.sender)?;
            let receiver = lookup(&connection.receiver)?;
            app.add_connection(&connection.name, sender, receiver, connection.topology);
        }

        Ok(app)
    }
}
