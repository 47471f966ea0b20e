use super::application::Application;
use super::entities::TopologyType;
use super::ids::{ConnectionId, GroupId, MembershipId};

/// Side of a connection a routing query starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Caller sends, result is the receiving side.
    Receivers,
    /// Caller receives, result is the sending side.
    Senders,
}

impl Application {
    /// Memberships of the receiving group that `sender` delivers to over
    /// `connection`.
    ///
    /// Empty when the connection is unknown or `sender` is not a member of
    /// the connection's sending group.
    #[must_use]
    pub fn receivers_of(&self, connection: ConnectionId, sender: MembershipId) -> Vec<MembershipId> {
        self.route(connection, sender, Direction::Receivers)
    }

    /// Memberships of the sending group that deliver to `receiver` over
    /// `connection`.
    #[must_use]
    pub fn senders_of(&self, connection: ConnectionId, receiver: MembershipId) -> Vec<MembershipId> {
        self.route(connection, receiver, Direction::Senders)
    }

    fn route(
        &self,
        connection: ConnectionId,
        caller: MembershipId,
        direction: Direction,
    ) -> Vec<MembershipId> {
        let Some(conn) = self.connection(connection) else {
            return Vec::new();
        };
        let (own, other) = match direction {
            Direction::Receivers => (conn.sender(), conn.receiver()),
            Direction::Senders => (conn.receiver(), conn.sender()),
        };
        let Some(own_group) = self.group(own) else {
            return Vec::new();
        };
        let Some(caller_index) = own_group.position_of(caller) else {
            return Vec::new();
        };

        match (conn.topology(), direction) {
            (TopologyType::AllToAll, _)
            | (TopologyType::OneToAll, Direction::Receivers)
            | (TopologyType::AllToOne, Direction::Senders) => self.all_members(other),
            (TopologyType::AllToOne, Direction::Receivers)
            | (TopologyType::OneToAll, Direction::Senders) => {
                self.member_at_rank(other, 0).into_iter().collect()
            }
            (TopologyType::Symmetric, _) => self
                .group(other)
                .and_then(|g| g.members().get(caller_index).copied())
                .into_iter()
                .collect(),
        }
    }

    fn all_members(&self, group: GroupId) -> Vec<MembershipId> {
        self.group(group)
            .map(|g| g.members().to_vec())
            .unwrap_or_default()
    }
}
