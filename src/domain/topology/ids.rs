use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rank of a program instance, unique across a whole application.
pub type GlobalRank = u32;

/// Rank of a program instance inside one communication group.
pub type LocalRank = u32;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub(crate) u32);
    };
}

arena_id!(
    /// Arena key of a [`super::Program`].
    ProgramId
);
arena_id!(
    /// Arena key of a [`super::ProgramInstance`].
    InstanceId
);
arena_id!(
    /// Arena key of a [`super::CloudNode`].
    NodeId
);
arena_id!(
    /// Arena key of a [`super::Group`].
    GroupId
);
arena_id!(
    /// Arena key of a [`super::GroupMembership`].
    MembershipId
);
arena_id!(
    /// Arena key of a [`super::DataConnection`].
    ConnectionId
);

/// Globally unique identity, assigned on first request.
#[derive(Debug, Clone, Default)]
pub struct Identity(OnceLock<Uuid>);

impl Identity {
    #[must_use]
    pub fn get(&self) -> Uuid {
        *self.0.get_or_init(Uuid::new_v4)
    }
}
