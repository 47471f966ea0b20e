use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::topology::{CloudNode, DataConnection, Group, Program, ProgramInstance};

const PLACEHOLDER: &str = "{}";

/// Kind of topology entity an advice points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Program,
    ProgramInstance,
    CloudNode,
    Group,
    DataConnection,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Program => write!(f, "program"),
            Self::ProgramInstance => write!(f, "program instance"),
            Self::CloudNode => write!(f, "cloud node"),
            Self::Group => write!(f, "group"),
            Self::DataConnection => write!(f, "data connection"),
        }
    }
}

/// Reference to a topology entity: kind, identity and display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: Uuid,
    pub label: String,
}

impl From<&Program> for EntityRef {
    fn from(program: &Program) -> Self {
        Self {
            kind: EntityKind::Program,
            id: program.uuid(),
            label: program.name().to_string(),
        }
    }
}

impl From<&ProgramInstance> for EntityRef {
    fn from(instance: &ProgramInstance) -> Self {
        Self {
            kind: EntityKind::ProgramInstance,
            id: instance.uuid(),
            label: format!("rank {}", instance.global_rank()),
        }
    }
}

impl From<&CloudNode> for EntityRef {
    fn from(node: &CloudNode) -> Self {
        Self {
            kind: EntityKind::CloudNode,
            id: node.uuid(),
            label: node.host().to_string(),
        }
    }
}

impl From<&Group> for EntityRef {
    fn from(group: &Group) -> Self {
        Self {
            kind: EntityKind::Group,
            id: group.uuid(),
            label: group.name().to_string(),
        }
    }
}

impl From<&DataConnection> for EntityRef {
    fn from(connection: &DataConnection) -> Self {
        Self {
            kind: EntityKind::DataConnection,
            id: connection.uuid(),
            label: connection.name().to_string(),
        }
    }
}

/// One value substituted into an advice template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdviceArgument {
    Text { value: String },
    Number { value: f64, precision: usize },
    /// A ratio, rendered multiplied by 100 with two decimals.
    Percent { ratio: f64 },
    Time { value: DateTime<Utc> },
    Entity { entity: EntityRef },
}

impl fmt::Display for AdviceArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { value } => f.write_str(value),
            Self::Number { value, precision } => write!(f, "{value:.prec$}", prec = *precision),
            Self::Percent { ratio } => write!(f, "{:.2}%", ratio * 100.0),
            Self::Time { value } => f.write_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Self::Entity { entity } => f.write_str(&entity.label),
        }
    }
}

/// A finding produced by an advisor. Built once through [`AdviceBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    name: String,
    template: String,
    arguments: Vec<AdviceArgument>,
    solution: Option<String>,
    note: Option<String>,
}

impl Advice {
    #[must_use]
    pub fn builder(name: impl Into<String>, template: impl Into<String>) -> AdviceBuilder {
        AdviceBuilder {
            advice: Self {
                name: name.into(),
                template: template.into(),
                arguments: Vec::new(),
                solution: None,
                note: None,
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn arguments(&self) -> &[AdviceArgument] {
        &self.arguments
    }

    #[must_use]
    pub fn solution(&self) -> Option<&str> {
        self.solution.as_deref()
    }

    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Entities referenced by the description, in placeholder order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityRef> {
        self.arguments.iter().filter_map(|a| match a {
            AdviceArgument::Entity { entity } => Some(entity),
            _ => None,
        })
    }

    /// Template with every `{}` replaced by the next argument.
    ///
    /// Placeholders without an argument are left as they are; surplus
    /// arguments are ignored.
    #[must_use]
    pub fn description(&self) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut arguments = self.arguments.iter();
        let mut pieces = self.template.split(PLACEHOLDER).peekable();
        while let Some(piece) = pieces.next() {
            out.push_str(piece);
            if pieces.peek().is_none() {
                break;
            }
            match arguments.next() {
                Some(argument) => out.push_str(&argument.to_string()),
                None => out.push_str(PLACEHOLDER),
            }
        }
        out
    }
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.description())
    }
}

#[must_use]
pub struct AdviceBuilder {
    advice: Advice,
}

impl AdviceBuilder {
    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.advice.arguments.push(AdviceArgument::Text {
            value: value.into(),
        });
        self
    }

    pub fn number(mut self, value: f64, precision: usize) -> Self {
        self.advice
            .arguments
            .push(AdviceArgument::Number { value, precision });
        self
    }

    pub fn percent(mut self, ratio: f64) -> Self {
        self.advice.arguments.push(AdviceArgument::Percent { ratio });
        self
    }

    pub fn time(mut self, value: DateTime<Utc>) -> Self {
        self.advice.arguments.push(AdviceArgument::Time { value });
        self
    }

    pub fn entity(mut self, entity: impl Into<EntityRef>) -> Self {
        self.advice.arguments.push(AdviceArgument::Entity {
            entity: entity.into(),
        });
        self
    }

    pub fn solution(mut self, solution: impl Into<String>) -> Self {
        self.advice.solution = Some(solution.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.advice.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn build(self) -> Advice {
        self.advice
    }
}
