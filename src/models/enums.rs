use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ComplaintStatus {
    #[sea_orm(string_value = "Pending")]
    #[serde(rename = "Pending")]
    Pending,
    #[sea_orm(string_value = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sea_orm(string_value = "Resolved")]
    #[serde(rename = "Resolved")]
    Resolved,
}

impl ComplaintStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pending",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Resolved => "Resolved",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Pending" => Some(ComplaintStatus::Pending),
            "In Progress" => Some(ComplaintStatus::InProgress),
            "Resolved" => Some(ComplaintStatus::Resolved),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Priority {
    #[sea_orm(string_value = "Low")]
    Low,
    #[default]
    #[sea_orm(string_value = "Medium")]
    Medium,
    #[sea_orm(string_value = "High")]
    High,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Low" => Some(Priority::Low),
            "Medium" => Some(Priority::Medium),
            "High" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Which principal table an id points into. Stored as `user` / `admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::User => "user",
            PrincipalKind::Admin => "admin",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "user" => Some(PrincipalKind::User),
            "admin" => Some(PrincipalKind::Admin),
            _ => None,
        }
    }

    /// The party on the other side of a complaint conversation.
    pub fn counterpart(&self) -> Self {
        match self {
            PrincipalKind::User => PrincipalKind::Admin,
            PrincipalKind::Admin => PrincipalKind::User,
        }
    }
}

/// A user or an admin, identified by table and id rather than a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalRef {
    pub kind: PrincipalKind,
    pub id: i32,
}

impl PrincipalRef {
    pub fn user(id: i32) -> Self {
        Self { kind: PrincipalKind::User, id }
    }

    pub fn admin(id: i32) -> Self {
        Self { kind: PrincipalKind::Admin, id }
    }
}
