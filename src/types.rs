//! Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dashboard roles. Closed set: adding a role must be handled at every match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Admin,
    Manager,
    /// Production manager (purchase orders, stitching challans)
    Pmanager,
    /// Inventory manager
    Imanager,
    User,
}

/// Account lifecycle state as recorded in the profile store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AccountState {
    Active,
    Suspended,
    Inactive,
}

/// Business record families guarded by the API authorizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Orders,
    PurchaseOrders,
    Challans,
    Expenses,
    PaymentVouchers,
    Ledgers,
    Inventory,
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Admin, Role::Manager, Role::Pmanager, Role::Imanager, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Pmanager => "Pmanager",
            Role::Imanager => "Imanager",
            Role::User => "User",
        }
    }

    /// Permission table for the fine-grained API checks
    pub fn permits(&self, resource: Resource, access: Access) -> bool {
        use Resource::*;

        match self {
            Role::Admin => true,
            Role::Manager => match access {
                Access::Read => true,
                Access::Write => !matches!(resource, Users),
            },
            Role::Pmanager => match access {
                Access::Read => matches!(resource, Orders | PurchaseOrders | Challans | Inventory),
                Access::Write => matches!(resource, PurchaseOrders | Challans),
            },
            Role::Imanager => match access {
                Access::Read => matches!(resource, Orders | PurchaseOrders | Inventory),
                Access::Write => matches!(resource, Inventory),
            },
            Role::User => match access {
                Access::Read => matches!(resource, Orders | Inventory),
                Access::Write => false,
            },
        }
    }
}

impl AccountState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountState::Active => "active",
            AccountState::Suspended => "suspended",
            AccountState::Inactive => "inactive",
        }
    }
}

impl Resource {
    pub const ALL: [Resource; 8] = [
        Resource::Orders,
        Resource::PurchaseOrders,
        Resource::Challans,
        Resource::Expenses,
        Resource::PaymentVouchers,
        Resource::Ledgers,
        Resource::Inventory,
        Resource::Users,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Orders => "orders",
            Resource::PurchaseOrders => "purchase_orders",
            Resource::Challans => "challans",
            Resource::Expenses => "expenses",
            Resource::PaymentVouchers => "payment_vouchers",
            Resource::Ledgers => "ledgers",
            Resource::Inventory => "inventory",
            Resource::Users => "users",
        }
    }
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "pmanager" => Ok(Role::Pmanager),
            "imanager" => Ok(Role::Imanager),
            "user" => Ok(Role::User),
            _ => Err(UnknownVariant::new("role", s)),
        }
    }
}

impl FromStr for AccountState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(AccountState::Active),
            "suspended" => Ok(AccountState::Suspended),
            "inactive" => Ok(AccountState::Inactive),
            _ => Err(UnknownVariant::new("account status", s)),
        }
    }
}

impl FromStr for Resource {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| UnknownVariant::new("resource", s))
    }
}

impl FromStr for Access {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Access::Read),
            "write" => Ok(Access::Write),
            _ => Err(UnknownVariant::new("access", s)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl TryFrom<String> for AccountState {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountState> for String {
    fn from(state: AccountState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AccountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
