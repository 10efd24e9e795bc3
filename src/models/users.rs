use crate::schema::users;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Insertable, Clone, Debug)]
#[diesel(table_name = users)]
pub struct UserData {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub telephone: String,
    pub is_client: bool,
    pub is_agent: bool,
    pub is_seller: bool,
    pub is_banned: bool,
    pub created_at: NaiveDateTime,
}

impl UserData {
    pub fn roles(&self) -> Roles {
        Roles {
            client: self.is_client,
            agent: self.is_agent,
            seller: self.is_seller,
        }
    }
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Agent,
    Seller,
}

/// The set of roles a user account holds. Roles compose freely.
#[derive(AsChangeset, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[diesel(table_name = users)]
pub struct Roles {
    #[diesel(column_name = is_client)]
    pub client: bool,
    #[diesel(column_name = is_agent)]
    pub agent: bool,
    #[diesel(column_name = is_seller)]
    pub seller: bool,
}

impl Roles {
    pub fn from_list(roles: &[Role]) -> Self {
        let mut res = Self::default();
        for role in roles {
            match role {
                Role::Client => res.client = true,
                Role::Agent => res.agent = true,
                Role::Seller => res.seller = true,
            }
        }
        res
    }

    pub fn to_list(self) -> Vec<Role> {
        let mut res = Vec::new();
        if self.client {
            res.push(Role::Client);
        }
        if self.agent {
            res.push(Role::Agent);
        }
        if self.seller {
            res.push(Role::Seller);
        }
        res
    }

    pub fn has(self, role: Role) -> bool {
        match role {
            Role::Client => self.client,
            Role::Agent => self.agent,
            Role::Seller => self.seller,
        }
    }

    pub fn is_empty(self) -> bool {
        !(self.client || self.agent || self.seller)
    }

    /// Agents and sellers manage listings.
    pub fn manages_listings(self) -> bool {
        self.agent || self.seller
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_compose() {
        let roles = Roles::from_list(&[Role::Seller, Role::Client, Role::Seller]);
        assert!(roles.client && roles.seller && !roles.agent);
        assert_eq!(roles.to_list(), vec![Role::Client, Role::Seller]);
        assert!(roles.manages_listings());
        assert!(roles.has(Role::Seller));
        assert!(!roles.has(Role::Agent));
    }

    #[test]
    fn empty_roles() {
        let roles = Roles::from_list(&[]);
        assert!(roles.is_empty());
        assert!(!roles.manages_listings());
        assert!(!Roles::from_list(&[Role::Client]).manages_listings());
    }

    #[test]
    fn role_names_are_snake_case() {
        let roles: Vec<Role> = serde_json::from_str(r#"["client","agent","seller"]"#).unwrap();
        assert_eq!(roles, vec![Role::Client, Role::Agent, Role::Seller]);
    }
}
