//! Hermetic application settings and the fixed benchmark auth realm.

use serde::{Deserialize, Serialize};

/// Settings handed to the application at boot.
///
/// The hermetic profile disables every behavior that would reach outside
/// the scratch environment or make one run differ from the next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Check for new application versions over the network.
    pub update_checks: bool,
    /// Report anonymous usage statistics.
    pub usage_statistics: bool,
    /// Run the interactive first-boot setup wizard.
    pub setup_wizard: bool,
    /// Periodic network discovery of peers and agents.
    pub network_discovery: bool,
}

impl AppSettings {
    /// All outward-facing and interactive behavior disabled.
    pub fn hermetic() -> Self {
        Self {
            update_checks: false,
            usage_statistics: false,
            setup_wizard: false,
            network_discovery: false,
        }
    }

    /// True when no setting would let the instance reach outside its
    /// scratch environment.
    pub fn is_hermetic(&self) -> bool {
        !self.update_checks && !self.usage_statistics && !self.setup_wizard && !self.network_discovery
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::hermetic()
    }
}

/// A single account in the benchmark auth realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
}

impl Account {
    fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

/// Authentication realm installed into every instance.
///
/// Fixed and well-known so security-sensitive code paths are exercised
/// identically across runs, without ever representing real credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRealm {
    pub name: String,
    pub accounts: Vec<Account>,
}

impl AuthRealm {
    /// The `default` realm with its three fixed accounts.
    pub fn well_known() -> Self {
        Self {
            name: "default".to_string(),
            accounts: vec![
                Account::new("alice", "alice"),
                Account::new("bob", "bob"),
                Account::new("charlie", "charlie"),
            ],
        }
    }

    pub fn lookup(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.username == username)
    }
}

impl Default for AuthRealm {
    fn default() -> Self {
        Self::well_known()
    }
}
