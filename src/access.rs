// src/access.rs
use crate::credits::{Clock, CreditLedger, CreditState, CreditStore};

/// Who is signed in. Without an email the session is anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub email: Option<String>,
}

impl Identity {
    pub fn new(email: Option<String>) -> Self {
        let email = email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        Self { email }
    }

    pub fn scope(&self) -> String {
        crate::credits::scope_key(self.email.as_deref())
    }

    /// Owner key for saved prompts: the lowercased email, empty when anonymous.
    pub fn owner(&self) -> String {
        self.email.as_deref().map(str::to_lowercase).unwrap_or_default()
    }

    pub fn display(&self) -> &str {
        self.email.as_deref().unwrap_or("anonymous")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

/// Maps identities to roles. Admins are configured, never hard-coded.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admin_emails: Vec<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let admin_emails = admin_emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { admin_emails }
    }

    pub fn role_for(&self, identity: &Identity) -> Role {
        match identity.email.as_deref() {
            Some(email) if self.admin_emails.contains(&email.trim().to_lowercase()) => Role::Admin,
            _ => Role::User,
        }
    }

    /// Resolve the quota an identity currently has.
    pub fn quota<S: CreditStore, C: Clock>(
        &self,
        identity: &Identity,
        ledger: &CreditLedger<S, C>,
    ) -> Quota {
        match self.role_for(identity) {
            Role::Admin => Quota::Unlimited,
            Role::User => Quota::Limited(ledger.load()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Unlimited,
    Limited(CreditState),
}

impl Quota {
    pub fn allows(&self) -> bool {
        match self {
            Quota::Unlimited => true,
            Quota::Limited(state) => !state.is_exhausted(),
        }
    }

    /// Record one successful use. Unlimited quotas never touch the ledger.
    pub fn spend<S: CreditStore, C: Clock>(self, ledger: &CreditLedger<S, C>) -> Quota {
        match self {
            Quota::Unlimited => Quota::Unlimited,
            Quota::Limited(state) => Quota::Limited(ledger.consume(state)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Quota::Unlimited => "unlimited".into(),
            Quota::Limited(state) => format!("{}/{}", state.count, crate::credits::ALLOTMENT),
        }
    }
}
