//! Logged-in user context and admin navigation gating.

use tokio::sync::RwLock;
use tracing::info;

use crate::domain::User;

use super::notify::NotificationHub;

/// A dashboard navigation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavEntry {
    pub label: &'static str,
    pub path: &'static str,
    pub admin_only: bool,
}

const NAV_ENTRIES: &[NavEntry] = &[
    NavEntry {
        label: "Dashboard",
        path: "/dashboard",
        admin_only: false,
    },
    NavEntry {
        label: "Groups",
        path: "/dashboard/groups",
        admin_only: false,
    },
    NavEntry {
        label: "Wallet",
        path: "/dashboard/wallet",
        admin_only: false,
    },
    NavEntry {
        label: "Users",
        path: "/admin/users",
        admin_only: true,
    },
    NavEntry {
        label: "Manage Groups",
        path: "/admin/groups",
        admin_only: true,
    },
    NavEntry {
        label: "Transactions",
        path: "/admin/transactions",
        admin_only: true,
    },
];

#[derive(Debug, Clone)]
struct Session {
    user: User,
    token: String,
}

#[derive(Debug)]
pub struct SessionContext {
    session: RwLock<Option<Session>>,
    hub: NotificationHub,
}

impl SessionContext {
    #[must_use]
    pub fn new(hub: NotificationHub) -> Self {
        Self {
            session: RwLock::new(None),
            hub,
        }
    }

    pub async fn login(&self, user: User, token: impl Into<String>) {
        *self.session.write().await = Some(Session {
            user,
            token: token.into(),
        });
    }

    /// Clear the session and tell subscribers
    pub async fn logout(&self) {
        let previous = self.session.write().await.take();
        if let Some(session) = previous {
            info!(user_id = %session.user.id, "Logged out");
            self.hub.info("You have been logged out");
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.session.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn token(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn is_admin(&self) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.user.is_admin())
    }

    /// Navigation entries visible to the current user
    pub async fn nav_entries(&self) -> Vec<NavEntry> {
        let is_admin = self.is_admin().await;
        NAV_ENTRIES
            .iter()
            .filter(|entry| is_admin || !entry.admin_only)
            .copied()
            .collect()
    }
}
