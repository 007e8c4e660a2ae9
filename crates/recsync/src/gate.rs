//! Account and permission availability checks.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use recsync_core::error::AuthError;
use recsync_core::{AccountStatus, Permission, PermissionStatus, RecordStore, Result};

/// First line of every advisory message.
const DISABLED_PREFIX: &str = "Synchronization is disabled\n";

/// Why the account cannot use the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    Restricted,
    NoAccount,
    /// The status could not be obtained; carries the error text.
    Unreachable(String),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Restricted => write!(f, "account is restricted"),
            BlockReason::NoAccount => write!(f, "no account is set up"),
            BlockReason::Unreachable(e) => write!(f, "account status unavailable: {}", e),
        }
    }
}

/// Progress of the account check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountState {
    Unchecked,
    Checking,
    Available,
    Blocked(BlockReason),
}

/// Progress of the discoverability permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Unchecked,
    Checking,
    Granted,
    Denied,
    Indeterminate,
}

/// A user-facing notice produced by a failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub title: String,
    pub message: String,
}

impl Advisory {
    fn account(reason: &BlockReason) -> Self {
        let detail = match reason {
            BlockReason::Restricted => "The account is not available due to restrictions.".into(),
            BlockReason::NoAccount => {
                "There is no account set up.\nSign in to an account to enable sync.".into()
            }
            BlockReason::Unreachable(e) => format!("The account status could not be checked: {}", e),
        };
        Self {
            title: "Synchronization Error".into(),
            message: format!("{}{}", DISABLED_PREFIX, detail),
        }
    }

    fn permission(state: PermissionState, error: Option<&str>) -> Self {
        let mut message = DISABLED_PREFIX.to_string();
        if let Some(error) = error {
            message.push_str(error);
            message.push('\n');
        }
        message.push_str(match state {
            PermissionState::Denied => {
                "User discoverability was denied. Features that look up other users are unavailable."
            }
            _ => "User discoverability could not be verified. Check your connection and try again.",
        });
        Self {
            title: "Permissions Error".into(),
            message,
        }
    }
}

/// Receives advisories from the gate; presentation is up to the implementor.
pub trait Advisor: Send + Sync {
    fn present(&self, advisory: &Advisory);
}

/// An advisor that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAdvisor;

impl Advisor for LogAdvisor {
    fn present(&self, advisory: &Advisory) {
        warn!(title = %advisory.title, message = %advisory.message, "advisory");
    }
}

/// Checks whether the caller may use the store.
///
/// The account and permission checks are independent. Each failed check
/// hands one [`Advisory`] to the [`Advisor`]; the gate itself never blocks
/// other operations unless asked through [`ensure_available`](Self::ensure_available).
pub struct AccountGate {
    store: Arc<dyn RecordStore>,
    advisor: Arc<dyn Advisor>,
    account: watch::Sender<AccountState>,
    permission: watch::Sender<PermissionState>,
}

impl AccountGate {
    pub fn new(store: Arc<dyn RecordStore>, advisor: Arc<dyn Advisor>) -> Self {
        Self {
            store,
            advisor,
            account: watch::Sender::new(AccountState::Unchecked),
            permission: watch::Sender::new(PermissionState::Unchecked),
        }
    }

    pub fn account_state(&self) -> AccountState {
        self.account.borrow().clone()
    }

    pub fn permission_state(&self) -> PermissionState {
        *self.permission.borrow()
    }

    /// Observe account state changes.
    pub fn watch_account(&self) -> watch::Receiver<AccountState> {
        self.account.subscribe()
    }

    /// Observe permission state changes.
    pub fn watch_permission(&self) -> watch::Receiver<PermissionState> {
        self.permission.subscribe()
    }

    /// Query the account status and record the outcome.
    #[instrument(skip(self))]
    pub async fn check_account(&self) -> AccountState {
        self.account.send_replace(AccountState::Checking);

        let state = match self.store.account_status().await {
            Ok(AccountStatus::Available) => AccountState::Available,
            Ok(AccountStatus::Restricted) => AccountState::Blocked(BlockReason::Restricted),
            Ok(AccountStatus::NoAccount) => AccountState::Blocked(BlockReason::NoAccount),
            Ok(AccountStatus::CouldNotDetermine) => AccountState::Blocked(
                BlockReason::Unreachable("the store could not determine the status".into()),
            ),
            Err(e) => AccountState::Blocked(BlockReason::Unreachable(e.to_string())),
        };

        match &state {
            AccountState::Blocked(reason) => {
                warn!(%reason, "account blocked");
                self.advisor.present(&Advisory::account(reason));
            }
            _ => info!("account available"),
        }

        self.account.send_replace(state.clone());
        state
    }

    /// Query the discoverability permission, requesting it once if the
    /// store reports it as pending.
    #[instrument(skip(self))]
    pub async fn check_permission(&self) -> PermissionState {
        self.permission.send_replace(PermissionState::Checking);
        let permission = Permission::UserDiscoverability;

        let status = match self.store.permission_status(permission).await {
            Ok(PermissionStatus::Pending) => self.store.request_permission(permission).await,
            other => other,
        };

        let (state, error) = match status {
            Ok(PermissionStatus::Granted) => (PermissionState::Granted, None),
            Ok(PermissionStatus::Denied) => (PermissionState::Denied, None),
            Ok(PermissionStatus::Pending | PermissionStatus::CouldNotComplete) => {
                (PermissionState::Indeterminate, None)
            }
            Err(e) => (PermissionState::Indeterminate, Some(e.to_string())),
        };

        if state == PermissionState::Granted {
            info!("discoverability granted");
        } else {
            warn!(?state, "discoverability not granted");
            self.advisor
                .present(&Advisory::permission(state, error.as_deref()));
        }

        self.permission.send_replace(state);
        state
    }

    /// Succeed if the account is available, checking it first if needed.
    ///
    /// A previously blocked account is reported without a new round trip;
    /// call [`check_account`](Self::check_account) to re-check.
    pub async fn ensure_available(&self) -> Result<()> {
        let state = match self.account_state() {
            AccountState::Available => return Ok(()),
            AccountState::Blocked(reason) => AccountState::Blocked(reason),
            AccountState::Unchecked | AccountState::Checking => self.check_account().await,
        };

        match state {
            AccountState::Blocked(reason) => Err(AuthError::AccountUnavailable {
                reason: reason.to_string(),
            }
            .into()),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for AccountGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountGate")
            .field("account", &*self.account.borrow())
            .field("permission", &*self.permission.borrow())
            .finish_non_exhaustive()
    }
}
