//! Single-owner session state machine.
//!
//! One spawned task owns the `AuthState`; everything else talks to it through
//! a closed command set and observes it through `watch` snapshots. Racing
//! producers (periodic revalidation, visibility revalidation, user-initiated
//! operations) are serialized here, and an epoch counter keeps responses that
//! were issued before a logout or a fresh login from resurrecting stale
//! authenticated state.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::{
    api::AuthApi,
    error::AuthFlowError,
    state::{AuthState, SessionPhase, User},
};

/// Handle to the session store task. Cheap to clone; every clone drives and
/// observes the same state machine.
#[derive(Clone)]
pub struct SessionStore {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<AuthState>,
}

/// The closed set of operations the store accepts.
enum Command {
    Login {
        username: String,
        password: String,
        reply: oneshot::Sender<Result<User, AuthFlowError>>,
    },
    Register {
        username: String,
        email: String,
        password: String,
        confirm_password: String,
        reply: oneshot::Sender<Result<User, AuthFlowError>>,
    },
    Logout {
        reply: Option<oneshot::Sender<()>>,
    },
    Validate {
        reply: Option<oneshot::Sender<Result<(), AuthFlowError>>>,
    },
    RefreshCsrf {
        reply: oneshot::Sender<Result<String, AuthFlowError>>,
    },
}

/// Completion of an in-flight operation, paired with the epoch that was
/// current when it was issued.
enum Outcome {
    Login {
        result: Result<(User, Option<String>), AuthFlowError>,
        reply: oneshot::Sender<Result<User, AuthFlowError>>,
    },
    Validate {
        result: Result<User, AuthFlowError>,
        reply: Option<oneshot::Sender<Result<(), AuthFlowError>>>,
    },
    Register {
        result: Result<User, AuthFlowError>,
        reply: oneshot::Sender<Result<User, AuthFlowError>>,
    },
    RefreshCsrf {
        result: Result<String, AuthFlowError>,
        reply: oneshot::Sender<Result<String, AuthFlowError>>,
    },
}

impl SessionStore {
    pub fn spawn(api: AuthApi) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, snapshots) = watch::channel(AuthState::default());
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let task = StoreTask {
            api: Arc::new(api),
            state_tx,
            state: AuthState::default(),
            epoch: 0,
            last_settled: SessionPhase::Idle,
            outcome_tx,
        };
        tokio::spawn(task.run(command_rx, outcome_rx));

        Self {
            commands,
            snapshots,
        }
    }

    /// Current state, read-only.
    pub fn snapshot(&self) -> AuthState {
        self.snapshots.borrow().clone()
    }

    /// Subscription to state changes. Each received value is one complete
    /// snapshot.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.snapshots.clone()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthFlowError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Login {
            username: username.to_string(),
            password: password.to_string(),
            reply,
        });
        rx.await.unwrap_or(Err(AuthFlowError::Server))
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, AuthFlowError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Register {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
            reply,
        });
        rx.await.unwrap_or(Err(AuthFlowError::Server))
    }

    /// Resolves once local state is cleared; the server-side revocation keeps
    /// running in the background and its outcome cannot undo the clear.
    pub async fn logout(&self) {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Logout { reply: Some(reply) });
        let _ = rx.await;
    }

    pub async fn validate(&self) -> Result<(), AuthFlowError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Validate { reply: Some(reply) });
        rx.await.unwrap_or(Err(AuthFlowError::Server))
    }

    /// Fire-and-forget revalidation, used by the background triggers.
    pub fn trigger_validate(&self) {
        self.send(Command::Validate { reply: None });
    }

    pub async fn refresh_csrf(&self) -> Result<String, AuthFlowError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::RefreshCsrf { reply });
        rx.await.unwrap_or(Err(AuthFlowError::Server))
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Session store task is gone; command dropped");
        }
    }
}

struct StoreTask {
    api: Arc<AuthApi>,
    state_tx: watch::Sender<AuthState>,
    state: AuthState,
    /// Incremented on every state-invalidating operation (login start,
    /// logout). Outcomes tagged with an older epoch are discarded.
    epoch: u64,
    /// Phase the machine last settled in; decides whether a failed validate
    /// surfaces an error, and what register/refresh restore.
    last_settled: SessionPhase,
    outcome_tx: mpsc::UnboundedSender<(u64, Outcome)>,
}

impl StoreTask {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut outcomes: mpsc::UnboundedReceiver<(u64, Outcome)>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    // Every handle dropped; nothing can reach the store again.
                    None => break,
                },
                Some((epoch, outcome)) = outcomes.recv() => {
                    self.handle_outcome(epoch, outcome);
                }
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Login {
                username,
                password,
                reply,
            } => {
                // A fresh login supersedes whatever is in flight.
                self.epoch += 1;
                self.enter_loading();

                let api = self.api.clone();
                let outcome_tx = self.outcome_tx.clone();
                let epoch = self.epoch;
                let csrf = self.state.csrf_token.clone();
                tokio::spawn(async move {
                    let result = async {
                        let token = match csrf {
                            Some(token) => token,
                            None => api.csrf().await?,
                        };
                        api.login(&username, &password, &token).await
                    }
                    .await;
                    let _ = outcome_tx.send((epoch, Outcome::Login { result, reply }));
                });
            }
            Command::Register {
                username,
                email,
                password,
                confirm_password,
                reply,
            } => {
                self.enter_loading();

                let api = self.api.clone();
                let outcome_tx = self.outcome_tx.clone();
                let epoch = self.epoch;
                tokio::spawn(async move {
                    let result = api
                        .register(&username, &email, &password, &confirm_password)
                        .await;
                    let _ = outcome_tx.send((epoch, Outcome::Register { result, reply }));
                });
            }
            Command::Validate { reply } => {
                self.enter_loading();

                let api = self.api.clone();
                let outcome_tx = self.outcome_tx.clone();
                let epoch = self.epoch;
                tokio::spawn(async move {
                    let result = api.validate().await;
                    let _ = outcome_tx.send((epoch, Outcome::Validate { result, reply }));
                });
            }
            Command::RefreshCsrf { reply } => {
                self.enter_loading();

                let api = self.api.clone();
                let outcome_tx = self.outcome_tx.clone();
                let epoch = self.epoch;
                tokio::spawn(async move {
                    let result = api.csrf().await;
                    let _ = outcome_tx.send((epoch, Outcome::RefreshCsrf { result, reply }));
                });
            }
            Command::Logout { reply } => {
                // Logout invalidates in-flight work and clears local state in
                // one published transition, before the server hears about it.
                self.epoch += 1;
                self.settle(AuthState {
                    phase: SessionPhase::Unauthenticated,
                    user: None,
                    is_authenticated: false,
                    is_loading: false,
                    error: None,
                    csrf_token: None,
                });
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }

                let api = self.api.clone();
                tokio::spawn(async move {
                    if let Err(err) = api.logout().await {
                        tracing::warn!(
                            error = %err,
                            "Server-side logout failed; local state already cleared"
                        );
                    }
                });
            }
        }
    }

    fn handle_outcome(&mut self, epoch: u64, outcome: Outcome) {
        let stale = epoch != self.epoch;
        if stale {
            tracing::debug!(epoch, current = self.epoch, "Discarding stale auth outcome");
        }

        match outcome {
            Outcome::Login { result, reply } => match result {
                Ok((user, csrf_token)) => {
                    if !stale {
                        self.settle_authenticated(user.clone(), csrf_token);
                    }
                    let _ = reply.send(Ok(user));
                }
                Err(err) => {
                    if !stale {
                        self.settle(AuthState {
                            phase: SessionPhase::Unauthenticated,
                            user: None,
                            is_authenticated: false,
                            is_loading: false,
                            error: Some(err.to_string()),
                            csrf_token: None,
                        });
                    }
                    let _ = reply.send(Err(err));
                }
            },
            Outcome::Validate { result, reply } => match result {
                Ok(user) => {
                    if !stale {
                        self.settle_authenticated(user, None);
                    }
                    if let Some(reply) = reply {
                        let _ = reply.send(Ok(()));
                    }
                }
                Err(err) => {
                    if !stale {
                        // Surface the failure only to someone who was signed
                        // in; first-time visitors see nothing.
                        let was_authenticated =
                            self.last_settled == SessionPhase::Authenticated;
                        let phase = if was_authenticated {
                            SessionPhase::Error
                        } else {
                            SessionPhase::Unauthenticated
                        };
                        self.settle(AuthState {
                            phase,
                            user: None,
                            is_authenticated: false,
                            is_loading: false,
                            error: was_authenticated.then(|| err.to_string()),
                            csrf_token: None,
                        });
                    }
                    if let Some(reply) = reply {
                        let _ = reply.send(Err(err));
                    }
                }
            },
            Outcome::Register { result, reply } => {
                if !stale {
                    // Registration never authenticates; restore the phase the
                    // machine settled in before the operation started.
                    self.state.is_loading = false;
                    self.state.phase = self.last_settled;
                    match &result {
                        Ok(_) => self.state.error = None,
                        // Field-level problems surface next to the field via
                        // the reply; only non-validation failures become the
                        // global error.
                        Err(AuthFlowError::Validation { .. }) => {}
                        Err(err) => self.state.error = Some(err.to_string()),
                    }
                    self.publish();
                }
                let _ = reply.send(result);
            }
            Outcome::RefreshCsrf { result, reply } => {
                if !stale {
                    self.state.is_loading = false;
                    self.state.phase = self.last_settled;
                    if let Ok(token) = &result {
                        self.state.csrf_token = Some(token.clone());
                    }
                    self.publish();
                }
                let _ = reply.send(result);
            }
        }
    }

    fn enter_loading(&mut self) {
        self.state.phase = SessionPhase::Loading;
        self.state.is_loading = true;
        self.publish();
    }

    fn settle_authenticated(&mut self, user: User, csrf_token: Option<String>) {
        let csrf_token = csrf_token.or_else(|| self.state.csrf_token.clone());
        self.settle(AuthState {
            phase: SessionPhase::Authenticated,
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
            error: None,
            csrf_token,
        });
    }

    /// The one place state is replaced and published.
    fn settle(&mut self, next: AuthState) {
        self.last_settled = next.phase;
        self.state = next;
        self.publish();
    }

    fn publish(&self) {
        let _ = self.state_tx.send(self.state.clone());
    }
}
