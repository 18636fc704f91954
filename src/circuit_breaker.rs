use failsafe::backoff::{self, Exponential};
use failsafe::failure_policy::{self, ConsecutiveFailures};
use failsafe::{Config, StateMachine};
use std::time::Duration;

/// Circuit breaker guarding calls to the remote verification provider.
pub type RemoteBreaker = StateMachine<ConsecutiveFailures<Exponential>, ()>;

/// Creates the breaker used in front of the email verification provider.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures triggers OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// While OPEN every call is rejected without touching the network and the
/// caller takes its local fallback.
pub fn create_remote_circuit_breaker() -> RemoteBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
