use chrono::{DateTime, Utc};
use embench_common::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one embedded application instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceState {
    /// Controller created, nothing provisioned yet
    Unstarted,
    /// Scratch directory and extension artifacts being materialized
    Provisioning,
    /// Network listener bound, application boot in progress
    Listening,
    /// Waiting on the application's own asynchronous initialization
    Initializing,
    /// Instance is running and may serve trials
    Ready,
    /// Orderly shutdown in progress
    Stopping,
    /// Instance fully torn down
    Terminated,
    /// Absorbing failure state, reachable from any non-terminal state
    Failed,
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceState::Unstarted => write!(f, "unstarted"),
            InstanceState::Provisioning => write!(f, "provisioning"),
            InstanceState::Listening => write!(f, "listening"),
            InstanceState::Initializing => write!(f, "initializing"),
            InstanceState::Ready => write!(f, "ready"),
            InstanceState::Stopping => write!(f, "stopping"),
            InstanceState::Terminated => write!(f, "terminated"),
            InstanceState::Failed => write!(f, "failed"),
        }
    }
}

impl InstanceState {
    /// Check if the instance is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstanceState::Terminated | InstanceState::Failed)
    }

    /// Check if the instance is in a transitional state.
    pub fn is_transitional(&self) -> bool {
        matches!(
            self,
            InstanceState::Provisioning
                | InstanceState::Listening
                | InstanceState::Initializing
                | InstanceState::Stopping
        )
    }

    /// Check if the instance may serve trials.
    pub fn is_ready(&self) -> bool {
        matches!(self, InstanceState::Ready)
    }
}

/// Represents a state transition with timestamp and optional reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from_state: InstanceState,
    pub to_state: InstanceState,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// State machine that validates and records instance lifecycle
/// transitions. Startup steps are strictly sequential; no step may be
/// skipped or reordered.
#[derive(Debug, Clone)]
pub struct InstanceStateMachine {
    instance_id: String,
    current_state: InstanceState,
    previous_state: Option<InstanceState>,
    state_history: Vec<StateTransition>,
    last_transition_time: DateTime<Utc>,
}

impl InstanceStateMachine {
    /// Create a new state machine for an instance.
    pub fn new(instance_id: &str) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            current_state: InstanceState::Unstarted,
            previous_state: None,
            state_history: Vec::new(),
            last_transition_time: Utc::now(),
        }
    }

    /// Get the current state.
    pub fn current_state(&self) -> InstanceState {
        self.current_state
    }

    /// Get the previous state.
    pub fn previous_state(&self) -> Option<InstanceState> {
        self.previous_state
    }

    /// Get the state history.
    pub fn state_history(&self) -> &[StateTransition] {
        &self.state_history
    }

    /// Get the time of the last state transition.
    pub fn last_transition_time(&self) -> DateTime<Utc> {
        self.last_transition_time
    }

    /// Check if a transition from the current state to the target state
    /// is valid.
    pub fn is_valid_transition(&self, target_state: InstanceState) -> bool {
        match (self.current_state, target_state) {
            // Strictly sequential startup
            (InstanceState::Unstarted, InstanceState::Provisioning) => true,
            (InstanceState::Provisioning, InstanceState::Listening) => true,
            (InstanceState::Listening, InstanceState::Initializing) => true,
            (InstanceState::Initializing, InstanceState::Ready) => true,

            // Orderly shutdown
            (InstanceState::Ready, InstanceState::Stopping) => true,
            (InstanceState::Stopping, InstanceState::Terminated) => true,

            // Failed is absorbing and reachable from any non-terminal state
            (state, InstanceState::Failed) if !state.is_terminal() => true,

            // A fresh cycle starts from a terminated instance
            (InstanceState::Terminated, InstanceState::Provisioning) => true,

            // Same state (no-op)
            (state, target) if state == target => true,

            _ => false,
        }
    }

    /// Transition to a new state with optional reason.
    pub fn transition_to(
        &mut self,
        target_state: InstanceState,
        reason: Option<String>,
    ) -> HarnessResult<()> {
        if !self.is_valid_transition(target_state) {
            return Err(HarnessError::operation_not_allowed(
                format!("transition to {}", target_state),
                format!("{} ({})", self.current_state, self.instance_id),
            ));
        }

        let now = Utc::now();
        self.state_history.push(StateTransition {
            from_state: self.current_state,
            to_state: target_state,
            timestamp: now,
            reason,
        });

        self.previous_state = Some(self.current_state);
        self.current_state = target_state;
        self.last_transition_time = now;

        // Limit history size to prevent unbounded growth across many trials
        if self.state_history.len() > 100 {
            self.state_history.remove(0);
        }

        tracing::debug!(
            "Instance {} transitioned from {} to {}",
            self.instance_id,
            self.previous_state.unwrap(),
            self.current_state
        );

        Ok(())
    }

    pub fn transition_to_provisioning(&mut self) -> HarnessResult<()> {
        self.transition_to(
            InstanceState::Provisioning,
            Some("Scratch provisioning started".to_string()),
        )
    }

    pub fn transition_to_listening(&mut self) -> HarnessResult<()> {
        self.transition_to(
            InstanceState::Listening,
            Some("Network listener bound".to_string()),
        )
    }

    pub fn transition_to_initializing(&mut self) -> HarnessResult<()> {
        self.transition_to(
            InstanceState::Initializing,
            Some("Waiting for application initialization".to_string()),
        )
    }

    pub fn transition_to_ready(&mut self) -> HarnessResult<()> {
        self.transition_to(
            InstanceState::Ready,
            Some("Application initialization complete".to_string()),
        )
    }

    pub fn transition_to_stopping(&mut self) -> HarnessResult<()> {
        self.transition_to(InstanceState::Stopping, Some("Stop requested".to_string()))
    }

    pub fn transition_to_terminated(&mut self) -> HarnessResult<()> {
        self.transition_to(
            InstanceState::Terminated,
            Some("Instance torn down".to_string()),
        )
    }

    pub fn transition_to_failed(&mut self, reason: String) -> HarnessResult<()> {
        self.transition_to(InstanceState::Failed, Some(reason))
    }

    /// Check if a new start cycle may begin.
    pub fn can_start(&self) -> bool {
        matches!(
            self.current_state,
            InstanceState::Unstarted | InstanceState::Terminated
        )
    }

    /// Check if the instance can be stopped.
    pub fn can_stop(&self) -> bool {
        matches!(self.current_state, InstanceState::Ready)
    }

    /// Get the time spent in the current state.
    pub fn time_in_current_state(&self) -> chrono::Duration {
        Utc::now() - self.last_transition_time
    }

    /// Get the most recent transition.
    pub fn last_transition(&self) -> Option<&StateTransition> {
        self.state_history.last()
    }
}
