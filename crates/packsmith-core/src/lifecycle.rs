use crate::CoreError;
use packsmith_store::DeploymentState;

pub fn validate_transition(from: DeploymentState, to: DeploymentState) -> Result<(), CoreError> {
    use DeploymentState::{Absent, Creating, Destroying, Present};

    let valid = matches!(
        (from, to),
        (Absent | Present, Creating)
            | (Creating, Present | Absent)
            | (Present, Present | Destroying)
            | (Destroying, Absent | Present)
    );

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}
