use serde::{Deserialize, Serialize};
use std::fmt;

/// Estado compartido por jobs, stages y tareas.
///
/// Transiciones válidas de un stage:
/// - `Waiting` -> `Running` | `Success` | `Errored`
/// - `Running` -> `Success` | `Errored`
///
/// `Success` y `Errored` son terminales: no cambian nunca más.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Waiting,
    Running,
    Success,
    Errored,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Errored)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Waiting => "waiting",
            Status::Running => "running",
            Status::Success => "success",
            Status::Errored => "errored",
        }
    }

    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "waiting" => Some(Status::Waiting),
            "running" => Some(Status::Running),
            "success" => Some(Status::Success),
            "errored" => Some(Status::Errored),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agrega los estados de un fan-out en el estado de un único stage.
///
/// Un error gana sobre todo lo demás; un conjunto vacío se considera
/// completado.
pub fn aggregate_statuses<I>(statuses: I) -> Status
    where I: IntoIterator<Item = Status>
{
    let mut all_waiting = true;
    let mut all_success = true;
    for s in statuses {
        if s == Status::Errored {
            return Status::Errored;
        }
        all_waiting &= s == Status::Waiting;
        all_success &= s == Status::Success;
    }
    if all_success {
        // Incluye el conjunto vacío (que también es "todo waiting").
        Status::Success
    } else if all_waiting {
        Status::Waiting
    } else {
        Status::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_error_wins() {
        assert_eq!(aggregate_statuses([Status::Success, Status::Errored]), Status::Errored);
        assert_eq!(aggregate_statuses([Status::Waiting, Status::Errored, Status::Running]), Status::Errored);
    }

    #[test]
    fn waiting_success_and_mixed() {
        assert_eq!(aggregate_statuses([Status::Waiting, Status::Waiting]), Status::Waiting);
        assert_eq!(aggregate_statuses([Status::Success, Status::Success]), Status::Success);
        assert_eq!(aggregate_statuses([Status::Success, Status::Waiting]), Status::Running);
        assert_eq!(aggregate_statuses([Status::Running]), Status::Running);
    }

    #[test]
    fn empty_fan_out_is_success() {
        assert_eq!(aggregate_statuses(Vec::new()), Status::Success);
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Errored).unwrap(), "\"errored\"");
        assert_eq!(Status::parse("running"), Some(Status::Running));
        assert_eq!(Status::parse("done"), None);
    }
}
