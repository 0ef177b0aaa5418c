use crate::controller::{Controller, Gesture};
use crate::selection::Selection;

/// How a picking session ended.
///
/// `Cancelled` is distinct from a commit with zero selected bins.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Committed(Selection),
    Cancelled,
}

impl SessionOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionOutcome::Cancelled)
    }

    pub fn selection(&self) -> Option<&Selection> {
        match self {
            SessionOutcome::Committed(s) => Some(s),
            SessionOutcome::Cancelled => None,
        }
    }

    pub fn into_selection(self) -> Option<Selection> {
        match self {
            SessionOutcome::Committed(s) => Some(s),
            SessionOutcome::Cancelled => None,
        }
    }
}

/// Drive a controller from a scripted gesture stream.
///
/// Gestures after the first terminal one are not consumed. If the stream runs
/// out while the session is still active it is committed, as closing the
/// window would.
pub fn run_gestures<I>(mut controller: Controller<'_>, gestures: I) -> SessionOutcome
where
    I: IntoIterator<Item = Gesture>,
{
    for gesture in gestures {
        controller.handle(gesture);
        if let Some(outcome) = controller.outcome() {
            return outcome;
        }
    }
    controller.handle(Gesture::Close);
    controller
        .outcome()
        .unwrap_or(SessionOutcome::Cancelled)
}
