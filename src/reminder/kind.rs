use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ReminderKind {
    EyeRest,
    Posture,
    WorkBreak,
}

impl ReminderKind {
    /// Priority order; kinds expiring on the same tick fire in this order.
    pub const ALL: [ReminderKind; 3] = [
        ReminderKind::EyeRest,
        ReminderKind::Posture,
        ReminderKind::WorkBreak,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            ReminderKind::EyeRest => 0,
            ReminderKind::Posture => 1,
            ReminderKind::WorkBreak => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReminderKind::EyeRest => "Eye Rest",
            ReminderKind::Posture => "Posture",
            ReminderKind::WorkBreak => "Work Break",
        }
    }

    /// Overlay page rendered for this kind.
    pub fn page(self) -> &'static str {
        match self {
            ReminderKind::EyeRest => "eye-rest.html",
            ReminderKind::Posture => "posture.html",
            ReminderKind::WorkBreak => "work-break.html",
        }
    }
}
