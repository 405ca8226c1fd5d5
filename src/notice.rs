// Fixed messages shown after an attempt to register an expense

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: &'static str,
    pub body: &'static str,
    pub button: &'static str,
}

impl Notice {
    pub fn saved() -> Self {
        Notice {
            kind: NoticeKind::Success,
            title: "Record saved successfully",
            body: "Expense registered successfully",
            button: "OK",
        }
    }

    pub fn incomplete() -> Self {
        Notice {
            kind: NoticeKind::Error,
            title: "Save error",
            body: "All fields must be filled in",
            button: "Back",
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == NoticeKind::Success
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.body)
    }
}
