use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const MAX_TEXT_LEN: usize = 255;

const REQUIRED: &str = "This field is required.";

/// Field name → messages, in field order for stable output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn add(&mut self, field: &str, message: String) {
        self.0.entry(field.to_string()).or_default().push(message);
    }

    /// Trim `value` and check it against the text field limits. Returns the
    /// cleaned value when it passes.
    fn text(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let cleaned = value.map(str::trim).unwrap_or("");
        if cleaned.is_empty() {
            self.add(field, REQUIRED.to_string());
            return None;
        }
        let len = cleaned.chars().count();
        if len > MAX_TEXT_LEN {
            self.add(
                field,
                format!("Ensure this value has at most {MAX_TEXT_LEN} characters (it has {len})."),
            );
            return None;
        }
        Some(cleaned.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PollAddForm {
    pub text: Option<String>,
    pub choice1: Option<String>,
    pub choice2: Option<String>,
}

pub struct NewPoll {
    pub text: String,
    pub choice1: String,
    pub choice2: String,
}

impl PollAddForm {
    pub fn validate(&self) -> Result<NewPoll, FormErrors> {
        let mut errors = FormErrors::default();
        let text = errors.text("text", self.text.as_deref());
        let choice1 = errors.text("choice1", self.choice1.as_deref());
        let choice2 = errors.text("choice2", self.choice2.as_deref());
        match (text, choice1, choice2) {
            (Some(text), Some(choice1), Some(choice2)) => Ok(NewPoll {
                text,
                choice1,
                choice2,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EditPollForm {
    pub text: Option<String>,
}

impl EditPollForm {
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        errors.text("text", self.text.as_deref()).ok_or(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChoiceForm {
    pub choice_text: Option<String>,
}

impl ChoiceForm {
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        errors
            .text("choice_text", self.choice_text.as_deref())
            .ok_or(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteForm {
    pub choice: Option<String>,
}

/// Form payload for a view: the submitted values plus any errors.
pub fn form_json<T: Serialize>(data: &T, errors: &FormErrors) -> Value {
    json!({
        "data": data,
        "errors": errors,
    })
}
