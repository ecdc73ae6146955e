//! Request model and form decoding.

use crate::model::answer_set::AnswerSetInput;
use crate::model::person::User;
use crate::model::question::{ChoiceId, QuestionId};
use crate::service::FieldError;
use std::collections::BTreeMap;

const QUESTION_FIELD_PREFIX: &str = "question_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Submitted form fields; a key may repeat, as with HTML multi-selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one value for `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(key.into()).or_default().push(value.into());
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

/// One request handed to the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub form: FormData,
    /// `None` for anonymous requests.
    pub viewer: Option<User>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: BTreeMap::new(),
            form: FormData::default(),
            viewer: None,
        }
    }

    pub fn post(path: impl Into<String>, form: FormData) -> Self {
        Self {
            method: Method::Post,
            form,
            ..Self::get(path)
        }
    }

    pub fn as_user(mut self, viewer: User) -> Self {
        self.viewer = Some(viewer);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

/// Decodes an answer-set form.
///
/// `question_<id>` fields carry choice ids, blank values are skipped.
/// `latitude` and `longitude` are optional decimals.
pub fn parse_answer_set_form(form: &FormData) -> Result<AnswerSetInput, Vec<FieldError>> {
    let mut input = AnswerSetInput::default();
    let mut errors = Vec::new();

    for (key, values) in form.iter() {
        let Some(raw_id) = key.strip_prefix(QUESTION_FIELD_PREFIX) else {
            continue;
        };
        let Ok(question_id) = raw_id.parse::<QuestionId>() else {
            errors.push(FieldError::new(key, "unknown question"));
            continue;
        };

        let mut choices: Vec<ChoiceId> = Vec::new();
        for value in values.iter().map(|value| value.trim()).filter(|value| !value.is_empty()) {
            match value.parse::<ChoiceId>() {
                Ok(choice_id) => choices.push(choice_id),
                Err(_) => errors.push(FieldError::new(key, format!("`{value}` is not a valid choice"))),
            }
        }
        if !choices.is_empty() {
            input.answers.insert(question_id, choices);
        }
    }

    input.latitude = parse_coordinate(form, "latitude", &mut errors);
    input.longitude = parse_coordinate(form, "longitude", &mut errors);

    if errors.is_empty() {
        Ok(input)
    } else {
        Err(errors)
    }
}

fn parse_coordinate(form: &FormData, field: &str, errors: &mut Vec<FieldError>) -> Option<f64> {
    let raw = form.first(field)?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            errors.push(FieldError::new(field, "enter a number"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_answer_set_form, FormData};

    #[test]
    fn decodes_repeated_question_fields_and_location() {
        let form = FormData::new()
            .with("question_1", "11")
            .with("question_2", "21")
            .with("question_2", "22")
            .with("question_3", "")
            .with("latitude", "51.5")
            .with("longitude", " -0.12 ")
            .with("csrfmiddlewaretoken", "ignored");

        let input = parse_answer_set_form(&form).unwrap();
        assert_eq!(input.answers.get(&1), Some(&vec![11]));
        assert_eq!(input.answers.get(&2), Some(&vec![21, 22]));
        assert!(!input.answers.contains_key(&3));
        assert_eq!(input.latitude, Some(51.5));
        assert_eq!(input.longitude, Some(-0.12));
    }

    #[test]
    fn reports_every_malformed_field() {
        let form = FormData::new()
            .with("question_x", "1")
            .with("question_1", "one")
            .with("latitude", "north");

        let errors = parse_answer_set_form(&form).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|err| err.field.as_str()).collect();
        assert_eq!(fields, vec!["question_1", "question_x", "latitude"]);
    }
}
