use serde_json::Value;

use crate::error::ApiError;
use crate::store::Fields;

/// Value filled in at create time when a client leaves a field out.
#[derive(Debug, Clone, Copy)]
pub enum FieldDefault {
    Text(&'static str),
    EmptyList,
}

impl FieldDefault {
    fn value(self) -> Value {
        match self {
            FieldDefault::Text(s) => Value::String(s.to_string()),
            FieldDefault::EmptyList => Value::Array(Vec::new()),
        }
    }
}

/// Describes one CRUD collection mounted under `/api/{path}`.
#[derive(Debug)]
pub struct ResourceKind {
    pub path: &'static str,
    pub collection: &'static str,
    /// Used in "... not found" messages.
    pub label: &'static str,
    pub required: &'static [&'static str],
    /// Lists are ordered by this field, newest first.
    pub sort_field: &'static str,
    /// When set, only these fields are kept on create.
    pub fields: Option<&'static [&'static str]>,
    pub defaults: &'static [(&'static str, FieldDefault)],
}

pub static RESOURCES: [ResourceKind; 6] = [
    ResourceKind {
        path: "members",
        collection: "members",
        label: "Member",
        required: &["firstName", "lastName"],
        sort_field: "createdAt",
        fields: None,
        defaults: &[],
    },
    ResourceKind {
        path: "classes",
        collection: "classes",
        label: "Class",
        required: &["name", "schedule"],
        sort_field: "createdAt",
        fields: None,
        defaults: &[],
    },
    ResourceKind {
        path: "attendance",
        collection: "attendance",
        label: "Attendance record",
        required: &["memberId", "classId", "date"],
        sort_field: "date",
        fields: Some(&["memberId", "classId", "date", "status"]),
        defaults: &[("status", FieldDefault::Text("present"))],
    },
    ResourceKind {
        path: "payments",
        collection: "payments",
        label: "Payment",
        required: &["memberId", "amount", "date"],
        sort_field: "date",
        fields: Some(&["memberId", "amount", "date", "method", "note"]),
        defaults: &[
            ("method", FieldDefault::Text("cash")),
            ("note", FieldDefault::Text("")),
        ],
    },
    ResourceKind {
        path: "parental-consent",
        collection: "parentalConsent",
        label: "Parental consent",
        required: &["memberId", "guardianName", "guardianContact", "consentDate"],
        sort_field: "consentDate",
        fields: Some(&["memberId", "guardianName", "guardianContact", "consentDate", "note"]),
        defaults: &[("note", FieldDefault::Text(""))],
    },
    ResourceKind {
        path: "health-history",
        collection: "healthHistory",
        label: "Health history",
        required: &["memberId"],
        sort_field: "createdAt",
        fields: Some(&["memberId", "conditions", "allergies", "medications", "notes", "updatedBy"]),
        defaults: &[
            ("conditions", FieldDefault::EmptyList),
            ("allergies", FieldDefault::EmptyList),
            ("medications", FieldDefault::EmptyList),
            ("notes", FieldDefault::Text("")),
            ("updatedBy", FieldDefault::Text("")),
        ],
    },
];

/// Keys the server owns; client values for them are dropped.
const SERVER_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// "a", "a and b", "a, b, and c"
fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [one] => (*one).to_string(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

pub fn expect_object(body: Value) -> Result<Fields, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::Validation("request body must be a JSON object".into())),
    }
}

impl ResourceKind {
    pub fn not_found(&self) -> ApiError {
        ApiError::NotFound(format!("{} not found", self.label))
    }

    pub fn missing_fields(&self, payload: &Fields) -> Vec<&'static str> {
        self.required
            .iter()
            .copied()
            .filter(|field| is_blank(payload.get(*field)))
            .collect()
    }

    /// Validated, shaped field set for a new record, without timestamps.
    pub fn prepare_create(&self, body: Value) -> Result<Fields, ApiError> {
        let mut payload = expect_object(body)?;

        let missing = self.missing_fields(&payload);
        if !missing.is_empty() {
            let verb = if missing.len() == 1 { "is" } else { "are" };
            return Err(ApiError::Validation(format!("{} {verb} required", join_names(&missing))));
        }

        for key in SERVER_FIELDS {
            payload.remove(key);
        }
        if let Some(allowed) = self.fields {
            payload.retain(|key, _| allowed.contains(&key.as_str()));
        }
        for (field, default) in self.defaults {
            if is_blank(payload.get(*field)) {
                payload.insert((*field).to_string(), default.value());
            }
        }
        Ok(payload)
    }

    /// Patch for a shallow merge: client keys minus the server-owned ones.
    /// `updatedAt` is stamped by the caller.
    pub fn prepare_update(&self, body: Value) -> Result<Fields, ApiError> {
        let mut patch = expect_object(body)?;
        for key in SERVER_FIELDS {
            patch.remove(key);
        }
        Ok(patch)
    }
}
