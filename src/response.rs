use serde::Serialize;

/// Success body shared by every route: `{ ok: true, id?, data? }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            ok: true,
            id: None,
            data: Some(data),
        }
    }

    pub fn created(id: impl Into<String>, data: T) -> Self {
        Self {
            ok: true,
            id: Some(id.into()),
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    /// Bare acknowledgement, used by deletes.
    pub fn ack() -> Self {
        Self {
            ok: true,
            id: None,
            data: None,
        }
    }
}
