use serde::Serialize;

/// `{ "status": "success", "data": ... }`, with `data` omitted for
/// acknowledgements.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    pub fn ack() -> Self {
        Self {
            status: "success",
            data: None,
        }
    }
}
