/// The parts of an inbound webhook call that signature validation needs.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    pub url: String,
    pub data: Vec<u8>,
    headers: Vec<(String, String)>,
}

impl WebhookRequest {
    pub fn new(url: &str, data: impl Into<Vec<u8>>) -> Self {
        Self { url: url.to_string(), data: data.into(), headers: Vec::new() }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// First value for `name`, compared ASCII case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
