use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Encode raw bytes as an inline `data:<mime>;base64,<payload>` reference.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// A parsed base64 `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    /// Returns `None` for static paths and non-base64 data URIs.
    pub fn parse(reference: &'a str) -> Option<Self> {
        let rest = reference.strip_prefix("data:")?;
        let (mime, payload) = rest.split_once(";base64,")?;
        Some(Self { mime, payload })
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    pub fn decode(&self) -> Option<Vec<u8>> {
        STANDARD.decode(self.payload).ok()
    }
}
