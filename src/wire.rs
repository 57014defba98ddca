use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: String,
    #[serde(default, deserialize_with = "optional_status")]
    pub http_status_code: Option<u16>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub docs: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Lenient {
    Text(String),
    Number(serde_json::Number),
    Null,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Text(value) => value,
        Lenient::Number(value) => value.to_string(),
        Lenient::Null => String::new(),
    })
}

fn optional_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Text(value) => value.trim().parse().ok(),
        Lenient::Number(value) => value.as_u64().and_then(|code| u16::try_from(code).ok()),
        Lenient::Null => None,
    })
}
