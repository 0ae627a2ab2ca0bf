use serde::{de, Deserialize, Deserializer, Serialize};

/// Request for POST /tts, /api/tts/synthesize and /generate
///
/// `pitch`, `rate` and `gap` accept numbers or numeric strings; the browser
/// front-ends post raw slider values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, deserialize_with = "flexible_i32")]
    pub pitch: i32,
    #[serde(default, alias = "speed", deserialize_with = "flexible_i32")]
    pub rate: i32,
    #[serde(default, deserialize_with = "flexible_u32", skip_serializing_if = "Option::is_none")]
    pub gap: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

impl NumberOrString {
    fn into_i64<E: de::Error>(self) -> Result<i64, E> {
        match self {
            NumberOrString::Int(value) => Ok(value),
            NumberOrString::Float(value) if value.is_finite() => Ok(value.round() as i64),
            NumberOrString::Float(value) => Err(E::custom(format!("invalid number {value}"))),
            NumberOrString::Str(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Ok(0);
                }
                trimmed
                    .parse::<i64>()
                    .or_else(|_| trimmed.parse::<f64>().map(|f| f.round() as i64))
                    .map_err(|_| E::custom(format!("expected a number, got '{trimmed}'")))
            }
        }
    }
}

fn flexible_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(0),
        Some(value) => {
            let value = value.into_i64::<D::Error>()?;
            i32::try_from(value).map_err(|_| de::Error::custom(format!("{value} is out of range")))
        }
    }
}

fn flexible_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) => {
            let value = value.into_i64::<D::Error>()?;
            u32::try_from(value)
                .map(Some)
                .map_err(|_| de::Error::custom(format!("{value} must be a non-negative integer")))
        }
    }
}

/// Response for POST /generate
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub file_url: String,
    pub filename: String,
    pub provider: String,
    pub cached: bool,
}
