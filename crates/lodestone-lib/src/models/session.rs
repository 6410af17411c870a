use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity produced by the authentication exchange
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub username: String,

    /// Player UUID
    pub uuid: String,

    /// Access token for authentication
    pub access_token: String,

    /// User type ("mojang", "msa" or "legacy")
    #[serde(default = "default_user_type")]
    pub user_type: String,
}

fn default_user_type() -> String {
    "mojang".to_string()
}

impl SessionData {
    pub fn new(
        username: impl Into<String>,
        uuid: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            uuid: uuid.into(),
            access_token: access_token.into(),
            user_type: default_user_type(),
        }
    }
}

// The token never reaches logs through Debug
impl fmt::Debug for SessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionData")
            .field("username", &self.username)
            .field("uuid", &self.uuid)
            .field("access_token", &"<redacted>")
            .field("user_type", &self.user_type)
            .finish()
    }
}

/// Target server selected by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProfile {
    /// Stable identifier, also the client directory name
    pub id: String,

    pub name: String,
    pub address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Client version (e.g., "1.20.1")
    pub version: String,

    /// Asset index name; derived from `version` when absent
    #[serde(default)]
    pub asset_index: Option<String>,

    /// Connect to this server directly after the client starts
    #[serde(default)]
    pub auto_connect: bool,
}

fn default_port() -> u16 {
    25565
}

impl ServerProfile {
    /// Asset index to pass to the client: the explicit value, otherwise the
    /// `major.minor` prefix of the client version ("1.12.2" -> "1.12").
    pub fn asset_index(&self) -> String {
        if let Some(ref index) = self.asset_index {
            return index.clone();
        }
        let mut parts = self.version.split('.');
        match (parts.next(), parts.next()) {
            (Some(major), Some(minor)) => format!("{}.{}", major, minor),
            _ => self.version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(version: &str) -> ServerProfile {
        ServerProfile {
            id: "survival".to_string(),
            name: "Survival".to_string(),
            address: "play.example.org".to_string(),
            port: 25565,
            version: version.to_string(),
            asset_index: None,
            auto_connect: false,
        }
    }

    #[test]
    fn asset_index_derived_from_version() {
        assert_eq!(profile("1.12.2").asset_index(), "1.12");
        assert_eq!(profile("1.20").asset_index(), "1.20");
        assert_eq!(profile("b1.7").asset_index(), "b1.7");

        let mut explicit = profile("1.20.1");
        explicit.asset_index = Some("5".to_string());
        assert_eq!(explicit.asset_index(), "5");
    }

    #[test]
    fn session_debug_hides_token() {
        let session = SessionData::new("Steve", "uuid", "secretTok");
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("secretTok"));
        assert_eq!(session.user_type, "mojang");
    }

    #[test]
    fn profile_defaults_port() {
        let p: ServerProfile = serde_json::from_str(
            r#"{"id":"s","name":"S","address":"a","version":"1.20.1"}"#,
        )
        .unwrap();
        assert_eq!(p.port, 25565);
        assert!(!p.auto_connect);
    }
}
