use serde::{Deserialize, Serialize};

/// A user's profile as held by the client.
///
/// The remote API still answers with the older flat layout on some routes;
/// [`ProfilePayload`] accepts both and converts into this shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub basic_info: BasicInfo,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub portfolio: Vec<PortfolioItem>,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.basic_info.first_name, self.basic_info.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BasicInfo {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub user_type: String,
    #[serde(default)]
    pub nature_type: String,
    #[serde(default)]
    pub biography: String,
    #[serde(default)]
    pub document: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialLinks {
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub website: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Education {
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Experience {
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Skill {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortfolioItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Profile body as returned by `GET perfil/`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProfilePayload {
    Nested(Profile),
    Legacy(LegacyProfile),
}

impl From<ProfilePayload> for Profile {
    fn from(payload: ProfilePayload) -> Self {
        match payload {
            ProfilePayload::Nested(profile) => profile,
            ProfilePayload::Legacy(legacy) => legacy.into(),
        }
    }
}

/// Account names nested under `user` in the remote API
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountName {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The remote API's flat profile layout
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyProfile {
    pub user: AccountName,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub tipo_usuario: Option<String>,
    #[serde(default)]
    pub tipo_naturaleza: Option<String>,
    #[serde(default)]
    pub biografia: Option<String>,
    #[serde(default)]
    pub documento: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub sitio_web: Option<String>,
    #[serde(default)]
    pub esta_verificado: bool,
    #[serde(default)]
    pub foto: Option<String>,
}

impl From<LegacyProfile> for Profile {
    fn from(legacy: LegacyProfile) -> Self {
        Self {
            basic_info: BasicInfo {
                first_name: legacy.user.first_name,
                last_name: legacy.user.last_name,
                email: legacy.user.email,
                phone: legacy.telefono.unwrap_or_default(),
                user_type: legacy.tipo_usuario.unwrap_or_default(),
                nature_type: legacy.tipo_naturaleza.unwrap_or_default(),
                biography: legacy.biografia.unwrap_or_default(),
                document: legacy.documento.unwrap_or_default(),
            },
            social_links: SocialLinks {
                linkedin: legacy.linkedin.unwrap_or_default(),
                twitter: legacy.twitter.unwrap_or_default(),
                github: legacy.github.unwrap_or_default(),
                website: legacy.sitio_web.unwrap_or_default(),
            },
            verified: legacy.esta_verificado,
            photo: legacy.foto.filter(|url| !url.is_empty()),
            ..Default::default()
        }
    }
}

/// Acknowledgement body for mutating calls. An empty body is an empty ack.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
