use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ValidationError;
use crate::models::{AccountName, Profile};

/// A user's edit: only the fields they touched are `Some`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEdit {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub user_type: Option<String>,
    pub nature_type: Option<String>,
    pub biography: Option<String>,
    pub document: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
}

impl ProfileEdit {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Full replacement document for `PUT usuario/perfil/`.
///
/// The server expects every editable field, so this is always built from a
/// complete profile via [`ProfileUpdate::merge`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub user: AccountName,
    pub telefono: String,
    pub tipo_usuario: String,
    pub tipo_naturaleza: String,
    pub biografia: String,
    pub documento: String,
    pub linkedin: String,
    pub twitter: String,
    pub github: String,
    pub sitio_web: String,
    pub esta_verificado: bool,
}

impl ProfileUpdate {
    /// Layer `edit` over the last-loaded profile
    pub fn merge(base: &Profile, edit: &ProfileEdit) -> Self {
        fn pick(edited: &Option<String>, current: &str) -> String {
            edited.clone().unwrap_or_else(|| current.to_string())
        }

        let info = &base.basic_info;
        let links = &base.social_links;

        Self {
            user: AccountName {
                first_name: pick(&edit.first_name, &info.first_name),
                last_name: pick(&edit.last_name, &info.last_name),
                email: edit.email.clone().or_else(|| info.email.clone()),
            },
            telefono: pick(&edit.phone, &info.phone),
            tipo_usuario: pick(&edit.user_type, &info.user_type),
            tipo_naturaleza: pick(&edit.nature_type, &info.nature_type),
            biografia: pick(&edit.biography, &info.biography),
            documento: pick(&edit.document, &info.document),
            linkedin: pick(&edit.linkedin, &links.linkedin),
            twitter: pick(&edit.twitter, &links.twitter),
            github: pick(&edit.github, &links.github),
            sitio_web: pick(&edit.website, &links.website),
            esta_verificado: base.verified,
        }
    }

    /// Names must be present; social links, when given, must parse as URLs
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user.first_name.trim().is_empty() {
            return Err(ValidationError::BlankField("first_name"));
        }
        if self.user.last_name.trim().is_empty() {
            return Err(ValidationError::BlankField("last_name"));
        }

        for (field, value) in [
            ("linkedin", &self.linkedin),
            ("twitter", &self.twitter),
            ("github", &self.github),
            ("sitio_web", &self.sitio_web),
        ] {
            let value = value.trim();
            if !value.is_empty() && Url::parse(value).is_err() {
                return Err(ValidationError::InvalidUrl {
                    field,
                    value: value.to_string(),
                });
            }
        }

        Ok(())
    }

    /// The profile as it will look once the server accepts this update
    pub fn apply_to(&self, profile: &Profile) -> Profile {
        let mut updated = profile.clone();
        let info = &mut updated.basic_info;
        info.first_name = self.user.first_name.clone();
        info.last_name = self.user.last_name.clone();
        info.email = self.user.email.clone();
        info.phone = self.telefono.clone();
        info.user_type = self.tipo_usuario.clone();
        info.nature_type = self.tipo_naturaleza.clone();
        info.biography = self.biografia.clone();
        info.document = self.documento.clone();

        let links = &mut updated.social_links;
        links.linkedin = self.linkedin.clone();
        links.twitter = self.twitter.clone();
        links.github = self.github.clone();
        links.website = self.sitio_web.clone();

        updated
    }
}
