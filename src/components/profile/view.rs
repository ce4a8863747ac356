use std::fmt;

use pf_profile::Profile;

/// Plain-text rendering of a profile for the terminal
#[derive(Debug, Clone, Copy)]
pub struct ProfileView<'a> {
    profile: &'a Profile,
}

impl<'a> ProfileView<'a> {
    pub fn new(profile: &'a Profile) -> Self {
        Self { profile }
    }
}

impl fmt::Display for ProfileView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile = self.profile;
        let info = &profile.basic_info;
        let links = &profile.social_links;

        let mut title = profile.full_name();
        if profile.verified {
            title.push_str(" ✓");
        }
        writeln!(f, "{title}")?;
        writeln!(f, "{}", "-".repeat(50))?;

        row(f, "Email", info.email.as_deref().unwrap_or(""))?;
        row(f, "Phone", &info.phone)?;
        row(f, "User type", &info.user_type)?;
        row(f, "Nature", &info.nature_type)?;
        row(f, "Document", &info.document)?;
        row(f, "Photo", &photo_label(profile.photo.as_deref()))?;

        if !info.biography.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", info.biography)?;
        }

        let links = [
            ("LinkedIn", &links.linkedin),
            ("Twitter", &links.twitter),
            ("GitHub", &links.github),
            ("Website", &links.website),
        ];
        if links.iter().any(|(_, url)| !url.is_empty()) {
            writeln!(f)?;
            for (label, url) in links {
                row(f, label, url)?;
            }
        }

        if !profile.education.is_empty() {
            section(f, "Education")?;
            for item in &profile.education {
                writeln!(f, "  {} - {}", item.institution, item.degree)?;
            }
        }

        if !profile.experience.is_empty() {
            section(f, "Experience")?;
            for item in &profile.experience {
                writeln!(f, "  {} at {}", item.position, item.company)?;
            }
        }

        if !profile.skills.is_empty() {
            section(f, "Skills")?;
            let skills: Vec<String> = profile
                .skills
                .iter()
                .map(|skill| match &skill.level {
                    Some(level) => format!("{} ({level})", skill.name),
                    None => skill.name.clone(),
                })
                .collect();
            writeln!(f, "  {}", skills.join(", "))?;
        }

        if !profile.portfolio.is_empty() {
            section(f, "Portfolio")?;
            for item in &profile.portfolio {
                match &item.url {
                    Some(url) => writeln!(f, "  {} <{url}>", item.title)?,
                    None => writeln!(f, "  {}", item.title)?,
                }
            }
        }

        Ok(())
    }
}

fn row(f: &mut fmt::Formatter<'_>, label: &str, value: &str) -> fmt::Result {
    let value = if value.is_empty() { "-" } else { value };
    writeln!(f, "  {:<12} {}", format!("{label}:"), value)
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{title}")
}

/// Inline photos are too long to print
fn photo_label(photo: Option<&str>) -> String {
    match photo {
        None => String::new(),
        Some(url) if url.starts_with("data:") => "(stored locally)".to_string(),
        Some(url) => url.to_string(),
    }
}
