use clap::Args;
use pf_profile::ProfileEdit;

/// Fields to change; anything left out keeps its current value
#[derive(Debug, Clone, Default, Args)]
pub struct EditArgs {
    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    /// e.g. instructor, estudiante
    #[arg(long)]
    pub user_type: Option<String>,

    /// natural or juridica
    #[arg(long)]
    pub nature_type: Option<String>,

    #[arg(long)]
    pub biography: Option<String>,

    #[arg(long)]
    pub document: Option<String>,

    #[arg(long)]
    pub linkedin: Option<String>,

    #[arg(long)]
    pub twitter: Option<String>,

    #[arg(long)]
    pub github: Option<String>,

    #[arg(long)]
    pub website: Option<String>,
}

impl From<EditArgs> for ProfileEdit {
    fn from(args: EditArgs) -> Self {
        ProfileEdit {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
            user_type: args.user_type,
            nature_type: args.nature_type,
            biography: args.biography,
            document: args.document,
            linkedin: args.linkedin,
            twitter: args.twitter,
            github: args.github,
            website: args.website,
        }
    }
}
