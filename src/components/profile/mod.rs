pub use edit::EditArgs;
pub use status::SessionStatus;
pub use view::ProfileView;

pub mod edit;
pub mod status;
pub mod view;
