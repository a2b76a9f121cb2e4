pub mod connections;
pub mod profiles;

pub use connections::{Connection, ConnectionRequest, ConnectionRequestRow, ConnectionState, RequestStatus};
pub use profiles::{ExperienceLevel, NewProfile, Pattern, PatternRow, ProfileRow, UserId, UserProfile};
