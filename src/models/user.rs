use serde::{Deserialize, Serialize};

/// The signed-in user as seen by a single request.
///
/// Built from the verified session token by `auth::inject_current_user`;
/// `access_token` is forwarded to the data source so row-level policies
/// apply to this user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,

    #[serde(skip_serializing)]
    pub access_token: String,
}
