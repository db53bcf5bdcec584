use serde::Serialize;

/// A registered account. The password is stored verbatim and never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub login_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub occupation: Option<String>,
}

/// The display subset of a user: directory entries and resolved authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Photo {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub file_name: String,
    pub date_time: String,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub comment: String,
    pub date_time: String,
    /// `None` when the author row no longer resolves.
    pub user: Option<UserSummary>,
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    #[serde(rename = "_id")]
    pub id: String,
    pub comment: String,
    pub date_time: String,
    pub user: Option<UserSummary>,
}
