auto_derived!(
    /// User
    ///
    /// Accounts are created by the web app's OAuth flow; this side only needs
    /// enough of the document to address a notification.
    #[serde(rename_all = "camelCase")]
    pub struct User {
        /// Unique Id
        #[serde(rename = "_id")]
        pub id: String,
        /// Email address notifications are delivered to
        #[serde(skip_serializing_if = "String::is_empty", default)]
        pub email: String,
        /// Display name from the OAuth profile
        #[serde(skip_serializing_if = "Option::is_none")]
        pub display_name: Option<String>,
        /// OAuth subject id
        #[serde(skip_serializing_if = "Option::is_none")]
        pub google_id: Option<String>,
    }
);
