//! Diesel schema for assignment persistence.

diesel::table! {
    /// Task records with denormalized assignment state.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task name.
        #[max_length = 255]
        name -> Varchar,
        /// Free-text description.
        description -> Text,
        /// Deadline timestamp.
        deadline -> Timestamptz,
        /// Completion flag.
        completed -> Bool,
        /// Assignee identifier, null when unassigned.
        assigned_user -> Nullable<Uuid>,
        /// Cached assignee display name, sentinel when unassigned.
        #[max_length = 255]
        assigned_user_name -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// User records with pending-task membership sets.
    users (id) {
        /// User identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Email address, unique via `idx_users_email_unique`.
        #[max_length = 255]
        email -> Varchar,
        /// Identifiers of incomplete tasks assigned to this user.
        pending_tasks -> Array<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(tasks, users);
