//! Diesel schema for task list persistence.

diesel::table! {
    /// Task list aggregate roots.
    task_lists (id) {
        /// Task list identifier.
        id -> Uuid,
        /// Task list title.
        title -> Text,
        /// Free-form description.
        description -> Text,
        /// Child task identifiers in list order.
        task_ids -> Array<Uuid>,
    }
}

diesel::table! {
    /// Child tasks owned by a task list.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning task list.
        task_list_id -> Uuid,
        /// Zero-based position inside the owning list.
        position -> Int4,
        /// Task title.
        title -> Text,
        /// Free-form description.
        description -> Text,
        /// Canonical status token.
        #[max_length = 50]
        status -> Varchar,
        /// Schedule start for timed tasks.
        start_date -> Nullable<Timestamptz>,
        /// Schedule end for timed tasks.
        end_date -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(tasks -> task_lists (task_list_id));
diesel::allow_tables_to_appear_in_same_query!(task_lists, tasks);
