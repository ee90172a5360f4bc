// Mirrors the SQL in the original prototype's `db.py` (SQL_CREATE_*).

diesel::table! {
    bots (bot_id) {
        bot_id -> SmallInt,
        bot_token -> Nullable<Varchar>,
    }
}

diesel::table! {
    files (file_uuid) {
        file_uuid -> Binary,
        file_id -> Varchar,
        msg_id -> Integer,
        bot_id -> SmallInt,
        created_at -> Timestamp,
    }
}

diesel::table! {
    queues (file_uuid) {
        file_uuid -> Binary,
        file_id -> Nullable<Varchar>,
        state -> SmallInt,
        msg_id -> Nullable<Integer>,
        bot_id -> Nullable<SmallInt>,
        retry_count -> Integer,
        created_at -> Timestamp,
        updated_at -> Nullable<Timestamp>,
        available_at -> Timestamp,
    }
}

diesel::table! {
    url_caches (file_uuid) {
        file_uuid -> Binary,
        file_id -> Nullable<Varchar>,
        bot_token -> Nullable<Varchar>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    gc_runs (run_id) {
        run_id -> Integer,
        run_at -> Timestamp,
        cnt_10 -> Integer,
        cnt_20 -> Integer,
        cnt_30 -> Integer,
        cnt_40 -> Integer,
        cnt_100 -> Integer,
    }
}

diesel::joinable!(files -> bots (bot_id));
diesel::joinable!(queues -> bots (bot_id));

diesel::allow_tables_to_appear_in_same_query!(bots, files, queues, url_caches, gc_runs,);
