use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::{bots, files, gc_runs, queues, url_caches};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = bots, primary_key(bot_id), check_for_backend(diesel::mysql::Mysql))]
pub struct BotRow {
    pub bot_id: i16,
    pub bot_token: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bots)]
pub struct NewBotRow<'a> {
    pub bot_token: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = files, primary_key(file_uuid), check_for_backend(diesel::mysql::Mysql))]
pub struct FileRow {
    pub file_uuid: Vec<u8>,
    pub file_id: String,
    pub msg_id: i32,
    pub bot_id: i16,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = files)]
pub struct NewFileRow {
    pub file_uuid: Vec<u8>,
    pub file_id: String,
    pub msg_id: i32,
    pub bot_id: i16,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = queues, primary_key(file_uuid), check_for_backend(diesel::mysql::Mysql))]
pub struct QueueRow {
    pub file_uuid: Vec<u8>,
    pub file_id: Option<String>,
    pub state: i16,
    pub msg_id: Option<i32>,
    pub bot_id: Option<i16>,
    pub retry_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub available_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = queues)]
pub struct NewQueueRow {
    pub file_uuid: Vec<u8>,
    pub state: i16,
    pub available_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = url_caches, primary_key(file_uuid), check_for_backend(diesel::mysql::Mysql))]
pub struct UrlCacheRow {
    pub file_uuid: Vec<u8>,
    pub file_id: Option<String>,
    pub bot_token: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = url_caches)]
pub struct NewUrlCacheRow {
    pub file_uuid: Vec<u8>,
    pub file_id: String,
    pub bot_token: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = gc_runs)]
pub struct NewGcRunRow {
    pub cnt_10: i32,
    pub cnt_20: i32,
    pub cnt_30: i32,
    pub cnt_40: i32,
    pub cnt_100: i32,
}
