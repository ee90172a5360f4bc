use diesel::prelude::*;
use diesel_async::{AsyncMysqlConnection, RunQueryDsl};

use tgcdn_schema::models::{BotRow, NewBotRow};
use tgcdn_schema::schema::bots::dsl as bots_dsl;

use crate::error::StoreError;
use crate::pool::DbPool;

/// Credential identity: `bot_id <-> token` is bijective and immutable once
/// created. `bots` is append-only.
#[derive(Clone)]
pub struct BotsRepository {
    pool: DbPool,
}

impl BotsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<BotRow>, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = bots_dsl::bots
            .filter(bots_dsl::bot_token.eq(token))
            .first::<BotRow>(&mut conn)
            .await
            .optional()?;
        Ok(row)
    }

    pub async fn get_token(&self, bot_id: i16) -> Result<Option<String>, StoreError> {
        let mut conn = self.pool.get().await?;
        let token: Option<String> = bots_dsl::bots
            .filter(bots_dsl::bot_id.eq(bot_id))
            .select(bots_dsl::bot_token)
            .first::<Option<String>>(&mut conn)
            .await
            .optional()?
            .flatten();
        Ok(token)
    }

    /// Write-once on first observation: looks the token up, and only
    /// inserts a new row if it wasn't already registered. Tolerates a
    /// concurrent insert racing us by retrying the lookup on a unique-key
    /// conflict instead of failing.
    pub async fn get_or_create(&self, token: &str) -> Result<BotRow, StoreError> {
        if let Some(row) = self.find_by_token(token).await? {
            return Ok(row);
        }

        let mut conn = self.pool.get().await?;
        let insert = diesel::insert_into(bots_dsl::bots)
            .values(NewBotRow { bot_token: token })
            .execute(&mut conn)
            .await;

        match insert {
            Ok(_) => {}
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => {}
            Err(e) => return Err(e.into()),
        }
        drop(conn);

        self.find_by_token(token)
            .await?
            .ok_or(StoreError::Database(diesel::result::Error::NotFound))
    }
}
