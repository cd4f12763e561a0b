//! Repository for the trade journal.

use crate::domain::{Decimal, OrderType, Side, Symbol, Trade, TimeMs};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

pub struct TradeRepository {
    pool: SqlitePool,
}

impl TradeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TradeRepository { pool }
    }

    /// Append a trade to the journal idempotently.
    ///
    /// Returns false if a trade with the same id was already journaled.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_trade(&self, trade: &Trade) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO trades (id, time_ms, symbol, side, quantity, price, order_type, realized_pnl)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(trade.id.to_string())
        .bind(trade.time_ms.as_ms())
        .bind(trade.symbol.as_str())
        .bind(trade.side.to_string())
        .bind(trade.quantity.to_canonical_string())
        .bind(trade.price.to_canonical_string())
        .bind(trade.order_type.map(|t| t.to_string()))
        .bind(trade.realized_pnl.to_canonical_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All journaled trades for `symbol` (or every symbol), in insertion order.
    pub async fn query_trades(&self, symbol: Option<&Symbol>) -> Result<Vec<Trade>, sqlx::Error> {
        let rows = match symbol {
            Some(symbol) => {
                sqlx::query(
                    r#"
                    SELECT id, time_ms, symbol, side, quantity, price, order_type, realized_pnl
                    FROM trades
                    WHERE symbol = ?
                    ORDER BY seq ASC
                    "#,
                )
                .bind(symbol.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, time_ms, symbol, side, quantity, price, order_type, realized_pnl
                    FROM trades
                    ORDER BY seq ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(trade_from_row).collect()
    }

    /// Record a realized P&L reset taken after `trade_count` trades of `symbol`.
    pub async fn insert_pnl_reset(
        &self,
        symbol: &Symbol,
        trade_count: usize,
        time_ms: TimeMs,
    ) -> Result<(), sqlx::Error> {
        let trade_count = i64::try_from(trade_count).map_err(decode_err)?;
        sqlx::query(
            r#"
            INSERT INTO pnl_resets (symbol, trade_count, time_ms)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(symbol.as_str())
        .bind(trade_count)
        .bind(time_ms.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Trade counts at which `symbol` was reset, in the order the resets happened.
    pub async fn query_pnl_resets(&self, symbol: &Symbol) -> Result<Vec<usize>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT trade_count
            FROM pnl_resets
            WHERE symbol = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(symbol.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let count: i64 = row.try_get("trade_count")?;
                usize::try_from(count).map_err(decode_err)
            })
            .collect()
    }

    pub async fn count_trades(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) FROM trades")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }
}

fn decode_err<E>(err: E) -> sqlx::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    sqlx::Error::Decode(err.into())
}

fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str_canonical(&raw).map_err(decode_err)
}

fn trade_from_row(row: &SqliteRow) -> Result<Trade, sqlx::Error> {
    let id: String = row.try_get("id")?;
    let side: String = row.try_get("side")?;
    let order_type: Option<String> = row.try_get("order_type")?;
    let symbol: String = row.try_get("symbol")?;

    Ok(Trade {
        id: Uuid::parse_str(&id).map_err(decode_err)?,
        time_ms: TimeMs::new(row.try_get("time_ms")?),
        symbol: Symbol::new(symbol),
        side: Side::from_str(&side).map_err(decode_err)?,
        quantity: decimal_column(row, "quantity")?,
        price: decimal_column(row, "price")?,
        order_type: order_type
            .as_deref()
            .map(OrderType::from_str)
            .transpose()
            .map_err(decode_err)?,
        realized_pnl: decimal_column(row, "realized_pnl")?,
    })
}
