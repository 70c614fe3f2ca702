use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use shipwatch_core::{CoreError, CoreResult, ShipmentFlagStore};

use crate::database::persistence;

/// Boolean shipment columns that may be written through [`ShipmentFlagStore`].
///
/// The attribute name ends up in the SQL text, so it must come from this list.
pub const FLAG_COLUMNS: &[&str] = &["custom_email_sent"];

pub fn is_flag_column(attribute: &str) -> bool {
    FLAG_COLUMNS.contains(&attribute)
}

/// Updates one flag column on `shipments`, leaving the rest of the row alone.
pub struct PgShipmentFlagStore {
    pool: PgPool,
}

impl PgShipmentFlagStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShipmentFlagStore for PgShipmentFlagStore {
    async fn set_flag(&self, shipment_id: Uuid, attribute: &str, value: bool) -> CoreResult<()> {
        if !is_flag_column(attribute) {
            return Err(CoreError::Persistence(format!("Unknown shipment attribute: {}", attribute)));
        }

        let sql = format!("UPDATE shipments SET {} = $1 WHERE id = $2", attribute);
        let result = sqlx::query(&sql)
            .bind(value)
            .bind(shipment_id)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::Persistence(format!("Shipment not found: {}", shipment_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_known_columns_are_writable() {
        assert!(is_flag_column("custom_email_sent"));
        assert!(!is_flag_column("status"));
        assert!(!is_flag_column("custom_email_sent = true; --"));
    }
}
