//! Guest list service

use sqlx::PgPool;
use std::collections::HashSet;
use thiserror::Error;

use super::{
    AgeGroup, ConfirmGuestsRequest, ConfirmGuestsResponse, ConfirmationStats, FamilyResponse,
    Guest, GuestConfirmation, GuestListResponse, RsvpStatus,
};

#[derive(Error, Debug)]
pub enum GuestError {
    #[error("No guests found with this phone number")]
    FamilyNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Confirmation ids that do not belong to the family, in request order
fn outsiders(family: &[i32], confirmations: &[GuestConfirmation]) -> Vec<i32> {
    let members: HashSet<i32> = family.iter().copied().collect();
    confirmations
        .iter()
        .map(|c| c.id)
        .filter(|id| !members.contains(id))
        .collect()
}

#[derive(Clone)]
pub struct GuestService {
    db_pool: PgPool,
}

impl GuestService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    async fn family(&self, phone: &str) -> Result<Vec<Guest>, GuestError> {
        let members = sqlx::query_as::<_, Guest>(
            "SELECT * FROM guests WHERE phone = $1 ORDER BY id ASC",
        )
        .bind(phone)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(members)
    }

    pub async fn family_by_phone(&self, phone: &str) -> Result<FamilyResponse, GuestError> {
        let members = self.family(phone).await?;
        if members.is_empty() {
            return Err(GuestError::FamilyNotFound);
        }
        Ok(FamilyResponse::new(phone.to_string(), &members))
    }

    /// Apply a family's RSVP; every id must belong to the phone's family
    pub async fn confirm_by_phone(
        &self,
        request: ConfirmGuestsRequest,
    ) -> Result<ConfirmGuestsResponse, GuestError> {
        let family: Vec<i32> = self.family(&request.phone).await?.iter().map(|g| g.id).collect();
        if family.is_empty() {
            return Err(GuestError::FamilyNotFound);
        }

        let outsiders = outsiders(&family, &request.confirmations);
        if !outsiders.is_empty() {
            return Err(GuestError::Validation(format!(
                "Guests {outsiders:?} are not part of this family"
            )));
        }

        let mut tx = self.db_pool.begin().await?;
        let mut guests = Vec::with_capacity(request.confirmations.len());
        for confirmation in &request.confirmations {
            let guest = sqlx::query_as::<_, Guest>(
                r#"
                UPDATE guests
                SET confirmed = $1,
                    confirmation_date = CASE WHEN $1 THEN NOW() ELSE NULL END
                WHERE id = $2 AND phone = $3
                RETURNING *
                "#,
            )
            .bind(confirmation.confirmed)
            .bind(confirmation.id)
            .bind(&request.phone)
            .fetch_one(&mut *tx)
            .await?;
            guests.push(guest);
        }
        tx.commit().await?;

        let confirmed = guests.iter().filter(|g| g.confirmed).count();
        tracing::info!(
            phone = %request.phone,
            updated = guests.len(),
            confirmed,
            "Guest confirmations updated"
        );

        Ok(ConfirmGuestsResponse {
            message: "Guest confirmations updated successfully".to_string(),
            phone: request.phone,
            count: guests.len(),
            guests,
        })
    }

    pub async fn list_by_status(&self, status: RsvpStatus) -> Result<GuestListResponse, GuestError> {
        let guests = sqlx::query_as::<_, Guest>(
            "SELECT * FROM guests WHERE confirmed = $1 ORDER BY name ASC",
        )
        .bind(status.is_confirmed())
        .fetch_all(&self.db_pool)
        .await?;
        Ok(GuestListResponse::new(status, guests))
    }

    pub async fn stats(&self) -> Result<ConfirmationStats, GuestError> {
        let rows: Vec<(AgeGroup, bool)> =
            sqlx::query_as("SELECT age_group, confirmed FROM guests")
                .fetch_all(&self.db_pool)
                .await?;
        Ok(ConfirmationStats::tally(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmation(id: i32) -> GuestConfirmation {
        GuestConfirmation {
            id,
            confirmed: true,
        }
    }

    #[test]
    fn test_outsiders() {
        let family = [4, 5, 6];
        assert!(outsiders(&family, &[confirmation(5), confirmation(4)]).is_empty());
        assert_eq!(
            outsiders(&family, &[confirmation(9), confirmation(6), confirmation(1)]),
            vec![9, 1]
        );
    }
}
