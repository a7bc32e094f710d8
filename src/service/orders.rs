//! Order upload and listing.

use std::sync::Arc;

use tracing::error;

use super::{ServiceError, is_order_number_valid};
use crate::models::Order;
use crate::store::{Ledger, StoreError};

pub struct OrderService {
    ledger: Arc<dyn Ledger>,
}

impl OrderService {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Registers an order number for the user. A duplicate insert is
    /// resolved by ownership: the same uploader gets `UploadedBySameUser`,
    /// anyone else `UploadedByAnotherUser`.
    pub async fn upload(&self, user_id: i64, number: &str) -> Result<(), ServiceError> {
        if !is_order_number_valid(number) {
            return Err(ServiceError::InvalidOrderNumber);
        }

        match self.ledger.create_order(number, user_id).await {
            Ok(()) => Ok(()),
            Err(StoreError::DuplicateKey) => self.check_existing(number, user_id).await,
            Err(err) => {
                error!(error = %err, "failed to upload order");
                Err(ServiceError::Unexpected)
            }
        }
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<Order>, ServiceError> {
        self.ledger.list_orders_by_user(user_id).await.map_err(|err| {
            error!(error = %err, "failed to list user orders");
            ServiceError::Unexpected
        })
    }

    async fn check_existing(&self, number: &str, user_id: i64) -> Result<(), ServiceError> {
        let order = self.ledger.get_order(number).await.map_err(|err| {
            error!(error = %err, "failed to load existing order");
            ServiceError::Unexpected
        })?;

        if order.user_id == user_id {
            Err(ServiceError::UploadedBySameUser)
        } else {
            Err(ServiceError::UploadedByAnotherUser)
        }
    }
}
