//! Transaction ports backing the unit of work.

use async_trait::async_trait;

use super::StoreGateway;
use crate::domain::foundation::DomainError;

/// One open storage transaction.
///
/// Dropping a transaction that was neither committed nor rolled back must
/// discard its changes.
#[async_trait]
pub trait Transaction: Send {
    /// Gateway scoped to this transaction.
    fn gateway(&mut self) -> &mut dyn StoreGateway;

    /// Make every change visible atomically.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` if the commit fails; nothing is applied
    async fn commit(&mut self) -> Result<(), DomainError>;

    /// Discard every change.
    async fn rollback(&mut self) -> Result<(), DomainError>;
}

/// Opens transactions.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Begin a new transaction.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` if no transaction could be opened
    async fn begin(&self) -> Result<Box<dyn Transaction>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_ports_are_object_safe() {
        fn _accepts_tx(_tx: Box<dyn Transaction>) {}
        fn _accepts_manager(_manager: &dyn TransactionManager) {}
    }
}
