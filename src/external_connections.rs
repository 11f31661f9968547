use sqlx::PgConnection;

/// Owner of clients which talk to systems outside this service. Business logic
/// receives an implementation of this trait so it never has to know whether it's
/// running against a connection pool, an open transaction, or a test fake
pub trait ExternalConnectivity: Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle
    where
        Self: 'cxn_borrow;

    /// Acquire a handle which can produce a live database connection
    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}

/// A borrowed database connection acquired through [ExternalConnectivity]
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Implementors can open a database transaction, producing a transactional
/// variant of [ExternalConnectivity] whose writes only persist on commit
pub trait Transactable: Sync {
    type Handle: ExternalConnectivity + TransactionHandle;

    async fn start_transaction(&self) -> Result<Self::Handle, anyhow::Error>;
}

/// An active transaction which must be explicitly committed, otherwise its
/// writes roll back on drop
pub trait TransactionHandle {
    async fn commit(self) -> Result<(), anyhow::Error>;
}

/// Convenience trait for functions which need to both issue queries and open
/// transactions through the same connectivity value
pub trait TransactableExternalConnectivity: ExternalConnectivity + Transactable {}
impl<T: ExternalConnectivity + Transactable> TransactableExternalConnectivity for T {}
