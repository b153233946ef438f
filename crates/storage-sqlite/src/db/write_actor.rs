//! Serialized writer: every mutation runs on one dedicated thread inside an
//! immediate transaction, so multi-statement workflow commits are atomic
//! and SQLite writer contention stays bounded.

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use log::error;
use tokio::sync::{mpsc, oneshot};

use cardmint_core::errors::{DatabaseError, Error, Result};

type WriteJob = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

/// Lets the transaction closure carry domain errors alongside diesel
/// rollback errors.
enum TxError {
    Domain(Error),
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Diesel(err)
    }
}

#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::UnboundedSender<WriteJob>,
}

impl WriteHandle {
    /// Execute `job` inside a single immediate transaction on the writer
    /// thread. Commits when `job` returns `Ok`, rolls back when it returns
    /// `Err`.
    pub async fn exec<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let wrapped: WriteJob = Box::new(move |conn| {
            let result = conn
                .immediate_transaction::<T, TxError, _>(|tx_conn| {
                    job(tx_conn).map_err(TxError::Domain)
                })
                .map_err(|e| match e {
                    TxError::Domain(err) => err,
                    TxError::Diesel(err) => Error::Database(DatabaseError::Query(err.to_string())),
                });
            let _ = reply_tx.send(result);
        });

        self.tx.send(wrapped).map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Writer thread is no longer running".to_string(),
            ))
        })?;

        reply_rx.await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Writer dropped the reply channel".to_string(),
            ))
        })?
    }
}

/// Spawn the writer thread and return its handle.
pub fn spawn_writer(pool: Pool<ConnectionManager<SqliteConnection>>) -> WriteHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<WriteJob>();

    std::thread::spawn(move || {
        while let Some(job) = rx.blocking_recv() {
            match pool.get() {
                Ok(mut conn) => job(&mut conn),
                Err(e) => {
                    // The job's reply sender drops with it; the caller sees
                    // a closed-channel error.
                    error!("Writer could not check out a connection: {}", e);
                }
            }
        }
    });

    WriteHandle { tx }
}
