pub mod ports;
pub mod braineac_use_case;
pub mod gtex_use_case;
pub mod ld_pair_use_case;

use crate::error::{QueryError, QueryResult};
use std::future::Future;
use std::time::Duration;

/// Outcome of a query loop: what survived plus how the remote calls went.
#[derive(Debug, Clone, PartialEq)]
pub struct Screened<T> {
    pub retained: Vec<T>,
    pub queried: usize,
    pub failed: usize,
}

impl<T> Default for Screened<T> {
    fn default() -> Self {
        Self {
            retained: Vec::new(),
            queried: 0,
            failed: 0,
        }
    }
}

/// Awaits one remote call for at most `wait`.
pub(crate) async fn bounded<T, F>(wait: Duration, call: F) -> QueryResult<T>
where
    F: Future<Output = QueryResult<T>>,
{
    match tokio::time::timeout(wait, call).await {
        Ok(result) => result,
        Err(_) => Err(QueryError::Timeout(wait)),
    }
}
