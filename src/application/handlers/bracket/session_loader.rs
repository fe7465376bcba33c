//! Ownership-checked session loading shared by the bracket handlers.

use crate::domain::foundation::{OwnedByUser, SessionId, UserId};
use crate::domain::session::{BracketError, Session};
use crate::ports::StoreGateway;

/// Loads a session the caller owns.
///
/// A session owned by someone else is reported exactly like a missing one.
pub(crate) async fn load_owned_session(
    store: &mut dyn StoreGateway,
    session_id: &SessionId,
    user_id: &UserId,
    for_update: bool,
) -> Result<Session, BracketError> {
    let session = if for_update {
        store.load_session_for_update(session_id).await?
    } else {
        store.load_session(session_id).await?
    };
    let session = session.ok_or_else(|| BracketError::session_not_found(*session_id))?;

    session.check_ownership(user_id)?;
    Ok(session)
}
