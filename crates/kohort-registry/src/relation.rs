//! Users, relations and sessions.

use tracing::{debug, info};

use kohort_core::{
  ident::UserId,
  relation::{Account, Relation, StoredRelation, UserRow},
  sheet::{data_rows, SheetStore},
  tab::Tab,
};

use crate::{Error, Registry, Result, Session};

impl<S: SheetStore> Registry<S> {
  /// The user id registered for `email`, creating one on first sight.
  ///
  /// Emails compare case-insensitively after trimming. When several rows
  /// match, the first one in sheet order wins.
  pub async fn resolve_or_create_user(&self, email: &str) -> Result<UserId> {
    let email = email.trim();
    let grid = self
      .store
      .read(Tab::Users.layout_range())
      .await
      .map_err(Error::store)?;

    let existing = data_rows(&grid)
      .filter_map(|(_, cells)| UserRow::from_cells(cells))
      .find(|row| row.email.trim().eq_ignore_ascii_case(email));
    if let Some(row) = existing {
      debug!(email, user_id = %row.user_id, "resolved user");
      return Ok(row.user_id);
    }

    let row = UserRow { user_id: UserId::generate(), email: email.to_string() };
    self
      .store
      .append(Tab::Users.layout_range(), vec![row.to_cells()])
      .await
      .map_err(Error::store)?;
    info!(email, user_id = %row.user_id, "registered user");
    Ok(row.user_id)
  }

  /// Every relation row belonging to `user_id`, in sheet order.
  pub async fn list_relations_for_user(&self, user_id: &UserId) -> Result<Vec<StoredRelation>> {
    let grid = self
      .store
      .read(Tab::Relation.layout_range())
      .await
      .map_err(Error::store)?;
    let relations: Vec<_> = data_rows(&grid)
      .filter_map(|(row, cells)| {
        Relation::from_cells(cells).map(|relation| StoredRelation { row, relation })
      })
      .filter(|stored| &stored.relation.user_id == user_id)
      .collect();
    debug!(%user_id, count = relations.len(), "listed relations");
    Ok(relations)
  }

  /// Resolve the signed-in account and load the relations it owns.
  pub async fn open_session(&self, account: Option<&Account>) -> Result<Session> {
    let account = account
      .filter(|a| !a.email.trim().is_empty())
      .ok_or(Error::NotSignedIn)?;
    let user_id = self.resolve_or_create_user(&account.email).await?;
    let relations = self.list_relations_for_user(&user_id).await?;
    Ok(Session::new(account.clone(), user_id, relations))
  }

  /// Reload the session's relation set from the sheet.
  pub async fn refresh(&self, session: &mut Session) -> Result<()> {
    let relations = self.list_relations_for_user(session.user_id()).await?;
    session.replace(relations);
    Ok(())
  }

  /// Mint a relation for the session's user and append it to `Relasi`.
  ///
  /// The returned value is the only handle on the new ids; callers thread it
  /// into whatever they append next.
  pub async fn create_relation(&self, session: &mut Session) -> Result<Relation> {
    let relation = Relation::mint(session.user_id().clone());
    let written = self
      .store
      .append(Tab::Relation.layout_range(), vec![relation.to_cells()])
      .await
      .map_err(Error::store)?;
    let row = written.start_row();
    info!(id = %relation.id, id_trx = %relation.id_trx, row, "created relation");
    session.insert(StoredRelation { row, relation: relation.clone() });
    Ok(relation)
  }
}
