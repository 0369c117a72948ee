// app/src/services/ownership.rs

//! Authorization decisions for (principal, action, resource owner).

use crate::errors::AppError;
use crate::models::Principal;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
  ProfileRead,
  ProfileUpdate,
  ProfileDelete,
  CustomerList,
  CartCreate,
  CartRead,
  CartUpdate,
  CartDelete,
  CartAddProduct,
  CartRemoveProduct,
  CartUpdateQuantity,
  CartClear,
  OrderCreate,
  OrderRead,
  OrderList,
  OrderTransition,
  OrderReport,
  CatalogRead,
  ProductWrite,
  ReviewRead,
  ReviewWrite,
  ReviewUpdate,
  ReviewDelete,
  ReviewModerate,
  ReviewVote,
  StockRead,
  StockReport,
  ApiKeyIssue,
}

impl Action {
  /// Open to anonymous callers when not tied to an owner.
  pub fn is_public(self) -> bool {
    matches!(self, Action::CatalogRead | Action::ReviewRead | Action::StockRead)
  }

  pub fn is_read(self) -> bool {
    matches!(
      self,
      Action::ProfileRead
        | Action::CustomerList
        | Action::CartRead
        | Action::OrderRead
        | Action::OrderList
        | Action::OrderReport
        | Action::CatalogRead
        | Action::ReviewRead
        | Action::StockRead
        | Action::StockReport
    )
  }

  pub fn is_admin_only(self) -> bool {
    matches!(
      self,
      Action::CustomerList
        | Action::OrderTransition
        | Action::OrderReport
        | Action::ProductWrite
        | Action::ReviewModerate
        | Action::StockReport
        | Action::ApiKeyIssue
    )
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allow,
  Deny,
}

/// Pure decision. `owner` is the customer owning the target resource, if any.
pub fn authorize(principal: &Principal, action: Action, owner: Option<Uuid>) -> Decision {
  let allowed = match principal {
    Principal::Admin => true,
    Principal::Customer { id } => {
      if action.is_admin_only() {
        false
      } else {
        owner.map_or(true, |owner| owner == *id)
      }
    }
    Principal::Anonymous => action.is_public() && action.is_read() && owner.is_none(),
  };
  if allowed {
    Decision::Allow
  } else {
    Decision::Deny
  }
}

/// [`authorize`] mapped onto the error a handler returns.
///
/// An anonymous caller is told to authenticate; everyone else is refused.
pub fn require(principal: &Principal, action: Action, owner: Option<Uuid>) -> Result<(), AppError> {
  match authorize(principal, action, owner) {
    Decision::Allow => Ok(()),
    Decision::Deny if principal.is_anonymous() => Err(AppError::Unauthenticated("Authentication required.".to_string())),
    Decision::Deny => {
      warn!(principal = ?principal, action = ?action, owner = ?owner, "Access denied.");
      Err(AppError::Forbidden("Access denied.".to_string()))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL_ACTIONS: [Action; 28] = [
    Action::ProfileRead,
    Action::ProfileUpdate,
    Action::ProfileDelete,
    Action::CustomerList,
    Action::CartCreate,
    Action::CartRead,
    Action::CartUpdate,
    Action::CartDelete,
    Action::CartAddProduct,
    Action::CartRemoveProduct,
    Action::CartUpdateQuantity,
    Action::CartClear,
    Action::OrderCreate,
    Action::OrderRead,
    Action::OrderList,
    Action::OrderTransition,
    Action::OrderReport,
    Action::CatalogRead,
    Action::ProductWrite,
    Action::ReviewRead,
    Action::ReviewWrite,
    Action::ReviewUpdate,
    Action::ReviewDelete,
    Action::ReviewModerate,
    Action::ReviewVote,
    Action::StockRead,
    Action::StockReport,
    Action::ApiKeyIssue,
  ];

  #[test]
  fn admin_is_always_allowed() {
    let owner = Some(Uuid::new_v4());
    for action in ALL_ACTIONS {
      assert_eq!(authorize(&Principal::Admin, action, owner), Decision::Allow);
      assert_eq!(authorize(&Principal::Admin, action, None), Decision::Allow);
    }
  }

  #[test]
  fn customer_is_denied_everything_on_someone_elses_resource() {
    let me = Principal::Customer { id: Uuid::new_v4() };
    let other = Some(Uuid::new_v4());
    for action in ALL_ACTIONS {
      assert_eq!(authorize(&me, action, other), Decision::Deny, "{:?}", action);
    }
  }

  #[test]
  fn customer_owns_their_resources_but_not_admin_actions() {
    let id = Uuid::new_v4();
    let me = Principal::Customer { id };
    assert_eq!(authorize(&me, Action::CartRead, Some(id)), Decision::Allow);
    assert_eq!(authorize(&me, Action::OrderRead, Some(id)), Decision::Allow);
    assert_eq!(authorize(&me, Action::ReviewWrite, None), Decision::Allow);
    assert_eq!(authorize(&me, Action::OrderTransition, Some(id)), Decision::Deny);
    assert_eq!(authorize(&me, Action::CustomerList, None), Decision::Deny);
    assert_eq!(authorize(&me, Action::ReviewUpdate, Some(id)), Decision::Allow);
    assert_eq!(authorize(&me, Action::ReviewVote, None), Decision::Allow);
    assert_eq!(authorize(&me, Action::ReviewModerate, None), Decision::Deny);
    assert_eq!(authorize(&me, Action::StockReport, None), Decision::Deny);
  }

  #[test]
  fn anonymous_only_reads_public_unowned_resources() {
    let anon = Principal::Anonymous;
    assert_eq!(authorize(&anon, Action::CatalogRead, None), Decision::Allow);
    assert_eq!(authorize(&anon, Action::ReviewRead, None), Decision::Allow);
    assert_eq!(authorize(&anon, Action::StockRead, None), Decision::Allow);
    assert_eq!(authorize(&anon, Action::StockReport, None), Decision::Deny);
    assert_eq!(authorize(&anon, Action::ReviewVote, None), Decision::Deny);
    assert_eq!(authorize(&anon, Action::CatalogRead, Some(Uuid::new_v4())), Decision::Deny);
    assert_eq!(authorize(&anon, Action::OrderList, None), Decision::Deny);
    assert_eq!(authorize(&anon, Action::ReviewWrite, None), Decision::Deny);
  }

  #[test]
  fn require_maps_denials_by_principal() {
    let anon = require(&Principal::Anonymous, Action::OrderList, None);
    assert!(matches!(anon, Err(AppError::Unauthenticated(_))));

    let me = Principal::Customer { id: Uuid::new_v4() };
    let denied = require(&me, Action::CartRead, Some(Uuid::new_v4()));
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    assert!(require(&me, Action::CatalogRead, None).is_ok());
  }
}
