// app/src/models/principal.rs

use serde::Serialize;
use uuid::Uuid;

/// Who is making the request. Resolved once per request at the authentication
/// boundary and passed explicitly to every authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Principal {
  Customer { id: Uuid },
  Admin,
  Anonymous,
}

impl Principal {
  pub fn customer_id(&self) -> Option<Uuid> {
    match self {
      Principal::Customer { id } => Some(*id),
      _ => None,
    }
  }

  pub fn is_admin(&self) -> bool {
    matches!(self, Principal::Admin)
  }

  pub fn is_anonymous(&self) -> bool {
    matches!(self, Principal::Anonymous)
  }
}
