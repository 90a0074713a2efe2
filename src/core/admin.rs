//! Allow-list admin policy

use crate::core::traits::AdminPolicy;
use crate::types::UserId;
use std::collections::HashSet;

/// Admin policy backed by a fixed set of user ids
///
/// An empty list denies everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminList {
    admins: HashSet<UserId>,
}

impl AdminList {
    pub fn new(admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

impl FromIterator<UserId> for AdminList {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl AdminPolicy for AdminList {
    fn is_admin(&self, user: UserId) -> bool {
        self.admins.contains(&user)
    }
}
