use hashbrown::HashMap;

use crate::types::UserId;

/// Map from a key to member ids in arrival order.
pub type VecIndex<K> = HashMap<K, Vec<UserId>>;
