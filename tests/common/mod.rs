use std::sync::Arc;

use counsel_messaging::room;
use counsel_messaging::state::Core;
use counsel_messaging::storage::memory::MemoryStore;
use counsel_messaging::user::{Id, Role, UserInfo};

pub fn core() -> Core {
    Core::new(Arc::new(MemoryStore::new()))
}

pub fn client(id: &str, name: &str) -> UserInfo {
    UserInfo::new(Id::new(id), name, None, Role::Client)
}

pub fn lawyer(id: &str, name: &str) -> UserInfo {
    UserInfo::new(Id::new(id), name, None, Role::Lawyer)
}

pub fn room_of(a: &UserInfo, b: &UserInfo) -> room::Id {
    room::resolve(&a.id, &b.id).expect("valid participant pair")
}
